use thiserror::Error;

use crate::{CellCount, Coord, Coord2};

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid difficulty: {rows}x{cols} grid cannot hold {mines} mines")]
    InvalidDifficulty {
        rows: Coord,
        cols: Coord,
        mines: CellCount,
    },
    #[error("Coordinates {coords:?} are outside the {size:?} grid")]
    OutOfBounds { coords: Coord2, size: Coord2 },
}

pub type Result<T> = core::result::Result<T, GameError>;

#[derive(Error, Debug)]
pub enum LeaderboardError {
    #[error("Leaderboard I/O failed")]
    Io(#[from] std::io::Error),
    #[error("Field {0:?} cannot be stored in a leaderboard record")]
    UnrepresentableField(String),
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Could not read settings")]
    Io(#[from] std::io::Error),
    #[error("Malformed settings")]
    Parse(#[from] toml::de::Error),
    #[error("Custom grid needs rows, cols and mines together, got {rows:?}, {cols:?}, {mines:?}")]
    IncompleteCustomGrid {
        rows: Option<Coord>,
        cols: Option<Coord>,
        mines: Option<CellCount>,
    },
    #[error(transparent)]
    Game(#[from] GameError),
}
