use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{CellCount, Coord, DEFAULT_CAPACITY, Difficulty, SettingsError};

/// User-editable configuration, read from a TOML file.
///
/// ```toml
/// leaderboard_path = "leaderboard.txt"
/// leaderboard_capacity = 5
/// difficulty = "Expert"
/// ```
///
/// Setting all of `rows`, `cols` and `mines` selects a custom grid instead of the named preset, setting only some
/// of them is an error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub leaderboard_path: PathBuf,
    pub leaderboard_capacity: usize,
    pub difficulty: String,
    pub rows: Option<Coord>,
    pub cols: Option<Coord>,
    pub mines: Option<CellCount>,
    /// Fixed mine placement seed, mostly useful for replays and tests.
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            leaderboard_path: PathBuf::from("leaderboard.txt"),
            leaderboard_capacity: DEFAULT_CAPACITY,
            difficulty: Difficulty::BEGINNER.to_owned(),
            rows: None,
            cols: None,
            mines: None,
            seed: None,
        }
    }
}

impl Settings {
    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads settings from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(&text),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::debug!("No settings at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// The configured game, validated.
    pub fn difficulty(&self) -> Result<Difficulty, SettingsError> {
        let difficulty = match (self.rows, self.cols, self.mines) {
            (Some(rows), Some(cols), Some(mines)) => Difficulty::custom(rows, cols, mines),
            (None, None, None) => Difficulty::preset(&self.difficulty).unwrap_or_else(|| {
                log::warn!("Unknown difficulty {:?}, using {}", self.difficulty, Difficulty::BEGINNER);
                Difficulty::beginner()
            }),
            (rows, cols, mines) => return Err(SettingsError::IncompleteCustomGrid { rows, cols, mines }),
        };
        difficulty.validate()?;
        Ok(difficulty)
    }
}
