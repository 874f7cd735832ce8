use serde::{Deserialize, Serialize};

/// Full state of one grid cell, as owned by the board.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub has_mine: bool,
    pub revealed: bool,
    pub flagged: bool,
    pub neighbor_mine_count: u8,
}

impl Cell {
    pub const fn is_unrevealed(self) -> bool {
        !self.revealed
    }

    /// Whether a reveal command may open this cell.
    pub const fn is_revealable(self) -> bool {
        !self.revealed && !self.flagged
    }
}

/// What a player is allowed to see of a cell.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellView {
    #[default]
    Hidden,
    Flagged,
    Revealed(u8),
    /// Mine uncovered at the end of a game.
    Mine,
    /// The mine that ended a lost game.
    Exploded,
}
