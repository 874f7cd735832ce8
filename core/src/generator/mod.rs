use crate::*;
pub use random::*;

mod random;

pub trait MineGenerator {
    /// Places exactly `difficulty.mines` mines on a `difficulty.rows x difficulty.cols` grid.
    ///
    /// Callers validate the difficulty first.
    fn generate(self, difficulty: &Difficulty) -> MineLayout;
}

/// Cells around the first reveal that are kept free of mines.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SafeZone {
    /// Only the revealed cell.
    Cell,
    /// The revealed cell and its up-to-8 neighbors.
    Window,
}
