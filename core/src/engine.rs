use core::time::Duration;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::*;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    /// No game has been started yet.
    #[default]
    Ready,
    Playing,
    Won,
    Lost,
}

impl GameStatus {
    pub const fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// Change notifications for a presentation layer, drained with [`Board::drain_events`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BoardEvent {
    /// A new grid was allocated, every cell is hidden.
    Reset { size: Coord2 },
    StatusChanged { from: GameStatus, to: GameStatus },
    CellChanged { coords: Coord2, view: CellView },
}

/// The game board: cells, mine layout, the reveal/flag state machine and win/loss detection.
///
/// Mines are placed lazily on the first successful reveal of a game, keeping the revealed cell and its neighbors
/// clear.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Board {
    difficulty: Difficulty,
    cells: Array2<Cell>,
    flags_placed: CellCount,
    revealed_count: CellCount,
    mines_placed: bool,
    status: GameStatus,
    seed: u64,
    triggered_mine: Option<Coord2>,
    #[serde(skip)]
    started_at: Option<Instant>,
    #[serde(skip)]
    ended_at: Option<Instant>,
    #[serde(skip)]
    events: Vec<BoardEvent>,
}

impl Board {
    /// Creates a board and starts a game on it right away.
    pub fn new(difficulty: Difficulty) -> Result<Self> {
        let mut board = Self::default();
        board.new_game(difficulty)?;
        Ok(board)
    }

    pub fn with_seed(difficulty: Difficulty, seed: u64) -> Result<Self> {
        let mut board = Self::default();
        board.new_game_with_seed(difficulty, seed)?;
        Ok(board)
    }

    /// Starts a new game with a random mine placement seed.
    pub fn new_game(&mut self, difficulty: Difficulty) -> Result<()> {
        use rand::prelude::*;

        let seed = rand::rng().random();
        self.new_game_with_seed(difficulty, seed)
    }

    /// Starts a new game whose mine placement is fully determined by `seed` and the first revealed cell.
    ///
    /// An invalid difficulty leaves the board untouched.
    pub fn new_game_with_seed(&mut self, difficulty: Difficulty, seed: u64) -> Result<()> {
        difficulty.validate()?;
        log::debug!(
            "New {} game: {}x{} with {} mines, seed {}",
            difficulty.name,
            difficulty.rows,
            difficulty.cols,
            difficulty.mines,
            seed
        );

        let size = difficulty.size();
        self.cells = Array2::default(size.to_nd_index());
        self.difficulty = difficulty;
        self.flags_placed = 0;
        self.revealed_count = 0;
        self.mines_placed = false;
        self.seed = seed;
        self.triggered_mine = None;
        self.started_at = None;
        self.ended_at = None;
        self.events.clear();
        self.events.push(BoardEvent::Reset { size });
        self.set_status(GameStatus::Playing);
        Ok(())
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    pub fn difficulty(&self) -> &Difficulty {
        &self.difficulty
    }

    pub fn size(&self) -> Coord2 {
        grid_size(&self.cells)
    }

    pub fn total_mines(&self) -> CellCount {
        self.difficulty.mines
    }

    pub fn flags_placed(&self) -> CellCount {
        self.flags_placed
    }

    /// Number of revealed cells without a mine, mines uncovered when the game ends are not counted.
    pub fn revealed_count(&self) -> CellCount {
        self.revealed_count
    }

    pub fn mines_placed(&self) -> bool {
        self.mines_placed
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn triggered_mine(&self) -> Option<Coord2> {
        self.triggered_mine
    }

    /// Mines minus flags, negative when the player placed more flags than there are mines.
    pub fn remaining_mine_count(&self) -> isize {
        (self.total_mines() as isize) - (self.flags_placed as isize)
    }

    /// Time since the first reveal, frozen once the game ends.
    pub fn elapsed(&self) -> Duration {
        match self.started_at {
            Some(started_at) => self
                .ended_at
                .unwrap_or_else(Instant::now)
                .saturating_duration_since(started_at),
            None => Duration::ZERO,
        }
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed().as_secs().try_into().unwrap_or(u32::MAX)
    }

    pub fn cell(&self, coords: Coord2) -> Result<Cell> {
        let coords = self.validate_coords(coords)?;
        Ok(self.cells[coords.to_nd_index()])
    }

    pub fn cell_view(&self, coords: Coord2) -> Result<CellView> {
        let coords = self.validate_coords(coords)?;
        Ok(self.view_at(coords))
    }

    /// Pending change notifications, oldest first.
    pub fn drain_events(&mut self) -> impl Iterator<Item = BoardEvent> + '_ {
        self.events.drain(..)
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        let size = self.size();
        if in_bounds(coords, size) {
            Ok(coords)
        } else {
            Err(GameError::OutOfBounds { coords, size })
        }
    }

    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<MarkOutcome> {
        let coords = self.validate_coords(coords)?;

        if !self.status.is_playing() {
            return Ok(MarkOutcome::NoChange);
        }

        let cell = &mut self.cells[coords.to_nd_index()];
        if cell.revealed {
            return Ok(MarkOutcome::NoChange);
        }

        cell.flagged = !cell.flagged;
        if cell.flagged {
            self.flags_placed += 1;
        } else {
            self.flags_placed -= 1;
        }
        self.push_cell_changed(coords);
        Ok(MarkOutcome::Changed)
    }

    pub fn reveal(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        let coords = self.validate_coords(coords)?;

        if !self.status.is_playing() || !self.cells[coords.to_nd_index()].is_revealable() {
            return Ok(RevealOutcome::NoChange);
        }

        if !self.mines_placed {
            let layout = SafeStartGenerator::new(self.seed, coords, SafeZone::Window)
                .generate(&self.difficulty);
            self.place_mines(&layout);
            self.started_at = Some(Instant::now());
        }

        if self.cells[coords.to_nd_index()].has_mine {
            self.cells[coords.to_nd_index()].revealed = true;
            self.triggered_mine = Some(coords);
            self.push_cell_changed(coords);
            log::debug!("Mine hit at {:?}", coords);
            self.end_game(GameStatus::Lost);
            return Ok(RevealOutcome::HitMine);
        }

        let newly_revealed = self.flood_reveal(coords);
        self.revealed_count += newly_revealed;

        if self.revealed_count == self.difficulty.safe_cells() {
            self.end_game(GameStatus::Won);
            Ok(RevealOutcome::Won)
        } else {
            Ok(RevealOutcome::Revealed)
        }
    }

    /// Copies a mine layout onto the cells and recomputes every neighbor count.
    fn place_mines(&mut self, layout: &MineLayout) {
        for ((row, col), cell) in self.cells.indexed_iter_mut() {
            let coords = (row as Coord, col as Coord);
            cell.has_mine = layout.contains_mine(coords);
            cell.neighbor_mine_count = layout.adjacent_mine_count(coords);
        }
        self.mines_placed = true;
    }

    /// Reveals `start` and, through zero-count cells, everything connected to it. Returns how many cells were
    /// opened.
    fn flood_reveal(&mut self, start: Coord2) -> CellCount {
        let mut newly_revealed = 0;
        let mut to_visit = vec![start];

        while let Some(coords) = to_visit.pop() {
            let cell = &mut self.cells[coords.to_nd_index()];
            if !cell.is_revealable() {
                continue;
            }

            cell.revealed = true;
            let count = cell.neighbor_mine_count;
            newly_revealed += 1;
            self.push_cell_changed(coords);
            log::trace!("Revealed {:?}, adjacent mines: {}", coords, count);

            if count == 0 {
                to_visit.extend(self.cells.iter_neighbors(coords).filter(|&pos| {
                    let neighbor = self.cells[pos.to_nd_index()];
                    !neighbor.revealed && !neighbor.has_mine
                }));
            }
        }

        log::debug!("Flood reveal from {:?} opened {} cells", start, newly_revealed);
        newly_revealed
    }

    fn end_game(&mut self, status: GameStatus) {
        self.ended_at = Some(Instant::now());
        self.set_status(status);
        self.reveal_mines();
        log::debug!("Game {:?} after {:?}", status, self.elapsed());
    }

    /// Uncovers every mine for display, flags and counters are left as they are.
    fn reveal_mines(&mut self) {
        let mut uncovered = Vec::new();
        for ((row, col), cell) in self.cells.indexed_iter_mut() {
            if cell.has_mine && cell.is_unrevealed() {
                cell.revealed = true;
                uncovered.push((row as Coord, col as Coord));
            }
        }
        for coords in uncovered {
            self.push_cell_changed(coords);
        }
    }

    fn set_status(&mut self, status: GameStatus) {
        if self.status != status {
            self.events.push(BoardEvent::StatusChanged {
                from: self.status,
                to: status,
            });
            self.status = status;
        }
    }

    fn push_cell_changed(&mut self, coords: Coord2) {
        let view = self.view_at(coords);
        self.events.push(BoardEvent::CellChanged { coords, view });
    }

    fn view_at(&self, coords: Coord2) -> CellView {
        let cell = self.cells[coords.to_nd_index()];
        match (cell.revealed, cell.has_mine, cell.flagged) {
            (true, true, _) if self.triggered_mine == Some(coords) => CellView::Exploded,
            (true, true, _) => CellView::Mine,
            (true, false, _) => CellView::Revealed(cell.neighbor_mine_count),
            (false, _, true) => CellView::Flagged,
            (false, _, false) => CellView::Hidden,
        }
    }
}

#[cfg(test)]
impl Board {
    /// Starts a game on a fixed layout, skipping random placement.
    pub(crate) fn with_layout(name: &str, layout: &MineLayout) -> Result<Self> {
        let (rows, cols) = layout.size();
        let mut board = Self::with_seed(Difficulty::new(name, rows, cols, layout.mine_count()), 0)?;
        board.place_mines(layout);
        board.events.clear();
        Ok(board)
    }
}
