use crate::*;

/// One player's game session: the board plus the leaderboard it reports wins to.
#[derive(Debug)]
pub struct Session {
    board: Board,
    store: LeaderboardStore,
    seed: Option<u64>,
    submitted: bool,
}

impl Session {
    pub fn new(store: LeaderboardStore) -> Self {
        Self {
            board: Board::default(),
            store,
            seed: None,
            submitted: false,
        }
    }

    /// Opens the configured leaderboard and starts the configured game.
    pub fn from_settings(settings: &Settings) -> core::result::Result<Self, SettingsError> {
        let difficulty = settings.difficulty()?;
        let store = LeaderboardStore::open(&settings.leaderboard_path, settings.leaderboard_capacity);
        let mut session = Self::new(store);
        session.seed = settings.seed;
        session.new_game(difficulty)?;
        Ok(session)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        self.store.leaderboard()
    }

    pub fn new_game(&mut self, difficulty: Difficulty) -> Result<()> {
        match self.seed {
            Some(seed) => self.board.new_game_with_seed(difficulty, seed)?,
            None => self.board.new_game(difficulty)?,
        }
        self.submitted = false;
        Ok(())
    }

    pub fn reveal(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        self.board.reveal(coords)
    }

    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<MarkOutcome> {
        self.board.toggle_flag(coords)
    }

    /// Time to submit for a won game that makes the leaderboard and was not submitted yet.
    pub fn pending_score(&self) -> Option<u32> {
        if self.submitted || self.board.status() != GameStatus::Won {
            return None;
        }
        let seconds = self.board.elapsed_secs();
        self.store
            .qualifies(self.board.difficulty().name(), seconds)
            .then_some(seconds)
    }

    /// Records the pending score under `player_name` and saves the leaderboard.
    ///
    /// Returns the rank reached, or `None` when there was nothing to submit.
    pub fn submit_score(&mut self, player_name: &str) -> LeaderboardResult<Option<usize>> {
        let Some(seconds) = self.pending_score() else {
            return Ok(None);
        };
        let category = self.board.difficulty().name().to_owned();
        let result = self.store.record_and_save(&category, player_name, seconds);
        // a rejected name leaves the score pending, a failed save does not since the entry is in memory
        if !matches!(result, Err(LeaderboardError::UnrepresentableField(_))) {
            self.submitted = true;
        }
        result
    }

    /// Pending board change notifications, oldest first.
    pub fn drain_events(&mut self) -> impl Iterator<Item = BoardEvent> + '_ {
        self.board.drain_events()
    }
}
