use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::LeaderboardError;

pub type LeaderboardResult<T> = core::result::Result<T, LeaderboardError>;

/// Number of entries kept per category unless configured otherwise.
pub const DEFAULT_CAPACITY: usize = 5;

pub const MAX_NAME_CHARS: usize = 20;

pub const DEFAULT_PLAYER_NAME: &str = "Anonymous";

const FIELD_SEPARATOR: char = ';';

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub player_name: String,
    pub seconds: u32,
}

impl LeaderboardEntry {
    /// Builds an entry with a normalized player name.
    pub fn new(player_name: &str, seconds: u32) -> Self {
        Self {
            player_name: normalize_name(player_name),
            seconds,
        }
    }
}

/// Trims the name, substitutes a placeholder for an empty one and cuts it to [`MAX_NAME_CHARS`] characters.
pub fn normalize_name(name: &str) -> String {
    let name: String = name.trim().chars().take(MAX_NAME_CHARS).collect();
    // the cut may leave trailing whitespace behind
    match name.trim_end() {
        "" => DEFAULT_PLAYER_NAME.to_owned(),
        trimmed => trimmed.to_owned(),
    }
}

/// Loading trims every line, so surrounding whitespace would not survive a save.
fn check_field(field: &str) -> LeaderboardResult<()> {
    if field.contains([FIELD_SEPARATOR, '\n', '\r']) || field.trim() != field {
        Err(LeaderboardError::UnrepresentableField(field.to_owned()))
    } else {
        Ok(())
    }
}

/// Best times per difficulty category, each list ascending by time and bounded to a fixed capacity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Leaderboard {
    capacity: usize,
    table: BTreeMap<String, Vec<LeaderboardEntry>>,
}

impl Default for Leaderboard {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Leaderboard {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            table: BTreeMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn entries(&self, category: &str) -> &[LeaderboardEntry] {
        self.table
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn best(&self, category: &str) -> Option<&LeaderboardEntry> {
        self.entries(category).first()
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }

    /// Total number of entries across all categories.
    pub fn len(&self) -> usize {
        self.table.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.table.values().all(Vec::is_empty)
    }

    /// Whether a time of `seconds` would make it into `category`.
    pub fn qualifies(&self, category: &str, seconds: u32) -> bool {
        let entries = self.entries(category);
        if entries.len() < self.capacity {
            return true;
        }
        entries
            .iter()
            .map(|entry| entry.seconds)
            .max()
            .is_some_and(|worst| seconds < worst)
    }

    /// Inserts a result and trims the category back to capacity.
    ///
    /// Returns the 0-based rank the entry landed at, or `None` if it did not make the cut. Identical submissions are
    /// kept as separate entries.
    pub fn record(
        &mut self,
        category: &str,
        player_name: &str,
        seconds: u32,
    ) -> LeaderboardResult<Option<usize>> {
        check_field(category)?;
        let entry = LeaderboardEntry::new(player_name, seconds);
        check_field(&entry.player_name)?;

        let entries = self.table.entry(category.to_owned()).or_default();
        // stable: equal times keep their insertion order, the newcomer goes last among them
        let rank = entries.partition_point(|kept| kept.seconds <= seconds);
        log::debug!(
            "Recording {} with {}s in {} at rank {}",
            entry.player_name,
            seconds,
            category,
            rank
        );
        entries.insert(rank, entry);
        entries.truncate(self.capacity);

        Ok((rank < self.capacity).then_some(rank))
    }

    /// Reads `difficulty;player;seconds` records, skipping malformed lines, then sorts and trims every category.
    pub fn load(reader: impl BufRead, capacity: usize) -> io::Result<Self> {
        let mut leaderboard = Self::new(capacity);

        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match parse_record(line) {
                Some((category, entry)) => leaderboard
                    .table
                    .entry(category.to_owned())
                    .or_default()
                    .push(entry),
                None => log::debug!("Skipping malformed leaderboard line {}: {:?}", number + 1, line),
            }
        }

        for entries in leaderboard.table.values_mut() {
            entries.sort_by_key(|entry| entry.seconds);
            entries.truncate(capacity);
        }
        Ok(leaderboard)
    }

    /// Writes one `difficulty;player;seconds` line per entry.
    pub fn save(&self, mut writer: impl Write) -> io::Result<()> {
        for (category, entries) in &self.table {
            for entry in entries {
                writeln!(
                    writer,
                    "{category}{FIELD_SEPARATOR}{}{FIELD_SEPARATOR}{}",
                    entry.player_name, entry.seconds
                )?;
            }
        }
        writer.flush()
    }
}

fn parse_record(line: &str) -> Option<(&str, LeaderboardEntry)> {
    let mut fields = line.splitn(3, FIELD_SEPARATOR);
    let category = fields.next()?;
    let player_name = fields.next()?;
    let seconds = fields.next()?.parse().ok()?;
    Some((category, LeaderboardEntry::new(player_name, seconds)))
}

/// A [`Leaderboard`] persisted to a flat text file.
#[derive(Debug)]
pub struct LeaderboardStore {
    path: PathBuf,
    leaderboard: Leaderboard,
}

impl LeaderboardStore {
    /// Loads the leaderboard at `path`. A missing or unreadable file yields an empty table.
    pub fn open(path: impl Into<PathBuf>, capacity: usize) -> Self {
        let path = path.into();
        let leaderboard = match File::open(&path) {
            Ok(file) => Leaderboard::load(BufReader::new(file), capacity).unwrap_or_else(|err| {
                log::warn!("Could not read leaderboard {}: {}", path.display(), err);
                Leaderboard::new(capacity)
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::debug!("No leaderboard at {}, starting empty", path.display());
                Leaderboard::new(capacity)
            }
            Err(err) => {
                log::warn!("Could not open leaderboard {}: {}", path.display(), err);
                Leaderboard::new(capacity)
            }
        };
        log::debug!(
            "Loaded {} leaderboard entries from {}",
            leaderboard.len(),
            path.display()
        );
        Self { path, leaderboard }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    pub fn qualifies(&self, category: &str, seconds: u32) -> bool {
        self.leaderboard.qualifies(category, seconds)
    }

    /// Overwrites the file with the current table.
    pub fn save(&self) -> LeaderboardResult<()> {
        let file = File::create(&self.path)?;
        self.leaderboard.save(BufWriter::new(file))?;
        log::debug!("Saved leaderboard to {}", self.path.display());
        Ok(())
    }

    /// Records a result and persists the table.
    ///
    /// A failed save is returned as an error, the entry stays recorded in memory either way.
    pub fn record_and_save(
        &mut self,
        category: &str,
        player_name: &str,
        seconds: u32,
    ) -> LeaderboardResult<Option<usize>> {
        let rank = self.leaderboard.record(category, player_name, seconds)?;
        if let Err(err) = self.save() {
            log::warn!("Could not save leaderboard {}: {}", self.path.display(), err);
            return Err(err);
        }
        Ok(rank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn times(leaderboard: &Leaderboard, category: &str) -> Vec<u32> {
        leaderboard
            .entries(category)
            .iter()
            .map(|entry| entry.seconds)
            .collect()
    }

    fn beginner_board() -> Leaderboard {
        let mut leaderboard = Leaderboard::default();
        for (name, seconds) in [("a", 20), ("b", 10), ("c", 30), ("d", 15), ("e", 12)] {
            leaderboard.record("Beginner", name, seconds).unwrap();
        }
        leaderboard
    }

    #[test]
    fn empty_category_always_qualifies() {
        let leaderboard = Leaderboard::default();
        assert!(leaderboard.qualifies("Expert", u32::MAX));
    }

    #[test]
    fn full_category_requires_strictly_better_time() {
        let leaderboard = beginner_board();
        assert_eq!(times(&leaderboard, "Beginner"), vec![10, 12, 15, 20, 30]);
        assert!(leaderboard.qualifies("Beginner", 18));
        assert!(leaderboard.qualifies("Beginner", 29));
        assert!(!leaderboard.qualifies("Beginner", 30));
        assert!(!leaderboard.qualifies("Beginner", 31));
        assert!(leaderboard.qualifies("Intermediate", 500));
    }

    #[test]
    fn record_inserts_sorted_and_drops_worst() {
        let mut leaderboard = beginner_board();

        assert_eq!(leaderboard.record("Beginner", "f", 18).unwrap(), Some(3));

        assert_eq!(times(&leaderboard, "Beginner"), vec![10, 12, 15, 18, 20]);
        assert_eq!(leaderboard.best("Beginner").unwrap().player_name, "b");
    }

    #[test]
    fn record_too_slow_is_trimmed() {
        let mut leaderboard = beginner_board();

        assert_eq!(leaderboard.record("Beginner", "slow", 99).unwrap(), None);
        assert_eq!(leaderboard.entries("Beginner").len(), 5);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let mut leaderboard = Leaderboard::default();
        leaderboard.record("Beginner", "first", 10).unwrap();
        leaderboard.record("Beginner", "second", 10).unwrap();
        leaderboard.record("Beginner", "fast", 5).unwrap();

        let names: Vec<_> = leaderboard
            .entries("Beginner")
            .iter()
            .map(|entry| entry.player_name.as_str())
            .collect();
        assert_eq!(names, vec!["fast", "first", "second"]);
    }

    #[test]
    fn duplicates_each_take_a_slot() {
        let mut leaderboard = Leaderboard::new(3);
        for _ in 0..4 {
            leaderboard.record("Expert", "same", 42).unwrap();
        }
        assert_eq!(times(&leaderboard, "Expert"), vec![42, 42, 42]);
    }

    #[test]
    fn names_are_normalized() {
        assert_eq!(normalize_name("  Ada  "), "Ada");
        assert_eq!(normalize_name("   "), DEFAULT_PLAYER_NAME);
        assert_eq!(normalize_name(""), DEFAULT_PLAYER_NAME);
        assert_eq!(normalize_name("abcdefghijklmnopqrstuvwxyz"), "abcdefghijklmnopqrst");
        assert_eq!(normalize_name("ééééééééééééééééééééééé").chars().count(), 20);
    }

    #[test]
    fn separator_in_fields_is_rejected() {
        let mut leaderboard = Leaderboard::default();

        assert!(matches!(
            leaderboard.record("Beginner", "a;b", 10),
            Err(LeaderboardError::UnrepresentableField(_))
        ));
        assert!(matches!(
            leaderboard.record("Be;ginner", "ab", 10),
            Err(LeaderboardError::UnrepresentableField(_))
        ));
        assert!(leaderboard.is_empty());
    }

    #[test]
    fn padded_category_is_rejected() {
        let mut leaderboard = Leaderboard::default();

        for category in [" Beginner", "Beginner ", "\tBeginner"] {
            assert!(matches!(
                leaderboard.record(category, "ann", 10),
                Err(LeaderboardError::UnrepresentableField(_))
            ));
        }
        assert!(leaderboard.is_empty());
    }

    #[test]
    fn cut_name_with_inner_space_round_trips() {
        let mut leaderboard = Leaderboard::default();
        leaderboard.record("Beginner", "abcdefghijklmnopqrs tuvwxyz", 10).unwrap();
        assert_eq!(leaderboard.best("Beginner").unwrap().player_name, "abcdefghijklmnopqrs");

        let mut buffer = Vec::new();
        leaderboard.save(&mut buffer).unwrap();
        let loaded = Leaderboard::load(buffer.as_slice(), DEFAULT_CAPACITY).unwrap();

        assert_eq!(loaded, leaderboard);
    }

    #[test]
    fn load_normalizes_hand_edited_names() {
        let input = "Beginner;;12\nBeginner;  bob  ;14\nBeginner;abcdefghijklmnopqrstuvwxyz;16\n";

        let leaderboard = Leaderboard::load(input.as_bytes(), DEFAULT_CAPACITY).unwrap();

        let names: Vec<_> = leaderboard
            .entries("Beginner")
            .iter()
            .map(|entry| entry.player_name.as_str())
            .collect();
        assert_eq!(names, vec![DEFAULT_PLAYER_NAME, "bob", "abcdefghijklmnopqrst"]);
    }

    #[test]
    fn load_skips_malformed_lines() {
        let input = "\
Beginner;ann;12
Beginner;bob
Beginner;carl;abc
Beginner;dora;-4

  Expert;eve;300
Beginner;fay;7
";
        let leaderboard = Leaderboard::load(input.as_bytes(), DEFAULT_CAPACITY).unwrap();

        assert_eq!(times(&leaderboard, "Beginner"), vec![7, 12]);
        assert_eq!(times(&leaderboard, "Expert"), vec![300]);
        assert_eq!(leaderboard.len(), 3);
    }

    #[test]
    fn load_self_heals_oversized_categories() {
        let input: String = (0..8)
            .rev()
            .map(|i| format!("Beginner;p{i};{}\n", 10 + i))
            .collect();

        let leaderboard = Leaderboard::load(input.as_bytes(), 5).unwrap();

        assert_eq!(times(&leaderboard, "Beginner"), vec![10, 11, 12, 13, 14]);
    }

    #[test]
    fn save_then_load_round_trips() {
        let mut leaderboard = beginner_board();
        leaderboard.record("Expert", "Zoë", 250).unwrap();
        leaderboard.record("Custom", "  ", 3).unwrap();

        let mut buffer = Vec::new();
        leaderboard.save(&mut buffer).unwrap();
        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.contains("Custom;Anonymous;3\n"));
        assert!(text.contains("Expert;Zoë;250\n"));

        let loaded = Leaderboard::load(buffer.as_slice(), DEFAULT_CAPACITY).unwrap();
        assert_eq!(loaded, leaderboard);
    }

    #[test]
    fn store_opens_missing_file_as_empty() {
        let path = std::env::temp_dir().join(format!(
            "tilesweep-missing-{}.txt",
            std::process::id()
        ));
        let store = LeaderboardStore::open(&path, DEFAULT_CAPACITY);
        assert!(store.leaderboard().is_empty());
        assert_eq!(store.path(), path.as_path());
    }

    #[test]
    fn failed_save_keeps_entry_in_memory() {
        let path = std::env::temp_dir()
            .join(format!("tilesweep-no-such-dir-{}", std::process::id()))
            .join("leaderboard.txt");
        let mut store = LeaderboardStore::open(&path, DEFAULT_CAPACITY);

        let result = store.record_and_save("Beginner", "ann", 12);

        assert!(matches!(result, Err(LeaderboardError::Io(_))));
        assert_eq!(store.leaderboard().entries("Beginner").len(), 1);
    }
}
