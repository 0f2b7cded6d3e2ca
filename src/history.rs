// history.rs

use crate::error::{HistoryError, ReplayError};
use itertools::Itertools;
use std::fmt;
use tracing::debug;

/// Starting soft capacity of a [`HistoryStore`].
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failed,
}

impl Outcome {
    /// Maps a process exit status to an outcome; only `0` counts as success.
    pub fn from_exit_code(code: i32) -> Self {
        if code == 0 {
            Outcome::Success
        } else {
            Outcome::Failed
        }
    }
}

/// A command as it was executed. Never changed after it is recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    sequence_id: usize,
    arguments: Vec<String>,
    first_char: char,
    outcome: Outcome,
    background: bool,
}

impl HistoryEntry {
    pub fn sequence_id(&self) -> usize {
        self.sequence_id
    }
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }
    pub fn first_char(&self) -> char {
        self.first_char
    }
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }
    pub fn background(&self) -> bool {
        self.background
    }
    pub fn is_failed(&self) -> bool {
        self.outcome == Outcome::Failed
    }

    /// The arguments joined by spaces, with ` &` appended for background runs.
    pub fn command_line(&self) -> String {
        let line = self.arguments.iter().join(" ");
        if self.background {
            format!("{} &", line)
        } else {
            line
        }
    }
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>5}  {}", self.sequence_id, self.command_line())
    }
}

/// Append-only log of executed commands.
///
/// Sequence ids start at 0 and match the position of the entry in the store.
/// `capacity` is a soft limit: reaching it doubles the backing storage, no
/// entry is ever overwritten or dropped.
pub struct HistoryStore {
    entries: Vec<HistoryEntry>,
    capacity: usize,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Storage is reserved lazily by [`HistoryStore::record`], so an
    /// oversized `capacity` surfaces as an error there instead of an abort.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Copies `arguments` into a new entry and returns its sequence id.
    ///
    /// Callers must not pass an empty argument list; empty lines are never
    /// recorded. Fails without recording anything when the backing storage
    /// cannot be grown.
    pub fn record(&mut self, arguments: &[String], outcome: Outcome, background: bool) -> Result<usize, HistoryError> {
        debug_assert!(!arguments.is_empty(), "empty commands are never recorded");
        let len = self.entries.len();
        let target = if len == self.capacity {
            self.capacity.saturating_mul(2)
        } else {
            self.capacity
        };
        if self.entries.capacity() < target {
            self.entries
                .try_reserve_exact(target - len)
                .map_err(|source| HistoryError::Grow {
                    capacity: target,
                    source,
                })?;
        }
        if target != self.capacity {
            debug!(from = self.capacity, to = target, "growing history store");
            self.capacity = target;
        }
        let sequence_id = self.entries.len();
        let first_char = arguments
            .first()
            .and_then(|a| a.chars().next())
            .unwrap_or('\0');
        self.entries.push(HistoryEntry {
            sequence_id,
            arguments: arguments.to_vec(),
            first_char,
            outcome,
            background,
        });
        Ok(sequence_id)
    }

    pub fn most_recent(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    /// Newest entry whose first argument starts with `c`.
    pub fn find_by_prefix_char(&self, c: char) -> Option<&HistoryEntry> {
        self.entries.iter().rev().find(|e| e.first_char == c)
    }

    /// Picks the entry a replay command refers to: the newest entry when
    /// `prefix` is `None`, otherwise the newest one starting with `prefix`.
    ///
    /// Entries whose first run failed are refused.
    pub fn resolve_replay(&self, prefix: Option<char>) -> Result<&HistoryEntry, ReplayError> {
        let entry = match prefix {
            None => self.most_recent().ok_or(ReplayError::NothingToReplay)?,
            Some(c) if self.is_empty() => return Err(ReplayError::EmptyHistory(c)),
            Some(c) => self.find_by_prefix_char(c).ok_or(ReplayError::NoMatch(c))?,
        };
        if entry.is_failed() {
            return Err(ReplayError::Erroneous(entry.command_line()));
        }
        Ok(entry)
    }

    pub fn get(&self, sequence_id: usize) -> Option<&HistoryEntry> {
        self.entries.get(sequence_id)
    }

    /// All entries, oldest first.
    pub fn list(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// The newest `n` entries, oldest first.
    pub fn tail(&self, n: usize) -> &[HistoryEntry] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn ids_are_contiguous_in_execution_order() {
        let mut store = HistoryStore::with_capacity(2);
        let lines = ["ls", "pwd", "echo hi", "cat x", "date"];
        for line in lines {
            store.record(&argv(line), Outcome::Success, false).unwrap();
        }
        let listed = store.list();
        assert_eq!(listed.len(), lines.len());
        for (i, (entry, line)) in listed.iter().zip(lines).enumerate() {
            assert_eq!(entry.sequence_id(), i);
            assert_eq!(entry.arguments(), argv(line).as_slice());
        }
    }

    #[test]
    fn growth_keeps_every_entry() {
        let mut store = HistoryStore::with_capacity(2);
        for i in 0..9 {
            store.record(&[format!("cmd{}", i)], Outcome::Success, false).unwrap();
        }
        assert_eq!(store.capacity(), 16);
        assert_eq!(store.get(0).unwrap().arguments()[0], "cmd0");
        assert_eq!(store.get(8).unwrap().arguments()[0], "cmd8");
    }

    #[test]
    fn most_recent_is_highest_id() {
        let mut store = HistoryStore::new();
        assert!(store.most_recent().is_none());
        store.record(&argv("pwd"), Outcome::Success, false).unwrap();
        store.record(&argv("ls"), Outcome::Success, false).unwrap();
        store.record(&argv("ps aux"), Outcome::Success, false).unwrap();
        let entry = store.most_recent().unwrap();
        assert_eq!(entry.first_char(), 'p');
        assert_eq!(entry.sequence_id(), 2);
    }

    #[test]
    fn prefix_lookup_prefers_newest() {
        let mut store = HistoryStore::new();
        store.record(&argv("pwd"), Outcome::Success, false).unwrap();
        store.record(&argv("ls"), Outcome::Success, false).unwrap();
        store.record(&argv("ps"), Outcome::Failed, false).unwrap();
        let entry = store.find_by_prefix_char('p').unwrap();
        assert_eq!(entry.sequence_id(), 2);
        assert!(entry.is_failed());
        assert_eq!(store.find_by_prefix_char('l').unwrap().sequence_id(), 1);
    }

    #[test]
    fn prefix_lookup_without_match() {
        let mut store = HistoryStore::new();
        for line in ["a", "b", "c"] {
            store.record(&argv(line), Outcome::Success, false).unwrap();
        }
        assert!(store.find_by_prefix_char('x').is_none());
    }

    #[test]
    fn recorded_arguments_are_independent_of_caller_buffer() {
        let mut store = HistoryStore::new();
        let mut buf = argv("echo one");
        store.record(&buf, Outcome::Success, false).unwrap();
        buf[1].clear();
        buf[1].push_str("two");
        assert_eq!(store.most_recent().unwrap().arguments()[1], "one");
    }

    #[test]
    fn tail_and_display() {
        let mut store = HistoryStore::new();
        store.record(&argv("ls -l"), Outcome::Success, false).unwrap();
        store.record(&argv("sleep 5"), Outcome::Success, true).unwrap();
        assert_eq!(store.tail(1).len(), 1);
        assert_eq!(store.tail(10).len(), 2);
        assert_eq!(store.list()[0].to_string(), "    0  ls -l");
        assert_eq!(store.list()[1].to_string(), "    1  sleep 5 &");
    }

    #[test]
    fn replay_resolution_conditions() {
        let mut store = HistoryStore::new();
        assert_eq!(store.resolve_replay(None), Err(ReplayError::NothingToReplay));
        assert_eq!(store.resolve_replay(Some('l')), Err(ReplayError::EmptyHistory('l')));

        store.record(&argv("ls"), Outcome::Success, false).unwrap();
        store.record(&argv("false"), Outcome::Failed, false).unwrap();
        assert_eq!(store.resolve_replay(Some('x')), Err(ReplayError::NoMatch('x')));
        assert_eq!(
            store.resolve_replay(None),
            Err(ReplayError::Erroneous("false".into()))
        );
        assert_eq!(store.resolve_replay(Some('l')).unwrap().sequence_id(), 0);
    }

    #[test]
    fn failed_growth_is_reported_not_aborted() {
        let mut store = HistoryStore::with_capacity(usize::MAX / 2);
        let err = store.record(&argv("ls"), Outcome::Success, false).unwrap_err();
        assert!(matches!(err, HistoryError::Grow { capacity, .. } if capacity == usize::MAX / 2));
        assert!(err.to_string().starts_with("history: cannot grow"));
        assert!(store.is_empty());

        let shell_err = crate::error::ShellError::from(err);
        assert!(!shell_err.is_fatal());
    }

    #[test]
    fn exit_codes_map_to_outcomes() {
        assert_eq!(Outcome::from_exit_code(0), Outcome::Success);
        assert_eq!(Outcome::from_exit_code(1), Outcome::Failed);
        assert_eq!(Outcome::from_exit_code(127), Outcome::Failed);
    }
}
