//! The pure append-only log value type.

use serde::{Deserialize, Serialize};

use graft_types::Value;

/// One entry in a log — any value.
pub type LogEntry = Value;

/// An immutable ordered sequence of entries.
///
/// `append` returns a new log; entries are never edited or removed.
/// All projections are total: out-of-range slices are empty and
/// [`Log::at`] returns `None` as the explicit absent marker. A log is
/// plain data — it can live directly inside a record field via
/// [`Log::to_value`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Log {
    entries: Vec<LogEntry>,
}

impl Log {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<LogEntry>) -> Self {
        Self { entries }
    }

    /// Append a batch, returning the extended log. Pure; the receiver
    /// is untouched.
    pub fn append(&self, items: impl IntoIterator<Item = LogEntry>) -> Log {
        let mut entries = self.entries.clone();
        entries.extend(items);
        Log { entries }
    }

    pub fn all(&self) -> &[LogEntry] {
        &self.entries
    }

    /// First entry, if any.
    pub fn head(&self) -> Option<&LogEntry> {
        self.entries.first()
    }

    /// Last entry, if any.
    pub fn tail(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    /// Entry at `index`, `None` when out of range.
    pub fn at(&self, index: usize) -> Option<&LogEntry> {
        self.entries.get(index)
    }

    /// Entries in `[start, end)`; `None` end means "to the end".
    /// Out-of-range bounds clamp to an empty result rather than fail.
    pub fn slice(&self, start: usize, end: Option<usize>) -> &[LogEntry] {
        let len = self.entries.len();
        let start = start.min(len);
        let end = end.unwrap_or(len).min(len);
        if start >= end {
            &[]
        } else {
            &self.entries[start..end]
        }
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries matching `predicate`, as a new log.
    pub fn filter(&self, predicate: impl Fn(&LogEntry) -> bool) -> Log {
        Log {
            entries: self
                .entries
                .iter()
                .filter(|entry| predicate(entry))
                .cloned()
                .collect(),
        }
    }

    /// Entries in reverse order, as a new log.
    pub fn reverse(&self) -> Log {
        let mut entries = self.entries.clone();
        entries.reverse();
        Log { entries }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LogEntry> {
        self.entries.iter()
    }

    /// View the log as a record-storable value.
    pub fn to_value(&self) -> Value {
        Value::List(self.entries.clone())
    }

    /// Read a log back out of a record field; `None` unless the value
    /// is a list.
    pub fn from_value(value: &Value) -> Option<Log> {
        value.as_list().map(|items| Log {
            entries: items.to_vec(),
        })
    }
}

impl From<Vec<LogEntry>> for Log {
    fn from(entries: Vec<LogEntry>) -> Self {
        Self { entries }
    }
}

impl<'a> IntoIterator for &'a Log {
    type Item = &'a LogEntry;
    type IntoIter = std::slice::Iter<'a, LogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl std::fmt::Display for Log {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Log({} entries)", self.count())
    }
}
