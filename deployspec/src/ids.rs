//! Identifier generation for connectors, functions and streams.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// What an identifier is being generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdKind {
    /// A source connector.
    Source,
    /// A destination connector.
    Destination,
    /// A function.
    Function,
    /// A stream.
    Stream,
}

impl IdKind {
    /// Short prefix used by [`SequentialIdGenerator`].
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Source => "S",
            Self::Destination => "D",
            Self::Function => "F",
            Self::Stream => "T",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Source => 0,
            Self::Destination => 1,
            Self::Function => 2,
            Self::Stream => 3,
        }
    }
}

impl fmt::Display for IdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Destination => write!(f, "destination"),
            Self::Function => write!(f, "function"),
            Self::Stream => write!(f, "stream"),
        }
    }
}

/// Produces unique identifiers for spec entities.
pub trait IdGenerator: Send + Sync + fmt::Debug {
    /// Returns a fresh identifier. Never returns the same value twice.
    fn next_id(&self, kind: IdKind) -> String;
}

/// Random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&self, _kind: IdKind) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic `{prefix}{n}` ids, counted per kind starting at 1.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    counters: [AtomicU64; 4],
}

impl SequentialIdGenerator {
    /// Creates a generator with all counters at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self, kind: IdKind) -> String {
        let n = self.counters[kind.index()].fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}{n}", kind.prefix())
    }
}

/// Which [`IdGenerator`] a session uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// [`UuidIdGenerator`].
    #[default]
    Uuid,
    /// [`SequentialIdGenerator`].
    Sequential,
}

impl IdStrategy {
    /// Builds the generator for this strategy.
    #[must_use]
    pub fn generator(self) -> Box<dyn IdGenerator> {
        match self {
            Self::Uuid => Box::new(UuidIdGenerator),
            Self::Sequential => Box::new(SequentialIdGenerator::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_uuid_ids_are_v4() {
        let id = UuidIdGenerator.next_id(IdKind::Source);
        let parsed = Uuid::parse_str(&id).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn test_sequential_ids_per_kind() {
        let ids = SequentialIdGenerator::new();
        assert_eq!(ids.next_id(IdKind::Source), "S1");
        assert_eq!(ids.next_id(IdKind::Destination), "D1");
        assert_eq!(ids.next_id(IdKind::Destination), "D2");
        assert_eq!(ids.next_id(IdKind::Function), "F1");
        assert_eq!(ids.next_id(IdKind::Stream), "T1");
    }

    #[test]
    fn test_sequential_ids_unique_across_threads() {
        let ids = std::sync::Arc::new(SequentialIdGenerator::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ids = ids.clone();
                std::thread::spawn(move || {
                    (0..100).map(|_| ids.next_id(IdKind::Stream)).collect::<Vec<_>>()
                })
            })
            .collect();

        let all: HashSet<String> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        assert_eq!(all.len(), 400);
    }

    #[test]
    fn test_strategy_builds_generator() {
        let id = IdStrategy::Sequential.generator().next_id(IdKind::Function);
        assert_eq!(id, "F1");
        assert_eq!(IdStrategy::default(), IdStrategy::Uuid);
    }
}
