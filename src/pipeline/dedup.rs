//! Memory of previously kept lines.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use crate::config::DedupStrategy;

/// Remembers lines that were already written.
pub trait SeenLines {
    /// Record `line`. Returns `true` if it had not been seen before.
    fn insert(&mut self, line: &str) -> bool;

    /// Number of distinct lines remembered.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Stores every line verbatim. Exact; grows with the distinct-line count.
#[derive(Debug, Default)]
pub struct ExactLines {
    lines: HashSet<String>,
}

impl SeenLines for ExactLines {
    fn insert(&mut self, line: &str) -> bool {
        if self.lines.contains(line) {
            return false;
        }
        self.lines.insert(line.to_owned())
    }

    fn len(&self) -> usize {
        self.lines.len()
    }
}

/// Stores a 64-bit fingerprint per line.
///
/// Eight bytes per distinct line regardless of length. Two different lines
/// sharing a fingerprint makes the later one count as a duplicate.
#[derive(Debug, Default)]
pub struct HashedLines {
    fingerprints: HashSet<u64>,
}

impl HashedLines {
    fn fingerprint(line: &str) -> u64 {
        // DefaultHasher::new uses fixed keys, so fingerprints are stable
        let mut hasher = DefaultHasher::new();
        line.hash(&mut hasher);
        hasher.finish()
    }
}

impl SeenLines for HashedLines {
    fn insert(&mut self, line: &str) -> bool {
        self.fingerprints.insert(Self::fingerprint(line))
    }

    fn len(&self) -> usize {
        self.fingerprints.len()
    }
}

/// Build the store for a strategy.
pub fn seen_lines(strategy: DedupStrategy) -> Box<dyn SeenLines> {
    match strategy {
        DedupStrategy::Exact => Box::<ExactLines>::default(),
        DedupStrategy::Hashed => Box::<HashedLines>::default(),
    }
}
