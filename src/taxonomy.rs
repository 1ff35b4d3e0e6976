//! Error-type tallies across all parsed execution logs
//!
//! The aggregator is created once per run, handed by `&mut` to the traversal
//! and read at the end. The global tally keeps first-seen order; callers must
//! not assume it is sorted.

use std::collections::HashMap;

use serde::Serialize;

/// The execution an error occurrence belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ErrorScope {
    pub period: String,
    pub turma_id: u32,
    pub activity_id: u32,
    pub student_id: u32,
    pub exercise_id: u32,
}

/// One `(type, count)` row for a single scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorOccurrence {
    #[serde(flatten)]
    pub scope: ErrorScope,
    #[serde(rename = "type")]
    pub error_type: String,
    pub count: u64,
}

/// Accumulates error type names, globally and optionally per scope.
#[derive(Debug, Clone, Default)]
pub struct ErrorTaxonomyAggregator {
    /// `(name, count)` in first-seen order
    tally: Vec<(String, u64)>,
    index: HashMap<String, usize>,
    scoped: Vec<ErrorOccurrence>,
    scoped_index: HashMap<(ErrorScope, String), usize>,
}

impl ErrorTaxonomyAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count each name once per occurrence. The global tally always
    /// accumulates; with a scope, per-scope rows accumulate too.
    pub fn register<I>(&mut self, names: I, scope: Option<&ErrorScope>)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for name in names {
            let name = name.as_ref();
            self.bump(name, 1);
            if let Some(scope) = scope {
                self.bump_scoped(scope, name, 1);
            }
        }
    }

    fn bump(&mut self, name: &str, by: u64) {
        match self.index.get(name) {
            Some(&i) => self.tally[i].1 += by,
            None => {
                self.index.insert(name.to_string(), self.tally.len());
                self.tally.push((name.to_string(), by));
            }
        }
    }

    fn bump_scoped(&mut self, scope: &ErrorScope, name: &str, by: u64) {
        let key = (scope.clone(), name.to_string());
        match self.scoped_index.get(&key) {
            Some(&i) => self.scoped[i].count += by,
            None => {
                self.scoped_index.insert(key, self.scoped.len());
                self.scoped.push(ErrorOccurrence {
                    scope: scope.clone(),
                    error_type: name.to_string(),
                    count: by,
                });
            }
        }
    }

    /// Global `(name, count)` pairs in first-seen order.
    pub fn snapshot(&self) -> Vec<(String, u64)> {
        self.tally.clone()
    }

    /// Per-scope rows in first-seen order. Empty unless scopes were given.
    pub fn scoped_rows(&self) -> &[ErrorOccurrence] {
        &self.scoped
    }

    /// Total number of registered occurrences.
    pub fn total(&self) -> u64 {
        self.tally.iter().map(|(_, count)| count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tally.is_empty()
    }

    /// Fold a partial aggregator into this one, keeping this one's
    /// first-seen order and appending names it has not seen.
    pub fn merge(&mut self, other: ErrorTaxonomyAggregator) {
        for (name, count) in other.tally {
            self.bump(&name, count);
        }
        for row in other.scoped {
            self.bump_scoped(&row.scope, &row.error_type, row.count);
        }
    }
}
