//! Forward-only cursor over ranked hits.

use nlsearch_core::{CursorError, Hit, PATH_FIELD, SCORE_FIELD};
use serde::Serialize;

/// Lifecycle of a [`ResultCursor`]. There is no way back to an earlier state.
///
/// The state is derived from the position alone. A cursor over no hits is
/// therefore `Exhausted` from the start and never reports `NotStarted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorState {
    NotStarted,
    Iterating,
    Exhausted,
}

/// One result record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexRow {
    #[serde(flatten)]
    hit: Hit,
}

impl IndexRow {
    #[must_use]
    pub fn path(&self) -> &str {
        &self.hit.path
    }

    /// Backend relevance score.
    #[must_use]
    pub fn score(&self) -> f32 {
        self.hit.score
    }

    /// Named value of the row.
    ///
    /// `jcr:score` yields the relevance score and `path` the row path; any
    /// other name is looked up among the stored fields.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<String> {
        match name {
            SCORE_FIELD => Some(self.hit.score.to_string()),
            PATH_FIELD => Some(self.hit.path.clone()),
            _ => self.hit.fields.get(name).cloned(),
        }
    }

    #[must_use]
    pub fn into_hit(self) -> Hit {
        self.hit
    }
}

/// Single-use, forward-only iteration over a ranked hit list.
#[derive(Debug)]
pub struct ResultCursor {
    hits: Vec<Hit>,
    position: usize,
}

impl ResultCursor {
    #[must_use]
    pub fn new(hits: Vec<Hit>) -> Self {
        Self { hits, position: 0 }
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.position < self.hits.len()
    }

    /// Row at the current position; advances by one.
    ///
    /// Fails with [`CursorError::OutOfRange`] on every call past the end.
    pub fn try_next(&mut self) -> Result<IndexRow, CursorError> {
        let hit = self
            .hits
            .get(self.position)
            .cloned()
            .ok_or(CursorError::OutOfRange {
                position: self.position,
                len: self.hits.len(),
            })?;
        self.position += 1;
        Ok(IndexRow { hit })
    }

    /// Unsupported; does nothing.
    pub fn remove(&mut self) {}

    #[must_use]
    pub fn state(&self) -> CursorState {
        if self.position >= self.hits.len() {
            CursorState::Exhausted
        } else if self.position == 0 {
            CursorState::NotStarted
        } else {
            CursorState::Iterating
        }
    }

    /// Total number of hits, consumed or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.hits.len().saturating_sub(self.position)
    }
}

impl Iterator for ResultCursor {
    type Item = IndexRow;

    fn next(&mut self) -> Option<Self::Item> {
        self.try_next().ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining(), Some(self.remaining()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn hit(path: &str, score: f32) -> Hit {
        let mut fields = BTreeMap::new();
        fields.insert("jcr:title".to_string(), format!("title of {path}"));
        Hit {
            path: path.to_string(),
            score,
            fields,
        }
    }

    #[test]
    fn test_state_machine() {
        let mut cursor = ResultCursor::new(vec![hit("/a", 2.0), hit("/b", 1.0)]);
        assert_eq!(cursor.state(), CursorState::NotStarted);
        assert!(cursor.has_next());

        assert_eq!(cursor.try_next().unwrap().path(), "/a");
        assert_eq!(cursor.state(), CursorState::Iterating);

        assert_eq!(cursor.try_next().unwrap().path(), "/b");
        assert_eq!(cursor.state(), CursorState::Exhausted);
        assert!(!cursor.has_next());
    }

    #[test]
    fn test_next_past_end_fails_every_time() {
        let mut cursor = ResultCursor::new(vec![hit("/a", 1.0)]);
        cursor.try_next().unwrap();
        for _ in 0..3 {
            assert_eq!(
                cursor.try_next(),
                Err(CursorError::OutOfRange { position: 1, len: 1 })
            );
        }
        assert_eq!(cursor.state(), CursorState::Exhausted);
    }

    #[test]
    fn test_empty_cursor() {
        let mut cursor = ResultCursor::new(Vec::new());
        // Nothing to start on: exhausted before the first call.
        assert_eq!(cursor.state(), CursorState::Exhausted);
        assert!(cursor.is_empty());
        assert!(!cursor.has_next());
        assert_eq!(cursor.state(), CursorState::Exhausted);
        assert!(cursor.try_next().is_err());
    }

    #[test]
    fn test_remove_is_noop() {
        let mut cursor = ResultCursor::new(vec![hit("/a", 1.0)]);
        cursor.remove();
        assert_eq!(cursor.remaining(), 1);
        assert_eq!(cursor.try_next().unwrap().path(), "/a");
    }

    #[test]
    fn test_row_values() {
        let mut cursor = ResultCursor::new(vec![hit("/a", 1.5)]);
        let row = cursor.try_next().unwrap();
        assert_eq!(row.value("jcr:score"), Some("1.5".to_string()));
        assert_eq!(row.value("path"), Some("/a".to_string()));
        assert_eq!(row.value("jcr:title"), Some("title of /a".to_string()));
        assert_eq!(row.value("missing"), None);
        assert!((row.score() - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_iterator() {
        let cursor = ResultCursor::new(vec![hit("/a", 3.0), hit("/b", 2.0), hit("/c", 1.0)]);
        assert_eq!(cursor.len(), 3);
        let paths: Vec<String> = cursor.map(|row| row.path().to_string()).collect();
        assert_eq!(paths, vec!["/a", "/b", "/c"]);
    }

    #[test]
    fn test_size_hint_tracks_position() {
        let mut cursor = ResultCursor::new(vec![hit("/a", 1.0), hit("/b", 1.0)]);
        assert_eq!(cursor.size_hint(), (2, Some(2)));
        cursor.next();
        assert_eq!(cursor.size_hint(), (1, Some(1)));
    }
}
