//! Content tree diff indexing.
//!
//! [`ContentIndexer`] compares two versions of a content tree and stages the
//! index changes that bring the index from one to the other. The walk uses an
//! explicit stack of frames, each carrying its own absolute path.

use nlsearch_core::{Document, StoreError};
use nlsearch_store::IndexWriter;
use tracing::debug;

use crate::content::ContentNode;

/// Counts of what a diff staged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffSummary {
    /// Nodes present in the new tree
    pub visited: usize,
    /// Documents staged for upsert
    pub upserted: usize,
    /// Removed subtrees staged for deletion
    pub deleted: usize,
}

struct Frame<'a> {
    path: String,
    before: Option<&'a ContentNode>,
    after: &'a ContentNode,
}

/// Turns content tree changes into index writer operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentIndexer;

impl ContentIndexer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Stage the changes between `before` and `after` on `writer`.
    ///
    /// Added nodes and nodes whose properties changed are upserted. Children
    /// missing from `after` are deleted with their whole subtree. Nothing is
    /// visible to readers until the writer commits.
    pub fn apply_diff(
        &self,
        before: &ContentNode,
        after: &ContentNode,
        writer: &mut IndexWriter,
    ) -> Result<DiffSummary, StoreError> {
        self.walk(Some(before), after, writer)
    }

    /// Stage every node of `tree`, the root included, as new.
    pub fn index_tree(
        &self,
        tree: &ContentNode,
        writer: &mut IndexWriter,
    ) -> Result<DiffSummary, StoreError> {
        self.walk(None, tree, writer)
    }

    fn walk(
        &self,
        before: Option<&ContentNode>,
        after: &ContentNode,
        writer: &mut IndexWriter,
    ) -> Result<DiffSummary, StoreError> {
        let mut summary = DiffSummary::default();
        let mut stack = vec![Frame {
            path: "/".to_string(),
            before,
            after,
        }];

        while let Some(Frame {
            path,
            before,
            after,
        }) = stack.pop()
        {
            summary.visited += 1;

            if let Some(before) = before {
                for name in before.children.keys() {
                    if !after.children.contains_key(name) {
                        let removed = child_path(&path, name);
                        debug!("Node removed: {}", removed);
                        writer.delete_subtree(&removed)?;
                        summary.deleted += 1;
                    }
                }
            }

            // Reverse so children pop in name order.
            for (name, child) in after.children.iter().rev() {
                stack.push(Frame {
                    path: child_path(&path, name),
                    before: before.and_then(|b| b.children.get(name)),
                    after: child,
                });
            }

            let changed = before.is_none_or(|b| b.properties != after.properties);
            if changed {
                let mut document = Document::new(path);
                document.fields = after.fields();
                writer.upsert(document)?;
                summary.upserted += 1;
            }
        }

        debug!(
            "Diff staged: {} visited, {} upserted, {} deleted",
            summary.visited, summary.upserted, summary.deleted
        );
        Ok(summary)
    }
}

fn child_path(parent: &str, name: &str) -> String {
    if parent == "/" {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}
