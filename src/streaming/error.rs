//! Streaming error types.

use thiserror::Error;

/// A failure while producing content for one node.
///
/// Cloneable so memoized futures can hand the same failure to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// An external collaborator reported a failure.
    #[error("{node}: {message}")]
    Collaborator { node: String, message: String },

    /// An external collaborator did not answer in time.
    #[error("{node}: timed out after {secs} seconds")]
    Timeout { node: String, secs: u64 },

    /// A `<fragment>` without a name.
    #[error("fragment element is missing its name")]
    MissingFragmentName,

    /// A `<fragment>` naming nothing the collaborator knows.
    #[error("fragment `{0}` is not registered")]
    UnknownFragment(String),

    /// A spawned producer panicked or was cancelled.
    #[error("{node}: producer task failed: {message}")]
    Task { node: String, message: String },

    #[error(transparent)]
    Merge(#[from] MergeError),
}

impl RenderError {
    pub fn collaborator(node: impl Into<String>, message: impl ToString) -> Self {
        RenderError::Collaborator {
            node: node.into(),
            message: message.to_string(),
        }
    }
}

/// Misuse of an ordered merge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("cannot add `{0}` to an ordered merge that has already ended")]
    Closed(String),

    #[error("ordered merge is already being drained")]
    AlreadyDraining,
}
