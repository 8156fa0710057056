//! Errors raised by structural passes.
//!
//! Every variant signals a defect in the producer or in a pass, never a
//! user-facing condition. The public fatal entry points turn them into
//! panics; the `try_` variants hand them to drivers that want to report
//! the failure themselves.

use scf_ir::{NodeId, ValueId, VerifyError};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RewriteError {
    /// The graph failed verification before the pass touched it.
    #[error("input graph is malformed: {0}")]
    MalformedInput(#[source] VerifyError),

    /// A loop's inputs, blocks, or outputs do not fit its shape.
    #[error("{node} is malformed: {source}")]
    MalformedLoop { node: NodeId, source: VerifyError },

    /// A condition block uses a value that is neither defined inside it
    /// nor available before the loop, so no clone of it can be bound.
    #[error(
        "condition of {node} uses {value}, which is neither defined in the \
         condition nor available before the loop"
    )]
    ConditionOutOfScope { node: NodeId, value: ValueId },

    /// A loop's initial carried value is not available before the loop.
    #[error("{node} carries {value} in from a point that does not dominate it")]
    EntryValueOutOfScope { node: NodeId, value: ValueId },

    /// A rewritten loop no longer fits the guarded shape.
    #[error("rewriting {node} left it malformed: {source}")]
    BrokenRewrite { node: NodeId, source: VerifyError },

    /// The graph failed verification after the pass.
    #[error("normalized graph is malformed: {0}")]
    MalformedOutput(#[source] VerifyError),
}
