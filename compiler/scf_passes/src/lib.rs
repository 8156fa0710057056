//! Structural passes over the scf IR.
//!
//! - **[`splice_before`]**: move a detached donor block's nodes in front of
//!   an anchor node, preserving order and value identity.
//! - **[`inline_loop_conditions`]**: rewrite every structured loop into
//!   guarded form (loop rotation), duplicating the condition block before
//!   the loop and at the end of the body.
//!
//! Both operate in place on a [`scf_ir::Graph`]. Invariant violations are
//! producer or pass bugs: the plain entry points panic, the `try_` entry
//! points return a [`RewriteError`].

mod error;
mod inline_loop_condition;
mod options;
mod splice;

#[cfg(test)]
mod test_helpers;

use std::sync::Once;

pub use error::RewriteError;
pub use inline_loop_condition::{
    inline_loop_conditions, inline_loop_conditions_with, try_inline_loop_conditions,
    try_inline_loop_conditions_with, InlineStats,
};
pub use options::{InlineOptions, VerifyMode};
pub use splice::splice_before;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for pass debugging.
///
/// Set `RUST_LOG=scf_passes=trace` to see every splice and loop rewrite.
/// Does nothing when `RUST_LOG` is unset. Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_tracing_can_run_twice() {
        init_tracing();
        init_tracing();
        assert!(TRACING_INIT.is_completed());
    }
}
