//! Pass configuration.

/// When to run the full graph verifier around a pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VerifyMode {
    /// Never. Per-loop shape checks still run.
    Never,
    /// Only in builds with `debug_assertions`.
    #[default]
    DebugOnly,
    /// Always, including release builds.
    Always,
}

impl VerifyMode {
    /// Whether verification runs in the current build.
    pub fn enabled(self) -> bool {
        match self {
            VerifyMode::Never => false,
            VerifyMode::DebugOnly => cfg!(debug_assertions),
            VerifyMode::Always => true,
        }
    }
}

/// Options for [`inline_loop_conditions_with`](crate::inline_loop_conditions_with).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InlineOptions {
    /// Verify the whole graph before and after the pass.
    pub verify: VerifyMode,
}

impl InlineOptions {
    /// Set when the full verifier runs.
    pub fn with_verify(mut self, verify: VerifyMode) -> Self {
        self.verify = verify;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_debug_only() {
        assert_eq!(InlineOptions::default().verify, VerifyMode::DebugOnly);
        assert_eq!(VerifyMode::DebugOnly.enabled(), cfg!(debug_assertions));
    }

    #[test]
    fn explicit_modes() {
        assert!(VerifyMode::Always.enabled());
        assert!(!VerifyMode::Never.enabled());
        let opts = InlineOptions::default().with_verify(VerifyMode::Never);
        assert_eq!(opts.verify, VerifyMode::Never);
    }
}
