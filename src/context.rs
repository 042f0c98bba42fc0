//! The [`BuildContext`] is a thin capability object threaded through every
//! build stage. It does not own a logger itself — it forwards to `tracing` —
//! but it gives every stage a single, consistent place to report progress and
//! diagnostics, mirroring the original library's `rcContext`.

/// Severity of a message reported through [`BuildContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCategory {
    /// Informational progress message.
    Progress,
    /// A recoverable problem; the build continues with degraded output.
    Warning,
    /// A stage-aborting problem.
    Error,
}

/// Shared logging/timing context for one build.
///
/// Not re-entrant: a single [`BuildContext`] is meant to be used by one build
/// running on one thread at a time, exactly like the original `rcContext`.
/// Multiple concurrent builds should each own their own context.
#[derive(Debug, Default)]
pub struct BuildContext {
    /// Number of warnings logged so far. Exposed for tests that want to assert
    /// a degenerate-input path was taken without a hard failure.
    warning_count: u32,
    /// Number of errors logged so far.
    error_count: u32,
}

impl BuildContext {
    /// Creates a fresh context with no recorded messages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs a message under the given category and stage name.
    pub fn log(&mut self, category: LogCategory, stage: &str, message: impl AsRef<str>) {
        let message = message.as_ref();
        match category {
            LogCategory::Progress => tracing::info!(stage, "{message}"),
            LogCategory::Warning => {
                self.warning_count += 1;
                tracing::warn!(stage, "{message}");
            }
            LogCategory::Error => {
                self.error_count += 1;
                tracing::error!(stage, "{message}");
            }
        }
    }

    /// Convenience wrapper for [`LogCategory::Progress`].
    pub fn log_progress(&mut self, stage: &str, message: impl AsRef<str>) {
        self.log(LogCategory::Progress, stage, message);
    }

    /// Convenience wrapper for [`LogCategory::Warning`].
    pub fn log_warning(&mut self, stage: &str, message: impl AsRef<str>) {
        self.log(LogCategory::Warning, stage, message);
    }

    /// Convenience wrapper for [`LogCategory::Error`].
    pub fn log_error(&mut self, stage: &str, message: impl AsRef<str>) {
        self.log(LogCategory::Error, stage, message);
    }

    /// Total warnings logged so far.
    pub fn warning_count(&self) -> u32 {
        self.warning_count
    }

    /// Total errors logged so far.
    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    /// Runs `f` inside a `tracing` span named after `stage`, giving every
    /// pipeline stage a scoped timer for free via the installed subscriber.
    pub fn scoped<T>(&mut self, stage: &'static str, f: impl FnOnce(&mut Self) -> T) -> T {
        let span = tracing::info_span!("build_stage", stage);
        let _guard = span.enter();
        f(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_warnings_and_errors() {
        let mut ctx = BuildContext::new();
        ctx.log_warning("rasterize", "dropped degenerate triangle");
        ctx.log_error("region", "region id overflow");
        assert_eq!(ctx.warning_count(), 1);
        assert_eq!(ctx.error_count(), 1);
    }
}
