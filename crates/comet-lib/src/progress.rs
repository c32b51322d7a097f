/// Progress and window-title surfaces the core reports into.
/// Implementations forward updates to the console/UI layer.

/// Write-only sink for transfer progress, child output and inline notices.
pub trait ProgressSink: Send + Sync {
    /// A named task (download or launch session) has started.
    fn task_started(&self, name: &str);

    /// Update bytes transferred for the current download.
    /// `total` may be None when the server did not declare a content length.
    fn bytes_transferred(&self, transferred: u64, total: Option<u64>);

    /// The current task has finished (successfully or not).
    fn task_finished(&self, name: &str);

    /// One decoded line of child-process output.
    fn child_line(&self, line: &str);

    /// Elapsed-time display cell for a running launch, in whole seconds.
    fn elapsed(&self, seconds: u64);

    /// A short user-visible message (per-asset failures, classification).
    fn notice(&self, message: &str);

    /// Block until the user acknowledges a detected crash.
    fn await_acknowledgment(&self);
}

/// Hook for setting/restoring the terminal window title around a launch.
pub trait TitleHook: Send + Sync {
    fn set_title(&self, title: &str);
    fn reset_title(&self);
}

/// A sink that swallows everything. Useful for tests and background work.
pub struct SilentSink;

impl ProgressSink for SilentSink {
    fn task_started(&self, _name: &str) {}
    fn bytes_transferred(&self, _transferred: u64, _total: Option<u64>) {}
    fn task_finished(&self, _name: &str) {}
    fn child_line(&self, _line: &str) {}
    fn elapsed(&self, _seconds: u64) {}
    fn notice(&self, _message: &str) {}
    fn await_acknowledgment(&self) {}
}

/// Title hook that does nothing.
pub struct NoopTitle;

impl TitleHook for NoopTitle {
    fn set_title(&self, _title: &str) {}
    fn reset_title(&self) {}
}
