//! Sink outbound port. Receives human-readable progress and error notices.

/// Destination for cleanup notices.
///
/// Implementations must not fail or panic: a broken sink must never abort a cleanup.
/// The default is [`crate::adapters::logging::TracingSink`].
pub trait CleanupSink: Send + Sync {
    fn info(&self, message: &str);

    /// `detail` is the underlying error rendered for humans.
    fn error(&self, message: &str, detail: &str);
}
