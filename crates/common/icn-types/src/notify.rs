//! Write-only sink for human-readable progress messages.

/// Receives progress and error notices meant for a person.
///
/// Reporting has no behavioral effect; implementations must not fail.
pub trait Notifier: Send + Sync {
    fn report(&self, msg: &str);
}

/// Forwards notices to `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn report(&self, msg: &str) {
        tracing::info!(target: "icn::notify", "{}", msg);
    }
}

/// Drops every notice.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn report(&self, _msg: &str) {}
}
