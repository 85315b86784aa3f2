//! Where reminder toasts go. Behind a trait so the scheduler can be
//! exercised without a desktop session.

use notify_rust::{Notification, Timeout};

/// Fire-and-forget delivery of a single toast. Implementations must never
/// panic; a failed send is reported upward and logged, nothing more.
pub trait NotificationSink: Send + Sync {
    fn send(&self, title: &str, body: &str, duration_secs: u32) -> anyhow::Result<()>;
}

/// The real thing: a desktop toast on the machine running the service.
pub struct DesktopSink;

impl NotificationSink for DesktopSink {
    fn send(&self, title: &str, body: &str, duration_secs: u32) -> anyhow::Result<()> {
        Notification::new()
            .summary(title)
            .body(body)
            .timeout(Timeout::Milliseconds(duration_secs.saturating_mul(1000)))
            .show()
            .map_err(|e| anyhow::anyhow!("Desktop notification failed: {}", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::NotificationSink;
    use std::sync::Mutex;

    /// Records every toast instead of displaying it.
    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<(String, String, u32)>>,
    }

    impl NotificationSink for RecordingSink {
        fn send(&self, title: &str, body: &str, duration_secs: u32) -> anyhow::Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((title.to_string(), body.to_string(), duration_secs));
            Ok(())
        }
    }

    #[test]
    fn test_sink_is_object_safe_and_callable_through_dyn() {
        let sink = RecordingSink::default();
        let as_dyn: &dyn NotificationSink = &sink;
        as_dyn.send("Title", "Body", 10).unwrap();
        let sent = sink.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], ("Title".into(), "Body".into(), 10));
    }
}
