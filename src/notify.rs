//! Best-effort user notifications

use std::sync::Arc;

/// Fire-and-forget notification sink. Nothing the engine does depends on
/// delivery.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str, link: Option<&str>);
}

/// Writes notifications to the log only
#[derive(Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, body: &str, link: Option<&str>) {
        tracing::info!(title, body, link = link.unwrap_or_default(), "Notification");
    }
}

/// Desktop notifications, mirrored to the log
#[cfg(feature = "notify")]
#[derive(Default)]
pub struct DesktopNotifier;

#[cfg(feature = "notify")]
impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, body: &str, link: Option<&str>) {
        LogNotifier.notify(title, body, link);
        let title = title.to_string();
        let body = match link {
            Some(link) => format!("{}\n{}", body, link),
            None => body.to_string(),
        };
        tokio::task::spawn_blocking(move || {
            if let Err(e) = notify_rust::Notification::new()
                .appname("cloudtune")
                .summary(&title)
                .body(&body)
                .show()
            {
                tracing::warn!(error = %e, "Desktop notification failed");
            }
        });
    }
}

/// Desktop notifier when enabled, the log otherwise
#[cfg(feature = "notify")]
pub fn build(enabled: bool) -> Arc<dyn Notifier> {
    if enabled {
        Arc::new(DesktopNotifier)
    } else {
        Arc::new(LogNotifier)
    }
}

#[cfg(not(feature = "notify"))]
pub fn build(_enabled: bool) -> Arc<dyn Notifier> {
    Arc::new(LogNotifier)
}
