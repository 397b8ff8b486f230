//! Background tracking of a shared location.

use rakhwala_core::{Subscription, decode_update};
use rakhwala_proto::AccessCode;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::AppEvent;

/// Handle to a running subscription task.
///
/// Transient store errors and malformed records are forwarded as updates
/// and do not end the subscription. A denial (revoked read access) is
/// forwarded as a last update, after which the store closes the subscription
/// and the task reports [`AppEvent::TrackingEnded`]. Dropping the handle
/// cancels the task, which drops the subscription.
pub struct TrackingHandle {
    code: AccessCode,
    task: JoinHandle<()>,
}

impl TrackingHandle {
    /// Forward every snapshot of `subscription` as [`AppEvent::Tracked`].
    pub fn spawn(code: AccessCode, mut subscription: Subscription, events: mpsc::UnboundedSender<AppEvent>) -> Self {
        let task = tokio::spawn(async move {
            while let Some(item) = subscription.next().await {
                let update = decode_update(item);
                if events.send(AppEvent::Tracked { code, update }).is_err() {
                    return;
                }
            }
            tracing::debug!(%code, "tracking subscription closed");
            let _ = events.send(AppEvent::TrackingEnded { code });
        });
        Self { code, task }
    }

    /// Code being followed.
    pub fn code(&self) -> AccessCode {
        self.code
    }
}

impl Drop for TrackingHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
