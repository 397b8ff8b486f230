//! Background location sharing.
//!
//! Runs a [`LocationPublisher`] as a detached task so sharing outlives the
//! screen that started it. The task owns its own platform clone and only
//! reports lifecycle changes back to the runtime.

use std::{collections::VecDeque, sync::Arc};

use rakhwala_core::{
    Capability, Environment, LocationPublisher, PublisherAction, PublisherConfig, PublisherState,
    RemoteStore, SafetyError,
};
use rakhwala_proto::{AccessCode, LocationRecord};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};

use crate::{AppEvent, Platform};

/// Handle to a running sharing task.
///
/// Dropping the handle stops the task after its current step.
pub struct SharingHandle {
    code: AccessCode,
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SharingHandle {
    /// Start publishing this device's location under `code`.
    pub fn spawn<P: Platform, E: Environment>(
        platform: P,
        env: E,
        remote: Arc<dyn RemoteStore>,
        code: AccessCode,
        config: PublisherConfig,
        events: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        let (stop, stop_rx) = watch::channel(false);
        let task = tokio::spawn(run_sharing(platform, env, remote, code, config, stop_rx, events));
        Self { code, stop, task }
    }

    /// Code being published.
    pub fn code(&self) -> AccessCode {
        self.code
    }

    /// Ask the task to stop. Idempotent. An in-flight write still lands.
    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }

    /// Whether the task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

async fn run_sharing<P: Platform, E: Environment>(
    platform: P,
    env: E,
    remote: Arc<dyn RemoteStore>,
    code: AccessCode,
    config: PublisherConfig,
    mut stop: watch::Receiver<bool>,
    events: mpsc::UnboundedSender<AppEvent>,
) {
    let mut publisher = LocationPublisher::<E::Instant>::new(config);
    let granted = platform.has_permission(Capability::FineLocation);
    let mut pending: VecDeque<PublisherAction> = publisher.start(code, granted, env.now()).into();
    let mut announced = false;

    'sharing: loop {
        while let Some(action) = pending.pop_front() {
            if *stop.borrow() {
                break 'sharing;
            }
            if !announced && publisher.state() == PublisherState::Publishing {
                announced = true;
                let _ = events.send(AppEvent::SharingStarted { code });
            }

            match action {
                PublisherAction::RequestPermission => {
                    let granted = tokio::select! {
                        granted = platform.request_permission(Capability::FineLocation) => Some(granted),
                        _ = stop.changed() => None,
                    };
                    let Some(granted) = granted else {
                        break 'sharing;
                    };

                    pending.extend(publisher.permission_resolved(granted, env.now()));
                    if publisher.state() == PublisherState::Idle {
                        let error = SafetyError::PermissionDenied(Capability::FineLocation);
                        let _ = events.send(AppEvent::SharingFailed { code, error });
                        return;
                    }
                },
                PublisherAction::RequestFix => {
                    match platform.current_location().await {
                        Ok(sample) => pending.extend(publisher.on_sample(sample, env.now())),
                        Err(err) => tracing::warn!(%code, error = %err, "location fix failed"),
                    }
                },
                PublisherAction::Publish { path, sample } => {
                    let value = match serde_json::to_value(LocationRecord::from(sample)) {
                        Ok(value) => value,
                        Err(err) => {
                            tracing::error!(error = %err, "failed to encode location");
                            continue;
                        },
                    };
                    match remote.set(&path, value).await {
                        Ok(()) => tracing::debug!(%path, "location published"),
                        Err(err) => tracing::warn!(%path, error = %err, "location publish failed"),
                    }
                },
            }
        }

        let woke = tokio::select! {
            () = env.sleep(publisher.config().interval) => true,
            _ = stop.changed() => false,
        };
        if !woke {
            break;
        }
        pending.extend(publisher.tick(env.now()));
    }

    publisher.stop();
    let _ = events.send(AppEvent::SharingStopped { code });
}
