//! Generic runtime for application orchestration.
//!
//! The Runtime drives the application event loop, coordinating between:
//! - [`App`]: view-model state machine
//! - [`Platform`]: device services
//! - the stores and the route source, through background tasks
//!
//! Every I/O step runs off the dispatch loop in a spawned task and reports
//! back through one channel, so `App` state is only touched here, one event
//! at a time.

use std::{collections::VecDeque, future::Future, sync::Arc};

use rakhwala_core::{
    CallAction, Capability, ContactStore, Environment, LocalStore, PublisherConfig, RemoteStore,
    RouteSource, SafetyError, SessionContext, SosAction, SosConfig, SosInput, dispatch_alerts,
    route::DEFAULT_REFERRER,
};
use rakhwala_proto::{StorePath, UserId};
use tokio::sync::mpsc;

use crate::{App, AppAction, AppEvent, Platform, PlatformError, SharingHandle, TrackingHandle};

/// Runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Location publisher timing.
    pub publisher: PublisherConfig,
    /// SOS behavior.
    pub sos: SosConfig,
    /// Referrer passed to external navigation.
    pub referrer: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            publisher: PublisherConfig::default(),
            sos: SosConfig::default(),
            referrer: DEFAULT_REFERRER.to_string(),
        }
    }
}

/// Generic runtime that orchestrates App, Platform and the stores.
///
/// # Type Parameters
///
/// - `P`: device services
/// - `E`: time and randomness
/// - `S`: device-local persisted state
pub struct Runtime<P, E, S>
where
    P: Platform,
    E: Environment,
    S: LocalStore,
{
    platform: P,
    env: E,
    storage: S,
    session: SessionContext,
    remote: Arc<dyn RemoteStore>,
    contacts: ContactStore,
    routes: Arc<dyn RouteSource>,
    config: RuntimeConfig,
    app: App,
    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
    sharing: Option<SharingHandle>,
    tracking: Option<TrackingHandle>,
}

impl<P, E, S> Runtime<P, E, S>
where
    P: Platform,
    E: Environment,
    S: LocalStore,
{
    /// Load the session from `storage` and build the runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if local state cannot be read or the access code
    /// cannot be persisted.
    pub fn new(
        platform: P,
        env: E,
        storage: S,
        remote: Arc<dyn RemoteStore>,
        routes: Arc<dyn RouteSource>,
        config: RuntimeConfig,
    ) -> Result<Self, SafetyError> {
        let session = SessionContext::load(&storage, &env)?;
        let app = App::new(&session, config.sos.clone(), config.referrer.clone());
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Ok(Self {
            platform,
            env,
            storage,
            session,
            contacts: ContactStore::new(Arc::clone(&remote)),
            remote,
            routes,
            config,
            app,
            events_tx,
            events_rx,
            sharing: None,
            tracking: None,
        })
    }

    /// Run the main event loop until the user quits or the UI closes.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    pub async fn run(mut self) -> Result<(), PlatformError> {
        let actions = self.app.start();
        if self.process_actions(actions).await? {
            self.shutdown();
            return Ok(());
        }

        loop {
            let event = tokio::select! {
                event = self.platform.poll_event() => match event {
                    Some(event) => event,
                    None => break,
                },
                Some(event) = self.events_rx.recv() => event,
            };

            let actions = self.app.handle(event);
            if self.process_actions(actions).await? {
                break;
            }
        }

        self.shutdown();
        Ok(())
    }

    /// Execute actions until none are pending.
    ///
    /// Returns `true` if should quit.
    async fn process_actions(&mut self, initial: Vec<AppAction>) -> Result<bool, PlatformError> {
        let mut pending: VecDeque<AppAction> = initial.into();

        while let Some(action) = pending.pop_front() {
            match action {
                AppAction::Render => self.platform.render(&self.app)?,
                AppAction::Quit => return Ok(true),

                AppAction::Sos(action) => {
                    if let Some(event) = self.execute_sos(action) {
                        pending.extend(self.app.handle(event));
                    }
                },

                AppAction::LoadContacts => match self.session.user_id() {
                    Ok(user) => {
                        let (contacts, user) = (self.contacts.clone(), user.clone());
                        self.spawn(async move { AppEvent::ContactsLoaded(contacts.list(&user).await) });
                    },
                    Err(err) => pending.extend(self.app.handle(AppEvent::ContactsLoaded(Err(err)))),
                },
                AppAction::AddContact(contact) => match self.session.user_id() {
                    Ok(user) => {
                        let (contacts, user) = (self.contacts.clone(), user.clone());
                        self.spawn(async move { AppEvent::ContactsLoaded(contacts.add(&user, &contact).await) });
                    },
                    Err(err) => pending.extend(self.app.handle(AppEvent::Failure(err))),
                },
                AppAction::DeleteContact(id) => match self.session.user_id() {
                    Ok(user) => {
                        let (contacts, user) = (self.contacts.clone(), user.clone());
                        self.spawn(async move {
                            AppEvent::ContactsLoaded(contacts.remove_by_id(&user, &id).await)
                        });
                    },
                    Err(err) => pending.extend(self.app.handle(AppEvent::Failure(err))),
                },

                AppAction::StartSharing { code } => {
                    if self.sharing.as_ref().is_some_and(|h| !h.is_finished()) {
                        tracing::debug!(%code, "sharing already running");
                        continue;
                    }
                    self.sharing = Some(SharingHandle::spawn(
                        self.platform.clone(),
                        self.env.clone(),
                        Arc::clone(&self.remote),
                        code,
                        self.config.publisher,
                        self.events_tx.clone(),
                    ));
                },
                AppAction::StopSharing => {
                    if let Some(handle) = self.sharing.take() {
                        handle.stop();
                    }
                },

                AppAction::StartTracking { code } => {
                    // Replacing the handle drops the previous subscription.
                    let subscription = self.remote.subscribe(&StorePath::location(code));
                    self.tracking = Some(TrackingHandle::spawn(code, subscription, self.events_tx.clone()));
                },
                AppAction::StopTracking => {
                    self.tracking = None;
                },

                AppAction::ResolveRouteOrigin { destination } => {
                    let platform = self.platform.clone();
                    self.spawn(async move {
                        let origin = platform.last_known_location().await;
                        AppEvent::RouteOrigin { destination, origin }
                    });
                },
                AppAction::FetchRoutes(query) => {
                    let routes = Arc::clone(&self.routes);
                    self.spawn(async move { AppEvent::RoutesLoaded(routes.routes(&query).await) });
                },
                AppAction::OpenNavigation(intent) => {
                    if let Err(err) = self.platform.open_navigation(&intent) {
                        pending.extend(self.app.handle(platform_failure(err)));
                    }
                },

                AppAction::Call(action) => {
                    let result = match &action {
                        CallAction::RouteAudioToSpeaker => self.platform.route_audio_to_speaker(),
                        CallAction::Speak(text) => self.platform.speak(text),
                    };
                    if let Err(err) = result {
                        pending.extend(self.app.handle(platform_failure(err)));
                    }
                },

                AppAction::SignIn(user) => {
                    let event = self.sign_in(user);
                    pending.extend(self.app.handle(event));
                },
                AppAction::SignOut => {
                    let event = match self.session.sign_out(&self.storage) {
                        Ok(()) => AppEvent::SessionChanged { signed_in: false },
                        Err(err) => AppEvent::Failure(err),
                    };
                    pending.extend(self.app.handle(event));
                },
            }
        }
        Ok(false)
    }

    /// Start one SOS step. Returns an event to feed back immediately when
    /// the step needs no I/O.
    fn execute_sos(&mut self, action: SosAction) -> Option<AppEvent> {
        match action {
            SosAction::EnsurePermission(capability) => {
                if self.platform.has_permission(capability) {
                    return Some(AppEvent::Sos(SosInput::PermissionResolved { capability, granted: true }));
                }
                let platform = self.platform.clone();
                self.spawn(async move {
                    let granted = platform.request_permission(capability).await;
                    AppEvent::Sos(SosInput::PermissionResolved { capability, granted })
                });
                None
            },
            SosAction::ReadLastLocation => {
                let platform = self.platform.clone();
                self.spawn(async move {
                    AppEvent::Sos(SosInput::LocationResolved(platform.last_known_location().await))
                });
                None
            },
            SosAction::LoadContacts => {
                let user = match self.session.user_id() {
                    Ok(user) => user.clone(),
                    Err(err) => return Some(AppEvent::Sos(SosInput::ContactsLoaded(Err(err)))),
                };
                let contacts = self.contacts.clone();
                self.spawn(async move {
                    let loaded = contacts
                        .list(&user)
                        .await
                        .map(|stored| stored.into_iter().map(|s| s.contact).collect());
                    AppEvent::Sos(SosInput::ContactsLoaded(loaded))
                });
                None
            },
            SosAction::SendAlerts { message, recipients } => {
                let platform = self.platform.clone();
                self.spawn(async move {
                    let report = dispatch_alerts(&recipients, &message, |contact, message| {
                        let platform = platform.clone();
                        async move { platform.send_sms(&contact.phone_number, &message).await }
                    })
                    .await;
                    AppEvent::Sos(SosInput::AlertsSent(report))
                });
                None
            },
            SosAction::PlaceCall { number } => {
                if !self.platform.has_permission(Capability::CallPhone) {
                    tracing::warn!("call permission revoked before dialing");
                }
                let platform = self.platform.clone();
                self.spawn(async move {
                    let result = platform.place_call(&number).await.map_err(|e| e.to_string());
                    AppEvent::Sos(SosInput::CallPlaced(result))
                });
                None
            },
            SosAction::Notify(_) | SosAction::Fail(_) | SosAction::Complete(_) => {
                tracing::debug!(?action, "SOS action handled by the app");
                None
            },
        }
    }

    fn sign_in(&mut self, user: UserId) -> AppEvent {
        match self.session.sign_in(&self.storage, user) {
            Ok(()) => AppEvent::SessionChanged { signed_in: true },
            Err(err) => AppEvent::Failure(err),
        }
    }

    /// Run `work` off the dispatch loop and feed its event back.
    fn spawn<F>(&self, work: F)
    where
        F: Future<Output = AppEvent> + Send + 'static,
    {
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let _ = events.send(work.await);
        });
    }

    /// Stop background work on exit.
    fn shutdown(&mut self) {
        self.tracking = None;
        if let Some(handle) = self.sharing.take() {
            handle.stop();
        }
        tracing::info!("runtime stopped");
    }

    /// Get a reference to the App
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Session context in use.
    pub fn session(&self) -> &SessionContext {
        &self.session
    }
}

fn platform_failure(err: PlatformError) -> AppEvent {
    AppEvent::Failure(SafetyError::Platform(err.to_string()))
}
