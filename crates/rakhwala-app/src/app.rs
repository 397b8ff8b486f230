//! Application state machine.
//!
//! [`App`] owns everything the screens show (contacts, routes, tracked map,
//! sharing status, the transient status line) and the pure workflow
//! machines behind them ([`SosFlow`], [`CallMonitor`]). It consumes
//! [`AppEvent`]s and produces [`AppAction`]s; it performs no I/O.

use rakhwala_core::{
    CallMonitor, MapView, RouteError, SafetyError, SessionContext, SosAction, SosConfig, SosFlow,
    SosOutcome, TrackUpdate, navigation_intent,
};
use rakhwala_proto::{AccessCode, Contact, ContactId, Coordinate, Route, RouteQuery, StoredContact, UserId};

use crate::{AppAction, AppEvent, RouteStatus, SharingStatus, UserCommand};

/// Application state machine.
///
/// Pure state machine that processes events and produces actions.
/// No I/O dependencies, fully testable in simulation.
#[derive(Debug, Clone)]
pub struct App {
    /// This device's access code, shown on the sharing screen.
    access_code: AccessCode,
    /// Whether a user is signed in.
    signed_in: bool,
    /// SOS pipeline.
    sos: SosFlow,
    /// Result of the last finished SOS attempt.
    last_sos: Option<SosOutcome>,
    /// Speaks the SOS message on pickup while the screen is open.
    call_monitor: CallMonitor,
    /// Emergency contacts, in store order.
    contacts: Vec<StoredContact>,
    /// Live location sharing status.
    sharing: SharingStatus,
    /// Code being followed. `None` if not tracking.
    tracking: Option<AccessCode>,
    /// Map for the tracked code.
    map: MapView,
    /// Ranked routes, in API order.
    routes: Vec<Route>,
    /// Route list status.
    route_status: RouteStatus,
    /// Referrer passed to external navigation.
    referrer: String,
    /// Transient status message. `None` if no message.
    status_message: Option<String>,
}

impl App {
    /// Create an App for the given session.
    pub fn new(session: &SessionContext, sos: SosConfig, referrer: impl Into<String>) -> Self {
        let call_monitor = CallMonitor::new(sos.spoken_message.clone());
        Self {
            access_code: session.access_code(),
            signed_in: session.is_signed_in(),
            sos: SosFlow::new(sos),
            last_sos: None,
            call_monitor,
            contacts: Vec::new(),
            sharing: SharingStatus::Stopped,
            tracking: None,
            map: MapView::default(),
            routes: Vec::new(),
            route_status: RouteStatus::Idle,
            referrer: referrer.into(),
            status_message: None,
        }
    }

    /// Open the hosting screen: register the call monitor and load contacts.
    pub fn start(&mut self) -> Vec<AppAction> {
        self.call_monitor.register();
        let mut actions = self.refresh_contacts();
        actions.push(AppAction::Render);
        actions
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::Command(command) => self.command(command),

            AppEvent::Sos(input) => {
                let actions = self.sos.handle(input);
                self.sos_actions(actions)
            },

            AppEvent::ContactsLoaded(Ok(contacts)) => {
                if !self.signed_in {
                    tracing::debug!("dropping contacts loaded before sign-out");
                    return vec![];
                }
                self.contacts = contacts;
                vec![AppAction::Render]
            },
            AppEvent::ContactsLoaded(Err(err)) => self.fail(&err),

            AppEvent::SharingStarted { code } => {
                if self.sharing_code() != Some(code) {
                    tracing::debug!(%code, "ignoring start of a stopped sharing session");
                    return vec![];
                }
                self.sharing = SharingStatus::Active(code);
                self.status_message = Some(format!("Sharing location with code {code}"));
                vec![AppAction::Render]
            },
            AppEvent::SharingStopped { code } => {
                if self.sharing_code() == Some(code) {
                    self.sharing = SharingStatus::Stopped;
                    self.status_message = Some("Location sharing stopped".to_string());
                }
                vec![AppAction::Render]
            },
            AppEvent::SharingFailed { code, error } => {
                if self.sharing_code() == Some(code) {
                    self.sharing = SharingStatus::Stopped;
                }
                self.fail(&error)
            },

            AppEvent::Tracked { code, update } => {
                if self.tracking != Some(code) {
                    tracing::debug!(%code, "ignoring update for stale tracking session");
                    return vec![];
                }
                match &update {
                    TrackUpdate::Position(_) => {},
                    TrackUpdate::NoData => {
                        self.status_message = Some(format!("No location shared under code {code}"));
                    },
                    TrackUpdate::Error(message) => {
                        self.status_message = Some(format!("Error: {message}"));
                    },
                }
                self.map.apply(&update);
                vec![AppAction::Render]
            },
            AppEvent::TrackingEnded { code } => {
                if self.tracking == Some(code) {
                    self.tracking = None;
                }
                vec![AppAction::Render]
            },

            AppEvent::RouteOrigin { destination, origin } => {
                if self.route_status != RouteStatus::Loading {
                    return vec![];
                }
                let Some(origin) = origin else {
                    self.route_status = RouteStatus::Idle;
                    return self.fail(&SafetyError::NoLocationFix);
                };
                let query = RouteQuery { start: Coordinate::from(origin), end: destination };
                vec![AppAction::FetchRoutes(query), AppAction::Render]
            },
            AppEvent::RoutesLoaded(result) => self.routes_loaded(result),

            AppEvent::CallStateChanged(state) => {
                self.call_monitor.on_state(state).into_iter().map(AppAction::Call).collect()
            },

            AppEvent::SessionChanged { signed_in } => {
                self.signed_in = signed_in;
                if signed_in {
                    let mut actions = self.refresh_contacts();
                    actions.push(AppAction::Render);
                    actions
                } else {
                    self.contacts.clear();
                    vec![AppAction::Render]
                }
            },

            AppEvent::Failure(err) => self.fail(&err),
        }
    }

    fn command(&mut self, command: UserCommand) -> Vec<AppAction> {
        match command {
            UserCommand::TriggerSos => self.trigger_sos(),
            UserCommand::StartSharing => self.start_sharing(),
            UserCommand::StopSharing => self.stop_sharing(),
            UserCommand::Track(code) => self.track(&code),
            UserCommand::StopTracking => self.stop_tracking(),
            UserCommand::AddContact { name, phone_number } => self.add_contact(name, phone_number),
            UserCommand::DeleteContact(id) => self.delete_contact(id),
            UserCommand::RefreshContacts => self.refresh_contacts(),
            UserCommand::FindRoutes { destination } => self.find_routes(destination),
            UserCommand::SelectRoute(index) => self.select_route(index),
            UserCommand::SignIn(user) => self.sign_in(user),
            UserCommand::SignOut => self.sign_out(),
            UserCommand::CloseScreen => self.teardown(),
            UserCommand::Quit => self.quit(),
        }
    }

    /// Start an SOS attempt.
    pub fn trigger_sos(&mut self) -> Vec<AppAction> {
        let actions = self.sos.trigger();
        if actions.is_empty() {
            return vec![];
        }
        self.status_message = Some("Sending SOS...".to_string());
        self.sos_actions(actions)
    }

    /// Start sharing location under this device's code.
    pub fn start_sharing(&mut self) -> Vec<AppAction> {
        if self.sharing != SharingStatus::Stopped {
            return vec![];
        }
        self.sharing = SharingStatus::Starting(self.access_code);
        vec![AppAction::StartSharing { code: self.access_code }, AppAction::Render]
    }

    /// Stop sharing location.
    pub fn stop_sharing(&mut self) -> Vec<AppAction> {
        if self.sharing == SharingStatus::Stopped {
            return vec![];
        }
        vec![AppAction::StopSharing]
    }

    /// Follow the location shared under `code`. Surrounding whitespace is
    /// ignored.
    pub fn track(&mut self, code: &str) -> Vec<AppAction> {
        let code = match code.parse::<AccessCode>() {
            Ok(code) => code,
            Err(err) => return self.fail(&SafetyError::Protocol(err)),
        };
        self.tracking = Some(code);
        self.map = MapView::default();
        vec![AppAction::StartTracking { code }, AppAction::Render]
    }

    /// Stop following a shared location.
    pub fn stop_tracking(&mut self) -> Vec<AppAction> {
        if self.tracking.take().is_none() {
            return vec![];
        }
        vec![AppAction::StopTracking, AppAction::Render]
    }

    /// Persist a new contact.
    pub fn add_contact(&mut self, name: String, phone_number: String) -> Vec<AppAction> {
        if !self.signed_in {
            return self.fail(&SafetyError::AuthRequired);
        }
        match Contact::new(name, phone_number) {
            Ok(contact) => vec![AppAction::AddContact(contact)],
            Err(err) => self.fail(&SafetyError::Protocol(err)),
        }
    }

    /// Delete one contact.
    pub fn delete_contact(&mut self, id: ContactId) -> Vec<AppAction> {
        if !self.signed_in {
            return self.fail(&SafetyError::AuthRequired);
        }
        vec![AppAction::DeleteContact(id)]
    }

    /// Reload the contact list.
    pub fn refresh_contacts(&mut self) -> Vec<AppAction> {
        if !self.signed_in {
            return vec![];
        }
        vec![AppAction::LoadContacts]
    }

    /// Query safe routes from the current location to `destination`.
    pub fn find_routes(&mut self, destination: Coordinate) -> Vec<AppAction> {
        if self.route_status == RouteStatus::Loading {
            return vec![];
        }
        self.route_status = RouteStatus::Loading;
        self.routes.clear();
        vec![AppAction::ResolveRouteOrigin { destination }, AppAction::Render]
    }

    /// Open external navigation for the route at `index`.
    pub fn select_route(&mut self, index: usize) -> Vec<AppAction> {
        let Some(route) = self.routes.get(index) else {
            return vec![];
        };
        vec![AppAction::OpenNavigation(navigation_intent(route, &self.referrer))]
    }

    /// Persist a completed sign-in.
    pub fn sign_in(&self, user: UserId) -> Vec<AppAction> {
        vec![AppAction::SignIn(user)]
    }

    /// Persist a sign-out.
    pub fn sign_out(&self) -> Vec<AppAction> {
        vec![AppAction::SignOut]
    }

    /// Close the hosting screen: unregister the call monitor and drop the
    /// tracking subscription. Location sharing keeps running.
    pub fn teardown(&mut self) -> Vec<AppAction> {
        self.call_monitor.unregister();
        let mut actions = self.stop_tracking();
        actions.push(AppAction::Render);
        actions
    }

    /// Quit the application.
    pub fn quit(&mut self) -> Vec<AppAction> {
        let mut actions = self.teardown();
        actions.extend(self.stop_sharing());
        actions.push(AppAction::Quit);
        actions
    }

    fn sos_actions(&mut self, actions: Vec<SosAction>) -> Vec<AppAction> {
        let mut out = Vec::with_capacity(actions.len() + 1);
        for action in actions {
            match action {
                SosAction::Notify(message) => self.status_message = Some(message),
                SosAction::Fail(err) => {
                    self.report(&err);
                },
                SosAction::Complete(outcome) => self.last_sos = Some(outcome),
                other => out.push(AppAction::Sos(other)),
            }
        }
        out.push(AppAction::Render);
        out
    }

    fn routes_loaded(&mut self, result: Result<Vec<Route>, RouteError>) -> Vec<AppAction> {
        if self.route_status != RouteStatus::Loading {
            tracing::debug!("ignoring routes for a finished query");
            return vec![];
        }
        match result {
            Ok(routes) => {
                if routes.is_empty() {
                    self.status_message = Some("No routes found".to_string());
                }
                self.routes = routes;
                self.route_status = RouteStatus::Loaded;
            },
            Err(err) => {
                tracing::warn!(error = %err, "route query failed");
                self.status_message = Some(format!("Error: {err}"));
                self.route_status = RouteStatus::Failed(err);
            },
        }
        vec![AppAction::Render]
    }

    /// Show `err` and re-render, unless it is silent.
    fn fail(&mut self, err: &SafetyError) -> Vec<AppAction> {
        if self.report(err) { vec![AppAction::Render] } else { vec![] }
    }

    /// Put `err` on the status line unless it is silent. Returns whether
    /// anything changed.
    fn report(&mut self, err: &SafetyError) -> bool {
        if err.is_silent() {
            tracing::info!(error = %err, "operation skipped");
            return false;
        }
        tracing::warn!(error = %err, "operation failed");
        self.status_message = Some(status_message(err));
        true
    }

    fn sharing_code(&self) -> Option<AccessCode> {
        match self.sharing {
            SharingStatus::Stopped => None,
            SharingStatus::Starting(code) | SharingStatus::Active(code) => Some(code),
        }
    }

    /// This device's access code.
    pub fn access_code(&self) -> AccessCode {
        self.access_code
    }

    /// Whether a user is signed in.
    pub fn is_signed_in(&self) -> bool {
        self.signed_in
    }

    /// Whether an SOS attempt is running.
    pub fn sos_active(&self) -> bool {
        self.sos.is_active()
    }

    /// Result of the last finished SOS attempt.
    pub fn last_sos(&self) -> Option<&SosOutcome> {
        self.last_sos.as_ref()
    }

    /// Whether the call monitor is registered.
    pub fn call_monitor_registered(&self) -> bool {
        self.call_monitor.is_registered()
    }

    /// Emergency contacts.
    pub fn contacts(&self) -> &[StoredContact] {
        &self.contacts
    }

    /// Location sharing status.
    pub fn sharing(&self) -> SharingStatus {
        self.sharing
    }

    /// Code being followed.
    pub fn tracking(&self) -> Option<AccessCode> {
        self.tracking
    }

    /// Map for the tracked code.
    pub fn map(&self) -> &MapView {
        &self.map
    }

    /// Ranked routes.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Route list status.
    pub fn route_status(&self) -> &RouteStatus {
        &self.route_status
    }

    /// Transient status message. `None` if no message.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }
}

/// User-facing text for an error. Transient failures invite a retry.
pub fn status_message(err: &SafetyError) -> String {
    let text = match err {
        SafetyError::PermissionDenied(capability) => format!("Permission denied: {capability}"),
        SafetyError::NoLocationFix => "Unable to retrieve location".to_string(),
        SafetyError::Network(message) => format!("Network error: {message}"),
        SafetyError::AuthRequired => "Please sign in first".to_string(),
        SafetyError::Storage(err) => format!("Storage error: {err}"),
        SafetyError::Protocol(err) => format!("Invalid input: {err}"),
        SafetyError::Platform(message) => format!("Error: {message}"),
    };
    if err.is_transient() { format!("{text}. Please try again.") } else { text }
}

#[cfg(test)]
mod tests {
    use rakhwala_core::{Capability, CallAction, CallState, SosInput};
    use rakhwala_proto::{AuthSession, LocationSample, SafetyLabel};

    use super::*;

    fn signed_in_app() -> App {
        let session = SessionContext::new(
            AuthSession::signed_in(UserId::new("u1")),
            AccessCode::new(123_456).unwrap(),
        );
        App::new(&session, SosConfig::default(), "test-referrer")
    }

    fn route(index: u32) -> Route {
        Route {
            route_index: index,
            distance: 1000,
            duration: 600,
            safety: SafetyLabel::Safe,
            traffic_info: "Fast".into(),
            police_stations: 1,
            hospitals: 1,
            directions: vec![],
            start_point: Coordinate { latitude: 18.0, longitude: 73.0 },
            end_point: Coordinate { latitude: 18.5, longitude: 73.5 },
        }
    }

    #[test]
    fn start_registers_monitor_and_loads_contacts() {
        let mut app = signed_in_app();
        let actions = app.start();

        assert!(app.call_monitor_registered());
        assert_eq!(actions, vec![AppAction::LoadContacts, AppAction::Render]);
    }

    #[test]
    fn sos_trigger_requests_location_permission() {
        let mut app = signed_in_app();
        let actions = app.trigger_sos();

        assert!(matches!(actions.as_slice(), [
            AppAction::Sos(SosAction::EnsurePermission(Capability::FineLocation)),
            AppAction::Render
        ]));
        assert!(app.sos_active());
    }

    #[test]
    fn sos_no_fix_shows_message() {
        let mut app = signed_in_app();
        app.trigger_sos();
        app.handle(AppEvent::Sos(SosInput::PermissionResolved {
            capability: Capability::FineLocation,
            granted: true,
        }));
        app.handle(AppEvent::Sos(SosInput::LocationResolved(None)));

        assert!(!app.sos_active());
        assert!(app.status_message().unwrap().contains("location"));
        assert!(app.last_sos().unwrap().aborted.is_some());
    }

    #[test]
    fn invalid_code_not_tracked() {
        let mut app = signed_in_app();
        let actions = app.track("12ab56");

        assert_eq!(actions, vec![AppAction::Render]);
        assert_eq!(app.tracking(), None);
    }

    #[test]
    fn track_trims_code() {
        let mut app = signed_in_app();
        let actions = app.track(" 654321 ");
        let code = AccessCode::new(654_321).unwrap();

        assert_eq!(actions, vec![AppAction::StartTracking { code }, AppAction::Render]);
    }

    #[test]
    fn stale_tracking_updates_ignored() {
        let mut app = signed_in_app();
        app.track("654321");
        let other = AccessCode::new(111_111).unwrap();
        let sample = LocationSample::new(1.0, 2.0).unwrap();

        let actions = app.handle(AppEvent::Tracked { code: other, update: TrackUpdate::Position(sample) });
        assert!(actions.is_empty());
        assert_eq!(app.map().marker, None);
    }

    #[test]
    fn tracking_error_keeps_subscription() {
        let mut app = signed_in_app();
        app.track("654321");
        let code = AccessCode::new(654_321).unwrap();

        app.handle(AppEvent::Tracked { code, update: TrackUpdate::Error("offline".into()) });
        assert_eq!(app.tracking(), Some(code));
        assert_eq!(app.status_message(), Some("Error: offline"));
    }

    #[test]
    fn signed_out_contact_ops_are_silent() {
        let session = SessionContext::new(AuthSession::default(), AccessCode::new(123_456).unwrap());
        let mut app = App::new(&session, SosConfig::default(), "r");

        assert!(app.add_contact("Asha".into(), "+91".into()).is_empty());
        assert!(app.delete_contact(ContactId::new("k1")).is_empty());
        assert!(app.refresh_contacts().is_empty());
        assert_eq!(app.status_message(), None);
    }

    #[test]
    fn blank_contact_rejected() {
        let mut app = signed_in_app();
        let actions = app.add_contact("".into(), "+91".into());

        assert_eq!(actions, vec![AppAction::Render]);
        assert!(app.status_message().unwrap().starts_with("Invalid input"));
    }

    #[test]
    fn route_flow() {
        let mut app = signed_in_app();
        let destination = Coordinate { latitude: 18.5, longitude: 73.5 };
        assert!(matches!(app.find_routes(destination).as_slice(), [
            AppAction::ResolveRouteOrigin { .. },
            AppAction::Render
        ]));

        let origin = LocationSample::new(18.0, 73.0).unwrap();
        let actions = app.handle(AppEvent::RouteOrigin { destination, origin: Some(origin) });
        assert!(matches!(actions.as_slice(), [AppAction::FetchRoutes(_), AppAction::Render]));

        app.handle(AppEvent::RoutesLoaded(Ok(vec![route(0), route(1)])));
        assert_eq!(app.routes().len(), 2);

        let actions = app.select_route(1);
        let [AppAction::OpenNavigation(intent)] = actions.as_slice() else {
            panic!("expected navigation, got {actions:?}");
        };
        assert_eq!(intent.uri, "google.navigation:q=18.5,73.5");
        assert_eq!(intent.referrer, "test-referrer");
        assert!(app.select_route(5).is_empty());
    }

    #[test]
    fn route_without_fix_aborts() {
        let mut app = signed_in_app();
        let destination = Coordinate { latitude: 18.5, longitude: 73.5 };
        app.find_routes(destination);

        let actions = app.handle(AppEvent::RouteOrigin { destination, origin: None });
        assert_eq!(actions, vec![AppAction::Render]);
        assert_eq!(app.status_message(), Some("Unable to retrieve location. Please try again."));
    }

    #[test]
    fn transient_failures_invite_retry() {
        assert_eq!(
            status_message(&SafetyError::Network("offline".into())),
            "Network error: offline. Please try again."
        );
        assert_eq!(status_message(&SafetyError::AuthRequired), "Please sign in first");
        assert_eq!(
            status_message(&SafetyError::PermissionDenied(Capability::CallPhone)),
            format!("Permission denied: {}", Capability::CallPhone)
        );
    }

    #[test]
    fn route_status_error_surfaces_code() {
        let mut app = signed_in_app();
        app.find_routes(Coordinate { latitude: 1.0, longitude: 1.0 });
        app.handle(AppEvent::RoutesLoaded(Err(RouteError::Status(404))));

        assert!(app.status_message().unwrap().contains("404"));
        assert_eq!(app.route_status(), &RouteStatus::Failed(RouteError::Status(404)));
    }

    #[test]
    fn pickup_speaks_while_screen_open() {
        let mut app = signed_in_app();
        app.start();

        let actions = app.handle(AppEvent::CallStateChanged(CallState::OffHook));
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0], AppAction::Call(CallAction::RouteAudioToSpeaker));

        app.handle(AppEvent::CallStateChanged(CallState::Idle));
        app.teardown();
        assert!(app.handle(AppEvent::CallStateChanged(CallState::OffHook)).is_empty());
    }

    #[test]
    fn sharing_lifecycle() {
        let mut app = signed_in_app();
        let code = app.access_code();

        assert_eq!(app.start_sharing(), vec![AppAction::StartSharing { code }, AppAction::Render]);
        assert!(app.start_sharing().is_empty());

        app.handle(AppEvent::SharingStarted { code });
        assert_eq!(app.sharing(), SharingStatus::Active(code));

        // Closing the screen does not stop sharing.
        app.teardown();
        assert_eq!(app.sharing(), SharingStatus::Active(code));

        assert_eq!(app.stop_sharing(), vec![AppAction::StopSharing]);
        app.handle(AppEvent::SharingStopped { code });
        assert_eq!(app.sharing(), SharingStatus::Stopped);
    }

    #[test]
    fn sharing_denied_resets() {
        let mut app = signed_in_app();
        let code = app.access_code();
        app.start_sharing();

        app.handle(AppEvent::SharingFailed {
            code,
            error: SafetyError::PermissionDenied(Capability::FineLocation),
        });
        assert_eq!(app.sharing(), SharingStatus::Stopped);
        assert_eq!(app.status_message(), Some("Permission denied: location"));
    }
}
