//! End-to-end tests of the Runtime against a simulated device.
//!
//! Each test scripts user input on a [`SimPlatform`], runs the production
//! [`Runtime`] under tokio's paused clock, then checks the recorded device
//! effects and the last rendered frame. Every run also checks the standard
//! invariants on each rendered frame; a violation fails `run()`.

use std::{sync::Arc, time::Duration};

use rakhwala_app::{RouteStatus, Runtime, RuntimeConfig, SharingStatus, UserCommand};
use rakhwala_core::{
    CallOrder, CallState, Capability, ContactStore, LocalStore, MemoryLocalStore, MemoryRemoteStore,
    RemoteStore, RouteError, TrackUpdate, decode_update, navigation_intent,
    route::DEFAULT_REFERRER,
    sos::{EMERGENCY_NUMBER, SPOKEN_MESSAGE},
};
use rakhwala_harness::{Effect, InvariantRegistry, SimEnv, SimPlatform, StaticRouteSource};
use rakhwala_proto::{
    AuthSession, Contact, Coordinate, LocationRecord, LocationSample, Route, RouteQuery, SafetyLabel,
    StorePath, UserId,
};

struct Fixture {
    platform: SimPlatform,
    storage: MemoryLocalStore,
    remote: MemoryRemoteStore,
    routes: StaticRouteSource,
    config: RuntimeConfig,
}

impl Fixture {
    fn new() -> Self {
        Self {
            platform: SimPlatform::new().with_invariants(InvariantRegistry::standard()),
            storage: MemoryLocalStore::new(),
            remote: MemoryRemoteStore::new(),
            routes: StaticRouteSource::new(Vec::new()),
            config: RuntimeConfig::default(),
        }
    }

    fn signed_in() -> Self {
        let fixture = Self::new();
        fixture.storage.store_session(&AuthSession::signed_in(user())).unwrap();
        fixture
    }

    fn contacts(&self) -> ContactStore {
        ContactStore::new(Arc::new(self.remote.clone()))
    }

    fn runtime(&self) -> Runtime<SimPlatform, SimEnv, MemoryLocalStore> {
        Runtime::new(
            self.platform.clone(),
            SimEnv::with_seed(42),
            self.storage.clone(),
            Arc::new(self.remote.clone()),
            Arc::new(self.routes.clone()),
            self.config.clone(),
        )
        .unwrap()
    }

    async fn run(&self) {
        self.runtime().run().await.unwrap();
    }
}

fn user() -> UserId {
    UserId::new("u1")
}

fn sample(latitude: f64, longitude: f64) -> LocationSample {
    LocationSample::new(latitude, longitude).unwrap()
}

fn route(index: u32, end: Coordinate) -> Route {
    Route {
        route_index: index,
        distance: 4200,
        duration: 900,
        safety: SafetyLabel::Safe,
        traffic_info: "Fast".to_string(),
        police_stations: 2,
        hospitals: 1,
        directions: Vec::new(),
        start_point: Coordinate { latitude: 18.52, longitude: 73.85 },
        end_point: end,
    }
}

#[tokio::test(start_paused = true)]
async fn sos_texts_every_contact_then_calls() {
    let fixture = Fixture::signed_in();
    let contacts = fixture.contacts();
    for (name, number) in [("Asha", "111"), ("Bina", "222"), ("Chitra", "333")] {
        contacts.add(&user(), &Contact::new(name, number).unwrap()).await.unwrap();
    }

    let platform = &fixture.platform;
    platform.grant(Capability::FineLocation);
    platform.answer_prompt(Capability::CallPhone, true);
    platform.set_last_known(Some(sample(12.34, 56.78)));
    platform.fail_sms_to("222");
    platform.command(UserCommand::TriggerSos);
    platform.idle(Duration::from_secs(1));

    fixture.run().await;

    let message =
        "HELP ME! I am in danger. Please send help. My location is: https://www.google.com/maps?q=12.34,56.78";
    let mut sent = platform.sms();
    sent.sort();
    assert_eq!(sent, vec![("111".to_string(), message.to_string()), ("333".to_string(), message.to_string())]);
    assert_eq!(platform.calls(), vec![EMERGENCY_NUMBER.to_string()]);

    // The call permission is asked for only after the texts went out.
    let effects = platform.effects();
    let prompt = effects.iter().position(|e| *e == Effect::PermissionPrompt(Capability::CallPhone)).unwrap();
    let last_sms = effects.iter().rposition(|e| matches!(e, Effect::Sms { .. })).unwrap();
    assert!(last_sms < prompt);

    let app = platform.last_render().unwrap();
    let outcome = app.last_sos().unwrap();
    assert!(outcome.call_placed);
    assert_eq!(outcome.alerts.as_ref().map(|r| (r.sent, r.failures.len())), Some((2, 1)));
    assert!(app.status_message().unwrap().starts_with("SOS sent to 2 of 3 contact(s); failed: Bina"));
    assert!(!app.sos_active());
}

#[tokio::test(start_paused = true)]
async fn sos_call_first_when_configured() {
    let mut fixture = Fixture::signed_in();
    fixture.config.sos.call_order = CallOrder::BeforeSms;
    fixture.contacts().add(&user(), &Contact::new("Asha", "111").unwrap()).await.unwrap();

    let platform = &fixture.platform;
    platform.grant(Capability::FineLocation);
    platform.grant(Capability::CallPhone);
    platform.set_last_known(Some(sample(18.5, 73.8)));
    platform.command(UserCommand::TriggerSos);
    platform.idle(Duration::from_secs(1));

    fixture.run().await;

    let effects = platform.effects();
    let call = effects.iter().position(|e| matches!(e, Effect::Call(_))).unwrap();
    let sms = effects.iter().position(|e| matches!(e, Effect::Sms { .. })).unwrap();
    assert!(call < sms);
}

#[tokio::test(start_paused = true)]
async fn sos_denied_location_sends_nothing() {
    let fixture = Fixture::signed_in();
    fixture.contacts().add(&user(), &Contact::new("Asha", "111").unwrap()).await.unwrap();

    let platform = &fixture.platform;
    platform.answer_prompt(Capability::FineLocation, false);
    platform.grant(Capability::CallPhone);
    platform.set_last_known(Some(sample(18.5, 73.8)));
    platform.command(UserCommand::TriggerSos);
    platform.idle(Duration::from_secs(1));

    fixture.run().await;

    assert!(platform.sms().is_empty());
    assert!(platform.calls().is_empty());
    let app = platform.last_render().unwrap();
    assert_eq!(app.status_message(), Some("Permission denied: location"));
    assert!(app.last_sos().unwrap().aborted.is_some());
}

#[tokio::test(start_paused = true)]
async fn sos_without_fix_sends_nothing() {
    let fixture = Fixture::signed_in();
    let platform = &fixture.platform;
    platform.grant(Capability::FineLocation);
    platform.grant(Capability::CallPhone);
    platform.command(UserCommand::TriggerSos);
    platform.idle(Duration::from_secs(1));

    fixture.run().await;

    assert!(platform.sms().is_empty());
    assert!(platform.calls().is_empty());
    assert_eq!(platform.last_render().unwrap().status_message(), Some("Unable to retrieve location. Please try again."));
}

#[tokio::test(start_paused = true)]
async fn signed_out_sos_still_calls() {
    let fixture = Fixture::new();
    let platform = &fixture.platform;
    platform.grant(Capability::FineLocation);
    platform.grant(Capability::CallPhone);
    platform.set_last_known(Some(sample(18.5, 73.8)));
    platform.command(UserCommand::TriggerSos);
    platform.idle(Duration::from_secs(1));

    fixture.run().await;

    assert!(platform.sms().is_empty());
    assert_eq!(platform.calls(), vec![EMERGENCY_NUMBER.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn sharing_overwrites_latest_sample() {
    let fixture = Fixture::new();
    let platform = fixture.platform.clone();
    platform.grant(Capability::FineLocation);
    platform.set_current_fix(Some(sample(18.50, 73.80)));
    platform.command(UserCommand::StartSharing);
    platform.command_after(Duration::from_secs(30), UserCommand::StopSharing);
    platform.idle(Duration::from_secs(1));

    let runtime = fixture.runtime();
    let code = runtime.app().access_code();
    let path = StorePath::location(code);
    let task = tokio::spawn(runtime.run());

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(decode_update(Ok(fixture.remote.peek(&path))), TrackUpdate::Position(sample(18.50, 73.80)));
    assert_eq!(platform.last_render().unwrap().sharing(), SharingStatus::Active(code));

    platform.set_current_fix(Some(sample(18.51, 73.81)));
    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(decode_update(Ok(fixture.remote.peek(&path))), TrackUpdate::Position(sample(18.51, 73.81)));

    // Only one record exists for the code; no history accumulates.
    let all = fixture.remote.peek(&StorePath::parse("locations").unwrap()).unwrap();
    assert_eq!(all.as_object().unwrap().len(), 1);

    task.await.unwrap().unwrap();
    assert_eq!(platform.last_render().unwrap().sharing(), SharingStatus::Stopped);
}

#[tokio::test(start_paused = true)]
async fn sharing_denied_publishes_nothing() {
    let fixture = Fixture::new();
    let platform = &fixture.platform;
    platform.set_current_fix(Some(sample(18.50, 73.80)));
    platform.command(UserCommand::StartSharing);
    platform.idle(Duration::from_secs(15));

    fixture.run().await;

    assert_eq!(platform.prompts(), vec![Capability::FineLocation]);
    assert_eq!(platform.fix_requests(), 0);
    assert!(fixture.remote.peek(&StorePath::parse("locations").unwrap()).is_none());
    let app = platform.last_render().unwrap();
    assert_eq!(app.sharing(), SharingStatus::Stopped);
    assert_eq!(app.status_message(), Some("Permission denied: location"));
}

#[tokio::test(start_paused = true)]
async fn tracking_follows_remote_updates() {
    let fixture = Fixture::new();
    let platform = fixture.platform.clone();
    platform.command(UserCommand::Track(" 222222 ".to_string()));
    platform.idle(Duration::from_secs(10));

    let path = StorePath::parse("locations/222222").unwrap();
    let task = tokio::spawn(fixture.runtime().run());

    tokio::time::sleep(Duration::from_secs(1)).await;
    let app = platform.last_render().unwrap();
    assert_eq!(app.status_message(), Some("No location shared under code 222222"));
    assert!(app.map().marker.is_none());

    for (lat, lon) in [(18.50, 73.80), (18.55, 73.85)] {
        let record = serde_json::to_value(LocationRecord::from(sample(lat, lon))).unwrap();
        fixture.remote.set(&path, record).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        let map = platform.last_render().unwrap().map().clone();
        let expected = Coordinate { latitude: lat, longitude: lon };
        assert_eq!(map.marker, Some(expected));
        assert_eq!(map.center, Some(expected));
    }

    task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn tracking_survives_store_errors() {
    let fixture = Fixture::new();
    let platform = fixture.platform.clone();
    platform.command(UserCommand::Track("222222".to_string()));
    platform.idle(Duration::from_secs(10));

    let path = StorePath::parse("locations/222222").unwrap();
    let task = tokio::spawn(fixture.runtime().run());

    tokio::time::sleep(Duration::from_secs(1)).await;
    fixture.remote.set(&path, serde_json::json!({"latitude": "north"})).await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    let app = platform.last_render().unwrap();
    assert!(app.status_message().unwrap().starts_with("Error: "));
    assert!(app.tracking().is_some());

    let record = serde_json::to_value(LocationRecord::from(sample(18.50, 73.80))).unwrap();
    fixture.remote.set(&path, record).await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(platform.last_render().unwrap().map().marker.is_some());

    task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn denied_read_ends_tracking() {
    let fixture = Fixture::new();
    let platform = fixture.platform.clone();
    platform.command(UserCommand::Track("222222".to_string()));
    platform.idle(Duration::from_secs(5));

    let task = tokio::spawn(fixture.runtime().run());

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(platform.last_render().unwrap().tracking().is_some());

    fixture.remote.cancel_subscriptions("permission denied");
    tokio::time::sleep(Duration::from_secs(1)).await;
    let app = platform.last_render().unwrap();
    assert!(app.status_message().unwrap().contains("permission denied"));
    assert!(app.tracking().is_none());
    assert_eq!(fixture.remote.subscriber_count(), 0);

    task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn closing_screen_keeps_sharing_and_mutes_monitor() {
    let fixture = Fixture::new();
    let platform = fixture.platform.clone();
    platform.grant(Capability::FineLocation);
    platform.set_current_fix(Some(sample(18.50, 73.80)));
    platform.command(UserCommand::StartSharing);
    platform.command_after(Duration::from_secs(1), UserCommand::CloseScreen);
    platform.call_state(CallState::OffHook);
    platform.idle(Duration::from_secs(25));

    fixture.run().await;

    // Fixes at 0s, 10s and 20s: sharing outlived the screen.
    assert!(platform.fix_requests() >= 3);
    assert!(!platform.effects().iter().any(|e| matches!(e, Effect::Speech(_) | Effect::Speaker)));
    assert!(!platform.last_render().unwrap().call_monitor_registered());
}

#[tokio::test(start_paused = true)]
async fn pickup_switches_to_speaker_and_speaks() {
    let fixture = Fixture::new();
    let platform = &fixture.platform;
    platform.call_state(CallState::Ringing);
    platform.call_state(CallState::OffHook);
    platform.idle(Duration::from_secs(1));

    fixture.run().await;

    assert_eq!(platform.effects(), vec![Effect::Speaker, Effect::Speech(SPOKEN_MESSAGE.to_string())]);
}

#[tokio::test(start_paused = true)]
async fn routes_from_last_location_then_navigate() {
    let mut fixture = Fixture::new();
    let near = Coordinate { latitude: 18.60, longitude: 73.90 };
    let far = Coordinate { latitude: 18.70, longitude: 74.00 };
    let routes = vec![route(0, near), route(1, far)];
    fixture.routes = StaticRouteSource::new(routes.clone());

    let origin = sample(18.52, 73.85);
    let destination = Coordinate { latitude: 18.70, longitude: 74.00 };
    let platform = &fixture.platform;
    platform.set_last_known(Some(origin));
    platform.command(UserCommand::FindRoutes { destination });
    platform.command_after(Duration::from_secs(1), UserCommand::SelectRoute(1));
    platform.idle(Duration::from_secs(1));

    fixture.run().await;

    assert_eq!(fixture.routes.queries(), vec![RouteQuery { start: Coordinate::from(origin), end: destination }]);
    let app = platform.last_render().unwrap();
    assert_eq!(app.routes(), routes.as_slice());
    assert_eq!(app.route_status(), &RouteStatus::Loaded);
    assert_eq!(
        platform.effects(),
        vec![Effect::Navigation(navigation_intent(&routes[1], DEFAULT_REFERRER))]
    );
}

#[tokio::test(start_paused = true)]
async fn route_http_error_surfaces_status() {
    let mut fixture = Fixture::new();
    fixture.routes = StaticRouteSource::failing(RouteError::Status(404));
    let platform = &fixture.platform;
    platform.set_last_known(Some(sample(18.52, 73.85)));
    platform.command(UserCommand::FindRoutes { destination: Coordinate { latitude: 18.6, longitude: 73.9 } });
    platform.idle(Duration::from_secs(1));

    fixture.run().await;

    let app = platform.last_render().unwrap();
    assert_eq!(app.status_message(), Some("Error: route service returned HTTP 404"));
    assert_eq!(app.route_status(), &RouteStatus::Failed(RouteError::Status(404)));
    assert!(app.routes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn routes_without_fix_never_query() {
    let fixture = Fixture::new();
    let platform = &fixture.platform;
    platform.command(UserCommand::FindRoutes { destination: Coordinate { latitude: 18.6, longitude: 73.9 } });
    platform.idle(Duration::from_secs(1));

    fixture.run().await;

    assert!(fixture.routes.queries().is_empty());
    assert_eq!(platform.last_render().unwrap().status_message(), Some("Unable to retrieve location. Please try again."));
}

#[tokio::test(start_paused = true)]
async fn delete_by_id_keeps_namesake() {
    let fixture = Fixture::signed_in();
    let contacts = fixture.contacts();
    contacts.add(&user(), &Contact::new("Mom", "111").unwrap()).await.unwrap();
    let stored = contacts.add(&user(), &Contact::new("Mom", "222").unwrap()).await.unwrap();

    let platform = &fixture.platform;
    platform.command_after(Duration::from_secs(1), UserCommand::DeleteContact(stored[0].id.clone()));
    platform.idle(Duration::from_secs(1));

    fixture.run().await;

    let remaining = platform.last_render().unwrap().contacts().to_vec();
    assert_eq!(remaining, vec![stored[1].clone()]);
    assert_eq!(contacts.list(&user()).await.unwrap(), remaining);
}

#[tokio::test(start_paused = true)]
async fn add_contact_refreshes_list() {
    let fixture = Fixture::signed_in();
    let platform = &fixture.platform;
    platform.command(UserCommand::AddContact { name: "Dad".to_string(), phone_number: "333".to_string() });
    platform.idle(Duration::from_secs(1));

    fixture.run().await;

    let app = platform.last_render().unwrap();
    let names: Vec<_> = app.contacts().iter().map(|c| c.contact.name.as_str()).collect();
    assert_eq!(names, vec!["Dad"]);
}

#[tokio::test(start_paused = true)]
async fn sign_in_then_out_persists_and_clears() {
    let fixture = Fixture::new();
    let platform = &fixture.platform;
    platform.command(UserCommand::SignIn(user()));
    platform.command_after(
        Duration::from_secs(1),
        UserCommand::AddContact { name: "Dad".to_string(), phone_number: "333".to_string() },
    );
    platform.idle(Duration::from_secs(1));
    platform.command(UserCommand::SignOut);
    platform.idle(Duration::from_secs(1));

    fixture.run().await;

    assert!(!fixture.storage.load_session().unwrap().is_signed_in);
    let app = platform.last_render().unwrap();
    assert!(!app.is_signed_in());
    assert!(app.contacts().is_empty());

    // The contact itself stays in the remote store for the next sign-in.
    assert_eq!(fixture.contacts().list(&user()).await.unwrap().len(), 1);
}

#[test]
fn access_code_survives_restart() {
    let fixture = Fixture::new();
    let first = fixture.runtime().app().access_code();

    let again = Runtime::new(
        SimPlatform::new(),
        SimEnv::with_seed(7),
        fixture.storage.clone(),
        Arc::new(MemoryRemoteStore::new()),
        Arc::new(StaticRouteSource::new(Vec::new())),
        RuntimeConfig::default(),
    )
    .unwrap();

    assert_eq!(again.app().access_code(), first);
    assert_eq!(fixture.storage.load_access_code().unwrap(), Some(first));
}
