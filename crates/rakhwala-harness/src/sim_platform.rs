//! Scripted device for simulation.
//!
//! `SimPlatform` implements [`Platform`] so the production
//! [`rakhwala_app::Runtime`] runs unchanged in tests. User input comes from a
//! script of timed steps; every side effect (prompts, texts, calls, speech,
//! navigation) is appended to one ordered log the test can inspect.

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use rakhwala_app::{App, AppEvent, Platform, PlatformError, UserCommand};
use rakhwala_core::{CallState, Capability, NavigationIntent};
use rakhwala_proto::LocationSample;
use tokio::time::Instant;

use crate::invariants::{AppSnapshot, InvariantRegistry, SystemSnapshot};

/// One observable device side effect.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// A permission prompt was shown.
    PermissionPrompt(Capability),
    /// A text message was handed to the carrier.
    Sms {
        /// Recipient.
        number: String,
        /// Body.
        message: String,
    },
    /// The dialer was opened.
    Call(String),
    /// Call audio moved to the loudspeaker.
    Speaker,
    /// Text was spoken.
    Speech(String),
    /// External navigation was opened.
    Navigation(NavigationIntent),
}

/// A scripted step: wait `delay`, then deliver `event` (if any).
struct Step {
    delay: Duration,
    event: Option<AppEvent>,
}

struct SimState {
    script: VecDeque<Step>,
    /// Deadline of the front step, fixed on first poll so a cancelled poll
    /// resumes the same wait.
    due: Option<Instant>,
    granted: BTreeSet<Capability>,
    prompt_answers: BTreeMap<Capability, bool>,
    last_known: Option<LocationSample>,
    current_fix: Option<LocationSample>,
    failing_numbers: BTreeSet<String>,
    call_failure: Option<String>,
    effects: Vec<Effect>,
    fix_requests: usize,
    renders: usize,
    last_render: Option<App>,
    history: Vec<AppSnapshot>,
    invariants: Option<Arc<InvariantRegistry>>,
}

/// Simulated device with scripted input and recorded effects.
///
/// Clones share state, like the background tasks of a real runtime share one
/// phone.
#[derive(Clone)]
pub struct SimPlatform {
    state: Arc<Mutex<SimState>>,
}

impl Default for SimPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl SimPlatform {
    /// A device with no permissions, no location and an empty script.
    pub fn new() -> Self {
        let state = SimState {
            script: VecDeque::new(),
            due: None,
            granted: BTreeSet::new(),
            prompt_answers: BTreeMap::new(),
            last_known: None,
            current_fix: None,
            failing_numbers: BTreeSet::new(),
            call_failure: None,
            effects: Vec::new(),
            fix_requests: 0,
            renders: 0,
            last_render: None,
            history: Vec::new(),
            invariants: None,
        };
        Self { state: Arc::new(Mutex::new(state)) }
    }

    /// Check `registry` against every rendered frame. A violation fails
    /// `render`, which stops the runtime with an error.
    #[must_use]
    pub fn with_invariants(self, registry: InvariantRegistry) -> Self {
        self.lock().invariants = Some(Arc::new(registry));
        self
    }

    #[allow(clippy::expect_used)]
    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().expect("Mutex poisoned")
    }

    /// Queue a user command, delivered right after the previous step.
    pub fn command(&self, command: UserCommand) {
        self.event_after(Duration::ZERO, AppEvent::Command(command));
    }

    /// Queue a user command, delivered `delay` after the previous step.
    pub fn command_after(&self, delay: Duration, command: UserCommand) {
        self.event_after(delay, AppEvent::Command(command));
    }

    /// Queue a call-state change.
    pub fn call_state(&self, state: CallState) {
        self.event_after(Duration::ZERO, AppEvent::CallStateChanged(state));
    }

    /// Queue an arbitrary event.
    pub fn event_after(&self, delay: Duration, event: AppEvent) {
        self.lock().script.push_back(Step { delay, event: Some(event) });
    }

    /// Queue an idle period. Background work keeps running meanwhile; once
    /// the script is exhausted the UI closes.
    pub fn idle(&self, delay: Duration) {
        self.lock().script.push_back(Step { delay, event: None });
    }

    /// Grant `capability` up front.
    pub fn grant(&self, capability: Capability) {
        self.lock().granted.insert(capability);
    }

    /// Revoke `capability`.
    pub fn revoke(&self, capability: Capability) {
        self.lock().granted.remove(&capability);
    }

    /// Answer the prompt for `capability`. Unanswered prompts are denied.
    pub fn answer_prompt(&self, capability: Capability, granted: bool) {
        self.lock().prompt_answers.insert(capability, granted);
    }

    /// Set the cached last-known location.
    pub fn set_last_known(&self, sample: Option<LocationSample>) {
        self.lock().last_known = sample;
    }

    /// Set the fix returned by fresh location requests. `None` fails them.
    pub fn set_current_fix(&self, sample: Option<LocationSample>) {
        self.lock().current_fix = sample;
    }

    /// Make every text to `number` fail.
    pub fn fail_sms_to(&self, number: impl Into<String>) {
        self.lock().failing_numbers.insert(number.into());
    }

    /// Make the dialer fail with `reason`.
    pub fn fail_calls(&self, reason: impl Into<String>) {
        self.lock().call_failure = Some(reason.into());
    }

    /// Every side effect so far, in order.
    pub fn effects(&self) -> Vec<Effect> {
        self.lock().effects.clone()
    }

    /// Texts sent so far as `(number, message)`.
    pub fn sms(&self) -> Vec<(String, String)> {
        self.lock()
            .effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::Sms { number, message } => Some((number.clone(), message.clone())),
                _ => None,
            })
            .collect()
    }

    /// Numbers dialed so far.
    pub fn calls(&self) -> Vec<String> {
        self.lock()
            .effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::Call(number) => Some(number.clone()),
                _ => None,
            })
            .collect()
    }

    /// Permission prompts shown so far.
    pub fn prompts(&self) -> Vec<Capability> {
        self.lock()
            .effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::PermissionPrompt(capability) => Some(*capability),
                _ => None,
            })
            .collect()
    }

    /// Number of fresh fixes requested.
    pub fn fix_requests(&self) -> usize {
        self.lock().fix_requests
    }

    /// Number of rendered frames.
    pub fn render_count(&self) -> usize {
        self.lock().renders
    }

    /// Last rendered app state.
    pub fn last_render(&self) -> Option<App> {
        self.lock().last_render.clone()
    }

    /// Snapshot of every rendered frame, oldest first.
    pub fn history(&self) -> Vec<AppSnapshot> {
        self.lock().history.clone()
    }

    fn record(&self, effect: Effect) {
        tracing::trace!(?effect, "device effect");
        self.lock().effects.push(effect);
    }
}

impl Platform for SimPlatform {
    async fn poll_event(&mut self) -> Option<AppEvent> {
        loop {
            let deadline = {
                let mut state = self.lock();
                let delay = state.script.front()?.delay;
                *state.due.get_or_insert_with(|| Instant::now() + delay)
            };

            tokio::time::sleep_until(deadline).await;

            let mut state = self.lock();
            state.due = None;
            if let Some(Step { event: Some(event), .. }) = state.script.pop_front() {
                return Some(event);
            }
        }
    }

    fn has_permission(&self, capability: Capability) -> bool {
        self.lock().granted.contains(&capability)
    }

    async fn request_permission(&self, capability: Capability) -> bool {
        let mut state = self.lock();
        state.effects.push(Effect::PermissionPrompt(capability));
        let granted = state.prompt_answers.get(&capability).copied().unwrap_or(false);
        if granted {
            state.granted.insert(capability);
        }
        granted
    }

    async fn last_known_location(&self) -> Option<LocationSample> {
        self.lock().last_known
    }

    async fn current_location(&self) -> Result<LocationSample, PlatformError> {
        let mut state = self.lock();
        state.fix_requests += 1;
        state.current_fix.ok_or_else(|| PlatformError::new("location unavailable"))
    }

    async fn send_sms(&self, number: &str, message: &str) -> Result<(), PlatformError> {
        if self.lock().failing_numbers.contains(number) {
            return Err(PlatformError::new("generic failure"));
        }
        self.record(Effect::Sms { number: number.to_string(), message: message.to_string() });
        Ok(())
    }

    async fn place_call(&self, number: &str) -> Result<(), PlatformError> {
        if let Some(reason) = self.lock().call_failure.clone() {
            return Err(PlatformError::new(reason));
        }
        self.record(Effect::Call(number.to_string()));
        Ok(())
    }

    fn route_audio_to_speaker(&self) -> Result<(), PlatformError> {
        self.record(Effect::Speaker);
        Ok(())
    }

    fn speak(&self, text: &str) -> Result<(), PlatformError> {
        self.record(Effect::Speech(text.to_string()));
        Ok(())
    }

    fn open_navigation(&self, intent: &NavigationIntent) -> Result<(), PlatformError> {
        self.record(Effect::Navigation(intent.clone()));
        Ok(())
    }

    fn render(&mut self, app: &App) -> Result<(), PlatformError> {
        let mut state = self.lock();
        let snapshot = AppSnapshot::from_app(app);

        if let Some(registry) = state.invariants.clone() {
            let mut frames = state.history.clone();
            frames.push(snapshot.clone());
            if let Err(violations) = registry.check_all(&SystemSnapshot::from_frames(frames)) {
                let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
                return Err(PlatformError::new(format!("invariant violation: {}", messages.join("; "))));
            }
        }

        state.renders += 1;
        state.last_render = Some(app.clone());
        state.history.push(snapshot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn script_delivers_in_order_after_delays() {
        let mut platform = SimPlatform::new();
        platform.command(UserCommand::StartSharing);
        platform.command_after(Duration::from_secs(5), UserCommand::StopSharing);

        let start = Instant::now();
        assert!(matches!(
            platform.poll_event().await,
            Some(AppEvent::Command(UserCommand::StartSharing))
        ));
        assert!(matches!(
            platform.poll_event().await,
            Some(AppEvent::Command(UserCommand::StopSharing))
        ));
        assert!(start.elapsed() >= Duration::from_secs(5));
        assert!(start.elapsed() < Duration::from_secs(6));
        assert!(platform.poll_event().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_poll_keeps_its_deadline() {
        let mut platform = SimPlatform::new();
        platform.command_after(Duration::from_secs(10), UserCommand::TriggerSos);

        let start = Instant::now();
        let early = tokio::time::timeout(Duration::from_secs(4), platform.poll_event()).await;
        assert!(early.is_err());

        assert!(platform.poll_event().await.is_some());
        assert!(start.elapsed() >= Duration::from_secs(10));
        assert!(start.elapsed() < Duration::from_secs(11));
    }

    #[tokio::test]
    async fn prompt_answers_persist_grants() {
        let platform = SimPlatform::new();
        platform.answer_prompt(Capability::CallPhone, true);

        assert!(!platform.has_permission(Capability::CallPhone));
        assert!(platform.request_permission(Capability::CallPhone).await);
        assert!(platform.has_permission(Capability::CallPhone));
        assert!(!platform.request_permission(Capability::FineLocation).await);
        assert_eq!(platform.prompts(), vec![Capability::CallPhone, Capability::FineLocation]);
    }

    #[tokio::test]
    async fn failing_numbers_are_not_recorded() {
        let platform = SimPlatform::new();
        platform.fail_sms_to("111");

        assert!(platform.send_sms("111", "help").await.is_err());
        assert!(platform.send_sms("222", "help").await.is_ok());
        assert_eq!(platform.sms(), vec![("222".to_string(), "help".to_string())]);
    }
}
