//! SOS orchestration.
//!
//! [`SosFlow`] is a pure state machine: the runtime feeds it [`SosInput`]s
//! and executes the [`SosAction`]s it returns. One attempt runs at a time.
//!
//! With the default [`CallOrder::AfterSms`]:
//!
//! ```text
//! trigger
//!   → EnsurePermission(FineLocation) ── denied ──► Complete (aborted)
//!   → ReadLastLocation               ── no fix ──► Complete (aborted)
//!   → LoadContacts
//!   → SendAlerts (one SMS per contact, joined into a batch report)
//!   → EnsurePermission(CallPhone)    ── denied ──► Complete
//!   → PlaceCall
//!   → Complete
//! ```
//!
//! [`CallOrder::BeforeSms`] swaps the call steps ahead of the contact steps.
//! In both orders the call permission resolves before the call is placed,
//! and failures after the location fix only skip their own step.

use std::fmt;

use futures::future::join_all;
use rakhwala_proto::{Contact, LocationSample};

use crate::{Capability, SafetyError};

/// Number dialed by the SOS call.
pub const EMERGENCY_NUMBER: &str = "9028303891";

/// Message spoken when the emergency call is answered.
pub const SPOKEN_MESSAGE: &str = "Hello! This is an automated SOS message.";

/// Text message sent to every contact.
///
/// ```
/// # use rakhwala_core::sos::sos_message;
/// # use rakhwala_proto::LocationSample;
/// let sample = LocationSample::new(12.34, 56.78).unwrap();
/// assert_eq!(
///     sos_message(&sample),
///     "HELP ME! I am in danger. Please send help. My location is: https://www.google.com/maps?q=12.34,56.78"
/// );
/// ```
pub fn sos_message(sample: &LocationSample) -> String {
    format!("HELP ME! I am in danger. Please send help. My location is: {}", sample.maps_url())
}

/// When the emergency call is placed relative to the text messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallOrder {
    /// Text every contact, then call.
    #[default]
    AfterSms,
    /// Call first, then text every contact.
    BeforeSms,
}

/// SOS behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SosConfig {
    /// Number the SOS call dials.
    pub emergency_number: String,
    /// Message spoken once the call is answered.
    pub spoken_message: String,
    /// Ordering of the call and text steps.
    pub call_order: CallOrder,
}

impl Default for SosConfig {
    fn default() -> Self {
        Self {
            emergency_number: EMERGENCY_NUMBER.to_string(),
            spoken_message: SPOKEN_MESSAGE.to_string(),
            call_order: CallOrder::default(),
        }
    }
}

/// Where an SOS attempt currently waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SosStage {
    /// No attempt in progress.
    Idle,
    /// Waiting for the location capability.
    AwaitingLocationPermission,
    /// Waiting for the last known location.
    ReadingLocation,
    /// Waiting for the contact list.
    LoadingContacts,
    /// Waiting for the SMS batch.
    SendingAlerts,
    /// Waiting for the call capability.
    AwaitingCallPermission,
    /// Waiting for the dialer.
    Calling,
}

/// A per-contact send failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsFailure {
    /// Contact that did not get the message.
    pub contact: Contact,
    /// Platform-reported reason.
    pub reason: String,
}

/// Result of sending one message to many contacts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmsBatchReport {
    /// Messages accepted by the platform.
    pub sent: usize,
    /// Messages that failed, in contact order.
    pub failures: Vec<SmsFailure>,
}

impl SmsBatchReport {
    /// Messages attempted.
    pub fn attempted(&self) -> usize {
        self.sent + self.failures.len()
    }

    /// Whether every message went out.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for SmsBatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_complete() {
            return write!(f, "SOS sent to {} contact(s)", self.sent);
        }

        write!(f, "SOS sent to {} of {} contact(s); failed: ", self.sent, self.attempted())?;
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} ({})", failure.contact.name, failure.reason)?;
        }
        Ok(())
    }
}

/// Send `message` to every recipient concurrently and collect the results.
///
/// Each send is independent: one failure never prevents another send.
pub async fn dispatch_alerts<F, Fut, E>(recipients: &[Contact], message: &str, send: F) -> SmsBatchReport
where
    F: Fn(Contact, String) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: fmt::Display,
{
    let sends = recipients.iter().map(|contact| {
        let fut = send(contact.clone(), message.to_string());
        async move { (contact, fut.await) }
    });

    let mut report = SmsBatchReport::default();
    for (contact, result) in join_all(sends).await {
        match result {
            Ok(()) => report.sent += 1,
            Err(err) => {
                tracing::warn!(contact = %contact.name, error = %err, "SOS text failed");
                report.failures.push(SmsFailure { contact: contact.clone(), reason: err.to_string() });
            },
        }
    }
    report
}

/// Results fed back into the flow.
#[derive(Debug, Clone, PartialEq)]
pub enum SosInput {
    /// A capability check (and prompt, if needed) finished.
    PermissionResolved {
        /// Capability that was checked.
        capability: Capability,
        /// Whether it is now granted.
        granted: bool,
    },
    /// Last known location. `None` when the device has no fix.
    LocationResolved(Option<LocationSample>),
    /// Contact list fetched.
    ContactsLoaded(Result<Vec<Contact>, SafetyError>),
    /// SMS batch finished.
    AlertsSent(SmsBatchReport),
    /// Dialer accepted (or rejected) the call.
    CallPlaced(Result<(), String>),
}

/// Side effects requested by the flow.
#[derive(Debug, Clone, PartialEq)]
pub enum SosAction {
    /// Check the capability, prompting if needed, then feed back
    /// `PermissionResolved`.
    EnsurePermission(Capability),
    /// Read the last known location, then feed back `LocationResolved`.
    ReadLastLocation,
    /// Fetch the signed-in user's contacts, then feed back `ContactsLoaded`.
    LoadContacts,
    /// Text `message` to every recipient, then feed back `AlertsSent`.
    SendAlerts {
        /// Message body.
        message: String,
        /// Contacts to text.
        recipients: Vec<Contact>,
    },
    /// Dial `number`, then feed back `CallPlaced`.
    PlaceCall {
        /// Number to dial.
        number: String,
    },
    /// Show a transient message to the user.
    Notify(String),
    /// Show an error to the user, unless it is silent.
    Fail(SafetyError),
    /// The attempt ended.
    Complete(SosOutcome),
}

/// Summary of one SOS attempt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SosOutcome {
    /// Location included in the message.
    pub location: Option<LocationSample>,
    /// SMS results. `None` if no batch was sent.
    pub alerts: Option<SmsBatchReport>,
    /// Whether the dialer accepted the emergency call.
    pub call_placed: bool,
    /// Error that aborted the attempt before anything was sent.
    pub aborted: Option<SafetyError>,
}

/// SOS state machine.
#[derive(Debug, Clone)]
pub struct SosFlow {
    config: SosConfig,
    stage: SosStage,
    message: Option<String>,
    outcome: SosOutcome,
    contacts_done: bool,
    call_done: bool,
}

impl SosFlow {
    /// Create an idle flow.
    pub fn new(config: SosConfig) -> Self {
        Self {
            config,
            stage: SosStage::Idle,
            message: None,
            outcome: SosOutcome::default(),
            contacts_done: false,
            call_done: false,
        }
    }

    /// Current stage.
    pub fn stage(&self) -> SosStage {
        self.stage
    }

    /// Whether an attempt is in progress.
    pub fn is_active(&self) -> bool {
        self.stage != SosStage::Idle
    }

    /// Configuration in use.
    pub fn config(&self) -> &SosConfig {
        &self.config
    }

    /// Start an attempt. Ignored while one is already running.
    pub fn trigger(&mut self) -> Vec<SosAction> {
        if self.is_active() {
            tracing::debug!(stage = ?self.stage, "SOS already in progress");
            return Vec::new();
        }

        tracing::info!("SOS triggered");
        self.reset();
        self.stage = SosStage::AwaitingLocationPermission;
        vec![SosAction::EnsurePermission(Capability::FineLocation)]
    }

    /// Feed a result back. Inputs that do not match the current stage are
    /// stale and ignored.
    pub fn handle(&mut self, input: SosInput) -> Vec<SosAction> {
        match (self.stage, input) {
            (
                SosStage::AwaitingLocationPermission,
                SosInput::PermissionResolved { capability: Capability::FineLocation, granted },
            ) => {
                if granted {
                    self.stage = SosStage::ReadingLocation;
                    vec![SosAction::ReadLastLocation]
                } else {
                    self.abort(SafetyError::PermissionDenied(Capability::FineLocation))
                }
            },

            (SosStage::ReadingLocation, SosInput::LocationResolved(location)) => {
                let Some(sample) = location else {
                    return self.abort(SafetyError::NoLocationFix);
                };
                self.outcome.location = Some(sample);
                self.message = Some(sos_message(&sample));
                self.advance(Vec::new())
            },

            (SosStage::LoadingContacts, SosInput::ContactsLoaded(result)) => match result {
                Ok(contacts) if contacts.is_empty() => {
                    self.contacts_done = true;
                    self.advance(vec![SosAction::Notify("No emergency contacts saved".to_string())])
                },
                Ok(recipients) => {
                    self.stage = SosStage::SendingAlerts;
                    let message = self.message.clone().unwrap_or_default();
                    vec![SosAction::SendAlerts { message, recipients }]
                },
                Err(err) => {
                    self.contacts_done = true;
                    tracing::warn!(error = %err, "skipping SOS texts");
                    self.advance(vec![SosAction::Fail(err)])
                },
            },

            (SosStage::SendingAlerts, SosInput::AlertsSent(report)) => {
                self.contacts_done = true;
                let notice = SosAction::Notify(report.to_string());
                self.outcome.alerts = Some(report);
                self.advance(vec![notice])
            },

            (
                SosStage::AwaitingCallPermission,
                SosInput::PermissionResolved { capability: Capability::CallPhone, granted },
            ) => {
                if granted {
                    self.stage = SosStage::Calling;
                    vec![SosAction::PlaceCall { number: self.config.emergency_number.clone() }]
                } else {
                    self.call_done = true;
                    let err = SafetyError::PermissionDenied(Capability::CallPhone);
                    tracing::warn!(error = %err, "skipping SOS call");
                    self.advance(vec![SosAction::Fail(err)])
                }
            },

            (SosStage::Calling, SosInput::CallPlaced(result)) => {
                self.call_done = true;
                let mut actions = Vec::new();
                match result {
                    Ok(()) => self.outcome.call_placed = true,
                    Err(reason) => {
                        tracing::error!(%reason, "SOS call failed");
                        actions.push(SosAction::Fail(SafetyError::Platform(format!("call failed: {reason}"))));
                    },
                }
                self.advance(actions)
            },

            (stage, input) => {
                tracing::debug!(?stage, ?input, "ignoring stale SOS input");
                Vec::new()
            },
        }
    }

    /// Move to the next pending step, or complete.
    fn advance(&mut self, mut actions: Vec<SosAction>) -> Vec<SosAction> {
        let call_first = self.config.call_order == CallOrder::BeforeSms;

        let next = match (self.contacts_done, self.call_done) {
            (false, false) if call_first => Some(SosStage::AwaitingCallPermission),
            (false, _) => Some(SosStage::LoadingContacts),
            (true, false) => Some(SosStage::AwaitingCallPermission),
            (true, true) => None,
        };

        match next {
            Some(SosStage::LoadingContacts) => {
                self.stage = SosStage::LoadingContacts;
                actions.push(SosAction::LoadContacts);
            },
            Some(stage) => {
                self.stage = stage;
                actions.push(SosAction::EnsurePermission(Capability::CallPhone));
            },
            None => {
                let outcome = std::mem::take(&mut self.outcome);
                tracing::info!(
                    sent = outcome.alerts.as_ref().map_or(0, |r| r.sent),
                    call_placed = outcome.call_placed,
                    "SOS finished"
                );
                self.reset();
                actions.push(SosAction::Complete(outcome));
            },
        }
        actions
    }

    fn abort(&mut self, err: SafetyError) -> Vec<SosAction> {
        tracing::error!(error = %err, "SOS aborted");
        let outcome = SosOutcome { aborted: Some(err.clone()), ..SosOutcome::default() };
        self.reset();
        vec![SosAction::Fail(err), SosAction::Complete(outcome)]
    }

    fn reset(&mut self) {
        self.stage = SosStage::Idle;
        self.message = None;
        self.outcome = SosOutcome::default();
        self.contacts_done = false;
        self.call_done = false;
    }
}
