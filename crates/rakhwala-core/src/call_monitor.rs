//! Call-state observer that speaks the SOS message on pickup.

/// Telephony call state as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallState {
    /// No call.
    #[default]
    Idle,
    /// Incoming call ringing.
    Ringing,
    /// A call is active (dialing or answered).
    OffHook,
}

/// Effects requested when the call is answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallAction {
    /// Switch audio output to the loudspeaker.
    RouteAudioToSpeaker,
    /// Speak `0` with on-device speech synthesis.
    Speak(String),
}

/// Watches call-state changes while registered.
///
/// The observer is registered for the lifetime of the hosting screen and
/// reacts to every call on the device, not only the SOS call.
#[derive(Debug, Clone)]
pub struct CallMonitor {
    message: String,
    registered: bool,
    last: CallState,
}

impl CallMonitor {
    /// Create an unregistered monitor that speaks `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), registered: false, last: CallState::Idle }
    }

    /// Start observing.
    pub fn register(&mut self) {
        if !self.registered {
            tracing::debug!("call monitor registered");
        }
        self.registered = true;
    }

    /// Stop observing. Later state changes are ignored.
    pub fn unregister(&mut self) {
        if self.registered {
            tracing::debug!("call monitor unregistered");
        }
        self.registered = false;
        self.last = CallState::Idle;
    }

    /// Whether the monitor is observing.
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Feed a call-state change.
    ///
    /// Returns speaker routing then speech on a transition into `OffHook`.
    /// Repeated `OffHook` reports for the same call do not repeat the
    /// message.
    pub fn on_state(&mut self, state: CallState) -> Vec<CallAction> {
        if !self.registered {
            return Vec::new();
        }

        let previous = std::mem::replace(&mut self.last, state);
        if state != CallState::OffHook || previous == CallState::OffHook {
            return Vec::new();
        }

        tracing::info!("call answered, speaking SOS message");
        vec![CallAction::RouteAudioToSpeaker, CallAction::Speak(self.message.clone())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sos::SPOKEN_MESSAGE;

    #[test]
    fn speaks_on_pickup() {
        let mut monitor = CallMonitor::new(SPOKEN_MESSAGE);
        monitor.register();

        assert!(monitor.on_state(CallState::Ringing).is_empty());
        assert_eq!(
            monitor.on_state(CallState::OffHook),
            vec![CallAction::RouteAudioToSpeaker, CallAction::Speak(SPOKEN_MESSAGE.to_string())]
        );
        assert!(monitor.on_state(CallState::OffHook).is_empty());

        monitor.on_state(CallState::Idle);
        assert_eq!(monitor.on_state(CallState::OffHook).len(), 2);
    }

    #[test]
    fn silent_when_unregistered() {
        let mut monitor = CallMonitor::new(SPOKEN_MESSAGE);
        assert!(monitor.on_state(CallState::OffHook).is_empty());

        monitor.register();
        monitor.unregister();
        assert!(monitor.on_state(CallState::OffHook).is_empty());
    }
}
