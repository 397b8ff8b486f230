//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use std::collections::BTreeSet;

use rakhwala_app::RouteStatus;
use rakhwala_proto::access_code::{ACCESS_CODE_MAX, ACCESS_CODE_MIN};

use super::{Invariant, InvariantResult, SystemSnapshot, Violation};

/// The access code never changes and stays six digits.
///
/// Generated once per device; every frame of a run must show the same code.
pub struct StableAccessCode;

impl Invariant for StableAccessCode {
    fn name(&self) -> &'static str {
        "stable_access_code"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let Some(first) = state.frames.first() else {
            return Ok(());
        };
        let value = first.access_code.value();
        if !(ACCESS_CODE_MIN..=ACCESS_CODE_MAX).contains(&value) {
            return Err(Violation { invariant: self.name(), message: format!("code {value} is not six digits") });
        }

        for (index, frame) in state.frames.iter().enumerate() {
            if frame.access_code != first.access_code {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("frame {index}: code changed {} → {}", first.access_code, frame.access_code),
                });
            }
        }
        Ok(())
    }
}

/// Sharing only ever publishes under this device's own code.
pub struct SharingUsesDeviceCode;

impl Invariant for SharingUsesDeviceCode {
    fn name(&self) -> &'static str {
        "sharing_uses_device_code"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for frame in &state.frames {
            if let Some(code) = frame.sharing_code()
                && code != frame.access_code
            {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("sharing under {code}, device code is {}", frame.access_code),
                });
            }
        }
        Ok(())
    }
}

/// The map shows at most one marker, and the viewport is centered on it.
///
/// `MapView` holds a single optional marker, so "at most one" is structural;
/// what can break is the viewport drifting away from the marker or the zoom
/// changing.
pub struct MarkerCentered;

impl Invariant for MarkerCentered {
    fn name(&self) -> &'static str {
        "marker_centered"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let Some(frame) = state.current() else {
            return Ok(());
        };
        if let Some(marker) = frame.marker
            && frame.map_center != Some(marker)
        {
            return Err(Violation {
                invariant: self.name(),
                message: format!("marker {marker:?} but center {:?}", frame.map_center),
            });
        }
        if frame.map_zoom != rakhwala_core::subscriber::TRACKING_ZOOM {
            return Err(Violation { invariant: self.name(), message: format!("zoom {}", frame.map_zoom) });
        }
        Ok(())
    }
}

/// Routes are listed only after a successful query.
pub struct RoutesOnlyWhenLoaded;

impl Invariant for RoutesOnlyWhenLoaded {
    fn name(&self) -> &'static str {
        "routes_only_when_loaded"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let Some(frame) = state.current() else {
            return Ok(());
        };
        if frame.route_count > 0 && frame.route_status != RouteStatus::Loaded {
            return Err(Violation {
                invariant: self.name(),
                message: format!("{} routes shown while {:?}", frame.route_count, frame.route_status),
            });
        }
        Ok(())
    }
}

/// Contacts are visible only to a signed-in user, each id at most once.
pub struct ContactsBelongToSession;

impl Invariant for ContactsBelongToSession {
    fn name(&self) -> &'static str {
        "contacts_belong_to_session"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let Some(frame) = state.current() else {
            return Ok(());
        };
        if !frame.signed_in && !frame.contact_ids.is_empty() {
            return Err(Violation {
                invariant: self.name(),
                message: format!("{} contacts shown while signed out", frame.contact_ids.len()),
            });
        }

        let unique: BTreeSet<_> = frame.contact_ids.iter().collect();
        if unique.len() != frame.contact_ids.len() {
            return Err(Violation { invariant: self.name(), message: "duplicate contact id".to_string() });
        }
        Ok(())
    }
}

/// A finished SOS attempt is internally consistent.
///
/// Aborted attempts send nothing; texts imply a location fix.
pub struct SosOutcomeConsistent;

impl Invariant for SosOutcomeConsistent {
    fn name(&self) -> &'static str {
        "sos_outcome_consistent"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let Some(outcome) = state.current().and_then(|frame| frame.last_sos.as_ref()) else {
            return Ok(());
        };
        if outcome.aborted.is_some() && (outcome.alerts.is_some() || outcome.call_placed) {
            return Err(Violation {
                invariant: self.name(),
                message: format!("aborted attempt still acted: {outcome:?}"),
            });
        }
        if outcome.alerts.as_ref().is_some_and(|r| r.attempted() > 0) && outcome.location.is_none() {
            return Err(Violation { invariant: self.name(), message: "texts sent without a fix".to_string() });
        }
        Ok(())
    }
}
