//! Fuzz target for decoding records observed while tracking
//!
//! # Strategy
//!
//! - Random bytes parsed as JSON and fed to the tracking decoder
//! - Structured records with arbitrary coordinates and schema versions
//!
//! # Invariants
//!
//! - A decoded position is always a valid coordinate
//! - Applying any update keeps at most one marker, centred on the view
//! - NEVER panic on malformed records

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rakhwala_core::{decode_update, MapView, TrackUpdate};
use serde_json::{json, Value};

#[derive(Debug, Arbitrary)]
enum Input {
    Bytes(Vec<u8>),
    Record { latitude: f64, longitude: f64, schema_version: Option<u32> },
}

fuzz_target!(|inputs: Vec<Input>| {
    let mut view = MapView::default();

    for input in inputs {
        let value = match input {
            Input::Bytes(bytes) => serde_json::from_slice::<Value>(&bytes).ok(),
            Input::Record { latitude, longitude, schema_version } => {
                let mut record = json!({ "latitude": latitude, "longitude": longitude });
                if let Some(version) = schema_version {
                    record["schemaVersion"] = json!(version);
                }
                Some(record)
            }
        };

        let update = decode_update(Ok(value));
        if let TrackUpdate::Position(sample) = &update {
            assert!(sample.validate().is_ok());
        }

        view.apply(&update);
        assert_eq!(view.center, view.marker);
    }
});
