//! Fuzz target for route API response decoding
//!
//! # Strategy
//!
//! - Random bytes straight into the decoder
//! - Envelopes whose `body` is an arbitrary string, exercising the
//!   string-encoded body path
//!
//! # Invariants
//!
//! - Decoding never panics and completes quickly
//! - A decoded route always yields a safety badge and navigation URI
//! - NEVER panic on malformed JSON

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rakhwala_core::{navigation_intent, route::DEFAULT_REFERRER};
use rakhwala_proto::RouteResponse;

#[derive(Debug, Arbitrary)]
enum Input {
    Bytes(Vec<u8>),
    EncodedBody { status: u16, body: String },
}

fuzz_target!(|input: Input| {
    let bytes = match input {
        Input::Bytes(bytes) => bytes,
        Input::EncodedBody { status, body } => {
            let envelope = serde_json::json!({ "statusCode": status, "body": body });
            serde_json::to_vec(&envelope).unwrap_or_default()
        }
    };

    if let Ok(response) = RouteResponse::from_json(&bytes) {
        for route in &response.body {
            let _ = route.safety.badge();
            let intent = navigation_intent(route, DEFAULT_REFERRER);
            assert!(intent.uri.starts_with("google.navigation:q="));
        }
    }
});
