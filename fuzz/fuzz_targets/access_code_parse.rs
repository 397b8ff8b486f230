//! Fuzz target for access code parsing
//!
//! # Strategy
//!
//! - Raw: arbitrary strings, including non-ASCII digits and control chars
//! - Padded: in-range numbers surrounded by arbitrary whitespace
//! - Offset: arbitrary generation offsets
//!
//! # Invariants
//!
//! - Accepted codes lie in [100000, 999999] and print as six digits
//! - Printing then parsing an accepted code yields the same code
//! - Every generation offset produces a valid code
//! - NEVER panic on malformed input

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rakhwala_proto::{
    access_code::{ACCESS_CODE_MAX, ACCESS_CODE_MIN},
    AccessCode,
};

#[derive(Debug, Arbitrary)]
enum Input {
    Raw(String),
    Padded { value: u32, left: u8, right: u8 },
    Offset(u32),
}

fn check(code: AccessCode) {
    assert!((ACCESS_CODE_MIN..=ACCESS_CODE_MAX).contains(&code.value()));
    let text = code.to_string();
    assert_eq!(text.len(), 6);
    assert_eq!(text.parse::<AccessCode>().ok(), Some(code));
}

fuzz_target!(|input: Input| {
    match input {
        Input::Raw(text) => {
            if let Ok(code) = text.parse::<AccessCode>() {
                check(code);
                assert_eq!(code.to_string(), text.trim());
            }
        }

        Input::Padded { value, left, right } => {
            let text = format!("{}{value}{}", " ".repeat(usize::from(left % 4)), "\t".repeat(usize::from(right % 4)));
            let parsed = text.parse::<AccessCode>();
            let in_range = (ACCESS_CODE_MIN..=ACCESS_CODE_MAX).contains(&value);
            assert_eq!(parsed.is_ok(), in_range, "{text:?}");
            if let Ok(code) = parsed {
                check(code);
            }
        }

        Input::Offset(offset) => check(AccessCode::from_offset(offset)),
    }
});
