//! Device capabilities gated behind a user permission prompt.

use std::fmt;

/// A capability the user must grant before a step can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    /// Precise location fixes.
    FineLocation,
    /// Placing outgoing calls (and observing call state).
    CallPhone,
    /// Sending text messages.
    SendSms,
    /// Reading the device address book.
    ReadContacts,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FineLocation => "location",
            Self::CallPhone => "phone",
            Self::SendSms => "SMS",
            Self::ReadContacts => "contacts",
        };
        f.write_str(name)
    }
}
