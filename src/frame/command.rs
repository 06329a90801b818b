//! The closed set of STOMP command verbs.

use std::fmt;

/// A STOMP command verb.
///
/// [`Command::Unknown`] exists so a frame that failed before its command
/// line could be parsed still carries a command; it is never produced by a
/// successful decode and [`Command::from_name`] never returns it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    Connect,
    Connected,
    Send,
    Subscribe,
    Unsubscribe,
    Begin,
    Commit,
    Abort,
    Ack,
    Nack,
    Disconnect,
    Message,
    Receipt,
    Error,
    Stomp,
    Unknown,
}

impl Command {
    /// Canonical wire spelling of the verb.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Connected => "CONNECTED",
            Self::Send => "SEND",
            Self::Subscribe => "SUBSCRIBE",
            Self::Unsubscribe => "UNSUBSCRIBE",
            Self::Begin => "BEGIN",
            Self::Commit => "COMMIT",
            Self::Abort => "ABORT",
            Self::Ack => "ACK",
            Self::Nack => "NACK",
            Self::Disconnect => "DISCONNECT",
            Self::Message => "MESSAGE",
            Self::Receipt => "RECEIPT",
            Self::Error => "ERROR",
            Self::Stomp => "STOMP",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Look up a verb by its exact wire spelling.
    ///
    /// Returns `None` for anything else, including the literal `"UNKNOWN"`,
    /// which is not a valid wire command.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let command = match name {
            "CONNECT" => Self::Connect,
            "CONNECTED" => Self::Connected,
            "SEND" => Self::Send,
            "SUBSCRIBE" => Self::Subscribe,
            "UNSUBSCRIBE" => Self::Unsubscribe,
            "BEGIN" => Self::Begin,
            "COMMIT" => Self::Commit,
            "ABORT" => Self::Abort,
            "ACK" => Self::Ack,
            "NACK" => Self::Nack,
            "DISCONNECT" => Self::Disconnect,
            "MESSAGE" => Self::Message,
            "RECEIPT" => Self::Receipt,
            "ERROR" => Self::Error,
            "STOMP" => Self::Stomp,
            _ => return None,
        };
        Some(command)
    }

    /// Whether headers of this command use backslash escaping on the wire.
    ///
    /// `CONNECT` and `CONNECTED` exchange unescaped headers for backwards
    /// compatibility with STOMP 1.0; every other verb escapes.
    #[must_use]
    pub const fn escapes_headers(self) -> bool {
        !matches!(self, Self::Connect | Self::Connected)
    }
}

impl Default for Command {
    fn default() -> Self { Self::Unknown }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}
