//! Common error types used across the workspace.
//!
//! Runtime knob paths (knob input, navigation, rendering) never return
//! errors: they clamp, log and degrade. These types cover the edges where a
//! caller hands us something we cannot use, such as a configuration slot or
//! an incoming state payload.

/// Root error for the knobhub domain.
#[derive(Debug, thiserror::Error)]
pub enum KnobError {
    #[error("configuration error")]
    Config(#[from] ConfigError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    #[error("invalid state payload")]
    Payload(#[from] PayloadError),
}

/// Problems with a single app slot in the configuration.
///
/// A slot that fails with one of these is skipped; the rest of the load
/// carries on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The app kind slug does not name a known app kind.
    #[error("unknown app kind `{0}`")]
    UnknownAppKind(String),

    /// The slot has an empty `app_id`.
    #[error("app id must not be empty")]
    EmptyAppId,

    /// The slot could not be deserialized at all.
    #[error("malformed app slot at index {index}: {reason}")]
    MalformedSlot {
        /// Index of the slot in the configured list.
        index: usize,
        /// Deserializer message.
        reason: String,
    },

    /// The slot list is not a list.
    #[error("app slots must be a list")]
    NotAList,
}

/// Something was looked up by id and is not there.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} not found: {id}")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Why an incoming entity state payload was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    /// The payload is not a JSON object.
    #[error("state payload must be a JSON object")]
    NotAnObject,

    /// A known key carries something other than a number.
    #[error("state field `{key}` must be a number")]
    NotANumber {
        /// The offending key.
        key: String,
    },
}
