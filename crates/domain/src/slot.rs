//! App slots — configuration entries describing which apps to load.

use serde::{Deserialize, Serialize};

use crate::app_kind::AppKind;
use crate::error::ConfigError;
use crate::id::{AppId, EntityId};

/// One `(position, app kind, app id, friendly name, entity id)` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSlot {
    /// Menu position.
    pub position: u8,
    /// App kind slug, e.g. `climate`.
    #[serde(alias = "kind")]
    pub app_slug: String,
    pub app_id: AppId,
    #[serde(default)]
    pub friendly_name: String,
    #[serde(default)]
    pub entity_id: EntityId,
}

impl AppSlot {
    /// Check the slot and resolve its app kind.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyAppId`] when `app_id` is empty and
    /// [`ConfigError::UnknownAppKind`] when the slug is not a known kind.
    pub fn validate(&self) -> Result<AppKind, ConfigError> {
        if self.app_id.is_empty() {
            return Err(ConfigError::EmptyAppId);
        }
        self.app_slug.parse()
    }
}

/// Parse a JSON list of slots, one result per entry.
///
/// A malformed entry yields an error in its place without affecting the
/// others, so callers can log it and move on.
///
/// # Errors
///
/// Returns [`ConfigError::NotAList`] if `value` is not an array.
pub fn parse_json_slots(
    value: &serde_json::Value,
) -> Result<Vec<Result<AppSlot, ConfigError>>, ConfigError> {
    let entries = value.as_array().ok_or(ConfigError::NotAList)?;
    Ok(entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            AppSlot::deserialize(entry).map_err(|err| ConfigError::MalformedSlot {
                index,
                reason: err.to_string(),
            })
        })
        .collect())
}
