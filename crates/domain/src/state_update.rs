//! Entity state updates — outward reports of an app's current values.

use serde::{Deserialize, Serialize};

use crate::app_kind::AppKind;
use crate::id::{AppId, EntityId};
use crate::value::SettingValue;

/// Key carrying the active setting index in every state payload.
pub const CURRENT_SETTING_KEY: &str = "current_setting";

/// Immutable snapshot of an app's state, for the external reporting sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityStateUpdate {
    pub app_id: AppId,
    pub entity_id: EntityId,
    pub app_slug: AppKind,
    /// Flat JSON object of numeric fields, one per setting plus
    /// [`CURRENT_SETTING_KEY`].
    pub state: String,
    /// `false` marks a snapshot with no externally meaningful change.
    pub changed: bool,
}

impl EntityStateUpdate {
    /// Serialize `values` into a snapshot.
    ///
    /// The payload is built from the values themselves, so it always agrees
    /// with them and is always a valid JSON object.
    #[must_use]
    pub fn from_values(
        app_id: AppId,
        entity_id: EntityId,
        kind: AppKind,
        values: &[SettingValue],
        current_setting: usize,
        changed: bool,
    ) -> Self {
        let mut payload = serde_json::Map::new();
        for value in values {
            payload.insert(value.setting().key().to_string(), value.to_json());
        }
        payload.insert(
            CURRENT_SETTING_KEY.to_string(),
            serde_json::Value::from(current_setting),
        );

        Self {
            app_id,
            entity_id,
            app_slug: kind,
            state: serde_json::Value::Object(payload).to_string(),
            changed,
        }
    }

    /// Parse the payload back into JSON.
    ///
    /// # Errors
    ///
    /// Only fails for snapshots whose `state` was edited by hand.
    pub fn state_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.state)
    }
}
