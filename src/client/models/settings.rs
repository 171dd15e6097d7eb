//! SAST settings wire format

use serde::Deserialize;
use serde_json::{Value, json};

/// `GET /orgs/{id}/settings/sast` response
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct SastSettingsResponse {
    #[serde(default)]
    pub data: SastSettingsData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct SastSettingsData {
    #[serde(default)]
    pub attributes: SastSettingsAttributes,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct SastSettingsAttributes {
    #[serde(default)]
    pub sast_enabled: bool,
}

impl SastSettingsResponse {
    pub fn enabled(&self) -> bool {
        self.data.attributes.sast_enabled
    }
}

/// JSON:API body for `PATCH /orgs/{id}/settings/sast`
pub(crate) fn sast_settings_patch(org_id: &str, enabled: bool) -> Value {
    json!({
        "data": {
            "id": org_id,
            "type": "sast_settings",
            "attributes": { "sast_enabled": enabled }
        }
    })
}
