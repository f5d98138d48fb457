use serde::{Deserialize, Serialize};
use serde_json::Value;

/// On-disk JSON manifest located next to each plugin artifact.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PluginManifest {
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    pub module: Option<String>,
    pub channels: Vec<String>,
    pub config_schema: Option<Value>,
}

impl PluginManifest {
    pub fn binds_channel(&self, channel: &str) -> bool {
        self.channels.iter().any(|name| name == channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_parses_with_optional_fields_missing() {
        let manifest: PluginManifest = serde_json::from_str(
            r#"{"name": "platform-info", "version": "0.1.0", "channels": ["platform_info"]}"#,
        )
        .unwrap();
        assert_eq!(manifest.name, "platform-info");
        assert!(manifest.binds_channel("platform_info"));
        assert!(!manifest.binds_channel("battery_level"));
        assert!(manifest.description.is_none());
    }
}
