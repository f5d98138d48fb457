pub mod manifest;

pub use manifest::PluginManifest;

use serde_json::Value;

/// Trait implemented by plugins compiled outside the core workspace.
///
/// The host adapts implementors onto its own plugin interface at load time;
/// `channels` declares the channel names the plugin intends to bind.
pub trait Plugin {
    fn name(&self) -> &'static str;
    fn version(&self) -> semver::Version;
    fn init(&mut self, config: Value) -> anyhow::Result<()>;
    fn channels(&self) -> &'static [&'static str];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct BatteryLevel {
        threshold: Option<u64>,
    }

    impl Plugin for BatteryLevel {
        fn name(&self) -> &'static str {
            "battery-level"
        }

        fn version(&self) -> semver::Version {
            semver::Version::new(0, 2, 1)
        }

        fn init(&mut self, config: Value) -> anyhow::Result<()> {
            self.threshold = config.get("threshold").and_then(Value::as_u64);
            Ok(())
        }

        fn channels(&self) -> &'static [&'static str] {
            &["battery_level"]
        }
    }

    #[test]
    fn init_receives_the_plugin_config() {
        let mut plugin = BatteryLevel::default();
        plugin
            .init(serde_json::json!({ "threshold": 20 }))
            .unwrap();
        assert_eq!(plugin.threshold, Some(20));
        assert_eq!(plugin.channels(), ["battery_level"]);
    }
}
