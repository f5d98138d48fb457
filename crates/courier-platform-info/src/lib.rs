mod version;

pub use version::{platform_version, PLATFORM_PREFIX};

use anyhow::Result;
use courier_core::channel::{code, CallError, CallOutcome, MethodCall};
use courier_core::plugin::{CourierPlugin, MethodCallHandler};
use courier_core::registry::ChannelRegistry;
use courier_plugin_sdk::PluginManifest;
use serde_json::Value;

/// Channel this plugin binds within the host routing table.
pub const CHANNEL_NAME: &str = "platform_info";

/// Answers every call on its channel with the OS version string.
///
/// The channel is single-purpose, so the method name and arguments are
/// deliberately ignored.
pub struct VersionQueryHandler;

impl MethodCallHandler for VersionQueryHandler {
    fn on_method_call(&self, _call: &MethodCall) -> CallOutcome {
        match platform_version() {
            Ok(reply) => CallOutcome::Ok(Value::String(reply)),
            Err(err) => {
                let message = format!("{err:#}");
                tracing::warn!(error = %message, "platform version query failed");
                CallOutcome::Err(CallError::new(code::PLATFORM_QUERY_FAILURE, message))
            }
        }
    }
}

pub struct PlatformInfoPlugin;

impl CourierPlugin for PlatformInfoPlugin {
    fn name(&self) -> &'static str {
        "platform-info"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn attach(&self, registry: &mut ChannelRegistry, _cfg: Value) -> Result<()> {
        registry.register(CHANNEL_NAME, Box::new(VersionQueryHandler));
        Ok(())
    }

    fn detach(&self, registry: &mut ChannelRegistry) {
        registry.unregister(CHANNEL_NAME);
    }
}

/// Manifest describing this plugin to host tooling.
pub fn manifest() -> PluginManifest {
    PluginManifest {
        name: "platform-info".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        description: Some("answers every call on its channel with the host OS version".into()),
        module: None,
        channels: vec![CHANNEL_NAME.into()],
        config_schema: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn reply_for(method: &str) -> String {
        match VersionQueryHandler.on_method_call(&MethodCall::new(CHANNEL_NAME, method)) {
            CallOutcome::Ok(Value::String(reply)) => reply,
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn reply_is_a_nonempty_prefix_version_pair() {
        let reply = reply_for("getPlatformVersion");
        assert!(reply.starts_with(PLATFORM_PREFIX));
        assert!(Regex::new(r"^\S+ \S+").unwrap().is_match(&reply));
    }

    #[test]
    fn repeated_calls_are_stable_within_a_run() {
        assert_eq!(reply_for("getPlatformVersion"), reply_for("getPlatformVersion"));
    }

    #[test]
    fn method_name_is_ignored() {
        assert_eq!(reply_for("getPlatformVersion"), reply_for("somethingElse"));
        assert_eq!(reply_for(""), reply_for("getPlatformVersion"));
    }

    #[test]
    fn attach_binds_the_channel_and_detach_clears_it() {
        let mut registry = ChannelRegistry::new();
        let plugin = PlatformInfoPlugin;
        plugin.attach(&mut registry, Value::Null).unwrap();
        assert!(registry.is_registered(CHANNEL_NAME));

        let outcome = registry.dispatch(&MethodCall::new(CHANNEL_NAME, ""));
        assert!(outcome.is_ok());

        plugin.detach(&mut registry);
        assert!(!registry.is_registered(CHANNEL_NAME));
    }

    #[test]
    fn attaching_twice_keeps_the_last_registration() {
        let mut registry = ChannelRegistry::new();
        let plugin = PlatformInfoPlugin;
        plugin.attach(&mut registry, Value::Null).unwrap();
        plugin.attach(&mut registry, Value::Null).unwrap();
        assert!(registry
            .dispatch(&MethodCall::new(CHANNEL_NAME, ""))
            .is_ok());
    }

    #[test]
    fn manifest_names_the_bound_channel() {
        let manifest = manifest();
        assert_eq!(manifest.name, "platform-info");
        assert!(manifest.binds_channel(CHANNEL_NAME));
    }
}
