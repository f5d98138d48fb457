use serde_json::Value;

use crate::channel::{CallOutcome, MethodCall};
use crate::registry::ChannelRegistry;

/// Single-method capability interface invoked by the host dispatcher.
///
/// A handler answers exactly one channel; it never initiates calls outward.
pub trait MethodCallHandler: Send + Sync + 'static {
    fn on_method_call(&self, call: &MethodCall) -> CallOutcome;
}

/// Canonical plugin trait implemented by plugins compiled into the host.
///
/// `attach` binds the plugin's handlers into the registry and is called once
/// at engine startup; `detach` must remove every binding `attach` created.
pub trait CourierPlugin: Send + Sync + 'static {
    fn name(&self) -> &'static str;
    fn version(&self) -> semver::Version;
    fn attach(&self, registry: &mut ChannelRegistry, cfg: Value) -> anyhow::Result<()>;
    fn detach(&self, registry: &mut ChannelRegistry);
}
