use std::collections::HashMap;

use crate::channel::{CallError, CallOutcome, MethodCall};
use crate::plugin::MethodCallHandler;

/// Process-wide registration table mapping channel names to their handlers.
///
/// Exactly one handler may be bound per channel. Re-registering a name is
/// allowed; the last registration wins.
#[derive(Default)]
pub struct ChannelRegistry {
    handlers: HashMap<String, Box<dyn MethodCallHandler>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `handler` as the exclusive receiver for `channel`.
    pub fn register(&mut self, channel: impl Into<String>, handler: Box<dyn MethodCallHandler>) {
        let channel = channel.into();
        if self.handlers.insert(channel.clone(), handler).is_some() {
            tracing::warn!(channel = %channel, "replacing existing channel handler");
        } else {
            tracing::debug!(channel = %channel, "channel handler registered");
        }
    }

    /// Removes the binding for `channel`. Returns whether one existed.
    pub fn unregister(&mut self, channel: &str) -> bool {
        self.handlers.remove(channel).is_some()
    }

    pub fn is_registered(&self, channel: &str) -> bool {
        self.handlers.contains_key(channel)
    }

    /// Sorted channel names, for diagnostics.
    pub fn channel_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Routes one call to its bound handler.
    ///
    /// A call addressed to an unbound channel never reaches a handler; it is
    /// answered with a `not_implemented` error outcome.
    pub fn dispatch(&self, call: &MethodCall) -> CallOutcome {
        match self.handlers.get(&call.channel) {
            Some(handler) => {
                let outcome = handler.on_method_call(call);
                let label = match outcome {
                    CallOutcome::Ok(_) => "hit",
                    CallOutcome::Err(_) => "error",
                };
                metrics::counter!("courier_calls_total", "outcome" => label).increment(1);
                outcome
            }
            None => {
                metrics::counter!("courier_calls_total", "outcome" => "miss").increment(1);
                CallOutcome::Err(CallError::not_implemented(&call.channel))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::code;
    use serde_json::Value;

    struct FixedReply(&'static str);

    impl MethodCallHandler for FixedReply {
        fn on_method_call(&self, _call: &MethodCall) -> CallOutcome {
            CallOutcome::Ok(Value::String(self.0.to_string()))
        }
    }

    #[test]
    fn dispatch_routes_to_the_bound_handler() {
        let mut registry = ChannelRegistry::new();
        registry.register("platform_info", Box::new(FixedReply("Linux 6.8.0")));

        let outcome = registry.dispatch(&MethodCall::new("platform_info", "getPlatformVersion"));
        match outcome {
            CallOutcome::Ok(Value::String(reply)) => assert_eq!(reply, "Linux 6.8.0"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn unbound_channel_yields_not_implemented() {
        let registry = ChannelRegistry::new();
        let outcome = registry.dispatch(&MethodCall::new("battery_level", "read"));
        match outcome {
            CallOutcome::Err(err) => assert_eq!(err.code, code::NOT_IMPLEMENTED),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn re_registering_a_channel_keeps_the_last_handler() {
        let mut registry = ChannelRegistry::new();
        registry.register("platform_info", Box::new(FixedReply("first")));
        registry.register("platform_info", Box::new(FixedReply("second")));

        let outcome = registry.dispatch(&MethodCall::new("platform_info", ""));
        match outcome {
            CallOutcome::Ok(Value::String(reply)) => assert_eq!(reply, "second"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn unregister_removes_the_binding() {
        let mut registry = ChannelRegistry::new();
        registry.register("platform_info", Box::new(FixedReply("Linux 6.8.0")));
        assert!(registry.unregister("platform_info"));
        assert!(!registry.unregister("platform_info"));
        assert!(!registry.is_registered("platform_info"));
        assert!(!registry
            .dispatch(&MethodCall::new("platform_info", ""))
            .is_ok());
    }

    #[test]
    fn channel_names_are_sorted() {
        let mut registry = ChannelRegistry::new();
        registry.register("b_channel", Box::new(FixedReply("")));
        registry.register("a_channel", Box::new(FixedReply("")));
        assert_eq!(registry.channel_names(), vec!["a_channel", "b_channel"]);
    }
}
