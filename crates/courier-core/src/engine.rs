use std::time::Instant;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::channel::{self, CallError, CallOutcome, MethodCall};
use crate::config::Config;
use crate::plugin::CourierPlugin;
use crate::registry::ChannelRegistry;

/// Host runtime: owns the registry and the attached plugins, and serves the
/// newline-delimited JSON request/reply loop over stdio.
pub struct Engine {
    name: String,
    registry: ChannelRegistry,
    plugins: Vec<Box<dyn CourierPlugin>>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("name", &self.name)
            .field("plugins", &self.plugins.len())
            .finish()
    }
}

impl Engine {
    /// Attaches every enabled configured plugin from `catalog` to a fresh
    /// registry. Plugins named in the config but missing from the catalog are
    /// a startup error, not a per-call one.
    pub fn new(config: Config, mut catalog: Vec<Box<dyn CourierPlugin>>) -> Result<Self> {
        config.validate()?;
        let name = config.engine_name().to_string();
        let mut registry = ChannelRegistry::new();
        let mut plugins = Vec::new();
        for entry in config.plugins.iter().filter(|entry| entry.enabled) {
            let position = catalog
                .iter()
                .position(|plugin| plugin.name() == entry.name)
                .with_context(|| {
                    format!("unknown plugin `{}` (not compiled into this host)", entry.name)
                })?;
            let plugin = catalog.swap_remove(position);
            plugin
                .attach(&mut registry, entry.config.clone())
                .with_context(|| format!("failed to attach plugin `{}`", entry.name))?;
            tracing::info!(
                plugin = plugin.name(),
                version = %plugin.version(),
                "plugin attached"
            );
            plugins.push(plugin);
        }
        Ok(Self {
            name,
            registry,
            plugins,
        })
    }

    /// Routes one call through the registry under a per-call span.
    pub fn dispatch(&self, call: &MethodCall) -> CallOutcome {
        let start = Instant::now();
        let span = tracing::info_span!(
            "call",
            channel = %call.channel,
            method = %call.method,
            outcome = tracing::field::Empty,
            duration_ms = tracing::field::Empty,
        );
        let _enter = span.enter();
        let outcome = self.registry.dispatch(call);
        span.record("outcome", outcome.label());
        span.record("duration_ms", start.elapsed().as_millis() as i64);
        outcome
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    /// Serves calls from stdin until EOF or Ctrl+C, one at a time.
    ///
    /// Each call is handled to completion before the next line is read, so
    /// handlers never observe concurrent calls.
    pub async fn serve(mut self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();
        tracing::info!(
            engine = %self.name,
            channels = ?self.registry.channel_names(),
            "engine ready; awaiting calls on stdin"
        );

        loop {
            tokio::select! {
                biased;
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("shutdown signal received; draining");
                    break;
                }
                line = lines.next_line() => {
                    let Some(line) = line.context("failed to read call from stdin")? else {
                        tracing::info!("input closed; draining");
                        break;
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    let outcome = self.handle_line(&line);
                    let encoded = channel::encode_outcome(&outcome)?;
                    stdout.write_all(encoded.as_bytes()).await?;
                    stdout.write_all(b"\n").await?;
                    stdout.flush().await?;
                }
            }
        }

        self.detach_all();
        Ok(())
    }

    fn handle_line(&self, line: &str) -> CallOutcome {
        match channel::decode_call(line) {
            Ok(call) => self.dispatch(&call),
            Err(err) => {
                tracing::warn!(error = %err, "discarding malformed call line");
                CallOutcome::Err(CallError::bad_request(format!("{err:#}")))
            }
        }
    }

    fn detach_all(&mut self) {
        for plugin in &self.plugins {
            plugin.detach(&mut self.registry);
            tracing::info!(plugin = plugin.name(), "plugin detached");
        }
    }
}
