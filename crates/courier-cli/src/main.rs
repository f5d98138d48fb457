use std::{fs, path::PathBuf, sync::OnceLock};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use courier_core::{
    channel::{self, MethodCall},
    config::Config,
    engine::Engine,
    plugin::CourierPlugin,
};
use courier_platform_info::PlatformInfoPlugin;
use courier_plugin_sdk::PluginManifest;
use regex::Regex;
use serde_json::Value;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "courier", author, version, about = "Method-channel plugin host")]
struct Cli {
    /// Sets the log level (error, warn, info, debug, trace).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the host, serving calls from stdin until EOF or Ctrl+C.
    Run {
        #[arg(
            short,
            long,
            value_name = "FILE",
            default_value = "demos/config/minimal.courier.toml"
        )]
        config: PathBuf,
    },
    /// Dispatch a single call and print the outcome.
    Call {
        #[arg(
            short,
            long,
            value_name = "FILE",
            default_value = "demos/config/minimal.courier.toml"
        )]
        config: PathBuf,
        #[arg(long, value_name = "NAME")]
        channel: String,
        #[arg(long, value_name = "NAME", default_value = "")]
        method: String,
        /// Call arguments as a JSON value.
        #[arg(long, value_name = "JSON")]
        args: Option<String>,
    },
    /// Interact with configuration files (validate, sample output, etc.)
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Inspect compiled-in and discovered plugins.
    Plugins {
        #[command(subcommand)]
        command: PluginCommands,
    },
    /// Dump the resolved configuration as JSON.
    Diag {
        #[arg(
            short,
            long,
            value_name = "FILE",
            default_value = "demos/config/minimal.courier.toml"
        )]
        config: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Validates the provided configuration file.
    Validate {
        #[arg(value_name = "FILE")]
        config: PathBuf,
    },
    /// Prints the bundled minimal example configuration.
    Example,
}

#[derive(Subcommand, Debug)]
enum PluginCommands {
    /// Lists compiled-in plugins and any manifests found on disk.
    List {
        #[arg(long, value_name = "DIR", default_value = "demos/plugins")]
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;
    match cli.command {
        Commands::Run { config } => handle_run(config).await,
        Commands::Call {
            config,
            channel,
            method,
            args,
        } => handle_call(config, channel, method, args),
        Commands::Config { command } => handle_config(command),
        Commands::Plugins { command } => handle_plugins(command),
        Commands::Diag { config } => handle_diag(config),
    }
}

fn init_tracing(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).try_init().ok();
    Ok(())
}

/// Every plugin compiled into this binary.
fn catalog() -> Vec<Box<dyn CourierPlugin>> {
    vec![Box::new(PlatformInfoPlugin)]
}

async fn handle_run(config_path: PathBuf) -> Result<()> {
    let config = load_config(&config_path)?;
    tracing::info!(config = %config_path.display(), "starting courier host");
    let engine = Engine::new(config, catalog())?;
    engine.serve().await
}

fn handle_call(
    config_path: PathBuf,
    channel_name: String,
    method: String,
    args: Option<String>,
) -> Result<()> {
    let config = load_config(&config_path)?;
    let engine = Engine::new(config, catalog())?;
    let args = match args {
        Some(raw) => serde_json::from_str(&raw).context("--args must be a JSON value")?,
        None => Value::Null,
    };
    let call = MethodCall::new(channel_name, method).with_args(args);
    let outcome = engine.dispatch(&call);
    println!("{}", channel::encode_outcome(&outcome)?);
    Ok(())
}

fn handle_config(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Validate { config } => {
            let cfg = load_config(&config)?;
            cfg.validate()?;
            println!("configuration OK: {}", config.display());
        }
        ConfigCommands::Example => {
            println!(
                "{}",
                include_str!("../../../demos/config/minimal.courier.toml")
            );
        }
    }
    Ok(())
}

fn handle_plugins(command: PluginCommands) -> Result<()> {
    match command {
        PluginCommands::List { dir } => {
            let mut manifests = vec![courier_platform_info::manifest()];
            manifests.extend(discover_plugins(&dir)?);
            for manifest in manifests {
                let channels = if manifest.channels.is_empty() {
                    String::new()
                } else {
                    format!(" [channels: {}]", manifest.channels.join(", "))
                };
                println!(
                    "- {} v{}{}{}",
                    manifest.name,
                    manifest.version,
                    manifest
                        .description
                        .as_ref()
                        .map(|d| format!(" — {d}"))
                        .unwrap_or_default(),
                    channels
                );
            }
        }
    }
    Ok(())
}

fn handle_diag(path: PathBuf) -> Result<()> {
    let cfg = load_config(&path)?;
    let json = serde_json::to_string_pretty(&cfg)?;
    println!("{json}");
    Ok(())
}

fn load_config(path: &PathBuf) -> Result<Config> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let expanded = interpolate_env(&raw)?;
    let cfg = toml::from_str::<Config>(&expanded)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(cfg)
}

fn interpolate_env(input: &str) -> Result<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let regex = RE.get_or_init(|| Regex::new(r"\$\{([A-Z0-9_]+)(?::([^}]+))?\}").unwrap());
    let result = regex.replace_all(input, |caps: &regex::Captures| {
        let key = &caps[1];
        let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        std::env::var(key).unwrap_or_else(|_| default.to_string())
    });
    Ok(result.into_owned())
}

fn discover_plugins(dir: &PathBuf) -> Result<Vec<PluginManifest>> {
    let mut manifests = Vec::new();
    if !dir.exists() {
        return Ok(manifests);
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let data = fs::read_to_string(&path)?;
        let manifest: PluginManifest = serde_json::from_str(&data)
            .with_context(|| format!("failed to parse manifest {}", path.display()))?;
        manifests.push(manifest);
    }
    Ok(manifests)
}
