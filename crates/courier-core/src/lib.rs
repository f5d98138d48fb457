pub mod channel;
pub mod config;
pub mod engine;
pub mod plugin;
pub mod registry;

/// Returns the crate version baked in at compile time.
pub const fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
