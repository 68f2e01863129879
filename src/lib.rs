//! Dock click interception agent.
//!
//! Clicking the dock icon of the application you are already using normally
//! does nothing; this agent suppresses that click and minimizes the app's
//! windows instead, then restores them all on the next click. Everything
//! platform-specific sits behind seam traits, with the live implementations
//! under `macos` submodules.

pub mod agent;
pub mod apps;
#[cfg(target_os = "macos")]
mod ax;
pub mod click;
pub mod config;
pub mod dock;
pub mod events;
pub mod permission;
pub mod relaunch;
pub mod tap;
pub mod windows;
#[cfg(target_os = "macos")]
pub mod workspace;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber. Call once, before the agent starts.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docktoggle=info")),
        )
        .init();
}
