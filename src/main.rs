//! Strata - chunked block grid on a prototype-aware ECS
//!
//! Builds a small demo scene and logs what ended up where.

mod scene;
mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::scene::Scene;
use crate::settings::Settings;

fn main() -> Result<()> {
    let explicit = std::env::args_os().nth(1).map(PathBuf::from);
    let (settings, note) = match &explicit {
        Some(path) => (Settings::load_from(path)?, None),
        None => Settings::load(),
    };

    // RUST_LOG wins over the configured filter
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.logging.filter))
        .context("invalid logging filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if let Some(note) = note {
        warn!("Settings: {}", note);
    }
    info!("Starting Strata demo...");

    // leave an editable copy of the defaults behind on first run
    if explicit.is_none() {
        if let Some(path) = Settings::settings_path() {
            if let Err(e) = settings::write_default_if_missing(&path) {
                warn!("Could not write default settings: {:#}", e);
            }
        }
    }

    let scene = Scene::build(&settings.scene).context("failed to build scene")?;
    scene.log_summary()?;

    let center = scene.region.min().offset(1, 1, 0);
    match scene.glyph_at(center)? {
        Some(glyph) => info!("block {} is drawn as '{}'", center, glyph),
        None => info!("block {} has no glyph", center),
    }

    Ok(())
}
