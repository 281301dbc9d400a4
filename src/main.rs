mod action;
mod applier;
mod bookmark;
mod config;
mod filters;
mod keymap;
mod log;
mod logging;
mod mutations;
mod profile;
mod resolver;
mod store;
mod tui;

use anyhow::{Context, Result};

use crate::profile::Profile;
use crate::store::FileStore;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init()?;

    let mut config = config::Config::load()?;
    if let Some(dir) = std::env::args().nth(1) {
        config.data_dir = dir;
    }

    let store = FileStore::new(config.data_path());
    tracing::info!(path = %store.dir().display(), "opening profile");
    let profile = Profile::load(store)
        .await
        .context("failed to load bookmarks")?;

    let app = tui::App::new(profile, config);
    tui::run(app).await
}
