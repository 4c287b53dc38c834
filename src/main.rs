#![windows_subsystem = "windows"]

use anyhow::Result;
use tokendrop::{config::Config, gui, user_settings::UserSettings};

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let settings = UserSettings::load();
    let config = Config::from_settings(&settings);
    gui::launch(config, settings)?;

    Ok(())
}
