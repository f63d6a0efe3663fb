use std::path::PathBuf;

use anyhow::Result;

use crate::parser::config::Config;
use crate::tui::app::{self, ViewOptions};

pub fn run(config: Config, file: Option<PathBuf>, demo: bool, gamepad: bool) -> Result<()> {
    app::run(config, ViewOptions { file, demo, gamepad })
}
