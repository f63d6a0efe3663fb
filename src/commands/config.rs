//! `boxes-live config`: print the configuration in effect.

use anyhow::Result;

use crate::parser::config::{self, Config};

pub fn run(config: &Config, show_defaults: bool) -> Result<()> {
    if show_defaults {
        print!("{}", config::serialize(&Config::default()));
    } else {
        print!("{}", config::serialize(config));
    }
    Ok(())
}
