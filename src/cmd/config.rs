//! Configuration view and scaffolding (`chatrelay config`).

use anyhow::{Result, bail};

use chatrelay::config::{CONFIG_FILE_NAME, ConfigFile, Settings};

use crate::ConfigCommands;

pub fn cmd_config(settings: &Settings, command: Option<ConfigCommands>) -> Result<()> {
    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("chatrelay configuration");
            println!("=======================");
            println!();
            match &settings.source {
                Some(path) => println!("Config file: {}", path.display()),
                None => println!("Config file: none (using environment and defaults)"),
            }
            println!();
            println!("[provider]");
            println!("  model = \"{}\"", settings.model);
            println!("  base_url = \"{}\"", settings.base_url);
            match settings.masked_api_key() {
                Some(key) => println!("  api_key = \"{}\"", key),
                None => println!("  api_key = {}", console::style("not set").red()),
            }
            println!();
            println!("[server]");
            println!("  host = \"{}\"", settings.host);
            println!("  port = {}", settings.port);
            println!("  cors = {}", settings.cors);
            println!();
            println!("[client]");
            println!("  server_url = \"{}\"", settings.server_url);
            println!(
                "  reveal_interval_ms = {}",
                settings.reveal_interval.as_millis()
            );
            println!();
        }
        Some(ConfigCommands::Init) => {
            let path = std::env::current_dir()?.join(CONFIG_FILE_NAME);
            if path.exists() {
                bail!("{} already exists", path.display());
            }
            let mut file = ConfigFile::default();
            file.provider.model = Some(settings.model.clone());
            file.server.port = Some(settings.port);
            file.client.server_url = Some(settings.server_url.clone());
            file.save(&path)?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}
