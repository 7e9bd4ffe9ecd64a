use clap::{Args, Subcommand};

use crate::config::Config;
use crate::db::Database;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Read a stored setting (api_key, calorie_target, ...)
    Get { key: String },

    /// Store a setting
    Set { key: String, value: String },

    /// Show the active configuration
    Show,
}

impl ConfigCommand {
    pub async fn run(
        &self,
        db: &Database,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Get { key } => {
                match db.settings.get(key).await? {
                    Some(value) => println!("{}", value),
                    None => println!("(not set)"),
                }
                Ok(())
            }
            ConfigSubcommand::Set { key, value } => {
                db.settings.set(key, value).await?;
                println!("Set {}", key);
                Ok(())
            }
            ConfigSubcommand::Show => {
                println!("config file:   {}", Config::default_config_path().display());
                println!("database_path: {}", config.database_path.display());
                println!("data_dir:      {}", config.data_dir.display());
                println!("backend:       {:?}", config.backend);
                println!("health_sync:   {}", config.health_sync);
                Ok(())
            }
        }
    }
}
