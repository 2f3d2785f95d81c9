//! Configuration management commands for CLI.

use clap::Subcommand;

use agenda_core::storage::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the current configuration
    Show,
    /// Set the default owner identity
    SetOwner {
        /// Owner name
        owner: String,
    },
    /// Set the extraction endpoint and model
    SetExtraction {
        /// API root, e.g. https://api.openai.com/v1
        #[arg(long)]
        endpoint: Option<String>,
        /// Model name
        #[arg(long)]
        model: Option<String>,
    },
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show => {
            let config = Config::load()?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::SetOwner { owner } => {
            let mut config = Config::load()?;
            config.owner = owner;
            config.save()?;
            println!("owner set to {}", config.owner);
        }
        ConfigAction::SetExtraction { endpoint, model } => {
            let mut config = Config::load()?;
            if let Some(endpoint) = endpoint {
                config.extraction.endpoint = endpoint;
            }
            if let Some(model) = model {
                config.extraction.model = model;
            }
            config.save()?;
            println!(
                "extraction: {} ({})",
                config.extraction.endpoint, config.extraction.model
            );
        }
    }
    Ok(())
}
