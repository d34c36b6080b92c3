pub mod codegen;
pub mod config;
pub mod content;
pub mod generate;
pub mod load_config;
pub mod materialise;
pub mod remote;
pub mod tree;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use config::SourceAction;
use generate::generate;
use load_config::load_config;

#[derive(Parser)]
#[clap(
    name = "proto-mirror",
    version,
    about = "Mirror protobuf definition trees from GitHub and run a code generator over the result"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch all configured sources and run the code generator
    Generate {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Pin every tree source to this revision, overriding the config
        #[clap(long)]
        reference: Option<String>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Generate { config, reference } => {
            let mut config = load_config(config)?;
            if let Some(reference) = reference {
                for source in &mut config.sources {
                    if let SourceAction::Tree(tree) = source {
                        tree.reference = Some(reference.clone());
                    }
                }
            }
            println!("Generation starting...");
            match generate(&config).await {
                Ok(report) => {
                    println!("Generation complete.\nReport:");
                    println!("{:#?}", report);
                    Ok(())
                }
                Err(e) => {
                    eprintln!("[ERROR] Generation failed: {:#}", e);
                    Err(e)
                }
            }
        }
    }
}
