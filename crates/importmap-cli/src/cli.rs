use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "importmap")]
#[command(about = "Generate import maps from build output", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run build passes through the pipeline and write one import map
    Generate {
        /// Config file (default: nearest importmap.toml)
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Directory the build wrote its output to
        #[arg(long, short, default_value = "dist")]
        output_dir: PathBuf,

        /// Also print the import map to stdout
        #[arg(long)]
        print: bool,

        /// Pass descriptions (JSON), one per build pass
        #[arg(required = true)]
        passes: Vec<PathBuf>,
    },

    /// Validate a config file and list reported problems
    Check {
        /// Config file
        config: PathBuf,
    },
}
