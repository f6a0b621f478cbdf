use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Default, Parser)]
#[command(
    name = "serialtrack",
    version,
    about = "Track watch progress across local TV series and play the next episode"
)]
pub struct Cli {
    /// Directory holding one subdirectory per series
    #[arg(long, env = "SERIALTRACK_ROOT")]
    pub root: Option<PathBuf>,

    /// Directory where the progress file is kept
    #[arg(long, env = "SERIALTRACK_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// YAML configuration file
    #[arg(long, env = "SERIALTRACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Rebuild the library from disk, discarding stored progress
    #[arg(long)]
    pub rebuild: bool,

    /// Log filter used when RUST_LOG is unset (e.g. "info", "serialtrack=debug")
    #[arg(long)]
    pub log_level: Option<String>,
}
