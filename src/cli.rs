use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "filefetch")]
#[command(about = "Resumable, time-boxed file fetcher", long_about = None, version)]
pub struct Cli {
    /// Settings file, overriding FILEFETCH_CONFIG
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one time-boxed attempt of a fetch job, creating it if needed
    Fetch(FetchArgs),
    /// Print the stored record of a job
    Status(StatusArgs),
    /// List stored job ids
    List,
}

#[derive(clap::Args, Debug)]
pub struct FetchArgs {
    /// Local path or http(s) URL to copy from
    pub source: String,

    /// Job id; a new one is generated when omitted
    #[arg(long)]
    pub id: Option<String>,

    /// Seconds this run may spend copying
    #[arg(long, value_name = "SECS")]
    pub time_limit: Option<u64>,

    /// Explicit destination path
    #[arg(long)]
    pub destination: Option<PathBuf>,

    /// Directory for downloaded files
    #[arg(long = "temp-dir")]
    pub temp_dir: Option<PathBuf>,

    /// Name remote downloads after the source's base name
    #[arg(long)]
    pub keep_original_filename: bool,

    /// Preferred processor id, may be repeated
    #[arg(long = "processor", value_name = "ID")]
    pub processors: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    pub id: String,
}
