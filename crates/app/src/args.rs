pub use clap::Parser;

use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "fshare")]
#[command(about = "Share files, directories and text over your local network")]
pub struct Args {
    /// Daemon to talk to (defaults to localhost on the configured port)
    #[arg(long, global = true)]
    pub remote: Option<Url>,

    /// Path to the fshare config directory (defaults to ~/.fshare)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    /// Session token, needed when the daemon has auth enabled (defaults to
    /// the one saved by `fshare login`)
    #[arg(long, global = true, env = "FSHARE_TOKEN")]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: crate::Command,
}
