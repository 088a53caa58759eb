//! Command-line and environment configuration.
//!
//! Every option can come from a flag or an environment variable; flags win.
//! `PORT` keeps its conventional name so hosting platforms can set it.

use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::lifecycle::DataFiles;
use crate::logging::Verbosity;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_DATA_DIR: &str = "data";

/// Options shared by both binaries
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Directory holding Mascotas.csv, Vuelos.csv and Usuarios.csv
    #[arg(long, env = "DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Log debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

impl CommonArgs {
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.quiet)
    }

    pub fn data_files(&self) -> DataFiles {
        DataFiles::new(&self.data_dir)
    }
}

/// HTTP server configuration (`pet-server`)
#[derive(Debug, Clone, Parser)]
#[command(name = "pet-server", version, about = "Pet flight booking HTTP server")]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl ServerConfig {
    /// Socket address to bind, from `host` and `port`
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// Admin CLI (`pet-flights`)
#[derive(Debug, Clone, Parser)]
#[command(name = "pet-flights", version, about = "Inspect and prepare pet flight data files")]
pub struct CliConfig {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Create header-only CSV files for any that are missing
    Init,
    /// Load every file and report counts and skipped rows
    Check,
}
