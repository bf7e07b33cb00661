use crate::tracing::{LogLevel, TracingFormat};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "boltsync")]
#[command(about = "Read secrets from a Passbolt secret store")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    #[arg(
        long,
        short = 's',
        global = true,
        env = "BOLTSYNC_STORE",
        help = "Secret store definition (YAML or JSON)"
    )]
    pub store: Option<PathBuf>,

    #[arg(
        short = 'l',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub log_level: LogLevel,

    #[arg(
        long,
        global = true,
        help = "Log output format",
        default_value = "compact",
        value_enum
    )]
    pub log_format: TracingFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    #[command(about = "Check the store definition without contacting the server")]
    Validate,
    #[command(about = "Print one secret; the full record as JSON unless --property is given")]
    Get {
        #[arg(help = "Resource ID")]
        key: String,
        #[arg(long, short = 'p', help = "Single field to print (e.g. password, username)")]
        property: Option<String>,
    },
    #[command(about = "Print every field of one secret as a JSON object")]
    GetMap {
        #[arg(help = "Resource ID")]
        key: String,
    },
    #[command(about = "Print all secrets whose name matches a regular expression")]
    Find {
        #[arg(long, help = "Regular expression matched against resource names")]
        name: String,
    },
}

impl Commands {
    /// Name used in error reports.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Get { .. } => "get",
            Self::GetMap { .. } => "get-map",
            Self::Find { .. } => "find",
        }
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}
