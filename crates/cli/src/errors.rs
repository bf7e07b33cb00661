//! CLI error types rendered through miette

use boltsync_secrets::SecretError;
use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// CLI-specific error types with diagnostics
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("No secret store given")]
    #[diagnostic(
        code(boltsync::cli::store_missing),
        help("Pass the store definition with --store or BOLTSYNC_STORE")
    )]
    StoreMissing,

    #[error("Failed to read secret store '{}'", .path.display())]
    #[diagnostic(
        code(boltsync::cli::store_read),
        help("Check that the file exists and is readable")
    )]
    StoreRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse secret store '{}'", .path.display())]
    #[diagnostic(
        code(boltsync::cli::store_parse),
        help("The store must be a YAML or JSON document with 'name' and 'provider' keys")
    )]
    StoreParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Command '{command}' failed")]
    #[diagnostic(code(boltsync::cli::command_failed))]
    CommandFailed {
        command: &'static str,
        #[source]
        source: SecretError,
        #[help]
        help_text: Option<String>,
    },

    #[error("Provider '{provider}' cannot read secrets")]
    #[diagnostic(
        code(boltsync::cli::not_readable),
        help("Only 'validate' works against a write-only store")
    )]
    NotReadable { provider: &'static str },

    #[error("Failed to write command output")]
    #[diagnostic(code(boltsync::cli::output))]
    Output {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Tracing initialization failed")]
    #[diagnostic(
        code(boltsync::cli::tracing_error),
        help("Check the RUST_LOG environment variable")
    )]
    TracingError {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl CliError {
    pub fn command_failed(command: &'static str, source: SecretError) -> Self {
        let help_text = suggestion(&source);
        Self::CommandFailed {
            command,
            source,
            help_text,
        }
    }

    pub fn output(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Output {
            source: source.into(),
        }
    }

    pub fn tracing(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::TracingError {
            source: source.into(),
        }
    }
}

fn suggestion(error: &SecretError) -> Option<String> {
    match error {
        SecretError::InvalidStore { .. } => {
            Some("Run 'boltsync validate' after fixing the store definition".to_string())
        }
        SecretError::UnsupportedProperty { supported, .. } => {
            Some(format!("Use --property with one of: {supported}"))
        }
        SecretError::UnsupportedProvider { .. } => {
            Some("The store's provider block must contain exactly one 'passbolt' entry".to_string())
        }
        SecretError::InvalidPattern { .. } => {
            Some("--name takes a regular expression, e.g. '^db-.*'".to_string())
        }
        _ => None,
    }
}
