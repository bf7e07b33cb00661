//! Command execution against a secret store
//!
//! Every command resolves the store's provider through the registry. Read
//! commands open one client, run, and close it again before returning.

use crate::cli::Commands;
use crate::errors::CliError;
use boltsync_passbolt::PassboltProvider;
use boltsync_secrets::{
    FindSpec, ProviderRegistry, RemoteRef, SecretMap, SecretStore, SecretsClient,
};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// Registry with every provider this binary ships.
pub fn default_registry() -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(PassboltProvider::new()));
    registry
}

/// Read a store definition. JSON is accepted as a subset of YAML.
pub fn load_store(path: &Path) -> Result<SecretStore, CliError> {
    let contents = std::fs::read_to_string(path).map_err(|source| CliError::StoreRead {
        path: path.to_path_buf(),
        source,
    })?;

    serde_yaml::from_str(&contents).map_err(|source| CliError::StoreParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Run `command` against `store` and return what should be written to stdout.
pub async fn execute(
    command: &Commands,
    store: &SecretStore,
    registry: &ProviderRegistry,
) -> Result<Vec<u8>, CliError> {
    let failed = |source| CliError::command_failed(command.name(), source);
    let provider = registry.for_store(store).map_err(failed)?;

    if *command == Commands::Validate {
        let warnings = provider.validate_store(store).map_err(failed)?;
        let mut report = format!(
            "Store '{}' is valid ({})\n",
            store.name,
            provider.provider_name()
        );
        for warning in warnings {
            report.push_str(&format!("warning: {warning}\n"));
        }
        return Ok(report.into_bytes());
    }

    if !provider.capabilities().can_read() {
        return Err(CliError::NotReadable {
            provider: provider.provider_name(),
        });
    }

    provider.validate_store(store).map_err(failed)?;
    let client = provider.new_client(store).await.map_err(failed)?;
    tracing::debug!(
        store = %store.name,
        command = command.name(),
        "Running command"
    );

    let result = run(client.as_ref(), command).await;
    let closed = client.close().await;

    match (result, closed) {
        (Ok(output), Ok(())) => Ok(output),
        (Ok(_), Err(e)) => Err(failed(e)),
        (Err(e), closed) => {
            if let Err(close_error) = closed {
                tracing::warn!(error = %close_error, "Failed to close secret store session");
            }
            Err(e)
        }
    }
}

/// Run a read command on an open client.
pub async fn run(client: &dyn SecretsClient, command: &Commands) -> Result<Vec<u8>, CliError> {
    let failed = |source| CliError::command_failed(command.name(), source);

    match command {
        Commands::Validate => Ok(Vec::new()),
        Commands::Get { key, property } => {
            let remote_ref = RemoteRef {
                key: key.clone(),
                property: property.clone(),
            };
            let value = client.get_secret(&remote_ref).await.map_err(failed)?;
            Ok(value.expose().to_vec())
        }
        Commands::GetMap { key } => {
            let map = client
                .get_secret_map(&RemoteRef::new(key.as_str()))
                .await
                .map_err(failed)?;
            render(&fields_as_json(&map))
        }
        Commands::Find { name } => {
            let map = client
                .get_all_secrets(&FindSpec::by_name(name.as_str()))
                .await
                .map_err(failed)?;
            render(&records_as_json(&map))
        }
    }
}

/// Field name to lossy UTF-8 text, sorted by field name.
fn fields_as_json(map: &SecretMap) -> Value {
    Value::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), Value::String(v.expose_lossy().into_owned())))
            .collect(),
    )
}

/// Backend ID to record. Records holding JSON are embedded as objects.
fn records_as_json(map: &SecretMap) -> Value {
    Value::Object(
        map.iter()
            .map(|(k, v)| {
                let record = serde_json::from_slice(v.expose())
                    .unwrap_or_else(|_| Value::String(v.expose_lossy().into_owned()));
                (k.clone(), record)
            })
            .collect(),
    )
}

fn render(value: &Value) -> Result<Vec<u8>, CliError> {
    let mut output = serde_json::to_vec_pretty(value).map_err(CliError::output)?;
    output.push(b'\n');
    Ok(output)
}
