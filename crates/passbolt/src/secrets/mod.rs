//! Passbolt secret resolution
//!
//! [`PassboltSecretsClient`] answers the host's read requests by fetching
//! a resource, decrypting its secret and flattening both into a
//! [`PassboltSecret`] record.

mod record;
mod resolver;

pub use record::{PassboltSecret, SUPPORTED_PROPERTIES};
pub use resolver::PassboltSecretsClient;
