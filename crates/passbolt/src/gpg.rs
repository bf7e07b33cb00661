//! OpenPGP decryption through the `gpg` CLI
//!
//! Passbolt encrypts every secret for the user's key. The backend never
//! implements OpenPGP itself: [`GpgDecryptor`] imports the configured key
//! into a throwaway keyring and shells out to `gpg` for each message.

use crate::client::PassboltError;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Decrypts messages addressed to the Passbolt user.
#[async_trait]
pub trait Decryptor: Send + Sync {
    /// Fingerprint of the user's primary key (uppercase hex).
    fn fingerprint(&self) -> &str;

    /// Decrypt an armored OpenPGP message.
    async fn decrypt(&self, armored: &str) -> Result<String, PassboltError>;
}

/// [`Decryptor`] backed by the `gpg` binary and a private `GNUPGHOME`.
///
/// The keyring lives in a temporary directory that is removed when the
/// decryptor is dropped.
pub struct GpgDecryptor {
    program: PathBuf,
    home: TempDir,
    passphrase_file: PathBuf,
    fingerprint: String,
}

impl std::fmt::Debug for GpgDecryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpgDecryptor")
            .field("program", &self.program)
            .field("home", &self.home.path())
            .field("fingerprint", &self.fingerprint)
            .finish_non_exhaustive()
    }
}

impl GpgDecryptor {
    /// Import `private_key` into a fresh keyring using `gpg` from `PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`PassboltError::Decrypt`] if `gpg` cannot be run, the key
    /// cannot be imported, or no secret key fingerprint can be read back.
    pub async fn import(
        private_key: &SecretString,
        passphrase: &SecretString,
    ) -> Result<Self, PassboltError> {
        Self::import_with_program("gpg", private_key, passphrase).await
    }

    /// Like [`GpgDecryptor::import`] with an explicit `gpg` executable.
    ///
    /// # Errors
    ///
    /// See [`GpgDecryptor::import`].
    pub async fn import_with_program(
        program: impl Into<PathBuf>,
        private_key: &SecretString,
        passphrase: &SecretString,
    ) -> Result<Self, PassboltError> {
        let program = program.into();
        let home = tempfile::Builder::new()
            .prefix("boltsync-gnupg-")
            .tempdir()
            .map_err(|e| PassboltError::Decrypt(format!("failed to create GnuPG home: {e}")))?;

        let passphrase_file = home.path().join("passphrase");
        write_private_file(&passphrase_file, passphrase.expose_secret().as_bytes())?;

        let mut decryptor = Self {
            program,
            home,
            passphrase_file,
            fingerprint: String::new(),
        };

        decryptor
            .run(&["--import"], Some(private_key.expose_secret().as_bytes()))
            .await?;

        let listing = decryptor
            .run(&["--with-colons", "--list-secret-keys"], None)
            .await?;
        let listing = String::from_utf8_lossy(&listing);
        decryptor.fingerprint = parse_primary_fingerprint(&listing).ok_or_else(|| {
            PassboltError::Decrypt("no secret key found after import".to_string())
        })?;

        tracing::debug!(fingerprint = %decryptor.fingerprint, "Imported Passbolt private key");
        Ok(decryptor)
    }

    /// Run `gpg` against the private home, optionally feeding `stdin`.
    async fn run(&self, args: &[&str], stdin: Option<&[u8]>) -> Result<Vec<u8>, PassboltError> {
        let mut command = Command::new(&self.program);
        command
            .arg("--homedir")
            .arg(self.home.path())
            .args(["--batch", "--quiet", "--no-tty", "--pinentry-mode", "loopback"])
            .arg("--passphrase-file")
            .arg(&self.passphrase_file)
            .args(args);

        let output = communicate(&mut command, stdin).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PassboltError::Decrypt(format!(
                "gpg {} failed: {}",
                args.join(" "),
                stderr.trim()
            )));
        }

        Ok(output.stdout)
    }
}

/// Spawn `command`, writing `input` to its stdin while stdout and stderr are
/// drained. A failed exit status takes precedence over a failed write.
async fn communicate(
    command: &mut Command,
    input: Option<&[u8]>,
) -> Result<Output, PassboltError> {
    let program = command.as_std().get_program().to_string_lossy().into_owned();
    let mut child = command
        .stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| PassboltError::Decrypt(format!("failed to execute '{program}': {e}")))?;

    let pipe = child.stdin.take();
    let write = async move {
        if let (Some(bytes), Some(mut pipe)) = (input, pipe) {
            pipe.write_all(bytes).await?;
            pipe.shutdown().await?;
        }
        Ok::<(), std::io::Error>(())
    };

    let (written, output) = tokio::join!(write, child.wait_with_output());
    let output =
        output.map_err(|e| PassboltError::Decrypt(format!("{program} did not finish: {e}")))?;

    match written {
        Err(e) if output.status.success() => Err(PassboltError::Decrypt(format!(
            "failed to write to {program}: {e}"
        ))),
        _ => Ok(output),
    }
}

#[async_trait]
impl Decryptor for GpgDecryptor {
    fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    async fn decrypt(&self, armored: &str) -> Result<String, PassboltError> {
        let plaintext = self.run(&["--decrypt"], Some(armored.as_bytes())).await?;
        String::from_utf8(plaintext)
            .map_err(|_| PassboltError::Decrypt("decrypted message is not UTF-8".to_string()))
    }
}

/// Extract the primary key fingerprint from `gpg --with-colons` output.
///
/// The first `fpr` record following the first `sec` record belongs to the
/// primary key; subkey fingerprints follow `ssb` records.
fn parse_primary_fingerprint(colons: &str) -> Option<String> {
    let mut in_primary = false;
    for line in colons.lines() {
        let mut fields = line.split(':');
        match fields.next() {
            Some("sec") => in_primary = true,
            Some("ssb") => in_primary = false,
            Some("fpr") if in_primary => {
                return fields
                    .nth(8)
                    .filter(|fpr| !fpr.is_empty())
                    .map(str::to_uppercase);
            }
            _ => {}
        }
    }
    None
}

fn write_private_file(path: &Path, contents: &[u8]) -> Result<(), PassboltError> {
    std::fs::write(path, contents)
        .map_err(|e| PassboltError::Decrypt(format!("failed to write passphrase file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).map_err(|e| {
            PassboltError::Decrypt(format!("failed to restrict passphrase file: {e}"))
        })?;
    }

    Ok(())
}
