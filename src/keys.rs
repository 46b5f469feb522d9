//! Read-only access to the key pair DevPod stores in the machine folder.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use thiserror::Error;

/// File name of the public key inside the machine folder.
pub const PUBLIC_KEY_FILE: &str = "id_devpod_rsa.pub";

/// File name of the private key inside the machine folder.
pub const PRIVATE_KEY_FILE: &str = "id_devpod_rsa";

/// Errors raised while reading the machine key pair.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum KeyStoreError {
    /// The folder or one of the key files could not be read.
    #[error("failed to read `{path}`: {message}")]
    Read {
        /// Path that failed to read.
        path: Utf8PathBuf,
        /// Underlying error message.
        message: String,
    },
    /// A key file exists but holds no key material.
    #[error("key file `{path}` is empty")]
    Empty {
        /// Path of the empty file.
        path: Utf8PathBuf,
    },
}

/// Private key location handed to `ssh -i`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IdentityFile(Utf8PathBuf);

impl IdentityFile {
    /// Wraps a private key path.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self(path.into())
    }

    /// Returns the key path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.0
    }
}

/// Key pair of one DevPod machine.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MachineKeys {
    public_key: String,
    identity: IdentityFile,
}

impl MachineKeys {
    /// Reads the key pair from `folder`.
    ///
    /// The private key is checked for content but never held in memory.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError`] when either file is unreadable or empty.
    pub fn load(folder: &Utf8Path) -> Result<Self, KeyStoreError> {
        let dir = Dir::open_ambient_dir(folder, ambient_authority()).map_err(|err| {
            KeyStoreError::Read {
                path: folder.to_path_buf(),
                message: err.to_string(),
            }
        })?;

        let public_path = folder.join(PUBLIC_KEY_FILE);
        let public_key = dir
            .read_to_string(PUBLIC_KEY_FILE)
            .map_err(|err| KeyStoreError::Read {
                path: public_path.clone(),
                message: err.to_string(),
            })?;
        if public_key.trim().is_empty() {
            return Err(KeyStoreError::Empty { path: public_path });
        }

        let private_path = folder.join(PRIVATE_KEY_FILE);
        let metadata = dir
            .metadata(PRIVATE_KEY_FILE)
            .map_err(|err| KeyStoreError::Read {
                path: private_path.clone(),
                message: err.to_string(),
            })?;
        if metadata.len() == 0 {
            return Err(KeyStoreError::Empty { path: private_path });
        }

        Ok(Self {
            public_key,
            identity: IdentityFile::new(private_path),
        })
    }

    /// Public key in authorized-keys format.
    #[must_use]
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Location of the private key.
    #[must_use]
    pub const fn identity(&self) -> &IdentityFile {
        &self.identity
    }
}
