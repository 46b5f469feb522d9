//! Legacy MD5 fingerprints of OpenSSH public keys.
//!
//! Hetzner identifies registered keys by the MD5 digest of the key blob,
//! printed as colon-separated lowercase hex pairs. Keys are parsed and
//! validated with `ssh-key`; OpenSSH certificates are accepted as well.

use md5::{Digest, Md5};
use ssh_key::{Certificate, PublicKey};
use thiserror::Error;

/// Errors raised while parsing a public key.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum FingerprintError {
    /// The input holds no key at all.
    #[error("no public key found")]
    Empty,
    /// The input is not a well-formed OpenSSH public key or certificate.
    #[error("invalid public key: {message}")]
    Invalid {
        /// Parser error message.
        message: String,
    },
}

const CERTIFICATE_SUFFIX: &str = "-cert-v01@openssh.com";

/// Computes the MD5 fingerprint of an authorized-keys line.
///
/// Surrounding whitespace and the trailing comment are ignored.
///
/// # Errors
///
/// Returns [`FingerprintError`] when the line is not a valid key.
pub fn fingerprint(public_key: &str) -> Result<String, FingerprintError> {
    let line = public_key.trim();
    let algorithm = line
        .split_whitespace()
        .next()
        .ok_or(FingerprintError::Empty)?;

    let blob = if algorithm.ends_with(CERTIFICATE_SUFFIX) {
        Certificate::from_openssh(line)
            .map_err(invalid)?
            .to_bytes()
            .map_err(invalid)?
    } else {
        PublicKey::from_openssh(line)
            .map_err(invalid)?
            .to_bytes()
            .map_err(invalid)?
    };

    Ok(Md5::digest(&blob)
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<Vec<_>>()
        .join(":"))
}

fn invalid(err: impl std::fmt::Display) -> FingerprintError {
    FingerprintError::Invalid {
        message: err.to_string(),
    }
}
