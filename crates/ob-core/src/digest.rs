//! # Content Digests
//!
//! Hex-encoded hashes used to detect content changes between publications.
//!
//! - GML geometries of werkingsgebieden are hashed with SHA-512. An equal
//!   hash means the area is unchanged and its published identifiers are
//!   reused.
//! - Stored files (documents, packages) carry a SHA-256 checksum.

use sha2::{Digest, Sha256, Sha512};

/// Lowercase hex SHA-512 of `data`.
pub fn sha512_hex(data: impl AsRef<[u8]>) -> String {
    to_hex(&Sha512::digest(data.as_ref()))
}

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: impl AsRef<[u8]>) -> String {
    to_hex(&Sha256::digest(data.as_ref()))
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
