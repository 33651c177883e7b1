//! # SHA-384 Hashing
//!
//! The network identifies a submitted transaction by the SHA-384 digest of its
//! signed bytes. The SDK also keys each per-node body's signature map by the
//! digest of that body.

use sha2::{Digest, Sha384};

/// Length of a SHA-384 digest in bytes.
pub const SHA384_LEN: usize = 48;

/// SHA-384 digest output.
pub type Sha384Digest = [u8; SHA384_LEN];

/// Hash data with SHA-384 (one-shot).
pub fn sha384(data: &[u8]) -> Sha384Digest {
    let mut hasher = Sha384::new();
    hasher.update(data);
    hasher.finalize().into()
}
