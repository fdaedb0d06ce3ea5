//! Purpose: Synthesize collision-resistant storage filenames for attachments.
//! Exports: `NamingPolicy`, `storage_filename`.
//! Role: Decouples where an upload is stored from the client-supplied filename.
//! Invariants: Output never contains path separators; the extension is pre-validated.
//! Invariants: Collisions are made unlikely by random suffixes, not prevented by locking.
use std::fmt::Write as _;

use getrandom::fill as fill_random;
use sha2::{Digest, Sha256};
use time::OffsetDateTime;

use crate::core::error::{Error, ErrorKind};

const TIMESTAMPED_RANDOM_BYTES: usize = 4;
const CONTENT_HASH_HEX_LEN: usize = 16;
const CONTENT_HASH_RANDOM_BYTES: usize = 2;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum NamingPolicy {
    /// `<unix-millis>_<8 hex>` followed by the extension.
    #[default]
    Timestamped,
    /// `<16 hex of sha256(content)>_<4 hex>` followed by the extension; independent of the clock.
    ContentHash,
}

/// `extension` must include its leading dot (or be empty).
pub fn storage_filename(
    policy: NamingPolicy,
    content: &[u8],
    extension: &str,
) -> Result<String, Error> {
    let name = match policy {
        NamingPolicy::Timestamped => {
            let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
            let suffix = random_hex::<TIMESTAMPED_RANDOM_BYTES>()?;
            format!("{millis}_{suffix}{extension}")
        }
        NamingPolicy::ContentHash => {
            let digest = hex(&Sha256::digest(content));
            let suffix = random_hex::<CONTENT_HASH_RANDOM_BYTES>()?;
            format!("{}_{suffix}{extension}", &digest[..CONTENT_HASH_HEX_LEN])
        }
    };
    Ok(name)
}

fn random_hex<const N: usize>() -> Result<String, Error> {
    let mut buf = [0u8; N];
    fill_random(&mut buf).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message(format!("entropy source unavailable: {err}"))
    })?;
    Ok(hex(&buf))
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}
