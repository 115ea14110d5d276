//! MD5 digest of a response body
//!
//! Digests are kept as their raw 16 bytes and only rendered as hex at the
//! edges. Equality and hashing work on the bytes.

use std::fmt;

use serde::Serialize;

/// 16-byte MD5 digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Md5Hash([u8; 16]);

impl Md5Hash {
    /// Digest `bytes`. Deterministic and order-sensitive, no salt.
    ///
    /// ```rust
    /// use hashfetch::app::Md5Hash;
    ///
    /// let hash = Md5Hash::compute(b"http://adjust.com");
    /// assert_eq!(hash.to_hex(), "b53f3f2ec2e7e01d9e1130baac274a90");
    /// ```
    pub fn compute(bytes: impl AsRef<[u8]>) -> Self {
        Md5Hash(md5::compute(bytes.as_ref()).0)
    }

    /// Lowercase 32-character hex rendering
    pub fn to_hex(&self) -> String {
        use std::fmt::Write;
        self.0.iter().fold(String::with_capacity(32), |mut acc, b| {
            let _ = write!(&mut acc, "{:02x}", b);
            acc
        })
    }
}

impl fmt::Display for Md5Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// Serialized as hex so JSON output matches the text output
impl Serialize for Md5Hash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}
