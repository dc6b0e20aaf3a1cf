//! The outer header wrapped around every collection meta value.
//!
//! Layout: `version:u64-be ∥ expire_at:u64-be ∥ user-data`. The
//! versioning layer owns the leading 16 bytes; the collection's own
//! payload rides in user-data. Structure code borrows the header from
//! [`KeyInfo`](crate::KeyInfo), swaps the payload, and re-encodes; it
//! never touches the header fields themselves.

use crate::error::{ListError, Result};
use bytes::{Buf, BufMut, Bytes, BytesMut};

pub const HEADER_LEN: usize = 16;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMeta {
    version: u64,
    expire_at: u64,
    user_data: Bytes,
}

impl HeaderMeta {
    pub fn new(version: u64) -> Self {
        Self {
            version,
            expire_at: 0,
            user_data: Bytes::new(),
        }
    }

    pub fn decode(raw: &[u8]) -> Result<Self> {
        if raw.len() < HEADER_LEN {
            return Err(ListError::InvalidMeta);
        }
        let mut cur = raw;
        let version = cur.get_u64();
        let expire_at = cur.get_u64();
        Ok(Self {
            version,
            expire_at,
            user_data: Bytes::copy_from_slice(cur),
        })
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn expire_at(&self) -> u64 {
        self.expire_at
    }

    pub fn set_expire_at(&mut self, at: u64) {
        self.expire_at = at;
    }

    /// Expired means a TTL was set and the given timestamp has passed it.
    pub fn is_expired(&self, ts: i64) -> bool {
        self.expire_at > 0 && ts as u64 > self.expire_at
    }

    pub fn user_data(&self) -> &[u8] {
        &self.user_data
    }

    /// Resets the header for a logical recreation: fresh version, no TTL,
    /// empty payload.
    pub fn renew(&mut self, version: u64) {
        self.version = version;
        self.expire_at = 0;
        self.user_data = Bytes::new();
    }

    /// Re-wraps the given payload under this header.
    pub fn encode_with_data(&self, data: &[u8]) -> Bytes {
        let mut buf = BytesMut::with_capacity(HEADER_LEN + data.len());
        buf.put_u64(self.version);
        buf.put_u64(self.expire_at);
        buf.put_slice(data);
        buf.freeze()
    }

    /// Re-encodes with the payload it currently carries.
    pub fn encode(&self) -> Bytes {
        self.encode_with_data(&self.user_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_with_payload() {
        let mut h = HeaderMeta::new(42);
        h.set_expire_at(9000);
        let raw = h.encode_with_data(b"payload");

        let parsed = HeaderMeta::decode(&raw).unwrap();
        assert_eq!(parsed.version(), 42);
        assert_eq!(parsed.expire_at(), 9000);
        assert_eq!(parsed.user_data(), b"payload");
    }

    #[test]
    fn short_input_is_invalid() {
        assert!(matches!(
            HeaderMeta::decode(&[0u8; 15]),
            Err(ListError::InvalidMeta)
        ));
    }

    #[test]
    fn expiry_requires_a_ttl() {
        let h = HeaderMeta::new(1);
        assert!(!h.is_expired(i64::MAX));

        let mut h = HeaderMeta::new(1);
        h.set_expire_at(100);
        assert!(!h.is_expired(100));
        assert!(h.is_expired(101));
    }

    #[test]
    fn renew_clears_ttl_and_payload() {
        let mut h = HeaderMeta::decode(&HeaderMeta::new(1).encode_with_data(b"old")).unwrap();
        h.set_expire_at(50);
        h.renew(7);
        assert_eq!(h.version(), 7);
        assert_eq!(h.expire_at(), 0);
        assert!(h.user_data().is_empty());
    }
}
