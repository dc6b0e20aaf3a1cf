//! Collection-key versioning.
//!
//! A user key maps to a *versioned* raw key (the user key with the
//! header's version appended), so an expired collection can be logically
//! recreated under a fresh version without physically deleting its old
//! element rows.

use crate::codec;
use crate::error::Result;
use crate::header::HeaderMeta;
use crate::list::ListStore;
use bytes::{BufMut, Bytes, BytesMut};
use reef_engine::{KvEngine, KvReader};

/// Everything a structure operation needs to know about a key: which
/// table it lives in, the versioned raw key its rows hang off, whether
/// it currently exists, and the outer header to re-encode on writes.
#[derive(Debug, Clone)]
pub struct KeyInfo {
    pub table: Bytes,
    pub ver_key: Bytes,
    pub exists: bool,
    pub expired: bool,
    pub header: HeaderMeta,
}

impl KeyInfo {
    pub fn is_not_exist_or_expired(&self) -> bool {
        !self.exists || self.expired
    }

    /// The collection's own payload inside the outer header.
    pub fn meta_data(&self) -> &[u8] {
        self.header.user_data()
    }
}

pub(crate) fn ver_key_for(key: &[u8], version: u64) -> Bytes {
    let mut buf = BytesMut::with_capacity(key.len() + 8);
    buf.put_slice(key);
    buf.put_u64(version);
    buf.freeze()
}

impl<E: KvEngine> ListStore<E> {
    /// Loads the meta row through the given reader and resolves the
    /// key's current version, table, and expiration verdict.
    pub(crate) fn coll_key_info(
        &self,
        ts: i64,
        key: &[u8],
        reader: &impl KvReader,
    ) -> Result<KeyInfo> {
        let table = codec::extract_table(key)?;
        let meta_key = codec::encode_meta_key(key);
        match reader.get(&meta_key)? {
            None => Ok(KeyInfo {
                table,
                ver_key: ver_key_for(key, 0),
                exists: false,
                expired: false,
                header: HeaderMeta::default(),
            }),
            Some(raw) => {
                let header = HeaderMeta::decode(&raw)?;
                let expired = header.is_expired(ts);
                let ver_key = ver_key_for(key, header.version());
                Ok(KeyInfo {
                    table,
                    ver_key,
                    exists: true,
                    expired,
                    header,
                })
            }
        }
    }

    /// As [`coll_key_info`](Self::coll_key_info), but an absent or
    /// expired key is renewed: fresh version, no TTL, empty payload.
    /// The `expired` flag survives the renewal so callers can tell a
    /// recreation from a first write when adjusting table counters.
    pub(crate) fn prepare_coll_key_for_write(&self, ts: i64, key: &[u8]) -> Result<KeyInfo> {
        let mut ki = self.coll_key_info(ts, key, self.engine().as_ref())?;
        if !ki.exists || ki.expired {
            ki.header.renew(ts as u64);
            ki.ver_key = ver_key_for(key, ts as u64);
        }
        Ok(ki)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ver_key_appends_version_big_endian() {
        let vk = ver_key_for(b"t:k", 0x0102);
        assert_eq!(&vk[..3], b"t:k");
        assert_eq!(&vk[3..], &[0u8, 0, 0, 0, 0, 0, 0x01, 0x02][..]);
    }
}
