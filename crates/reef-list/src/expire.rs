//! Expiration hooks: set/clear a TTL on a list key and drop expire
//! metadata when a list dies. Background reclamation of expired rows
//! belongs to the owning engine, not this layer.

use crate::codec;
use crate::error::Result;
use crate::list::ListStore;
use bytes::{BufMut, BytesMut};
use reef_engine::{KvEngine, WriteBatch};

impl<E: KvEngine> ListStore<E> {
    /// Returns 1 if the key exists and is not expired, else 0.
    pub fn l_key_exists(&self, key: &[u8]) -> Result<i64> {
        codec::check_key_size(key)?;
        let ki = self.coll_key_info(crate::now_ns(), key, self.engine().as_ref())?;
        Ok(if ki.is_not_exist_or_expired() { 0 } else { 1 })
    }

    /// Sets the key to expire `dur_secs` seconds after `ts`. Returns 1 on
    /// success, 0 if the key does not exist.
    pub fn l_expire(&self, ts: i64, key: &[u8], dur_secs: i64) -> Result<i64> {
        codec::check_key_size(key)?;
        let mut ki = self.coll_key_info(ts, key, self.engine().as_ref())?;
        if ki.is_not_exist_or_expired() {
            return Ok(0);
        }
        let when =
            (ts as u64).saturating_add((dur_secs.max(0) as u64).saturating_mul(1_000_000_000));
        ki.header.set_expire_at(when);

        let mut wb = self.batch().acquire();
        wb.put(codec::encode_meta_key(key), ki.header.encode());
        let mut when_buf = BytesMut::with_capacity(8);
        when_buf.put_u64(when);
        wb.put(codec::encode_exp_index_key(key), when_buf.freeze());
        self.engine().commit(&wb)?;
        Ok(1)
    }

    /// Clears a pending TTL. Returns 1 if one was cleared, else 0.
    pub fn l_persist(&self, ts: i64, key: &[u8]) -> Result<i64> {
        codec::check_key_size(key)?;
        let mut ki = self.coll_key_info(ts, key, self.engine().as_ref())?;
        if ki.is_not_exist_or_expired() || ki.header.expire_at() == 0 {
            return Ok(0);
        }
        ki.header.set_expire_at(0);

        let mut wb = self.batch().acquire();
        wb.put(codec::encode_meta_key(key), ki.header.encode());
        wb.delete(codec::encode_exp_index_key(key));
        self.engine().commit(&wb)?;
        Ok(1)
    }

    /// Stages removal of the key's expire metadata into `wb`.
    pub(crate) fn del_expire(&self, key: &[u8], wb: &mut WriteBatch) {
        wb.delete(codec::encode_exp_index_key(key));
    }
}
