//! The 24-byte list meta payload: `headSeq ∥ tailSeq ∥ updateTs`, all
//! big-endian. Presence of the meta row is the list's existence witness;
//! its absence (or an empty payload) means the list does not exist and
//! head/tail sit at the initial midpoint.

use crate::codec::{self, LIST_INITIAL_SEQ};
use crate::error::{ListError, Result};
use crate::header::HeaderMeta;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use reef_engine::WriteBatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListMeta {
    pub head_seq: i64,
    pub tail_seq: i64,
    pub size: i64,
    pub update_ts: i64,
}

pub fn parse_list_meta(v: &[u8]) -> Result<ListMeta> {
    if v.is_empty() {
        return Ok(ListMeta {
            head_seq: LIST_INITIAL_SEQ,
            tail_seq: LIST_INITIAL_SEQ,
            size: 0,
            update_ts: 0,
        });
    }
    if v.len() < 16 {
        return Err(ListError::InvalidMeta);
    }
    let mut cur = v;
    let head_seq = cur.get_u64() as i64;
    let tail_seq = cur.get_u64() as i64;
    let update_ts = if cur.len() >= 8 { cur.get_u64() as i64 } else { 0 };
    Ok(ListMeta {
        head_seq,
        tail_seq,
        size: tail_seq - head_seq + 1,
        update_ts,
    })
}

pub fn encode_list_meta(header: &HeaderMeta, head_seq: i64, tail_seq: i64, ts: i64) -> Bytes {
    let mut payload = BytesMut::with_capacity(24);
    payload.put_u64(head_seq as u64);
    payload.put_u64(tail_seq as u64);
    payload.put_u64(ts as u64);
    header.encode_with_data(&payload)
}

/// Stages the meta update implied by the new `[head_seq, tail_seq]`
/// range: a negative size is refused, an empty range deletes the meta
/// row, anything else re-wraps and rewrites it. Returns the new size.
pub fn set_list_meta(
    key: &[u8],
    header: &HeaderMeta,
    head_seq: i64,
    tail_seq: i64,
    ts: i64,
    wb: &mut WriteBatch,
) -> Result<i64> {
    let meta_key = codec::encode_meta_key(key);
    let size = tail_seq - head_seq + 1;
    if size < 0 {
        tracing::warn!(
            key = %String::from_utf8_lossy(key),
            head_seq,
            tail_seq,
            "invalid list meta sequence range"
        );
        return Err(ListError::InvalidSeq);
    }
    if size == 0 {
        wb.delete(meta_key);
    } else {
        wb.put(meta_key, encode_list_meta(header, head_seq, tail_seq, ts));
    }
    Ok(size)
}
