//! Byte layouts for list keys.
//!
//! Meta key:
//! - type: u8 (`LMETA_TYPE`)
//! - meta prefix: `m:`
//! - user key: bytes
//!
//! Element key:
//! - type: u8 (`LIST_TYPE`)
//! - table len: u16-be, table: bytes
//! - key len: u16-be, versioned key: bytes
//! - seq: u64-be
//!
//! The sequence trails the element key, so a forward scan over a fixed
//! (table, versioned key) walks the list head-to-tail: byte order equals
//! numeric order on seq.

use crate::error::{ListError, Result};
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Type tag for list element rows.
pub const LIST_TYPE: u8 = b'l';
/// Type tag for list meta rows.
pub const LMETA_TYPE: u8 = b'L';
/// Type tag for per-table live-key counter rows.
pub const TABLE_CNT_TYPE: u8 = b't';
/// Type tag for expire index rows.
pub const EXP_INDEX_TYPE: u8 = b'g';

const META_PREFIX: &[u8] = b"m:";

pub const LIST_MIN_SEQ: i64 = 1000;
pub const LIST_MAX_SEQ: i64 = (1 << 62) - 1000;
pub const LIST_INITIAL_SEQ: i64 = LIST_MIN_SEQ + (LIST_MAX_SEQ - LIST_MIN_SEQ) / 2;

/// Largest accepted user key.
pub const MAX_KEY_SIZE: usize = 10 * 1024;

pub fn check_key_size(key: &[u8]) -> Result<()> {
    if key.is_empty() || key.len() > MAX_KEY_SIZE {
        return Err(ListError::InvalidKeySize);
    }
    Ok(())
}

/// User keys are `table:rest`; the table name is everything before the
/// first colon.
pub fn extract_table(key: &[u8]) -> Result<Bytes> {
    let sep = key
        .iter()
        .position(|&b| b == b':')
        .ok_or(ListError::InvalidTableName)?;
    if sep == 0 {
        return Err(ListError::InvalidTableName);
    }
    Ok(Bytes::copy_from_slice(&key[..sep]))
}

pub fn encode_meta_key(key: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(1 + META_PREFIX.len() + key.len());
    buf.put_u8(LMETA_TYPE);
    buf.put_slice(META_PREFIX);
    buf.put_slice(key);
    buf.freeze()
}

pub fn decode_meta_key(ek: &[u8]) -> Result<Bytes> {
    let prefix_len = 1 + META_PREFIX.len();
    if ek.len() < prefix_len || ek[0] != LMETA_TYPE || &ek[1..prefix_len] != META_PREFIX {
        return Err(ListError::InvalidMetaKey);
    }
    Ok(Bytes::copy_from_slice(&ek[prefix_len..]))
}

/// Lower bound for a scan over every list meta row.
pub fn encode_min_meta_key() -> Bytes {
    encode_meta_key(&[])
}

/// Exclusive upper bound for a scan over every list meta row: the no-key
/// meta key with its last byte bumped.
pub fn encode_max_meta_key() -> Bytes {
    let mut buf = encode_meta_key(&[]).to_vec();
    let last = buf.len() - 1;
    buf[last] += 1;
    Bytes::from(buf)
}

pub fn encode_element_key(table: &[u8], ver_key: &[u8], seq: i64) -> Bytes {
    let mut buf = BytesMut::with_capacity(1 + 2 + table.len() + 2 + ver_key.len() + 8);
    buf.put_u8(LIST_TYPE);
    buf.put_u16(table.len() as u16);
    buf.put_slice(table);
    buf.put_u16(ver_key.len() as u16);
    buf.put_slice(ver_key);
    buf.put_u64(seq as u64);
    buf.freeze()
}

pub fn decode_element_key(ek: &[u8]) -> Result<(Bytes, Bytes, i64)> {
    if ek.len() < 1 + 2 || ek[0] != LIST_TYPE {
        return Err(ListError::InvalidListKey);
    }
    let mut cur = &ek[1..];
    let table_len = cur.get_u16() as usize;
    if cur.len() < table_len + 2 {
        return Err(ListError::InvalidListKey);
    }
    let table = Bytes::copy_from_slice(&cur[..table_len]);
    cur.advance(table_len);
    let key_len = cur.get_u16() as usize;
    if cur.len() != key_len + 8 {
        return Err(ListError::InvalidListKey);
    }
    let ver_key = Bytes::copy_from_slice(&cur[..key_len]);
    cur.advance(key_len);
    let seq = cur.get_u64() as i64;
    Ok((table, ver_key, seq))
}

pub fn encode_table_cnt_key(table: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(1 + table.len());
    buf.put_u8(TABLE_CNT_TYPE);
    buf.put_slice(table);
    buf.freeze()
}

pub fn encode_exp_index_key(key: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(1 + key.len());
    buf.put_u8(EXP_INDEX_TYPE);
    buf.put_slice(key);
    buf.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_key_roundtrip() {
        let key = b"t:mylist";
        let mk = encode_meta_key(key);
        assert_eq!(decode_meta_key(&mk).unwrap(), &key[..]);
    }

    #[test]
    fn meta_key_rejects_wrong_tag() {
        let mut mk = encode_meta_key(b"t:k").to_vec();
        mk[0] = LIST_TYPE;
        assert!(matches!(
            decode_meta_key(&mk),
            Err(ListError::InvalidMetaKey)
        ));
        assert!(matches!(
            decode_meta_key(b"L"),
            Err(ListError::InvalidMetaKey)
        ));
    }

    #[test]
    fn meta_key_order_matches_user_key_order() {
        assert!(encode_meta_key(b"t:a") < encode_meta_key(b"t:b"));
        assert!(encode_min_meta_key() < encode_meta_key(b"a"));
        assert!(encode_meta_key(b"zzzz") < encode_max_meta_key());
    }

    #[test]
    fn element_key_roundtrip() {
        let ek = encode_element_key(b"t", b"t:mylist\x00\x00\x00\x00\x00\x00\x00\x01", 123456);
        let (table, ver_key, seq) = decode_element_key(&ek).unwrap();
        assert_eq!(table, &b"t"[..]);
        assert_eq!(ver_key, &b"t:mylist\x00\x00\x00\x00\x00\x00\x00\x01"[..]);
        assert_eq!(seq, 123456);
    }

    #[test]
    fn element_key_rejects_length_mismatch() {
        let ek = encode_element_key(b"t", b"t:k", LIST_INITIAL_SEQ);
        assert!(matches!(
            decode_element_key(&ek[..ek.len() - 1]),
            Err(ListError::InvalidListKey)
        ));
        let mut extended = ek.to_vec();
        extended.push(0);
        assert!(matches!(
            decode_element_key(&extended),
            Err(ListError::InvalidListKey)
        ));
    }

    #[test]
    fn element_key_order_matches_seq_order() {
        let low = encode_element_key(b"t", b"t:k", LIST_MIN_SEQ);
        let mid = encode_element_key(b"t", b"t:k", LIST_INITIAL_SEQ);
        let high = encode_element_key(b"t", b"t:k", LIST_MAX_SEQ);
        assert!(low < mid);
        assert!(mid < high);
    }

    #[test]
    fn extract_table_wants_a_separator() {
        assert_eq!(extract_table(b"t:k").unwrap(), &b"t"[..]);
        assert!(matches!(
            extract_table(b"nocolon"),
            Err(ListError::InvalidTableName)
        ));
        assert!(matches!(
            extract_table(b":k"),
            Err(ListError::InvalidTableName)
        ));
    }

    #[test]
    fn key_size_limits() {
        assert!(check_key_size(b"t:k").is_ok());
        assert!(matches!(
            check_key_size(b""),
            Err(ListError::InvalidKeySize)
        ));
        let huge = vec![b'x'; MAX_KEY_SIZE + 1];
        assert!(matches!(
            check_key_size(&huge),
            Err(ListError::InvalidKeySize)
        ));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_element_key_roundtrip(
            table in prop::collection::vec(any::<u8>(), 1..32),
            ver_key in prop::collection::vec(any::<u8>(), 1..128),
            seq in LIST_MIN_SEQ..LIST_MAX_SEQ,
        ) {
            let ek = encode_element_key(&table, &ver_key, seq);
            let (t, k, s) = decode_element_key(&ek).unwrap();
            prop_assert_eq!(t.as_ref(), table.as_slice());
            prop_assert_eq!(k.as_ref(), ver_key.as_slice());
            prop_assert_eq!(s, seq);
        }

        #[test]
        fn prop_meta_key_roundtrip(key in prop::collection::vec(any::<u8>(), 0..256)) {
            let mk = encode_meta_key(&key);
            let decoded = decode_meta_key(&mk).unwrap();
            prop_assert_eq!(decoded.as_ref(), key.as_slice());
        }

        #[test]
        fn prop_byte_order_equals_seq_order(
            s1 in LIST_MIN_SEQ..LIST_MAX_SEQ,
            s2 in LIST_MIN_SEQ..LIST_MAX_SEQ,
        ) {
            let k1 = encode_element_key(b"t", b"t:k", s1);
            let k2 = encode_element_key(b"t", b"t:k", s2);
            prop_assert_eq!(k1 < k2, s1 < s2);
            prop_assert_eq!(k1 == k2, s1 == s2);
        }
    }
}
