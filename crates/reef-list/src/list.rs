//! Redis list semantics over the ordered KV engine.
//!
//! A list is one meta row (head/tail/ts wrapped in the versioning
//! header) plus one element row per sequence in `[head, tail]`. Elements
//! live on a per-list number line: pushes move head down or tail up,
//! pops move them back in. Every mutation stages its element deltas and
//! the meta update into a single batch and commits atomically, so the
//! meta row and the element rows never diverge on disk.
//!
//! When they do diverge anyway (a missing element under a live meta row,
//! or a value already sitting under a fresh sequence), the operation
//! logs, runs [`ListStore::l_fix_key`], and surfaces `InvalidSeq`. The
//! repair refuses to touch a list whose surviving sequences are not
//! contiguous: that is worse corruption than it can safely guess about.

use crate::codec::{self, LIST_MAX_SEQ, LIST_MIN_SEQ};
use crate::config::{ExpirationPolicy, StoreConfig};
use crate::error::{ListError, Result};
use crate::meta::{parse_list_meta, set_list_meta, ListMeta};
use crate::tracker::LargeCollTracker;
use crate::version::KeyInfo;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use reef_engine::{BatchOp, KvEngine, KvReader, ScanOpts, SharedBatch, WriteBatch};
use reef_observe::{Meter, COLLECTION_LEN_DIST};
use std::sync::Arc;

/// Cap on multi-arg pushes, multi-key clears, and range reads.
pub const MAX_BATCH_NUM: usize = 5000;

/// Slices wider than this are removed with a range-delete instead of
/// per-key deletes.
pub const RANGE_DELETE_NUM: i64 = 1000;

/// Which end of the list an operation works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEnd {
    Head,
    Tail,
}

pub struct ListStore<E: KvEngine> {
    eng: Arc<E>,
    batch: SharedBatch,
    cfg: StoreConfig,
    meter: Arc<dyn Meter>,
    top_colls: LargeCollTracker,
}

impl<E: KvEngine> ListStore<E> {
    pub fn new(eng: Arc<E>, cfg: StoreConfig, meter: Arc<dyn Meter>) -> Self {
        let top_colls = LargeCollTracker::new(cfg.large_coll_watch_min);
        Self {
            eng,
            batch: SharedBatch::new(),
            cfg,
            meter,
            top_colls,
        }
    }

    pub fn engine(&self) -> &Arc<E> {
        &self.eng
    }

    pub(crate) fn batch(&self) -> &SharedBatch {
        &self.batch
    }

    pub fn large_collections(&self, n: usize) -> Vec<(Bytes, usize)> {
        self.top_colls.top(n)
    }

    fn l_header_and_meta(
        &self,
        ts: i64,
        key: &[u8],
        reader: &impl KvReader,
    ) -> Result<(KeyInfo, ListMeta)> {
        let ki = self.coll_key_info(ts, key, reader)?;
        let meta = parse_list_meta(ki.meta_data())?;
        Ok((ki, meta))
    }

    fn track_collection_size(&self, table: &[u8], key: &[u8], size: i64) {
        self.top_colls.update(key, size.max(0) as usize);
        if size > self.cfg.collection_len_for_metric as i64 {
            self.meter.observe(
                COLLECTION_LEN_DIST,
                &String::from_utf8_lossy(table),
                size as f64,
            );
        }
    }

    fn push(&self, ts: i64, key: &[u8], end: ListEnd, args: &[Bytes]) -> Result<i64> {
        codec::check_key_size(key)?;

        let mut wb = self.batch.acquire();
        let ki = self.prepare_coll_key_for_write(ts, key)?;
        let meta = parse_list_meta(ki.meta_data())?;
        let (mut head_seq, mut tail_seq, size) = (meta.head_seq, meta.tail_seq, meta.size);
        tracing::debug!(
            key = %String::from_utf8_lossy(key),
            ?end,
            head_seq,
            tail_seq,
            size,
            "push"
        );

        let push_cnt = args.len() as i64;
        if args.is_empty() {
            return Ok(size);
        }

        let (mut seq, delta) = match end {
            ListEnd::Head => (head_seq, -1i64),
            ListEnd::Tail => (tail_seq, 1i64),
        };
        // head/tail point at existing elements, so a non-empty list
        // starts writing one past them
        if size > 0 {
            seq += delta;
        }
        let check_seq = seq + (push_cnt - 1) * delta;
        if check_seq <= LIST_MIN_SEQ || check_seq >= LIST_MAX_SEQ {
            return Err(ListError::InvalidSeq);
        }

        for (i, arg) in args.iter().enumerate() {
            let ek = codec::encode_element_key(&ki.table, &ki.ver_key, seq + i as i64 * delta);
            // a value under a fresh sequence means the tree no longer
            // matches the meta row
            if self.eng.get(&ek)?.is_some() {
                tracing::warn!(
                    key = %String::from_utf8_lossy(key),
                    seq,
                    head_seq,
                    tail_seq,
                    "list push would override an existing element"
                );
                drop(wb);
                self.fix_list_key(ts, key);
                return Err(ListError::InvalidSeq);
            }
            wb.put(ek, arg.clone());
        }

        // rewriting a live-but-expired placeholder keeps the counter
        if size == 0 && !ki.expired {
            self.incr_table_key_count(&ki.table, 1, &mut wb)?;
        }

        seq += (push_cnt - 1) * delta;
        match end {
            ListEnd::Head => head_seq = seq,
            ListEnd::Tail => tail_seq = seq,
        }
        if let Err(e) = set_list_meta(key, &ki.header, head_seq, tail_seq, ts, &mut wb) {
            drop(wb);
            self.fix_list_key(ts, key);
            return Err(e);
        }
        self.eng.commit(&wb)?;
        drop(wb);

        let new_num = size + push_cnt;
        self.track_collection_size(&ki.table, key, new_num);
        Ok(new_num)
    }

    fn pop(&self, ts: i64, key: &[u8], end: ListEnd) -> Result<Option<Bytes>> {
        codec::check_key_size(key)?;

        let (ki, meta) = self.l_header_and_meta(ts, key, self.eng.as_ref())?;
        if ki.is_not_exist_or_expired() || meta.size == 0 {
            return Ok(None);
        }
        let (mut head_seq, mut tail_seq) = (meta.head_seq, meta.tail_seq);
        let seq = match end {
            ListEnd::Head => head_seq,
            ListEnd::Tail => tail_seq,
        };

        let item_key = codec::encode_element_key(&ki.table, &ki.ver_key, seq);
        // a missing element is corruption; an empty value is just an
        // empty value
        let value = match self.eng.get(&item_key) {
            Ok(Some(v)) => v,
            Ok(None) => {
                tracing::warn!(
                    key = %String::from_utf8_lossy(key),
                    seq,
                    head_seq,
                    tail_seq,
                    "list pop found no element under a live meta row"
                );
                self.fix_list_key(ts, key);
                return Err(ListError::InvalidSeq);
            }
            Err(e) => {
                tracing::warn!(
                    key = %String::from_utf8_lossy(key),
                    seq,
                    error = %e,
                    "list pop element read failed"
                );
                self.fix_list_key(ts, key);
                return Err(e.into());
            }
        };

        match end {
            ListEnd::Head => head_seq += 1,
            ListEnd::Tail => tail_seq -= 1,
        }

        let mut wb = self.batch.acquire();
        wb.delete(item_key);
        let new_num = match set_list_meta(key, &ki.header, head_seq, tail_seq, ts, &mut wb) {
            Ok(n) => n,
            Err(e) => {
                drop(wb);
                self.fix_list_key(ts, key);
                return Err(e);
            }
        };
        if new_num == 0 {
            self.incr_table_key_count(&ki.table, -1, &mut wb)?;
            self.del_expire(key, &mut wb);
        }
        self.eng.commit(&wb)?;
        drop(wb);

        self.track_collection_size(&ki.table, key, new_num);
        Ok(Some(value))
    }

    pub fn l_push(&self, ts: i64, key: &[u8], args: &[Bytes]) -> Result<i64> {
        if args.len() > MAX_BATCH_NUM {
            return Err(ListError::TooMuchBatchSize);
        }
        self.push(ts, key, ListEnd::Head, args)
    }

    pub fn r_push(&self, ts: i64, key: &[u8], args: &[Bytes]) -> Result<i64> {
        if args.len() > MAX_BATCH_NUM {
            return Err(ListError::TooMuchBatchSize);
        }
        self.push(ts, key, ListEnd::Tail, args)
    }

    pub fn l_pop(&self, ts: i64, key: &[u8]) -> Result<Option<Bytes>> {
        self.pop(ts, key, ListEnd::Head)
    }

    pub fn r_pop(&self, ts: i64, key: &[u8]) -> Result<Option<Bytes>> {
        self.pop(ts, key, ListEnd::Tail)
    }

    pub fn l_set(&self, ts: i64, key: &[u8], index: i64, value: impl Into<Bytes>) -> Result<()> {
        codec::check_key_size(key)?;
        let (ki, meta) = self.l_header_and_meta(ts, key, self.eng.as_ref())?;
        if ki.is_not_exist_or_expired() || meta.size == 0 {
            return Err(ListError::InvalidIndex);
        }
        let seq = index_to_seq(&meta, index);
        if seq < meta.head_seq || seq > meta.tail_seq {
            return Err(ListError::InvalidIndex);
        }

        let mut wb = self.batch.acquire();
        // head/tail are unchanged, but the rewrite bumps the update ts
        set_list_meta(key, &ki.header, meta.head_seq, meta.tail_seq, ts, &mut wb)?;
        wb.put(
            codec::encode_element_key(&ki.table, &ki.ver_key, seq),
            value.into(),
        );
        self.eng.commit(&wb)?;
        Ok(())
    }

    pub fn l_index(&self, key: &[u8], index: i64) -> Result<Option<Bytes>> {
        let snap = self.eng.snapshot();
        let (ki, meta) = self.l_header_and_meta(crate::now_ns(), key, &snap)?;
        if ki.is_not_exist_or_expired() {
            return Ok(None);
        }
        let seq = index_to_seq(&meta, index);
        if seq < meta.head_seq || seq > meta.tail_seq {
            return Ok(None);
        }
        Ok(snap.get(&codec::encode_element_key(&ki.table, &ki.ver_key, seq))?)
    }

    pub fn l_len(&self, key: &[u8]) -> Result<i64> {
        let snap = self.eng.snapshot();
        let (ki, meta) = self.l_header_and_meta(crate::now_ns(), key, &snap)?;
        if ki.is_not_exist_or_expired() {
            return Ok(0);
        }
        Ok(meta.size)
    }

    /// The meta's update timestamp; 0 for a list that never existed.
    pub fn l_ver(&self, key: &[u8]) -> Result<i64> {
        let snap = self.eng.snapshot();
        let (_ki, meta) = self.l_header_and_meta(0, key, &snap)?;
        Ok(meta.update_ts)
    }

    pub fn l_range(&self, key: &[u8], start: i64, stop: i64) -> Result<Vec<Bytes>> {
        codec::check_key_size(key)?;
        let snap = self.eng.snapshot();
        let (ki, meta) = self.l_header_and_meta(crate::now_ns(), key, &snap)?;
        if ki.is_not_exist_or_expired() {
            return Ok(Vec::new());
        }
        let llen = meta.size;
        let (mut start, mut stop) = (start, stop);
        if start < 0 {
            start = start.saturating_add(llen);
        }
        if stop < 0 {
            stop = stop.saturating_add(llen);
        }
        if start < 0 {
            start = 0;
        }
        if start > stop || start >= llen {
            return Ok(Vec::new());
        }
        if stop >= llen {
            stop = llen - 1;
        }
        let limit = (stop - start + 1) as usize;
        if limit > MAX_BATCH_NUM {
            return Err(ListError::TooMuchBatchSize);
        }

        let start_key = codec::encode_element_key(&ki.table, &ki.ver_key, meta.head_seq + start);
        let stop_key = codec::encode_element_key(&ki.table, &ki.ver_key, meta.tail_seq);
        let rows = snap.scan(
            &start_key,
            &stop_key,
            ScanOpts {
                reverse: false,
                limit: Some(limit),
            },
        )?;
        Ok(rows.map(|(_, v)| v).collect())
    }

    pub fn l_trim(&self, ts: i64, key: &[u8], start: i64, stop: i64) -> Result<()> {
        codec::check_key_size(key)?;
        let (ki, meta) = self.l_header_and_meta(ts, key, self.eng.as_ref())?;
        if ki.is_not_exist_or_expired() {
            return Ok(());
        }
        let llen = meta.size;
        let head_seq = meta.head_seq;
        let (mut start, mut stop) = (start, stop);
        if start < 0 {
            start = start.saturating_add(llen);
        }
        if stop < 0 {
            stop = stop.saturating_add(llen);
        }

        let mut wb = self.batch.acquire();
        let mut new_len = 0i64;
        if start >= llen || start > stop {
            // nothing survives
            self.l_delete_into(ts, key, &mut wb)?;
        } else {
            if start < 0 {
                start = 0;
            }
            if stop >= llen {
                stop = llen - 1;
            }
            let ek = |seq| codec::encode_element_key(&ki.table, &ki.ver_key, seq);
            if start > 0 {
                if start > RANGE_DELETE_NUM {
                    wb.delete_range(ek(head_seq), ek(head_seq + start));
                } else {
                    for i in 0..start {
                        wb.delete(ek(head_seq + i));
                    }
                }
            }
            if stop < llen - 1 {
                if llen - stop > RANGE_DELETE_NUM {
                    wb.delete_range(ek(head_seq + stop + 1), ek(head_seq + llen));
                } else {
                    for i in stop + 1..llen {
                        wb.delete(ek(head_seq + i));
                    }
                }
            }
            new_len = match set_list_meta(
                key,
                &ki.header,
                head_seq + start,
                head_seq + stop,
                ts,
                &mut wb,
            ) {
                Ok(n) => n,
                Err(e) => {
                    drop(wb);
                    self.fix_list_key(ts, key);
                    return Err(e);
                }
            };
            if llen > 0 && new_len == 0 {
                self.incr_table_key_count(&ki.table, -1, &mut wb)?;
            }
        }
        if new_len == 0 {
            self.del_expire(key, &mut wb);
        }
        self.eng.commit(&wb)?;
        drop(wb);

        self.track_collection_size(&ki.table, key, new_len);
        Ok(())
    }

    fn trim_count(&self, ts: i64, key: &[u8], end: ListEnd, trim_size: i64) -> Result<i64> {
        codec::check_key_size(key)?;
        if trim_size <= 0 {
            return Ok(0);
        }
        let (ki, meta) = self.l_header_and_meta(ts, key, self.eng.as_ref())?;
        if ki.is_not_exist_or_expired() || meta.size == 0 {
            return Ok(0);
        }
        let (mut head_seq, mut tail_seq) = (meta.head_seq, meta.tail_seq);

        let (trim_start, trim_end) = match end {
            ListEnd::Head => {
                let s = head_seq;
                let e = s.saturating_add(trim_size - 1).min(tail_seq);
                head_seq = e + 1;
                (s, e)
            }
            ListEnd::Tail => {
                let e = tail_seq;
                let s = e.saturating_sub(trim_size - 1).max(head_seq);
                tail_seq = s - 1;
                (s, e)
            }
        };

        let mut wb = self.batch.acquire();
        if trim_end - trim_start > RANGE_DELETE_NUM {
            let start_key = codec::encode_element_key(&ki.table, &ki.ver_key, trim_start);
            let end_key = codec::encode_element_key(&ki.table, &ki.ver_key, trim_end);
            // range-delete excludes its upper bound
            wb.delete_range(start_key, end_key.clone());
            wb.delete(end_key);
        } else {
            for seq in trim_start..=trim_end {
                wb.delete(codec::encode_element_key(&ki.table, &ki.ver_key, seq));
            }
        }

        let new_len = match set_list_meta(key, &ki.header, head_seq, tail_seq, ts, &mut wb) {
            Ok(n) => n,
            Err(e) => {
                drop(wb);
                self.fix_list_key(ts, key);
                return Err(e);
            }
        };
        if new_len == 0 {
            self.incr_table_key_count(&ki.table, -1, &mut wb)?;
            self.del_expire(key, &mut wb);
        }
        self.eng.commit(&wb)?;
        drop(wb);

        self.track_collection_size(&ki.table, key, new_len);
        Ok(trim_end - trim_start + 1)
    }

    /// Discards up to `trim_size` elements from the head. Returns how
    /// many were removed.
    pub fn l_trim_front(&self, ts: i64, key: &[u8], trim_size: i64) -> Result<i64> {
        self.trim_count(ts, key, ListEnd::Head, trim_size)
    }

    /// Discards up to `trim_size` elements from the tail. Returns how
    /// many were removed.
    pub fn l_trim_back(&self, ts: i64, key: &[u8], trim_size: i64) -> Result<i64> {
        self.trim_count(ts, key, ListEnd::Tail, trim_size)
    }

    /// Stages removal of the whole list into `wb`: meta row, table
    /// counter, and (policy permitting) every element row. Expire
    /// metadata is the caller's business. Returns the number of
    /// elements the list held.
    fn l_delete_into(&self, ts: i64, key: &[u8], wb: &mut WriteBatch) -> Result<i64> {
        let (ki, meta) = match self.l_header_and_meta(ts, key, self.eng.as_ref()) {
            Ok(v) => v,
            Err(ListError::Engine(e)) => return Err(e.into()),
            Err(_) => return Ok(0),
        };
        if ki.is_not_exist_or_expired() || meta.size == 0 {
            return Ok(0);
        }

        wb.delete(codec::encode_meta_key(key));
        self.incr_table_key_count(&ki.table, -1, wb)?;
        self.top_colls.update(key, 0);

        if self.cfg.expiration_policy == ExpirationPolicy::WaitCompact {
            // compaction reclaims the element rows
            return Ok(meta.size);
        }

        let start_key = codec::encode_element_key(&ki.table, &ki.ver_key, meta.head_seq);
        let stop_key = codec::encode_element_key(&ki.table, &ki.ver_key, meta.tail_seq);
        if meta.size > RANGE_DELETE_NUM {
            wb.delete_range(start_key, stop_key.clone());
            wb.delete(stop_key);
        } else {
            for (k, _) in self.eng.scan(&start_key, &stop_key, ScanOpts::default())? {
                wb.delete(k);
            }
        }
        Ok(meta.size)
    }

    /// Removes the list. Returns 1 if anything was removed, else 0.
    pub fn l_clear(&self, ts: i64, key: &[u8]) -> Result<i64> {
        codec::check_key_size(key)?;
        let mut wb = self.batch.acquire();
        let num = self.l_delete_into(ts, key, &mut wb)?;
        self.del_expire(key, &mut wb);
        self.eng.commit(&wb)?;
        Ok(if num > 0 { 1 } else { 0 })
    }

    /// Removes every listed key in one batch. Returns the number of keys
    /// processed, present or not.
    pub fn l_mclear(&self, keys: &[Bytes]) -> Result<i64> {
        if keys.len() > MAX_BATCH_NUM {
            return Err(ListError::TooMuchBatchSize);
        }
        let mut wb = self.batch.acquire();
        for key in keys {
            codec::check_key_size(key)?;
            self.l_delete_into(0, key, &mut wb)?;
            self.del_expire(key, &mut wb);
        }
        self.eng.commit(&wb)?;
        Ok(keys.len() as i64)
    }

    /// As [`l_mclear`](Self::l_mclear) but stages into a caller-owned
    /// batch instead of committing.
    pub fn l_mclear_with_batch(&self, wb: &mut WriteBatch, keys: &[Bytes]) -> Result<()> {
        if keys.len() > MAX_BATCH_NUM {
            return Err(ListError::TooMuchBatchSize);
        }
        for key in keys {
            codec::check_key_size(key)?;
            self.l_delete_into(0, key, wb)?;
            self.del_expire(key, wb);
        }
        Ok(())
    }

    /// Rebuilds the meta row from the element rows actually present.
    /// Best-effort: every failure path logs and leaves the list alone.
    pub fn l_fix_key(&self, ts: i64, key: &[u8]) {
        self.fix_list_key(ts, key)
    }

    pub(crate) fn fix_list_key(&self, ts: i64, key: &[u8]) {
        let keyname = String::from_utf8_lossy(key).into_owned();
        let (ki, meta) = match self.l_header_and_meta(ts, key, self.eng.as_ref()) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(key = %keyname, error = %e, "fix: reading list meta failed");
                return;
            }
        };
        if ki.is_not_exist_or_expired() {
            return;
        }
        tracing::info!(
            key = %keyname,
            head_seq = meta.head_seq,
            tail_seq = meta.tail_seq,
            "list before fix"
        );

        let start_key = codec::encode_element_key(&ki.table, &ki.ver_key, LIST_MIN_SEQ);
        let stop_key = codec::encode_element_key(&ki.table, &ki.ver_key, LIST_MAX_SEQ);
        let rows = match self.eng.scan(&start_key, &stop_key, ScanOpts::default()) {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(key = %keyname, error = %e, "fix: scanning elements failed");
                return;
            }
        };

        let mut fixed_head = 0i64;
        let mut fixed_tail = 0i64;
        let mut cnt = 0i64;
        let mut last_seq = -1i64;
        for (ek, _) in rows {
            let seq = match codec::decode_element_key(&ek) {
                Ok((_, _, seq)) => seq,
                Err(e) => {
                    tracing::warn!(key = %keyname, error = %e, "fix: undecodable element key");
                    return;
                }
            };
            cnt += 1;
            if last_seq < 0 {
                fixed_head = seq;
            } else if last_seq + 1 != seq {
                tracing::warn!(
                    key = %keyname,
                    last_seq,
                    seq,
                    "fix: sequences not contiguous, refusing to repair"
                );
                return;
            }
            last_seq = seq;
            fixed_tail = seq;
        }

        if meta.head_seq == fixed_head && meta.tail_seq == fixed_tail {
            tracing::info!(key = %keyname, fixed_head, fixed_tail, "fix: meta already matches");
            return;
        }
        if meta.size == 0 && cnt == 0 {
            tracing::info!(key = %keyname, "fix: list already empty");
            return;
        }

        let mut wb = self.batch.acquire();
        if cnt == 0 {
            wb.delete(codec::encode_meta_key(key));
            if self
                .incr_table_key_count(&ki.table, -1, &mut wb)
                .is_err()
            {
                return;
            }
        } else if set_list_meta(key, &ki.header, fixed_head, fixed_tail, ts, &mut wb).is_err() {
            return;
        }
        if let Err(e) = self.eng.commit(&wb) {
            tracing::warn!(key = %keyname, error = %e, "fix: commit failed");
            return;
        }
        tracing::info!(key = %keyname, fixed_head, fixed_tail, cnt, "list fixed");
    }

    /// Adjusts the table's live-key counter inside the batch. Earlier
    /// staged writes to the same counter row are honored, so several
    /// transitions in one batch add up.
    pub(crate) fn incr_table_key_count(
        &self,
        table: &[u8],
        delta: i64,
        wb: &mut WriteBatch,
    ) -> Result<()> {
        let cnt_key = codec::encode_table_cnt_key(table);
        let staged = wb.ops().iter().rev().find_map(|op| match op {
            BatchOp::Put { key, value } if *key == cnt_key => Some(decode_count(value)),
            BatchOp::Delete { key } if *key == cnt_key => Some(0),
            _ => None,
        });
        let cur = match staged {
            Some(v) => v,
            None => self
                .eng
                .get(&cnt_key)?
                .map(|v| decode_count(&v))
                .unwrap_or(0),
        };
        let next = cur + delta;
        if next <= 0 {
            wb.delete(cnt_key);
        } else {
            let mut buf = BytesMut::with_capacity(8);
            buf.put_u64(next as u64);
            wb.put(cnt_key, buf.freeze());
        }
        Ok(())
    }

    /// Live-key count for a table, as of the last commit.
    pub fn table_key_count(&self, table: &[u8]) -> Result<i64> {
        Ok(self
            .eng
            .get(&codec::encode_table_cnt_key(table))?
            .map(|v| decode_count(&v))
            .unwrap_or(0))
    }
}

/// Maps a Redis-style index (negative counts from the tail) onto the
/// list's sequence line. Saturates instead of wrapping, so an absurd
/// index still lands outside `[head, tail]`.
fn index_to_seq(meta: &ListMeta, index: i64) -> i64 {
    if index >= 0 {
        meta.head_seq.saturating_add(index)
    } else {
        meta.tail_seq.saturating_add(index).saturating_add(1)
    }
}

fn decode_count(v: &[u8]) -> i64 {
    if v.len() < 8 {
        return 0;
    }
    let mut cur = v;
    cur.get_u64() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use reef_engine::MemoryEngine;
    use reef_observe::NoopMeter;

    fn store() -> ListStore<MemoryEngine> {
        ListStore::new(
            Arc::new(MemoryEngine::new()),
            StoreConfig::default(),
            Arc::new(NoopMeter),
        )
    }

    #[test]
    fn counter_honors_staged_writes_in_same_batch() {
        let store = store();
        let mut wb = WriteBatch::new();
        store.incr_table_key_count(b"t", 1, &mut wb).unwrap();
        store.incr_table_key_count(b"t", 1, &mut wb).unwrap();
        store.engine().commit(&wb).unwrap();
        assert_eq!(store.table_key_count(b"t").unwrap(), 2);

        let mut wb = WriteBatch::new();
        store.incr_table_key_count(b"t", -1, &mut wb).unwrap();
        store.incr_table_key_count(b"t", -1, &mut wb).unwrap();
        store.engine().commit(&wb).unwrap();
        assert_eq!(store.table_key_count(b"t").unwrap(), 0);
    }

    #[test]
    fn counter_row_is_removed_at_zero() {
        let store = store();
        let mut wb = WriteBatch::new();
        store.incr_table_key_count(b"t", 1, &mut wb).unwrap();
        store.incr_table_key_count(b"t", -1, &mut wb).unwrap();
        store.engine().commit(&wb).unwrap();
        assert_eq!(store.engine().len(), 0);
    }
}
