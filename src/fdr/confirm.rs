/*!
The confirm region of a packed literal table.

The primary table only says that some literal in some bucket may end at a
position. The confirm region says which. It holds, for every bucket, a small
directory of literal lists split by the low bits of the final literal byte,
and every literal record in those lists carries a quick check (a value and
mask over the last few bytes) plus the offset of its full bytes.

The region is laid out as follows, every integer in the table's endianness
and every offset relative to the start of the region:

```text
directory: num_buckets * 2^split entries of (records offset u32, count u32)
records:   RECORD_LEN bytes each, sorted by literal id within a list
strings:   the bytes of every literal, concatenated
```
*/

use alloc::{vec, vec::Vec};
use core::cmp;

use crate::{
    fdr::{engine::SchemeDescriptor, literal::Literal},
    util::{
        primitives::LiteralID,
        search::GroupMask,
        wire::{self, DeserializeError, Endian, SerializeError},
    },
};

const DIRECTORY_ENTRY_LEN: usize = 8;
const RECORD_LEN: usize = 40;
const FLAG_NOCASE: u32 = 1 << 0;

/// A view of the bytes that precede a position: a carried history followed
/// by the current buffer. Offsets are relative to the start of the buffer, so
/// negative offsets read from the history.
#[derive(Clone, Copy, Debug)]
pub(crate) struct HistoryBuf<'a> {
    history: &'a [u8],
    buf: &'a [u8],
}

impl<'a> HistoryBuf<'a> {
    pub(crate) fn new(history: &'a [u8], buf: &'a [u8]) -> HistoryBuf<'a> {
        HistoryBuf { history, buf }
    }

    /// Returns the byte at the given offset, if it is available.
    #[inline]
    pub(crate) fn get(&self, at: isize) -> Option<u8> {
        if at >= 0 {
            self.buf.get(at as usize).copied()
        } else {
            let back = at.unsigned_abs();
            if back > self.history.len() {
                None
            } else {
                Some(self.history[self.history.len() - back])
            }
        }
    }

    /// Returns true if and only if `needle` occurs so that it ends just
    /// before `end`, folding ASCII case when `nocase` is set.
    fn ends_with(&self, end: isize, needle: &[u8], nocase: bool) -> bool {
        let start = end - needle.len() as isize;
        if start < -(self.history.len() as isize) {
            return false;
        }
        needle.iter().enumerate().all(|(i, &n)| {
            match self.get(start + i as isize) {
                None => false,
                Some(b) if nocase => b.eq_ignore_ascii_case(&n),
                Some(b) => b == n,
            }
        })
    }

    /// The eight bytes ending just before `end` as a little endian word,
    /// with unavailable bytes read as zero.
    fn window(&self, end: isize) -> u64 {
        let mut bytes = [0u8; 8];
        for (i, slot) in bytes.iter_mut().enumerate() {
            *slot = self.get(end - 8 + i as isize).unwrap_or(0);
        }
        u64::from_le_bytes(bytes)
    }
}

/// One literal as stored in the confirm region, before serialization.
#[derive(Clone, Debug)]
struct ConfirmEntry {
    id: LiteralID,
    bytes: Vec<u8>,
    nocase: bool,
    groups: GroupMask,
    quick_value: u64,
    quick_mask: u64,
}

impl ConfirmEntry {
    fn new(lit: &Literal, quick_len: usize) -> ConfirmEntry {
        let (quick_value, quick_mask) = quick_check(lit, quick_len);
        ConfirmEntry {
            id: lit.id(),
            bytes: lit.as_bytes().to_vec(),
            nocase: lit.is_nocase(),
            groups: lit.group_mask(),
            quick_value,
            quick_mask,
        }
    }
}

/// Build the value and mask of the quick check over the last `quick_len`
/// bytes of a literal, laid out the way `HistoryBuf::window` reads input.
fn quick_check(lit: &Literal, quick_len: usize) -> (u64, u64) {
    let bytes = lit.as_bytes();
    let n = cmp::min(bytes.len(), quick_len);
    let (mut value, mut mask) = ([0u8; 8], [0u8; 8]);
    for j in 0..n {
        let b = bytes[bytes.len() - 1 - j];
        let slot = 7 - j;
        if lit.is_nocase() && b.is_ascii_alphabetic() {
            value[slot] = b.to_ascii_uppercase();
            mask[slot] = 0xDF;
        } else {
            value[slot] = b;
            mask[slot] = 0xFF;
        }
    }
    (u64::from_le_bytes(value), u64::from_le_bytes(mask))
}

/// The build time form of the confirm region.
#[derive(Clone, Debug)]
pub(crate) struct ConfirmParts {
    /// Indexed by `bucket * 2^split + split index`.
    lists: Vec<Vec<ConfirmEntry>>,
}

impl ConfirmParts {
    /// Build the confirm lists for the given bucket assignment, where
    /// `buckets[b]` lists the literals in bucket `b`.
    pub(crate) fn new(
        desc: &SchemeDescriptor,
        buckets: &[Vec<&Literal>],
    ) -> ConfirmParts {
        let split = desc.confirm_top_level_split();
        let quick_len = 8 - desc.confirm_pull_back_distance() as usize;
        let per_bucket = 1usize << split;
        let mut lists = vec![vec![]; buckets.len() * per_bucket];
        for (b, lits) in buckets.iter().enumerate() {
            for lit in lits.iter() {
                let entry = ConfirmEntry::new(lit, quick_len);
                // Only the low bits are used, and ASCII case only differs in
                // bit 5, so both cases of a caseless final byte share a list.
                let last = lit.as_bytes()[lit.len() - 1];
                let s = split_index(last, split);
                lists[b * per_bucket + s].push(entry);
            }
        }
        for list in lists.iter_mut() {
            list.sort_by_key(|e| e.id);
        }
        ConfirmParts { lists }
    }

    /// Rebuild the confirm lists from a validated region.
    pub(crate) fn from_region(region: &ConfirmRegion<'_>) -> ConfirmParts {
        let mut lists = vec![];
        for list in 0..region.num_lists {
            let mut entries = vec![];
            for rec in region.list(list) {
                entries.push(ConfirmEntry {
                    id: rec.id,
                    bytes: rec.bytes.to_vec(),
                    nocase: rec.nocase,
                    groups: rec.groups,
                    quick_value: rec.quick_value,
                    quick_mask: rec.quick_mask,
                });
            }
            lists.push(entries);
        }
        ConfirmParts { lists }
    }

    fn num_records(&self) -> usize {
        self.lists.iter().map(|l| l.len()).sum()
    }

    fn strings_len(&self) -> usize {
        self.lists.iter().flat_map(|l| l.iter()).map(|e| e.bytes.len()).sum()
    }

    pub(crate) fn write_to_len(&self) -> usize {
        let len = self.lists.len() * DIRECTORY_ENTRY_LEN
            + self.num_records() * RECORD_LEN
            + self.strings_len();
        len + wire::padding_len(len)
    }

    pub(crate) fn write_to<E: Endian>(
        &self,
        dst: &mut [u8],
    ) -> Result<usize, SerializeError> {
        let nwrite = self.write_to_len();
        if dst.len() < nwrite {
            return Err(SerializeError::buffer_too_small("confirm region"));
        }
        let dst = &mut dst[..nwrite];
        let mut record_at = self.lists.len() * DIRECTORY_ENTRY_LEN;
        let mut string_at = record_at + self.num_records() * RECORD_LEN;
        for (i, list) in self.lists.iter().enumerate() {
            let dir = &mut dst[i * DIRECTORY_ENTRY_LEN..];
            E::write_u32(u32_len(record_at), dir);
            E::write_u32(u32_len(list.len()), &mut dir[4..]);
            for e in list.iter() {
                let rec = &mut dst[record_at..record_at + RECORD_LEN];
                E::write_u32(e.id.as_u32(), rec);
                E::write_u32(u32_len(e.bytes.len()), &mut rec[4..]);
                E::write_u32(u32_len(string_at), &mut rec[8..]);
                let flags = if e.nocase { FLAG_NOCASE } else { 0 };
                E::write_u32(flags, &mut rec[12..]);
                E::write_u64(e.groups, &mut rec[16..]);
                E::write_u64(e.quick_value, &mut rec[24..]);
                E::write_u64(e.quick_mask, &mut rec[32..]);
                record_at += RECORD_LEN;

                dst[string_at..string_at + e.bytes.len()]
                    .copy_from_slice(&e.bytes);
                string_at += e.bytes.len();
            }
        }
        for b in dst[string_at..].iter_mut() {
            *b = 0;
        }
        Ok(nwrite)
    }
}

fn split_index(byte: u8, split: u32) -> usize {
    usize::from(byte) & ((1 << split) - 1)
}

fn u32_len(n: usize) -> u32 {
    // Builders reject tables whose offsets exceed u32 before writing.
    debug_assert!(n <= u32::MAX as usize);
    n as u32
}

/// A validated, read only view of a serialized confirm region.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ConfirmRegion<'a> {
    bytes: &'a [u8],
    split: u32,
    num_lists: usize,
}

/// One literal record read from a confirm region.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ConfirmRecord<'a> {
    pub(crate) id: LiteralID,
    pub(crate) bytes: &'a [u8],
    pub(crate) nocase: bool,
    pub(crate) groups: GroupMask,
    quick_value: u64,
    quick_mask: u64,
}

impl<'a> ConfirmRegion<'a> {
    /// Validate the given region for a scheme with the given bucket count
    /// and split. Every list, record and string range is checked, so that
    /// later reads never go out of bounds.
    pub(crate) fn from_bytes(
        bytes: &'a [u8],
        num_buckets: u32,
        split: u32,
    ) -> Result<ConfirmRegion<'a>, DeserializeError> {
        let num_lists = (num_buckets as usize) << split;
        let dir_len =
            wire::mul(num_lists, DIRECTORY_ENTRY_LEN, "confirm directory")?;
        wire::check_slice_len(bytes, dir_len, "confirm directory")?;
        let region = ConfirmRegion { bytes, split, num_lists };
        for list in 0..num_lists {
            let dir = &bytes[list * DIRECTORY_ENTRY_LEN..];
            let at = wire::try_read_u32_as_usize(dir, "confirm list offset")?;
            let count =
                wire::try_read_u32_as_usize(&dir[4..], "confirm list length")?;
            let len = wire::mul(count, RECORD_LEN, "confirm list length")?;
            let end = wire::add(at, len, "confirm list end")?;
            if at < dir_len || end > bytes.len() {
                return Err(DeserializeError::generic(
                    "confirm list points outside of its region",
                ));
            }
            for i in 0..count {
                let rec = &bytes[at + i * RECORD_LEN..];
                wire::try_read_literal_id(rec, "confirm literal id")?;
                let slen =
                    wire::try_read_u32_as_usize(&rec[4..], "literal length")?;
                let sat =
                    wire::try_read_u32_as_usize(&rec[8..], "literal offset")?;
                let send = wire::add(sat, slen, "literal end")?;
                if slen == 0 || send > bytes.len() {
                    return Err(DeserializeError::generic(
                        "confirm literal bytes are empty or out of bounds",
                    ));
                }
            }
        }
        Ok(region)
    }

    /// Wrap a region that was validated by `from_bytes` before.
    pub(crate) fn new_unchecked(
        bytes: &'a [u8],
        num_buckets: u32,
        split: u32,
    ) -> ConfirmRegion<'a> {
        let num_lists = (num_buckets as usize) << split;
        ConfirmRegion { bytes, split, num_lists }
    }

    fn list(&self, list: usize) -> impl Iterator<Item = ConfirmRecord<'a>> {
        let bytes = self.bytes;
        let dir = &bytes[list * DIRECTORY_ENTRY_LEN..];
        let at = wire::read_u32(dir) as usize;
        let count = wire::read_u32(&dir[4..]) as usize;
        (0..count).map(move |i| {
            let rec = &bytes[at + i * RECORD_LEN..];
            let len = wire::read_u32(&rec[4..]) as usize;
            let sat = wire::read_u32(&rec[8..]) as usize;
            ConfirmRecord {
                id: LiteralID::new_unchecked(wire::read_u32(rec) as usize),
                bytes: &bytes[sat..sat + len],
                nocase: wire::read_u32(&rec[12..]) & FLAG_NOCASE != 0,
                groups: wire::read_u64(&rec[16..]),
                quick_value: wire::read_u64(&rec[24..]),
                quick_mask: wire::read_u64(&rec[32..]),
            }
        })
    }

    /// Confirm a candidate of `bucket` ending just before `end`, pushing the
    /// ids of every literal that really matches there and whose groups
    /// intersect `groups`.
    ///
    /// `cased` supplies the bytes for case sensitive literals, `caseless` for
    /// caseless ones. Both must agree on the bytes of the current buffer.
    pub(crate) fn confirm(
        &self,
        bucket: u32,
        end: isize,
        cased: &HistoryBuf<'_>,
        caseless: &HistoryBuf<'_>,
        groups: GroupMask,
        matches: &mut Vec<LiteralID>,
    ) {
        let last = match cased.get(end - 1) {
            None => return,
            Some(last) => last,
        };
        let per_bucket = 1usize << self.split;
        let list =
            bucket as usize * per_bucket + split_index(last, self.split);
        let mut windows: [Option<u64>; 2] = [None, None];
        for rec in self.list(list) {
            if rec.groups & groups == 0 {
                continue;
            }
            let hist = if rec.nocase { caseless } else { cased };
            let window = windows[rec.nocase as usize]
                .get_or_insert_with(|| hist.window(end));
            if *window & rec.quick_mask != rec.quick_value {
                continue;
            }
            if hist.ends_with(end, rec.bytes, rec.nocase) {
                trace!("confirmed literal {:?} ending at {}", rec.id, end);
                matches.push(rec.id);
            }
        }
    }

    /// The size of this region in bytes.
    pub(crate) fn len(&self) -> usize {
        self.bytes.len()
    }
}
