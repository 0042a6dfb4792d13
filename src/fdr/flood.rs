/*!
Flood detection: the side table describing what a long run of one byte
matches.

Inside a run of byte `c` that is longer than every literal, the only literals
that can end at a position are those consisting solely of `c`, and whether
one of them matches only depends on how much of the run lies behind the
position. The flood record for `c` lists exactly those literals, so the
scanner can report every end inside the run without probing the primary
table once per byte.

The region is laid out as 256 record indexes (one per byte value, `u32`)
followed by the records. Record `0` is always the empty record, which is
what bytes without flood handling point at.
*/

use alloc::{vec, vec::Vec};
use core::cmp;

use crate::{
    fdr::{engine::SchemeDescriptor, literal::Literal, FDR_FLOOD_MAX_IDS},
    util::{
        primitives::LiteralID,
        search::GroupMask,
        wire::{self, DeserializeError, Endian, SerializeError},
    },
};

const INDEX_LEN: usize = 256 * 4;
const RECORD_LEN: usize = 272;
const IDS_AT: usize = 16;
const GROUPS_AT: usize = IDS_AT + 4 * FDR_FLOOD_MAX_IDS;
const LENS_AT: usize = GROUPS_AT + 8 * FDR_FLOOD_MAX_IDS;

/// One literal that matches inside a flood.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FloodEntry {
    /// The id reported for this literal.
    pub id: LiteralID,
    /// The groups this literal belongs to.
    pub groups: GroupMask,
    /// The length of this literal. It matches at every end that has at least
    /// this many bytes of the run behind it.
    pub len: u32,
}

/// What a flood of one byte value matches.
///
/// A record holds at most [`FDR_FLOOD_MAX_IDS`] entries, sorted by id. A
/// byte whose flood would need more entries than that gets no record at all
/// and is always scanned normally.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FloodRecord {
    all_groups: GroupMask,
    suffix: u32,
    count: usize,
    entries: [FloodEntry; FDR_FLOOD_MAX_IDS],
}

impl FloodRecord {
    /// Create an empty record for a flood that becomes eligible once
    /// `suffix` bytes of the run lie behind the scan position.
    pub fn new(suffix: u32) -> FloodRecord {
        FloodRecord {
            all_groups: 0,
            suffix,
            count: 0,
            entries: [FloodEntry::default(); FDR_FLOOD_MAX_IDS],
        }
    }

    /// Add an entry to this record. Entries must be added in ascending id
    /// order. This returns false without changing anything if the record is
    /// already full.
    pub fn push(&mut self, entry: FloodEntry) -> bool {
        if self.count == FDR_FLOOD_MAX_IDS {
            return false;
        }
        debug_assert!(
            self.entries().last().map_or(true, |e| e.id <= entry.id)
        );
        self.entries[self.count] = entry;
        self.count += 1;
        self.all_groups |= entry.groups;
        true
    }

    /// The union of the groups of every entry.
    pub fn all_groups(&self) -> GroupMask {
        self.all_groups
    }

    /// The length of run, ending at the scan position, from which on the
    /// flood path may be taken.
    pub fn suffix(&self) -> u32 {
        self.suffix
    }

    /// The number of entries in this record.
    pub fn id_count(&self) -> usize {
        self.count
    }

    /// The entries of this record, in ascending id order.
    pub fn entries(&self) -> &[FloodEntry] {
        &self.entries[..self.count]
    }

    /// Returns the ids that end at a position with `run_len` bytes of the run
    /// behind it (the position included), restricted to the given groups.
    ///
    /// Ids are yielded in ascending order and each at most once.
    pub fn matches(
        &self,
        run_len: usize,
        groups: GroupMask,
    ) -> impl Iterator<Item = LiteralID> + '_ {
        let mut last: Option<LiteralID> = None;
        self.entries().iter().filter_map(move |e| {
            if e.len as usize > run_len || e.groups & groups == 0 {
                return None;
            }
            if last == Some(e.id) {
                return None;
            }
            last = Some(e.id);
            Some(e.id)
        })
    }

    fn write_to<E: Endian>(&self, dst: &mut [u8]) {
        let dst = &mut dst[..RECORD_LEN];
        for b in dst.iter_mut() {
            *b = 0;
        }
        E::write_u64(self.all_groups, dst);
        E::write_u32(self.suffix, &mut dst[8..]);
        E::write_u16(self.count as u16, &mut dst[12..]);
        for (i, e) in self.entries().iter().enumerate() {
            E::write_u32(e.id.as_u32(), &mut dst[IDS_AT + 4 * i..]);
            E::write_u64(e.groups, &mut dst[GROUPS_AT + 8 * i..]);
            E::write_u32(e.len, &mut dst[LENS_AT + 4 * i..]);
        }
    }

    fn read(src: &[u8]) -> Result<FloodRecord, DeserializeError> {
        wire::check_slice_len(src, RECORD_LEN, "flood record")?;
        let count = usize::from(wire::read_u16(&src[12..]));
        if count > FDR_FLOOD_MAX_IDS {
            return Err(DeserializeError::generic(
                "flood record has too many literals",
            ));
        }
        let mut rec = FloodRecord::new(wire::read_u32(&src[8..]));
        for i in 0..count {
            let id = wire::try_read_literal_id(
                &src[IDS_AT + 4 * i..],
                "flood literal id",
            )?;
            rec.entries[i] = FloodEntry {
                id,
                groups: wire::read_u64(&src[GROUPS_AT + 8 * i..]),
                len: wire::read_u32(&src[LENS_AT + 4 * i..]),
            };
        }
        rec.count = count;
        rec.all_groups = wire::read_u64(src);
        Ok(rec)
    }
}

/// The build time form of the flood region.
#[derive(Clone, Debug)]
pub(crate) struct FloodParts {
    index: Vec<u32>,
    records: Vec<FloodRecord>,
}

impl FloodParts {
    /// Build a flood record for every byte value that some literal is a run
    /// of, sharing identical records between bytes.
    pub(crate) fn new(
        desc: &SchemeDescriptor,
        literals: &[Literal],
    ) -> FloodParts {
        let max_len = literals.iter().map(|l| l.len()).max().unwrap_or(0);
        let suffix =
            cmp::max(desc.default_flood_suffix_length() as usize, max_len);
        let suffix = suffix as u32;

        let mut sorted: Vec<&Literal> = literals.iter().collect();
        sorted.sort_by_key(|l| (l.id(), l.len()));

        let mut parts = FloodParts {
            index: vec![0; 256],
            records: vec![FloodRecord::new(0)],
        };
        for byte in 0..=255u8 {
            let runs: Vec<&Literal> =
                sorted.iter().copied().filter(|l| l.is_run_of(byte)).collect();
            if runs.is_empty() {
                continue;
            }
            if runs.len() > FDR_FLOOD_MAX_IDS {
                debug!(
                    "flood of {:?} would need {} literals, scanning it \
                     normally",
                    byte as char,
                    runs.len(),
                );
                continue;
            }
            let mut rec = FloodRecord::new(suffix);
            for lit in runs {
                let pushed = rec.push(FloodEntry {
                    id: lit.id(),
                    groups: lit.group_mask(),
                    len: lit.len() as u32,
                });
                debug_assert!(pushed);
            }
            let at = match parts.records.iter().position(|r| *r == rec) {
                Some(at) => at,
                None => {
                    parts.records.push(rec);
                    parts.records.len() - 1
                }
            };
            parts.index[usize::from(byte)] = at as u32;
        }
        parts
    }

    /// Rebuild the flood parts from a validated region.
    pub(crate) fn from_region(region: &FloodRegion<'_>) -> FloodParts {
        let index = (0..256)
            .map(|byte| wire::read_u32(&region.bytes[byte * 4..]))
            .collect();
        let records =
            (0..region.num_records).map(|i| region.record_at(i)).collect();
        FloodParts { index, records }
    }

    pub(crate) fn write_to_len(&self) -> usize {
        INDEX_LEN + self.records.len() * RECORD_LEN
    }

    pub(crate) fn write_to<E: Endian>(
        &self,
        dst: &mut [u8],
    ) -> Result<usize, SerializeError> {
        let nwrite = self.write_to_len();
        if dst.len() < nwrite {
            return Err(SerializeError::buffer_too_small("flood region"));
        }
        for (byte, &at) in self.index.iter().enumerate() {
            E::write_u32(at, &mut dst[byte * 4..]);
        }
        for (i, rec) in self.records.iter().enumerate() {
            rec.write_to::<E>(&mut dst[INDEX_LEN + i * RECORD_LEN..]);
        }
        Ok(nwrite)
    }
}

/// A validated, read only view of a serialized flood region.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FloodRegion<'a> {
    bytes: &'a [u8],
    num_records: usize,
}

impl<'a> FloodRegion<'a> {
    /// Validate a flood region. Every index and every record is checked.
    pub(crate) fn from_bytes(
        bytes: &'a [u8],
    ) -> Result<FloodRegion<'a>, DeserializeError> {
        wire::check_slice_len(bytes, INDEX_LEN, "flood index")?;
        let num_records = (bytes.len() - INDEX_LEN) / RECORD_LEN;
        if num_records == 0 {
            return Err(DeserializeError::generic(
                "flood region is missing its empty record",
            ));
        }
        let region = FloodRegion { bytes, num_records };
        for byte in 0..256 {
            let at = wire::try_read_u32_as_usize(
                &bytes[byte * 4..],
                "flood record index",
            )?;
            if at >= num_records {
                return Err(DeserializeError::generic(
                    "flood record index out of bounds",
                ));
            }
        }
        for i in 0..num_records {
            FloodRecord::read(&bytes[INDEX_LEN + i * RECORD_LEN..])?;
        }
        if region.record_at(0).id_count() != 0 {
            return Err(DeserializeError::generic(
                "first flood record must be empty",
            ));
        }
        Ok(region)
    }

    /// Wrap a region that was validated by `from_bytes` before.
    pub(crate) fn new_unchecked(bytes: &'a [u8]) -> FloodRegion<'a> {
        let num_records = (bytes.len() - INDEX_LEN) / RECORD_LEN;
        FloodRegion { bytes, num_records }
    }

    fn record_at(&self, i: usize) -> FloodRecord {
        // Every record was decoded once by `from_bytes`.
        FloodRecord::read(&self.bytes[INDEX_LEN + i * RECORD_LEN..])
            .unwrap_or_else(|_| FloodRecord::new(0))
    }

    /// Return the flood record of the given byte, or `None` when floods of
    /// that byte are scanned normally.
    pub(crate) fn record(&self, byte: u8) -> Option<FloodRecord> {
        let at = wire::read_u32(&self.bytes[usize::from(byte) * 4..]) as usize;
        if at == 0 {
            return None;
        }
        let rec = self.record_at(at);
        if rec.id_count() == 0 {
            None
        } else {
            Some(rec)
        }
    }

    /// The size of this region in bytes.
    pub(crate) fn len(&self) -> usize {
        self.bytes.len()
    }
}
