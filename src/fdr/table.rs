/*!
The packed literal table: building it, serializing it and reading it.

A packed literal table is a single contiguous byte arena. Its header records
which scheme it was built for and where its regions live, and every reference
between regions is an offset into the arena that is validated once when the
table is loaded. Nothing in a table is ever written after it has been built,
so one table can be shared by any number of concurrent scans.

The arena is laid out as follows, every integer in the table's endianness and
every offset relative to the start of the header:

```text
header:  engine_id u32, size u32, max_string_len u32, flood_offset u32,
         link u32, domain u8, scheme_width_byte u8, domain_mask u16,
         tab_size u32, pad u32
primary: 2^domain words of scheme_width_byte bytes each
confirm: starting at `link`, see the confirm module
flood:   starting at `flood_offset`, see the flood module
```
*/

use alloc::{vec, vec::Vec};

use crate::{
    fdr::{
        confirm::{ConfirmParts, ConfirmRegion},
        engine::{
            get_fdr_description, CpuFeatures, SchemeDescriptor, MAX_DOMAIN,
            MIN_DOMAIN,
        },
        error::BuildError,
        flood::{FloodParts, FloodRecord, FloodRegion},
        literal::Literal,
        select::choose_engine,
    },
    util::wire::{self, DeserializeError, Endian, SerializeError},
};

const LABEL: &str = "fdr-literal-table";
const VERSION: u64 = 1;
const HEADER_LEN: usize = 32;

/// The configuration used for building a packed literal table.
///
/// A configuration is merged into a builder with [`Builder::configure`].
/// Options that are not set keep whatever value the builder already had.
#[derive(Clone, Debug, Default)]
pub struct Config {
    // Every knob is an option so that "not set" can be told apart from the
    // default when configurations are merged. See 'overwrite'.
    make_small: Option<bool>,
    target: Option<CpuFeatures>,
    engine: Option<Option<u32>>,
    domain: Option<Option<u32>>,
}

impl Config {
    /// Return a new default configuration.
    pub fn new() -> Config {
        Config::default()
    }

    /// Prefer a small table over a fast one.
    ///
    /// When enabled, the smallest table that can hold the literals is chosen,
    /// with speed only used to break ties. This is disabled by default.
    pub fn make_small(mut self, yes: bool) -> Config {
        self.make_small = Some(yes);
        self
    }

    /// Set the CPU features the table may rely on.
    ///
    /// By default, this is the set of features detected on the current CPU
    /// when the `std` feature is enabled, and no features otherwise.
    pub fn target(mut self, target: CpuFeatures) -> Config {
        self.target = Some(target);
        self
    }

    /// Force a particular scheme by its id, bypassing selection entirely.
    ///
    /// The forced scheme is used even if the target lacks the features it
    /// would like to have. This is mostly useful for testing.
    pub fn engine(mut self, id: Option<u32>) -> Config {
        self.engine = Some(id);
        self
    }

    /// Force the hashing domain of the table, in bits.
    ///
    /// The domain must be in the range `9..=15`, otherwise building fails.
    pub fn domain(mut self, bits: Option<u32>) -> Config {
        self.domain = Some(bits);
        self
    }

    /// Returns whether small tables are preferred.
    pub fn get_make_small(&self) -> bool {
        self.make_small.unwrap_or(false)
    }

    /// Returns the target CPU features.
    pub fn get_target(&self) -> CpuFeatures {
        self.target.unwrap_or_else(CpuFeatures::detect)
    }

    /// Returns the forced scheme id, if any.
    pub fn get_engine(&self) -> Option<u32> {
        self.engine.unwrap_or(None)
    }

    /// Returns the forced domain, if any.
    pub fn get_domain(&self) -> Option<u32> {
        self.domain.unwrap_or(None)
    }

    /// Overwrite the default configuration such that the options in `o` are
    /// always used. If an option in `o` is not set, then the corresponding
    /// option in `self` is used. If it's not set in `self` either, then it
    /// remains not set.
    pub(crate) fn overwrite(&self, o: Config) -> Config {
        Config {
            make_small: o.make_small.or(self.make_small),
            target: o.target.or(self.target),
            engine: o.engine.or(self.engine),
            domain: o.domain.or(self.domain),
        }
    }
}

/// A builder for packed literal tables.
///
/// # Example
///
/// ```
/// use fdr_rose::{
///     fdr::{self, Literal},
///     LiteralID,
/// };
///
/// let lits = vec![
///     Literal::new(LiteralID::must(0), "foo"),
///     Literal::new(LiteralID::must(1), "bar").nocase(true),
/// ];
/// let table = fdr::Builder::new().build(&lits)?;
/// assert_eq!(3, table.max_string_len());
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct Builder {
    config: Config,
}

impl Builder {
    /// Create a new builder with the default configuration.
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Apply the given configuration to this builder.
    pub fn configure(&mut self, config: Config) -> &mut Builder {
        self.config = self.config.overwrite(config);
        self
    }

    /// Build a packed literal table for the given literals.
    pub fn build(
        &self,
        literals: &[Literal],
    ) -> Result<PackedLiteralTable<Vec<u8>>, BuildError> {
        if literals.is_empty() {
            return Err(BuildError::empty_literal_set());
        }
        if let Some(lit) = literals.iter().find(|lit| lit.is_empty()) {
            return Err(BuildError::empty_literal(lit.id()));
        }
        let mut desc = match self.config.get_engine() {
            Some(id) => get_fdr_description(id)
                .ok_or_else(|| BuildError::unknown_engine(id))?,
            None => choose_engine(
                self.config.get_target(),
                literals,
                self.config.get_make_small(),
            )?,
        };
        if let Some(bits) = self.config.get_domain() {
            if bits < MIN_DOMAIN || bits > MAX_DOMAIN {
                return Err(BuildError::invalid_domain(bits));
            }
            desc = desc.with_bits(bits);
        }
        let parts = Parts::new(desc, literals);
        let len = parts.write_body_len();
        if len > u32::MAX as usize {
            return Err(BuildError::too_big());
        }
        let mut bytes = vec![0; len];
        parts
            .write_body::<wire::NE>(&mut bytes)
            .map_err(BuildError::serialize)?;
        debug!(
            "built literal table with scheme {} for {} literals, \
             {} bytes ({} in the primary table)",
            parts.desc.id(),
            literals.len(),
            len,
            parts.desc.tab_size_bytes(),
        );
        let header = parts.header();
        Ok(PackedLiteralTable { bytes, header, desc: parts.desc })
    }
}

/// The first word of a primary table, at the width of its scheme.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SchemeWord {
    /// A word of a 32-bit wide scheme.
    W32(u32),
    /// A word of a 64-bit wide scheme.
    W64(u64),
    /// A word of a 128-bit wide scheme.
    W128(u128),
}

impl SchemeWord {
    fn new(width_bytes: u8, word: u128) -> SchemeWord {
        match width_bytes {
            4 => SchemeWord::W32(word as u32),
            8 => SchemeWord::W64(word as u64),
            _ => SchemeWord::W128(word),
        }
    }

    /// Return this word widened to 128 bits.
    pub fn as_u128(self) -> u128 {
        match self {
            SchemeWord::W32(w) => u128::from(w),
            SchemeWord::W64(w) => u128::from(w),
            SchemeWord::W128(w) => w,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Header {
    engine_id: u32,
    size: u32,
    max_string_len: u32,
    flood_offset: u32,
    link: u32,
    domain: u8,
    scheme_width_byte: u8,
    domain_mask: u16,
    tab_size: u32,
}

impl Header {
    fn read(src: &[u8]) -> Result<Header, DeserializeError> {
        wire::check_slice_len(src, HEADER_LEN, "literal table header")?;
        Ok(Header {
            engine_id: wire::read_u32(src),
            size: wire::read_u32(&src[4..]),
            max_string_len: wire::read_u32(&src[8..]),
            flood_offset: wire::read_u32(&src[12..]),
            link: wire::read_u32(&src[16..]),
            domain: src[20],
            scheme_width_byte: src[21],
            domain_mask: wire::read_u16(&src[22..]),
            tab_size: wire::read_u32(&src[24..]),
        })
    }

    fn write<E: Endian>(&self, dst: &mut [u8]) {
        E::write_u32(self.engine_id, dst);
        E::write_u32(self.size, &mut dst[4..]);
        E::write_u32(self.max_string_len, &mut dst[8..]);
        E::write_u32(self.flood_offset, &mut dst[12..]);
        E::write_u32(self.link, &mut dst[16..]);
        dst[20] = self.domain;
        dst[21] = self.scheme_width_byte;
        E::write_u16(self.domain_mask, &mut dst[22..]);
        E::write_u32(self.tab_size, &mut dst[24..]);
        E::write_u32(0, &mut dst[28..]);
    }

    /// Check every invariant of a header against the length of its arena
    /// and return the descriptor it refers to.
    fn validate(
        &self,
        len: usize,
    ) -> Result<SchemeDescriptor, DeserializeError> {
        let desc = get_fdr_description(self.engine_id).ok_or_else(|| {
            DeserializeError::generic("unknown literal matching scheme id")
        })?;
        let domain = u32::from(self.domain);
        if domain < MIN_DOMAIN || domain > MAX_DOMAIN {
            return Err(DeserializeError::generic(
                "literal table domain out of range",
            ));
        }
        let desc = desc.with_bits(domain);
        if u32::from(self.domain_mask) != (1 << domain) - 1 {
            return Err(DeserializeError::generic(
                "literal table domain mask does not match its domain",
            ));
        }
        if u32::from(self.scheme_width_byte) * 8 != desc.scheme_width() {
            return Err(DeserializeError::generic(
                "literal table word width does not match its scheme",
            ));
        }
        if self.tab_size != desc.tab_size_bytes() {
            return Err(DeserializeError::generic(
                "literal table size does not match its domain",
            ));
        }
        if self.max_string_len == 0 {
            return Err(DeserializeError::generic(
                "literal table has no literals",
            ));
        }
        let primary_end = HEADER_LEN + self.tab_size as usize;
        let (link, flood, size) = (
            self.link as usize,
            self.flood_offset as usize,
            self.size as usize,
        );
        if size != len || link < primary_end || flood < link || size < flood
        {
            return Err(DeserializeError::generic(
                "literal table region offsets out of bounds",
            ));
        }
        Ok(desc)
    }
}

/// A packed literal table, ready for scanning.
///
/// The table is generic over its storage. A table produced by [`Builder`]
/// owns a `Vec<u8>`, while a table produced by
/// [`PackedLiteralTable::from_bytes`] borrows the slice it was read from.
/// Either way, the table is immutable.
#[derive(Clone)]
pub struct PackedLiteralTable<T> {
    /// The arena, from the start of the header to the end of the flood
    /// region.
    bytes: T,
    header: Header,
    desc: SchemeDescriptor,
}

impl<T: AsRef<[u8]>> PackedLiteralTable<T> {
    /// Return a table borrowing this table's storage.
    pub fn as_ref(&self) -> PackedLiteralTable<&'_ [u8]> {
        PackedLiteralTable {
            bytes: self.bytes.as_ref(),
            header: self.header,
            desc: self.desc.clone(),
        }
    }

    /// Return a table owning a copy of this table's storage.
    pub fn to_owned(&self) -> PackedLiteralTable<Vec<u8>> {
        PackedLiteralTable {
            bytes: self.bytes.as_ref().to_vec(),
            header: self.header,
            desc: self.desc.clone(),
        }
    }

    /// The descriptor of the scheme this table was built for, with its
    /// domain set.
    pub fn descriptor(&self) -> &SchemeDescriptor {
        &self.desc
    }

    /// The id of the scheme this table was built for.
    pub fn engine_id(&self) -> u32 {
        self.header.engine_id
    }

    /// The size of the arena in bytes, header included.
    pub fn size(&self) -> u32 {
        self.header.size
    }

    /// The length of the longest literal in this table.
    pub fn max_string_len(&self) -> u32 {
        self.header.max_string_len
    }

    /// The offset of the flood region from the start of the header.
    pub fn flood_offset(&self) -> u32 {
        self.header.flood_offset
    }

    /// The offset of the confirm region from the start of the header.
    pub fn link(&self) -> u32 {
        self.header.link
    }

    /// The hashing domain of the primary table, in bits.
    pub fn domain(&self) -> u32 {
        u32::from(self.header.domain)
    }

    /// The mask applied to hash keys. Always `(1 << domain) - 1`.
    pub fn domain_mask(&self) -> u16 {
        self.header.domain_mask
    }

    /// The size of the primary table in bytes.
    pub fn tab_size(&self) -> u32 {
        self.header.tab_size
    }

    /// The number of entries in the primary table.
    pub fn num_table_entries(&self) -> u32 {
        self.desc.num_table_entries()
    }

    /// The first word of the primary table.
    pub fn start(&self) -> SchemeWord {
        self.word(0)
    }

    /// The primary table word for the given hash key.
    ///
    /// This panics if the key is not smaller than `num_table_entries`.
    pub fn word(&self, key: usize) -> SchemeWord {
        SchemeWord::new(self.header.scheme_width_byte, self.raw_word(key))
    }

    /// The flood record of the given byte, if floods of that byte take the
    /// flood path.
    pub fn flood_record(&self, byte: u8) -> Option<FloodRecord> {
        self.flood().record(byte)
    }

    /// Returns the memory usage, in bytes, of this table's arena.
    pub fn memory_usage(&self) -> usize {
        self.bytes.as_ref().len()
    }

    #[inline(always)]
    pub(crate) fn raw_word(&self, key: usize) -> u128 {
        let width = usize::from(self.header.scheme_width_byte);
        let at = HEADER_LEN + key * width;
        let src = &self.bytes.as_ref()[at..at + width];
        match width {
            4 => u128::from(wire::read_u32(src)),
            8 => u128::from(wire::read_u64(src)),
            _ => wire::read_u128(src),
        }
    }

    pub(crate) fn confirm(&self) -> ConfirmRegion<'_> {
        let region = &self.bytes.as_ref()
            [self.header.link as usize..self.header.flood_offset as usize];
        ConfirmRegion::new_unchecked(
            region,
            self.desc.num_buckets(),
            self.desc.confirm_top_level_split(),
        )
    }

    pub(crate) fn flood(&self) -> FloodRegion<'_> {
        let region = &self.bytes.as_ref()[self.header.flood_offset as usize..];
        FloodRegion::new_unchecked(region)
    }

    /// Serialize this table to a `Vec<u8>` in little endian format.
    ///
    /// The bytes written can be read back with
    /// [`PackedLiteralTable::from_bytes`] on a little endian target.
    pub fn to_bytes_little_endian(&self) -> Vec<u8> {
        self.to_bytes::<wire::LE>()
    }

    /// Serialize this table to a `Vec<u8>` in big endian format.
    ///
    /// The bytes written can be read back with
    /// [`PackedLiteralTable::from_bytes`] on a big endian target.
    pub fn to_bytes_big_endian(&self) -> Vec<u8> {
        self.to_bytes::<wire::BE>()
    }

    /// Serialize this table to a `Vec<u8>` in the native endianness of the
    /// current target.
    pub fn to_bytes_native_endian(&self) -> Vec<u8> {
        self.to_bytes::<wire::NE>()
    }

    fn to_bytes<E: Endian>(&self) -> Vec<u8> {
        let mut buf = vec![0; self.write_to_len()];
        // This should always succeed since the only possible serialization
        // error is providing a buffer that's too small, but we've ensured that
        // `buf` is big enough here.
        self.write_to::<E>(&mut buf).unwrap();
        buf
    }

    /// Serialize this table to the given buffer in little endian format,
    /// returning the number of bytes written.
    ///
    /// This fails if the buffer is smaller than `write_to_len`.
    pub fn write_to_little_endian(
        &self,
        dst: &mut [u8],
    ) -> Result<usize, SerializeError> {
        self.write_to::<wire::LE>(dst)
    }

    /// Serialize this table to the given buffer in big endian format,
    /// returning the number of bytes written.
    ///
    /// This fails if the buffer is smaller than `write_to_len`.
    pub fn write_to_big_endian(
        &self,
        dst: &mut [u8],
    ) -> Result<usize, SerializeError> {
        self.write_to::<wire::BE>(dst)
    }

    /// Serialize this table to the given buffer in native endian format,
    /// returning the number of bytes written.
    ///
    /// This fails if the buffer is smaller than `write_to_len`.
    pub fn write_to_native_endian(
        &self,
        dst: &mut [u8],
    ) -> Result<usize, SerializeError> {
        self.write_to::<wire::NE>(dst)
    }

    fn write_to<E: Endian>(
        &self,
        dst: &mut [u8],
    ) -> Result<usize, SerializeError> {
        let nwrite = self.write_to_len();
        if dst.len() < nwrite {
            return Err(SerializeError::buffer_too_small("literal table"));
        }
        let mut nw = 0;
        nw += wire::write_label(LABEL, &mut dst[nw..])?;
        nw += wire::write_endianness_check::<E>(&mut dst[nw..])?;
        nw += wire::write_version::<E>(VERSION, &mut dst[nw..])?;
        nw += Parts::from_table(self).write_body::<E>(&mut dst[nw..])?;
        Ok(nw)
    }

    /// The number of bytes the serialized form of this table occupies.
    pub fn write_to_len(&self) -> usize {
        wire::write_label_len(LABEL)
            + wire::write_endianness_check_len()
            + wire::write_version_len()
            + self.bytes.as_ref().len()
    }
}

impl<'a> PackedLiteralTable<&'a [u8]> {
    /// Read a packed literal table from the given bytes, which must be in
    /// the native endianness of the current target.
    ///
    /// Every offset in the table is validated, so that scanning with the
    /// table returned can never read out of bounds. Upon success, the table
    /// and the number of bytes read are returned.
    pub fn from_bytes(
        slice: &'a [u8],
    ) -> Result<(PackedLiteralTable<&'a [u8]>, usize), DeserializeError> {
        let mut nr = 0;
        nr += wire::read_label(&slice[nr..], LABEL)?;
        nr += wire::read_endianness_check(&slice[nr..])?;
        nr += wire::read_version(&slice[nr..], VERSION)?;
        let header = Header::read(&slice[nr..])?;
        let size = header.size as usize;
        let end = wire::add(nr, size, "literal table size")?;
        wire::check_slice_len(slice, end, "literal table")?;
        let bytes = &slice[nr..end];
        let desc = header.validate(bytes.len())?;

        ConfirmRegion::from_bytes(
            &bytes[header.link as usize..header.flood_offset as usize],
            desc.num_buckets(),
            desc.confirm_top_level_split(),
        )?;
        FloodRegion::from_bytes(&bytes[header.flood_offset as usize..])?;
        Ok((PackedLiteralTable { bytes, header, desc }, end))
    }
}

impl<T: AsRef<[u8]>> core::fmt::Debug for PackedLiteralTable<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PackedLiteralTable")
            .field("engine_id", &self.header.engine_id)
            .field("domain", &self.header.domain)
            .field("size", &self.header.size)
            .field("max_string_len", &self.header.max_string_len)
            .field("confirm_len", &self.confirm().len())
            .field("flood_len", &self.flood().len())
            .finish()
    }
}

/// The decoded form of a table, from which the arena is written.
struct Parts {
    desc: SchemeDescriptor,
    max_string_len: u32,
    words: Vec<u128>,
    confirm: ConfirmParts,
    flood: FloodParts,
}

impl Parts {
    fn new(desc: SchemeDescriptor, literals: &[Literal]) -> Parts {
        let buckets = assign_buckets(&desc, literals);
        let words = build_primary(&desc, &buckets);
        let confirm = ConfirmParts::new(&desc, &buckets);
        let flood = FloodParts::new(&desc, literals);
        let max_string_len =
            literals.iter().map(|l| l.len()).max().unwrap_or(0) as u32;
        Parts { desc, max_string_len, words, confirm, flood }
    }

    fn from_table<T: AsRef<[u8]>>(table: &PackedLiteralTable<T>) -> Parts {
        let entries = table.num_table_entries() as usize;
        Parts {
            desc: table.desc.clone(),
            max_string_len: table.header.max_string_len,
            words: (0..entries).map(|key| table.raw_word(key)).collect(),
            confirm: ConfirmParts::from_region(&table.confirm()),
            flood: FloodParts::from_region(&table.flood()),
        }
    }

    fn header(&self) -> Header {
        let link = HEADER_LEN + self.desc.tab_size_bytes() as usize;
        let flood_offset = link + self.confirm.write_to_len();
        Header {
            engine_id: self.desc.id(),
            size: self.write_body_len() as u32,
            max_string_len: self.max_string_len,
            flood_offset: flood_offset as u32,
            link: link as u32,
            domain: self.desc.bits() as u8,
            scheme_width_byte: (self.desc.scheme_width() / 8) as u8,
            domain_mask: ((1u32 << self.desc.bits()) - 1) as u16,
            tab_size: self.desc.tab_size_bytes(),
        }
    }

    fn write_body_len(&self) -> usize {
        HEADER_LEN
            + self.desc.tab_size_bytes() as usize
            + self.confirm.write_to_len()
            + self.flood.write_to_len()
    }

    fn write_body<E: Endian>(
        &self,
        dst: &mut [u8],
    ) -> Result<usize, SerializeError> {
        let nwrite = self.write_body_len();
        if dst.len() < nwrite {
            return Err(SerializeError::buffer_too_small("literal table"));
        }
        let header = self.header();
        header.write::<E>(dst);
        let width = usize::from(header.scheme_width_byte);
        for (key, &word) in self.words.iter().enumerate() {
            let at = &mut dst[HEADER_LEN + key * width..];
            match width {
                4 => E::write_u32(word as u32, at),
                8 => E::write_u64(word as u64, at),
                _ => E::write_u128(word, at),
            }
        }
        self.confirm.write_to::<E>(&mut dst[header.link as usize..])?;
        self.flood.write_to::<E>(&mut dst[header.flood_offset as usize..])?;
        Ok(nwrite)
    }
}

/// Spread literals over buckets: sorted by length, then id, and cut into
/// contiguous chunks of equal size.
fn assign_buckets<'l>(
    desc: &SchemeDescriptor,
    literals: &'l [Literal],
) -> Vec<Vec<&'l Literal>> {
    let nb = desc.num_buckets() as usize;
    let mut sorted: Vec<&Literal> = literals.iter().collect();
    sorted.sort_by_key(|l| (l.len(), l.id()));
    let per_bucket = (sorted.len() + nb - 1) / nb;
    let mut buckets = vec![vec![]; nb];
    for (i, lit) in sorted.into_iter().enumerate() {
        buckets[i / per_bucket].push(lit);
    }
    buckets
}

/// Returns a mask with the low `width` bits set.
pub(crate) fn width_mask(width: u32) -> u128 {
    if width >= 128 {
        !0
    } else {
        (1u128 << width) - 1
    }
}

/// Build the primary table.
///
/// A word starts with every bit set and a bit is cleared when some literal of
/// the bucket allows a candidate there. The bit for position `p` of a bucket
/// in the word of key `(x, y)` says whether the literal byte that sits
/// `bucket_width - 1 - p` probes back from the candidate end can be `y`
/// preceded by `x`. Positions that fall outside a literal constrain nothing.
fn build_primary(
    desc: &SchemeDescriptor,
    buckets: &[Vec<&Literal>],
) -> Vec<u128> {
    let entries = desc.num_table_entries() as usize;
    let mask = entries - 1;
    let stride = desc.stride() as usize;
    let mut words = vec![width_mask(desc.scheme_width()); entries];
    let mut wildcard = 0u128;
    for (b, lits) in buckets.iter().enumerate() {
        let b = b as u32;
        let bw = desc.bucket_width(b) as usize;
        for lit in lits.iter() {
            let len = lit.len() as isize;
            for pos in 0..bw {
                let bit = 1u128 << desc.scheme_bit(b, pos as u32);
                let back = bw - 1 - pos;
                let (a, k) = (back % stride, back / stride);
                let idx = len - 1 + a as isize - (k * stride) as isize;
                if idx < 0 || idx >= len {
                    wildcard |= bit;
                    continue;
                }
                let idx = idx as usize;
                for &c in lit.variants_at(idx).as_slice() {
                    let c = usize::from(c);
                    if idx == 0 {
                        for prev in 0..256 {
                            words[((prev << 8) | c) & mask] &= !bit;
                        }
                    } else {
                        for &p in lit.variants_at(idx - 1).as_slice() {
                            let key = (usize::from(p) << 8) | c;
                            words[key & mask] &= !bit;
                        }
                    }
                }
            }
        }
    }
    for word in words.iter_mut() {
        *word &= !wildcard;
    }
    words
}
