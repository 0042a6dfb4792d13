/*!
Descriptions of the literal matching schemes known to this crate.

A scheme is described by the width of one table word, the number of buckets
sharing that word, the stride (bytes consumed per table probe) and the CPU
features required to run it efficiently. The table of known schemes is
static. A scheme chosen for a particular literal set additionally carries the
number of hashing bits (its domain), which determines the table size.
*/

use alloc::vec::Vec;

/// The smallest hashing domain, in bits, that a table may use.
pub const MIN_DOMAIN: u32 = 9;

/// The largest hashing domain, in bits, that a table may use.
///
/// The hash key is built from two bytes, so this can never exceed 16.
pub const MAX_DOMAIN: u32 = 15;

/// The domain given to descriptors that have not been through selection.
pub const DEFAULT_DOMAIN: u32 = 13;

/// A set of CPU features a scheme may require.
#[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
pub struct CpuFeatures(u64);

impl CpuFeatures {
    /// No features at all. Schemes requiring nothing run everywhere.
    pub const NONE: CpuFeatures = CpuFeatures(0);
    /// Supplemental SSE3, for 128-bit shuffles.
    pub const SSSE3: CpuFeatures = CpuFeatures(1 << 0);
    /// AVX2, for 256-bit integer operations.
    pub const AVX2: CpuFeatures = CpuFeatures(1 << 1);
    /// Every feature this crate knows about.
    pub const ALL: CpuFeatures = CpuFeatures(0b11);

    /// Build a feature set from its raw bits. Unknown bits are dropped.
    pub fn from_bits(bits: u64) -> CpuFeatures {
        CpuFeatures(bits & CpuFeatures::ALL.0)
    }

    /// Return the raw bits of this feature set.
    pub fn bits(self) -> u64 {
        self.0
    }

    /// Returns true if and only if every feature in `other` is also in this
    /// set.
    pub fn contains(self, other: CpuFeatures) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the union of this set and `other`.
    pub fn union(self, other: CpuFeatures) -> CpuFeatures {
        CpuFeatures(self.0 | other.0)
    }

    /// Detect the features of the CPU this process is running on.
    #[cfg(feature = "std")]
    pub fn detect() -> CpuFeatures {
        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        {
            let mut features = CpuFeatures::NONE;
            if is_x86_feature_detected!("ssse3") {
                features = features.union(CpuFeatures::SSSE3);
            }
            if is_x86_feature_detected!("avx2") {
                features = features.union(CpuFeatures::AVX2);
            }
            features
        }
        #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
        {
            CpuFeatures::NONE
        }
    }

    /// Without `std`, no runtime detection is possible and only schemes
    /// without requirements are considered.
    #[cfg(not(feature = "std"))]
    pub fn detect() -> CpuFeatures {
        CpuFeatures::NONE
    }
}

impl core::fmt::Debug for CpuFeatures {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut set = f.debug_set();
        if self.contains(CpuFeatures::SSSE3) {
            set.entry(&"ssse3");
        }
        if self.contains(CpuFeatures::AVX2) {
            set.entry(&"avx2");
        }
        set.finish()
    }
}

/// The static parameters of one known scheme.
#[derive(Clone, Copy, Debug)]
struct EngineDef {
    id: u32,
    scheme_width: u32,
    num_buckets: u32,
    stride: u32,
    cpu_features: CpuFeatures,
    confirm_pull_back_distance: u32,
    confirm_top_level_split: u32,
}

// Ordered by id. Every bucket width here is at least as big as the stride,
// which the scanner relies on.
const ALL_ENGINES: &[EngineDef] = &[
    def(0, 32, 8, 1, CpuFeatures::NONE, 0, 0),
    def(1, 32, 8, 2, CpuFeatures::NONE, 1, 0),
    def(2, 32, 8, 4, CpuFeatures::NONE, 3, 0),
    def(3, 64, 8, 1, CpuFeatures::NONE, 0, 1),
    def(4, 64, 8, 2, CpuFeatures::NONE, 1, 1),
    def(5, 64, 8, 4, CpuFeatures::NONE, 3, 1),
    def(6, 64, 16, 1, CpuFeatures::NONE, 0, 2),
    def(7, 128, 8, 1, CpuFeatures::SSSE3, 0, 2),
    def(8, 128, 16, 1, CpuFeatures::SSSE3, 0, 2),
    def(9, 128, 16, 2, CpuFeatures::SSSE3, 1, 2),
    def(10, 128, 16, 4, CpuFeatures::AVX2, 3, 2),
];

const fn def(
    id: u32,
    scheme_width: u32,
    num_buckets: u32,
    stride: u32,
    cpu_features: CpuFeatures,
    confirm_pull_back_distance: u32,
    confirm_top_level_split: u32,
) -> EngineDef {
    EngineDef {
        id,
        scheme_width,
        num_buckets,
        stride,
        cpu_features,
        confirm_pull_back_distance,
        confirm_top_level_split,
    }
}

/// An immutable description of one literal matching scheme variant.
///
/// The table layout of a scheme is fully determined by its scheme width,
/// bucket count and stride. In particular, [`bucket_width`] and
/// [`scheme_bit`] are pure functions of those three values, and the table
/// size in bytes is always `scheme_width / 8 * 2^bits`.
///
/// [`bucket_width`]: SchemeDescriptor::bucket_width
/// [`scheme_bit`]: SchemeDescriptor::scheme_bit
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct SchemeDescriptor {
    id: u32,
    scheme_width: u32,
    num_buckets: u32,
    stride: u32,
    bits: u32,
    cpu_features: CpuFeatures,
    confirm_pull_back_distance: u32,
    confirm_top_level_split: u32,
}

impl SchemeDescriptor {
    fn from_def(def: &EngineDef) -> SchemeDescriptor {
        assert_eq!(0, def.scheme_width % def.num_buckets);
        SchemeDescriptor {
            id: def.id,
            scheme_width: def.scheme_width,
            num_buckets: def.num_buckets,
            stride: def.stride,
            bits: DEFAULT_DOMAIN,
            cpu_features: def.cpu_features,
            confirm_pull_back_distance: def.confirm_pull_back_distance,
            confirm_top_level_split: def.confirm_top_level_split,
        }
    }

    /// Return a copy of this descriptor using the given hashing domain.
    ///
    /// This panics if `bits` is outside `MIN_DOMAIN..=MAX_DOMAIN`.
    pub fn with_bits(&self, bits: u32) -> SchemeDescriptor {
        assert!(
            MIN_DOMAIN <= bits && bits <= MAX_DOMAIN,
            "domain {} outside {}..={}",
            bits,
            MIN_DOMAIN,
            MAX_DOMAIN,
        );
        SchemeDescriptor { bits, ..self.clone() }
    }

    /// The identifier of this scheme.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// The number of bits in one table word: 32, 64 or 128.
    pub fn scheme_width(&self) -> u32 {
        self.scheme_width
    }

    /// The number of buckets sharing one table word.
    pub fn num_buckets(&self) -> u32 {
        self.num_buckets
    }

    /// The number of bytes consumed per table probe.
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// The log2 of the number of table entries.
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// The CPU features this scheme requires.
    pub fn cpu_features(&self) -> CpuFeatures {
        self.cpu_features
    }

    /// The number of bytes, past the end of a candidate, that the confirm
    /// phase may need to account for. The quick confirm check covers
    /// `8 - confirm_pull_back_distance` bytes.
    pub fn confirm_pull_back_distance(&self) -> u32 {
        self.confirm_pull_back_distance
    }

    /// The number of final-byte bits used to split each bucket's confirm
    /// list.
    pub fn confirm_top_level_split(&self) -> u32 {
        self.confirm_top_level_split
    }

    /// Returns true if and only if this scheme can run on the given target.
    pub fn is_valid_on_target(&self, target: CpuFeatures) -> bool {
        target.contains(self.cpu_features)
    }

    /// The number of positions one bucket occupies in a table word.
    pub fn bucket_width(&self, _bucket: u32) -> u32 {
        self.scheme_width / self.num_buckets
    }

    /// The absolute bit within a table word for the given bucket and
    /// position in that bucket.
    ///
    /// Positions of all buckets are interleaved, so that shifting a word by
    /// `num_buckets` moves every bucket forward by one position at once.
    pub fn scheme_bit(&self, bucket: u32, position: u32) -> u32 {
        assert!(bucket < self.num_buckets);
        assert!(position < self.bucket_width(bucket));
        let bit = position * self.num_buckets + bucket;
        debug_assert!(bit < self.scheme_width);
        bit
    }

    /// The number of entries in the primary table.
    pub fn num_table_entries(&self) -> u32 {
        1 << self.bits
    }

    /// The size of the primary table in bytes.
    pub fn tab_size_bytes(&self) -> u32 {
        self.scheme_width / 8 * self.num_table_entries()
    }

    /// The shortest run of one byte for which flood handling is worth
    /// activating.
    pub fn default_flood_suffix_length(&self) -> u32 {
        // Rounding up, so that a scheme width of 32 with 6 buckets is 6, not
        // 5. The +1 avoids trouble at the boundaries of reach.
        ((self.scheme_width + self.num_buckets - 1) / self.num_buckets) + 1
    }

    /// Returns true if this scheme is expected to hold single character
    /// literals.
    pub fn typically_holds_one_char_lits(&self) -> bool {
        self.stride == 1
    }
}

/// Look up a known scheme by its identifier.
///
/// The descriptor returned uses the default domain. This returns `None` if
/// no scheme has the given identifier.
pub fn get_fdr_description(id: u32) -> Option<SchemeDescriptor> {
    ALL_ENGINES
        .iter()
        .find(|def| def.id == id)
        .map(SchemeDescriptor::from_def)
}

/// Return every known scheme, ordered by identifier.
pub fn get_fdr_descriptions() -> Vec<SchemeDescriptor> {
    ALL_ENGINES.iter().map(SchemeDescriptor::from_def).collect()
}
