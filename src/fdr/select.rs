/*!
Selection of the scheme best suited to a literal set.

Every known scheme that can run on the target is paired with every hashing
domain, and each pair is given an estimated cost of scanning 1KB of input.
The estimate adds up the cost of table probes, the cost of confirming false
positive candidates and the cost of the memory the table occupies. When a
small table is requested, the table size dominates every other consideration,
which guarantees that a small build is never bigger than a normal one.
*/

use core::cmp;

use crate::fdr::{
    engine::{
        get_fdr_descriptions, CpuFeatures, SchemeDescriptor, MAX_DOMAIN,
        MIN_DOMAIN,
    },
    error::BuildError,
    literal::Literal,
};

// Added to the cost of schemes whose stride exceeds the shortest literal.
// Such schemes still work, but every probe window holds positions that no
// literal can discriminate.
const STRIDE_PENALTY: u64 = 1 << 30;

/// Pick the best scheme for the given literals on the given target.
///
/// The descriptor returned has its domain set. This fails only when the
/// literal set is empty, a literal is empty, or no scheme runs on the target.
pub fn choose_engine(
    target: CpuFeatures,
    literals: &[Literal],
    make_small: bool,
) -> Result<SchemeDescriptor, BuildError> {
    if literals.is_empty() {
        return Err(BuildError::empty_literal_set());
    }
    if let Some(lit) = literals.iter().find(|lit| lit.is_empty()) {
        return Err(BuildError::empty_literal(lit.id()));
    }
    let stats = LiteralStats::new(literals);

    let mut best: Option<(Rank, SchemeDescriptor)> = None;
    for desc in get_fdr_descriptions() {
        if !desc.is_valid_on_target(target) {
            continue;
        }
        for domain in MIN_DOMAIN..=MAX_DOMAIN {
            let candidate = desc.with_bits(domain);
            let rank = Rank::new(&candidate, &stats, make_small);
            let better = match best {
                None => true,
                Some((ref best_rank, _)) => rank < *best_rank,
            };
            if better {
                best = Some((rank, candidate));
            }
        }
    }
    match best {
        None => {
            debug!("no literal scheme runs on target {:?}", target);
            Err(BuildError::no_viable_engine())
        }
        Some((_rank, desc)) => {
            debug!(
                "chose literal scheme {} (width={}, buckets={}, stride={}, \
                 bits={}) for {} literals, cost={}, small={}",
                desc.id(),
                desc.scheme_width(),
                desc.num_buckets(),
                desc.stride(),
                desc.bits(),
                literals.len(),
                _rank.cost,
                make_small,
            );
            Ok(desc)
        }
    }
}

/// The estimated cost of scanning 1KB of input with the given scheme.
pub fn estimate_cost(desc: &SchemeDescriptor, literals: &[Literal]) -> u64 {
    cost(desc, &LiteralStats::new(literals))
}

#[derive(Clone, Copy, Debug)]
struct LiteralStats {
    count: u64,
    min_len: u64,
}

impl LiteralStats {
    fn new(literals: &[Literal]) -> LiteralStats {
        let min_len =
            literals.iter().map(|lit| lit.len()).min().unwrap_or(1) as u64;
        LiteralStats { count: literals.len() as u64, min_len }
    }
}

/// A lexicographic ranking of candidates. Lower is better.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
struct Rank {
    primary: u64,
    secondary: u64,
    id: u32,
    cost: u64,
}

impl Rank {
    fn new(
        desc: &SchemeDescriptor,
        stats: &LiteralStats,
        make_small: bool,
    ) -> Rank {
        let cost = cost(desc, stats);
        let size = u64::from(desc.tab_size_bytes());
        if make_small {
            Rank { primary: size, secondary: cost, id: desc.id(), cost }
        } else {
            Rank { primary: cost, secondary: size, id: desc.id(), cost }
        }
    }
}

fn cost(desc: &SchemeDescriptor, stats: &LiteralStats) -> u64 {
    let stride = u64::from(desc.stride());
    let buckets = u64::from(desc.num_buckets());
    let bucket_width = u64::from(desc.bucket_width(0));

    // Wider words cost a bit more per probe, while a bigger stride needs
    // proportionally fewer probes.
    let word_cost = match desc.scheme_width() {
        32 | 64 => 2,
        _ => 3,
    };
    let probe_cost = 1024 * word_cost / stride;

    // Every literal in a bucket clears its bits once per alignment, so the
    // chance that one probe flags a bucket grows with the bucket load and the
    // stride and shrinks with the table domain. Each additional byte of
    // window that a bucket can discriminate divides that chance further.
    let per_bucket = (stats.count + buckets - 1) / buckets;
    let occupancy = per_bucket * stride;
    let window = cmp::max(1, cmp::min(stats.min_len, bucket_width / stride));
    let shift = cmp::min(20, 4 * (window - 1));
    let flagged = ((occupancy << 20) >> desc.bits()) >> shift;
    let confirm_cost = (flagged * buckets * 1024) >> 20;

    // Unused buckets make the table no more selective, only bigger.
    let memory_cost = u64::from(desc.tab_size_bytes()) / 64;

    let penalty = if stride > stats.min_len { STRIDE_PENALTY } else { 0 };
    probe_cost + confirm_cost + memory_cost + penalty
}
