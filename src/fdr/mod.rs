/*!
A table driven multi-literal matcher.

The matcher hashes every pair of adjacent bytes into a table of words, where
each word holds one bit per (bucket, position) pair. Literals are spread over
a small number of buckets, and a scan shifts and ORs table words into a
running state to find positions where some literal of some bucket may end.
Those candidates are then confirmed exactly.

Building a table happens in three steps:

1. A [`SchemeDescriptor`] is chosen for the literal set and the target CPU,
either by [`choose_engine`] or by forcing one with [`Config::engine`].
2. The primary table, the confirm region and the flood region are computed.
3. Everything is written into one [`PackedLiteralTable`] arena, which may be
serialized with `to_bytes_*` and loaded again without copying with
[`PackedLiteralTable::from_bytes`].

# Example

```
use fdr_rose::{
    fdr::{self, Literal, RuntimeArgs},
    Control, LiteralID,
};

let lits = vec![
    Literal::new(LiteralID::must(0), "foo"),
    Literal::new(LiteralID::must(1), "BAR").nocase(true),
];
let table = fdr::Builder::new().build(&lits)?;

let mut matches = vec![];
table.scan(
    &RuntimeArgs::new(b"foo bar"),
    &mut |end: usize, id: LiteralID| {
        matches.push((end, id.as_usize()));
        Control::Continue
    },
);
assert_eq!(vec![(3, 0), (7, 1)], matches);

# Ok::<(), Box<dyn std::error::Error>>(())
```
*/

pub use self::{
    engine::{
        get_fdr_description, get_fdr_descriptions, CpuFeatures,
        SchemeDescriptor, DEFAULT_DOMAIN, MAX_DOMAIN, MIN_DOMAIN,
    },
    error::BuildError,
    flood::{FloodEntry, FloodRecord},
    literal::Literal,
    scan::{LiteralSink, RuntimeArgs},
    select::{choose_engine, estimate_cost},
    table::{Builder, Config, PackedLiteralTable, SchemeWord},
};

mod confirm;
mod engine;
mod error;
mod flood;
mod literal;
mod scan;
mod select;
mod table;

/// The maximum number of literals a flood record holds.
pub const FDR_FLOOD_MAX_IDS: usize = 16;
