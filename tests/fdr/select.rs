use quickcheck::{quickcheck, TestResult};

use fdr_rose::{
    fdr::{self, choose_engine, CpuFeatures, Literal},
    LiteralID,
};

fn lits(strs: &[&str]) -> Vec<Literal> {
    strs.iter()
        .enumerate()
        .map(|(i, s)| Literal::new(LiteralID::must(i), s))
        .collect()
}

#[test]
fn empty_sets_are_rejected() {
    assert!(choose_engine(CpuFeatures::ALL, &[], false).is_err());
    let err = choose_engine(CpuFeatures::ALL, &lits(&["a", ""]), false)
        .unwrap_err();
    assert!(err.to_string().contains("1"), "{}", err);
}

#[test]
fn plain_target_never_picks_simd_schemes() {
    let sets: Vec<Vec<Literal>> = vec![
        lits(&["a"]),
        lits(&["foobar", "quux", "bazbazbaz"]),
        (0..200)
            .map(|i| Literal::new(LiteralID::must(i), format!("{:08}", i)))
            .collect(),
    ];
    for set in sets.iter() {
        let desc = choose_engine(CpuFeatures::NONE, set, false).unwrap();
        assert_eq!(CpuFeatures::NONE, desc.cpu_features());
        assert!(desc.id() <= 6, "picked {}", desc.id());
        let small = choose_engine(CpuFeatures::NONE, set, true).unwrap();
        assert!(small.id() <= 6, "picked {}", small.id());
    }
}

#[test]
fn chosen_scheme_is_within_limits() {
    let set = lits(&["abc", "xyz", "hello world"]);
    let desc = choose_engine(CpuFeatures::ALL, &set, false).unwrap();
    assert!(desc.bits() >= fdr::MIN_DOMAIN && desc.bits() <= fdr::MAX_DOMAIN);
    assert!(desc.is_valid_on_target(CpuFeatures::ALL));
    for other in fdr::get_fdr_descriptions() {
        if !other.is_valid_on_target(CpuFeatures::ALL) {
            continue;
        }
        for bits in fdr::MIN_DOMAIN..=fdr::MAX_DOMAIN {
            let other = other.with_bits(bits);
            assert!(
                fdr::estimate_cost(&desc, &set)
                    <= fdr::estimate_cost(&other, &set),
                "{} beats the chosen {}",
                other.id(),
                desc.id(),
            );
        }
    }
}

#[test]
fn single_byte_literals_prefer_unit_stride() {
    let set = lits(&["a", "b", "c"]);
    let desc = choose_engine(CpuFeatures::ALL, &set, false).unwrap();
    assert_eq!(1, desc.stride());
    assert!(desc.typically_holds_one_char_lits());
}

quickcheck! {
    fn prop_small_is_never_bigger(
        raw: Vec<Vec<u8>>,
        features: u8
    ) -> TestResult {
        let set: Vec<Literal> = raw
            .into_iter()
            .filter(|b| !b.is_empty())
            .take(64)
            .enumerate()
            .map(|(i, b)| Literal::new(LiteralID::must(i), b))
            .collect();
        if set.is_empty() {
            return TestResult::discard();
        }
        let target = CpuFeatures::from_bits(u64::from(features % 4));
        let normal = choose_engine(target, &set, false).unwrap();
        let small = choose_engine(target, &set, true).unwrap();
        TestResult::from_bool(
            small.tab_size_bytes() <= normal.tab_size_bytes()
        )
    }
}
