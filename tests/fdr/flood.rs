use fdr_rose::{
    fdr::{self, FloodEntry, FloodRecord, Literal, RuntimeArgs},
    Control, LiteralID, ALL_GROUPS,
};

use crate::util::{naive, scan, table};

fn lit(id: usize, bytes: &str) -> Literal {
    Literal::new(LiteralID::must(id), bytes)
}

fn entry(id: usize, len: u32, groups: u64) -> FloodEntry {
    FloodEntry { id: LiteralID::must(id), groups, len }
}

fn ids(rec: &FloodRecord, run_len: usize, groups: u64) -> Vec<usize> {
    rec.matches(run_len, groups).map(|id| id.as_usize()).collect()
}

#[test]
fn record_matches_by_run_length() {
    let mut rec = FloodRecord::new(8);
    assert!(rec.push(entry(1, 1, 0b01)));
    assert!(rec.push(entry(2, 3, 0b10)));
    assert!(rec.push(entry(2, 5, 0b10)));
    assert!(rec.push(entry(4, 2, 0b01)));

    assert_eq!(0b11, rec.all_groups());
    assert_eq!(8, rec.suffix());
    assert_eq!(4, rec.id_count());

    assert_eq!(Vec::<usize>::new(), ids(&rec, 0, ALL_GROUPS));
    assert_eq!(vec![1], ids(&rec, 1, ALL_GROUPS));
    assert_eq!(vec![1, 4], ids(&rec, 2, ALL_GROUPS));
    // Id 2 is listed twice but reported once.
    assert_eq!(vec![1, 2, 4], ids(&rec, 5, ALL_GROUPS));
    assert_eq!(vec![2], ids(&rec, 100, 0b10));
    assert_eq!(Vec::<usize>::new(), ids(&rec, 100, 0));
}

#[test]
fn record_holds_a_bounded_number_of_entries() {
    let mut rec = FloodRecord::new(1);
    for i in 0..fdr::FDR_FLOOD_MAX_IDS {
        assert!(rec.push(entry(i, 1, 1)));
    }
    assert!(!rec.push(entry(99, 1, 1)));
    assert_eq!(fdr::FDR_FLOOD_MAX_IDS, rec.id_count());
}

#[test]
fn table_records_only_runs() {
    let lits = vec![
        lit(0, "aaa"),
        lit(1, "a"),
        lit(2, "ab"),
        lit(3, "B").nocase(true),
    ];
    let table = table(&lits, None);

    let rec = table.flood_record(b'a').unwrap();
    let got: Vec<(usize, u32)> =
        rec.entries().iter().map(|e| (e.id.as_usize(), e.len)).collect();
    assert_eq!(vec![(0, 3), (1, 1)], got);
    assert!(rec.suffix() >= 3);

    let lower = table.flood_record(b'b').unwrap();
    let upper = table.flood_record(b'B').unwrap();
    assert_eq!(lower, upper);
    assert!(table.flood_record(b'z').is_none());
}

#[test]
fn table_skips_bytes_with_too_many_runs() {
    let lits: Vec<Literal> = (0..=fdr::FDR_FLOOD_MAX_IDS)
        .map(|i| lit(i, &"x".repeat(i + 1)))
        .collect();
    let table = table(&lits, None);
    assert!(table.flood_record(b'x').is_none());

    // The normal path still finds everything.
    let hay = "x".repeat(60);
    assert_eq!(
        naive(&lits, b"", hay.as_bytes()),
        scan(&table, b"", hay.as_bytes())
    );
}

// Runs whose length sits on either side of the suffix threshold behave the
// same as a byte at a time scan.
#[test]
fn runs_around_the_suffix_length() {
    let lits = vec![lit(0, "a"), lit(1, "aaaa"), lit(2, "ba"), lit(3, "ab")];
    for desc in fdr::get_fdr_descriptions() {
        let table = table(&lits, Some(desc.id()));
        let suffix = table.flood_record(b'a').unwrap().suffix() as usize;
        let lens = [0, 1, suffix - 1, suffix, suffix + 1, 10_000];
        for &len in lens.iter() {
            let hay = format!("xb{}bx", "a".repeat(len));
            let got = scan(&table, b"", hay.as_bytes());
            assert_eq!(
                naive(&lits, b"", hay.as_bytes()),
                got,
                "scheme {} run {}",
                desc.id(),
                len,
            );
        }
    }
}

#[test]
fn runs_split_by_history() {
    let lits = vec![lit(0, "aaa"), lit(1, "aab")];
    let table = table(&lits, None);
    let history = "a".repeat(40);
    let buf = format!("{}b", "a".repeat(300));
    assert_eq!(
        naive(&lits, history.as_bytes(), buf.as_bytes()),
        scan(&table, history.as_bytes(), buf.as_bytes())
    );
}

#[test]
fn flood_respects_groups_and_halt() {
    let lits = vec![lit(0, "zz").groups(0b01), lit(1, "z").groups(0b10)];
    let table = table(&lits, None);
    let hay = "z".repeat(500);

    struct OnlyFirst {
        got: Vec<(usize, usize)>,
    }

    impl fdr::LiteralSink for OnlyFirst {
        fn on_match(&mut self, end: usize, id: LiteralID) -> Control {
            self.got.push((end, id.as_usize()));
            Control::Continue
        }

        fn groups(&self) -> u64 {
            0b01
        }
    }

    let mut sink = OnlyFirst { got: vec![] };
    table.scan(&RuntimeArgs::new(hay.as_bytes()), &mut sink);
    let want: Vec<(usize, usize)> = (2..=500).map(|end| (end, 0)).collect();
    assert_eq!(want, sink.got);

    let mut calls = 0;
    let control = table.scan(
        &RuntimeArgs::new(hay.as_bytes()),
        &mut |end: usize, _: LiteralID| {
            calls += 1;
            if end == 300 {
                Control::Halt
            } else {
                Control::Continue
            }
        },
    );
    assert_eq!(Control::Halt, control);
    // Ends 1 through 299 report both literals except at 1, then id 0 halts.
    assert_eq!(1 + 298 * 2 + 1, calls);
}

#[test]
fn first_flood_detect_does_not_change_results() {
    let lits = vec![lit(0, "qq"), lit(1, "q")];
    let table = table(&lits, None);
    let hay = "q".repeat(200);
    let mut got = vec![];
    table.scan(
        &RuntimeArgs::new(hay.as_bytes()).first_flood_detect(150),
        &mut |end: usize, id: LiteralID| {
            got.push((end, id.as_usize()));
            Control::Continue
        },
    );
    assert_eq!(naive(&lits, b"", hay.as_bytes()), got);
}
