use std::sync::Arc;

use fdr_rose::{
    fdr::Literal,
    rose::{
        EventKind, History, LiteralProgram, Pred, Role, RoseEngine, Scratch,
        SidecarTrigger, State,
    },
    Control, LiteralID, QueueID, ReportID,
};

use crate::util::{
    block_eod, eod, EodAcceptor, KeyedAcceptor, NeverEod, QueueRecorder,
};

fn lid(id: usize) -> LiteralID {
    LiteralID::must(id)
}

fn rid(id: usize) -> ReportID {
    ReportID::must(id)
}

fn report(id: usize) -> LiteralProgram {
    LiteralProgram::new().report(rid(id))
}

#[test]
fn nothing_to_do_without_end_of_data_work() {
    let mut b = RoseEngine::builder();
    b.role_states(4);
    b.add_role(Role::new(rid(1)).state(Some(0))).unwrap();
    let engine = b.build().unwrap();
    assert!(!engine.requires_eod_check());

    let mut state = State::new(&engine);
    state.role_states_mut().set(0);
    assert_eq!((Control::Continue, vec![]), eod(&engine, &mut state, b"", 9));
}

#[test]
fn beyond_max_width_nothing_is_reported() {
    let mut b = RoseEngine::builder();
    let q = b.add_nfa(EodAcceptor::new(2)).unwrap();
    b.add_literal_program(lid(0), report(1))
        .eod_event_literal(Some(lid(0)))
        .max_bi_anchored_width(Some(100));
    let engine = b.build().unwrap();

    let mut state = State::new(&engine);
    state.active_leaves_mut().set(q.as_usize());
    state.stream_state_mut(&engine, q)[0] = 1;
    let (control, got) = eod(&engine, &mut state, b"abc", 100);
    assert_eq!(Control::Continue, control);
    assert_eq!(vec![(100, 1), (100, 2)], got);

    let (control, got) = eod(&engine, &mut state, b"abc", 101);
    assert_eq!(Control::Continue, control);
    assert!(got.is_empty(), "{:?}", got);

    let mut scratch = Scratch::new(&engine);
    let (_, got) = block_eod(&engine, &mut state, &mut scratch, b"ab", 101);
    assert!(got.is_empty(), "{:?}", got);
}

#[test]
fn halt_on_first_report_stops_the_pass() {
    let mut b = RoseEngine::builder();
    b.role_states(1);
    let q = b.add_nfa(EodAcceptor::new(2)).unwrap();
    let role = b.add_role(Role::new(rid(3)).state(Some(0)).simple_pred(true));
    let role = role.unwrap();
    b.add_eod_iter_role(0, role, None)
        .add_literal_program(lid(0), report(1))
        .eod_event_literal(Some(lid(0)));
    let engine = b.build().unwrap();

    let mut state = State::new(&engine);
    state.role_states_mut().set(0);
    state.active_leaves_mut().set(q.as_usize());
    state.stream_state_mut(&engine, q)[0] = 1;

    let mut scratch = Scratch::new(&engine);
    let mut calls = vec![];
    let control = fdr_rose::rose::eod_exec(
        &engine,
        &mut state,
        &mut scratch,
        b"",
        5,
        &mut |at: u64, id: ReportID| {
            calls.push((at, id.as_usize()));
            Control::Halt
        },
    );
    assert_eq!(Control::Halt, control);
    assert_eq!(vec![(5, 1)], calls);
}

#[test]
fn streaming_expands_with_the_last_history_byte() {
    let mut b = RoseEngine::builder();
    let q = b.add_nfa(KeyedAcceptor::new(b'z', 7)).unwrap();
    let engine = b.build().unwrap();
    assert!(engine.requires_eod_check());

    let mut state = State::new(&engine);
    state.active_leaves_mut().set(q.as_usize());
    state.stream_state_mut(&engine, q)[0] = 0xFF;
    assert_eq!(vec![(50, 7)], eod(&engine, &mut state, b"xyz", 50).1);
    // Another last byte decodes to another state.
    assert!(eod(&engine, &mut state, b"xyy", 50).1.is_empty());
    // Without history the key is zero.
    assert!(eod(&engine, &mut state, b"", 50).1.is_empty());
}

#[test]
fn block_mode_uses_the_full_state_as_left_by_the_scan() {
    let mut b = RoseEngine::builder();
    let q = b.add_nfa(KeyedAcceptor::new(b'k', 7)).unwrap();
    let engine = b.build().unwrap();

    let mut state = State::new(&engine);
    state.active_leaves_mut().set(q.as_usize());
    // Expanding this would zero the state.
    state.stream_state_mut(&engine, q)[0] = 0;
    let mut scratch = Scratch::new(&engine);
    {
        let full = scratch.full_state_mut(&engine, q);
        full[0] = b'k';
        full[1..9].copy_from_slice(&30u64.to_le_bytes());
    }
    let (_, got) = block_eod(&engine, &mut state, &mut scratch, b"abc", 30);
    assert_eq!(vec![(30, 7)], got);
}

#[test]
fn sub_automata_without_end_of_data_accepts_are_skipped() {
    let mut b = RoseEngine::builder();
    let never = b.add_nfa(Arc::new(NeverEod)).unwrap();
    let q = b.add_nfa(EodAcceptor::new(4)).unwrap();
    let engine = b.build().unwrap();

    let mut state = State::new(&engine);
    state.active_leaves_mut().set(never.as_usize());
    state.active_leaves_mut().set(q.as_usize());
    state.stream_state_mut(&engine, q)[0] = 1;
    assert_eq!(vec![(12, 4)], eod(&engine, &mut state, b"ab", 12).1);

    // Inactive acceptors say nothing.
    state.active_leaves_mut().unset(q.as_usize());
    assert!(eod(&engine, &mut state, b"ab", 12).1.is_empty());
}

#[test]
fn anchored_predicate_gates_iterator_roles() {
    let mut b = RoseEngine::builder();
    b.role_states(1);
    let role = b.add_role(Role::new(rid(5)).state(Some(0))).unwrap();
    let pred = b.add_pred(Pred::new(History::Anchored { min: 4, max: 6 }));
    b.add_eod_iter_role(0, role, Some(pred.unwrap()));
    let engine = b.build().unwrap();

    let mut state = State::new(&engine);
    state.role_states_mut().set(0);
    for offset in 0..10u64 {
        let got = eod(&engine, &mut state, b"", offset).1;
        if (4..=6).contains(&offset) {
            assert_eq!(vec![(offset, 5)], got);
        } else {
            assert!(got.is_empty(), "offset {}: {:?}", offset, got);
        }
    }
}

#[test]
fn end_anchored_literals_trigger_suffixes() {
    let rec = QueueRecorder::new(30);
    let mut b = RoseEngine::builder();
    let q = b.add_nfa(rec.clone()).unwrap();
    b.add_literal_program(lid(0), LiteralProgram::new().suffix(q))
        .eod_matcher(vec![Literal::new(lid(0), "end")], 16);
    let engine = b.build().unwrap();
    assert!(engine.eod_matcher().is_some());

    // In streaming mode the locations are relative to the end of data.
    let mut state = State::new(&engine);
    assert_eq!(vec![(100, 30)], eod(&engine, &mut state, b"end of it", 100).1);
    assert_eq!(vec![(EventKind::Top, -6), (EventKind::End, 0)], rec.events());

    // In block mode they are relative to the start of the buffer.
    let mut state = State::new(&engine);
    let mut scratch = Scratch::new(&engine);
    let (_, got) =
        block_eod(&engine, &mut state, &mut scratch, b"end of it", 100);
    assert_eq!(vec![(100, 30)], got);
    assert_eq!(vec![(EventKind::Top, 3), (EventKind::End, 9)], rec.events());
    assert_eq!(2, scratch.queue(q).events().len());
}

#[test]
fn end_anchored_matcher_scans_only_its_region() {
    let build = |region: usize| {
        let mut b = RoseEngine::builder();
        b.add_literal_program(lid(0), report(1))
            .eod_matcher(vec![Literal::new(lid(0), "end")], region);
        b.build().unwrap()
    };
    let mut state = State::new(&build(4));
    assert!(eod(&build(4), &mut state, b"end of it", 9).1.is_empty());
    assert_eq!(vec![(3, 1)], eod(&build(7), &mut state, b"end of it", 9).1);
    // Less data than the shortest literal is not scanned at all.
    assert!(eod(&build(7), &mut state, b"en", 9).1.is_empty());
}

#[test]
fn delayed_literals_fire_only_when_due() {
    let mut b = RoseEngine::builder();
    b.add_literal_program(lid(0), report(5).delay(2))
        .add_literal_program(lid(1), report(6).delay(5))
        .eod_matcher(
            vec![Literal::new(lid(0), "ab"), Literal::new(lid(1), "cd")],
            64,
        );
    let engine = b.build().unwrap();

    let mut state = State::new(&engine);
    // "ab" ends at 102 and is due at 104, when "cd" ends. "cd" would be due
    // at 109, after the end of data.
    assert_eq!(vec![(104, 5)], eod(&engine, &mut state, b"abcdy", 105).1);
    // Due exactly at end-of-data.
    assert_eq!(vec![(104, 5)], eod(&engine, &mut state, b"abxy", 104).1);
    // Due one byte too late.
    assert!(eod(&engine, &mut state, b"xaby", 104).1.is_empty());
}

// There is nothing after end-of-data to wait for, so the event runs at once
// whatever its delay says.
#[test]
fn end_of_data_event_ignores_delay() {
    let mut b = RoseEngine::builder();
    b.add_literal_program(lid(0), report(9).delay(3))
        .eod_event_literal(Some(lid(0)));
    let engine = b.build().unwrap();
    let mut state = State::new(&engine);
    assert_eq!(vec![(7, 9)], eod(&engine, &mut state, b"", 7).1);

    let mut b = RoseEngine::builder();
    b.add_literal_program(lid(0), report(5))
        .add_literal_program(lid(1), report(9).delay(3))
        .eod_event_literal(Some(lid(1)))
        .eod_matcher(vec![Literal::new(lid(0), "ab")], 8);
    let engine = b.build().unwrap();
    let mut state = State::new(&engine);
    let got = eod(&engine, &mut state, b"xab", 3).1;
    assert_eq!(vec![(3, 9), (3, 5)], got);
}

#[test]
fn eod_only_programs_need_the_final_offset() {
    let mut b = RoseEngine::builder();
    b.add_literal_program(lid(0), report(3).eod_only(true))
        .eod_matcher(vec![Literal::new(lid(0), "zz")], 64);
    let engine = b.build().unwrap();
    let mut state = State::new(&engine);
    assert_eq!(vec![(5, 3)], eod(&engine, &mut state, b"zzazz", 5).1);
    assert!(eod(&engine, &mut state, b"zzazy", 5).1.is_empty());
}

#[test]
fn squashed_groups_switch_off_end_anchored_literals() {
    let build = |squash: u64| {
        let mut b = RoseEngine::builder();
        b.add_literal_program(lid(0), report(1).squash(squash))
            .eod_event_literal(Some(lid(0)))
            .add_literal_program(lid(1), report(2).groups(0b1))
            .eod_matcher(vec![Literal::new(lid(1), "x").groups(0b1)], 8);
        b.build().unwrap()
    };
    let engine = build(0);
    let mut state = State::new(&engine);
    assert_eq!(vec![(1, 1), (1, 2)], eod(&engine, &mut state, b"x", 1).1);

    let engine = build(0b1);
    let mut state = State::new(&engine);
    assert_eq!(vec![(1, 1)], eod(&engine, &mut state, b"x", 1).1);

    // Groups switched off in the stream state are off from the start.
    let engine = build(0);
    let mut state = State::new(&engine);
    state.set_groups(0b10);
    assert_eq!(vec![(1, 1)], eod(&engine, &mut state, b"x", 1).1);
}

#[test]
fn stale_last_byte_roles_are_dropped_in_block_mode() {
    let mut b = RoseEngine::builder();
    b.role_states(2);
    let fresh = Role::new(rid(1))
        .state(Some(0))
        .simple_pred(true)
        .last_byte_history(true);
    let fresh = b.add_role(fresh).unwrap();
    let plain = Role::new(rid(2)).state(Some(1)).simple_pred(true);
    let plain = b.add_role(plain).unwrap();
    b.add_eod_iter_role(0, fresh, None).add_eod_iter_role(1, plain, None);
    let engine = b.build().unwrap();

    let run = |last_end: u64| {
        let mut state = State::new(&engine);
        state.role_states_mut().set(0);
        state.role_states_mut().set(1);
        state.set_last_end_offset(last_end);
        let mut scratch = Scratch::new(&engine);
        block_eod(&engine, &mut state, &mut scratch, b"0123456789", 10).1
    };
    assert_eq!(vec![(10, 1), (10, 2)], run(10));
    assert_eq!(vec![(10, 2)], run(8));
}

#[test]
fn sidecar_catches_up_over_the_buffer() {
    let build = |catchup: bool| {
        let mut b = RoseEngine::builder();
        b.role_states(1);
        let role = Role::new(rid(4)).state(Some(0)).simple_pred(true);
        let role = b.add_role(role).unwrap();
        b.add_eod_iter_role(0, role, None)
            .add_sidecar_trigger(SidecarTrigger {
                byte: b'#',
                role,
                groups: 0b1,
            })
            .requires_eod_side_catchup(catchup);
        b.build().unwrap()
    };
    let run = |engine: &RoseEngine, groups: u64, buf: &[u8]| {
        let mut state = State::new(engine);
        state.set_groups(groups);
        let mut scratch = Scratch::new(engine);
        block_eod(engine, &mut state, &mut scratch, buf, 20).1
    };

    let engine = build(true);
    assert_eq!(vec![(20, 4)], run(&engine, !0, b"ab#cd"));
    assert!(run(&engine, !0, b"abcd").is_empty());
    // A trigger whose groups are off does not fire.
    assert!(run(&engine, 0b10, b"ab#cd").is_empty());
    // Without catch up the sidecar is left alone.
    assert!(run(&build(false), !0, b"ab#cd").is_empty());
}

#[test]
fn scratch_can_be_reused_and_reset() {
    let mut b = RoseEngine::builder();
    let q = b.add_nfa(EodAcceptor::new(2)).unwrap();
    let small = b.build().unwrap();
    b.add_nfa(EodAcceptor::new(3)).unwrap();
    let big = b.build().unwrap();

    let mut scratch = Scratch::new(&small);
    let mut state = State::new(&small);
    state.active_leaves_mut().set(q.as_usize());
    state.stream_state_mut(&small, q)[0] = 1;
    for _ in 0..3 {
        let mut got = vec![];
        fdr_rose::rose::eod_exec(
            &small,
            &mut state,
            &mut scratch,
            b"a",
            1,
            &mut |at: u64, id: ReportID| {
                got.push((at, id.as_usize()));
                Control::Continue
            },
        );
        assert_eq!(vec![(1, 2)], got);
    }

    scratch.reset(&big);
    let q1 = QueueID::must(1);
    assert_eq!(1, scratch.full_state(&big, q1).len());
    assert!(scratch.memory_usage() > 0);
    assert!(State::new(&big).memory_usage() >= 2);
}

#[test]
fn build_errors() {
    let msg = |b: &fdr_rose::rose::Builder| b.build().unwrap_err().to_string();

    let mut b = RoseEngine::builder();
    b.role_states(1);
    b.add_role(Role::new(rid(0)).state(Some(3))).unwrap();
    assert!(msg(&b).contains("role state 3"), "{}", msg(&b));

    let mut b = RoseEngine::builder();
    b.eod_event_literal(Some(lid(4)));
    assert!(msg(&b).contains("literal 4 has no program"), "{}", msg(&b));

    let mut b = RoseEngine::builder();
    let role = b.add_role(Role::new(rid(0))).unwrap();
    b.add_literal_program(lid(0), LiteralProgram::new().role(role));
    assert!(msg(&b).contains("no state"), "{}", msg(&b));

    let mut b = RoseEngine::builder();
    b.role_states(1);
    let role = b.add_role(Role::new(rid(0)).state(Some(0))).unwrap();
    b.add_eod_iter_role(0, role, None);
    assert!(msg(&b).contains("needs a predicate"), "{}", msg(&b));

    let mut b = RoseEngine::builder();
    b.add_literal_program(
        lid(0),
        LiteralProgram::new().suffix(QueueID::must(3)),
    );
    assert!(msg(&b).contains("queue 3"), "{}", msg(&b));

    let mut b = RoseEngine::builder();
    b.role_states(1);
    let role = b.add_role(Role::new(rid(0)).state(Some(0))).unwrap();
    for &byte in b"abcd" {
        b.add_sidecar_trigger(SidecarTrigger { byte, role, groups: 1 });
    }
    assert!(msg(&b).contains("at most 3"), "{}", msg(&b));

    let mut b = RoseEngine::builder();
    b.add_literal_program(lid(0), report(0))
        .eod_matcher(vec![Literal::new(lid(0), "a")], 0);
    assert!(msg(&b).contains("non-empty region"), "{}", msg(&b));

    let mut b = RoseEngine::builder();
    b.eod_matcher(vec![], 8);
    let err = b.build().unwrap_err();
    assert!(std::error::Error::source(&err).is_some());
}
