use fdr_rose::{
    fdr::Literal,
    rose::{
        self, EventKind, History, LiteralProgram, Pred, Role, RoseEngine,
        Scratch, State,
    },
    Control, LiteralID, ReportID,
};

use crate::util::{eod, EodAcceptor, QueueRecorder};

fn lid(id: usize) -> LiteralID {
    LiteralID::must(id)
}

fn rid(id: usize) -> ReportID {
    ReportID::must(id)
}

#[test]
fn a_role_reachable_from_many_states_fires_once() {
    let mut b = RoseEngine::builder();
    b.role_states(3);
    let shared = Role::new(rid(1)).state(Some(0)).simple_pred(true);
    let shared = b.add_role(shared).unwrap();
    let other = Role::new(rid(2)).state(Some(1)).simple_pred(true);
    let other = b.add_role(other).unwrap();
    b.add_eod_iter_role(0, shared, None)
        .add_eod_iter_role(1, shared, None)
        .add_eod_iter_role(1, other, None)
        .add_eod_iter_role(2, shared, None);
    let engine = b.build().unwrap();

    let mut state = State::new(&engine);
    for bit in 0..3 {
        state.role_states_mut().set(bit);
    }
    assert_eq!(vec![(7, 1), (7, 2)], eod(&engine, &mut state, b"", 7).1);

    // Only the last key on: still reachable.
    let mut state = State::new(&engine);
    state.role_states_mut().set(2);
    assert_eq!(vec![(7, 1)], eod(&engine, &mut state, b"", 7).1);
}

// A role switched on again by an end-anchored literal fires in the second
// walk too. Each walk fires a role at most once.
#[test]
fn each_walk_fires_a_role_at_most_once() {
    let mut b = RoseEngine::builder();
    b.role_states(1);
    let role = Role::new(rid(1)).state(Some(0)).simple_pred(true);
    let role = b.add_role(role).unwrap();
    b.add_eod_iter_role(0, role, None)
        .add_literal_program(lid(0), LiteralProgram::new().role(role))
        .eod_matcher(vec![Literal::new(lid(0), "a")], 8);
    let engine = b.build().unwrap();

    let mut state = State::new(&engine);
    state.role_states_mut().set(0);
    assert_eq!(vec![(4, 1), (4, 1)], eod(&engine, &mut state, b"aaaa", 4).1);
    assert_eq!(vec![(4, 1)], eod(&engine, &mut state, b"bbbb", 4).1);
}

// Every step runs in a fixed order: the end-of-data event, sub-automata
// accepting at the end, the iterator, the end-anchored literals, the
// iterator again and the suffixes they triggered.
#[test]
fn steps_run_in_order() {
    let rec = QueueRecorder::new(30);
    let mut b = RoseEngine::builder();
    b.role_states(2);
    let acceptor = b.add_nfa(EodAcceptor::new(20)).unwrap();
    let suffix = b.add_nfa(rec.clone()).unwrap();
    let first = Role::new(rid(11)).state(Some(0)).simple_pred(true);
    let first = b.add_role(first).unwrap();
    let second = b.add_role(Role::new(rid(12)).state(Some(1))).unwrap();
    let pred = b.add_pred(Pred::new(History::Anchored { min: 0, max: 500 }));
    b.add_eod_iter_role(0, first, None)
        .add_eod_iter_role(1, second, Some(pred.unwrap()))
        .add_literal_program(lid(0), LiteralProgram::new().report(rid(10)))
        .eod_event_literal(Some(lid(0)))
        .add_literal_program(
            lid(1),
            LiteralProgram::new().report(rid(13)).role(first),
        )
        .add_literal_program(
            lid(2),
            LiteralProgram::new().report(rid(14)).suffix(suffix),
        )
        .eod_matcher(
            vec![Literal::new(lid(1), "ab"), Literal::new(lid(2), "cd")],
            64,
        );
    let engine = b.build().unwrap();

    let mut state = State::new(&engine);
    state.role_states_mut().set(0);
    state.role_states_mut().set(1);
    state.active_leaves_mut().set(acceptor.as_usize());
    state.stream_state_mut(&engine, acceptor)[0] = 1;

    let (control, got) = eod(&engine, &mut state, b"xxabxcdx", 108);
    assert_eq!(Control::Continue, control);
    let want = vec![
        (108, 10),
        (108, 20),
        (108, 11),
        (108, 12),
        (104, 13),
        (107, 14),
        (108, 11),
        (108, 30),
    ];
    assert_eq!(want, got);
    assert_eq!(vec![(EventKind::Top, -1), (EventKind::End, 0)], rec.events());
}

#[test]
fn halting_mid_walk_stops_everything() {
    let mut b = RoseEngine::builder();
    b.role_states(3);
    for i in 0..3 {
        let role = Role::new(rid(i)).state(Some(i)).simple_pred(true);
        let role = b.add_role(role).unwrap();
        b.add_eod_iter_role(i, role, None);
    }
    b.add_literal_program(lid(0), LiteralProgram::new().report(rid(9)))
        .eod_matcher(vec![Literal::new(lid(0), "z")], 8);
    let engine = b.build().unwrap();

    let mut state = State::new(&engine);
    for i in 0..3 {
        state.role_states_mut().set(i);
    }
    let mut scratch = Scratch::new(&engine);
    let mut got = vec![];
    let control = rose::eod_exec(
        &engine,
        &mut state,
        &mut scratch,
        b"zzz",
        3,
        &mut |_: u64, id: ReportID| {
            got.push(id.as_usize());
            if id.as_usize() == 1 {
                Control::Halt
            } else {
                Control::Continue
            }
        },
    );
    assert_eq!(Control::Halt, control);
    assert_eq!(vec![0, 1], got);
}

#[test]
fn halting_in_the_matcher_drops_pending_work() {
    let mut b = RoseEngine::builder();
    b.add_literal_program(lid(0), LiteralProgram::new().report(rid(1)))
        .add_literal_program(
            lid(1),
            LiteralProgram::new().report(rid(2)).delay(1),
        )
        .eod_matcher(
            vec![Literal::new(lid(0), "a"), Literal::new(lid(1), "b")],
            8,
        );
    let engine = b.build().unwrap();

    let mut state = State::new(&engine);
    let mut scratch = Scratch::new(&engine);
    let mut got = vec![];
    let control = rose::eod_exec(
        &engine,
        &mut state,
        &mut scratch,
        b"ba",
        2,
        &mut |at: u64, id: ReportID| {
            got.push((at, id.as_usize()));
            Control::Halt
        },
    );
    assert_eq!(Control::Halt, control);
    // The delayed "b" is due at 2 and runs before "a" ending there.
    assert_eq!(vec![(2, 2)], got);

    // With nothing halting, the same input reports both.
    let (_, got) = eod(&engine, &mut state, b"ba", 2);
    assert_eq!(vec![(2, 2), (2, 1)], got);
}

#[test]
fn offsets_never_decrease_within_the_matcher() {
    let mut b = RoseEngine::builder();
    let lits: Vec<Literal> = ["ab", "b", "abc", "c", "bc"]
        .iter()
        .enumerate()
        .map(|(i, s)| Literal::new(lid(i), s))
        .collect();
    for lit in lits.iter() {
        let program = LiteralProgram::new().report(rid(lit.id().as_usize()));
        b.add_literal_program(lit.id(), program);
    }
    b.eod_matcher(lits, 64);
    let engine = b.build().unwrap();

    let mut state = State::new(&engine);
    let (_, got) = eod(&engine, &mut state, b"abcabcab", 1008);
    assert!(!got.is_empty());
    for pair in got.windows(2) {
        assert!(pair[0] <= pair[1], "{:?}", got);
    }
    assert_eq!((1002, 0), got[0]);
}
