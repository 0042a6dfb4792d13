use std::sync::Arc;

use bstr::ByteSlice;

use fdr_rose::{
    fdr::{self, Literal, RuntimeArgs},
    rose::{self, EventKind, Nfa, Queue, RoseEngine, Scratch, State},
    Control, LiteralID, ReportCallback, ReportID, ALL_GROUPS,
};

/// Build a table for the given literals, forcing a scheme when one is given.
pub fn table(
    lits: &[Literal],
    engine: Option<u32>,
) -> fdr::PackedLiteralTable<Vec<u8>> {
    fdr::Builder::new()
        .configure(fdr::Config::new().engine(engine))
        .build(lits)
        .unwrap()
}

/// Scan `buf` after `history` and collect every (end, id) pair.
pub fn scan<T: AsRef<[u8]>>(
    table: &fdr::PackedLiteralTable<T>,
    history: &[u8],
    buf: &[u8],
) -> Vec<(usize, usize)> {
    let mut got = vec![];
    let args = RuntimeArgs::new(buf).history(history).history_nocase(history);
    table.scan(&args, &mut |end: usize, id: LiteralID| {
        got.push((end, id.as_usize()));
        Control::Continue
    });
    got
}

/// The matches a byte at a time scan of `history` followed by `buf` would
/// report: every literal ending inside `buf`, ordered by end and then id.
pub fn naive(
    lits: &[Literal],
    history: &[u8],
    buf: &[u8],
) -> Vec<(usize, usize)> {
    let hay = [history, buf].concat();
    let mut sorted: Vec<&Literal> = lits.iter().collect();
    sorted.sort_by_key(|lit| lit.id());
    let mut got = vec![];
    for end in history.len() + 1..=hay.len() {
        let mut last = None;
        for lit in sorted.iter() {
            if lit.len() > end || lit.group_mask() & ALL_GROUPS == 0 {
                continue;
            }
            if !lit.matches(&hay[end - lit.len()..end]) {
                continue;
            }
            if last == Some(lit.id()) {
                continue;
            }
            last = Some(lit.id());
            got.push((end - history.len(), lit.id().as_usize()));
        }
    }
    got
}

/// Render matches with the text they cover, for readable failures.
pub fn show(hay: &[u8], lits: &[Literal], got: &[(usize, usize)]) -> String {
    let mut out = String::new();
    for &(end, id) in got {
        let len = lits
            .iter()
            .find(|lit| lit.id().as_usize() == id)
            .map_or(0, |lit| lit.len());
        let start = end.saturating_sub(len);
        out.push_str(&format!(
            "{}..{} {} {:?}\n",
            start,
            end,
            id,
            hay[start..end].as_bstr()
        ));
    }
    out
}

/// Run the streaming end-of-data pass with fresh scratch space and collect
/// every (offset, report) pair.
pub fn eod(
    engine: &RoseEngine,
    state: &mut State,
    history: &[u8],
    offset: u64,
) -> (Control, Vec<(u64, usize)>) {
    let mut scratch = Scratch::new(engine);
    let mut got = vec![];
    let control = rose::eod_exec(
        engine,
        state,
        &mut scratch,
        history,
        offset,
        &mut |at: u64, id: ReportID| {
            got.push((at, id.as_usize()));
            Control::Continue
        },
    );
    (control, got)
}

/// Run the block-mode end-of-data pass over `buf` and collect every
/// (offset, report) pair.
pub fn block_eod(
    engine: &RoseEngine,
    state: &mut State,
    scratch: &mut Scratch,
    buf: &[u8],
    offset: u64,
) -> (Control, Vec<(u64, usize)>) {
    let mut got = vec![];
    let control = rose::block_eod_exec(
        engine,
        state,
        scratch,
        buf,
        offset,
        &mut |at: u64, id: ReportID| {
            got.push((at, id.as_usize()));
            Control::Continue
        },
    );
    (control, got)
}

/// A sub-automaton that accepts at end-of-data while the first byte of its
/// full state is set. Being triggered sets it.
#[derive(Debug)]
pub struct EodAcceptor {
    pub report: ReportID,
}

impl EodAcceptor {
    pub fn new(report: usize) -> Arc<EodAcceptor> {
        Arc::new(EodAcceptor { report: ReportID::must(report) })
    }
}

impl Nfa for EodAcceptor {
    fn accepts_eod(&self) -> bool {
        true
    }

    fn stream_state_len(&self) -> usize {
        1
    }

    fn full_state_len(&self) -> usize {
        1
    }

    fn expand_state(
        &self,
        full: &mut [u8],
        stream: &[u8],
        _offset: u64,
        _key: u8,
    ) {
        full[0] = stream[0];
    }

    fn check_final_state(
        &self,
        full: &[u8],
        _stream: &[u8],
        offset: u64,
        cb: &mut ReportCallback<'_>,
    ) -> Control {
        if full[0] == 0 {
            return Control::Continue;
        }
        cb(offset, self.report)
    }

    fn queue_exec_rose(&self, queue: &Queue, full: &mut [u8]) -> bool {
        if queue.events().iter().any(|e| e.kind == EventKind::Top) {
            full[0] = 1;
        }
        full[0] != 0
    }
}

/// A sub-automaton that never accepts at end-of-data.
#[derive(Debug)]
pub struct NeverEod;

impl Nfa for NeverEod {
    fn accepts_eod(&self) -> bool {
        false
    }

    fn stream_state_len(&self) -> usize {
        0
    }

    fn full_state_len(&self) -> usize {
        0
    }

    fn expand_state(&self, _: &mut [u8], _: &[u8], _: u64, _: u8) {
        panic!("never expanded")
    }

    fn check_final_state(
        &self,
        _: &[u8],
        _: &[u8],
        _: u64,
        _: &mut ReportCallback<'_>,
    ) -> Control {
        panic!("never checked")
    }

    fn queue_exec_rose(&self, _: &Queue, _: &mut [u8]) -> bool {
        panic!("never run")
    }
}

/// A sub-automaton whose expansion records the decode key and the offset it
/// was given, and that reports only when the key matches `want`.
#[derive(Debug)]
pub struct KeyedAcceptor {
    pub want: u8,
    pub report: ReportID,
}

impl KeyedAcceptor {
    pub fn new(want: u8, report: usize) -> Arc<KeyedAcceptor> {
        Arc::new(KeyedAcceptor { want, report: ReportID::must(report) })
    }
}

impl Nfa for KeyedAcceptor {
    fn accepts_eod(&self) -> bool {
        true
    }

    fn stream_state_len(&self) -> usize {
        1
    }

    fn full_state_len(&self) -> usize {
        9
    }

    fn expand_state(
        &self,
        full: &mut [u8],
        stream: &[u8],
        offset: u64,
        key: u8,
    ) {
        full[0] = key & stream[0];
        full[1..9].copy_from_slice(&offset.to_le_bytes());
    }

    fn check_final_state(
        &self,
        full: &[u8],
        _stream: &[u8],
        offset: u64,
        cb: &mut ReportCallback<'_>,
    ) -> Control {
        let mut at = [0; 8];
        at.copy_from_slice(&full[1..9]);
        if full[0] != self.want || u64::from_le_bytes(at) != offset {
            return Control::Continue;
        }
        cb(offset, self.report)
    }

    fn queue_exec_rose(&self, _: &Queue, _: &mut [u8]) -> bool {
        false
    }
}

/// A sub-automaton that records the queue it was last run over and stays
/// alive only if that queue switched it on.
#[derive(Debug)]
pub struct QueueRecorder {
    pub report: ReportID,
    pub events: std::sync::Mutex<Vec<(EventKind, i64)>>,
}

impl QueueRecorder {
    pub fn new(report: usize) -> Arc<QueueRecorder> {
        Arc::new(QueueRecorder {
            report: ReportID::must(report),
            events: std::sync::Mutex::new(vec![]),
        })
    }

    pub fn events(&self) -> Vec<(EventKind, i64)> {
        self.events.lock().unwrap().clone()
    }
}

impl Nfa for QueueRecorder {
    fn accepts_eod(&self) -> bool {
        true
    }

    fn stream_state_len(&self) -> usize {
        0
    }

    fn full_state_len(&self) -> usize {
        1
    }

    fn expand_state(&self, full: &mut [u8], _: &[u8], _: u64, _: u8) {
        full[0] = 0;
    }

    fn check_final_state(
        &self,
        full: &[u8],
        _: &[u8],
        offset: u64,
        cb: &mut ReportCallback<'_>,
    ) -> Control {
        if full[0] == 0 {
            return Control::Continue;
        }
        cb(offset, self.report)
    }

    fn queue_exec_rose(&self, queue: &Queue, full: &mut [u8]) -> bool {
        let events: Vec<(EventKind, i64)> =
            queue.events().iter().map(|e| (e.kind, e.loc)).collect();
        full[0] = events.iter().any(|e| e.0 == EventKind::Top) as u8;
        *self.events.lock().unwrap() = events;
        full[0] != 0
    }
}
