/*!
The boundary between the end-of-data pass and the sub-automata it drives.

How a sub-automaton executes is not this crate's business. The pass only
needs to know whether an automaton can accept at end-of-data, how to expand
its compressed stream state, how to feed it a queue of events and how to ask
it for the reports of its final state.
*/

use alloc::vec::Vec;

use crate::util::search::{Control, ReportCallback};

/// A sub-automaton driven by the end-of-data pass.
///
/// Automata are shared read only by every scan using the program that owns
/// them. All of their mutable state lives in two caller owned buffers: the
/// compressed stream state persisted between calls and the full state in the
/// scratch space of the current call.
pub trait Nfa: core::fmt::Debug + Send + Sync {
    /// Returns true if this automaton may produce a match exactly at
    /// end-of-data.
    fn accepts_eod(&self) -> bool;

    /// The number of bytes of compressed state persisted between stream
    /// writes.
    fn stream_state_len(&self) -> usize;

    /// The number of bytes of full state used while running.
    fn full_state_len(&self) -> usize;

    /// Expand the compressed `stream` state into `full`.
    ///
    /// `offset` is the absolute offset of the end of data and `key` is the
    /// last byte consumed before it, or zero when there is no such byte.
    fn expand_state(
        &self,
        full: &mut [u8],
        stream: &[u8],
        offset: u64,
        key: u8,
    );

    /// Prepare `full` for a run that starts from nothing, as when the
    /// automaton is triggered for the first time in a call.
    fn init_full_state(&self, full: &mut [u8]) {
        for b in full.iter_mut() {
            *b = 0;
        }
    }

    /// Report every match of the current state at `offset` through `cb`.
    ///
    /// This must stop and return `Control::Halt` as soon as `cb` does.
    fn check_final_state(
        &self,
        full: &[u8],
        stream: &[u8],
        offset: u64,
        cb: &mut ReportCallback<'_>,
    ) -> Control;

    /// Run the automaton over the events in `queue` without raising any
    /// match, and return whether it is still alive afterwards.
    fn queue_exec_rose(&self, queue: &Queue, full: &mut [u8]) -> bool;
}

/// The kind of an event in a queue.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EventKind {
    /// The automaton is switched on.
    Top,
    /// The input ends here.
    End,
}

/// An event in a queue, at a location relative to the start of the current
/// buffer. Locations in the history are negative.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct QueueEvent {
    /// What happens.
    pub kind: EventKind,
    /// Where it happens.
    pub loc: i64,
}

/// The events pending for one sub-automaton.
#[derive(Clone, Debug, Default)]
pub struct Queue {
    events: Vec<QueueEvent>,
}

impl Queue {
    /// Create an empty queue.
    pub fn new() -> Queue {
        Queue::default()
    }

    /// Append an event, without merging it into the previous one.
    pub fn push(&mut self, kind: EventKind, loc: i64) {
        debug_assert!(self.events.last().map_or(true, |e| e.loc <= loc));
        self.events.push(QueueEvent { kind, loc });
    }

    /// The events of this queue, in the order they were pushed.
    pub fn events(&self) -> &[QueueEvent] {
        &self.events
    }

    /// Remove every event.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
