use alloc::{vec, vec::Vec};

use crate::{
    rose::{
        nfa::{Queue, QueueEvent},
        program::RoseEngine,
    },
    util::{
        multibit::Multibit,
        primitives::{LiteralID, QueueID},
        search::GroupMask,
        sparse_set::SparseSet,
    },
};

/// The state persisted per stream between calls.
///
/// This is written by the general scan loop and read by the end-of-data
/// pass. The end-of-data pass also clears role state and active leaves
/// before it runs its end-anchored literal matcher, so a stream should not
/// be scanned again after its end-of-data pass.
#[derive(Clone, Debug)]
pub struct State {
    groups: GroupMask,
    pub(crate) roles: Multibit,
    pub(crate) active_leaves: Multibit,
    last_end_offset: u64,
    pub(crate) nfa_stream: Vec<u8>,
}

impl State {
    /// Create the state of a new stream of the given program.
    pub fn new(engine: &RoseEngine) -> State {
        State {
            groups: engine.initial_groups(),
            roles: Multibit::new(engine.num_role_states()),
            active_leaves: Multibit::new(engine.num_queues()),
            last_end_offset: 0,
            nfa_stream: vec![0; engine.stream_state_len()],
        }
    }

    /// The live group set.
    pub fn groups(&self) -> GroupMask {
        self.groups
    }

    /// Replace the live group set.
    pub fn set_groups(&mut self, groups: GroupMask) {
        self.groups = groups;
    }

    /// The role state bits that are on.
    pub fn role_states(&self) -> &Multibit {
        &self.roles
    }

    /// Mutable access to the role state bits.
    pub fn role_states_mut(&mut self) -> &mut Multibit {
        &mut self.roles
    }

    /// The queues whose sub-automata are active.
    pub fn active_leaves(&self) -> &Multibit {
        &self.active_leaves
    }

    /// Mutable access to the active queues.
    pub fn active_leaves_mut(&mut self) -> &mut Multibit {
        &mut self.active_leaves
    }

    /// The end offset of the last literal match seen by the scan loop.
    pub fn last_end_offset(&self) -> u64 {
        self.last_end_offset
    }

    /// Record the end offset of the last literal match.
    pub fn set_last_end_offset(&mut self, offset: u64) {
        self.last_end_offset = offset;
    }

    /// The compressed state of the sub-automaton behind `queue`.
    pub fn stream_state(&self, engine: &RoseEngine, queue: QueueID) -> &[u8] {
        &self.nfa_stream[engine.nfas[queue].stream.clone()]
    }

    /// Mutable access to the compressed state behind `queue`.
    pub fn stream_state_mut(
        &mut self,
        engine: &RoseEngine,
        queue: QueueID,
    ) -> &mut [u8] {
        &mut self.nfa_stream[engine.nfas[queue].stream.clone()]
    }

    /// Returns the heap memory, in bytes, used by this state.
    pub fn memory_usage(&self) -> usize {
        (self.roles.capacity() + self.active_leaves.capacity() + 7) / 8
            + self.nfa_stream.len()
    }
}

/// A literal match whose program runs later.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub(crate) struct Delayed {
    pub(crate) due: u64,
    pub(crate) id: LiteralID,
}

/// The mutable working space of one end-of-data pass.
///
/// Nothing in here survives between calls in a meaningful way, except the
/// full sub-automaton state that a block-mode scan loop leaves behind. A
/// scratch may be reused for any number of calls, but never by two calls at
/// once.
#[derive(Clone, Debug)]
pub struct Scratch {
    pub(crate) full_state: Vec<u8>,
    pub(crate) queues: Vec<Queue>,
    pub(crate) handled_roles: SparseSet,
    /// Queues triggered during this call.
    pub(crate) aqa: Multibit,
    /// Sorted by due offset, then literal.
    pub(crate) delayed: Vec<Delayed>,
    pub(crate) sidecar_enabled: Vec<bool>,
}

impl Scratch {
    /// Create scratch space sized for the given program.
    pub fn new(engine: &RoseEngine) -> Scratch {
        Scratch {
            full_state: vec![0; engine.full_state_len()],
            queues: vec![Queue::new(); engine.num_queues()],
            handled_roles: SparseSet::new(engine.num_roles()),
            aqa: Multibit::new(engine.num_queues()),
            delayed: vec![],
            sidecar_enabled: vec![false; engine.sidecar.len()],
        }
    }

    /// Resize this scratch space for another program, clearing everything
    /// in it.
    pub fn reset(&mut self, engine: &RoseEngine) {
        self.full_state.clear();
        self.full_state.resize(engine.full_state_len(), 0);
        self.queues.clear();
        self.queues.resize(engine.num_queues(), Queue::new());
        self.handled_roles.resize(engine.num_roles());
        self.aqa = Multibit::new(engine.num_queues());
        self.delayed.clear();
        self.sidecar_enabled.clear();
        self.sidecar_enabled.resize(engine.sidecar.len(), false);
    }

    /// The full state of the sub-automaton behind `queue`.
    pub fn full_state(&self, engine: &RoseEngine, queue: QueueID) -> &[u8] {
        &self.full_state[engine.nfas[queue].full.clone()]
    }

    /// Mutable access to the full state behind `queue`.
    pub fn full_state_mut(
        &mut self,
        engine: &RoseEngine,
        queue: QueueID,
    ) -> &mut [u8] {
        &mut self.full_state[engine.nfas[queue].full.clone()]
    }

    /// The events queued for the sub-automaton behind `queue`.
    pub fn queue(&self, queue: QueueID) -> &Queue {
        &self.queues[queue]
    }

    /// Returns the heap memory, in bytes, used by this scratch space.
    pub fn memory_usage(&self) -> usize {
        use core::mem::size_of;

        self.full_state.len()
            + self
                .queues
                .iter()
                .map(|q| q.events().len() * size_of::<QueueEvent>())
                .sum::<usize>()
            + self.handled_roles.memory_usage()
            + (self.aqa.capacity() + 7) / 8
            + self.delayed.len() * size_of::<Delayed>()
            + self.sidecar_enabled.len()
    }
}
