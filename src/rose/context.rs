/*!
The per-call context threaded through every step of the end-of-data pass.

A [`RoseContext`] borrows the program, the persisted stream state and the
scratch space of one call exclusively, and owns the handful of scalars the
steps share: the live group set, the offset of the last literal match and
how far the sidecar has been caught up. Reports flow through a [`Reporter`],
which enforces that nothing is reported once the caller asked to halt.
*/

use crate::{
    fdr::LiteralSink,
    rose::{
        nfa::EventKind,
        program::RoseEngine,
        state::{Delayed, Scratch, State},
    },
    util::{
        primitives::{LiteralID, ReportID},
        search::{Control, GroupMask, ReportCallback},
    },
};

/// Whether the pass runs over a whole buffer or at the end of a stream.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Mode {
    Block,
    Streaming,
}

/// The caller's callback, guarded against use after a halt.
pub(crate) struct Reporter<'r, 'a> {
    cb: &'r mut ReportCallback<'a>,
    halted: bool,
    /// The last offset reported in the current phase.
    last: Option<u64>,
}

impl<'r, 'a> Reporter<'r, 'a> {
    pub(crate) fn new(cb: &'r mut ReportCallback<'a>) -> Reporter<'r, 'a> {
        Reporter { cb, halted: false, last: None }
    }

    /// Report a match. Once the callback halts, nothing else reaches it.
    pub(crate) fn report(&mut self, offset: u64, id: ReportID) -> Control {
        if self.halted {
            return Control::Halt;
        }
        debug_assert!(
            self.last.map_or(true, |last| last <= offset),
            "report at {} after report at {:?} in the same phase",
            offset,
            self.last,
        );
        self.last = Some(offset);
        if (self.cb)(offset, id).is_halt() {
            trace!("callback halted at offset {}", offset);
            self.halted = true;
            return Control::Halt;
        }
        Control::Continue
    }

    /// Start a new phase. Offsets only need to be non-decreasing within a
    /// phase.
    pub(crate) fn begin_phase(&mut self) {
        self.last = None;
    }

    pub(crate) fn is_halted(&self) -> bool {
        self.halted
    }
}

pub(crate) struct RoseContext<'r, 'a> {
    pub(crate) engine: &'r RoseEngine,
    pub(crate) state: &'r mut State,
    pub(crate) scratch: &'r mut Scratch,
    pub(crate) reporter: Reporter<'r, 'a>,
    pub(crate) mode: Mode,
    /// The data available at end-of-data: the whole buffer in block mode or
    /// the history tail in streaming mode. It ends at `offset`.
    pub(crate) data: &'r [u8],
    /// The length of the current buffer. Queue locations are relative to
    /// its start.
    pub(crate) buf_len: usize,
    /// The absolute end-of-data offset.
    pub(crate) offset: u64,
    pub(crate) groups: GroupMask,
    pub(crate) last_end_offset: u64,
    /// Everything before this absolute offset has been seen by the sidecar.
    pub(crate) side_curr: u64,
}

impl<'r, 'a> RoseContext<'r, 'a> {
    pub(crate) fn new(
        engine: &'r RoseEngine,
        state: &'r mut State,
        scratch: &'r mut Scratch,
        cb: &'r mut ReportCallback<'a>,
        mode: Mode,
        data: &'r [u8],
        offset: u64,
    ) -> RoseContext<'r, 'a> {
        assert!(
            data.len() as u64 <= offset,
            "{} bytes of data cannot end at offset {}",
            data.len(),
            offset,
        );
        let (buf_len, last_end_offset, side_curr) = match mode {
            Mode::Block => (
                data.len(),
                state.last_end_offset(),
                offset - data.len() as u64,
            ),
            Mode::Streaming => (0, offset, offset),
        };
        scratch.aqa.clear();
        scratch.delayed.clear();
        let groups = state.groups();
        let mut ctx = RoseContext {
            engine,
            state,
            scratch,
            reporter: Reporter::new(cb),
            mode,
            data,
            buf_len,
            offset,
            groups,
            last_end_offset,
            side_curr,
        };
        ctx.populate_sidecar();
        ctx
    }

    /// The absolute offset of the first byte of `data`.
    pub(crate) fn data_start(&self) -> u64 {
        self.offset - self.data.len() as u64
    }

    /// The absolute offset of the start of the current buffer.
    fn buf_start(&self) -> u64 {
        self.offset - self.buf_len as u64
    }

    /// Enable every sidecar trigger whose groups are live.
    pub(crate) fn populate_sidecar(&mut self) {
        let groups = self.groups;
        for (enabled, trigger) in self
            .scratch
            .sidecar_enabled
            .iter_mut()
            .zip(self.engine.sidecar.iter())
        {
            *enabled = trigger.groups & groups != 0;
        }
    }

    /// Switch on the roles of every enabled sidecar trigger whose byte
    /// occurs between the sidecar's position and `to`.
    pub(crate) fn catchup_sidecar(&mut self, to: u64) {
        let from = core::cmp::max(self.side_curr, self.data_start());
        if from < to {
            let start = (from - self.data_start()) as usize;
            let end = core::cmp::min(
                (to - self.data_start()) as usize,
                self.data.len(),
            );
            if start < end {
                self.scan_sidecar(start, end);
            }
        }
        self.side_curr = core::cmp::max(self.side_curr, to);
    }

    fn scan_sidecar(&mut self, start: usize, end: usize) {
        let engine = self.engine;
        let mut bytes = [0u8; 3];
        let mut len = 0;
        for (trigger, &enabled) in
            engine.sidecar.iter().zip(self.scratch.sidecar_enabled.iter())
        {
            if enabled && !bytes[..len].contains(&trigger.byte) {
                bytes[len] = trigger.byte;
                len += 1;
            }
        }
        if len == 0 {
            return;
        }
        trace!("catching up sidecar over {}..{}", start, end);
        let window = &self.data[start..end];
        // Role state bits are only ever switched on here, so it is enough to
        // find each byte once.
        let mut seen = [false; 3];
        let mut mark = |i: usize| {
            let byte = window[i];
            if let Some(j) = bytes[..len].iter().position(|&b| b == byte) {
                seen[j] = true;
            }
            seen[..len].iter().all(|&s| s)
        };
        let (b0, b1, b2) = (bytes[0], bytes[1], bytes[2]);
        match len {
            1 => memchr::memchr_iter(b0, window).any(&mut mark),
            2 => memchr::memchr2_iter(b0, b1, window).any(&mut mark),
            _ => memchr::memchr3_iter(b0, b1, b2, window).any(&mut mark),
        };
        for (trigger, &enabled) in
            engine.sidecar.iter().zip(self.scratch.sidecar_enabled.iter())
        {
            let hit = bytes[..len]
                .iter()
                .position(|&b| b == trigger.byte)
                .map_or(false, |j| seen[j]);
            if !enabled || !hit {
                continue;
            }
            if let Some(bit) = engine.roles[trigger.role].get_state() {
                trace!("sidecar switches on role state {}", bit);
                self.state.roles.set(bit);
            }
        }
    }

    /// Drop every role that only lives while the last literal match ends at
    /// `offset`, unless it still does.
    pub(crate) fn flush_last_byte_history(&mut self, offset: u64) {
        if self.engine.last_byte_states.is_empty() {
            return;
        }
        if self.last_end_offset == offset {
            trace!("last byte history still current at {}", offset);
            return;
        }
        for &bit in self.engine.last_byte_states.iter() {
            self.state.roles.unset(bit);
        }
    }

    /// Run the program of a literal that matched ending at absolute offset
    /// `end`, or defer it if it is delayed.
    pub(crate) fn run_literal(&mut self, end: u64, id: LiteralID) -> Control {
        self.run_gated(end, id, false)
    }

    /// Run the program of the end-of-data event at `end`. The event has no
    /// later bytes to wait for, so any delay is ignored.
    pub(crate) fn run_event(&mut self, end: u64, id: LiteralID) -> Control {
        self.run_gated(end, id, true)
    }

    fn run_gated(
        &mut self,
        end: u64,
        id: LiteralID,
        is_event: bool,
    ) -> Control {
        let engine = self.engine;
        let program = match engine.program(id) {
            Some(program) => program,
            None => {
                debug_assert!(false, "literal {:?} has no program", id);
                return Control::Continue;
            }
        };
        if program.get_groups() & self.groups == 0 {
            trace!("literal {:?} at {} is switched off", id, end);
            return Control::Continue;
        }
        let delay = program.get_delay();
        if delay > 0 && !is_event {
            let slot = Delayed { due: end + u64::from(delay), id };
            if let Err(i) = self.scratch.delayed.binary_search(&slot) {
                self.scratch.delayed.insert(i, slot);
            }
            return Control::Continue;
        }
        self.run_program(end, id)
    }

    /// Run the undelayed part of a literal program.
    fn run_program(&mut self, end: u64, id: LiteralID) -> Control {
        let engine = self.engine;
        let program = match engine.program(id) {
            Some(program) => program,
            None => return Control::Continue,
        };
        if program.get_eod_only() && end != self.offset {
            return Control::Continue;
        }
        for &report in program.reports() {
            if self.reporter.report(end, report).is_halt() {
                return Control::Halt;
            }
        }
        for &role in program.roles() {
            if let Some(bit) = engine.roles[role].get_state() {
                self.state.roles.set(bit);
            }
        }
        for &queue in program.suffixes() {
            let info = &engine.nfas[queue];
            let qi = queue.as_usize();
            if !self.scratch.aqa.contains(qi) {
                self.scratch.aqa.set(qi);
                self.scratch.queues[qi].clear();
                let full = &mut self.scratch.full_state[info.full.clone()];
                info.nfa.init_full_state(full);
            }
            self.state.active_leaves.set(qi);
            let loc = end as i64 - self.buf_start() as i64;
            self.scratch.queues[qi].push(EventKind::Top, loc);
        }
        self.groups &= !program.get_squash();
        Control::Continue
    }

    /// Run every delayed program due at or before `upto`, in due order.
    pub(crate) fn flush_delayed(&mut self, upto: u64) -> Control {
        let due =
            self.scratch.delayed.iter().take_while(|d| d.due <= upto).count();
        for i in 0..due {
            let slot = self.scratch.delayed[i];
            if self.run_program(slot.due, slot.id).is_halt() {
                self.scratch.delayed.clear();
                return Control::Halt;
            }
        }
        self.scratch.delayed.drain(..due);
        Control::Continue
    }
}

impl<'r, 'a> LiteralSink for RoseContext<'r, 'a> {
    fn on_match(&mut self, end: usize, id: LiteralID) -> Control {
        let end = self.data_start() + end as u64;
        if self.flush_delayed(end).is_halt() {
            return Control::Halt;
        }
        self.last_end_offset = end;
        self.run_literal(end, id)
    }

    fn groups(&self) -> GroupMask {
        self.groups
    }
}
