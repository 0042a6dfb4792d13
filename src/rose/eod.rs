/*!
The end-of-data pass.

Once the last byte of a buffer or stream has been consumed, some matches
are still pending: a synthetic end-of-data event, sub-automata that accept
only at the end, roles waiting on a predicate and literals anchored to the
end of the data. [`eod_exec`] and [`block_eod_exec`] resolve all of them, in
a fixed order, reporting through the caller's callback.

Every step checks for a halt. Once the callback returns [`Control::Halt`],
no further callback invocation happens and the pass returns `Halt`.
*/

use crate::{
    fdr::RuntimeArgs,
    rose::{
        context::{Mode, RoseContext},
        nfa::EventKind,
        program::RoseEngine,
        state::{Scratch, State},
    },
    util::{
        primitives::ReportID,
        search::{Control, ReportCallback},
    },
};

/// Run the end-of-data pass at the end of a stream.
///
/// `history` is the tail of the stream that is still available, ending at
/// the absolute offset `offset`. The compressed sub-automaton states in
/// `state` are expanded using the last byte of `history` as their key.
///
/// This returns `Control::Halt` if and only if `cb` asked to stop.
///
/// # Panics
///
/// This panics if `history` is longer than `offset`.
pub fn eod_exec(
    engine: &RoseEngine,
    state: &mut State,
    scratch: &mut Scratch,
    history: &[u8],
    offset: u64,
    cb: &mut ReportCallback<'_>,
) -> Control {
    if skip_eod(engine, offset) {
        return Control::Continue;
    }
    let mut ctx = RoseContext::new(
        engine,
        state,
        scratch,
        cb,
        Mode::Streaming,
        history,
        offset,
    );
    run(&mut ctx)
}

/// Run the end-of-data pass over a whole buffer.
///
/// `buf` is the entire buffer, ending at the absolute offset `offset`. The
/// full sub-automaton states are taken as left in `scratch` by the scan of
/// that buffer. Before the pass, role history is brought up to the end of
/// the buffer, and so is the sidecar when the program asks for it.
///
/// This returns `Control::Halt` if and only if `cb` asked to stop.
///
/// # Panics
///
/// This panics if `buf` is longer than `offset`.
pub fn block_eod_exec(
    engine: &RoseEngine,
    state: &mut State,
    scratch: &mut Scratch,
    buf: &[u8],
    offset: u64,
    cb: &mut ReportCallback<'_>,
) -> Control {
    if skip_eod(engine, offset) {
        return Control::Continue;
    }
    let mut ctx =
        RoseContext::new(engine, state, scratch, cb, Mode::Block, buf, offset);
    ctx.flush_last_byte_history(offset);
    ctx.last_end_offset = offset;
    if engine.requires_eod_side_catchup() {
        ctx.catchup_sidecar(offset);
    }
    run(&mut ctx)
}

fn skip_eod(engine: &RoseEngine, offset: u64) -> bool {
    if !engine.requires_eod_check() {
        trace!("program has no end-of-data work");
        return true;
    }
    match engine.max_bi_anchored_width() {
        Some(max) if offset > max => {
            trace!("bailing, offset {} is beyond max width {}", offset, max);
            true
        }
        _ => false,
    }
}

fn run(ctx: &mut RoseContext<'_, '_>) -> Control {
    let engine = ctx.engine;
    if let Some(id) = engine.eod_event {
        trace!("firing end-of-data event {:?} at {}", id, ctx.offset);
        ctx.reporter.begin_phase();
        if ctx.run_event(ctx.offset, id).is_halt() {
            return Control::Halt;
        }
    }
    if check_nfa_eod(ctx).is_halt() {
        return Control::Halt;
    }
    if engine.eod_iter.is_empty() && engine.ematcher.is_none() {
        trace!("no end-of-data iterator or matcher");
        return Control::Continue;
    }
    if run_eod_iter(ctx).is_halt() {
        return Control::Halt;
    }
    if engine.ematcher.is_none() {
        return Control::Continue;
    }
    // The roles just fired by the iterator must not fire again below.
    ctx.state.roles.clear();
    ctx.state.active_leaves.clear();
    ctx.scratch.aqa.clear();
    ctx.populate_sidecar();
    if run_eod_matcher(ctx).is_halt() {
        return Control::Halt;
    }
    ctx.flush_last_byte_history(ctx.offset);
    ctx.catchup_sidecar(ctx.offset);
    if run_eod_iter(ctx).is_halt() {
        return Control::Halt;
    }
    check_eod_suffixes(ctx)
}

/// Ask every active sub-automaton that accepts at end-of-data for its final
/// reports.
fn check_nfa_eod(ctx: &mut RoseContext<'_, '_>) -> Control {
    let engine = ctx.engine;
    let key = match ctx.mode {
        Mode::Streaming => ctx.data.last().copied().unwrap_or(0),
        Mode::Block => 0,
    };
    ctx.reporter.begin_phase();
    let mut next = ctx.state.active_leaves.next(None);
    while let Some(qi) = next {
        next = ctx.state.active_leaves.next(Some(qi));
        let info = &engine.nfas[qi];
        if !info.nfa.accepts_eod() {
            trace!("queue {} does not accept at end-of-data", qi);
            continue;
        }
        trace!("checking queue {} at end-of-data", qi);
        let full = &mut ctx.scratch.full_state[info.full.clone()];
        let stream = &ctx.state.nfa_stream[info.stream.clone()];
        if ctx.mode == Mode::Streaming {
            info.nfa.expand_state(full, stream, ctx.offset, key);
        }
        let reporter = &mut ctx.reporter;
        let control = info.nfa.check_final_state(
            full,
            stream,
            ctx.offset,
            &mut |offset: u64, id: ReportID| reporter.report(offset, id),
        );
        if control.is_halt() || reporter.is_halted() {
            return Control::Halt;
        }
    }
    Control::Continue
}

/// Walk the role states that are on, firing every role they lead to whose
/// predicate holds. A role fires at most once per walk.
fn run_eod_iter(ctx: &mut RoseContext<'_, '_>) -> Control {
    let engine = ctx.engine;
    ctx.scratch.handled_roles.clear();
    ctx.reporter.begin_phase();
    for mapping in engine.eod_iter.iter() {
        if !ctx.state.roles.contains(mapping.state) {
            continue;
        }
        trace!("role state {} is on", mapping.state);
        for entry in mapping.roles.iter() {
            let ri = entry.role.as_usize();
            if ctx.scratch.handled_roles.contains(ri) {
                trace!("role {} already handled by this walk", ri);
                continue;
            }
            let role = &engine.roles[entry.role];
            if !role.get_simple_pred() {
                let pred = entry.pred.map(|p| engine.preds[p.as_usize()]);
                if !pred.map_or(true, |p| p.check(ctx.offset)) {
                    continue;
                }
            }
            ctx.scratch.handled_roles.insert(ri);
            trace!("firing role {} with report {:?}", ri, role.get_report());
            if ctx.reporter.report(ctx.offset, role.get_report()).is_halt() {
                return Control::Halt;
            }
        }
    }
    Control::Continue
}

/// Scan the tail of the data with the end-anchored literal table.
fn run_eod_matcher(ctx: &mut RoseContext<'_, '_>) -> Control {
    let engine = ctx.engine;
    let matcher = match engine.ematcher {
        Some(ref matcher) => matcher,
        None => return Control::Continue,
    };
    let data = ctx.data;
    if data.len() < matcher.min_width {
        trace!(
            "{} bytes of data is less than matcher min width {}",
            data.len(),
            matcher.min_width,
        );
        return Control::Continue;
    }
    let adj = data.len() - core::cmp::min(data.len(), matcher.region_size);
    trace!("scanning {} bytes at end-of-data", data.len() - adj);
    ctx.side_curr = ctx.data_start();
    ctx.reporter.begin_phase();
    let args = RuntimeArgs::new(data).start_offset(adj);
    if matcher.table.scan(&args, ctx).is_halt() {
        return Control::Halt;
    }
    let control = ctx.flush_delayed(ctx.offset);
    ctx.scratch.delayed.clear();
    control
}

/// Run every suffix triggered by the end-anchored matcher to the end of the
/// data and ask the survivors for their final reports.
fn check_eod_suffixes(ctx: &mut RoseContext<'_, '_>) -> Control {
    let engine = ctx.engine;
    let end = ctx.buf_len as i64;
    ctx.reporter.begin_phase();
    let mut next = ctx.state.active_leaves.next(None);
    while let Some(qi) = next {
        next = ctx.state.active_leaves.next(Some(qi));
        let info = &engine.nfas[qi];
        if !info.nfa.accepts_eod() {
            continue;
        }
        debug_assert!(ctx.scratch.aqa.contains(qi), "{} not triggered", qi);
        trace!("running suffix queue {} to end-of-data", qi);
        let queue = &mut ctx.scratch.queues[qi];
        queue.push(EventKind::End, end);
        let full = &mut ctx.scratch.full_state[info.full.clone()];
        if !info.nfa.queue_exec_rose(queue, full) {
            trace!("suffix queue {} died", qi);
            continue;
        }
        let stream = &ctx.state.nfa_stream[info.stream.clone()];
        let reporter = &mut ctx.reporter;
        let control = info.nfa.check_final_state(
            full,
            stream,
            ctx.offset,
            &mut |offset: u64, id: ReportID| reporter.report(offset, id),
        );
        if control.is_halt() || reporter.is_halted() {
            return Control::Halt;
        }
    }
    Control::Continue
}
