/*!
Scanning a buffer with a packed literal table.

The scan is a shift-or over hashed byte pairs. At every probe, the table word
for the pair of bytes ending at the probe is OR'd into a running state that
is shifted forward by one stride worth of positions first. A bucket whose bit
for some position is still zero afterwards may have a literal ending there,
which the confirm region then checks exactly.

The scan sees its input as a carried history followed by the current buffer.
Matches may start in the history but are only reported when they end at or
after the start offset. Reported ends are exclusive and relative to the start
of the buffer.
*/

use alloc::vec::Vec;
use core::cmp;

use crate::{
    fdr::{
        confirm::HistoryBuf,
        engine::SchemeDescriptor,
        flood::FloodRecord,
        table::{width_mask, PackedLiteralTable},
    },
    util::{
        primitives::LiteralID,
        search::{Control, GroupMask, ALL_GROUPS},
    },
};

/// The number of bytes a run must extend beyond the scan position before the
/// flood path is taken. Shorter runs are cheaper to scan normally.
const FLOOD_MIN_AHEAD: usize = 16;

/// The arguments of one scan call.
///
/// Everything here is borrowed from the caller for the duration of the call.
/// The two histories are tails of the same stream history. The caseless one
/// is used to confirm caseless literals and may be of a different length.
#[derive(Clone, Copy, Debug)]
pub struct RuntimeArgs<'a> {
    buf: &'a [u8],
    history: &'a [u8],
    history_nocase: &'a [u8],
    start_offset: usize,
    first_flood_detect: usize,
}

impl<'a> RuntimeArgs<'a> {
    /// Create the arguments for scanning `buf` from its start, without any
    /// history.
    pub fn new(buf: &'a [u8]) -> RuntimeArgs<'a> {
        RuntimeArgs {
            buf,
            history: &[],
            history_nocase: &[],
            start_offset: 0,
            first_flood_detect: 0,
        }
    }

    /// Set the history preceding the buffer, used for case sensitive
    /// literals and for hashing.
    pub fn history(mut self, history: &'a [u8]) -> RuntimeArgs<'a> {
        self.history = history;
        self
    }

    /// Set the history preceding the buffer used for caseless literals.
    pub fn history_nocase(mut self, history: &'a [u8]) -> RuntimeArgs<'a> {
        self.history_nocase = history;
        self
    }

    /// Only report matches whose last byte is at or after this offset in the
    /// buffer.
    pub fn start_offset(mut self, offset: usize) -> RuntimeArgs<'a> {
        self.start_offset = offset;
        self
    }

    /// Only take the flood path for ends at or after this offset in the
    /// buffer.
    pub fn first_flood_detect(mut self, offset: usize) -> RuntimeArgs<'a> {
        self.first_flood_detect = offset;
        self
    }

    /// The buffer being scanned.
    pub fn buf(&self) -> &'a [u8] {
        self.buf
    }

    /// The offset from which matches are reported.
    pub fn get_start_offset(&self) -> usize {
        self.start_offset
    }
}

/// The receiver of literal matches.
///
/// Any `FnMut(usize, LiteralID) -> Control` closure is a sink with every
/// group switched on.
pub trait LiteralSink {
    /// Called for every match, with its exclusive end relative to the start
    /// of the buffer. Returning `Control::Halt` stops the scan.
    fn on_match(&mut self, end: usize, id: LiteralID) -> Control;

    /// The live group set. Literals whose groups do not intersect it are not
    /// reported. This is consulted again at every end position, so a sink
    /// may switch groups off while the scan is running.
    fn groups(&self) -> GroupMask {
        ALL_GROUPS
    }
}

impl<F: FnMut(usize, LiteralID) -> Control> LiteralSink for F {
    fn on_match(&mut self, end: usize, id: LiteralID) -> Control {
        self(end, id)
    }
}

impl<T: AsRef<[u8]>> PackedLiteralTable<T> {
    /// Scan the input described by `args`, reporting every literal match to
    /// `sink` in order of end offset, and in ascending id order for matches
    /// sharing an end.
    ///
    /// This returns `Control::Halt` if and only if the sink asked to stop.
    pub fn scan<S: LiteralSink + ?Sized>(
        &self,
        args: &RuntimeArgs<'_>,
        sink: &mut S,
    ) -> Control {
        Scanner::new(self.as_ref(), args).run(sink)
    }
}

struct Scanner<'t, 'a> {
    table: PackedLiteralTable<&'t [u8]>,
    args: RuntimeArgs<'a>,
    cased: HistoryBuf<'a>,
    caseless: HistoryBuf<'a>,
    /// The number of history bytes before the buffer. Positions below are
    /// virtual: history and buffer concatenated.
    hlen: usize,
    /// The length of the virtual input.
    len: usize,
    /// The lowest position available in both histories.
    lo: usize,
    matches: Vec<LiteralID>,
}

impl<'t, 'a> Scanner<'t, 'a> {
    fn new(
        table: PackedLiteralTable<&'t [u8]>,
        args: &RuntimeArgs<'a>,
    ) -> Scanner<'t, 'a> {
        let hlen = args.history.len();
        Scanner {
            table,
            args: *args,
            cased: HistoryBuf::new(args.history, args.buf),
            caseless: HistoryBuf::new(args.history_nocase, args.buf),
            hlen,
            len: hlen + args.buf.len(),
            lo: hlen - cmp::min(hlen, args.history_nocase.len()),
            matches: Vec::new(),
        }
    }

    #[inline]
    fn byte(&self, at: usize) -> u8 {
        if at < self.hlen {
            self.args.history[at]
        } else {
            self.args.buf[at - self.hlen]
        }
    }

    fn run<S: LiteralSink + ?Sized>(&mut self, sink: &mut S) -> Control {
        if self.args.start_offset >= self.args.buf.len() {
            return Control::Continue;
        }
        let desc = self.table.descriptor().clone();
        let stride = desc.stride() as usize;
        let shift = stride * desc.num_buckets() as usize;
        let wmask = width_mask(desc.scheme_width());
        let domain_mask = usize::from(self.table.domain_mask());
        let flood_from = self.hlen + self.args.first_flood_detect;

        let mut state = 0u128;
        let mut next_end = self.hlen + self.args.start_offset;
        let mut no_flood_until = 0;
        while next_end < self.len {
            if next_end >= flood_from && next_end >= no_flood_until {
                match self.try_flood(next_end, sink) {
                    Flood::Skip { until } => no_flood_until = until,
                    Flood::Taken { resume, control } => {
                        if control.is_halt() {
                            return Control::Halt;
                        }
                        state = 0;
                        next_end = resume;
                        continue;
                    }
                }
            }
            let probe = next_end + stride - 1;
            // Probes past the end, and a probe with no preceding byte,
            // constrain nothing.
            let word = if probe >= self.len || probe == 0 {
                0
            } else {
                let key = (usize::from(self.byte(probe - 1)) << 8)
                    | usize::from(self.byte(probe));
                self.table.raw_word(key & domain_mask)
            };
            state = ((state << shift) | word) & wmask;

            let last = cmp::min(probe, self.len - 1);
            for end in next_end..=last {
                let back = (probe - end) as u32;
                if self.report_end(&desc, state, back, end, sink).is_halt() {
                    return Control::Halt;
                }
            }
            next_end = probe + 1;
        }
        Control::Continue
    }

    /// Confirm and report every candidate ending at position `end`, which is
    /// `back` bytes before the current probe.
    fn report_end<S: LiteralSink + ?Sized>(
        &mut self,
        desc: &SchemeDescriptor,
        state: u128,
        back: u32,
        end: usize,
        sink: &mut S,
    ) -> Control {
        let groups = sink.groups();
        let rel_end = (end + 1) as isize - self.hlen as isize;
        let confirm = self.table.confirm();
        self.matches.clear();
        for b in 0..desc.num_buckets() {
            let pos = desc.bucket_width(b) - 1 - back;
            if (state >> desc.scheme_bit(b, pos)) & 1 != 0 {
                continue;
            }
            confirm.confirm(
                b,
                rel_end,
                &self.cased,
                &self.caseless,
                groups,
                &mut self.matches,
            );
        }
        self.matches.sort();
        self.matches.dedup();
        for &id in self.matches.iter() {
            if sink.on_match(rel_end as usize, id).is_halt() {
                return Control::Halt;
            }
        }
        Control::Continue
    }

    /// Take the flood path at `end` if the run of bytes around it allows.
    fn try_flood<S: LiteralSink + ?Sized>(
        &mut self,
        end: usize,
        sink: &mut S,
    ) -> Flood {
        let c = self.byte(end);
        let rec = match self.table.flood_record(c) {
            None => return Flood::Skip { until: end + 1 },
            Some(rec) => rec,
        };
        let suffix = rec.suffix() as usize;

        // The run behind must cover the whole suffix.
        let mut start = end;
        while start > self.lo && end - start + 1 < suffix {
            if self.byte(start - 1) != c {
                break;
            }
            start -= 1;
        }
        if end - start + 1 < suffix {
            // The earliest end in this run that can satisfy the suffix.
            return Flood::Skip { until: start + suffix - 1 };
        }
        while start > self.lo && self.byte(start - 1) == c {
            start -= 1;
        }

        let mut stop = end;
        while stop < self.len && self.byte(stop) == c {
            stop += 1;
        }
        if stop - end < FLOOD_MIN_AHEAD {
            return Flood::Skip { until: stop };
        }
        trace!(
            "flood of {:?} from {} to {} (run starts at {})",
            c as char,
            end,
            stop,
            start,
        );
        let control = self.emit_flood(&rec, start, end, stop, sink);
        Flood::Taken { resume: stop, control }
    }

    fn emit_flood<S: LiteralSink + ?Sized>(
        &self,
        rec: &FloodRecord,
        start: usize,
        from: usize,
        stop: usize,
        sink: &mut S,
    ) -> Control {
        for end in from..stop {
            let groups = sink.groups();
            let rel_end = end + 1 - self.hlen;
            for id in rec.matches(end - start + 1, groups) {
                if sink.on_match(rel_end, id).is_halt() {
                    return Control::Halt;
                }
            }
        }
        Control::Continue
    }
}

enum Flood {
    /// The flood path was not taken, and need not be tried again before the
    /// given position.
    Skip { until: usize },
    /// Every end before `resume` has been reported.
    Taken { resume: usize, control: Control },
}
