/*!
Types shared by every search routine: the control signal returned by
callbacks and the group mask used to switch literals on and off.
*/

use crate::util::primitives::ReportID;

/// The signal returned by every match callback and by every search step.
///
/// A `Halt` is not an error. It is a request from the caller to stop
/// reporting matches for the current scan call. Once any callback returns
/// `Halt`, no further callback invocations occur for that call, and the
/// signal propagates out of every calling layer without doing further work.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Control {
    /// Keep searching.
    Continue,
    /// Stop searching immediately.
    Halt,
}

impl Control {
    /// Returns true if and only if this is a request to stop.
    #[inline]
    pub fn is_halt(self) -> bool {
        self == Control::Halt
    }

    /// Converts a boolean "keep going" answer into a control signal.
    #[inline]
    pub fn from_continue(yes: bool) -> Control {
        if yes {
            Control::Continue
        } else {
            Control::Halt
        }
    }
}

impl Default for Control {
    fn default() -> Control {
        Control::Continue
    }
}

/// A set of literal groups.
///
/// Every literal belongs to one or more groups. A literal is only confirmed
/// by the literal scanner when its groups intersect the live group set, which
/// lets the owner of the scan switch whole families of literals off while it
/// is running.
pub type GroupMask = u64;

/// The group mask with every group switched on.
pub const ALL_GROUPS: GroupMask = !0;

/// The callback through which reports are handed to the caller.
///
/// It is given the absolute end offset of a match and its report id, and
/// returns whether searching should continue.
pub type ReportCallback<'a> = dyn FnMut(u64, ReportID) -> Control + 'a;
