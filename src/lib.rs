/*!
This crate provides the runtime core of a multi-pattern matcher: a table
driven multi-literal matcher and the engine that completes matching once
the input is exhausted.

There are two main modules:

* [`fdr`] builds a [`PackedLiteralTable`](fdr::PackedLiteralTable) from a
set of literals, choosing the scheme that best fits the literals and the
target CPU, and scans buffers with it. Runs of a single repeated byte are
resolved in one step instead of byte by byte. Tables can be serialized and
loaded again without copying.
* [`rose`] runs the end-of-data pass of a compiled program: a synthetic end
event, sub-automata that only accept at the end, roles waiting on a
predicate and literals anchored to the end of the data, in a fixed order
and with early termination.

Everything compiled is immutable and may be shared by any number of
concurrent scans. All mutable state is owned by a single call.

# Crate features

* **std** - Enables `std::error::Error` implementations and runtime CPU
feature detection. Enabled by default.
* **logging** - Emits build decisions and end-of-data steps through the
`log` crate.

This crate always requires `alloc`.
*/

#![warn(missing_docs)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(any(
    target_pointer_width = "16",
    target_pointer_width = "32",
    target_pointer_width = "64"
)))]
compile_error!("fdr-rose currently not supported on non-{16,32,64}");

extern crate alloc;

pub use crate::util::{
    primitives::{
        LiteralID, LiteralIDError, PredID, PredIDError, QueueID,
        QueueIDError, ReportID, ReportIDError, RoleID, RoleIDError,
    },
    search::{Control, GroupMask, ReportCallback, ALL_GROUPS},
    wire::{DeserializeError, SerializeError},
};

#[macro_use]
mod macros;

pub mod fdr;
pub mod rose;
pub mod util;
