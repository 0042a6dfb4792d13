/*!
The end-of-data completion engine.

A Rose program ties literal matches to the sub-automata and roles that
depend on them. This module covers the part of it that runs once the input
is exhausted: [`eod_exec`] at the end of a stream and [`block_eod_exec`] at
the end of a whole buffer. Both run the same steps in the same order:

1. Nothing happens past the program's maximum bi-anchored width.
2. The synthetic end-of-data event literal, if any, runs its program.
3. Active sub-automata that accept at end-of-data report their final state.
4. Roles waiting on end-of-data fire when their predicate holds.
5. The end-anchored literal matcher, if any, scans the tail of the data.
Roles and suffixes it switches on are then resolved by walking the roles
again and running the suffixes to the end.

Programs are assembled with a [`Builder`]. Per-stream data lives in a
[`State`] and per-call working space in a [`Scratch`].

# Example

```
use fdr_rose::{
    rose::{self, LiteralProgram, RoseEngine, Scratch, State},
    Control, LiteralID, ReportID,
};

let mut builder = RoseEngine::builder();
builder
    .add_literal_program(
        LiteralID::must(0),
        LiteralProgram::new().report(ReportID::must(5)),
    )
    .eod_event_literal(Some(LiteralID::must(0)));
let engine = builder.build()?;

let mut state = State::new(&engine);
let mut scratch = Scratch::new(&engine);
let mut reports = vec![];
rose::eod_exec(&engine, &mut state, &mut scratch, b"abc", 3, &mut |at, id| {
    reports.push((at, id.as_usize()));
    Control::Continue
});
assert_eq!(vec![(3, 5)], reports);

# Ok::<(), Box<dyn std::error::Error>>(())
```
*/

pub use self::{
    eod::{block_eod_exec, eod_exec},
    error::BuildError,
    nfa::{EventKind, Nfa, Queue, QueueEvent},
    program::{
        Builder, EodIterRole, History, LiteralProgram, Pred, Role,
        RoseEngine, SidecarTrigger,
    },
    state::{Scratch, State},
};

mod context;
mod eod;
mod error;
mod nfa;
mod program;
mod state;
