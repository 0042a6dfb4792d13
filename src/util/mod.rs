/*!
Types and routines shared by the literal matcher and the end-of-data engine.
*/

pub mod multibit;
pub mod primitives;
pub mod search;
pub mod wire;

pub(crate) mod sparse_set;
