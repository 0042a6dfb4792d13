use crate::{
    fdr,
    util::primitives::{LiteralID, PredID, QueueID, RoleID},
};

/// An error that occurred while assembling a Rose program.
///
/// A program that fails to build never reaches the end-of-data pass. Every
/// error here is an index that points outside of the program, with the
/// exception of errors building the end-anchored literal table.
///
/// When the `std` feature is enabled, this implements the `std::error::Error`
/// trait.
#[derive(Clone, Debug)]
pub struct BuildError {
    kind: BuildErrorKind,
}

#[derive(Clone, Debug)]
enum BuildErrorKind {
    /// A role was referenced but never added.
    InvalidRole { role: RoleID },
    /// A predicate was referenced but never added.
    InvalidPred { pred: PredID },
    /// A role state index is out of range.
    InvalidRoleState { state: usize, len: usize },
    /// A literal needs a program but none was added for it.
    MissingLiteralProgram { id: LiteralID },
    /// A sub-automaton queue was referenced but never added.
    InvalidQueue { queue: QueueID },
    /// A role without state was switched on by a literal or the sidecar.
    StatelessRole { role: RoleID },
    /// A role without a simple predicate has no predicate in the iterator.
    MissingPred { role: RoleID },
    /// The sidecar watches more distinct bytes than it can search for.
    TooManySidecarBytes { len: usize },
    /// The end-anchored literal matcher has a zero sized region.
    EmptyEodRegion,
    /// Building the end-anchored literal table failed.
    EodMatcher(fdr::BuildError),
    /// More items were added than an identifier can name.
    TooMany { what: &'static str },
}

impl BuildError {
    fn kind(&self) -> &BuildErrorKind {
        &self.kind
    }

    pub(crate) fn invalid_role(role: RoleID) -> BuildError {
        BuildError { kind: BuildErrorKind::InvalidRole { role } }
    }

    pub(crate) fn invalid_pred(pred: PredID) -> BuildError {
        BuildError { kind: BuildErrorKind::InvalidPred { pred } }
    }

    pub(crate) fn invalid_role_state(state: usize, len: usize) -> BuildError {
        BuildError { kind: BuildErrorKind::InvalidRoleState { state, len } }
    }

    pub(crate) fn missing_literal_program(id: LiteralID) -> BuildError {
        BuildError { kind: BuildErrorKind::MissingLiteralProgram { id } }
    }

    pub(crate) fn invalid_queue(queue: QueueID) -> BuildError {
        BuildError { kind: BuildErrorKind::InvalidQueue { queue } }
    }

    pub(crate) fn stateless_role(role: RoleID) -> BuildError {
        BuildError { kind: BuildErrorKind::StatelessRole { role } }
    }

    pub(crate) fn missing_pred(role: RoleID) -> BuildError {
        BuildError { kind: BuildErrorKind::MissingPred { role } }
    }

    pub(crate) fn too_many_sidecar_bytes(len: usize) -> BuildError {
        BuildError { kind: BuildErrorKind::TooManySidecarBytes { len } }
    }

    pub(crate) fn empty_eod_region() -> BuildError {
        BuildError { kind: BuildErrorKind::EmptyEodRegion }
    }

    pub(crate) fn eod_matcher(err: fdr::BuildError) -> BuildError {
        BuildError { kind: BuildErrorKind::EodMatcher(err) }
    }

    pub(crate) fn too_many(what: &'static str) -> BuildError {
        BuildError { kind: BuildErrorKind::TooMany { what } }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.kind() {
            BuildErrorKind::EodMatcher(ref err) => Some(err),
            _ => None,
        }
    }
}

impl core::fmt::Display for BuildError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.kind() {
            BuildErrorKind::InvalidRole { role } => {
                write!(f, "role {} does not exist", role.as_usize())
            }
            BuildErrorKind::InvalidPred { pred } => {
                write!(f, "predicate {} does not exist", pred.as_usize())
            }
            BuildErrorKind::InvalidRoleState { state, len } => write!(
                f,
                "role state {} is out of range for {} role states",
                state, len,
            ),
            BuildErrorKind::MissingLiteralProgram { id } => write!(
                f,
                "literal {} has no program",
                id.as_usize(),
            ),
            BuildErrorKind::InvalidQueue { queue } => {
                write!(f, "queue {} does not exist", queue.as_usize())
            }
            BuildErrorKind::StatelessRole { role } => write!(
                f,
                "role {} has no state and cannot be switched on",
                role.as_usize(),
            ),
            BuildErrorKind::MissingPred { role } => write!(
                f,
                "role {} needs a predicate in the end-of-data iterator",
                role.as_usize(),
            ),
            BuildErrorKind::TooManySidecarBytes { len } => write!(
                f,
                "sidecar watches {} distinct bytes, but at most 3 \
                 are supported",
                len,
            ),
            BuildErrorKind::EmptyEodRegion => write!(
                f,
                "end-anchored literal matcher must scan a non-empty region",
            ),
            BuildErrorKind::EodMatcher(_) => {
                write!(f, "error building end-anchored literal matcher")
            }
            BuildErrorKind::TooMany { what } => {
                write!(f, "too many {} for a rose program", what)
            }
        }
    }
}
