use crate::util::{primitives::LiteralID, wire::SerializeError};

/// An error that occurred while building a literal table.
///
/// Every build error is a build-time infeasibility: a table that fails to
/// build never reaches the scanner. There are generally only two things you
/// can do with it:
///
/// * Obtain a human readable message via its `std::fmt::Display` impl.
/// * Access an underlying [`SerializeError`] from its `source` method via the
/// `std::error::Error` trait.
///
/// When the `std` feature is enabled, this implements the `std::error::Error`
/// trait.
#[derive(Clone, Debug)]
pub struct BuildError {
    kind: BuildErrorKind,
}

/// The kind of error that occurred while building a literal table.
#[derive(Clone, Debug)]
enum BuildErrorKind {
    /// No literals were given.
    EmptyLiteralSet,
    /// A literal with no bytes was given. Such a literal would match at
    /// every position, which the scheme cannot express.
    EmptyLiteral { id: LiteralID },
    /// Every scheme requires CPU features the target lacks.
    NoViableEngine,
    /// A scheme was requested by an id that does not exist.
    UnknownEngine { id: u32 },
    /// A forced domain was outside the supported range.
    InvalidDomain { domain: u32 },
    /// The serialized table would not fit the 32-bit offsets of its header.
    TooBig,
    /// Serializing the table failed.
    Serialize(SerializeError),
}

impl BuildError {
    fn kind(&self) -> &BuildErrorKind {
        &self.kind
    }

    pub(crate) fn empty_literal_set() -> BuildError {
        BuildError { kind: BuildErrorKind::EmptyLiteralSet }
    }

    pub(crate) fn empty_literal(id: LiteralID) -> BuildError {
        BuildError { kind: BuildErrorKind::EmptyLiteral { id } }
    }

    pub(crate) fn no_viable_engine() -> BuildError {
        BuildError { kind: BuildErrorKind::NoViableEngine }
    }

    pub(crate) fn unknown_engine(id: u32) -> BuildError {
        BuildError { kind: BuildErrorKind::UnknownEngine { id } }
    }

    pub(crate) fn invalid_domain(domain: u32) -> BuildError {
        BuildError { kind: BuildErrorKind::InvalidDomain { domain } }
    }

    pub(crate) fn too_big() -> BuildError {
        BuildError { kind: BuildErrorKind::TooBig }
    }

    pub(crate) fn serialize(err: SerializeError) -> BuildError {
        BuildError { kind: BuildErrorKind::Serialize(err) }
    }

    /// Returns true if this error occurred because no known scheme can run
    /// on the requested target.
    pub fn is_no_viable_engine(&self) -> bool {
        matches!(self.kind, BuildErrorKind::NoViableEngine)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.kind() {
            BuildErrorKind::Serialize(ref err) => Some(err),
            _ => None,
        }
    }
}

impl core::fmt::Display for BuildError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.kind() {
            BuildErrorKind::EmptyLiteralSet => {
                write!(f, "cannot build a literal table from zero literals")
            }
            BuildErrorKind::EmptyLiteral { id } => write!(
                f,
                "literal {} is empty, but literals must have at least \
                 one byte",
                id.as_usize(),
            ),
            BuildErrorKind::NoViableEngine => write!(
                f,
                "no literal matching scheme is supported on the target"
            ),
            BuildErrorKind::UnknownEngine { id } => {
                write!(f, "unknown literal matching scheme id {}", id)
            }
            BuildErrorKind::InvalidDomain { domain } => write!(
                f,
                "hashing domain {} is outside the supported range {}..={}",
                domain,
                crate::fdr::engine::MIN_DOMAIN,
                crate::fdr::engine::MAX_DOMAIN,
            ),
            BuildErrorKind::TooBig => {
                write!(f, "literal table exceeds the 4GB offset limit")
            }
            BuildErrorKind::Serialize(_) => {
                write!(f, "error serializing literal table")
            }
        }
    }
}
