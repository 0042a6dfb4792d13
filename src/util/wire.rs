/*!
Helpers for the bespoke binary format of compiled literal tables.

A compiled literal table is meant to be built once, written somewhere (a file,
a static byte array, a memory map) and later loaded without doing any work
beyond validation. The in-memory representation of a table is therefore its
serialized form: every access at search time goes through a bounds checked
read of an integer at some offset.

Serialization requires the caller to pick an endianness. Deserialization only
accepts native endianness, otherwise loading could not be zero-copy. The
header of every serialized object starts with a NUL terminated label padded to
a multiple of 8 bytes, an endianness check and a format version.
*/

use core::{cmp, convert::TryInto};

use crate::util::primitives::{LiteralID, LiteralIDError};

/// An error that occurs when serializing an object from this crate.
///
/// The only way serialization can fail is if the caller provides a
/// destination buffer that is too small. The `to_bytes_*` routines never
/// fail since they allocate a buffer of the correct size.
///
/// This error type implements `std::error::Error` only when the `std` feature
/// is enabled.
#[derive(Clone, Debug)]
pub struct SerializeError {
    /// The name of the thing that a buffer is too small for.
    what: &'static str,
}

impl SerializeError {
    pub(crate) fn buffer_too_small(what: &'static str) -> SerializeError {
        SerializeError { what }
    }
}

impl core::fmt::Display for SerializeError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "destination buffer is too small to write {}", self.what)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SerializeError {}

/// An error that occurs when deserializing an object defined in this crate.
///
/// Deserialization validates every offset and length that is later used at
/// search time. Whenever that validation fails, this error is returned.
///
/// A `DeserializeError` provides no introspection capabilities. Its only
/// supported operation is conversion to a human readable error message.
#[derive(Clone, Debug)]
pub struct DeserializeError(DeserializeErrorKind);

#[derive(Clone, Debug)]
enum DeserializeErrorKind {
    Generic { msg: &'static str },
    BufferTooSmall { what: &'static str },
    InvalidUsize { what: &'static str },
    VersionMismatch { expected: u64, found: u64 },
    EndianMismatch { expected: u64, found: u64 },
    LabelMismatch { expected: &'static str },
    ArithmeticOverflow { what: &'static str },
    LiteralID(LiteralIDError),
}

impl DeserializeError {
    pub(crate) fn generic(msg: &'static str) -> DeserializeError {
        DeserializeError(DeserializeErrorKind::Generic { msg })
    }

    pub(crate) fn buffer_too_small(what: &'static str) -> DeserializeError {
        DeserializeError(DeserializeErrorKind::BufferTooSmall { what })
    }

    pub(crate) fn invalid_usize(what: &'static str) -> DeserializeError {
        DeserializeError(DeserializeErrorKind::InvalidUsize { what })
    }

    fn version_mismatch(expected: u64, found: u64) -> DeserializeError {
        DeserializeError(DeserializeErrorKind::VersionMismatch {
            expected,
            found,
        })
    }

    fn endian_mismatch(expected: u64, found: u64) -> DeserializeError {
        DeserializeError(DeserializeErrorKind::EndianMismatch {
            expected,
            found,
        })
    }

    fn label_mismatch(expected: &'static str) -> DeserializeError {
        DeserializeError(DeserializeErrorKind::LabelMismatch { expected })
    }

    fn arithmetic_overflow(what: &'static str) -> DeserializeError {
        DeserializeError(DeserializeErrorKind::ArithmeticOverflow { what })
    }

    fn literal_id_error(err: LiteralIDError) -> DeserializeError {
        DeserializeError(DeserializeErrorKind::LiteralID(err))
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DeserializeError {}

impl core::fmt::Display for DeserializeError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use self::DeserializeErrorKind::*;

        match self.0 {
            Generic { msg } => write!(f, "{}", msg),
            BufferTooSmall { what } => {
                write!(f, "buffer is too small to read {}", what)
            }
            InvalidUsize { what } => {
                write!(f, "{} is too big to fit in a usize", what)
            }
            VersionMismatch { expected, found } => write!(
                f,
                "unsupported version: \
                 expected version {} but found version {}",
                expected, found,
            ),
            EndianMismatch { expected, found } => write!(
                f,
                "endianness mismatch: expected 0x{:X} but got 0x{:X}. \
                 (Are you trying to load an object serialized with a \
                 different endianness?)",
                expected, found,
            ),
            LabelMismatch { expected } => write!(
                f,
                "label mismatch: start of serialized object should \
                 contain a NUL terminated {:?} label, but a different \
                 label was found",
                expected,
            ),
            ArithmeticOverflow { what } => {
                write!(f, "arithmetic overflow for {}", what)
            }
            LiteralID(ref err) => err.fmt(f),
        }
    }
}

impl From<LiteralIDError> for DeserializeError {
    fn from(err: LiteralIDError) -> DeserializeError {
        DeserializeError::literal_id_error(err)
    }
}

/// Reads a NUL terminated label starting at the beginning of the given slice
/// and checks that it matches `expected_label`.
///
/// Upon success, the total number of bytes read (including padding bytes) is
/// returned.
pub fn read_label(
    slice: &[u8],
    expected_label: &'static str,
) -> Result<usize, DeserializeError> {
    // No label in this crate is longer than 256 bytes, so if we can't find a
    // NUL within that range, then we have corrupted data.
    let first_nul =
        slice[..cmp::min(slice.len(), 256)].iter().position(|&b| b == 0);
    let first_nul = match first_nul {
        Some(first_nul) => first_nul,
        None => {
            return Err(DeserializeError::generic(
                "could not find NUL terminated label \
                 at start of serialized object",
            ));
        }
    };
    let len = first_nul + padding_len(first_nul);
    if slice.len() < len {
        return Err(DeserializeError::generic(
            "could not find properly sized label at start of \
             serialized object",
        ));
    }
    if expected_label.as_bytes() != &slice[..first_nul] {
        return Err(DeserializeError::label_mismatch(expected_label));
    }
    Ok(len)
}

/// Writes the given label to the buffer as a NUL terminated string, padded
/// with additional NUL bytes to a multiple of 8. The label must not contain
/// NUL and must not be longer than 255 bytes, otherwise this panics.
///
/// Upon success, the total number of bytes written is returned.
pub fn write_label(
    label: &str,
    dst: &mut [u8],
) -> Result<usize, SerializeError> {
    let nwrite = write_label_len(label);
    if dst.len() < nwrite {
        return Err(SerializeError::buffer_too_small("label"));
    }
    dst[..label.len()].copy_from_slice(label.as_bytes());
    for b in dst[label.len()..nwrite].iter_mut() {
        *b = 0;
    }
    assert_eq!(nwrite % 8, 0);
    Ok(nwrite)
}

/// Returns the total number of bytes (including padding) that would be written
/// for the given label.
pub fn write_label_len(label: &str) -> usize {
    if label.len() > 255 {
        panic!("label must not be longer than 255 bytes");
    }
    if label.as_bytes().iter().any(|&b| b == 0) {
        panic!("label must not contain NUL bytes");
    }
    let label_len = label.len() + 1; // +1 for the NUL terminator
    label_len + padding_len(label_len)
}

/// Reads the endianness check from the beginning of the given slice and
/// confirms that it matches native endianness.
///
/// Upon success, the total number of bytes read is returned.
pub fn read_endianness_check(slice: &[u8]) -> Result<usize, DeserializeError> {
    let n = try_read_u64(slice, "endianness check")?;
    if n != 0xFEFF {
        return Err(DeserializeError::endian_mismatch(0xFEFF, n));
    }
    Ok(write_endianness_check_len())
}

/// Writes 0xFEFF as an integer using the given endianness.
///
/// Upon success, the total number of bytes written is returned.
pub fn write_endianness_check<E: Endian>(
    dst: &mut [u8],
) -> Result<usize, SerializeError> {
    let nwrite = write_endianness_check_len();
    if dst.len() < nwrite {
        return Err(SerializeError::buffer_too_small("endianness check"));
    }
    E::write_u64(0xFEFF, dst);
    Ok(nwrite)
}

/// Returns the number of bytes written by the endianness check.
pub fn write_endianness_check_len() -> usize {
    8
}

/// Reads a version number from the beginning of the given slice and confirms
/// that it is exactly `expected_version`.
///
/// Upon success, the total number of bytes read is returned.
pub fn read_version(
    slice: &[u8],
    expected_version: u64,
) -> Result<usize, DeserializeError> {
    let n = try_read_u64(slice, "version")?;
    if n != expected_version {
        return Err(DeserializeError::version_mismatch(expected_version, n));
    }
    Ok(write_version_len())
}

/// Writes the given version number to the beginning of the given slice.
///
/// Upon success, the total number of bytes written is returned.
pub fn write_version<E: Endian>(
    version: u64,
    dst: &mut [u8],
) -> Result<usize, SerializeError> {
    let nwrite = write_version_len();
    if dst.len() < nwrite {
        return Err(SerializeError::buffer_too_small("version number"));
    }
    E::write_u64(version, dst);
    Ok(nwrite)
}

/// Returns the number of bytes written by writing the version number.
pub fn write_version_len() -> usize {
    8
}

/// Attempts to read a literal ID from the given slice in native endian
/// format.
pub fn try_read_literal_id(
    slice: &[u8],
    what: &'static str,
) -> Result<LiteralID, DeserializeError> {
    if slice.len() < LiteralID::SIZE {
        return Err(DeserializeError::buffer_too_small(what));
    }
    Ok(LiteralID::from_ne_bytes(slice[..4].try_into().unwrap())?)
}

/// Try to read a u32 as a usize from the beginning of the given slice in
/// native endian format.
pub fn try_read_u32_as_usize(
    slice: &[u8],
    what: &'static str,
) -> Result<usize, DeserializeError> {
    try_read_u32(slice, what).and_then(|n| {
        n.try_into().map_err(|_| DeserializeError::invalid_usize(what))
    })
}

/// Try to read a u32 from the beginning of the given slice in native endian
/// format. The `what` description is used in error messages.
pub fn try_read_u32(
    slice: &[u8],
    what: &'static str,
) -> Result<u32, DeserializeError> {
    if slice.len() < 4 {
        return Err(DeserializeError::buffer_too_small(what));
    }
    Ok(read_u32(slice))
}

/// Try to read a u64 from the beginning of the given slice in native endian
/// format. The `what` description is used in error messages.
pub fn try_read_u64(
    slice: &[u8],
    what: &'static str,
) -> Result<u64, DeserializeError> {
    if slice.len() < 8 {
        return Err(DeserializeError::buffer_too_small(what));
    }
    Ok(read_u64(slice))
}

/// Read a u16 from the beginning of the given slice in native endian format.
/// If the slice has fewer than 2 bytes, then this panics.
#[inline(always)]
pub fn read_u16(slice: &[u8]) -> u16 {
    let bytes: [u8; 2] = slice[..2].try_into().unwrap();
    u16::from_ne_bytes(bytes)
}

/// Read a u32 from the beginning of the given slice in native endian format.
/// If the slice has fewer than 4 bytes, then this panics.
#[inline(always)]
pub fn read_u32(slice: &[u8]) -> u32 {
    let bytes: [u8; 4] = slice[..4].try_into().unwrap();
    u32::from_ne_bytes(bytes)
}

/// Read a u64 from the beginning of the given slice in native endian format.
/// If the slice has fewer than 8 bytes, then this panics.
#[inline(always)]
pub fn read_u64(slice: &[u8]) -> u64 {
    let bytes: [u8; 8] = slice[..8].try_into().unwrap();
    u64::from_ne_bytes(bytes)
}

/// Read a u128 from the beginning of the given slice in native endian format.
/// If the slice has fewer than 16 bytes, then this panics.
#[inline(always)]
pub fn read_u128(slice: &[u8]) -> u128 {
    let bytes: [u8; 16] = slice[..16].try_into().unwrap();
    u128::from_ne_bytes(bytes)
}

/// Checks that the given slice has some minimal length. If it's smaller than
/// the bound given, then a "buffer too small" error is returned with `what`
/// describing what the buffer represents.
pub fn check_slice_len<T>(
    slice: &[T],
    at_least_len: usize,
    what: &'static str,
) -> Result<(), DeserializeError> {
    if slice.len() < at_least_len {
        return Err(DeserializeError::buffer_too_small(what));
    }
    Ok(())
}

/// Multiply the given numbers, and on overflow, return an error that includes
/// 'what' in the error message.
pub fn mul(
    a: usize,
    b: usize,
    what: &'static str,
) -> Result<usize, DeserializeError> {
    match a.checked_mul(b) {
        Some(c) => Ok(c),
        None => Err(DeserializeError::arithmetic_overflow(what)),
    }
}

/// Add the given numbers, and on overflow, return an error that includes
/// 'what' in the error message.
pub fn add(
    a: usize,
    b: usize,
    what: &'static str,
) -> Result<usize, DeserializeError> {
    match a.checked_add(b) {
        Some(c) => Ok(c),
        None => Err(DeserializeError::arithmetic_overflow(what)),
    }
}

/// A simple trait for writing code generic over endianness.
///
/// This is similar to what byteorder provides, but we only need a very small
/// subset.
pub trait Endian {
    /// Writes a u16 to the given destination buffer in a particular
    /// endianness. If the destination buffer has a length smaller than 2, then
    /// this panics.
    fn write_u16(n: u16, dst: &mut [u8]);

    /// Writes a u32 to the given destination buffer in a particular
    /// endianness. If the destination buffer has a length smaller than 4, then
    /// this panics.
    fn write_u32(n: u32, dst: &mut [u8]);

    /// Writes a u64 to the given destination buffer in a particular
    /// endianness. If the destination buffer has a length smaller than 8, then
    /// this panics.
    fn write_u64(n: u64, dst: &mut [u8]);

    /// Writes a u128 to the given destination buffer in a particular
    /// endianness. If the destination buffer has a length smaller than 16,
    /// then this panics.
    fn write_u128(n: u128, dst: &mut [u8]);
}

/// Little endian writing.
pub enum LE {}
/// Big endian writing.
pub enum BE {}

/// Native endian writing.
#[cfg(target_endian = "little")]
pub type NE = LE;
/// Native endian writing.
#[cfg(target_endian = "big")]
pub type NE = BE;

impl Endian for LE {
    fn write_u16(n: u16, dst: &mut [u8]) {
        dst[..2].copy_from_slice(&n.to_le_bytes());
    }

    fn write_u32(n: u32, dst: &mut [u8]) {
        dst[..4].copy_from_slice(&n.to_le_bytes());
    }

    fn write_u64(n: u64, dst: &mut [u8]) {
        dst[..8].copy_from_slice(&n.to_le_bytes());
    }

    fn write_u128(n: u128, dst: &mut [u8]) {
        dst[..16].copy_from_slice(&n.to_le_bytes());
    }
}

impl Endian for BE {
    fn write_u16(n: u16, dst: &mut [u8]) {
        dst[..2].copy_from_slice(&n.to_be_bytes());
    }

    fn write_u32(n: u32, dst: &mut [u8]) {
        dst[..4].copy_from_slice(&n.to_be_bytes());
    }

    fn write_u64(n: u64, dst: &mut [u8]) {
        dst[..8].copy_from_slice(&n.to_be_bytes());
    }

    fn write_u128(n: u128, dst: &mut [u8]) {
        dst[..16].copy_from_slice(&n.to_be_bytes());
    }
}

/// Returns the number of additional bytes required to add to the given length
/// in order to make the total length a multiple of 8. The return value is
/// always less than 8.
pub fn padding_len(non_padding_len: usize) -> usize {
    (8 - (non_padding_len & 0b111)) & 0b111
}
