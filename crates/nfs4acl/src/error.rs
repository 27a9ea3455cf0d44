//! Crate-wide error type.

use std::io;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Nfs4AclError>;

/// Errors surfaced by `nfs4acl`.
///
/// The taxonomy follows the standard errno discipline the underlying
/// xattr/ACL syscalls use: callers that need to react to "no ACL present"
/// differently from "malformed wire data" should match on
/// [`Nfs4AclError::NoAttribute`] specifically; every other translation
/// failure collapses to [`Nfs4AclError::InvalidArgument`] by design — the
/// crate does not attempt to distinguish "this ACL is too rich to express
/// in POSIX" from "this ACL is malformed".
#[derive(Debug, Error)]
pub enum Nfs4AclError {
    /// Malformed wire buffer, unknown ACL type, non-directory default ACL
    /// request, empty principal string, or any NFSv4→POSIX translation
    /// that cannot be expressed in the POSIX model.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Allocation failure while building an ACL or scratch state.
    #[error("out of memory")]
    NoMemory,

    /// The operation is denied (e.g. a default ACL requested or set on a
    /// non-directory).
    #[error("access denied")]
    AccessDenied,

    /// A size-guess buffer was too small; the caller should retry with an
    /// exact allocation.
    #[error("buffer too small, retry with exact size")]
    RangeExceeded,

    /// No ACL extended attribute is present on the object.
    #[error("no such attribute")]
    NoAttribute,

    /// The filesystem or platform does not support the requested ACL model.
    #[error("not supported")]
    NotSupported,

    /// I/O error from a syscall (stat, xattr get/set, ACL get/set).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Nfs4AclError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Nfs4AclError::InvalidArgument(msg.into())
    }

    /// Public constructor for `InvalidArgument`, for use by integration
    /// tests (under `tests/`) that need to build a stub error from outside
    /// the crate without reaching for `pub(crate)` internals.
    #[must_use]
    pub fn invalid_for_test(msg: impl Into<String>) -> Self {
        Nfs4AclError::InvalidArgument(msg.into())
    }
}
