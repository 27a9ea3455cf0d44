//! Probing and dispatch: decides which ACL representation a filesystem
//! object actually carries, and fetches/stores the raw xattr bytes.

use std::path::Path;

use crate::error::{Nfs4AclError, Result};
use crate::{NFS4_XATTR_NAME, POSIX_ACCESS_XATTR_NAME, POSIX_DEFAULT_XATTR_NAME};

/// Which representation a `get`/`set` call should use, decided by probing
/// for the presence of each xattr in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AclSource {
    /// `system.nfs4_acl` is present; use it directly.
    Nfs4,
    /// No NFSv4 xattr, but a `system.posix_acl_*` xattr is present.
    Posix,
    /// Neither xattr is present; synthesize a minimal ACL from the mode
    /// bits `stat` already returned.
    ModeBits,
}

fn xattr_name(default: bool) -> &'static str {
    if default {
        POSIX_DEFAULT_XATTR_NAME
    } else {
        POSIX_ACCESS_XATTR_NAME
    }
}

/// Probes which ACL representation `path` carries for the access (or, if
/// `default` is set, default) ACL.
///
/// # Errors
///
/// Returns [`Nfs4AclError::Io`] if the xattr probe itself fails for a
/// reason other than "attribute absent" (e.g. permission denied).
pub fn probe_path(path: &Path, default: bool) -> Result<AclSource> {
    if !default && xattr::get(path, NFS4_XATTR_NAME)?.is_some() {
        log_probe("nfs4 xattr present", path);
        return Ok(AclSource::Nfs4);
    }
    if xattr::get(path, xattr_name(default))?.is_some() {
        log_probe("posix xattr present", path);
        return Ok(AclSource::Posix);
    }
    log_probe("no ACL xattr present, falling back to mode bits", path);
    Ok(AclSource::ModeBits)
}

/// Reads the raw `system.nfs4_acl` xattr bytes for `path`.
///
/// # Errors
///
/// Returns [`Nfs4AclError::NoAttribute`] if the xattr is absent, or
/// [`Nfs4AclError::Io`] on any other syscall failure.
pub fn read_nfs4_xattr(path: &Path) -> Result<Vec<u8>> {
    xattr::get(path, NFS4_XATTR_NAME)?.ok_or(Nfs4AclError::NoAttribute)
}

/// Writes `buf` as the raw `system.nfs4_acl` xattr for `path`.
///
/// # Errors
///
/// Returns [`Nfs4AclError::Io`] on any syscall failure.
pub fn write_nfs4_xattr(path: &Path, buf: &[u8]) -> Result<()> {
    xattr::set(path, NFS4_XATTR_NAME, buf)?;
    Ok(())
}

/// Reads the raw `system.posix_acl_access` or `system.posix_acl_default`
/// xattr bytes for `path`.
///
/// # Errors
///
/// Returns [`Nfs4AclError::NoAttribute`] if the xattr is absent, or
/// [`Nfs4AclError::Io`] on any other syscall failure.
pub fn read_posix_xattr(path: &Path, default: bool) -> Result<Vec<u8>> {
    xattr::get(path, xattr_name(default))?.ok_or(Nfs4AclError::NoAttribute)
}

/// Returns whether `path` is a directory, via `stat` — needed because mask
/// semantics (`DELETE_CHILD`) and default-ACL eligibility depend on it.
///
/// # Errors
///
/// Returns [`Nfs4AclError::Io`] if `stat` fails.
pub fn is_directory(path: &Path) -> Result<bool> {
    let st = rustix::fs::stat(path).map_err(std::io::Error::from)?;
    Ok(rustix::fs::FileType::from_raw_mode(st.st_mode) == rustix::fs::FileType::Directory)
}

/// Same as [`is_directory`] but over an already-open file descriptor, for
/// the `_fd` entry points.
///
/// # Errors
///
/// Returns [`Nfs4AclError::Io`] if `fstat` fails.
pub fn is_directory_fd(fd: std::os::fd::BorrowedFd<'_>) -> Result<bool> {
    let st = rustix::fs::fstat(fd).map_err(std::io::Error::from)?;
    Ok(rustix::fs::FileType::from_raw_mode(st.st_mode) == rustix::fs::FileType::Directory)
}

#[cfg(feature = "tracing")]
fn log_probe(msg: &str, path: &Path) {
    tracing::debug!(path = %path.display(), "{msg}");
}

#[cfg(not(feature = "tracing"))]
fn log_probe(_msg: &str, _path: &Path) {}
