//! The public get/set entry points: component I. These tie the probe,
//! classifier, codec, and both translators together into the operations
//! callers actually invoke.

use std::path::Path;

use exacl::AclOption;

use crate::error::{Nfs4AclError, Result};
use crate::idmap::{IdMapConfig, IdMapper};
use crate::model::{AceFlags, Nfs4Acl};
use crate::n4_to_posix::{self, AclRequest};
use crate::posix::PosixAcl;
use crate::posix_to_n4;
use crate::probe::{self, AclSource};
use crate::xdr;

/// Which of an object's two POSIX.1e ACLs a caller is asking for: the
/// access ACL every filesystem object has, or the default ACL only
/// directories carry (and which seeds new children's access ACL).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AclType {
    Access,
    Default,
}

impl AclType {
    fn is_default(self) -> bool {
        matches!(self, AclType::Default)
    }

    fn to_request(self) -> AclRequest {
        match self {
            AclType::Access => AclRequest::Access,
            AclType::Default => AclRequest::Default,
        }
    }

    fn inherit_flags(self) -> AceFlags {
        match self {
            AclType::Access => AceFlags::empty(),
            AclType::Default => AceFlags::FILE_INHERIT | AceFlags::DIRECTORY_INHERIT,
        }
    }
}

/// Reads `path`'s POSIX.1e ACL (access or default), translating from
/// whichever representation the object actually carries.
///
/// A default-ACL request on a non-directory is refused, matching
/// `acl_get_file`'s behavior for `ACL_TYPE_DEFAULT`.
///
/// # Errors
///
/// Returns [`Nfs4AclError::AccessDenied`] for a default-ACL request on a
/// non-directory, [`Nfs4AclError::NoAttribute`] if no ACL information is
/// present at all, or any propagated translation/I-O error.
pub fn get_acl(
    path: &Path,
    acl_type: AclType,
    idmap: &dyn IdMapper,
    config: &IdMapConfig,
) -> Result<PosixAcl> {
    let is_directory = probe::is_directory(path)?;
    if acl_type.is_default() && !is_directory {
        return Err(Nfs4AclError::AccessDenied);
    }

    match probe::probe_path(path, acl_type.is_default())? {
        AclSource::Nfs4 => {
            let buf = probe::read_nfs4_xattr(path)?;
            let acl = xdr::decode(&buf, is_directory)?;
            let filtered = n4_to_posix::filter_for_request(&acl, acl_type.to_request());
            n4_to_posix::translate(&filtered, idmap, config)
        }
        AclSource::Posix => {
            let entries = exacl::getfacl(path, Some(exacl_options(acl_type, is_directory)))
                .map_err(Nfs4AclError::Io)?;
            PosixAcl::from_exacl_entries(&entries)
        }
        AclSource::ModeBits => {
            if acl_type.is_default() {
                return Err(Nfs4AclError::NoAttribute);
            }
            let mode = std::fs::metadata(path)?.permissions();
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                Ok(PosixAcl::from_mode(mode.mode()))
            }
            #[cfg(not(unix))]
            {
                let _ = mode;
                Err(Nfs4AclError::NotSupported)
            }
        }
    }
}

/// Writes `acl` as `path`'s POSIX.1e ACL (access or default).
///
/// When the object already carries an NFSv4 ACL, the new POSIX ACL is
/// translated to NFSv4 and merged in so that any existing ACEs governing
/// the *other* ACL type (e.g. inherit-only ACEs when writing the access
/// ACL) survive, matching `acl_set_file`'s preservation behavior. Otherwise
/// it is written directly as a `system.posix_acl_*` xattr via `exacl`.
///
/// # Errors
///
/// Returns [`Nfs4AclError::AccessDenied`] for a default-ACL request on a
/// non-directory, or any propagated translation/I-O error.
pub fn set_acl(
    path: &Path,
    acl_type: AclType,
    acl: &PosixAcl,
    idmap: &dyn IdMapper,
    config: &IdMapConfig,
) -> Result<()> {
    let is_directory = probe::is_directory(path)?;
    if acl_type.is_default() && !is_directory {
        return Err(Nfs4AclError::AccessDenied);
    }

    let existing_nfs4 = match probe::read_nfs4_xattr(path) {
        Ok(buf) => Some(xdr::decode(&buf, is_directory)?),
        Err(Nfs4AclError::NoAttribute) => None,
        Err(e) => return Err(e),
    };

    if let Some(existing) = existing_nfs4 {
        let new_half = posix_to_n4::translate(acl, is_directory, acl_type.inherit_flags(), idmap, config)?;
        let other_request = match acl_type {
            AclType::Access => AclRequest::Default,
            AclType::Default => AclRequest::Access,
        };
        let preserved = n4_to_posix::filter_for_request(&existing, other_request);

        let mut merged = Nfs4Acl::new(is_directory);
        for ace in new_half.aces() {
            merged.add_ace(ace.clone());
        }
        for ace in preserved.aces() {
            merged.add_ace(ace.clone());
        }

        let buf = xdr::encode(&merged)?;
        probe::write_nfs4_xattr(path, &buf)
    } else {
        let entries = acl.to_exacl_entries(acl_type.is_default())?;
        exacl::setfacl(&[path], &entries, Some(exacl_options(acl_type, is_directory)))
            .map_err(Nfs4AclError::Io)
    }
}

/// Reads `fd`'s POSIX.1e ACL, resolving it to a path through
/// `/proc/self/fd` and delegating to [`get_acl`]. The xattr and `exacl`
/// syscall surfaces this crate relies on are path-based; going through the
/// magic symlink avoids reopening the file (and racing a rename) while
/// reusing the same probe/translate logic for both entry points.
///
/// # Errors
///
/// See [`get_acl`].
pub fn get_acl_fd(
    fd: std::os::fd::BorrowedFd<'_>,
    acl_type: AclType,
    idmap: &dyn IdMapper,
    config: &IdMapConfig,
) -> Result<PosixAcl> {
    get_acl(&fd_path(fd), acl_type, idmap, config)
}

/// Writes `fd`'s POSIX.1e ACL. See [`get_acl_fd`] for why this goes through
/// `/proc/self/fd`.
///
/// # Errors
///
/// See [`set_acl`].
pub fn set_acl_fd(
    fd: std::os::fd::BorrowedFd<'_>,
    acl_type: AclType,
    acl: &PosixAcl,
    idmap: &dyn IdMapper,
    config: &IdMapConfig,
) -> Result<()> {
    set_acl(&fd_path(fd), acl_type, acl, idmap, config)
}

fn fd_path(fd: std::os::fd::BorrowedFd<'_>) -> std::path::PathBuf {
    use std::os::fd::AsRawFd;
    std::path::PathBuf::from(format!("/proc/self/fd/{}", fd.as_raw_fd()))
}

fn exacl_options(acl_type: AclType, is_directory: bool) -> AclOption {
    let mut opts = AclOption::empty();
    if acl_type.is_default() && is_directory {
        opts |= AclOption::DEFAULT_ACL;
    }
    opts
}
