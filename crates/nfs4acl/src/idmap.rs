//! The identity-mapper collaborator: translates between numeric uid/gid and
//! NFSv4 `"name@domain"` principal strings.
//!
//! The spec treats this as an external collaborator specified only by
//! interface. A concrete, OS-backed implementation is provided so the crate
//! is usable and testable standalone; callers embedding this crate in a
//! larger identity-mapping system (e.g. one backed by `rpc.idmapd`'s own
//! nsswitch configuration) can supply their own [`IdMapper`] instead.

use std::ffi::CStr;
use std::mem::MaybeUninit;

use crate::error::{Nfs4AclError, Result};

/// Configuration the identity mapper needs: the NFSv4 domain suffix used
/// when composing and splitting `"name@domain"` principals.
///
/// Replaces the original implementation's process-wide `conf_path` global
/// (`acl_n4tp_set_who`'s `PATH_IDMAPDCONF`) with an explicit value the
/// caller constructs once and threads through every translation call.
#[derive(Debug, Clone)]
pub struct IdMapConfig {
    pub domain: String,
}

impl IdMapConfig {
    #[must_use]
    pub fn new(domain: impl Into<String>) -> Self {
        Self { domain: domain.into() }
    }
}

/// Resolves uid/gid values to/from NFSv4 principal name strings.
///
/// All name resolution is delegated uniformly here; unlike the original
/// implementation, there is no separate "foreign principal" code path to
/// fail out of (the original's `__nfs4_get_foreign_{uid,gid}_from_who`
/// always returned an error, since the bundled translator never actually
/// supported them) — a caller that wants cross-domain resolution supplies
/// an `IdMapper` that does it.
pub trait IdMapper {
    /// # Errors
    /// Returns [`Nfs4AclError::InvalidArgument`] if `uid` has no mapping.
    fn uid_to_name(&self, uid: u32, config: &IdMapConfig) -> Result<String>;

    /// # Errors
    /// Returns [`Nfs4AclError::InvalidArgument`] if `gid` has no mapping.
    fn gid_to_name(&self, gid: u32, config: &IdMapConfig) -> Result<String>;

    /// # Errors
    /// Returns [`Nfs4AclError::InvalidArgument`] if `name` has no mapping.
    fn name_to_uid(&self, name: &str, config: &IdMapConfig) -> Result<u32>;

    /// # Errors
    /// Returns [`Nfs4AclError::InvalidArgument`] if `name` has no mapping.
    fn name_to_gid(&self, name: &str, config: &IdMapConfig) -> Result<u32>;
}

/// An [`IdMapper`] backed by the system's NSS user/group databases via
/// `libc`'s reentrant `getpwnam_r`/`getpwuid_r`/`getgrnam_r`/`getgrgid_r`.
///
/// Grounded on `libacl/acl_nfs4_utils.c`'s
/// `__nfs4_get_local_uid_from_who`/`__nfs4_get_local_gid_from_who`, which
/// split `"name@domain"` on `@` and call `getpwnam`/`getgrnam` on the local
/// part.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemIdMapper;

impl IdMapper for SystemIdMapper {
    fn uid_to_name(&self, uid: u32, config: &IdMapConfig) -> Result<String> {
        let mut buf = vec![0_i8; 16384];
        let mut pwd = MaybeUninit::<libc::passwd>::uninit();
        let mut result: *mut libc::passwd = std::ptr::null_mut();

        let rc = unsafe {
            libc::getpwuid_r(
                uid,
                pwd.as_mut_ptr(),
                buf.as_mut_ptr(),
                buf.len(),
                &mut result,
            )
        };
        if rc != 0 || result.is_null() {
            return Err(Nfs4AclError::invalid(format!("no passwd entry for uid {uid}")));
        }
        let name = unsafe { CStr::from_ptr((*pwd.as_ptr()).pw_name) }
            .to_string_lossy()
            .into_owned();
        Ok(format!("{name}@{}", config.domain))
    }

    fn gid_to_name(&self, gid: u32, config: &IdMapConfig) -> Result<String> {
        let mut buf = vec![0_i8; 16384];
        let mut grp = MaybeUninit::<libc::group>::uninit();
        let mut result: *mut libc::group = std::ptr::null_mut();

        let rc = unsafe {
            libc::getgrgid_r(
                gid,
                grp.as_mut_ptr(),
                buf.as_mut_ptr(),
                buf.len(),
                &mut result,
            )
        };
        if rc != 0 || result.is_null() {
            return Err(Nfs4AclError::invalid(format!("no group entry for gid {gid}")));
        }
        let name = unsafe { CStr::from_ptr((*grp.as_ptr()).gr_name) }
            .to_string_lossy()
            .into_owned();
        Ok(format!("{name}@{}", config.domain))
    }

    fn name_to_uid(&self, name: &str, _config: &IdMapConfig) -> Result<u32> {
        let local = local_part(name);
        let cname = std::ffi::CString::new(local)
            .map_err(|_| Nfs4AclError::invalid("principal name contains a NUL byte"))?;

        let mut buf = vec![0_i8; 16384];
        let mut pwd = MaybeUninit::<libc::passwd>::uninit();
        let mut result: *mut libc::passwd = std::ptr::null_mut();

        let rc = unsafe {
            libc::getpwnam_r(
                cname.as_ptr(),
                pwd.as_mut_ptr(),
                buf.as_mut_ptr(),
                buf.len(),
                &mut result,
            )
        };
        if rc != 0 || result.is_null() {
            return Err(Nfs4AclError::invalid(format!("no passwd entry for {local}")));
        }
        Ok(unsafe { (*pwd.as_ptr()).pw_uid })
    }

    fn name_to_gid(&self, name: &str, _config: &IdMapConfig) -> Result<u32> {
        let local = local_part(name);
        let cname = std::ffi::CString::new(local)
            .map_err(|_| Nfs4AclError::invalid("principal name contains a NUL byte"))?;

        let mut buf = vec![0_i8; 16384];
        let mut grp = MaybeUninit::<libc::group>::uninit();
        let mut result: *mut libc::group = std::ptr::null_mut();

        let rc = unsafe {
            libc::getgrnam_r(
                cname.as_ptr(),
                grp.as_mut_ptr(),
                buf.as_mut_ptr(),
                buf.len(),
                &mut result,
            )
        };
        if rc != 0 || result.is_null() {
            return Err(Nfs4AclError::invalid(format!("no group entry for {local}")));
        }
        Ok(unsafe { (*grp.as_ptr()).gr_gid })
    }
}

fn local_part(name: &str) -> &str {
    name.split('@').next().unwrap_or(name)
}
