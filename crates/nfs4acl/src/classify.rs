//! Extended-file classification: decides whether an object's ACL carries
//! more information than its Unix mode bits already express.

use std::path::Path;

use crate::error::{Nfs4AclError, Result};
use crate::{NFS4_XATTR_NAME, POSIX_ACCESS_XATTR_NAME, POSIX_DEFAULT_XATTR_NAME};

/// Byte size of the Linux `posix_acl_xattr_header` (a 4-byte version field)
/// plus three `posix_acl_xattr_entry` records (`e_tag`/`e_perm`/`e_id`, 8
/// bytes each): the minimal encoding of the mandatory
/// `USER_OBJ`/`GROUP_OBJ`/`OTHER` triad, used as the "says nothing beyond
/// mode bits" baseline for a `system.posix_acl_*` xattr's raw length.
const POSIX_ACL_XATTR_BASELINE: usize = 4 + 3 * 8;

/// Recovers the POSIX.1e entry count an NFSv4 ACE count must have come
/// from, if `naces` is a shape the canonical POSIX→NFSv4 translator
/// (`posix_to_n4`) could have produced.
///
/// `0` ACEs map to `0` entries (no ACL at all). `6` ACEs (the owner/
/// group-owner/other triad, each emitted as a plain pair — no named entries
/// means no bracketing denies) map to the minimal `3`-entry ACL. `7` is
/// always invalid: it is the ACE count a 4-entry POSIX ACL would produce
/// (owner/group-owner/other plus a `Mask` entry with no named user or
/// group), but [`crate::posix::PosixAcl::validate`] rejects that
/// configuration outright, so no valid translation ever produces it. Beyond
/// that, each additional named user or group entry costs its own
/// bracketing denies, not a flat per-entry constant, so only counts of the
/// form `7 + 3k` recover a POSIX entry count (`4 + k`).
///
/// # Errors
///
/// Returns [`Nfs4AclError::InvalidArgument`] if `naces` cannot have been
/// produced by the canonical translator.
pub fn posix_entry_count_from_ace_count(naces: usize) -> Result<usize> {
    match naces {
        0 => Ok(0),
        6 => Ok(3),
        7 => Err(Nfs4AclError::invalid(
            "ACE count 7 cannot have come from a canonical POSIX translation",
        )),
        n if n > 7 && (n - 7) % 3 == 0 => Ok(4 + (n - 7) / 3),
        n => Err(Nfs4AclError::invalid(format!(
            "ACE count {n} cannot have come from a canonical POSIX translation"
        ))),
    }
}

/// Returns whether `naces` represents more than the minimal
/// owner/group-owner/other triad, i.e. the object has named user or group
/// entries beyond what its Unix mode bits alone could express.
///
/// # Errors
///
/// Propagates [`posix_entry_count_from_ace_count`]'s error.
pub fn is_extended_by_ace_count(naces: usize) -> Result<bool> {
    Ok(posix_entry_count_from_ace_count(naces)? > 3)
}

/// Returns whether a decoded POSIX xattr entry count represents more than
/// the minimal triad (used when the object carries a `system.posix_acl_*`
/// xattr directly rather than an NFSv4 one).
#[must_use]
pub fn is_extended_by_posix_entry_count(count: usize) -> bool {
    count > 3
}

/// Decides whether `path` carries a non-trivial ACL — one that expresses
/// more than its Unix mode bits already do (component H, the filesystem
/// entry point).
///
/// Checks the NFSv4 xattr first: if present and decodable, its ACE count
/// alone decides the answer via [`posix_entry_count_from_ace_count`].
/// Otherwise falls back to comparing the raw byte length of the POSIX
/// access and default xattrs (if present) against the three-entry baseline,
/// per spec component H — neither xattr being present at all means the
/// object is trivial (its ACL, if any, is exactly its mode bits).
///
/// # Errors
///
/// Returns [`Nfs4AclError::Io`] if a probing syscall fails for a reason
/// other than the attribute's absence, or an error from
/// [`posix_entry_count_from_ace_count`] if the NFSv4 xattr decodes to an ACE
/// count no canonical POSIX translation could have produced.
pub fn is_extended_file(path: &Path) -> Result<bool> {
    if let Some(buf) = xattr::get(path, NFS4_XATTR_NAME)? {
        let acl = crate::xdr::decode(&buf, crate::probe::is_directory(path)?)?;
        return is_extended_by_ace_count(acl.len());
    }

    if let Some(buf) = xattr::get(path, POSIX_ACCESS_XATTR_NAME)? {
        if buf.len() > POSIX_ACL_XATTR_BASELINE {
            return Ok(true);
        }
    }

    if let Some(buf) = xattr::get(path, POSIX_DEFAULT_XATTR_NAME)? {
        if buf.len() >= POSIX_ACL_XATTR_BASELINE {
            return Ok(true);
        }
    }

    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_aces_means_zero_entries_and_not_extended() {
        assert_eq!(posix_entry_count_from_ace_count(0).unwrap(), 0);
        assert!(!is_extended_by_ace_count(0).unwrap());
    }

    #[test]
    fn six_aces_is_the_minimal_triad() {
        assert_eq!(posix_entry_count_from_ace_count(6).unwrap(), 3);
        assert!(!is_extended_by_ace_count(6).unwrap());
    }

    #[test]
    fn ten_aces_is_one_named_entry_beyond_the_triad() {
        assert_eq!(posix_entry_count_from_ace_count(10).unwrap(), 4);
        assert!(is_extended_by_ace_count(10).unwrap());
    }

    #[test]
    fn thirteen_aces_is_two_named_entries_beyond_the_triad() {
        assert_eq!(posix_entry_count_from_ace_count(13).unwrap(), 5);
        assert!(is_extended_by_ace_count(13).unwrap());
    }

    #[test]
    fn seven_aces_is_always_invalid() {
        // 7 ACEs would correspond to a 4-entry POSIX ACL (triad + a lone
        // Mask entry with no named user/group), which `PosixAcl::validate`
        // never allows to be translated in the first place.
        assert!(posix_entry_count_from_ace_count(7).is_err());
    }

    #[test]
    fn counts_off_the_7_plus_3k_lattice_are_rejected() {
        assert!(posix_entry_count_from_ace_count(1).is_err());
        assert!(posix_entry_count_from_ace_count(5).is_err());
        assert!(posix_entry_count_from_ace_count(8).is_err());
        assert!(posix_entry_count_from_ace_count(9).is_err());
    }

    #[test]
    fn posix_entry_count_extended_threshold() {
        assert!(!is_extended_by_posix_entry_count(3));
        assert!(is_extended_by_posix_entry_count(4));
    }

    #[test]
    fn plain_file_with_no_acl_xattr_is_not_extended() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, b"hi").unwrap();
        assert!(!is_extended_file(&file).unwrap());
    }

    #[test]
    fn nfs4_xattr_with_six_aces_is_not_extended() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("trivial.txt");
        std::fs::write(&file, b"hi").unwrap();

        let mut acl = crate::model::Nfs4Acl::new(false);
        acl.add_pair(crate::model::AceFlags::empty(), crate::model::AccessMask::READ_DATA, "OWNER@");
        acl.add_pair(crate::model::AceFlags::empty(), crate::model::AccessMask::READ_DATA, "GROUP@");
        acl.add_pair(crate::model::AceFlags::empty(), crate::model::AccessMask::empty(), "EVERYONE@");
        let buf = crate::xdr::encode(&acl).unwrap();

        match xattr::set(&file, NFS4_XATTR_NAME, &buf) {
            Ok(()) => assert!(!is_extended_file(&file).unwrap()),
            Err(_) => {
                // Filesystem doesn't support arbitrary xattrs (e.g. tmpfs
                // without the right mount options) — not this test's concern.
            }
        }
    }

    #[test]
    fn nfs4_xattr_with_named_user_is_extended() {
        use crate::idmap::{IdMapConfig, IdMapper};
        use crate::posix::{PosixAcl, PosixEntry, PosixPerm, PosixTag};

        struct StubMapper;
        impl IdMapper for StubMapper {
            fn uid_to_name(&self, uid: u32, config: &IdMapConfig) -> Result<String> {
                Ok(format!("u{uid}@{}", config.domain))
            }
            fn gid_to_name(&self, gid: u32, config: &IdMapConfig) -> Result<String> {
                Ok(format!("g{gid}@{}", config.domain))
            }
            fn name_to_uid(&self, _name: &str, _config: &IdMapConfig) -> Result<u32> {
                unreachable!()
            }
            fn name_to_gid(&self, _name: &str, _config: &IdMapConfig) -> Result<u32> {
                unreachable!()
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("extended.txt");
        std::fs::write(&file, b"hi").unwrap();

        let mut posix = PosixAcl::new();
        posix.push(PosixEntry::new(PosixTag::UserObj, None, PosixPerm::all()));
        posix.push(PosixEntry::new(PosixTag::GroupObj, None, PosixPerm::READ));
        posix.push(PosixEntry::new(PosixTag::Other, None, PosixPerm::empty()));
        posix.push(PosixEntry::new(PosixTag::User, Some(1000), PosixPerm::READ));
        posix.push(PosixEntry::new(PosixTag::Mask, None, PosixPerm::READ));
        let config = IdMapConfig::new("example.com");
        let acl = crate::posix_to_n4::translate(
            &posix,
            false,
            crate::model::AceFlags::empty(),
            &StubMapper,
            &config,
        )
        .unwrap();
        assert_eq!(acl.len(), 10);
        let buf = crate::xdr::encode(&acl).unwrap();

        match xattr::set(&file, NFS4_XATTR_NAME, &buf) {
            Ok(()) => assert!(is_extended_file(&file).unwrap()),
            Err(_) => {}
        }
    }
}
