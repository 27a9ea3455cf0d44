//! Permission-mask mapping between POSIX rwx bits and NFSv4 access masks.

use crate::model::AccessMask;
use crate::posix::PosixPerm;

/// Access-mask bits granted to `EVERYONE@` regardless of POSIX permission:
/// attribute/ACL metadata reads that POSIX has no bit for.
const ANYONE_MODE: AccessMask = AccessMask(
    AccessMask::READ_ATTRIBUTES.bits()
        | AccessMask::READ_ACL.bits()
        | AccessMask::SYNCHRONIZE.bits(),
);

/// Additional bits granted only to the file/directory owner.
const OWNER_MODE: AccessMask = AccessMask(AccessMask::WRITE_ATTRIBUTES.bits() | AccessMask::WRITE_ACL.bits());

const READ_MODE: AccessMask = AccessMask(AccessMask::READ_DATA.bits());

const WRITE_MODE: AccessMask = AccessMask(
    AccessMask::WRITE_DATA.bits() | AccessMask::APPEND_DATA.bits(),
);

const EXECUTE_MODE: AccessMask = AccessMask(AccessMask::EXECUTE.bits());

/// Maps a POSIX permission triad to the NFSv4 access mask an ACE granting
/// that permission to `who` should carry.
///
/// `is_owner` adds the owner-only attribute/ACL-write bits; `is_directory`
/// adds `DELETE_CHILD` to the write bits (a directory's write permission
/// implies the ability to unlink children; a plain file's does not).
#[must_use]
pub fn get_mask(perm: PosixPerm, is_owner: bool, is_directory: bool) -> AccessMask {
    let mut mask = ANYONE_MODE;
    if is_owner {
        mask |= OWNER_MODE;
    }
    if perm.contains(PosixPerm::READ) {
        mask |= READ_MODE;
    }
    if perm.contains(PosixPerm::WRITE) {
        mask |= WRITE_MODE;
        if is_directory {
            mask |= AccessMask::DELETE_CHILD;
        }
    }
    if perm.contains(PosixPerm::EXECUTE) {
        mask |= EXECUTE_MODE;
    }
    mask
}

/// Derives the POSIX rwx triad a combined NFSv4 `{allow, deny}` state
/// implies, for the permissive (bitmask-accumulation) translation: a bit is
/// set in the result whenever any bit belonging to that mode's group is
/// allowed and not denied.
#[must_use]
pub fn set_mode_from_nfs4(allow: AccessMask, deny: AccessMask) -> PosixPerm {
    let effective = allow.difference(deny);
    let mut perm = PosixPerm::empty();
    if effective.intersects(READ_MODE) {
        perm |= PosixPerm::READ;
    }
    if effective.intersects(AccessMask(
        WRITE_MODE.bits() | AccessMask::DELETE_CHILD.bits(),
    )) {
        perm |= PosixPerm::WRITE;
    }
    if effective.intersects(EXECUTE_MODE) {
        perm |= PosixPerm::EXECUTE;
    }
    perm
}

/// Bits the canonical mask comparison ignores entirely: metadata bits that
/// every ACE is expected to carry and are irrelevant to the shape-driven
/// validator's "is this the pair I would have emitted" question.
///
/// `DELETE_CHILD` is directory-aware: a POSIX→NFSv4 translation only ever
/// sets it on a directory's write bits, so on a non-directory it must
/// participate in the comparison like any other bit, not be unconditionally
/// ignored. The original C `MASK_EQUAL` macro ignored it unconditionally,
/// which let a stray `DELETE_CHILD` bit on a non-directory ACE slip past the
/// validator undetected.
fn ignored_bits(is_directory: bool) -> AccessMask {
    let base = AccessMask(
        AccessMask::READ_ATTRIBUTES.bits()
            | AccessMask::READ_ACL.bits()
            | AccessMask::SYNCHRONIZE.bits()
            | AccessMask::WRITE_ATTRIBUTES.bits()
            | AccessMask::WRITE_ACL.bits(),
    );
    if is_directory {
        AccessMask(base.bits() | AccessMask::DELETE_CHILD.bits())
    } else {
        base
    }
}

/// Returns whether two masks are equal once the directory-aware ignored
/// bits are masked off both sides. Used by the shape-driven validator
/// (component E) to check an ACE's mask against the mask the canonical
/// POSIX→NFSv4 emission protocol would have produced.
#[must_use]
pub fn masks_equivalent(a: AccessMask, b: AccessMask, is_directory: bool) -> bool {
    let ignore = ignored_bits(is_directory);
    a.difference(ignore) == b.difference(ignore)
}
