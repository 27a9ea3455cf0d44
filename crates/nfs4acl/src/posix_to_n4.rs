//! POSIX.1e → NFSv4 translation: the lossless direction. Every POSIX entry
//! has an exact NFSv4 rendering, so this emits the canonical ACE sequence
//! the debug-only shape validator in [`crate::n4_to_posix::shape`] checks
//! for.
//!
//! Named-user and named-group entries are not rendered as a plain
//! complementary pair. Each is *bracketed* by a mask-synthesizing `DENY`
//! carrying the complement of the POSIX `Mask` entry's permission, so that
//! NFSv4's first-matching-ACE evaluation reproduces the POSIX rule that a
//! named entry's effective permission is its own bits intersected with the
//! mask. The group class additionally splits its `ALLOW`s from its `DENY`s
//! across two passes (`emit_group_class` / the final re-walk), since a
//! principal may belong to several groups and every group's allow bits must
//! accumulate before any deny trims them — collapsing allow immediately
//! followed by deny per group would let an earlier group's deny shadow a
//! later group's allow for the same principal.

use crate::error::{Nfs4AclError, Result};
use crate::idmap::{IdMapConfig, IdMapper};
use crate::mask::get_mask;
use crate::model::{AccessMask, AceFlags, AceType, Nfs4Ace, Nfs4Acl};
use crate::posix::{PosixAcl, PosixTag};

/// Translates a POSIX.1e ACL into its NFSv4 equivalent.
///
/// Emission order: the owner pair; each named user bracketed by a
/// mask-synthesizing deny; the group class (group-owner and every named
/// group, allows first, then the matching denies); and finally the
/// `EVERYONE@` pair derived from `Other`.
///
/// # Errors
///
/// Returns an error if `acl` fails [`PosixAcl::validate`] or has fewer than
/// three entries, or if the identity mapper cannot resolve a named entry's
/// uid/gid to a principal name.
pub fn translate(
    acl: &PosixAcl,
    is_directory: bool,
    flags: AceFlags,
    idmap: &dyn IdMapper,
    config: &IdMapConfig,
) -> Result<Nfs4Acl> {
    acl.validate()?;
    if acl.entries().len() < 3 {
        return Err(Nfs4AclError::invalid("posix acl must have at least 3 entries"));
    }

    let mut out = Nfs4Acl::new(is_directory);

    // `validate()` above already guarantees each of these exists exactly
    // once; these lookups cannot fail.
    let user_obj_perm = acl
        .find(PosixTag::UserObj, None)
        .ok_or_else(|| Nfs4AclError::invalid("posix acl missing user_obj entry after validation"))?
        .perm;
    let group_obj_perm = acl
        .find(PosixTag::GroupObj, None)
        .ok_or_else(|| Nfs4AclError::invalid("posix acl missing group_obj entry after validation"))?
        .perm;
    let other_perm = acl
        .find(PosixTag::Other, None)
        .ok_or_else(|| Nfs4AclError::invalid("posix acl missing other entry after validation"))?
        .perm;

    // The bitmask used by every bracketing deny: the complement of the
    // class mask's own NFSv4 rendering. With no `Mask` entry (the bare
    // three-entry ACL), there is nothing to narrow, so the deny is a no-op.
    let mask_mask = acl
        .mask()
        .map_or(AccessMask::NONE, |perm| get_mask(perm, false, is_directory).complement());

    let has_extra = acl.entries().len() > 3;

    // 1. Owner pair: never bracketed, never limited by the class mask.
    out.add_pair(flags, get_mask(user_obj_perm, true, is_directory), "OWNER@");

    // 2. Named users: a deny-mask ACE followed by that user's own pair.
    for entry in acl.entries().iter().filter(|e| e.tag == PosixTag::User) {
        let uid = entry
            .qualifier
            .ok_or_else(|| Nfs4AclError::invalid("named user entry missing uid"))?;
        let name = idmap.uid_to_name(uid, config)?;
        out.add_ace(Nfs4Ace::new(AceType::Deny, flags, mask_mask, name.clone()));
        out.add_pair(flags, get_mask(entry.perm, false, is_directory), name);
    }

    // 3-4. Group class: GROUP@'s deny-mask (only once the ACL carries more
    // than the bare triad) and allow, then each named group's deny-mask and
    // allow. Every named group's own deny is deferred to the re-walk below.
    if has_extra {
        out.add_ace(Nfs4Ace::new(AceType::Deny, flags, mask_mask, "GROUP@"));
    }
    let group_mask = get_mask(group_obj_perm, false, is_directory);
    out.add_ace(Nfs4Ace::new(AceType::Allow, flags, group_mask, "GROUP@"));

    let mut named_groups = Vec::new();
    for entry in acl.entries().iter().filter(|e| e.tag == PosixTag::Group) {
        let gid = entry
            .qualifier
            .ok_or_else(|| Nfs4AclError::invalid("named group entry missing gid"))?;
        let name = idmap.gid_to_name(gid, config)?;
        out.add_ace(Nfs4Ace::new(AceType::Deny, flags, mask_mask, name.clone()));
        let mask = get_mask(entry.perm, false, is_directory);
        out.add_ace(Nfs4Ace::new(AceType::Allow, flags, mask, name.clone()));
        named_groups.push((name, mask));
    }

    // 5. Re-walk from GROUP_OBJ onward, emitting the deny half of every
    // group-class allow now that all of the class's allows have landed.
    out.add_ace(Nfs4Ace::new(AceType::Deny, flags, group_mask.complement(), "GROUP@"));
    for (name, mask) in named_groups {
        out.add_ace(Nfs4Ace::new(AceType::Deny, flags, mask.complement(), name));
    }

    // 6. EVERYONE@ pair from Other: never bracketed, never limited by the
    // class mask.
    out.add_pair(flags, get_mask(other_perm, false, is_directory), "EVERYONE@");

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::n4_to_posix::shape;
    use crate::posix::{PosixEntry, PosixPerm};

    struct StubMapper;
    impl IdMapper for StubMapper {
        fn uid_to_name(&self, uid: u32, config: &IdMapConfig) -> Result<String> {
            Ok(format!("u{uid}@{}", config.domain))
        }
        fn gid_to_name(&self, gid: u32, config: &IdMapConfig) -> Result<String> {
            Ok(format!("g{gid}@{}", config.domain))
        }
        fn name_to_uid(&self, _name: &str, _config: &IdMapConfig) -> Result<u32> {
            unreachable!("not needed for posix_to_n4 translation")
        }
        fn name_to_gid(&self, _name: &str, _config: &IdMapConfig) -> Result<u32> {
            unreachable!("not needed for posix_to_n4 translation")
        }
    }

    fn cfg() -> IdMapConfig {
        IdMapConfig::new("example.com")
    }

    #[test]
    fn bare_triad_produces_six_aces_with_no_bracketing_denies() {
        let mut acl = PosixAcl::new();
        acl.push(PosixEntry::new(PosixTag::UserObj, None, PosixPerm::all()));
        acl.push(PosixEntry::new(PosixTag::GroupObj, None, PosixPerm::READ));
        acl.push(PosixEntry::new(PosixTag::Other, None, PosixPerm::empty()));

        let nfs4 = translate(&acl, false, AceFlags::empty(), &StubMapper, &cfg()).unwrap();
        assert_eq!(nfs4.len(), 6);
        assert!(shape::validate_canonical_shape(&nfs4).is_ok());
    }

    #[test]
    fn single_named_user_produces_ten_aces() {
        // owner pair (2) + [deny-mask, allow, deny] for the user (3) +
        // [deny-mask, allow] for GROUP@ (2) + GROUP@'s deferred deny (1) +
        // everyone pair (2) = 10.
        let mut acl = PosixAcl::new();
        acl.push(PosixEntry::new(PosixTag::UserObj, None, PosixPerm::all()));
        acl.push(PosixEntry::new(PosixTag::GroupObj, None, PosixPerm::READ));
        acl.push(PosixEntry::new(PosixTag::Other, None, PosixPerm::empty()));
        acl.push(PosixEntry::new(PosixTag::User, Some(1000), PosixPerm::READ));
        acl.push(PosixEntry::new(PosixTag::Mask, None, PosixPerm::READ));

        let nfs4 = translate(&acl, false, AceFlags::empty(), &StubMapper, &cfg()).unwrap();
        assert_eq!(nfs4.len(), 10);
        assert!(shape::validate_canonical_shape(&nfs4).is_ok());

        let deny_mask = nfs4
            .aces()
            .iter()
            .find(|a| a.who == "u1000@example.com" && a.is_deny())
            .unwrap();
        // The bracketing deny precedes the allow and denies the complement
        // of the mask entry's READ permission: WRITE|EXECUTE (and metadata
        // bits), not the complement of the user's own granted permission.
        assert!(deny_mask.mask.contains(crate::model::AccessMask::WRITE_DATA));
    }

    #[test]
    fn named_user_and_group_round_trip_through_shape_validator() {
        let mut acl = PosixAcl::new();
        acl.push(PosixEntry::new(PosixTag::UserObj, None, PosixPerm::all()));
        acl.push(PosixEntry::new(PosixTag::GroupObj, None, PosixPerm::READ));
        acl.push(PosixEntry::new(PosixTag::Other, None, PosixPerm::empty()));
        acl.push(PosixEntry::new(PosixTag::User, Some(1000), PosixPerm::READ | PosixPerm::WRITE));
        acl.push(PosixEntry::new(PosixTag::Group, Some(2000), PosixPerm::READ));
        acl.push(PosixEntry::new(PosixTag::Mask, None, PosixPerm::READ | PosixPerm::WRITE));

        let nfs4 = translate(&acl, false, AceFlags::empty(), &StubMapper, &cfg()).unwrap();
        assert!(shape::validate_canonical_shape(&nfs4).is_ok());
        assert!(nfs4.aces().iter().any(|a| a.who == "u1000@example.com"));
        assert!(nfs4.aces().iter().any(|a| a.who == "g2000@example.com"));
    }

    #[test]
    fn two_named_groups_accumulate_allow_before_either_deny() {
        // Both named groups' ALLOWs must land before either group's DENY,
        // so a principal in both groups gets the union of their bits
        // before any group-specific deny can trim it.
        let mut acl = PosixAcl::new();
        acl.push(PosixEntry::new(PosixTag::UserObj, None, PosixPerm::all()));
        acl.push(PosixEntry::new(PosixTag::GroupObj, None, PosixPerm::empty()));
        acl.push(PosixEntry::new(PosixTag::Other, None, PosixPerm::empty()));
        acl.push(PosixEntry::new(PosixTag::Group, Some(10), PosixPerm::READ));
        acl.push(PosixEntry::new(PosixTag::Group, Some(20), PosixPerm::WRITE));
        acl.push(PosixEntry::new(PosixTag::Mask, None, PosixPerm::READ | PosixPerm::WRITE));

        let nfs4 = translate(&acl, false, AceFlags::empty(), &StubMapper, &cfg()).unwrap();
        let is_group = |a: &Nfs4Ace| a.who == "g10@example.com" || a.who == "g20@example.com";
        let last_allow = nfs4
            .aces()
            .iter()
            .rposition(|a| is_group(a) && a.is_allow())
            .unwrap();
        let first_deny = nfs4
            .aces()
            .iter()
            .position(|a| is_group(a) && a.is_deny())
            .unwrap();
        // Every group-class allow precedes every group-class deny: no deny
        // for either group appears interleaved with an allow for the other.
        assert!(first_deny > last_allow);
    }

    #[test]
    fn named_group_deny_mask_uses_class_mask_not_own_permission() {
        let mut acl = PosixAcl::new();
        acl.push(PosixEntry::new(PosixTag::UserObj, None, PosixPerm::all()));
        acl.push(PosixEntry::new(PosixTag::GroupObj, None, PosixPerm::empty()));
        acl.push(PosixEntry::new(PosixTag::Other, None, PosixPerm::empty()));
        acl.push(PosixEntry::new(PosixTag::Group, Some(2000), PosixPerm::READ | PosixPerm::WRITE));
        acl.push(PosixEntry::new(PosixTag::Mask, None, PosixPerm::READ));

        let nfs4 = translate(&acl, false, AceFlags::empty(), &StubMapper, &cfg()).unwrap();
        let deny_mask = nfs4
            .aces()
            .iter()
            .find(|a| a.who == "g2000@example.com" && a.is_deny() && a.mask.contains(crate::model::AccessMask::WRITE_DATA))
            .unwrap();
        // WRITE is in the group's own permission but outside the class
        // mask's READ-only permission, so the bracketing deny must carry it.
        assert!(deny_mask.mask.contains(crate::model::AccessMask::WRITE_DATA));
    }

    #[test]
    fn rejects_acl_missing_required_entries() {
        let acl = PosixAcl::new();
        assert!(translate(&acl, false, AceFlags::empty(), &StubMapper, &cfg()).is_err());
    }
}
