//! NFSv4 → POSIX.1e translation: the canonical bitmask-accumulation
//! algorithm, plus a debug-only shape validator.

use std::collections::HashMap;

use crate::error::{Nfs4AclError, Result};
use crate::idmap::{IdMapConfig, IdMapper};
use crate::mask::set_mode_from_nfs4;
use crate::model::{AccessMask, AceFlags, AceType, Nfs4Acl};
use crate::posix::{PosixAcl, PosixEntry, PosixTag};
use crate::whotype::{classify, WhoType};

/// Which POSIX ACL the caller is asking for: the access ACL that governs
/// the object itself, or the default ACL new children inherit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AclRequest {
    Access,
    Default,
}

#[derive(Debug, Clone, Copy, Default)]
struct AceState {
    allow: AccessMask,
    deny: AccessMask,
}

impl AceState {
    fn record_allow(&mut self, mask: AccessMask) {
        self.allow |= mask.difference(self.deny);
    }

    fn record_deny(&mut self, mask: AccessMask) {
        self.deny |= mask.difference(self.allow);
    }
}

/// Per-principal accumulation state, mirroring `struct posix_acl_state` from
/// `acl_n4tp_acl_trans.c`: four fixed scopes (`owner`/`group`/`other`/
/// `everyone`) plus the dynamic named-user and named-group arrays.
/// `everyone` is never materialised into a POSIX entry of its own — it exists
/// purely so a named principal first seen after some wider-scope allow has
/// already landed starts from that allow instead of from nothing.
struct State {
    owner: AceState,
    group: AceState,
    other: AceState,
    everyone: AceState,
    users: Vec<(String, AceState)>,
    groups: Vec<(String, AceState)>,
}

impl State {
    fn new() -> Self {
        Self {
            owner: AceState::default(),
            group: AceState::default(),
            other: AceState::default(),
            everyone: AceState::default(),
            users: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// Finds the named user's accumulation slot, creating one seeded from
    /// `everyone`'s state so far on first sight — matching `find_uid`'s
    /// `perms.allow = state->everyone.allow` (and `.deny`) seeding.
    fn user_mut(&mut self, who: &str) -> &mut AceState {
        let pos = match self.users.iter().position(|(w, _)| w == who) {
            Some(pos) => pos,
            None => {
                self.users.push((who.to_owned(), self.everyone));
                self.users.len() - 1
            }
        };
        &mut self.users[pos].1
    }

    /// Finds the named group's accumulation slot, creating one seeded from
    /// `other`'s state so far on first sight — matching `find_gid`'s
    /// `perms.allow = state->other.allow` (and `.deny`) seeding.
    fn group_mut(&mut self, who: &str) -> &mut AceState {
        let pos = match self.groups.iter().position(|(w, _)| w == who) {
            Some(pos) => pos,
            None => {
                self.groups.push((who.to_owned(), self.other));
                self.groups.len() - 1
            }
        };
        &mut self.groups[pos].1
    }

    fn allow_users(&mut self, mask: AccessMask) {
        for (_, s) in &mut self.users {
            s.record_allow(mask);
        }
    }

    fn deny_users(&mut self, mask: AccessMask) {
        for (_, s) in &mut self.users {
            s.record_deny(mask);
        }
    }

    fn allow_groups(&mut self, mask: AccessMask) {
        for (_, s) in &mut self.groups {
            s.record_allow(mask);
        }
    }

    fn deny_groups(&mut self, mask: AccessMask) {
        for (_, s) in &mut self.groups {
            s.record_deny(mask);
        }
    }
}

/// Strips ACEs irrelevant to the requested POSIX ACL kind before
/// translation, mirroring `acl_nfs4_check_inheritance`: an access ACL
/// ignores inherit-only ACEs (they exist solely to seed children), and a
/// default ACL considers only ACEs flagged to propagate to new children.
#[must_use]
pub fn filter_for_request(acl: &Nfs4Acl, request: AclRequest) -> Nfs4Acl {
    let filtered = acl
        .aces()
        .iter()
        .filter(|ace| match request {
            AclRequest::Access => !ace.flags.contains(AceFlags::INHERIT_ONLY),
            AclRequest::Default => ace
                .flags
                .intersects(AceFlags::FILE_INHERIT | AceFlags::DIRECTORY_INHERIT),
        })
        .cloned()
        .collect();
    Nfs4Acl::with_aces(acl.is_directory, filtered)
}

/// Translates an NFSv4 ACL into its POSIX.1e approximation using the
/// permissive bitmask-accumulation algorithm: for each principal, `ALLOW`
/// bits not already denied accumulate into `allow`; `DENY` bits not already
/// allowed accumulate into `deny`. Allows also propagate to wider scopes:
/// `EVERYONE@` reaches every scope seen so far (owner, group, other, and
/// every named user/group); `GROUP_OBJ`/a named group's allow reaches the
/// owner, the internal `everyone` bucket, and every named user seen so far;
/// a named user's allow reaches only the owner. A named user first seen
/// after one of these wider allows seeds from `everyone`'s current state
/// rather than from nothing; a named group seeds from `other`'s state,
/// which only `EVERYONE@` (not `GROUP_OBJ`) widens. The result's `Mask`
/// entry is the union of the group class (group-owner plus every named
/// user/group).
///
/// Audit/Alarm ACEs are skipped: they have no POSIX.1e analogue.
///
/// # Errors
///
/// Returns [`Nfs4AclError::InvalidArgument`] if a `who` string cannot be
/// classified, or if the identity mapper cannot resolve a named principal
/// to a uid/gid.
pub fn translate(acl: &Nfs4Acl, idmap: &dyn IdMapper, config: &IdMapConfig) -> Result<PosixAcl> {
    let mut state = State::new();

    for ace in acl.aces() {
        if !matches!(ace.ace_type, AceType::Allow | AceType::Deny) {
            continue;
        }
        let is_allow = ace.ace_type == AceType::Allow;
        let who_type = classify(&ace.who, ace.flags)?;

        match who_type {
            // Owner allows/denies never propagate anywhere else.
            WhoType::UserObj => {
                if is_allow {
                    state.owner.record_allow(ace.mask);
                } else {
                    state.owner.record_deny(ace.mask);
                }
            }
            // An allow to the owning group also widens the owner, the
            // everyone bucket (so later-seen named users seed from it), and
            // every named user already seen. A deny only narrows the group
            // itself.
            WhoType::GroupObj => {
                if is_allow {
                    state.group.record_allow(ace.mask);
                    let propagated = state.group.allow;
                    state.owner.record_allow(propagated);
                    state.everyone.record_allow(propagated);
                    state.allow_users(propagated);
                } else {
                    state.group.record_deny(ace.mask);
                }
            }
            // Same propagation as GROUP_OBJ, scoped to the one named group.
            WhoType::Group => {
                if is_allow {
                    let propagated = {
                        let s = state.group_mut(&ace.who);
                        s.record_allow(ace.mask);
                        s.allow
                    };
                    state.owner.record_allow(propagated);
                    state.everyone.record_allow(propagated);
                    state.allow_users(propagated);
                } else {
                    state.group_mut(&ace.who).record_deny(ace.mask);
                }
            }
            // A named-user allow only widens the owner, never the group
            // class or other named principals.
            WhoType::User => {
                if is_allow {
                    let propagated = {
                        let s = state.user_mut(&ace.who);
                        s.record_allow(ace.mask);
                        s.allow
                    };
                    state.owner.record_allow(propagated);
                } else {
                    state.user_mut(&ace.who).record_deny(ace.mask);
                }
            }
            // EVERYONE@ reaches every scope that exists so far: owner, the
            // owning group, other, the everyone bucket itself, and every
            // named user/group already seen.
            WhoType::Other => {
                if is_allow {
                    state.owner.record_allow(ace.mask);
                    state.group.record_allow(ace.mask);
                    state.other.record_allow(ace.mask);
                    state.everyone.record_allow(ace.mask);
                    state.allow_users(ace.mask);
                    state.allow_groups(ace.mask);
                } else {
                    state.owner.record_deny(ace.mask);
                    state.group.record_deny(ace.mask);
                    state.other.record_deny(ace.mask);
                    state.everyone.record_deny(ace.mask);
                    state.deny_users(ace.mask);
                    state.deny_groups(ace.mask);
                }
            }
        }
    }

    let mut posix = PosixAcl::new();
    posix.push(PosixEntry::new(
        PosixTag::UserObj,
        None,
        set_mode_from_nfs4(state.owner.allow, state.owner.deny),
    ));
    posix.push(PosixEntry::new(
        PosixTag::GroupObj,
        None,
        set_mode_from_nfs4(state.group.allow, state.group.deny),
    ));
    posix.push(PosixEntry::new(
        PosixTag::Other,
        None,
        set_mode_from_nfs4(state.other.allow, state.other.deny),
    ));

    let mut group_class_allow = state.group.allow;
    let mut group_class_deny = state.group.deny;

    let mut resolved_users: HashMap<u32, AceState> = HashMap::new();
    for (who, s) in &state.users {
        let uid = idmap.name_to_uid(who, config)?;
        let entry = resolved_users.entry(uid).or_default();
        entry.allow |= s.allow;
        entry.deny |= s.deny;
    }
    let mut uids: Vec<u32> = resolved_users.keys().copied().collect();
    uids.sort_unstable();
    for uid in uids {
        let s = resolved_users[&uid];
        group_class_allow |= s.allow;
        group_class_deny |= s.deny;
        posix.push(PosixEntry::new(
            PosixTag::User,
            Some(uid),
            set_mode_from_nfs4(s.allow, s.deny),
        ));
    }

    let mut resolved_groups: HashMap<u32, AceState> = HashMap::new();
    for (who, s) in &state.groups {
        let gid = idmap.name_to_gid(who, config)?;
        let entry = resolved_groups.entry(gid).or_default();
        entry.allow |= s.allow;
        entry.deny |= s.deny;
    }
    let mut gids: Vec<u32> = resolved_groups.keys().copied().collect();
    gids.sort_unstable();
    for gid in gids {
        let s = resolved_groups[&gid];
        group_class_allow |= s.allow;
        group_class_deny |= s.deny;
        posix.push(PosixEntry::new(
            PosixTag::Group,
            Some(gid),
            set_mode_from_nfs4(s.allow, s.deny),
        ));
    }

    if posix.has_named_entries() {
        posix.push(PosixEntry::new(
            PosixTag::Mask,
            None,
            set_mode_from_nfs4(group_class_allow, group_class_deny),
        ));
    }

    posix.validate()?;
    Ok(posix)
}

/// A second, debug-only translation path: rather than accumulating bits, it
/// expects the exact ACE shape the POSIX→NFSv4 translator (`posix_to_n4`)
/// would emit for some POSIX ACL, and fails if the input deviates. Useful
/// as a round-trip sanity check in tests; never used on the production
/// get/set path, since real-world NFSv4 ACLs routinely violate this shape
/// without being invalid.
///
/// The shape `posix_to_n4` emits is not a flat sequence of complementary
/// pairs: named users and groups are bracketed by a mask-synthesizing deny,
/// and the group class splits its allows from its denies across two passes
/// (see `posix_to_n4`'s module docs). This validator walks the ACE list as
/// a small state machine mirroring that emission order exactly.
pub mod shape {
    use crate::mask::masks_equivalent;
    use crate::model::{AceType, Nfs4Ace, Nfs4Acl};
    use crate::whotype::{classify, WhoType};

    use super::{Nfs4AclError, Result};

    fn expect<'a>(aces: &'a [Nfs4Ace], i: usize, what: &str) -> Result<&'a Nfs4Ace> {
        aces.get(i)
            .ok_or_else(|| Nfs4AclError::invalid(format!("ACE list ends before expected {what} at index {i}")))
    }

    fn complements(a: &Nfs4Ace, b: &Nfs4Ace, is_dir: bool) -> bool {
        a.who == b.who && a.flags == b.flags && masks_equivalent(a.mask, b.mask.complement(), is_dir)
    }

    /// Validates that `acl` matches the canonical sequence `posix_to_n4`
    /// emits: an owner pair; zero or more named users, each a
    /// `(DENY mask_mask, ALLOW, DENY ~allow)` triple; the group class
    /// (`GROUP@`'s optional deny-mask and allow, then each named group's
    /// deny-mask and allow, then `GROUP@`'s deny and each named group's
    /// deny in the same order); and a final `EVERYONE@` pair.
    ///
    /// # Errors
    ///
    /// Returns [`Nfs4AclError::InvalidArgument`] naming the point at which
    /// the ACE sequence deviates from that shape.
    pub fn validate_canonical_shape(acl: &Nfs4Acl) -> Result<()> {
        let aces = acl.aces();
        let is_dir = acl.is_directory;
        if aces.len() < 6 {
            return Err(Nfs4AclError::invalid("canonical shape requires at least the owner/group/everyone triad"));
        }

        let mut i = 0;

        // 1. Owner pair.
        let owner_allow = expect(aces, i, "owner allow")?;
        let owner_deny = expect(aces, i + 1, "owner deny")?;
        if owner_allow.who != "OWNER@" || owner_allow.ace_type != AceType::Allow {
            return Err(Nfs4AclError::invalid("first ACE must be the OWNER@ allow"));
        }
        if !complements(owner_allow, owner_deny, is_dir) {
            return Err(Nfs4AclError::invalid("owner allow/deny do not complement"));
        }
        i += 2;

        // 2. Named-user triples: DENY(mask_mask), ALLOW, DENY(~allow), all
        // sharing one `who`, until the next ACE is GROUP@.
        while i < aces.len() && classify(&aces[i].who, aces[i].flags).ok() == Some(WhoType::User) {
            let deny_mask = expect(aces, i, "user deny-mask")?;
            let allow = expect(aces, i + 1, "user allow")?;
            let deny = expect(aces, i + 2, "user deny")?;
            if deny_mask.ace_type != AceType::Deny || allow.ace_type != AceType::Allow || deny.ace_type != AceType::Deny {
                return Err(Nfs4AclError::invalid(format!("malformed named-user triple at index {i}")));
            }
            if deny_mask.who != allow.who || allow.who != deny.who {
                return Err(Nfs4AclError::invalid(format!("named-user triple at index {i} mixes principals")));
            }
            if !complements(allow, deny, is_dir) {
                return Err(Nfs4AclError::invalid(format!("named-user allow/deny at index {i} do not complement")));
            }
            i += 3;
        }

        // 3. GROUP@'s optional deny-mask, then its allow.
        if i < aces.len() && aces[i].who == "GROUP@" && aces[i].ace_type == AceType::Deny {
            i += 1;
        }
        let group_allow = expect(aces, i, "GROUP@ allow")?;
        if group_allow.who != "GROUP@" || group_allow.ace_type != AceType::Allow {
            return Err(Nfs4AclError::invalid(format!("expected GROUP@ allow at index {i}")));
        }
        i += 1;

        // 4. Named groups: DENY(mask_mask), ALLOW, in encounter order.
        let mut named_groups: Vec<&Nfs4Ace> = Vec::new();
        while i < aces.len() && classify(&aces[i].who, aces[i].flags).ok() == Some(WhoType::Group) {
            let deny_mask = expect(aces, i, "group deny-mask")?;
            let allow = expect(aces, i + 1, "group allow")?;
            if deny_mask.ace_type != AceType::Deny || allow.ace_type != AceType::Allow {
                return Err(Nfs4AclError::invalid(format!("malformed named-group pair at index {i}")));
            }
            if deny_mask.who != allow.who {
                return Err(Nfs4AclError::invalid(format!("named-group pair at index {i} mixes principals")));
            }
            named_groups.push(allow);
            i += 2;
        }

        // 5. Re-walk: GROUP@'s deny, then each named group's deny in order.
        let group_deny = expect(aces, i, "GROUP@ deny")?;
        if group_deny.who != "GROUP@" || group_deny.ace_type != AceType::Deny {
            return Err(Nfs4AclError::invalid(format!("expected GROUP@ deny at index {i}")));
        }
        if !complements(group_allow, group_deny, is_dir) {
            return Err(Nfs4AclError::invalid("GROUP@ allow/deny do not complement"));
        }
        i += 1;

        for allow in named_groups {
            let deny = expect(aces, i, "named-group deny")?;
            if deny.who != allow.who || deny.ace_type != AceType::Deny {
                return Err(Nfs4AclError::invalid(format!("expected deny for {} at index {i}", allow.who)));
            }
            if !complements(allow, deny, is_dir) {
                return Err(Nfs4AclError::invalid(format!("group allow/deny for {} do not complement", allow.who)));
            }
            i += 1;
        }

        // 6. EVERYONE@ pair.
        let everyone_allow = expect(aces, i, "EVERYONE@ allow")?;
        let everyone_deny = expect(aces, i + 1, "EVERYONE@ deny")?;
        if everyone_allow.who != "EVERYONE@" || everyone_allow.ace_type != AceType::Allow {
            return Err(Nfs4AclError::invalid(format!("expected EVERYONE@ allow at index {i}")));
        }
        if !complements(everyone_allow, everyone_deny, is_dir) {
            return Err(Nfs4AclError::invalid("EVERYONE@ allow/deny do not complement"));
        }
        i += 2;

        if i != aces.len() {
            return Err(Nfs4AclError::invalid(format!(
                "{} trailing ACE(s) after the canonical shape",
                aces.len() - i
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AccessMask, AceFlags, Nfs4Ace};

    struct StubMapper;
    impl IdMapper for StubMapper {
        fn uid_to_name(&self, uid: u32, config: &IdMapConfig) -> Result<String> {
            Ok(format!("u{uid}@{}", config.domain))
        }
        fn gid_to_name(&self, gid: u32, config: &IdMapConfig) -> Result<String> {
            Ok(format!("g{gid}@{}", config.domain))
        }
        fn name_to_uid(&self, name: &str, _config: &IdMapConfig) -> Result<u32> {
            name.split('@')
                .next()
                .and_then(|s| s.strip_prefix('u'))
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| Nfs4AclError::invalid("bad stub name"))
        }
        fn name_to_gid(&self, name: &str, _config: &IdMapConfig) -> Result<u32> {
            name.split('@')
                .next()
                .and_then(|s| s.strip_prefix('g'))
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| Nfs4AclError::invalid("bad stub name"))
        }
    }

    fn cfg() -> IdMapConfig {
        IdMapConfig::new("example.com")
    }

    #[test]
    fn simple_owner_group_other_translates_directly() {
        let mut acl = Nfs4Acl::new(false);
        acl.add_pair(AceFlags::empty(), AccessMask::READ_DATA | AccessMask::WRITE_DATA, "OWNER@");
        acl.add_pair(AceFlags::empty(), AccessMask::READ_DATA, "GROUP@");
        acl.add_pair(AceFlags::empty(), AccessMask::empty(), "EVERYONE@");

        let posix = translate(&acl, &StubMapper, &cfg()).unwrap();
        assert!(posix.find(PosixTag::UserObj, None).unwrap().perm.contains(crate::posix::PosixPerm::READ));
        assert!(posix.find(PosixTag::UserObj, None).unwrap().perm.contains(crate::posix::PosixPerm::WRITE));
        assert!(posix.find(PosixTag::GroupObj, None).unwrap().perm.contains(crate::posix::PosixPerm::READ));
        assert!(!posix.find(PosixTag::Other, None).unwrap().perm.contains(crate::posix::PosixPerm::READ));
        assert!(posix.mask().is_none());
    }

    #[test]
    fn named_user_gets_mask_entry() {
        let mut acl = Nfs4Acl::new(false);
        acl.add_pair(AceFlags::empty(), AccessMask::ALL, "OWNER@");
        acl.add_ace(Nfs4Ace::new(AceType::Allow, AceFlags::empty(), AccessMask::READ_DATA, "u1000@example.com"));
        acl.add_ace(Nfs4Ace::new(AceType::Deny, AceFlags::empty(), AccessMask::READ_DATA.complement(), "u1000@example.com"));
        acl.add_pair(AceFlags::empty(), AccessMask::empty(), "GROUP@");
        acl.add_pair(AceFlags::empty(), AccessMask::empty(), "EVERYONE@");

        let posix = translate(&acl, &StubMapper, &cfg()).unwrap();
        let user_entry = posix.find(PosixTag::User, Some(1000)).unwrap();
        assert!(user_entry.perm.contains(crate::posix::PosixPerm::READ));
        assert!(posix.mask().is_some());
    }

    #[test]
    fn everyone_allow_cascades_to_earlier_named_user() {
        let mut acl = Nfs4Acl::new(false);
        acl.add_pair(AceFlags::empty(), AccessMask::empty(), "OWNER@");
        acl.add_ace(Nfs4Ace::new(AceType::Allow, AceFlags::empty(), AccessMask::empty(), "u1000@example.com"));
        acl.add_ace(Nfs4Ace::new(AceType::Deny, AceFlags::empty(), AccessMask::WRITE_DATA, "u1000@example.com"));
        acl.add_pair(AceFlags::empty(), AccessMask::empty(), "GROUP@");
        acl.add_pair(AceFlags::empty(), AccessMask::READ_DATA, "EVERYONE@");

        let posix = translate(&acl, &StubMapper, &cfg()).unwrap();
        let user_entry = posix.find(PosixTag::User, Some(1000)).unwrap();
        assert!(user_entry.perm.contains(crate::posix::PosixPerm::READ));
    }

    #[test]
    fn group_obj_allow_propagates_to_owner_everyone_and_earlier_named_user() {
        let mut acl = Nfs4Acl::new(false);
        acl.add_pair(AceFlags::empty(), AccessMask::empty(), "OWNER@");
        acl.add_ace(Nfs4Ace::new(AceType::Allow, AceFlags::empty(), AccessMask::empty(), "u1000@example.com"));
        acl.add_pair(AceFlags::empty(), AccessMask::READ_DATA, "GROUP@");
        acl.add_pair(AceFlags::empty(), AccessMask::empty(), "EVERYONE@");
        // A second named user seen only after GROUP_OBJ's allow must seed
        // from `everyone`, which GROUP_OBJ's allow just widened to include
        // READ_DATA.
        acl.add_ace(Nfs4Ace::new(AceType::Allow, AceFlags::empty(), AccessMask::empty(), "u2000@example.com"));

        let posix = translate(&acl, &StubMapper, &cfg()).unwrap();
        assert!(posix.find(PosixTag::UserObj, None).unwrap().perm.contains(crate::posix::PosixPerm::READ));
        let first_user = posix.find(PosixTag::User, Some(1000)).unwrap();
        assert!(first_user.perm.contains(crate::posix::PosixPerm::READ));
        let second_user = posix.find(PosixTag::User, Some(2000)).unwrap();
        assert!(second_user.perm.contains(crate::posix::PosixPerm::READ));
    }

    #[test]
    fn named_group_seeds_new_entries_from_other_not_everyone() {
        let mut acl = Nfs4Acl::new(false);
        acl.add_pair(AceFlags::empty(), AccessMask::empty(), "OWNER@");
        // GROUP_OBJ's allow widens `everyone` (it propagates there) but
        // never touches `other` itself — only EVERYONE@ does that.
        acl.add_pair(AceFlags::empty(), AccessMask::READ_DATA, "GROUP@");
        acl.add_pair(AceFlags::empty(), AccessMask::empty(), "EVERYONE@");
        // A named group first seen here must seed from `other` (still
        // empty), not from the wider `everyone` GROUP_OBJ just grew.
        acl.add_ace(Nfs4Ace::new(
            AceType::Allow,
            AceFlags::IDENTIFIER_GROUP,
            AccessMask::empty(),
            "g2000@example.com",
        ));

        let posix = translate(&acl, &StubMapper, &cfg()).unwrap();
        let group_entry = posix.find(PosixTag::Group, Some(2000)).unwrap();
        assert!(!group_entry.perm.contains(crate::posix::PosixPerm::READ));
    }

    #[test]
    fn named_user_allow_propagates_only_to_owner_not_group_or_other_users() {
        let mut acl = Nfs4Acl::new(false);
        acl.add_pair(AceFlags::empty(), AccessMask::empty(), "OWNER@");
        acl.add_ace(Nfs4Ace::new(AceType::Allow, AceFlags::empty(), AccessMask::READ_DATA, "u1000@example.com"));
        acl.add_ace(Nfs4Ace::new(AceType::Allow, AceFlags::empty(), AccessMask::empty(), "u2000@example.com"));
        acl.add_pair(AceFlags::empty(), AccessMask::empty(), "GROUP@");
        acl.add_pair(AceFlags::empty(), AccessMask::empty(), "EVERYONE@");

        let posix = translate(&acl, &StubMapper, &cfg()).unwrap();
        assert!(posix.find(PosixTag::UserObj, None).unwrap().perm.contains(crate::posix::PosixPerm::READ));
        assert!(!posix.find(PosixTag::GroupObj, None).unwrap().perm.contains(crate::posix::PosixPerm::READ));
        let other_user = posix.find(PosixTag::User, Some(2000)).unwrap();
        assert!(!other_user.perm.contains(crate::posix::PosixPerm::READ));
    }

    #[test]
    fn filter_for_request_access_drops_inherit_only() {
        let mut acl = Nfs4Acl::new(true);
        acl.add_ace(Nfs4Ace::new(AceType::Allow, AceFlags::INHERIT_ONLY, AccessMask::READ_DATA, "OWNER@"));
        let filtered = filter_for_request(&acl, AclRequest::Access);
        assert!(filtered.is_empty());
    }

    #[test]
    fn filter_for_request_default_keeps_only_inheritable() {
        let mut acl = Nfs4Acl::new(true);
        acl.add_ace(Nfs4Ace::new(AceType::Allow, AceFlags::empty(), AccessMask::READ_DATA, "OWNER@"));
        acl.add_ace(Nfs4Ace::new(
            AceType::Allow,
            AceFlags::DIRECTORY_INHERIT,
            AccessMask::READ_DATA,
            "GROUP@",
        ));
        let filtered = filter_for_request(&acl, AclRequest::Default);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.aces()[0].who, "GROUP@");
    }

    #[test]
    fn shape_validator_accepts_canonical_output() {
        let mut acl = Nfs4Acl::new(false);
        acl.add_pair(AceFlags::empty(), AccessMask::READ_DATA, "OWNER@");
        acl.add_pair(AceFlags::empty(), AccessMask::empty(), "GROUP@");
        acl.add_pair(AceFlags::empty(), AccessMask::empty(), "EVERYONE@");
        assert!(shape::validate_canonical_shape(&acl).is_ok());
    }

    #[test]
    fn shape_validator_rejects_unpaired_aces() {
        let mut acl = Nfs4Acl::new(false);
        acl.add_ace(Nfs4Ace::new(AceType::Allow, AceFlags::empty(), AccessMask::READ_DATA, "OWNER@"));
        assert!(shape::validate_canonical_shape(&acl).is_err());
    }
}
