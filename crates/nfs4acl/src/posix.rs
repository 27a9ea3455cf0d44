//! The POSIX.1e ACL in-memory model, and the adapter to/from `exacl`'s
//! `AclEntry` for the actual filesystem round trip.

use bitflags::bitflags;
use exacl::{AclEntry, AclEntryKind, Flag, Perm};

use crate::error::{Nfs4AclError, Result};

bitflags! {
    /// The POSIX.1e rwx triad.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PosixPerm: u8 {
        const READ    = 0b100;
        const WRITE   = 0b010;
        const EXECUTE = 0b001;
    }
}

/// The six POSIX.1e entry tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PosixTag {
    UserObj,
    User,
    GroupObj,
    Group,
    Mask,
    Other,
}

/// A single POSIX.1e ACL entry. `qualifier` is `Some(uid_or_gid)` for
/// `User`/`Group` entries and `None` otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosixEntry {
    pub tag: PosixTag,
    pub qualifier: Option<u32>,
    pub perm: PosixPerm,
}

impl PosixEntry {
    #[must_use]
    pub fn new(tag: PosixTag, qualifier: Option<u32>, perm: PosixPerm) -> Self {
        Self { tag, qualifier, perm }
    }
}

/// A POSIX.1e ACL: an unordered entry set (unlike NFSv4, entry order is not
/// semantically meaningful) plus at most one `Mask` entry.
#[derive(Debug, Clone, Default)]
pub struct PosixAcl {
    entries: Vec<PosixEntry>,
}

impl PosixAcl {
    #[must_use]
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    #[must_use]
    pub fn with_entries(entries: Vec<PosixEntry>) -> Self {
        Self { entries }
    }

    pub fn push(&mut self, entry: PosixEntry) {
        self.entries.push(entry);
    }

    #[must_use]
    pub fn entries(&self) -> &[PosixEntry] {
        &self.entries
    }

    #[must_use]
    pub fn find(&self, tag: PosixTag, qualifier: Option<u32>) -> Option<&PosixEntry> {
        self.entries
            .iter()
            .find(|e| e.tag == tag && e.qualifier == qualifier)
    }

    #[must_use]
    pub fn mask(&self) -> Option<PosixPerm> {
        self.find(PosixTag::Mask, None).map(|e| e.perm)
    }

    #[must_use]
    pub fn has_named_entries(&self) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e.tag, PosixTag::User | PosixTag::Group))
    }

    /// Synthesizes a minimal three-entry ACL (`UserObj`/`GroupObj`/`Other`)
    /// from a Unix mode's rwx triads, for objects that carry no ACL xattr
    /// at all (component G/H fallback).
    #[must_use]
    pub fn from_mode(mode: u32) -> Self {
        let mut acl = Self::new();
        acl.push(PosixEntry::new(
            PosixTag::UserObj,
            None,
            mode_triad(mode, 6),
        ));
        acl.push(PosixEntry::new(
            PosixTag::GroupObj,
            None,
            mode_triad(mode, 3),
        ));
        acl.push(PosixEntry::new(PosixTag::Other, None, mode_triad(mode, 0)));
        acl
    }

    /// Validates that the minimal required entries (`UserObj`, `GroupObj`,
    /// `Other`, and a `Mask` whenever named entries are present) are
    /// present exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`Nfs4AclError::InvalidArgument`] describing the first
    /// missing or duplicated required entry.
    pub fn validate(&self) -> Result<()> {
        for (tag, label) in [
            (PosixTag::UserObj, "user_obj"),
            (PosixTag::GroupObj, "group_obj"),
            (PosixTag::Other, "other"),
        ] {
            let count = self.entries.iter().filter(|e| e.tag == tag).count();
            if count == 0 {
                return Err(Nfs4AclError::invalid(format!("missing required entry \"{label}\"")));
            }
            if count > 1 {
                return Err(Nfs4AclError::invalid(format!("duplicate required entry \"{label}\"")));
            }
        }
        if self.has_named_entries() && self.mask().is_none() {
            return Err(Nfs4AclError::invalid("missing required entry \"mask\""));
        }
        if !self.has_named_entries() && self.mask().is_some() {
            return Err(Nfs4AclError::invalid(
                "extraneous \"mask\" entry with no named user/group entries",
            ));
        }
        Ok(())
    }

    /// Converts to a vector of `exacl::AclEntry`, for use with
    /// `exacl::setfacl`.
    ///
    /// # Errors
    ///
    /// Returns [`Nfs4AclError::InvalidArgument`] if a `User`/`Group` entry
    /// carries no qualifier.
    pub fn to_exacl_entries(&self, default: bool) -> Result<Vec<AclEntry>> {
        let flags = if default { Flag::DEFAULT } else { Flag::empty() };
        let mut out = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let perms = to_exacl_perm(entry.perm);
            let (kind, name) = match entry.tag {
                PosixTag::UserObj => (AclEntryKind::User, String::new()),
                PosixTag::GroupObj => (AclEntryKind::Group, String::new()),
                PosixTag::Other => (AclEntryKind::Other, String::new()),
                PosixTag::Mask => (AclEntryKind::Mask, String::new()),
                PosixTag::User => (
                    AclEntryKind::User,
                    entry
                        .qualifier
                        .ok_or_else(|| Nfs4AclError::invalid("user entry missing uid"))?
                        .to_string(),
                ),
                PosixTag::Group => (
                    AclEntryKind::Group,
                    entry
                        .qualifier
                        .ok_or_else(|| Nfs4AclError::invalid("group entry missing gid"))?
                        .to_string(),
                ),
            };
            out.push(AclEntry {
                kind,
                name,
                perms,
                flags,
                allow: true,
            });
        }
        Ok(out)
    }

    /// Builds a [`PosixAcl`] from the entries `exacl` returned from reading
    /// a filesystem object's ACL.
    ///
    /// # Errors
    ///
    /// Returns [`Nfs4AclError::InvalidArgument`] on an unrecognised entry
    /// kind (audit/alarm-only platforms are not expected to surface here,
    /// since `exacl` only exposes POSIX-shaped entries on this code path).
    pub fn from_exacl_entries(entries: &[AclEntry]) -> Result<Self> {
        let mut acl = Self::new();
        for entry in entries {
            let perm = from_exacl_perm(entry.perms);
            let (tag, qualifier) = match entry.kind {
                AclEntryKind::User if entry.name.is_empty() => (PosixTag::UserObj, None),
                AclEntryKind::User => (
                    PosixTag::User,
                    Some(entry.name.parse::<u32>().map_err(|_| {
                        Nfs4AclError::invalid(format!("non-numeric user qualifier {:?}", entry.name))
                    })?),
                ),
                AclEntryKind::Group if entry.name.is_empty() => (PosixTag::GroupObj, None),
                AclEntryKind::Group => (
                    PosixTag::Group,
                    Some(entry.name.parse::<u32>().map_err(|_| {
                        Nfs4AclError::invalid(format!("non-numeric group qualifier {:?}", entry.name))
                    })?),
                ),
                AclEntryKind::Mask => (PosixTag::Mask, None),
                AclEntryKind::Other => (PosixTag::Other, None),
                other => {
                    return Err(Nfs4AclError::invalid(format!("unsupported ACL entry kind {other:?}")))
                }
            };
            acl.push(PosixEntry::new(tag, qualifier, perm));
        }
        Ok(acl)
    }
}

fn mode_triad(mode: u32, shift: u32) -> PosixPerm {
    let bits = (mode >> shift) & 0b111;
    PosixPerm::from_bits_truncate(bits as u8)
}

fn to_exacl_perm(perm: PosixPerm) -> Perm {
    let mut out = Perm::empty();
    if perm.contains(PosixPerm::READ) {
        out |= Perm::READ;
    }
    if perm.contains(PosixPerm::WRITE) {
        out |= Perm::WRITE;
    }
    if perm.contains(PosixPerm::EXECUTE) {
        out |= Perm::EXECUTE;
    }
    out
}

fn from_exacl_perm(perm: Perm) -> PosixPerm {
    let mut out = PosixPerm::empty();
    if perm.contains(Perm::READ) {
        out |= PosixPerm::READ;
    }
    if perm.contains(Perm::WRITE) {
        out |= PosixPerm::WRITE;
    }
    if perm.contains(Perm::EXECUTE) {
        out |= PosixPerm::EXECUTE;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_mode_extracts_rwx_triads() {
        let acl = PosixAcl::from_mode(0o750);
        assert_eq!(acl.find(PosixTag::UserObj, None).unwrap().perm, PosixPerm::READ | PosixPerm::WRITE | PosixPerm::EXECUTE);
        assert_eq!(acl.find(PosixTag::GroupObj, None).unwrap().perm, PosixPerm::READ | PosixPerm::EXECUTE);
        assert_eq!(acl.find(PosixTag::Other, None).unwrap().perm, PosixPerm::empty());
    }

    #[test]
    fn validate_requires_mask_when_named_entries_present() {
        let mut acl = PosixAcl::new();
        acl.push(PosixEntry::new(PosixTag::UserObj, None, PosixPerm::all()));
        acl.push(PosixEntry::new(PosixTag::GroupObj, None, PosixPerm::all()));
        acl.push(PosixEntry::new(PosixTag::Other, None, PosixPerm::empty()));
        acl.push(PosixEntry::new(PosixTag::User, Some(1000), PosixPerm::READ));
        assert!(acl.validate().is_err());

        acl.push(PosixEntry::new(PosixTag::Mask, None, PosixPerm::READ));
        assert!(acl.validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_required_entries() {
        let acl = PosixAcl::new();
        assert!(acl.validate().is_err());
    }
}
