//! The NFSv4 ACL in-memory model: ACE types, flag/mask bitflags, and the
//! ACL container itself.

use bitflags::bitflags;

use crate::error::{Nfs4AclError, Result};

/// The four NFSv4 ACE types. Only `Allow` and `Deny` participate in
/// translation; `Audit`/`Alarm` are decoded and carried but have no POSIX.1e
/// analogue (spec Non-goals).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AceType {
    Allow,
    Deny,
    Audit,
    Alarm,
}

impl AceType {
    pub(crate) fn to_u32(self) -> u32 {
        match self {
            AceType::Allow => 0x0000_0000,
            AceType::Deny => 0x0000_0001,
            AceType::Audit => 0x0000_0002,
            AceType::Alarm => 0x0000_0003,
        }
    }
}

impl TryFrom<u32> for AceType {
    type Error = Nfs4AclError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            0x0000_0000 => Ok(AceType::Allow),
            0x0000_0001 => Ok(AceType::Deny),
            0x0000_0002 => Ok(AceType::Audit),
            0x0000_0003 => Ok(AceType::Alarm),
            other => Err(Nfs4AclError::invalid(format!(
                "unknown ACE type {other:#x}"
            ))),
        }
    }
}

bitflags! {
    /// NFSv4 ACE flag bits (`acetype4`'s sibling, `aceflag4`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AceFlags: u32 {
        const FILE_INHERIT        = 0x0000_0001;
        const DIRECTORY_INHERIT   = 0x0000_0002;
        const NO_PROPAGATE_INHERIT = 0x0000_0004;
        const INHERIT_ONLY        = 0x0000_0008;
        const SUCCESSFUL_ACCESS   = 0x0000_0010;
        const FAILED_ACCESS       = 0x0000_0020;
        const IDENTIFIER_GROUP    = 0x0000_0040;
        const INHERITED           = 0x0000_0080;
    }
}

/// NFSv4 access mask bits. Kept as a plain newtype rather than a
/// `bitflags!`-derived `Flags` type so that `~mask` complementation (used
/// throughout the bitmask-accumulation translator) stays a single bitwise
/// operator instead of going through `Flags::complement`'s truncation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AccessMask(pub u32);

impl AccessMask {
    pub const READ_DATA: Self = Self(0x0000_0001);
    pub const LIST_DIRECTORY: Self = Self(0x0000_0001);
    pub const WRITE_DATA: Self = Self(0x0000_0002);
    pub const ADD_FILE: Self = Self(0x0000_0002);
    pub const APPEND_DATA: Self = Self(0x0000_0004);
    pub const ADD_SUBDIRECTORY: Self = Self(0x0000_0004);
    pub const READ_NAMED_ATTRS: Self = Self(0x0000_0008);
    pub const WRITE_NAMED_ATTRS: Self = Self(0x0000_0010);
    pub const EXECUTE: Self = Self(0x0000_0020);
    pub const DELETE_CHILD: Self = Self(0x0000_0040);
    pub const READ_ATTRIBUTES: Self = Self(0x0000_0080);
    pub const WRITE_ATTRIBUTES: Self = Self(0x0000_0100);
    pub const DELETE: Self = Self(0x0001_0000);
    pub const READ_ACL: Self = Self(0x0002_0000);
    pub const WRITE_ACL: Self = Self(0x0004_0000);
    pub const WRITE_OWNER: Self = Self(0x0008_0000);
    pub const SYNCHRONIZE: Self = Self(0x0010_0000);

    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(0x001f_01ff);

    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[must_use]
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Bitwise complement restricted to the defined mask bits (`ALL`), so
    /// that `~NONE == ALL` rather than setting undefined high bits.
    #[must_use]
    pub const fn complement(self) -> Self {
        Self(!self.0 & Self::ALL.0)
    }

    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        self.intersection(other.complement())
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for AccessMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl std::ops::BitAnd for AccessMask {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        self.intersection(rhs)
    }
}

impl std::ops::Not for AccessMask {
    type Output = Self;
    fn not(self) -> Self {
        self.complement()
    }
}

impl std::ops::BitOrAssign for AccessMask {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = *self | rhs;
    }
}

/// A single NFSv4 ACE: type, inheritance/audit flags, access mask, and the
/// `who` principal string (`"name@domain"`, `OWNER@`, `GROUP@`, or
/// `EVERYONE@`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nfs4Ace {
    pub ace_type: AceType,
    pub flags: AceFlags,
    pub mask: AccessMask,
    pub who: String,
}

impl Nfs4Ace {
    #[must_use]
    pub fn new(ace_type: AceType, flags: AceFlags, mask: AccessMask, who: impl Into<String>) -> Self {
        Self {
            ace_type,
            flags,
            mask,
            who: who.into(),
        }
    }

    #[must_use]
    pub fn is_allow(&self) -> bool {
        self.ace_type == AceType::Allow
    }

    #[must_use]
    pub fn is_deny(&self) -> bool {
        self.ace_type == AceType::Deny
    }
}

/// An NFSv4 ACL: an ordered ACE list plus whether the owning object is a
/// directory (directory-ness changes mask semantics for `DELETE_CHILD` and
/// inheritance flags).
///
/// Backed by a `Vec` rather than an intrusive list: every algorithm that
/// walks this list does so once, forward, optionally removing the current
/// element — a pattern `Vec::retain`/manual index bookkeeping expresses
/// without extra machinery.
#[derive(Debug, Clone, Default)]
pub struct Nfs4Acl {
    pub is_directory: bool,
    aces: Vec<Nfs4Ace>,
}

impl Nfs4Acl {
    #[must_use]
    pub fn new(is_directory: bool) -> Self {
        Self {
            is_directory,
            aces: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_aces(is_directory: bool, aces: Vec<Nfs4Ace>) -> Self {
        Self { is_directory, aces }
    }

    pub fn add_ace(&mut self, ace: Nfs4Ace) {
        self.aces.push(ace);
    }

    /// Appends a complementary `ALLOW(mask)` / `DENY(~mask)` pair sharing
    /// `flags` and `who`. This is the one ACE-construction idiom the POSIX→
    /// NFSv4 translator uses throughout.
    pub fn add_pair(&mut self, flags: AceFlags, mask: AccessMask, who: impl Into<String>) {
        let who = who.into();
        self.aces
            .push(Nfs4Ace::new(AceType::Allow, flags, mask, who.clone()));
        self.aces
            .push(Nfs4Ace::new(AceType::Deny, flags, mask.complement(), who));
    }

    /// Removes the ACE at `index`, shifting later entries down. Returns the
    /// removed ACE.
    pub fn remove_ace(&mut self, index: usize) -> Nfs4Ace {
        self.aces.remove(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.aces.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aces.is_empty()
    }

    #[must_use]
    pub fn aces(&self) -> &[Nfs4Ace] {
        &self.aces
    }

    pub fn aces_mut(&mut self) -> &mut Vec<Nfs4Ace> {
        &mut self.aces
    }

    pub fn into_aces(self) -> Vec<Nfs4Ace> {
        self.aces
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Nfs4Ace> {
        self.aces.iter()
    }
}

impl<'a> IntoIterator for &'a Nfs4Acl {
    type Item = &'a Nfs4Ace;
    type IntoIter = std::slice::Iter<'a, Nfs4Ace>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
