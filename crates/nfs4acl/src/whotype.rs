//! Classifies an NFSv4 ACE's `who` string into the POSIX tag it corresponds
//! to, mirroring the special principals `OWNER@`, `GROUP@`, `EVERYONE@`.

use crate::error::{Nfs4AclError, Result};
use crate::model::AceFlags;

/// The five principal classes an NFSv4 ACE's `who` can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WhoType {
    UserObj,
    User,
    GroupObj,
    Group,
    Other,
}

const OWNER_AT: &str = "OWNER@";
const GROUP_AT: &str = "GROUP@";
const EVERYONE_AT: &str = "EVERYONE@";

/// Classifies `who` given the ACE's flags (specifically `IDENTIFIER_GROUP`,
/// which distinguishes a named user from a named group).
///
/// # Errors
///
/// Returns [`Nfs4AclError::InvalidArgument`] if `who` is empty.
pub fn classify(who: &str, flags: AceFlags) -> Result<WhoType> {
    if who.is_empty() {
        return Err(Nfs4AclError::invalid("ACE who string is empty"));
    }

    Ok(match who {
        OWNER_AT => WhoType::UserObj,
        GROUP_AT => WhoType::GroupObj,
        EVERYONE_AT => WhoType::Other,
        _ if flags.contains(AceFlags::IDENTIFIER_GROUP) => WhoType::Group,
        _ => WhoType::User,
    })
}
