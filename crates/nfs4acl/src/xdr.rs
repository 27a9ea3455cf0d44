//! XDR wire codec for the `system.nfs4_acl` extended attribute.
//!
//! Wire format (big-endian, 4-byte words):
//!
//! ```text
//! u32 num_aces
//! repeated num_aces times:
//!     u32 type
//!     u32 flag
//!     u32 access_mask
//!     u32 wholen          -- strlen(who), no NUL on the wire
//!     u8[wholen] who      -- principal string, not NUL-terminated
//!     u8[pad]             -- zero padding up to the next 4-byte boundary;
//!                            omitted entirely when wholen is already a
//!                            multiple of 4 (minimal-padding convention)
//! ```

use crate::error::{Nfs4AclError, Result};
use crate::model::{AccessMask, AceFlags, AceType, Nfs4Ace, Nfs4Acl};

fn pad_len(wholen: usize) -> usize {
    let rem = wholen % crate::NFS4_XDR_MOD;
    if rem == 0 {
        0
    } else {
        crate::NFS4_XDR_MOD - rem
    }
}

/// Encodes an [`Nfs4Acl`] into the `system.nfs4_acl` xattr wire format.
///
/// # Errors
///
/// Returns [`Nfs4AclError::InvalidArgument`] if any `who` string is empty or
/// exceeds the maximum principal length, or if the ACE count would overflow
/// a `u32`.
pub fn encode(acl: &Nfs4Acl) -> Result<Vec<u8>> {
    let naces = acl.len();
    let naces_u32 = u32::try_from(naces)
        .map_err(|_| Nfs4AclError::invalid("ACE count exceeds u32"))?;

    let mut buf = Vec::with_capacity(4 + naces * 16);
    buf.extend_from_slice(&naces_u32.to_be_bytes());

    for ace in acl.aces() {
        if ace.who.is_empty() {
            return Err(Nfs4AclError::invalid("ACE who string is empty"));
        }
        if ace.who.len() > crate::NFS4_ACL_WHO_LENGTH_MAX {
            return Err(Nfs4AclError::invalid("ACE who string too long"));
        }

        buf.extend_from_slice(&ace.ace_type.to_u32().to_be_bytes());
        buf.extend_from_slice(&ace.flags.bits().to_be_bytes());
        buf.extend_from_slice(&ace.mask.bits().to_be_bytes());

        let wholen = ace.who.len();
        let wholen_u32 = u32::try_from(wholen)
            .map_err(|_| Nfs4AclError::invalid("who length exceeds u32"))?;
        buf.extend_from_slice(&wholen_u32.to_be_bytes());
        buf.extend_from_slice(ace.who.as_bytes());

        for _ in 0..pad_len(wholen) {
            buf.push(0);
        }
    }

    let predicted = xattr_size(acl);
    if buf.len() != predicted {
        return Err(Nfs4AclError::invalid(format!(
            "encoded buffer length {} does not match predicted size {predicted}",
            buf.len()
        )));
    }

    Ok(buf)
}

/// Predicts the exact encoded byte length of `acl` without allocating the
/// buffer, for xattr size-guess callers (component G).
#[must_use]
pub fn xattr_size(acl: &Nfs4Acl) -> usize {
    let mut total = 4usize;
    for ace in acl.aces() {
        let wholen = ace.who.len();
        total += 16 + wholen + pad_len(wholen);
    }
    total
}

/// Decodes the `system.nfs4_acl` xattr wire format into an [`Nfs4Acl`].
///
/// `is_directory` is supplied by the caller (from a prior `stat`) since the
/// wire format carries no such bit itself.
///
/// # Errors
///
/// Returns [`Nfs4AclError::InvalidArgument`] on any truncated buffer,
/// out-of-range ACE type, or a `wholen` that runs past the end of the
/// buffer.
pub fn decode(buf: &[u8], is_directory: bool) -> Result<Nfs4Acl> {
    let mut cursor = 0usize;
    let naces = read_u32(buf, &mut cursor)? as usize;

    let mut acl = Nfs4Acl::new(is_directory);
    for _ in 0..naces {
        let ace_type = AceType::try_from(read_u32(buf, &mut cursor)?)?;
        let flags = AceFlags::from_bits_truncate(read_u32(buf, &mut cursor)?);
        let mask = AccessMask::from_bits(read_u32(buf, &mut cursor)?);
        let wholen = read_u32(buf, &mut cursor)? as usize;

        if wholen == 0 {
            return Err(Nfs4AclError::invalid("ACE wholen is zero"));
        }
        if wholen > crate::NFS4_ACL_WHO_LENGTH_MAX {
            return Err(Nfs4AclError::invalid("ACE wholen exceeds maximum"));
        }
        let end = cursor
            .checked_add(wholen)
            .ok_or_else(|| Nfs4AclError::invalid("ACE wholen overflows buffer"))?;
        if end > buf.len() {
            return Err(Nfs4AclError::invalid("ACE who string runs past end of buffer"));
        }

        let who_bytes = &buf[cursor..end];
        let who = std::str::from_utf8(who_bytes)
            .map_err(|_| Nfs4AclError::invalid("ACE who string is not valid UTF-8"))?
            .to_owned();
        cursor = end;
        cursor += pad_len(wholen);
        if cursor > buf.len() {
            return Err(Nfs4AclError::invalid("ACE padding runs past end of buffer"));
        }

        acl.add_ace(Nfs4Ace::new(ace_type, flags, mask, who));
    }

    Ok(acl)
}

fn read_u32(buf: &[u8], cursor: &mut usize) -> Result<u32> {
    let end = cursor
        .checked_add(4)
        .ok_or_else(|| Nfs4AclError::invalid("buffer too short"))?;
    if end > buf.len() {
        return Err(Nfs4AclError::invalid("buffer too short"));
    }
    let word = [buf[*cursor], buf[*cursor + 1], buf[*cursor + 2], buf[*cursor + 3]];
    *cursor = end;
    Ok(u32::from_be_bytes(word))
}
