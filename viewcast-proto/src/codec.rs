//! Wire primitives
//!
//! All multi-byte integers travel in network byte order. Variable-length
//! fields are length-prefixed (`u16` for small strings). Decoding works on
//! `&mut &[u8]` cursors that advance past what they consume and borrow from
//! the caller's buffer; fixed fields never allocate.
//!
//! Addresses use a private version byte (`4` / `6`) rather than the
//! platform's address-family constants, which vary between systems.

use bytes::{BufMut, BytesMut};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use thiserror::Error;
use viewcast_core::peer::{PathId, PeerSignature};
use viewcast_core::pfx::Prefix;

/// Wire format violations.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("buffer too short")]
    ShortBuffer,

    #[error("malformed record: {0}")]
    Malformed(&'static str),

    #[error("unknown operation tag {0:#04x}")]
    UnknownOp(u8),

    #[error("unknown address version {0}")]
    UnknownVersion(u8),
}

/// Result type alias for codec operations.
pub type Result<T> = std::result::Result<T, WireError>;

const AF_V4: u8 = 4;
const AF_V6: u8 = 6;

fn take<const N: usize>(src: &mut &[u8]) -> Result<[u8; N]> {
    if src.len() < N {
        return Err(WireError::ShortBuffer);
    }
    let (head, rest) = src.split_at(N);
    let mut out = [0u8; N];
    out.copy_from_slice(head);
    *src = rest;
    Ok(out)
}

pub fn get_u8(src: &mut &[u8]) -> Result<u8> {
    Ok(take::<1>(src)?[0])
}

pub fn get_u16(src: &mut &[u8]) -> Result<u16> {
    Ok(u16::from_be_bytes(take::<2>(src)?))
}

pub fn get_u32(src: &mut &[u8]) -> Result<u32> {
    Ok(u32::from_be_bytes(take::<4>(src)?))
}

pub fn get_i64(src: &mut &[u8]) -> Result<i64> {
    Ok(i64::from_be_bytes(take::<8>(src)?))
}

/// Borrow the next `n` bytes from the cursor.
pub fn get_slice<'a>(src: &mut &'a [u8], n: usize) -> Result<&'a [u8]> {
    if src.len() < n {
        return Err(WireError::ShortBuffer);
    }
    let (head, rest) = src.split_at(n);
    *src = rest;
    Ok(head)
}

/// Append a `u16`-length-prefixed string.
pub fn put_str(dst: &mut BytesMut, s: &str) -> Result<()> {
    if s.len() > u16::MAX as usize {
        return Err(WireError::Malformed("string too long"));
    }
    dst.put_u16(s.len() as u16);
    dst.put_slice(s.as_bytes());
    Ok(())
}

/// Read a `u16`-length-prefixed string.
pub fn get_str(src: &mut &[u8]) -> Result<String> {
    let len = get_u16(src)? as usize;
    let bytes = get_slice(src, len)?;
    let s = std::str::from_utf8(bytes).map_err(|_| WireError::Malformed("invalid string"))?;
    Ok(s.to_owned())
}

/// Append an address as `{version, 4 or 16 bytes}`.
pub fn put_addr(dst: &mut BytesMut, addr: &IpAddr) {
    match addr {
        IpAddr::V4(a) => {
            dst.put_u8(AF_V4);
            dst.put_slice(&a.octets());
        }
        IpAddr::V6(a) => {
            dst.put_u8(AF_V6);
            dst.put_slice(&a.octets());
        }
    }
}

/// Read an address written by [`put_addr`].
pub fn get_addr(src: &mut &[u8]) -> Result<IpAddr> {
    match get_u8(src)? {
        AF_V4 => Ok(IpAddr::V4(Ipv4Addr::from(take::<4>(src)?))),
        AF_V6 => Ok(IpAddr::V6(Ipv6Addr::from(take::<16>(src)?))),
        other => Err(WireError::UnknownVersion(other)),
    }
}

/// Append a prefix as `{version, masklen, 4 or 16 bytes}`.
pub fn put_pfx(dst: &mut BytesMut, pfx: &Prefix) {
    match pfx.addr {
        IpAddr::V4(a) => {
            dst.put_u8(AF_V4);
            dst.put_u8(pfx.masklen);
            dst.put_slice(&a.octets());
        }
        IpAddr::V6(a) => {
            dst.put_u8(AF_V6);
            dst.put_u8(pfx.masklen);
            dst.put_slice(&a.octets());
        }
    }
}

/// Read a prefix written by [`put_pfx`].
pub fn get_pfx(src: &mut &[u8]) -> Result<Prefix> {
    let version = get_u8(src)?;
    let masklen = get_u8(src)?;
    let addr = match version {
        AF_V4 => IpAddr::V4(Ipv4Addr::from(take::<4>(src)?)),
        AF_V6 => IpAddr::V6(Ipv6Addr::from(take::<16>(src)?)),
        other => return Err(WireError::UnknownVersion(other)),
    };
    let pfx = Prefix::new(addr, masklen);
    if !pfx.is_valid() {
        return Err(WireError::Malformed("mask length out of range"));
    }
    Ok(pfx)
}

/// Append an interned path handle verbatim.
pub fn put_path_id(dst: &mut BytesMut, id: &PathId) {
    dst.put_slice(id.as_bytes());
}

/// Read an interned path handle.
pub fn get_path_id(src: &mut &[u8]) -> Result<PathId> {
    Ok(PathId::new(take::<{ PathId::WIRE_LEN }>(src)?))
}

/// Append a peer signature: collector, address, AS number.
pub fn put_signature(dst: &mut BytesMut, sig: &PeerSignature) -> Result<()> {
    if sig.collector.len() > u8::MAX as usize {
        return Err(WireError::Malformed("collector name too long"));
    }
    if !sig.collector.is_ascii() {
        return Err(WireError::Malformed("collector name is not ascii"));
    }
    put_str(dst, &sig.collector)?;
    put_addr(dst, &sig.addr);
    dst.put_u32(sig.asn);
    Ok(())
}

/// Read a peer signature written by [`put_signature`].
pub fn get_signature(src: &mut &[u8]) -> Result<PeerSignature> {
    let collector = get_str(src)?;
    if collector.len() > u8::MAX as usize || !collector.is_ascii() {
        return Err(WireError::Malformed("collector name out of bounds"));
    }
    let addr = get_addr(src)?;
    let asn = get_u32(src)?;
    Ok(PeerSignature { collector, addr, asn })
}
