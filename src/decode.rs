//! Fixed-layout little-endian struct deserialization from byte slices.
//!
//! NTFS on-disk structures are flat, fixed-size, little-endian records.
//! Every decoder in [`crate::page`], [`crate::record`] and [`crate::mft`]
//! is built out of the primitive readers here; none of them interpret the
//! values they read.

use std::io::{Error, ErrorKind, Result};

use byteorder::{ByteOrder, LittleEndian};

/// Fail with [`ErrorKind::UnexpectedEof`] if `buf` is shorter than `needed` bytes.
pub fn ensure_len(buf: &[u8], needed: usize) -> Result<()> {
    if buf.len() < needed {
        return Err(Error::new(
            ErrorKind::UnexpectedEof,
            format!("short read: need {needed} bytes, got {}", buf.len()),
        ));
    }
    Ok(())
}

pub fn read_u16_le(buf: &[u8], offset: usize) -> Result<u16> {
    ensure_len(buf, offset + 2)?;
    Ok(LittleEndian::read_u16(&buf[offset..offset + 2]))
}

pub fn read_u32_le(buf: &[u8], offset: usize) -> Result<u32> {
    ensure_len(buf, offset + 4)?;
    Ok(LittleEndian::read_u32(&buf[offset..offset + 4]))
}

pub fn read_u64_le(buf: &[u8], offset: usize) -> Result<u64> {
    ensure_len(buf, offset + 8)?;
    Ok(LittleEndian::read_u64(&buf[offset..offset + 8]))
}

/// Copy a fixed-size byte array verbatim, no interpretation.
pub fn read_array<const N: usize>(buf: &[u8], offset: usize) -> Result<[u8; N]> {
    ensure_len(buf, offset + N)?;
    let mut out = [0u8; N];
    out.copy_from_slice(&buf[offset..offset + N]);
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_read_u16_le() {
        let buf = [0x34, 0x12, 0xaa];
        assert_eq!(read_u16_le(&buf, 0).unwrap(), 0x1234);
    }

    #[test]
    fn test_read_u64_le() {
        let buf = [0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(read_u64_le(&buf, 0).unwrap(), 1);
    }

    #[test]
    fn test_short_read() {
        let buf = [0x00u8; 3];
        assert_eq!(
            read_u32_le(&buf, 0).unwrap_err().kind(),
            ErrorKind::UnexpectedEof
        );
    }

    #[test]
    fn test_read_array() {
        let buf = [1u8, 2, 3, 4, 5];
        assert_eq!(read_array::<3>(&buf, 1).unwrap(), [2, 3, 4]);
    }
}
