//! Page-level constants and the two fixed page headers (`RSTR`, `RCRD`).
//!
//! Every offset in the `$LogFile` is page-aligned at [`PAGE_SIZE`]. Pages
//! come in three flavors identified by a 4-byte magic at offset 0: `RSTR`
//! (restart), `RCRD` (record), and buffer/unused pages that carry neither.

use std::io::Result;

use crate::decode::{read_array, read_u16_le, read_u32_le, read_u64_le};

pub const PAGE_SIZE: usize = 0x1000;

/// Pages 0-3 are restart/buffer pages; record pages start at page 4.
pub const FIRST_RECORD_PAGE: u64 = 4;

pub const RSTR_MAGIC: [u8; 4] = *b"RSTR";
pub const RCRD_MAGIC: [u8; 4] = *b"RCRD";

/// Size of the `RSTR` header, in bytes.
pub const RSTR_HEADER_SIZE: usize = 0x40;
/// Size of the `RCRD` header, in bytes.
pub const RCRD_HEADER_SIZE: usize = 0x28;

/// The restart page header. Carries the current LSN used to anchor the
/// circular walk (see [`crate::walker`]).
#[derive(Debug, Clone)]
pub struct RestartPageHeader {
    pub magic_number: [u8; 4],
    pub update_sequence_offset: u16,
    pub update_sequence_count: u16,
    pub check_disk_lsn: u64,
    pub system_page_size: u32,
    pub log_page_size: u32,
    pub restart_offset: u16,
    pub minor_version: u16,
    pub major_version: u16,
    pub update_sequence_array: [u8; 18],
    pub current_lsn: u64,
    pub log_client_offset: u16,
    pub client_list_offset: u16,
    pub flags: u32,
}

impl RestartPageHeader {
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        Ok(RestartPageHeader {
            magic_number: read_array(buf, 0x00)?,
            update_sequence_offset: read_u16_le(buf, 0x04)?,
            update_sequence_count: read_u16_le(buf, 0x06)?,
            check_disk_lsn: read_u64_le(buf, 0x08)?,
            system_page_size: read_u32_le(buf, 0x10)?,
            log_page_size: read_u32_le(buf, 0x14)?,
            restart_offset: read_u16_le(buf, 0x18)?,
            minor_version: read_u16_le(buf, 0x1a)?,
            major_version: read_u16_le(buf, 0x1c)?,
            update_sequence_array: read_array(buf, 0x1e)?,
            current_lsn: read_u64_le(buf, 0x30)?,
            log_client_offset: read_u16_le(buf, 0x38)?,
            client_list_offset: read_u16_le(buf, 0x3a)?,
            flags: read_u32_le(buf, 0x3c)?,
        })
    }

    /// Parse and validate the restart page at the start of `log_bytes`.
    /// Fails with `InvalidData` ([`crate::error::Kind::InvalidRestart`]) if the magic
    /// does not read `"RSTR"`.
    pub fn parse(log_bytes: &[u8]) -> Result<Self> {
        crate::decode::ensure_len(log_bytes, RSTR_HEADER_SIZE)?;
        let header = Self::from_bytes(&log_bytes[..RSTR_HEADER_SIZE])?;
        if header.magic_number != RSTR_MAGIC {
            return Err(crate::error::invalid_restart(
                "magic number is not \"RSTR\", not a valid NTFS $LogFile restart page",
            ));
        }
        Ok(header)
    }
}

/// The record page header. `next_record_offset` bounds the valid record
/// data on the page; there is no length-prefix index of records.
#[derive(Debug, Clone)]
pub struct RecordPageHeader {
    pub magic_number: [u8; 4],
    pub update_sequence_offset: u16,
    pub update_sequence_count: u16,
    pub last_lsn_or_offset: u64,
    pub flags: u32,
    pub page_count: u16,
    pub page_position: u16,
    pub next_record_offset: u16,
    pub word_align: u16,
    pub dword_align: u32,
    pub last_end_lsn: u64,
}

impl RecordPageHeader {
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        Ok(RecordPageHeader {
            magic_number: read_array(buf, 0x00)?,
            update_sequence_offset: read_u16_le(buf, 0x04)?,
            update_sequence_count: read_u16_le(buf, 0x06)?,
            last_lsn_or_offset: read_u64_le(buf, 0x08)?,
            flags: read_u32_le(buf, 0x10)?,
            page_count: read_u16_le(buf, 0x14)?,
            page_position: read_u16_le(buf, 0x16)?,
            next_record_offset: read_u16_le(buf, 0x18)?,
            word_align: read_u16_le(buf, 0x1a)?,
            dword_align: read_u32_le(buf, 0x1c)?,
            last_end_lsn: read_u64_le(buf, 0x20)?,
        })
    }

    /// Parse a page as `RCRD`, without validating the magic (callers decide
    /// whether an invalid magic is a soft-skip, per [`crate::walker`]).
    pub fn parse(page_bytes: &[u8]) -> Result<Self> {
        crate::decode::ensure_len(page_bytes, RCRD_HEADER_SIZE)?;
        Self::from_bytes(&page_bytes[..RCRD_HEADER_SIZE])
    }

    pub fn is_valid_magic(&self) -> bool {
        self.magic_number == RCRD_MAGIC
    }
}

static ZERO_PAGE_CRC: std::sync::OnceLock<u32> = std::sync::OnceLock::new();

/// A page whose bytes checksum identically to an all-zero page of the same
/// size. A torn or never-written tail page is treated as a soft EOF rather
/// than a hard error, the same way `buf_page_is_corrupted` does not flag an
/// all-zero page as corrupted.
pub fn is_all_nul_page(page_bytes: &[u8]) -> bool {
    if page_bytes.len() != PAGE_SIZE {
        return false;
    }
    let target = *ZERO_PAGE_CRC.get_or_init(|| crc32c::crc32c(&[0u8; PAGE_SIZE]));
    crc32c::crc32c(page_bytes) == target
}
