//! Cross-references resident `STANDARD_INFORMATION` and `FILE_NAME`
//! timestamps within live `$MFT` entries.

use crate::decode::{ensure_len, read_array, read_u16_le, read_u32_le, read_u64_le};
use crate::filetime::format_filetime;
use crate::store::SiFnRow;

pub const MFT_ENTRY_SIZE: usize = 0x400;
pub const MFT_ENTRY_HEADER_SIZE: usize = 0x38;
pub const ATTRIBUTE_HEADER_SIZE: usize = 0x18;
pub const SI_FN_TIME_BLOCK_SIZE: usize = 0x20;

pub const FILE_SIGNATURE: [u8; 4] = *b"FILE";
const ENTRY_IN_USE_FLAG: u16 = 0x01;

const ATTR_TYPE_STANDARD_INFORMATION: u32 = 0x10;
const ATTR_TYPE_FILE_NAME: u32 = 0x30;

const RESIDENT_DIRECT: u8 = 0x00;
const RESIDENT_WITH_HEADER_PADDING: u8 = 0x40;

/// `0x38`-byte MFT entry header.
#[derive(Debug, Clone)]
struct MftEntryHeader {
    signature: [u8; 4],
    flags: u16,
}

impl MftEntryHeader {
    fn from_bytes(buf: &[u8]) -> std::io::Result<Self> {
        ensure_len(buf, MFT_ENTRY_HEADER_SIZE)?;
        Ok(MftEntryHeader {
            signature: read_array(buf, 0x00)?,
            flags: read_u16_le(buf, 0x16)?,
        })
    }

    fn is_in_use(&self) -> bool {
        self.signature == FILE_SIGNATURE && self.flags & ENTRY_IN_USE_FLAG != 0
    }
}

/// `0x18`-byte attribute header.
#[derive(Debug, Clone)]
struct AttributeHeader {
    attr_type: u32,
    attr_length: u32,
    resident_flag: u8,
}

impl AttributeHeader {
    fn from_bytes(buf: &[u8]) -> std::io::Result<Self> {
        ensure_len(buf, ATTRIBUTE_HEADER_SIZE)?;
        Ok(AttributeHeader {
            attr_type: read_u32_le(buf, 0x00)?,
            attr_length: read_u32_le(buf, 0x04)?,
            resident_flag: buf[0x08],
        })
    }
}

/// `0x20`-byte SI/FN time block, field order {Creation, MFT-Modified,
/// Modified, Last-Access} — the on-disk MFT order, distinct from the
/// log-payload order used by [`crate::reasoner`].
struct SiFnTimeBlock {
    creation: u64,
    mft_modified: u64,
    modified: u64,
    last_access: u64,
}

impl SiFnTimeBlock {
    fn from_bytes(buf: &[u8]) -> std::io::Result<Self> {
        ensure_len(buf, SI_FN_TIME_BLOCK_SIZE)?;
        Ok(SiFnTimeBlock {
            creation: read_u64_le(buf, 0x00)?,
            mft_modified: read_u64_le(buf, 0x08)?,
            modified: read_u64_le(buf, 0x10)?,
            last_access: read_u64_le(buf, 0x18)?,
        })
    }
}

/// Read the SI time block starting immediately after the attribute header at
/// `attr_start`, honoring `resident_flag`. Returns `None` for any other flag.
fn read_si_times(mft_bytes: &[u8], attr_start: usize, resident_flag: u8) -> Option<SiFnTimeBlock> {
    let body_start = match resident_flag {
        RESIDENT_DIRECT => attr_start + ATTRIBUTE_HEADER_SIZE,
        RESIDENT_WITH_HEADER_PADDING => attr_start + ATTRIBUTE_HEADER_SIZE + 0x28,
        _ => return None,
    };
    SiFnTimeBlock::from_bytes(mft_bytes.get(body_start..)?).ok()
}

/// Read the FN time block, skipping the file-reference prefix per
/// `resident_flag`. Returns `None` for any other flag.
fn read_fn_times(mft_bytes: &[u8], attr_start: usize, resident_flag: u8) -> Option<SiFnTimeBlock> {
    let body_start = match resident_flag {
        RESIDENT_DIRECT => attr_start + ATTRIBUTE_HEADER_SIZE + 0x08,
        RESIDENT_WITH_HEADER_PADDING => attr_start + ATTRIBUTE_HEADER_SIZE + 0x30,
        _ => return None,
    };
    SiFnTimeBlock::from_bytes(mft_bytes.get(body_start..)?).ok()
}

/// Examine entry index `i` of `mft_bytes` and produce a flagged row if the
/// entry is in use, both its SI and FN attributes decode, and SI strictly
/// exceeds FN on all four axes.
fn check_entry(mft_bytes: &[u8], entry_index: u64, utc_offset_hours: i64) -> Option<SiFnRow> {
    let entry_start = (entry_index as usize).checked_mul(MFT_ENTRY_SIZE)?;
    let entry_bytes = mft_bytes.get(entry_start..entry_start + MFT_ENTRY_SIZE)?;

    let header = MftEntryHeader::from_bytes(entry_bytes).ok()?;
    if !header.is_in_use() {
        return None;
    }

    let si_attr_start = MFT_ENTRY_HEADER_SIZE;
    let si_attr = AttributeHeader::from_bytes(entry_bytes.get(si_attr_start..)?).ok()?;
    if si_attr.attr_type != ATTR_TYPE_STANDARD_INFORMATION {
        return None;
    }
    let si = read_si_times(entry_bytes, si_attr_start, si_attr.resident_flag)?;

    let fn_attr_start = si_attr_start + si_attr.attr_length as usize;
    let fn_attr = AttributeHeader::from_bytes(entry_bytes.get(fn_attr_start..)?).ok()?;
    if fn_attr.attr_type != ATTR_TYPE_FILE_NAME {
        return None;
    }
    let fn_times = read_fn_times(entry_bytes, fn_attr_start, fn_attr.resident_flag)?;

    let is_timestomped = si.creation > fn_times.creation
        && si.mft_modified > fn_times.mft_modified
        && si.modified > fn_times.modified
        && si.last_access > fn_times.last_access;
    if !is_timestomped {
        return None;
    }

    Some(SiFnRow {
        mft_entry: entry_index,
        si_create_time: format_filetime(si.creation, utc_offset_hours),
        si_modified_time: format_filetime(si.modified, utc_offset_hours),
        si_mft_modified_time: format_filetime(si.mft_modified, utc_offset_hours),
        si_last_access_time: format_filetime(si.last_access, utc_offset_hours),
        fn_create_time: format_filetime(fn_times.creation, utc_offset_hours),
        fn_modified_time: format_filetime(fn_times.modified, utc_offset_hours),
        fn_mft_modified_time: format_filetime(fn_times.mft_modified, utc_offset_hours),
        fn_last_access_time: format_filetime(fn_times.last_access, utc_offset_hours),
        is_timestomped,
    })
}

/// Scan every entry in `mft_bytes` and return rows for entries with a
/// full-quadruple SI-over-FN backdating signature.
pub fn cross_check(mft_bytes: &[u8], utc_offset_hours: i64) -> Vec<SiFnRow> {
    let entry_count = mft_bytes.len() / MFT_ENTRY_SIZE;
    (0..entry_count as u64)
        .filter_map(|i| check_entry(mft_bytes, i, utc_offset_hours))
        .collect()
}
