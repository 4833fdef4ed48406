//! Circular traversal of `$LogFile` record pages, anchored on the restart
//! page's current LSN.

use std::io::Result;

use crate::page::{is_all_nul_page, RecordPageHeader, RestartPageHeader, FIRST_RECORD_PAGE, PAGE_SIZE};

/// One page visited by [`walk`]: its index, its parsed `RCRD` header (if the
/// magic validated), the raw page bytes, and whether the page is an
/// all-zero torn/unwritten tail page (a soft EOF, not an error).
pub struct WalkedPage<'a> {
    pub page_index: u64,
    pub header: Option<RecordPageHeader>,
    pub is_nul: bool,
    pub page_bytes: &'a [u8],
}

/// Locate the anchor page: the first record page whose bytes contain the
/// little-endian encoding of `current_lsn` at any offset. `None` if no
/// record page contains it — an empty journal beyond the restart pages is
/// not an error, it just has nothing to walk (mirrors the Python source's
/// `for current_lsn_offset in searched_current_lsn:` over an empty match
/// list: zero iterations, not a failure).
fn find_anchor(log_bytes: &[u8], current_lsn: u64) -> Option<u64> {
    let needle = current_lsn.to_le_bytes();
    let total_pages = (log_bytes.len() / PAGE_SIZE) as u64;
    for page_index in FIRST_RECORD_PAGE..total_pages {
        let start = (page_index * PAGE_SIZE as u64) as usize;
        let page = &log_bytes[start..start + PAGE_SIZE];
        if page.windows(8).any(|w| w == needle) {
            return Some(page_index);
        }
    }
    None
}

/// Walk `log_bytes` in circular order starting at the anchor page, for
/// exactly one full circuit. Pages whose `RCRD` magic fails to validate are
/// still emitted, with `header: None`, so the caller can account for every
/// page without treating a bad magic as fatal.
///
/// If `current_lsn` is not found on any record page (an empty journal),
/// returns an empty page list rather than failing — there is nothing to
/// walk, not a parse error.
pub fn walk(log_bytes: &[u8]) -> Result<Vec<WalkedPage<'_>>> {
    let restart = RestartPageHeader::parse(log_bytes)?;
    let total_pages = (log_bytes.len() / PAGE_SIZE) as u64;
    let Some(anchor) = find_anchor(log_bytes, restart.current_lsn) else {
        return Ok(Vec::new());
    };

    let mut order = Vec::with_capacity((total_pages - FIRST_RECORD_PAGE) as usize);
    let mut p = anchor;
    loop {
        order.push(p);
        p = if p + 1 >= total_pages { FIRST_RECORD_PAGE } else { p + 1 };
        if p == anchor {
            break;
        }
    }

    let mut pages = Vec::with_capacity(order.len());
    for page_index in order {
        let start = (page_index * PAGE_SIZE as u64) as usize;
        let page_bytes = &log_bytes[start..start + PAGE_SIZE];
        let is_nul = is_all_nul_page(page_bytes);
        let header = if is_nul {
            None
        } else {
            RecordPageHeader::parse(page_bytes)
                .ok()
                .filter(RecordPageHeader::is_valid_magic)
        };
        pages.push(WalkedPage { page_index, header, is_nul, page_bytes });
    }
    Ok(pages)
}
