use bolero::check;
use ntfs_logaudit::page::PAGE_SIZE;
use ntfs_logaudit::walker;

const FIRST_RECORD_PAGE: u64 = 4;

fn build_log(num_record_pages: u8, anchor_offset: u8) -> (Vec<u8>, u64) {
    let num_record_pages = (num_record_pages % 16) as u64 + 1;
    let total_pages = FIRST_RECORD_PAGE + num_record_pages;
    let anchor = FIRST_RECORD_PAGE + (anchor_offset as u64 % num_record_pages);

    let mut buf = vec![0u8; total_pages as usize * PAGE_SIZE];
    buf[0..4].copy_from_slice(b"RSTR");
    let current_lsn = 0x1122_3344_5566_7788u64;
    buf[0x30..0x38].copy_from_slice(&current_lsn.to_le_bytes());

    for page in FIRST_RECORD_PAGE..total_pages {
        let start = page as usize * PAGE_SIZE;
        buf[start..start + 4].copy_from_slice(b"RCRD");
    }

    let anchor_start = anchor as usize * PAGE_SIZE;
    buf[anchor_start + 0x40..anchor_start + 0x48].copy_from_slice(&current_lsn.to_le_bytes());

    (buf, anchor)
}

fn main() {
    check!()
        .with_type()
        .for_each(|input: &(u8, u8)| {
            let (num_record_pages, anchor_offset) = *input;
            let (log, anchor) = build_log(num_record_pages, anchor_offset);

            let pages = walker::walk(&log).expect("walk should succeed on a well-formed log");

            let expected_count = (log.len() / PAGE_SIZE) - FIRST_RECORD_PAGE as usize;
            assert_eq!(pages.len(), expected_count, "every record page visited exactly once");

            let mut seen: Vec<u64> = pages.iter().map(|p| p.page_index).collect();
            seen.sort_unstable();
            seen.dedup();
            assert_eq!(seen.len(), pages.len(), "no duplicate pages emitted");

            assert_eq!(pages[0].page_index, anchor, "walk starts at the anchor page");

            let total_pages = (log.len() / PAGE_SIZE) as u64;
            let expected_terminal = if anchor == FIRST_RECORD_PAGE {
                total_pages - 1
            } else {
                anchor - 1
            };
            assert_eq!(
                pages.last().unwrap().page_index,
                expected_terminal,
                "walk terminates one page before the anchor, mod the record page range"
            );
        });
}
