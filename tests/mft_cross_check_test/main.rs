use bolero::check;
use ntfs_logaudit::mft::{cross_check, MFT_ENTRY_SIZE};

const ATTRIBUTE_HEADER_SIZE: usize = 0x18;
const SI_FN_TIME_BLOCK_SIZE: usize = 0x20;
const FILE_SIGNATURE: [u8; 4] = *b"FILE";
const ATTR_TYPE_STANDARD_INFORMATION: u32 = 0x10;
const ATTR_TYPE_FILE_NAME: u32 = 0x30;

fn build_entry(si_times: [u64; 4], fn_times: [u64; 4]) -> Vec<u8> {
    let mut entry = vec![0u8; MFT_ENTRY_SIZE];
    entry[0x00..0x04].copy_from_slice(&FILE_SIGNATURE);
    entry[0x14..0x16].copy_from_slice(&0x38u16.to_le_bytes());
    entry[0x16..0x18].copy_from_slice(&1u16.to_le_bytes()); // in-use flag

    let si_attr_start = 0x38;
    let si_attr_length = ATTRIBUTE_HEADER_SIZE + SI_FN_TIME_BLOCK_SIZE;
    entry[si_attr_start..si_attr_start + 4].copy_from_slice(&ATTR_TYPE_STANDARD_INFORMATION.to_le_bytes());
    entry[si_attr_start + 4..si_attr_start + 8].copy_from_slice(&(si_attr_length as u32).to_le_bytes());
    entry[si_attr_start + 8] = 0x00; // resident_flag

    let si_body = si_attr_start + ATTRIBUTE_HEADER_SIZE;
    for (i, t) in si_times.iter().enumerate() {
        entry[si_body + i * 8..si_body + i * 8 + 8].copy_from_slice(&t.to_le_bytes());
    }

    let fn_attr_start = si_attr_start + si_attr_length;
    entry[fn_attr_start..fn_attr_start + 4].copy_from_slice(&ATTR_TYPE_FILE_NAME.to_le_bytes());
    entry[fn_attr_start + 8] = 0x00; // resident_flag

    let fn_body = fn_attr_start + ATTRIBUTE_HEADER_SIZE + 0x08;
    for (i, t) in fn_times.iter().enumerate() {
        entry[fn_body + i * 8..fn_body + i * 8 + 8].copy_from_slice(&t.to_le_bytes());
    }

    entry
}

fn main() {
    check!()
        .with_type()
        .for_each(|input: &([u64; 4], [u64; 4])| {
            let (si_times, fn_times) = input;
            let entry = build_entry(*si_times, *fn_times);

            let rows = cross_check(&entry, 0);

            let all_axes_strictly_greater = si_times.iter().zip(fn_times.iter()).all(|(s, f)| s > f);

            if all_axes_strictly_greater {
                assert_eq!(rows.len(), 1, "full-quadruple inversion must be flagged");
                assert!(rows[0].is_timestomped);
            } else {
                assert!(rows.is_empty(), "partial or no inversion must not be flagged");
            }
        });
}
