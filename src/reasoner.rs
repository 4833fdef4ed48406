//! Decodes `Update Resident Value` redo/undo payloads into timestamp
//! quadruples and flags backdating writes.

use byteorder::{ByteOrder, LittleEndian};

use crate::filetime::format_filetime;
use crate::record::{TARGET_FILE_NAME, TARGET_STANDARD_INFORMATION};
use crate::store::{parse_hex_bytes, LogFileRow, TimeStompRow};

/// The four FILETIME axes in a `STANDARD_INFORMATION`/`FILE_NAME` quadruple,
/// as they appear in a log-record payload (Creation, Modified, MFT-Modified,
/// Last-Access — distinct from the MFT on-disk field order, see
/// [`crate::mft`]).
#[derive(Default, Clone, Copy)]
struct Quadruple {
    create: Option<u64>,
    modified: Option<u64>,
    mft_modified: Option<u64>,
    last_access: Option<u64>,
}

enum Field {
    Create,
    Modified,
    MftModified,
    LastAccess,
}

/// SI payload layout by `attr_offset`, per §4.5.
fn si_layout(attr_offset: u16) -> Option<&'static [Field]> {
    use Field::*;
    match attr_offset {
        0x18 => Some(&[Create, Modified, MftModified, LastAccess]),
        0x20 => Some(&[Modified, MftModified, LastAccess]),
        0x28 => Some(&[MftModified, LastAccess]),
        0x30 => Some(&[LastAccess]),
        _ => None,
    }
}

/// FN payload layout by `attr_offset`: (skip-prefix bytes, fields), per §4.5.
fn fn_layout(attr_offset: u16) -> Option<(usize, &'static [Field])> {
    use Field::*;
    match attr_offset {
        0x18 => Some((8, &[Create, Modified, MftModified, LastAccess])),
        0x20 => Some((0, &[Create, Modified, MftModified, LastAccess])),
        0x28 => Some((0, &[Modified, MftModified, LastAccess])),
        0x30 => Some((0, &[MftModified, LastAccess])),
        0x38 => Some((0, &[LastAccess])),
        _ => None,
    }
}

fn decode_quadruple(payload: &[u8], skip: usize, fields: &[Field]) -> Quadruple {
    let mut q = Quadruple::default();
    let mut offset = skip;
    for field in fields {
        let Some(slice) = payload.get(offset..offset + 8) else {
            break;
        };
        let value = LittleEndian::read_u64(slice);
        match field {
            Field::Create => q.create = Some(value),
            Field::Modified => q.modified = Some(value),
            Field::MftModified => q.mft_modified = Some(value),
            Field::LastAccess => q.last_access = Some(value),
        }
        offset += 8;
    }
    q
}

fn is_timestomped(undo: &Quadruple, redo: &Quadruple) -> bool {
    let axis_backdated = |u: Option<u64>, r: Option<u64>| matches!((u, r), (Some(u), Some(r)) if u > r);
    axis_backdated(undo.create, redo.create)
        || axis_backdated(undo.modified, redo.modified)
        || axis_backdated(undo.mft_modified, redo.mft_modified)
        || axis_backdated(undo.last_access, redo.last_access)
}

fn format_quadruple(q: &Quadruple, utc_offset_hours: i64) -> (Option<String>, Option<String>, Option<String>, Option<String>) {
    (
        q.create.and_then(|v| format_filetime(v, utc_offset_hours)),
        q.modified.and_then(|v| format_filetime(v, utc_offset_hours)),
        q.mft_modified.and_then(|v| format_filetime(v, utc_offset_hours)),
        q.last_access.and_then(|v| format_filetime(v, utc_offset_hours)),
    )
}

/// Decode one accepted log record into a verdict row, or `None` if its
/// `attr_offset` falls outside the layout tables for its attribute kind.
fn reason_one(row: &LogFileRow, is_fn: bool, utc_offset_hours: i64) -> Option<TimeStompRow> {
    let redo_bytes = parse_hex_bytes(&row.redo_data_hex);
    let undo_bytes = parse_hex_bytes(&row.undo_data_hex);

    let (redo_q, undo_q, attr_name) = if is_fn {
        let (skip, fields) = fn_layout(row.attr_offset)?;
        (
            decode_quadruple(&redo_bytes, skip, fields),
            decode_quadruple(&undo_bytes, skip, fields),
            "FILE_NAME",
        )
    } else {
        let fields = si_layout(row.attr_offset)?;
        (
            decode_quadruple(&redo_bytes, 0, fields),
            decode_quadruple(&undo_bytes, 0, fields),
            "STANDARD_INFORMATION",
        )
    };

    let (undo_create, undo_modified, undo_mft_modified, undo_last_access) =
        format_quadruple(&undo_q, utc_offset_hours);
    let (redo_create, redo_modified, redo_mft_modified, redo_last_access) =
        format_quadruple(&redo_q, utc_offset_hours);

    Some(TimeStompRow {
        this_lsn: row.this_lsn,
        undo_create_time: undo_create,
        undo_modified_time: undo_modified,
        undo_mft_modified_time: undo_mft_modified,
        undo_last_access_time: undo_last_access,
        redo_create_time: redo_create,
        redo_modified_time: redo_modified,
        redo_mft_modified_time: redo_mft_modified,
        redo_last_access_time: redo_last_access,
        is_timestomped: is_timestomped(&undo_q, &redo_q),
        attr_name,
        target_vcn: row.target_vcn,
        cluster_number: row.cluster_number,
        record_offset: row.record_offset,
        attr_offset: row.attr_offset,
    })
}

/// Run the `STANDARD_INFORMATION` pass over rows returned by
/// `query_standard_information()`.
pub fn reason_standard_information(rows: &[LogFileRow], utc_offset_hours: i64) -> Vec<TimeStompRow> {
    debug_assert!(rows.iter().all(|r| r.record_offset == TARGET_STANDARD_INFORMATION));
    rows.iter().filter_map(|r| reason_one(r, false, utc_offset_hours)).collect()
}

/// Run the `FILE_NAME` pass over rows returned by `query_file_name()`.
/// Both this pass and the SI pass run and persist into the same
/// `TimeStomp` table, distinguished by `attr_name`.
pub fn reason_file_name(rows: &[LogFileRow], utc_offset_hours: i64) -> Vec<TimeStompRow> {
    debug_assert!(rows.iter().all(|r| r.record_offset == TARGET_FILE_NAME));
    rows.iter().filter_map(|r| reason_one(r, true, utc_offset_hours)).collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::store::hex_bytes;

    fn quad_bytes(filetimes: &[u64]) -> String {
        let mut bytes = Vec::new();
        for ft in filetimes {
            bytes.extend_from_slice(&ft.to_le_bytes());
        }
        hex_bytes(&bytes)
    }

    fn filetime_for(unix_seconds: i64) -> u64 {
        (unix_seconds * 10_000_000 + 116_444_736_000_000_000) as u64
    }

    fn si_row(attr_offset: u16, undo: &[u64], redo: &[u64]) -> LogFileRow {
        LogFileRow {
            this_lsn: 42,
            previous_lsn: 0,
            record_type: 1,
            redo_op_value: 0x07,
            redo_op_name: "Update Resident Value",
            redo_data_hex: quad_bytes(redo),
            redo_data_length: (redo.len() * 8) as u16,
            undo_op_value: 0x07,
            undo_op_name: "Update Resident Value",
            undo_data_hex: quad_bytes(undo),
            undo_data_length: (undo.len() * 8) as u16,
            target_vcn: 0,
            target_lcn: 0,
            cluster_number: 0,
            record_offset: TARGET_STANDARD_INFORMATION,
            attr_offset,
        }
    }

    #[test]
    fn test_backdated_si_write_flagged() {
        let undo = filetime_for(1_717_243_200); // 2024-06-01 12:00:00
        let redo = filetime_for(978_307_200); // 2001-01-01 00:00:00
        let row = si_row(0x18, &[undo, undo, undo, undo], &[redo, redo, redo, redo]);
        let verdicts = reason_standard_information(&[row], 0);
        assert_eq!(verdicts.len(), 1);
        let v = &verdicts[0];
        assert!(v.is_timestomped);
        assert_eq!(v.redo_create_time.as_deref(), Some("2001-01-01 00:00:00"));
        assert_eq!(v.undo_create_time.as_deref(), Some("2024-06-01 12:00:00"));
    }

    #[test]
    fn test_last_access_only_update() {
        let undo = filetime_for(1_717_243_200);
        let redo = filetime_for(978_307_200);
        let row = si_row(0x30, &[undo], &[redo]);
        let verdicts = reason_standard_information(&[row], 0);
        assert_eq!(verdicts.len(), 1);
        let v = &verdicts[0];
        assert!(v.is_timestomped);
        assert!(v.undo_create_time.is_none());
        assert!(v.undo_modified_time.is_none());
        assert!(v.undo_mft_modified_time.is_none());
        assert!(v.undo_last_access_time.is_some());
    }

    #[test]
    fn test_utc_offset_shifts_output() {
        let instant = filetime_for(1_717_243_200);
        let row = si_row(0x30, &[instant], &[instant]);
        let verdicts = reason_standard_information(&[row], 9);
        assert_eq!(verdicts[0].undo_last_access_time.as_deref(), Some("2024-06-01 21:00:00"));
    }

    #[test]
    fn test_forward_write_not_flagged() {
        let earlier = filetime_for(978_307_200);
        let later = filetime_for(1_717_243_200);
        let row = si_row(0x18, &[earlier, earlier, earlier, earlier], &[later, later, later, later]);
        let verdicts = reason_standard_information(&[row], 0);
        assert!(!verdicts[0].is_timestomped);
    }

    #[test]
    fn test_fn_pass_skips_file_reference_prefix() {
        let file_reference = 0xdeadbeefu64;
        let redo = filetime_for(978_307_200);
        let undo = filetime_for(1_717_243_200);
        let mut row = si_row(0x18, &[file_reference, undo, undo, undo, undo], &[file_reference, redo, redo, redo, redo]);
        row.record_offset = TARGET_FILE_NAME;
        let verdicts = reason_file_name(&[row], 0);
        assert_eq!(verdicts.len(), 1);
        assert!(verdicts[0].is_timestomped);
        assert_eq!(verdicts[0].attr_name, "FILE_NAME");
    }

    #[test]
    fn test_unsupported_attr_offset_yields_no_verdict() {
        let row = si_row(0x40, &[], &[]);
        assert!(reason_standard_information(&[row], 0).is_empty());
    }
}
