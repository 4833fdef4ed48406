//! Persistence of decoded log records, reasoner verdicts, and MFT
//! cross-check rows.
//!
//! The parser and reasoner depend only on the [`Store`] trait; [`SqliteStore`]
//! is the concrete, production-grade implementation backed by `rusqlite`.

use std::io::{Error, ErrorKind, Result};
use std::path::Path;

use rusqlite::{params, Connection};

/// One accepted log record, ready for persistence.
pub struct LogFileRow {
    pub this_lsn: u64,
    pub previous_lsn: u64,
    pub record_type: u32,
    pub redo_op_value: u16,
    pub redo_op_name: &'static str,
    pub redo_data_hex: String,
    pub redo_data_length: u16,
    pub undo_op_value: u16,
    pub undo_op_name: &'static str,
    pub undo_data_hex: String,
    pub undo_data_length: u16,
    pub target_vcn: u64,
    pub target_lcn: u64,
    pub cluster_number: u16,
    pub record_offset: u16,
    pub attr_offset: u16,
}

/// One reasoner verdict, either the `STANDARD_INFORMATION` or `FILE_NAME` pass.
pub struct TimeStompRow {
    pub this_lsn: u64,
    pub undo_create_time: Option<String>,
    pub undo_modified_time: Option<String>,
    pub undo_mft_modified_time: Option<String>,
    pub undo_last_access_time: Option<String>,
    pub redo_create_time: Option<String>,
    pub redo_modified_time: Option<String>,
    pub redo_mft_modified_time: Option<String>,
    pub redo_last_access_time: Option<String>,
    pub is_timestomped: bool,
    pub attr_name: &'static str,
    pub target_vcn: u64,
    pub cluster_number: u16,
    pub record_offset: u16,
    pub attr_offset: u16,
}

/// One flagged MFT entry from the cross-checker.
pub struct SiFnRow {
    pub mft_entry: u64,
    pub si_create_time: Option<String>,
    pub si_modified_time: Option<String>,
    pub si_mft_modified_time: Option<String>,
    pub si_last_access_time: Option<String>,
    pub fn_create_time: Option<String>,
    pub fn_modified_time: Option<String>,
    pub fn_mft_modified_time: Option<String>,
    pub fn_last_access_time: Option<String>,
    pub is_timestomped: bool,
}

/// Narrow persistence seam: the parser, reasoner, and cross-checker depend
/// only on this trait, never on SQL directly.
pub trait Store {
    fn insert_log_records(&mut self, rows: &[LogFileRow]) -> Result<()>;
    fn insert_verdicts(&mut self, rows: &[TimeStompRow]) -> Result<()>;
    fn insert_si_fn_rows(&mut self, rows: &[SiFnRow]) -> Result<()>;
    fn query_standard_information(&self) -> Result<Vec<LogFileRow>>;
    fn query_file_name(&self) -> Result<Vec<LogFileRow>>;
}

/// Number of rows buffered before a batch is flushed inside one transaction.
pub const BATCH_SIZE: usize = 100_000;

/// Format an address-like integer as zero-padded, `0x`-prefixed uppercase
/// hex text, preserving the auditor's mental model of the raw bytes.
pub fn hex_u64(value: u64) -> String {
    format!("0x{value:016X}")
}

pub fn hex_u32(value: u32) -> String {
    format!("0x{value:08X}")
}

pub fn hex_u16(value: u16) -> String {
    format!("0x{value:04X}")
}

/// Format a variable-length payload as `0x`-prefixed uppercase hex text.
pub fn hex_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("0x");
    for b in bytes {
        out.push_str(&format!("{b:02X}"));
    }
    out
}

/// Inverse of [`hex_bytes`]. Malformed hex decodes to an empty payload
/// rather than erroring, consistent with this being a display-only format.
pub fn parse_hex_bytes(text: &str) -> Vec<u8> {
    let text = text.trim_start_matches("0x");
    if text.len() % 2 != 0 {
        return Vec::new();
    }
    (0..text.len())
        .step_by(2)
        .filter_map(|i| u8::from_str_radix(&text[i..i + 2], 16).ok())
        .collect()
}

/// SQLite-backed [`Store`]. Any existing database at `path` is removed
/// before opening, matching the original distillation's `init_db()`.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        let conn = Connection::open(path).map_err(to_io_error)?;
        conn.execute_batch(
            "CREATE TABLE LogFile (
                this_lsn TEXT NOT NULL,
                previous_lsn TEXT NOT NULL,
                record_type TEXT NOT NULL,
                redo_op_value TEXT NOT NULL,
                redo_op_name TEXT NOT NULL,
                redo_data_hex TEXT NOT NULL,
                redo_data_length TEXT NOT NULL,
                undo_op_value TEXT NOT NULL,
                undo_op_name TEXT NOT NULL,
                undo_data_hex TEXT NOT NULL,
                undo_data_length TEXT NOT NULL,
                target_vcn TEXT NOT NULL,
                target_lcn TEXT NOT NULL,
                cluster_number TEXT NOT NULL,
                record_offset TEXT NOT NULL,
                attr_offset TEXT NOT NULL
            );
            CREATE TABLE TimeStomp (
                this_lsn TEXT NOT NULL,
                undo_create_time TEXT,
                undo_modified_time TEXT,
                undo_mft_modified_time TEXT,
                undo_last_access_time TEXT,
                redo_create_time TEXT,
                redo_modified_time TEXT,
                redo_mft_modified_time TEXT,
                redo_last_access_time TEXT,
                is_timestomped INTEGER NOT NULL,
                attr_name TEXT NOT NULL,
                target_vcn TEXT NOT NULL,
                cluster_number TEXT NOT NULL,
                record_offset TEXT NOT NULL,
                attr_offset TEXT NOT NULL
            );
            CREATE TABLE si_fn (
                mft_entry TEXT NOT NULL,
                si_create_time TEXT,
                si_modified_time TEXT,
                si_mft_modified_time TEXT,
                si_last_access_time TEXT,
                fn_create_time TEXT,
                fn_modified_time TEXT,
                fn_mft_modified_time TEXT,
                fn_last_access_time TEXT,
                is_timestomped INTEGER NOT NULL
            );",
        )
        .map_err(to_io_error)?;
        Ok(SqliteStore { conn })
    }
}

fn to_io_error(err: rusqlite::Error) -> Error {
    Error::new(ErrorKind::Other, format!("store error: {err}"))
}

impl Store for SqliteStore {
    fn insert_log_records(&mut self, rows: &[LogFileRow]) -> Result<()> {
        let tx = self.conn.transaction().map_err(to_io_error)?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO LogFile (
                        this_lsn, previous_lsn, record_type,
                        redo_op_value, redo_op_name, redo_data_hex, redo_data_length,
                        undo_op_value, undo_op_name, undo_data_hex, undo_data_length,
                        target_vcn, target_lcn, cluster_number, record_offset, attr_offset
                    ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16)",
                )
                .map_err(to_io_error)?;
            for r in rows {
                stmt.execute(params![
                    hex_u64(r.this_lsn),
                    hex_u64(r.previous_lsn),
                    hex_u32(r.record_type),
                    hex_u16(r.redo_op_value),
                    r.redo_op_name,
                    r.redo_data_hex,
                    hex_u16(r.redo_data_length),
                    hex_u16(r.undo_op_value),
                    r.undo_op_name,
                    r.undo_data_hex,
                    hex_u16(r.undo_data_length),
                    hex_u64(r.target_vcn),
                    hex_u64(r.target_lcn),
                    hex_u16(r.cluster_number),
                    hex_u16(r.record_offset),
                    hex_u16(r.attr_offset),
                ])
                .map_err(to_io_error)?;
            }
        }
        tx.commit().map_err(to_io_error)
    }

    fn insert_verdicts(&mut self, rows: &[TimeStompRow]) -> Result<()> {
        let tx = self.conn.transaction().map_err(to_io_error)?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO TimeStomp (
                        this_lsn,
                        undo_create_time, undo_modified_time, undo_mft_modified_time, undo_last_access_time,
                        redo_create_time, redo_modified_time, redo_mft_modified_time, redo_last_access_time,
                        is_timestomped, attr_name, target_vcn, cluster_number, record_offset, attr_offset
                    ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15)",
                )
                .map_err(to_io_error)?;
            for r in rows {
                stmt.execute(params![
                    hex_u64(r.this_lsn),
                    r.undo_create_time,
                    r.undo_modified_time,
                    r.undo_mft_modified_time,
                    r.undo_last_access_time,
                    r.redo_create_time,
                    r.redo_modified_time,
                    r.redo_mft_modified_time,
                    r.redo_last_access_time,
                    r.is_timestomped as i64,
                    r.attr_name,
                    hex_u64(r.target_vcn),
                    hex_u16(r.cluster_number),
                    hex_u16(r.record_offset),
                    hex_u16(r.attr_offset),
                ])
                .map_err(to_io_error)?;
            }
        }
        tx.commit().map_err(to_io_error)
    }

    fn insert_si_fn_rows(&mut self, rows: &[SiFnRow]) -> Result<()> {
        let tx = self.conn.transaction().map_err(to_io_error)?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO si_fn (
                        mft_entry,
                        si_create_time, si_modified_time, si_mft_modified_time, si_last_access_time,
                        fn_create_time, fn_modified_time, fn_mft_modified_time, fn_last_access_time,
                        is_timestomped
                    ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10)",
                )
                .map_err(to_io_error)?;
            for r in rows {
                stmt.execute(params![
                    hex_u64(r.mft_entry),
                    r.si_create_time,
                    r.si_modified_time,
                    r.si_mft_modified_time,
                    r.si_last_access_time,
                    r.fn_create_time,
                    r.fn_modified_time,
                    r.fn_mft_modified_time,
                    r.fn_last_access_time,
                    r.is_timestomped as i64,
                ])
                .map_err(to_io_error)?;
            }
        }
        tx.commit().map_err(to_io_error)
    }

    fn query_standard_information(&self) -> Result<Vec<LogFileRow>> {
        query_by_target(&self.conn, 0x38, &[0x18, 0x20, 0x28, 0x30])
    }

    fn query_file_name(&self) -> Result<Vec<LogFileRow>> {
        query_by_target(&self.conn, 0x98, &[0x18, 0x20, 0x28, 0x30, 0x38])
    }
}

fn query_by_target(conn: &Connection, record_offset: u16, attr_offsets: &[u16]) -> Result<Vec<LogFileRow>> {
    let mut stmt = conn
        .prepare(
            "SELECT this_lsn, previous_lsn, record_type,
                redo_op_value, redo_op_name, redo_data_hex, redo_data_length,
                undo_op_value, undo_op_name, undo_data_hex, undo_data_length,
                target_vcn, target_lcn, cluster_number, record_offset, attr_offset
             FROM LogFile
             WHERE record_offset = ?1 AND redo_op_value = ?2 AND undo_op_value = ?2",
        )
        .map_err(to_io_error)?;

    let want = hex_u16(record_offset);
    let update_resident = hex_u16(crate::record::OP_UPDATE_RESIDENT_VALUE);
    let rows = stmt
        .query_map(params![want, update_resident], |row| {
            Ok(LogFileRow {
                this_lsn: parse_hex_u64(row.get::<_, String>(0)?),
                previous_lsn: parse_hex_u64(row.get::<_, String>(1)?),
                record_type: parse_hex_u32(row.get::<_, String>(2)?),
                redo_op_value: parse_hex_u16(row.get::<_, String>(3)?),
                redo_op_name: crate::opcodes::opcode_name(parse_hex_u16(row.get::<_, String>(3)?)),
                redo_data_hex: row.get(5)?,
                redo_data_length: parse_hex_u16(row.get::<_, String>(6)?),
                undo_op_value: parse_hex_u16(row.get::<_, String>(7)?),
                undo_op_name: crate::opcodes::opcode_name(parse_hex_u16(row.get::<_, String>(7)?)),
                undo_data_hex: row.get(9)?,
                undo_data_length: parse_hex_u16(row.get::<_, String>(10)?),
                target_vcn: parse_hex_u64(row.get::<_, String>(11)?),
                target_lcn: parse_hex_u64(row.get::<_, String>(12)?),
                cluster_number: parse_hex_u16(row.get::<_, String>(13)?),
                record_offset: parse_hex_u16(row.get::<_, String>(14)?),
                attr_offset: parse_hex_u16(row.get::<_, String>(15)?),
            })
        })
        .map_err(to_io_error)?;

    let mut out = Vec::new();
    for row in rows {
        let row = row.map_err(to_io_error)?;
        if attr_offsets.contains(&row.attr_offset) {
            out.push(row);
        }
    }
    Ok(out)
}

fn parse_hex_u64(text: String) -> u64 {
    u64::from_str_radix(text.trim_start_matches("0x"), 16).unwrap_or(0)
}

fn parse_hex_u32(text: String) -> u32 {
    u32::from_str_radix(text.trim_start_matches("0x"), 16).unwrap_or(0)
}

fn parse_hex_u16(text: String) -> u16 {
    u16::from_str_radix(text.trim_start_matches("0x"), 16).unwrap_or(0)
}
