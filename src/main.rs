use anyhow::{Context, Result};
use clap::Parser;
use mmap_rs::{MmapFlags, MmapOptions};

use ntfs_logaudit::config::Config;
use ntfs_logaudit::store::{hex_bytes, LogFileRow, SqliteStore, Store};
use ntfs_logaudit::{mft, opcodes, reasoner, scanner, walker};

fn map_file_readonly(path: &std::path::Path) -> Result<mmap_rs::Mmap> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("open {}", path.display()))?;
    let size = file
        .metadata()
        .with_context(|| format!("stat {}", path.display()))?
        .len();

    let mmap = unsafe {
        MmapOptions::new(size as usize)
            .context("mmap option")?
            .with_file(&file, 0u64)
            .with_flags(MmapFlags::SHARED)
            .map()
            .with_context(|| format!("mmap {}", path.display()))?
    };
    Ok(mmap)
}

fn scan_log_file(log_bytes: &[u8], store: &mut dyn Store) -> Result<()> {
    let pages = walker::walk(log_bytes).context("walk $LogFile")?;

    let mut batch = Vec::with_capacity(ntfs_logaudit::store::BATCH_SIZE);
    for page in &pages {
        let Some(header) = &page.header else {
            continue;
        };
        for record in scanner::scan(page.page_bytes, header.next_record_offset) {
            let h = &record.header;
            batch.push(LogFileRow {
                this_lsn: h.this_lsn,
                previous_lsn: h.previous_lsn,
                record_type: h.record_type,
                redo_op_value: h.redo_op,
                redo_op_name: opcodes::opcode_name(h.redo_op),
                redo_data_hex: hex_bytes(record.redo),
                redo_data_length: h.redo_length,
                undo_op_value: h.undo_op,
                undo_op_name: opcodes::opcode_name(h.undo_op),
                undo_data_hex: hex_bytes(record.undo),
                undo_data_length: h.undo_length,
                target_vcn: h.target_vcn,
                target_lcn: h.target_lcn,
                cluster_number: h.cluster_number,
                record_offset: h.record_offset,
                attr_offset: h.attr_offset,
            });
            if batch.len() >= ntfs_logaudit::store::BATCH_SIZE {
                store.insert_log_records(&batch).context("flush LogFile batch")?;
                batch.clear();
            }
        }
    }
    if !batch.is_empty() {
        store.insert_log_records(&batch).context("flush final LogFile batch")?;
    }
    Ok(())
}

fn run_reasoner(store: &mut dyn Store, utc_offset_hours: i64) -> Result<()> {
    let si_rows = store
        .query_standard_information()
        .context("query STANDARD_INFORMATION records")?;
    let si_verdicts = reasoner::reason_standard_information(&si_rows, utc_offset_hours);
    store.insert_verdicts(&si_verdicts).context("insert SI verdicts")?;

    let fn_rows = store.query_file_name().context("query FILE_NAME records")?;
    let fn_verdicts = reasoner::reason_file_name(&fn_rows, utc_offset_hours);
    store.insert_verdicts(&fn_verdicts).context("insert FN verdicts")?;
    Ok(())
}

fn run_mft_cross_check(mft_path: &std::path::Path, store: &mut dyn Store, utc_offset_hours: i64) -> Result<()> {
    let mmap = map_file_readonly(mft_path)?;
    let rows = mft::cross_check(mmap.as_slice(), utc_offset_hours);
    store.insert_si_fn_rows(&rows).context("insert si_fn rows")?;
    Ok(())
}

fn run(config: &Config) -> Result<()> {
    let log_mmap = map_file_readonly(&config.logfile)?;
    let mut store = SqliteStore::open(&config.database)
        .with_context(|| format!("open database at {}", config.database.display()))?;

    scan_log_file(log_mmap.as_slice(), &mut store)?;
    println!("LogFile: scan of {} complete", config.logfile.display());

    run_reasoner(&mut store, config.utc)?;
    println!("Timestamp: reasoner pass complete (UTC offset {})", config.utc);

    if let Some(mft_path) = &config.mft {
        run_mft_cross_check(mft_path, &mut store, config.utc)?;
        println!("MFT: cross-check of {} complete", mft_path.display());
    }

    Ok(())
}

fn main() {
    let config = Config::parse();
    if let Err(err) = run(&config) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
