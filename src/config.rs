use std::path::PathBuf;

use clap::Parser;

pub const DEFAULT_DATABASE_PATH: &str = "log_records.db";

#[derive(Parser)]
pub struct Config {
    #[clap(short = 'f', long = "logfile", help = "Path to the raw $LogFile")]
    pub logfile: PathBuf,

    #[clap(short = 't', long = "utc", help = "Signed hours offset applied to emitted timestamps")]
    pub utc: i64,

    #[clap(short = 'm', long = "mft", help = "Path to the raw $MFT")]
    pub mft: Option<PathBuf>,

    #[clap(
        short = 'o',
        long = "database",
        default_value = DEFAULT_DATABASE_PATH,
        help = "Output SQLite database path"
    )]
    pub database: PathBuf,
}
