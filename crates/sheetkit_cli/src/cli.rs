//! Command-line surface.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use sheetkit_io_xlsx::EnumOutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "sheetkit",
    version,
    about = "Rebuild merged-cell columns from spreadsheets and assemble them into one table."
)]
pub struct Cli {
    /// Raise log verbosity to debug (`RUST_LOG` is used otherwise).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: EnumCommand,
}

#[derive(Subcommand, Debug)]
pub enum EnumCommand {
    /// Print the workbook's sheets with their 1-based positions.
    Sheets {
        /// Workbook to inspect.
        workbook: PathBuf,
    },
    /// Extract, reconstruct and assemble one table per workbook.
    Run(SpecRunArgs),
    /// Print an example configuration file.
    InitConfig,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum EnumFormatArg {
    Csv,
    Xlsx,
}

impl From<EnumFormatArg> for EnumOutputFormat {
    fn from(value: EnumFormatArg) -> Self {
        match value {
            EnumFormatArg::Csv => EnumOutputFormat::DelimitedText,
            EnumFormatArg::Xlsx => EnumOutputFormat::ReformattedSpreadsheet,
        }
    }
}

#[derive(Args, Debug)]
pub struct SpecRunArgs {
    /// TOML configuration (see `sheetkit init-config`).
    #[arg(short, long, value_name = "PATH")]
    pub config: PathBuf,

    /// Output format; overrides `[output].format`.
    #[arg(long, value_enum)]
    pub format: Option<EnumFormatArg>,

    /// Directory receiving `<stem>_<sheet>_extract.<ext>` files.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Fail when referenced sources have different row counts.
    #[arg(long)]
    pub strict: bool,

    /// Rows to preview per workbook; overrides `[output].preview-rows`.
    #[arg(long, value_name = "N")]
    pub preview: Option<usize>,

    /// Run the pipeline and preview, but write nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Worker threads for multiple workbooks (default: min(cpus, 8)).
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Workbooks to process.
    #[arg(required = true)]
    pub workbooks: Vec<PathBuf>,
}
