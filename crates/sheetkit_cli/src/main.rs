//! `sheetkit` binary entry point.

mod batch;
mod cli;
mod config;
mod preview;

use std::process::ExitCode;

use anyhow::{Result, anyhow};
use clap::Parser;
use sheetkit_io_xlsx::{CalamineWorkbook, SpecOutputOptions};
use sheetkit_table::WorkbookSource;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::batch::{SpecBatchOptions, run_batch};
use crate::cli::{Cli, EnumCommand, SpecRunArgs};
use crate::config::{C_EXAMPLE_CONFIG, SpecFileConfig};
use crate::preview::format_preview_side_by_side;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(n_verbose: u8) {
    let filter = if n_verbose > 0 {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(command: EnumCommand) -> Result<ExitCode> {
    match command {
        EnumCommand::Sheets { workbook } => {
            let mut reader =
                CalamineWorkbook::from_path(&workbook).map_err(|err| anyhow!(err.describe()))?;
            for (n_idx, c_name) in reader.list_sheets().iter().enumerate() {
                println!("{}\t{c_name}", n_idx + 1);
            }
            Ok(ExitCode::SUCCESS)
        }
        EnumCommand::InitConfig => {
            print!("{C_EXAMPLE_CONFIG}");
            Ok(ExitCode::SUCCESS)
        }
        EnumCommand::Run(args) => run_extract(args),
    }
}

fn run_extract(args: SpecRunArgs) -> Result<ExitCode> {
    let cfg_file = SpecFileConfig::from_path(&args.config)?;
    let config = cfg_file.to_pipeline_config(args.strict);
    let options = SpecBatchOptions {
        output: SpecOutputOptions {
            format: args
                .format
                .map_or_else(|| cfg_file.output.format.into(), Into::into),
            delimited: cfg_file.to_delimited_options()?,
            ..SpecOutputOptions::default()
        },
        out_dir: args.out_dir,
        if_dry_run: args.dry_run,
        n_workers_max: args.workers,
    };
    let n_preview = args.preview.unwrap_or(cfg_file.output.preview_rows);

    info!(workbooks = args.workbooks.len(), "starting extraction");
    let mut n_failed = 0usize;
    for (path_workbook, result) in run_batch(&args.workbooks, &config, &options) {
        match result {
            Ok(outcome) => {
                println!(
                    "{}: {} row(s) x {} column(s)",
                    path_workbook.display(),
                    outcome.report.output.height(),
                    outcome.report.output.width()
                );
                for c_line in format_preview_side_by_side(&outcome.report, n_preview) {
                    println!("  {c_line}");
                }
                if let Some(path_out) = &outcome.path_out {
                    println!("  -> {}", path_out.display());
                }
            }
            Err(err) => {
                n_failed += 1;
                eprintln!("{}: {err:#}", path_workbook.display());
            }
        }
    }

    Ok(if n_failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
