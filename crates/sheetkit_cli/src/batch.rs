//! Per-workbook runs, optionally spread over a rayon pool.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use sheetkit_io_xlsx::{
    CalamineWorkbook, SpecOutputOptions, encode_output_table, sanitize_sheet_name,
};
use sheetkit_table::{SpecPipelineConfig, SpecPipelineReport, run_pipeline};
use tracing::{info, warn};

/// Batch-wide options.
#[derive(Debug, Clone)]
pub struct SpecBatchOptions {
    pub output: SpecOutputOptions,
    pub out_dir: PathBuf,
    pub if_dry_run: bool,
    pub n_workers_max: Option<usize>,
}

/// Outcome of one successful workbook run.
#[derive(Debug, Clone)]
pub struct SpecRunOutcome {
    pub report: SpecPipelineReport,
    /// `None` on dry runs.
    pub path_out: Option<PathBuf>,
}

pub(crate) fn calculate_worker_limit(num_workers_max: Option<usize>) -> usize {
    let n_cpu = std::thread::available_parallelism()
        .map(|v| v.get())
        .unwrap_or(1);

    match num_workers_max {
        Some(n) => n.clamp(1, n_cpu),
        None => n_cpu.clamp(1, 8),
    }
}

/// `<dir>/<stem>_<sheet>_extract.<ext>`.
pub fn derive_output_path(
    out_dir: &Path,
    path_workbook: &Path,
    sheet_name: &str,
    ext: &str,
) -> PathBuf {
    let c_stem = path_workbook
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "workbook".to_string());
    out_dir.join(format!(
        "{c_stem}_{}_extract.{ext}",
        sanitize_sheet_name(sheet_name, "_")
    ))
}

/// Run one workbook end to end. Nothing is written when any stage fails.
pub fn run_workbook(
    path_workbook: &Path,
    config: &SpecPipelineConfig,
    options: &SpecBatchOptions,
) -> Result<SpecRunOutcome> {
    let mut reader =
        CalamineWorkbook::from_path(path_workbook).map_err(|err| anyhow!(err.describe()))?;
    let report = run_pipeline(&mut reader, config).map_err(|err| anyhow!(err.describe()))?;
    for c_warning in &report.warnings {
        warn!(workbook = %path_workbook.display(), "{c_warning}");
    }

    let c_sheet_name = report
        .sheets_resolved
        .first()
        .map(|(_, sheet)| sheet.clone())
        .unwrap_or_default();

    let path_out = if options.if_dry_run {
        None
    } else {
        let encoded = encode_output_table(&report.output, &c_sheet_name, &options.output)
            .map_err(|err| anyhow!("write failed: {err}"))?;
        let path_out = derive_output_path(
            &options.out_dir,
            path_workbook,
            &c_sheet_name,
            encoded.format.extension(),
        );
        fs::create_dir_all(&options.out_dir)
            .with_context(|| format!("write failed: {}", options.out_dir.display()))?;
        fs::write(&path_out, &encoded.bytes)
            .with_context(|| format!("write failed: {}", path_out.display()))?;
        info!(
            workbook = %path_workbook.display(),
            output = %path_out.display(),
            rows = report.output.height(),
            "wrote output table"
        );
        Some(path_out)
    };

    Ok(SpecRunOutcome {
        report,
        path_out,
    })
}

/// Run every workbook independently; results keep input order.
pub fn run_batch(
    l_workbooks: &[PathBuf],
    config: &SpecPipelineConfig,
    options: &SpecBatchOptions,
) -> Vec<(PathBuf, Result<SpecRunOutcome>)> {
    let run_one = |path: &PathBuf| (path.clone(), run_workbook(path, config, options));
    if l_workbooks.len() <= 1 {
        return l_workbooks.iter().map(run_one).collect();
    }

    let n_workers = calculate_worker_limit(options.n_workers_max);
    let Ok(thread_pool) = ThreadPoolBuilder::new().num_threads(n_workers).build() else {
        warn!(workers = n_workers, "failed to initialize thread pool; running serially");
        return l_workbooks.iter().map(run_one).collect();
    };
    thread_pool.install(|| l_workbooks.par_iter().map(run_one).collect())
}
