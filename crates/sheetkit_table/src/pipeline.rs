//! Resolve -> extract -> assemble orchestration for one workbook.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::assemble::assemble_output_table;
use crate::extract::{WorkbookSource, extract_source_table};
use crate::spec::{PipelineError, SpecPipelineConfig, SpecPipelineReport};
use crate::util::resolve_sheet_index;

/// Run the full pipeline against one opened workbook.
///
/// Any failure aborts the run; no partial table is returned. A workbook with
/// too few sheets is reported against the highest position any source needs.
pub fn run_pipeline<W: WorkbookSource + ?Sized>(
    reader: &mut W,
    config: &SpecPipelineConfig,
) -> Result<SpecPipelineReport, PipelineError> {
    validate_pipeline_config(config)?;

    let l_sheet_names = reader.list_sheets();
    debug!(sheets = l_sheet_names.len(), "workbook opened");

    let n_position_max = config
        .sources
        .iter()
        .map(|spec_source| spec_source.sheet_position)
        .max()
        .unwrap_or(0);
    resolve_sheet_index(&l_sheet_names, n_position_max)?;

    let mut l_sheet_idx = Vec::with_capacity(config.sources.len());
    for spec_source in &config.sources {
        l_sheet_idx.push(resolve_sheet_index(&l_sheet_names, spec_source.sheet_position)?);
    }

    let mut report = SpecPipelineReport::default();
    let mut l_tables = Vec::with_capacity(config.sources.len());
    for (spec_source, n_sheet_idx) in config.sources.iter().zip(l_sheet_idx) {
        let c_sheet_name = &l_sheet_names[n_sheet_idx];
        info!(
            source = %spec_source.name,
            position = spec_source.sheet_position,
            sheet = %c_sheet_name,
            "locked source sheet"
        );
        let table = extract_source_table(
            reader,
            spec_source,
            n_sheet_idx,
            c_sheet_name,
            config.force_text,
        )?;
        report
            .sheets_resolved
            .push((spec_source.name.clone(), c_sheet_name.clone()));
        report
            .rows_by_source
            .push((spec_source.name.clone(), table.height()));
        report
            .rows_raw_by_source
            .push((spec_source.name.clone(), table.rows_raw.clone()));
        l_tables.push(table);
    }

    let output = assemble_output_table(&l_tables, &config.outputs, &config.assemble)?;

    let set_sources_used: BTreeSet<&str> = config
        .outputs
        .iter()
        .map(|spec_ref| spec_ref.source_name.as_str())
        .collect();
    let l_warnings: Vec<String> = report
        .rows_by_source
        .iter()
        .filter(|(c_source, n_rows)| {
            set_sources_used.contains(c_source.as_str()) && *n_rows > output.height()
        })
        .map(|(c_source, n_rows)| {
            format!(
                "Source {c_source:?} has {n_rows} rows; {} dropped to match the shortest source.",
                n_rows - output.height()
            )
        })
        .collect();
    for c_warning in l_warnings {
        report.warn(c_warning);
    }

    report.output = output;
    Ok(report)
}

fn validate_pipeline_config(config: &SpecPipelineConfig) -> Result<(), PipelineError> {
    if config.sources.is_empty() {
        return Err(PipelineError::InvalidConfig(
            "At least one source table is required.".to_string(),
        ));
    }

    let mut set_names = BTreeSet::new();
    for spec_source in &config.sources {
        if spec_source.name.trim().is_empty() {
            return Err(PipelineError::InvalidConfig(
                "Source names must not be empty.".to_string(),
            ));
        }
        if !set_names.insert(spec_source.name.as_str()) {
            return Err(PipelineError::InvalidConfig(format!(
                "Duplicate source name {:?}.",
                spec_source.name
            )));
        }
        if spec_source.columns.is_empty() {
            return Err(PipelineError::InvalidConfig(format!(
                "Source {:?} requests no columns.",
                spec_source.name
            )));
        }
    }
    Ok(())
}
