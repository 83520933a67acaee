//! Column extraction with merged-cell reconstruction.

use tracing::debug;

use crate::spec::{
    EnumCellValue, EnumReconstructionPolicy, PipelineError, SpecRawGrid, SpecSourceSpec,
    SpecSourceTable,
};
use crate::util::{apply_fill_down, parse_column_letter};

/// Workbook reader capability consumed by the pipeline.
///
/// Implementations hold one opened workbook; nothing is shared between runs.
pub trait WorkbookSource {
    /// Ordered sheet names as they appear in the workbook.
    fn list_sheets(&mut self) -> Vec<String>;

    /// Materialize the given 0-based columns of sheet `sheet_idx`.
    ///
    /// `column_indices` may come in any order and contain duplicates. The
    /// returned grid lists its columns in ascending physical order. With
    /// `force_text`, no cell is decoded as a number or date.
    fn read_grid(
        &mut self,
        sheet_idx: usize,
        column_indices: &[usize],
        force_text: bool,
    ) -> Result<SpecRawGrid, String>;
}

/// Extract one source table and apply each column's reconstruction policy.
///
/// Columns come back in the order they were requested, even though the
/// reader returns them in physical order. Columns the sheet does not have
/// are synthesized as all-empty.
pub fn extract_source_table<W: WorkbookSource + ?Sized>(
    reader: &mut W,
    spec_source: &SpecSourceSpec,
    sheet_idx: usize,
    sheet_name: &str,
    if_force_text: bool,
) -> Result<SpecSourceTable, PipelineError> {
    if spec_source.columns.is_empty() {
        return Err(PipelineError::InvalidConfig(format!(
            "Source {:?} requests no columns.",
            spec_source.name
        )));
    }

    let l_cols_idx_requested = spec_source
        .columns
        .iter()
        .map(|spec_col| parse_column_letter(&spec_col.position))
        .collect::<Result<Vec<_>, _>>()?;

    let c_columns = spec_source
        .columns
        .iter()
        .map(|spec_col| spec_col.position.trim().to_ascii_uppercase())
        .collect::<Vec<_>>()
        .join(", ");
    let derive_read_error = |message: String| PipelineError::SourceRead {
        sheet: sheet_name.to_string(),
        columns: c_columns.clone(),
        message,
    };

    let grid = reader
        .read_grid(sheet_idx, &l_cols_idx_requested, if_force_text)
        .map_err(derive_read_error)?;

    let n_width_grid = grid.column_indices.len();
    if let Some(n_row_bad) = grid.rows.iter().position(|row| row.len() != n_width_grid) {
        return Err(derive_read_error(format!(
            "Reader returned a ragged grid: row {n_row_bad} has {} cells, expected {n_width_grid}.",
            grid.rows[n_row_bad].len()
        )));
    }

    let n_rows = grid.rows.len().saturating_sub(spec_source.row_start);
    let mut l_columns_raw = Vec::with_capacity(l_cols_idx_requested.len());
    let mut l_columns: Vec<Vec<EnumCellValue>> = Vec::with_capacity(l_cols_idx_requested.len());
    for (spec_col, n_col_idx) in spec_source.columns.iter().zip(&l_cols_idx_requested) {
        let l_cells_raw = match grid.column_indices.iter().position(|idx| idx == n_col_idx) {
            Some(n_grid_col) => grid
                .rows
                .iter()
                .skip(spec_source.row_start)
                .map(|row| row[n_grid_col].clone())
                .collect::<Vec<_>>(),
            None => vec![EnumCellValue::None; n_rows],
        };
        let mut l_cells = l_cells_raw.clone();
        if spec_col.policy == EnumReconstructionPolicy::FillDown {
            apply_fill_down(&mut l_cells);
        }
        l_columns_raw.push(l_cells_raw);
        l_columns.push(l_cells);
    }

    let rows = transpose_columns(&l_columns, n_rows);
    let rows_raw = transpose_columns(&l_columns_raw, n_rows);

    debug!(
        source = %spec_source.name,
        sheet = %sheet_name,
        columns = %c_columns,
        rows = n_rows,
        "extracted source table"
    );

    Ok(SpecSourceTable {
        name: spec_source.name.clone(),
        sheet_name: sheet_name.to_string(),
        columns: spec_source.columns.clone(),
        rows,
        rows_raw,
    })
}

fn transpose_columns(l_columns: &[Vec<EnumCellValue>], n_rows: usize) -> Vec<Vec<EnumCellValue>> {
    (0..n_rows)
        .map(|n_row| l_columns.iter().map(|col| col[n_row].clone()).collect())
        .collect()
}
