//! Stateless helpers shared by the workbook reader and writers.

use crate::conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL,
};
use crate::spec::{SpecAutofitCellsPolicy, SpecSheetSlice, SpecXlsxReport};

////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().trim_matches('\'').trim().to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Create suffixed sheet name (`base_1`, `base_2`, ...), respecting length cap.
pub fn create_sheet_identifier(base_name: &str, part_idx_1based: usize) -> String {
    let c_suffix = format!("_{part_idx_1based}");
    let n_len_base_max = N_LEN_EXCEL_SHEET_NAME_MAX.saturating_sub(c_suffix.len());

    let c_base: String = base_name.chars().take(usize::max(1, n_len_base_max)).collect();
    format!("{c_base}{c_suffix}")
}

/// Split a `height x width` table into Excel-compliant sheet slices.
///
/// `height_header` rows are reserved at the top of every slice; `0` means
/// the body starts at the first row.
pub fn plan_sheet_slices(
    height_table: usize,
    width_table: usize,
    height_header: usize,
    sheet_name: &str,
    report: &mut SpecXlsxReport,
) -> Result<Vec<SpecSheetSlice>, String> {
    let n_rows_data_max = N_NROWS_EXCEL_MAX.saturating_sub(height_header);
    if n_rows_data_max == 0 {
        return Err(format!(
            "Header too tall: height_header={height_header} exceeds Excel limit."
        ));
    }

    let l_col_slices = generate_spans(width_table, N_NCOLS_EXCEL_MAX);
    let mut l_row_slices = generate_spans(height_table, n_rows_data_max);
    if l_row_slices.is_empty() {
        l_row_slices.push((0, 0));
    }

    let n_parts_total = l_col_slices.len() * l_row_slices.len();
    let mut l_sheet_parts = Vec::with_capacity(n_parts_total);
    let mut n_idx_part = 1;
    for (n_col_start, n_col_end) in &l_col_slices {
        for (n_row_start, n_row_end) in &l_row_slices {
            let c_part_sheet_name = if n_parts_total == 1 {
                sheet_name.to_string()
            } else {
                create_sheet_identifier(sheet_name, n_idx_part)
            };
            l_sheet_parts.push(SpecSheetSlice {
                sheet_name: c_part_sheet_name,
                row_start_inclusive: *n_row_start,
                row_end_exclusive: *n_row_end,
                col_start_inclusive: *n_col_start,
                col_end_exclusive: *n_col_end,
            });
            n_idx_part += 1;
        }
    }

    if n_parts_total > 1 {
        report.warn(format!(
            "Excel limit overflow: split into {} sheets (columns-first, then rows).",
            l_sheet_parts.len()
        ));
    }

    Ok(l_sheet_parts)
}

/// Generate `[start, end)` spans of at most `size_span` covering `n_total`.
pub fn generate_spans(n_total: usize, size_span: usize) -> Vec<(usize, usize)> {
    let mut l_spans = Vec::new();
    if size_span == 0 {
        return l_spans;
    }
    let mut n_cursor = 0;
    while n_cursor < n_total {
        let n_end = usize::min(n_total, n_cursor + size_span);
        l_spans.push((n_cursor, n_end));
        n_cursor = n_end;
    }
    l_spans
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColumnWidth

/// Final column width: `clamp(widest + padding, min, max)`.
///
/// `n_width_recorded` is the longest cell text in characters.
pub fn calculate_column_width(n_width_recorded: usize, policy: &SpecAutofitCellsPolicy) -> usize {
    let n_min = usize::max(1, policy.width_cell_min);
    let n_max = usize::min(255, usize::max(n_min, policy.width_cell_max));
    (n_width_recorded + policy.width_cell_padding).clamp(n_min, n_max)
}

/// Validate autofit policy bounds.
pub fn validate_policy_autofit(policy: &SpecAutofitCellsPolicy) -> Result<(), String> {
    if policy.width_cell_min == 0 {
        return Err("policy_autofit.width_cell_min must be >= 1.".to_string());
    }
    if policy.width_cell_max < policy.width_cell_min {
        return Err(
            "policy_autofit.width_cell_max must be >= policy_autofit.width_cell_min.".to_string(),
        );
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
