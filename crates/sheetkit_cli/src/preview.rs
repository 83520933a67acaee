//! Before/after preview of one pipeline run.

use sheetkit_table::{EnumCellValue, SpecPipelineReport};

const C_LABEL_BEFORE: &str = "before";
const C_LABEL_AFTER: &str = "after";
const C_CELL_MISSING: &str = "-";
const C_COLUMN_GAP: &str = "  ";

/// Render the first `n_rows` rows as `before | after` lines.
///
/// The left side lays every source's rows side by side as read, before any
/// reconstruction; the right side is the assembled output. Missing cells
/// show as `-`. Returns nothing when `n_rows` is 0 or there is nothing to show.
pub fn format_preview_side_by_side(report: &SpecPipelineReport, n_rows: usize) -> Vec<String> {
    let n_height = report
        .rows_raw_by_source
        .iter()
        .map(|(_, rows)| rows.len())
        .chain([report.output.height()])
        .max()
        .unwrap_or(0);
    let n_shown = usize::min(n_rows, n_height);
    if n_shown == 0 {
        return Vec::new();
    }

    let l_cells_before: Vec<Vec<&str>> = (0..n_shown)
        .map(|n_row| {
            report
                .rows_raw_by_source
                .iter()
                .flat_map(|(_, rows)| derive_row_cells(rows, n_row))
                .collect()
        })
        .collect();
    let l_cells_after: Vec<Vec<&str>> = report
        .output
        .preview(n_shown)
        .iter()
        .map(|row| row.iter().map(derive_cell_text).collect())
        .collect();

    let l_before = render_aligned(&l_cells_before);
    let l_after = render_aligned(&l_cells_after);
    let n_width_before = l_before
        .iter()
        .map(|line| line.chars().count())
        .chain([C_LABEL_BEFORE.len()])
        .max()
        .unwrap_or(0);

    let mut l_lines = Vec::with_capacity(n_shown + 2);
    l_lines.push(format!("{C_LABEL_BEFORE:<n_width_before$} | {C_LABEL_AFTER}"));
    for n_row in 0..n_shown {
        let c_before = l_before.get(n_row).map_or("", String::as_str);
        let c_after = l_after.get(n_row).map_or("", String::as_str);
        l_lines.push(
            format!("{c_before:<n_width_before$} | {c_after}")
                .trim_end()
                .to_string(),
        );
    }
    if n_height > n_shown {
        l_lines.push(format!("... {} more row(s)", n_height - n_shown));
    }
    l_lines
}

fn derive_cell_text(cell: &EnumCellValue) -> &str {
    if cell.is_empty() {
        C_CELL_MISSING
    } else {
        cell.as_str()
    }
}

/// One source's cells for `n_row`; blanks past the end of a shorter source.
fn derive_row_cells(rows: &[Vec<EnumCellValue>], n_row: usize) -> Vec<&str> {
    match rows.get(n_row) {
        Some(row) => row.iter().map(derive_cell_text).collect(),
        None => vec![""; rows.first().map_or(0, Vec::len)],
    }
}

/// Pad every column to its widest cell so rows line up.
fn render_aligned(l_rows: &[Vec<&str>]) -> Vec<String> {
    let n_cols = l_rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut l_widths = vec![0usize; n_cols];
    for row in l_rows {
        for (n_idx, cell) in row.iter().enumerate() {
            l_widths[n_idx] = usize::max(l_widths[n_idx], cell.chars().count());
        }
    }

    l_rows
        .iter()
        .map(|row| {
            row.iter()
                .zip(&l_widths)
                .map(|(cell, &n_width)| format!("{cell:<n_width$}"))
                .collect::<Vec<_>>()
                .join(C_COLUMN_GAP)
                .trim_end()
                .to_string()
        })
        .collect()
}
