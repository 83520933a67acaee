//! XLSX writer kernel for header-less, text-only output tables.

use std::collections::BTreeSet;

use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet, XlsxError};
use sheetkit_table::{EnumCellValue, SpecOutputTable};
use tracing::{debug, warn};

use crate::conf::N_LEN_EXCEL_SHEET_NAME_MAX;
use crate::spec::{SpecCellFormat, SpecXlsxReport, SpecXlsxWriteOptions};
use crate::util::{
    calculate_column_width, plan_sheet_slices, sanitize_sheet_name, validate_policy_autofit,
};

/// Stateful in-memory workbook writer.
///
/// Every cell is written as a string with the text number format, so
/// identifiers such as `00123` or `12345` stay text when reopened.
pub struct XlsxWriter {
    workbook: Workbook,
    write_options: SpecXlsxWriteOptions,
    set_sheet_names_existing: BTreeSet<String>,
    l_reports: Vec<SpecXlsxReport>,
}

impl XlsxWriter {
    pub fn new(write_options: SpecXlsxWriteOptions) -> Self {
        Self {
            workbook: Workbook::new(),
            write_options,
            set_sheet_names_existing: BTreeSet::new(),
            l_reports: Vec::new(),
        }
    }

    /// Reports of every `write_sheet` call so far, in call order.
    pub fn reports(&self) -> &[SpecXlsxReport] {
        &self.l_reports
    }

    /// Serialize the workbook to XLSX bytes.
    pub fn save_to_buffer(&mut self) -> Result<Vec<u8>, String> {
        self.workbook
            .save_to_buffer()
            .map_err(derive_xlsx_error_text)
    }

    /// Write one output table as a header-less sheet.
    pub fn write_sheet(&mut self, table: &SpecOutputTable, sheet_name: &str) -> Result<(), String> {
        let policy_autofit = self.write_options.policy_autofit.clone();
        validate_policy_autofit(&policy_autofit)?;

        let mut report = SpecXlsxReport::default();
        let l_sheet_parts = plan_sheet_slices(
            table.height(),
            table.width(),
            0,
            &sanitize_sheet_name(sheet_name, "_"),
            &mut report,
        )?;

        let fmt_text = derive_rust_xlsx_format(&self.write_options.fmt_text);

        for mut sheet_slice in l_sheet_parts {
            let sheet_name_unique = self.derive_unique_sheet_name(&sheet_slice.sheet_name);
            let worksheet = self.workbook.add_worksheet();
            worksheet
                .set_name(&sheet_name_unique)
                .map_err(derive_xlsx_error_text)?;

            let n_width_slice = sheet_slice.col_end_exclusive - sheet_slice.col_start_inclusive;
            let mut l_width_by_col = vec![0usize; n_width_slice];

            let l_rows_slice =
                &table.rows[sheet_slice.row_start_inclusive..sheet_slice.row_end_exclusive];
            for (n_row_local, row) in l_rows_slice.iter().enumerate() {
                let l_cells = &row[sheet_slice.col_start_inclusive..sheet_slice.col_end_exclusive];
                for (n_idx_col, value) in l_cells.iter().enumerate() {
                    l_width_by_col[n_idx_col] =
                        usize::max(l_width_by_col[n_idx_col], value.as_str().chars().count());
                    write_text_cell(worksheet, n_row_local, n_idx_col, value, &fmt_text)?;
                }
            }

            let mut l_width_final = Vec::with_capacity(n_width_slice);
            for (n_idx_col, n_width_recorded) in l_width_by_col.iter().enumerate() {
                let n_width_final = calculate_column_width(*n_width_recorded, &policy_autofit);
                worksheet
                    .set_column_width(cast_col_num(n_idx_col)?, n_width_final as f64)
                    .map_err(derive_xlsx_error_text)?;
                worksheet
                    .set_column_format(cast_col_num(n_idx_col)?, &fmt_text)
                    .map_err(derive_xlsx_error_text)?;
                l_width_final.push(n_width_final);
            }

            debug!(
                sheet = %sheet_name_unique,
                rows = l_rows_slice.len(),
                columns = n_width_slice,
                "wrote output sheet"
            );
            sheet_slice.sheet_name = sheet_name_unique;
            report.sheets.push(sheet_slice);
            report.widths.push(l_width_final);
        }

        for c_warning in &report.warnings {
            warn!(sheet = %sheet_name, "{c_warning}");
        }
        self.l_reports.push(report);
        Ok(())
    }

    fn derive_unique_sheet_name(&mut self, name: &str) -> String {
        if !self.set_sheet_names_existing.contains(name) {
            self.set_sheet_names_existing.insert(name.to_string());
            return name.to_string();
        }

        let base_name: String = name
            .chars()
            .take(usize::max(1, N_LEN_EXCEL_SHEET_NAME_MAX - 3))
            .collect();

        let mut n_idx = 2usize;
        loop {
            let candidate: String = format!("{base_name}__{n_idx}")
                .chars()
                .take(N_LEN_EXCEL_SHEET_NAME_MAX)
                .collect();
            if !self.set_sheet_names_existing.contains(&candidate) {
                self.set_sheet_names_existing.insert(candidate.clone());
                return candidate;
            }
            n_idx += 1;
        }
    }
}

/// Serialize one table to a single-sheet XLSX buffer.
pub fn write_reformatted_spreadsheet(
    table: &SpecOutputTable,
    sheet_name: &str,
    write_options: &SpecXlsxWriteOptions,
) -> Result<(Vec<u8>, SpecXlsxReport), String> {
    let mut writer = XlsxWriter::new(write_options.clone());
    writer.write_sheet(table, sheet_name)?;
    let v_bytes = writer.save_to_buffer()?;
    let report = writer.l_reports.pop().unwrap_or_default();
    Ok((v_bytes, report))
}

fn write_text_cell(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: &Format,
) -> Result<(), String> {
    match value {
        EnumCellValue::None => {
            worksheet
                .write_blank(cast_row_num(row_idx)?, cast_col_num(col_idx)?, format)
                .map_err(derive_xlsx_error_text)?;
        }
        EnumCellValue::String(val) => {
            worksheet
                .write_string_with_format(
                    cast_row_num(row_idx)?,
                    cast_col_num(col_idx)?,
                    val,
                    format,
                )
                .map_err(derive_xlsx_error_text)?;
        }
    }
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }

    format
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    match align.trim().to_ascii_lowercase().as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

fn cast_row_num(value: usize) -> Result<u32, String> {
    u32::try_from(value).map_err(|_| format!("row index overflow: {value}"))
}

fn cast_col_num(value: usize) -> Result<u16, String> {
    u16::try_from(value).map_err(|_| format!("column index overflow: {value}"))
}

fn derive_xlsx_error_text(err: XlsxError) -> String {
    format!("xlsx write error: {err}")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn table(rows: &[&[&str]]) -> SpecOutputTable {
        SpecOutputTable {
            rows: rows
                .iter()
                .map(|row| row.iter().map(|val| EnumCellValue::from(*val)).collect())
                .collect(),
            width: rows.first().map_or(0, |row| row.len()),
        }
    }

    #[test]
    fn test_write_reformatted_spreadsheet_widths() {
        let c_long = "x".repeat(60);
        let c_cjk = "产".repeat(20);
        let table = table(&[
            &["12345", "产品名称", "", c_cjk.as_str()],
            &["1", c_long.as_str(), "", "x"],
        ]);
        let (v_bytes, report) =
            write_reformatted_spreadsheet(&table, "out", &SpecXlsxWriteOptions::default())
                .expect("write");

        assert!(v_bytes.starts_with(b"PK"));
        assert_eq!(report.sheets.len(), 1);
        assert_eq!(report.sheets[0].sheet_name, "out");
        assert_eq!(report.widths, vec![vec![10, 40, 10, 22]]);
    }

    #[test]
    fn test_column_width_counts_characters_not_bytes() {
        let c_cjk = "产".repeat(20);
        let (_, report) = write_reformatted_spreadsheet(
            &table(&[&[c_cjk.as_str()]]),
            "out",
            &SpecXlsxWriteOptions::default(),
        )
        .expect("write");
        assert_eq!(report.widths, vec![vec![22]]);
    }

    #[test]
    fn test_write_sheet_names_are_unique_and_sanitized() {
        let mut writer = XlsxWriter::new(SpecXlsxWriteOptions::default());
        let table = table(&[&["a"]]);
        writer.write_sheet(&table, "a/b").expect("first");
        writer.write_sheet(&table, "a:b").expect("second");

        let l_names: Vec<&str> = writer
            .reports()
            .iter()
            .map(|report| report.sheets[0].sheet_name.as_str())
            .collect();
        assert_eq!(l_names, vec!["a_b", "a_b__2"]);
        assert!(writer.save_to_buffer().expect("bytes").starts_with(b"PK"));
    }

    #[test]
    fn test_write_sheet_rejects_invalid_autofit_policy() {
        let mut options = SpecXlsxWriteOptions::default();
        options.policy_autofit.width_cell_max = 5;
        let mut writer = XlsxWriter::new(options);
        assert!(writer.write_sheet(&table(&[&["a"]]), "out").is_err());
        assert!(writer.reports().is_empty());
    }
}
