//! Workbook reader backed by `calamine` (xlsx, xlsm, xlsb, xls, ods).

use std::fs;
use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader, Sheets, open_workbook_auto_from_rs};
use chrono::Timelike;
use sheetkit_table::{EnumCellValue, PipelineError, SpecRawGrid, WorkbookSource};
use tracing::debug;

/// One opened workbook.
///
/// Merged regions are not expanded: only the anchor cell of a merge carries
/// a value, every covered cell reads as empty.
pub struct CalamineWorkbook {
    sheets: Sheets<Cursor<Vec<u8>>>,
    l_sheet_names: Vec<String>,
}

impl CalamineWorkbook {
    /// Open a workbook from its raw bytes; the format is sniffed.
    pub fn from_bytes(v_bytes: Vec<u8>) -> Result<Self, PipelineError> {
        let sheets = open_workbook_auto_from_rs(Cursor::new(v_bytes)).map_err(|err| {
            PipelineError::WorkbookUnreadable {
                message: err.to_string(),
            }
        })?;
        let l_sheet_names = sheets.sheet_names();
        Ok(Self {
            sheets,
            l_sheet_names,
        })
    }

    /// Read and open the workbook at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let v_bytes = fs::read(path).map_err(|err| PipelineError::WorkbookUnreadable {
            message: format!("{}: {err}", path.display()),
        })?;
        Self::from_bytes(v_bytes)
    }
}

impl WorkbookSource for CalamineWorkbook {
    fn list_sheets(&mut self) -> Vec<String> {
        self.l_sheet_names.clone()
    }

    fn read_grid(
        &mut self,
        sheet_idx: usize,
        column_indices: &[usize],
        force_text: bool,
    ) -> Result<SpecRawGrid, String> {
        let range = self
            .sheets
            .worksheet_range_at(sheet_idx)
            .ok_or_else(|| format!("Sheet index {sheet_idx} out of range."))?
            .map_err(|err| err.to_string())?;

        let mut l_cols_idx = column_indices.to_vec();
        l_cols_idx.sort_unstable();
        l_cols_idx.dedup();

        // Absolute addressing: leading blank rows count as data rows.
        let n_height = range.end().map_or(0, |(n_row_end, _)| n_row_end as usize + 1);
        let mut rows = Vec::with_capacity(n_height);
        for n_row in 0..n_height {
            let n_row_abs = cast_row_num(n_row)?;
            let mut l_row = Vec::with_capacity(l_cols_idx.len());
            for n_col in &l_cols_idx {
                let value = range
                    .get_value((n_row_abs, cast_col_num(*n_col)?))
                    .map_or(EnumCellValue::None, |data| render_cell(data, force_text));
                l_row.push(value);
            }
            rows.push(l_row);
        }

        debug!(
            sheet = %self.l_sheet_names.get(sheet_idx).map_or("", String::as_str),
            rows = n_height,
            columns = l_cols_idx.len(),
            "read sheet grid"
        );
        Ok(SpecRawGrid {
            column_indices: l_cols_idx,
            rows,
        })
    }
}

/// Render one stored cell to its display text.
///
/// With `force_text`, whole floats print without a fractional part
/// (`12345`, not `12345.0`); otherwise floats keep their decimal form.
pub fn render_cell(data: &Data, force_text: bool) -> EnumCellValue {
    match data {
        Data::Empty => EnumCellValue::None,
        Data::String(val) => EnumCellValue::from_text(val.clone()),
        Data::Int(val) => EnumCellValue::from_text(val.to_string()),
        Data::Float(val) => {
            if force_text {
                EnumCellValue::from_text(val.to_string())
            } else {
                EnumCellValue::from_text(format!("{val:?}"))
            }
        }
        Data::Bool(val) => EnumCellValue::from(if *val { "True" } else { "False" }),
        Data::DateTime(val) => match val.as_datetime() {
            Some(dt) if dt.num_seconds_from_midnight() == 0 => {
                EnumCellValue::from_text(dt.format("%Y-%m-%d").to_string())
            }
            Some(dt) => EnumCellValue::from_text(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => EnumCellValue::from_text(val.as_f64().to_string()),
        },
        Data::DateTimeIso(val) | Data::DurationIso(val) => EnumCellValue::from_text(val.clone()),
        Data::Error(err) => EnumCellValue::from_text(err.to_string()),
    }
}

fn cast_row_num(value: usize) -> Result<u32, String> {
    u32::try_from(value).map_err(|_| format!("row index overflow: {value}"))
}

fn cast_col_num(value: usize) -> Result<u32, String> {
    u32::try_from(value).map_err(|_| format!("column index overflow: {value}"))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_xlsxwriter::{Format, Workbook, XlsxError};
    use sheetkit_table::{
        EnumPipelineStage, SpecColumnRef, SpecColumnSelect, SpecPipelineConfig, SpecSourceSpec,
        run_pipeline,
    };

    use super::*;

    /// Four sheets; sheet 3 carries a vertical merge in column A.
    fn build_scenario_workbook() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let fmt_merge = Format::new();

        workbook.add_worksheet().set_name("Cover")?.write_string(0, 0, "cover")?;
        workbook.add_worksheet().set_name("Notes")?.write_string(0, 0, "notes")?;

        let ws_products = workbook.add_worksheet().set_name("Products")?;
        ws_products.merge_range(0, 0, 1, 0, "P1", &fmt_merge)?;
        ws_products.write_string(2, 0, "P2")?;
        ws_products.write_string(0, 2, "x")?;
        ws_products.write_string(1, 2, "y")?;

        let ws_quotes = workbook.add_worksheet().set_name("Quotes")?;
        ws_quotes.merge_range(0, 1, 2, 1, "Q1", &fmt_merge)?;
        // Pins the used range to three rows regardless of blank merge cells.
        ws_quotes.write_string(2, 3, "end")?;

        workbook.save_to_buffer()
    }

    fn scenario_config(l_cols_third: Vec<SpecColumnSelect>) -> SpecPipelineConfig {
        let n_cols_third = l_cols_third.len();
        let mut l_outputs: Vec<SpecColumnRef> = (0..n_cols_third)
            .map(|idx| SpecColumnRef::new("third", idx))
            .collect();
        l_outputs.push(SpecColumnRef::new("fourth", 0));
        SpecPipelineConfig::new(
            vec![
                SpecSourceSpec::new("third", 3, l_cols_third),
                SpecSourceSpec::new("fourth", 4, vec![SpecColumnSelect::fill_down("B")]),
            ],
            l_outputs,
        )
    }

    #[test]
    fn test_read_grid_exposes_merge_anchor_only() {
        let mut wb = CalamineWorkbook::from_bytes(build_scenario_workbook().expect("xlsx"))
            .expect("open");
        assert_eq!(wb.list_sheets(), vec!["Cover", "Notes", "Products", "Quotes"]);

        let grid = wb.read_grid(2, &[2, 0, 0], true).expect("grid");
        assert_eq!(grid.column_indices, vec![0, 2]);
        let l_text: Vec<Vec<&str>> = grid
            .rows
            .iter()
            .map(|row| row.iter().map(EnumCellValue::as_str).collect())
            .collect();
        assert_eq!(l_text, vec![vec!["P1", "x"], vec!["", "y"], vec!["P2", ""]]);
    }

    #[test]
    fn test_pipeline_over_real_workbook() {
        let v_bytes = build_scenario_workbook().expect("xlsx");
        let mut wb = CalamineWorkbook::from_bytes(v_bytes).expect("open");

        let report = run_pipeline(
            &mut wb,
            &scenario_config(vec![
                SpecColumnSelect::fill_down("A"),
                SpecColumnSelect::fill_down("C"),
            ]),
        )
        .expect("pipeline");
        assert_eq!(
            report.output.to_string_grid(),
            vec![
                vec!["P1", "x", "Q1"],
                vec!["P1", "y", "Q1"],
                vec!["P2", "y", "Q1"],
            ]
        );
    }

    #[test]
    fn test_pipeline_keeps_requested_column_order() {
        let v_bytes = build_scenario_workbook().expect("xlsx");
        let mut wb = CalamineWorkbook::from_bytes(v_bytes).expect("open");

        let report = run_pipeline(
            &mut wb,
            &scenario_config(vec![
                SpecColumnSelect::fill_down("C"),
                SpecColumnSelect::fill_down("A"),
            ]),
        )
        .expect("pipeline");
        assert_eq!(
            report.output.to_string_grid(),
            vec![
                vec!["x", "P1", "Q1"],
                vec!["y", "P1", "Q1"],
                vec!["y", "P2", "Q1"],
            ]
        );
    }

    #[test]
    fn test_force_text_rendering() {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.write_number(0, 0, 12345.0).expect("num");
        worksheet.write_number(1, 0, 0.5).expect("num");
        worksheet.write_string(2, 0, "00123").expect("str");
        worksheet.write_boolean(3, 0, true).expect("bool");
        let v_bytes = workbook.save_to_buffer().expect("xlsx");

        let mut wb = CalamineWorkbook::from_bytes(v_bytes).expect("open");
        let grid_text = wb.read_grid(0, &[0], true).expect("grid");
        let l_text: Vec<&str> = grid_text.rows.iter().map(|row| row[0].as_str()).collect();
        assert_eq!(l_text, vec!["12345", "0.5", "00123", "True"]);

        let grid_typed = wb.read_grid(0, &[0], false).expect("grid");
        assert_eq!(grid_typed.rows[0][0].as_str(), "12345.0");
    }

    #[test]
    fn test_unreadable_and_short_workbooks() {
        assert!(matches!(
            CalamineWorkbook::from_bytes(b"not a workbook".to_vec()),
            Err(PipelineError::WorkbookUnreadable { .. })
        ));

        let mut workbook = Workbook::new();
        workbook.add_worksheet();
        workbook.add_worksheet();
        let mut wb =
            CalamineWorkbook::from_bytes(workbook.save_to_buffer().expect("xlsx")).expect("open");
        let err = run_pipeline(
            &mut wb,
            &scenario_config(vec![SpecColumnSelect::fill_down("A")]),
        )
        .expect_err("two sheets only");
        assert_eq!(err.stage(), EnumPipelineStage::Resolve);
        assert_eq!(
            err.to_string(),
            "Workbook has 2 sheet(s) but sheet #4 is required"
        );
    }

    #[test]
    fn test_from_path_reports_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = CalamineWorkbook::from_path(dir.path().join("missing.xlsx"))
            .err()
            .expect("missing");
        assert_eq!(err.stage(), EnumPipelineStage::Resolve);
    }
}
