//! Output encoding models, policies and reports.

use std::str::FromStr;

use crate::conf::{
    N_DELIMITER_DEFAULT, N_WIDTH_CELL_MAX, N_WIDTH_CELL_MIN, N_WIDTH_CELL_PADDING,
    derive_default_text_format,
};

////////////////////////////////////////////////////////////////////////////////
// #region OutputFormat

/// Serialization target for the output table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumOutputFormat {
    /// Comma-separated text with a UTF-8 BOM, no header row.
    #[default]
    DelimitedText,
    /// XLSX with every column forced to text, no header row.
    ReformattedSpreadsheet,
}

impl EnumOutputFormat {
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::DelimitedText => "csv",
            Self::ReformattedSpreadsheet => "xlsx",
        }
    }
}

impl FromStr for EnumOutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" | "delimited-text" | "delimited_text" => Ok(Self::DelimitedText),
            "xlsx" | "reformatted-spreadsheet" | "reformatted_spreadsheet" => {
                Ok(Self::ReformattedSpreadsheet)
            }
            _ => Err(format!(
                "Unknown output format {s:?} (expected 'csv' or 'xlsx')."
            )),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DelimitedText

/// Record terminator for delimited text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumLineTerminator {
    #[default]
    Lf,
    Crlf,
}

/// Delimited text options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecDelimitedTextOptions {
    /// Field delimiter byte.
    pub delimiter: u8,
    /// Prefix output with a UTF-8 BOM.
    pub if_write_bom: bool,
    /// Record terminator.
    pub terminator: EnumLineTerminator,
}

impl Default for SpecDelimitedTextOptions {
    fn default() -> Self {
        Self {
            delimiter: N_DELIMITER_DEFAULT,
            if_write_bom: true,
            terminator: EnumLineTerminator::Lf,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellFormat

/// Cell format applied to output columns; `None` keeps the Excel default.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,

    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,

    /// Number format code.
    pub num_format: Option<String>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WriteOptions

/// Autofit policy: `clamp(longest cell in characters + padding, min, max)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecAutofitCellsPolicy {
    /// Minimum final width.
    pub width_cell_min: usize,
    /// Maximum final width.
    pub width_cell_max: usize,
    /// Width padding added after inference.
    pub width_cell_padding: usize,
}

impl Default for SpecAutofitCellsPolicy {
    fn default() -> Self {
        Self {
            width_cell_min: N_WIDTH_CELL_MIN,
            width_cell_max: N_WIDTH_CELL_MAX,
            width_cell_padding: N_WIDTH_CELL_PADDING,
        }
    }
}

/// Writer-wide options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecXlsxWriteOptions {
    /// Format applied to every column; carries the text number format.
    pub fmt_text: SpecCellFormat,
    /// Column width policy.
    pub policy_autofit: SpecAutofitCellsPolicy,
}

impl Default for SpecXlsxWriteOptions {
    fn default() -> Self {
        Self {
            fmt_text: derive_default_text_format(),
            policy_autofit: SpecAutofitCellsPolicy::default(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Report

/// Concrete sheet part emitted to workbook (after Excel-limit slicing).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetSlice {
    /// Actual unique sheet name in workbook.
    pub sheet_name: String,
    /// Inclusive source row start.
    pub row_start_inclusive: usize,
    /// Exclusive source row end.
    pub row_end_exclusive: usize,
    /// Inclusive source column start.
    pub col_start_inclusive: usize,
    /// Exclusive source column end.
    pub col_end_exclusive: usize,
}

/// Per-write call report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxReport {
    /// Sheet slices produced by the write call.
    pub sheets: Vec<SpecSheetSlice>,
    /// Column widths written, per slice, in slice order.
    pub widths: Vec<Vec<usize>>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecXlsxReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse_and_extension() {
        assert_eq!("CSV".parse(), Ok(EnumOutputFormat::DelimitedText));
        assert_eq!(
            "reformatted-spreadsheet".parse(),
            Ok(EnumOutputFormat::ReformattedSpreadsheet)
        );
        assert!("ods".parse::<EnumOutputFormat>().is_err());
        assert_eq!(EnumOutputFormat::ReformattedSpreadsheet.extension(), "xlsx");
    }

    #[test]
    fn test_default_write_options_force_text_columns() {
        let options = SpecXlsxWriteOptions::default();
        assert_eq!(options.fmt_text.num_format.as_deref(), Some("@"));
        assert_eq!(options.policy_autofit.width_cell_min, 10);
        assert_eq!(options.policy_autofit.width_cell_max, 40);
        assert_eq!(options.policy_autofit.width_cell_padding, 2);
    }
}
