//! Workbook I/O constants and default preset factories.

use crate::spec::SpecCellFormat;

pub use sheetkit_table::conf::N_NCOLS_EXCEL_MAX;

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// Excel number format that stores a cell as literal text.
pub const C_NUM_FORMAT_TEXT: &str = "@";
/// Smallest column width written by autofit.
pub const N_WIDTH_CELL_MIN: usize = 10;
/// Largest column width written by autofit.
pub const N_WIDTH_CELL_MAX: usize = 40;
/// Width added to the widest cell.
pub const N_WIDTH_CELL_PADDING: usize = 2;

/// UTF-8 byte-order marker so legacy spreadsheet apps detect the encoding.
pub const V_UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
/// Default field delimiter for delimited text output.
pub const N_DELIMITER_DEFAULT: u8 = b',';

/// Build the default text cell format used for every output column.
pub fn derive_default_text_format() -> SpecCellFormat {
    SpecCellFormat {
        font_name: Some("Calibri".to_string()),
        font_size: Some(11),
        align: Some("left".to_string()),
        valign: Some("vcenter".to_string()),
        num_format: Some(C_NUM_FORMAT_TEXT.to_string()),
    }
}
