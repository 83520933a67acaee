//! `sheetkit_io_xlsx` v1:
//! Workbook reading and output encoding for `sheetkit_table`.
//!
//! Module layout:
//! - `conf`      : Excel limits, widths and default presets
//! - `spec`      : output formats, cell formats, policies and reports
//! - `util`      : pure helper functions (sheet names, slicing, widths)
//! - `reader`    : `calamine`-backed [`sheetkit_table::WorkbookSource`]
//! - `delimited` : BOM-prefixed delimited text encoder
//! - `writer`    : text-only XLSX writer kernel
//! - `output`    : format dispatch
pub mod conf;
pub mod delimited;
pub mod output;
pub mod reader;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{
    C_NUM_FORMAT_TEXT, N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX,
    N_WIDTH_CELL_MAX, N_WIDTH_CELL_MIN, N_WIDTH_CELL_PADDING, TUP_EXCEL_ILLEGAL, V_UTF8_BOM,
};
pub use delimited::write_delimited_text;
pub use output::{SpecEncodedOutput, SpecOutputOptions, encode_output_table};
pub use reader::{CalamineWorkbook, render_cell};
pub use spec::{
    EnumLineTerminator, EnumOutputFormat, SpecAutofitCellsPolicy, SpecCellFormat,
    SpecDelimitedTextOptions, SpecSheetSlice, SpecXlsxReport, SpecXlsxWriteOptions,
};
pub use util::{
    calculate_column_width, create_sheet_identifier, plan_sheet_slices, sanitize_sheet_name,
};
pub use writer::{XlsxWriter, write_reformatted_spreadsheet};
