//! Format dispatch for encoding an output table to bytes.

use sheetkit_table::SpecOutputTable;

use crate::delimited::write_delimited_text;
use crate::spec::{
    EnumOutputFormat, SpecDelimitedTextOptions, SpecXlsxReport, SpecXlsxWriteOptions,
};
use crate::writer::write_reformatted_spreadsheet;

/// Options for [`encode_output_table`].
#[derive(Debug, Clone, Default)]
pub struct SpecOutputOptions {
    pub format: EnumOutputFormat,
    pub delimited: SpecDelimitedTextOptions,
    pub xlsx: SpecXlsxWriteOptions,
}

/// Encoded table plus any writer report.
#[derive(Debug, Clone)]
pub struct SpecEncodedOutput {
    pub bytes: Vec<u8>,
    pub format: EnumOutputFormat,
    /// Present for spreadsheet output only.
    pub report: Option<SpecXlsxReport>,
}

/// Encode `table` in the selected format; `sheet_name` names the xlsx sheet.
pub fn encode_output_table(
    table: &SpecOutputTable,
    sheet_name: &str,
    options: &SpecOutputOptions,
) -> Result<SpecEncodedOutput, String> {
    match options.format {
        EnumOutputFormat::DelimitedText => Ok(SpecEncodedOutput {
            bytes: write_delimited_text(table, &options.delimited)?,
            format: options.format,
            report: None,
        }),
        EnumOutputFormat::ReformattedSpreadsheet => {
            let (bytes, report) = write_reformatted_spreadsheet(table, sheet_name, &options.xlsx)?;
            Ok(SpecEncodedOutput {
                bytes,
                format: options.format,
                report: Some(report),
            })
        }
    }
}
