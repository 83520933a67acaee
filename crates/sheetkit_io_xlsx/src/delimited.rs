//! Delimited text encoder for output tables.

use csv::{Terminator, WriterBuilder};
use sheetkit_table::{EnumCellValue, SpecOutputTable};

use crate::conf::V_UTF8_BOM;
use crate::spec::{EnumLineTerminator, SpecDelimitedTextOptions};

/// Encode `table` as delimited text without a header row.
///
/// Empty cells become empty fields; fields are quoted only when needed.
pub fn write_delimited_text(
    table: &SpecOutputTable,
    options: &SpecDelimitedTextOptions,
) -> Result<Vec<u8>, String> {
    let mut v_buf = Vec::new();
    if options.if_write_bom {
        v_buf.extend_from_slice(V_UTF8_BOM);
    }

    let terminator = match options.terminator {
        EnumLineTerminator::Lf => Terminator::Any(b'\n'),
        EnumLineTerminator::Crlf => Terminator::CRLF,
    };
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .delimiter(options.delimiter)
        .terminator(terminator)
        .from_writer(v_buf);

    for (n_row, row) in table.rows.iter().enumerate() {
        writer
            .write_record(row.iter().map(EnumCellValue::as_str))
            .map_err(|err| format!("Failed to encode row {n_row}: {err}"))?;
    }

    writer
        .into_inner()
        .map_err(|err| format!("Failed to flush delimited text: {err}"))
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
    fn test_write_delimited_text_defaults() {
        let table = table(&[&["P1", "", "Q1"], &["产品", "a,b", "00123"]]);
        let v_bytes = write_delimited_text(&table, &SpecDelimitedTextOptions::default())
            .expect("encode");

        assert!(v_bytes.starts_with(V_UTF8_BOM));
        let c_text = String::from_utf8(v_bytes[V_UTF8_BOM.len()..].to_vec()).expect("utf8");
        assert_eq!(c_text, "P1,,Q1\n产品,\"a,b\",00123\n");
    }

    #[test]
    fn test_write_delimited_text_options() {
        let table = table(&[&["a", "b"]]);
        let options = SpecDelimitedTextOptions {
            delimiter: b';',
            if_write_bom: false,
            terminator: EnumLineTerminator::Crlf,
        };
        let v_bytes = write_delimited_text(&table, &options).expect("encode");
        assert_eq!(v_bytes, b"a;b\r\n".to_vec());
    }

    #[test]
    fn test_write_delimited_text_empty_table() {
        let v_bytes =
            write_delimited_text(&SpecOutputTable::default(), &SpecDelimitedTextOptions::default())
                .expect("encode");
        assert_eq!(v_bytes, V_UTF8_BOM.to_vec());
    }
}
