//! Stateless helpers shared by the extractor and the assembler.

use std::sync::LazyLock;

use regex::Regex;

use crate::conf::N_NCOLS_EXCEL_MAX;
use crate::spec::{EnumCellValue, EnumValueCleaner, PipelineError};

static RE_DECIMAL_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+\.[0-9]+$").expect("identifier pattern is a valid regex")
});

////////////////////////////////////////////////////////////////////////////////
// #region ColumnLetters

/// Convert a spreadsheet column letter (`"A"`, `"AE"`) to a 0-based index.
pub fn parse_column_letter(position: &str) -> Result<usize, PipelineError> {
    let c_position = position.trim();
    if c_position.is_empty() || !c_position.chars().all(|chr| chr.is_ascii_alphabetic()) {
        return Err(PipelineError::InvalidColumnLetter {
            position: position.to_string(),
        });
    }

    let mut n_col = 0usize;
    for chr in c_position.chars() {
        let n_digit = (chr.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        n_col = n_col * 26 + n_digit;
        if n_col > N_NCOLS_EXCEL_MAX {
            return Err(PipelineError::InvalidColumnLetter {
                position: position.to_string(),
            });
        }
    }
    Ok(n_col - 1)
}

/// Convert a 0-based column index to its spreadsheet letter.
pub fn format_column_letter(col_idx: usize) -> String {
    let mut n_col = col_idx + 1;
    let mut l_chars = Vec::new();
    while n_col > 0 {
        n_col -= 1;
        l_chars.push((b'A' + (n_col % 26) as u8) as char);
        n_col /= 26;
    }
    l_chars.iter().rev().collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Reconstruction

/// Replace blanks with the nearest non-blank value above, in place.
///
/// Leading blanks stay blank.
pub fn apply_fill_down(column: &mut [EnumCellValue]) {
    let mut c_last: Option<String> = None;
    for cell in column.iter_mut() {
        match cell {
            EnumCellValue::String(val) => c_last = Some(val.clone()),
            EnumCellValue::None => {
                if let Some(val) = &c_last {
                    *cell = EnumCellValue::String(val.clone());
                }
            }
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ValueCleaning

/// Map the coercion placeholder (exact, case-sensitive) back to missing.
pub fn normalize_placeholder(value: EnumCellValue, placeholder: &str) -> EnumCellValue {
    match value {
        EnumCellValue::String(val) if val == placeholder => EnumCellValue::None,
        other => other,
    }
}

/// Repair an identifier that text coercion rendered as a float.
///
/// `"12345.0"` and `"12345.67"` both become `"12345"`: the fractional part is
/// truncated, not rounded. Truncation works on the text itself, so identifiers
/// longer than an `f64` mantissa keep every digit and leading zeros survive.
/// Text that does not look like `digits.digits` is returned unchanged.
pub fn clean_identifier(text: &str) -> String {
    let c_trimmed = text.trim();
    match c_trimmed.split_once('.') {
        Some((c_integer, _)) if RE_DECIMAL_IDENTIFIER.is_match(c_trimmed) => c_integer.to_string(),
        _ => text.to_string(),
    }
}

/// Apply one cleaner to a cell. Missing stays missing; empty results become missing.
pub fn apply_value_cleaner(cleaner: &EnumValueCleaner, value: EnumCellValue) -> EnumCellValue {
    let EnumCellValue::String(val) = value else {
        return EnumCellValue::None;
    };
    let c_cleaned = match cleaner {
        EnumValueCleaner::Identifier => clean_identifier(&val),
        EnumValueCleaner::Trim => val.trim().to_string(),
    };
    EnumCellValue::from_text(c_cleaned)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetResolution

/// Resolve a 1-based sheet position to a 0-based index.
///
/// Never substitutes another sheet: too few sheets is
/// [`PipelineError::InsufficientSheets`].
pub fn resolve_sheet_index(
    sheet_names: &[String],
    sheet_position: usize,
) -> Result<usize, PipelineError> {
    if sheet_position == 0 {
        return Err(PipelineError::InvalidConfig(
            "Sheet positions are 1-based; got 0.".to_string(),
        ));
    }
    if sheet_names.len() < sheet_position {
        return Err(PipelineError::InsufficientSheets {
            required: sheet_position,
            found: sheet_names.len(),
        });
    }
    Ok(sheet_position - 1)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
