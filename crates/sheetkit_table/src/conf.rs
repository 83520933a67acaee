//! Pipeline constants and default presets.

/// Text left behind when a missing value is forced through text coercion.
pub const C_PLACEHOLDER_DEFAULT: &str = "nan";
/// Number of output rows shown before the table is serialized.
pub const N_PREVIEW_ROWS_DEFAULT: usize = 15;
/// Excel worksheet maximum column count (`XFD`).
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
