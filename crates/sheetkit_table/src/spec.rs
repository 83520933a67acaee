//! Shared table models, options and pipeline error types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::conf::C_PLACEHOLDER_DEFAULT;

////////////////////////////////////////////////////////////////////////////////
// #region CellValue

/// One cell read from a source grid, always carried as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum EnumCellValue {
    /// Missing/blank value.
    #[default]
    None,
    /// Text value.
    String(String),
}

impl EnumCellValue {
    /// Build a cell from text; the empty string is treated as missing.
    pub fn from_text(text: impl Into<String>) -> Self {
        let c_text = text.into();
        if c_text.is_empty() {
            Self::None
        } else {
            Self::String(c_text)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Text view of the cell; missing renders as `""`.
    pub fn as_str(&self) -> &str {
        match self {
            Self::None => "",
            Self::String(s) => s.as_str(),
        }
    }
}

impl From<&str> for EnumCellValue {
    fn from(value: &str) -> Self {
        Self::from_text(value)
    }
}

impl From<String> for EnumCellValue {
    fn from(value: String) -> Self {
        Self::from_text(value)
    }
}

impl fmt::Display for EnumCellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Policies

/// Per-column reconstruction policy applied by the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumReconstructionPolicy {
    /// Column took part in a vertical merge; blanks inherit the value above.
    #[default]
    FillDown,
    /// Values are kept exactly as read, including blanks.
    PassThrough,
}

impl EnumReconstructionPolicy {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FillDown => "fill-down",
            Self::PassThrough => "pass-through",
        }
    }
}

impl FromStr for EnumReconstructionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fill-down" | "fill_down" | "ffill" => Ok(Self::FillDown),
            "pass-through" | "pass_through" | "keep" => Ok(Self::PassThrough),
            _ => Err(format!(
                "Unknown reconstruction policy {s:?} (expected 'fill-down' or 'pass-through')."
            )),
        }
    }
}

/// Value-cleaning rule attached to one output column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumValueCleaner {
    /// Repair identifiers turned into `"12345.0"` by text coercion.
    Identifier,
    /// Strip surrounding whitespace.
    Trim,
}

impl FromStr for EnumValueCleaner {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "identifier" | "id" => Ok(Self::Identifier),
            "trim" => Ok(Self::Trim),
            _ => Err(format!(
                "Unknown value cleaner {s:?} (expected 'identifier' or 'trim')."
            )),
        }
    }
}

/// Row reconciliation when referenced sources differ in length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumRowAlignMode {
    /// Truncate to the shortest referenced source (default).
    #[default]
    Shortest,
    /// Fail when referenced sources differ in row count.
    Strict,
}

impl FromStr for EnumRowAlignMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shortest" => Ok(Self::Shortest),
            "strict" => Ok(Self::Strict),
            _ => Err(format!(
                "Unknown row alignment {s:?} (expected 'shortest' or 'strict')."
            )),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Source

/// One requested column: spreadsheet letter plus its reconstruction policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecColumnSelect {
    /// Column letter, e.g. `"A"`, `"AE"`.
    pub position: String,
    /// Reconstruction policy.
    pub policy: EnumReconstructionPolicy,
}

impl SpecColumnSelect {
    pub fn new(position: impl Into<String>, policy: EnumReconstructionPolicy) -> Self {
        Self {
            position: position.into(),
            policy,
        }
    }

    pub fn fill_down(position: impl Into<String>) -> Self {
        Self::new(position, EnumReconstructionPolicy::FillDown)
    }

    pub fn pass_through(position: impl Into<String>) -> Self {
        Self::new(position, EnumReconstructionPolicy::PassThrough)
    }
}

/// Where and what to extract for one logical source table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSourceSpec {
    /// Logical name used by column references.
    pub name: String,
    /// 1-based sheet position in the workbook.
    pub sheet_position: usize,
    /// Requested columns, in output order.
    pub columns: Vec<SpecColumnSelect>,
    /// Leading rows to skip before reconstruction (header rows).
    pub row_start: usize,
}

impl SpecSourceSpec {
    pub fn new(
        name: impl Into<String>,
        sheet_position: usize,
        columns: Vec<SpecColumnSelect>,
    ) -> Self {
        Self {
            name: name.into(),
            sheet_position,
            columns,
            row_start: 0,
        }
    }

    pub fn with_row_start(mut self, row_start: usize) -> Self {
        self.row_start = row_start;
        self
    }
}

/// Raw grid handed back by a workbook reader.
///
/// `column_indices` lists the physical 0-based columns in ascending order;
/// every row holds one cell per entry, in that same order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecRawGrid {
    pub column_indices: Vec<usize>,
    pub rows: Vec<Vec<EnumCellValue>>,
}

/// One sheet's extracted, policy-applied column set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSourceTable {
    /// Logical source name.
    pub name: String,
    /// Resolved workbook sheet name.
    pub sheet_name: String,
    /// Columns in request order.
    pub columns: Vec<SpecColumnSelect>,
    /// Rows; each holds exactly `columns.len()` cells.
    pub rows: Vec<Vec<EnumCellValue>>,
    /// Same cells before any reconstruction policy ran.
    pub rows_raw: Vec<Vec<EnumCellValue>>,
}

impl SpecSourceTable {
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Copy out one column top-to-bottom.
    pub fn column(&self, col_idx: usize) -> Option<Vec<EnumCellValue>> {
        if col_idx >= self.width() {
            return None;
        }
        Some(self.rows.iter().map(|row| row[col_idx].clone()).collect())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Assembly

/// Pointer to one extracted column of a named source table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecColumnRef {
    /// Source table name.
    pub source_name: String,
    /// 0-based index into that source's requested columns.
    pub column: usize,
}

impl SpecColumnRef {
    pub fn new(source_name: impl Into<String>, column: usize) -> Self {
        Self {
            source_name: source_name.into(),
            column,
        }
    }
}

impl fmt::Display for SpecColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.source_name, self.column)
    }
}

/// Assembly knobs.
#[derive(Debug, Clone)]
pub struct SpecAssembleOptions {
    /// Placeholder text normalized back to empty; `None` disables.
    pub placeholder: Option<String>,
    /// Row reconciliation mode.
    pub align_mode: EnumRowAlignMode,
    /// Cleaners keyed by 0-based output column index.
    pub cleaners: BTreeMap<usize, EnumValueCleaner>,
}

impl Default for SpecAssembleOptions {
    fn default() -> Self {
        Self {
            placeholder: Some(C_PLACEHOLDER_DEFAULT.to_string()),
            align_mode: EnumRowAlignMode::Shortest,
            cleaners: BTreeMap::new(),
        }
    }
}

/// Final positionally-assembled table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecOutputTable {
    pub rows: Vec<Vec<EnumCellValue>>,
    pub width: usize,
}

impl SpecOutputTable {
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// First `n_rows` rows (fewer when the table is shorter).
    pub fn preview(&self, n_rows: usize) -> &[Vec<EnumCellValue>] {
        &self.rows[..usize::min(n_rows, self.rows.len())]
    }

    pub fn to_string_grid(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.as_str().to_string()).collect())
            .collect()
    }
}

/// Full run configuration.
#[derive(Debug, Clone)]
pub struct SpecPipelineConfig {
    pub sources: Vec<SpecSourceSpec>,
    pub outputs: Vec<SpecColumnRef>,
    pub assemble: SpecAssembleOptions,
    /// Ask the reader to decode every cell as text.
    pub force_text: bool,
}

impl SpecPipelineConfig {
    pub fn new(sources: Vec<SpecSourceSpec>, outputs: Vec<SpecColumnRef>) -> Self {
        Self {
            sources,
            outputs,
            assemble: SpecAssembleOptions::default(),
            force_text: true,
        }
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecPipelineReport {
    pub output: SpecOutputTable,
    /// `(source name, sheet name)` in configuration order.
    pub sheets_resolved: Vec<(String, String)>,
    /// `(source name, extracted row count)` in configuration order.
    pub rows_by_source: Vec<(String, usize)>,
    /// `(source name, rows before reconstruction)` in configuration order.
    pub rows_raw_by_source: Vec<(String, Vec<Vec<EnumCellValue>>)>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecPipelineReport {
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Pipeline stage a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumPipelineStage {
    Configure,
    Resolve,
    Extract,
    Assemble,
}

impl EnumPipelineStage {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Configure => "configure",
            Self::Resolve => "resolve",
            Self::Extract => "extract",
            Self::Assemble => "assemble",
        }
    }
}

impl fmt::Display for EnumPipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any failure that aborts a run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Misconfigured sources/outputs.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Column position is not a spreadsheet column letter.
    #[error("Invalid column letter {position:?}")]
    InvalidColumnLetter { position: String },

    /// Uploaded bytes are not a supported workbook.
    #[error("Workbook unreadable: {message}")]
    WorkbookUnreadable { message: String },

    /// Fewer sheets than a fixed-position source requires.
    #[error("Workbook has {found} sheet(s) but sheet #{required} is required")]
    InsufficientSheets { required: usize, found: usize },

    /// Reader failed to materialize a sheet/column set.
    #[error("Failed to read sheet {sheet:?} (columns {columns}): {message}")]
    SourceRead {
        sheet: String,
        columns: String,
        message: String,
    },

    /// No output columns were requested.
    #[error("Cannot assemble an output table from zero column references")]
    EmptyAssembly,

    /// Reference points at a missing source or column.
    #[error("Invalid column reference #{index} ({reference}): {reason}")]
    InvalidReference {
        index: usize,
        reference: String,
        reason: String,
    },

    /// Strict alignment found sources with different row counts.
    #[error("Row counts differ across sources: {counts}")]
    RowCountMismatch { counts: String },
}

impl PipelineError {
    pub const fn stage(&self) -> EnumPipelineStage {
        match self {
            Self::InvalidConfig(_) | Self::InvalidColumnLetter { .. } => {
                EnumPipelineStage::Configure
            }
            Self::WorkbookUnreadable { .. } | Self::InsufficientSheets { .. } => {
                EnumPipelineStage::Resolve
            }
            Self::SourceRead { .. } => EnumPipelineStage::Extract,
            Self::EmptyAssembly | Self::InvalidReference { .. } | Self::RowCountMismatch { .. } => {
                EnumPipelineStage::Assemble
            }
        }
    }

    /// One-line user-facing message naming the failing stage.
    pub fn describe(&self) -> String {
        format!("{} failed: {self}", self.stage())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
