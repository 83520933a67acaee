//! `sheetkit_table` v1:
//! Merged-cell reconstruction and multi-source column assembly.
//!
//! Module layout:
//! - `conf`     : constants and default presets
//! - `spec`     : cell/table models, options and errors
//! - `util`     : pure helper functions (letters, fill-down, cleaners)
//! - `extract`  : column extractor over a [`WorkbookSource`]
//! - `assemble` : positional table assembler
//! - `pipeline` : resolve -> extract -> assemble orchestration
pub mod assemble;
pub mod conf;
pub mod extract;
pub mod pipeline;
pub mod spec;
pub mod util;

pub use assemble::assemble_output_table;
pub use conf::{C_PLACEHOLDER_DEFAULT, N_NCOLS_EXCEL_MAX, N_PREVIEW_ROWS_DEFAULT};
pub use extract::{WorkbookSource, extract_source_table};
pub use pipeline::run_pipeline;
pub use spec::{
    EnumCellValue, EnumPipelineStage, EnumReconstructionPolicy, EnumRowAlignMode,
    EnumValueCleaner, PipelineError, SpecAssembleOptions, SpecColumnRef, SpecColumnSelect,
    SpecOutputTable, SpecPipelineConfig, SpecPipelineReport, SpecRawGrid, SpecSourceSpec,
    SpecSourceTable,
};
pub use util::{
    apply_fill_down, apply_value_cleaner, clean_identifier, format_column_letter,
    normalize_placeholder, parse_column_letter, resolve_sheet_index,
};
