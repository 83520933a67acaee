//! TOML run configuration.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use sheetkit_io_xlsx::{EnumLineTerminator, EnumOutputFormat, SpecDelimitedTextOptions};
use sheetkit_table::{
    C_PLACEHOLDER_DEFAULT, EnumReconstructionPolicy, EnumRowAlignMode, EnumValueCleaner,
    N_PREVIEW_ROWS_DEFAULT, SpecAssembleOptions, SpecColumnRef, SpecColumnSelect,
    SpecPipelineConfig, SpecSourceSpec,
};

/// Configuration printed by `sheetkit init-config`.
///
/// Columns A and C of the third sheet, both filled down across merges.
pub const C_EXAMPLE_CONFIG: &str = r#"# Decode every cell as text so identifiers keep their exact digits.
force-text = true

[output]
format = "csv"         # csv | xlsx
align = "shortest"     # shortest | strict
placeholder = "nan"    # cells equal to this become empty; "" disables
bom = true
delimiter = ","
preview-rows = 15

[[sources]]
name = "products"
sheet = 3              # 1-based position in the workbook
row-start = 0
columns = [
  { column = "A", policy = "fill-down" },
  { column = "C", policy = "fill-down" },
]

[[columns]]
source = "products"
column = 0

[[columns]]
source = "products"
column = 1
"#;

////////////////////////////////////////////////////////////////////////////////
// #region FileModel

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnumFileFormat {
    #[default]
    Csv,
    Xlsx,
}

impl From<EnumFileFormat> for EnumOutputFormat {
    fn from(value: EnumFileFormat) -> Self {
        match value {
            EnumFileFormat::Csv => EnumOutputFormat::DelimitedText,
            EnumFileFormat::Xlsx => EnumOutputFormat::ReformattedSpreadsheet,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnumFileAlign {
    #[default]
    Shortest,
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnumFilePolicy {
    #[default]
    FillDown,
    PassThrough,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnumFileCleaner {
    Identifier,
    Trim,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct SpecFileOutput {
    pub format: EnumFileFormat,
    pub align: EnumFileAlign,
    pub placeholder: String,
    pub bom: bool,
    pub delimiter: char,
    pub crlf: bool,
    pub preview_rows: usize,
}

impl Default for SpecFileOutput {
    fn default() -> Self {
        Self {
            format: EnumFileFormat::Csv,
            align: EnumFileAlign::Shortest,
            placeholder: C_PLACEHOLDER_DEFAULT.to_string(),
            bom: true,
            delimiter: ',',
            crlf: false,
            preview_rows: N_PREVIEW_ROWS_DEFAULT,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SpecFileColumnSelect {
    pub column: String,
    #[serde(default)]
    pub policy: EnumFilePolicy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SpecFileSource {
    pub name: String,
    pub sheet: usize,
    #[serde(default)]
    pub row_start: usize,
    pub columns: Vec<SpecFileColumnSelect>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SpecFileColumnRef {
    pub source: String,
    pub column: usize,
    #[serde(default)]
    pub cleaner: Option<EnumFileCleaner>,
}

/// Whole configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SpecFileConfig {
    #[serde(default = "default_force_text")]
    pub force_text: bool,
    #[serde(default)]
    pub output: SpecFileOutput,
    pub sources: Vec<SpecFileSource>,
    pub columns: Vec<SpecFileColumnRef>,
}

fn default_force_text() -> bool {
    true
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Conversion

impl SpecFileConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse configuration TOML")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Invalid configuration {}", path.display()))
    }

    /// Build the pipeline configuration; `if_strict` forces strict alignment.
    pub fn to_pipeline_config(&self, if_strict: bool) -> SpecPipelineConfig {
        let sources = self
            .sources
            .iter()
            .map(|src| {
                let l_cols = src
                    .columns
                    .iter()
                    .map(|col| {
                        SpecColumnSelect::new(
                            col.column.clone(),
                            match col.policy {
                                EnumFilePolicy::FillDown => EnumReconstructionPolicy::FillDown,
                                EnumFilePolicy::PassThrough => {
                                    EnumReconstructionPolicy::PassThrough
                                }
                            },
                        )
                    })
                    .collect();
                SpecSourceSpec::new(src.name.clone(), src.sheet, l_cols)
                    .with_row_start(src.row_start)
            })
            .collect();

        let outputs = self
            .columns
            .iter()
            .map(|col| SpecColumnRef::new(col.source.clone(), col.column))
            .collect();

        let cleaners: BTreeMap<usize, EnumValueCleaner> = self
            .columns
            .iter()
            .enumerate()
            .filter_map(|(n_idx, col)| {
                col.cleaner.map(|cleaner| {
                    let cleaner = match cleaner {
                        EnumFileCleaner::Identifier => EnumValueCleaner::Identifier,
                        EnumFileCleaner::Trim => EnumValueCleaner::Trim,
                    };
                    (n_idx, cleaner)
                })
            })
            .collect();

        let align_mode = if if_strict || self.output.align == EnumFileAlign::Strict {
            EnumRowAlignMode::Strict
        } else {
            EnumRowAlignMode::Shortest
        };

        let mut config = SpecPipelineConfig::new(sources, outputs);
        config.force_text = self.force_text;
        config.assemble = SpecAssembleOptions {
            placeholder: if self.output.placeholder.is_empty() {
                None
            } else {
                Some(self.output.placeholder.clone())
            },
            align_mode,
            cleaners,
        };
        config
    }

    /// Delimited text options from the `[output]` table.
    pub fn to_delimited_options(&self) -> Result<SpecDelimitedTextOptions> {
        let delimiter = u8::try_from(self.output.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .with_context(|| {
                format!(
                    "Delimiter {:?} must be a single ASCII character",
                    self.output.delimiter
                )
            })?;
        Ok(SpecDelimitedTextOptions {
            delimiter,
            if_write_bom: self.output.bom,
            terminator: if self.output.crlf {
                EnumLineTerminator::Crlf
            } else {
                EnumLineTerminator::Lf
            },
        })
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_example_config_parses() {
        let cfg = SpecFileConfig::from_toml(C_EXAMPLE_CONFIG).expect("parse");
        assert!(cfg.force_text);
        assert_eq!(cfg.output.preview_rows, 15);

        let config = cfg.to_pipeline_config(false);
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].sheet_position, 3);
        assert_eq!(
            config.sources[0].columns,
            vec![
                SpecColumnSelect::fill_down("A"),
                SpecColumnSelect::fill_down("C"),
            ]
        );
        assert_eq!(config.outputs.len(), 2);
        assert_eq!(config.assemble.placeholder.as_deref(), Some("nan"));
        assert_eq!(config.assemble.align_mode, EnumRowAlignMode::Shortest);
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let cfg = SpecFileConfig::from_toml(
            r#"
            [[sources]]
            name = "s"
            sheet = 1
            columns = [{ column = "B", policy = "pass-through" }]

            [[columns]]
            source = "s"
            column = 0
            cleaner = "identifier"
            "#,
        )
        .expect("parse");

        let config = cfg.to_pipeline_config(true);
        assert!(config.force_text);
        assert_eq!(
            config.sources[0].columns[0].policy,
            EnumReconstructionPolicy::PassThrough
        );
        assert_eq!(config.assemble.align_mode, EnumRowAlignMode::Strict);
        assert!(matches!(
            config.assemble.cleaners.get(&0),
            Some(EnumValueCleaner::Identifier)
        ));
        assert_eq!(EnumOutputFormat::from(cfg.output.format), EnumOutputFormat::DelimitedText);
    }

    #[test]
    fn test_config_rejects_unknown_keys_and_bad_delimiters() {
        assert!(SpecFileConfig::from_toml("sources = []\ncolumns = []\nextra = 1").is_err());

        let mut cfg = SpecFileConfig::from_toml("sources = []\ncolumns = []").expect("parse");
        cfg.output.placeholder = String::new();
        assert_eq!(cfg.to_pipeline_config(false).assemble.placeholder, None);

        cfg.output.delimiter = '¦';
        assert!(cfg.to_delimited_options().is_err());
        cfg.output.delimiter = '\t';
        assert_eq!(cfg.to_delimited_options().expect("tab").delimiter, b'\t');
    }
}
