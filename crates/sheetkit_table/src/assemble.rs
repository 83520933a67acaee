//! Positional assembly of extracted columns into one output table.

use std::collections::BTreeSet;

use tracing::warn;

use crate::spec::{
    EnumRowAlignMode, PipelineError, SpecAssembleOptions, SpecColumnRef, SpecOutputTable,
    SpecSourceTable,
};
use crate::util::{apply_value_cleaner, normalize_placeholder};

/// Build the output table from `refs`, in `refs` order.
///
/// Rows are aligned by index only. With [`EnumRowAlignMode::Shortest`] the
/// output has as many rows as the shortest referenced source; with
/// [`EnumRowAlignMode::Strict`] differing row counts are an error. Each cell
/// goes through placeholder normalization, then its column cleaner.
pub fn assemble_output_table(
    sources: &[SpecSourceTable],
    refs: &[SpecColumnRef],
    options: &SpecAssembleOptions,
) -> Result<SpecOutputTable, PipelineError> {
    if refs.is_empty() {
        return Err(PipelineError::EmptyAssembly);
    }

    let mut l_src_idx_by_ref = Vec::with_capacity(refs.len());
    for (n_idx_ref, spec_ref) in refs.iter().enumerate() {
        let Some(n_src_idx) = sources
            .iter()
            .position(|table| table.name == spec_ref.source_name)
        else {
            return Err(PipelineError::InvalidReference {
                index: n_idx_ref,
                reference: spec_ref.to_string(),
                reason: "no source table with this name".to_string(),
            });
        };
        let n_width_src = sources[n_src_idx].width();
        if spec_ref.column >= n_width_src {
            return Err(PipelineError::InvalidReference {
                index: n_idx_ref,
                reference: spec_ref.to_string(),
                reason: format!(
                    "column {} out of range; source has {n_width_src} extracted column(s)",
                    spec_ref.column
                ),
            });
        }
        l_src_idx_by_ref.push(n_src_idx);
    }

    if let Some(n_col_out) = options.cleaners.keys().find(|idx| **idx >= refs.len()) {
        return Err(PipelineError::InvalidReference {
            index: *n_col_out,
            reference: format!("output[{n_col_out}]"),
            reason: format!(
                "cleaner attached to a missing output column; output has {} column(s)",
                refs.len()
            ),
        });
    }

    let set_src_idx_used: BTreeSet<usize> = l_src_idx_by_ref.iter().copied().collect();
    let n_rows_min = set_src_idx_used
        .iter()
        .map(|idx| sources[*idx].height())
        .min()
        .unwrap_or(0);
    let n_rows_max = set_src_idx_used
        .iter()
        .map(|idx| sources[*idx].height())
        .max()
        .unwrap_or(0);

    if n_rows_min != n_rows_max {
        let c_counts = set_src_idx_used
            .iter()
            .map(|idx| format!("{}={}", sources[*idx].name, sources[*idx].height()))
            .collect::<Vec<_>>()
            .join(", ");
        match options.align_mode {
            EnumRowAlignMode::Strict => {
                return Err(PipelineError::RowCountMismatch { counts: c_counts });
            }
            EnumRowAlignMode::Shortest => {
                warn!(
                    counts = %c_counts,
                    rows_kept = n_rows_min,
                    "row counts differ; truncating to the shortest source"
                );
            }
        }
    }

    let mut rows = Vec::with_capacity(n_rows_min);
    for n_row in 0..n_rows_min {
        let mut l_row = Vec::with_capacity(refs.len());
        for (n_col_out, (spec_ref, n_src_idx)) in refs.iter().zip(&l_src_idx_by_ref).enumerate() {
            let mut value = sources[*n_src_idx].rows[n_row][spec_ref.column].clone();
            if let Some(c_placeholder) = &options.placeholder {
                value = normalize_placeholder(value, c_placeholder);
            }
            if let Some(cleaner) = options.cleaners.get(&n_col_out) {
                value = apply_value_cleaner(cleaner, value);
            }
            l_row.push(value);
        }
        rows.push(l_row);
    }

    Ok(SpecOutputTable {
        rows,
        width: refs.len(),
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::spec::{EnumCellValue, EnumValueCleaner, SpecColumnSelect};

    fn source(name: &str, n_cols: usize, rows: &[&[&str]]) -> SpecSourceTable {
        let rows: Vec<Vec<EnumCellValue>> = rows
            .iter()
            .map(|row| row.iter().map(|val| EnumCellValue::from(*val)).collect())
            .collect();
        SpecSourceTable {
            name: name.to_string(),
            sheet_name: format!("sheet_{name}"),
            columns: (0..n_cols)
                .map(|_| SpecColumnSelect::pass_through("A"))
                .collect(),
            rows_raw: rows.clone(),
            rows,
        }
    }

    #[test]
    fn test_assemble_follows_reference_order() {
        let l_sources = vec![
            source("a", 2, &[&["a0", "b0"], &["a1", "b1"]]),
            source("b", 1, &[&["q0"], &["q1"]]),
        ];
        let l_refs = vec![
            SpecColumnRef::new("b", 0),
            SpecColumnRef::new("a", 1),
            SpecColumnRef::new("a", 0),
            SpecColumnRef::new("a", 1),
        ];

        let table = assemble_output_table(&l_sources, &l_refs, &SpecAssembleOptions::default())
            .expect("assemble");
        assert_eq!(table.width(), 4);
        assert_eq!(
            table.to_string_grid(),
            vec![vec!["q0", "b0", "a0", "b0"], vec!["q1", "b1", "a1", "b1"]]
        );
    }

    #[test]
    fn test_assemble_shortest_source_wins() {
        let l_sources = vec![
            source("a", 1, &[&["a0"], &["a1"], &["a2"], &["a3"], &["a4"]]),
            source("b", 1, &[&["b0"], &["b1"], &["b2"]]),
        ];
        let l_refs = vec![SpecColumnRef::new("a", 0), SpecColumnRef::new("b", 0)];

        let table = assemble_output_table(&l_sources, &l_refs, &SpecAssembleOptions::default())
            .expect("assemble");
        assert_eq!(table.height(), 3);
        for (n_row, row) in table.to_string_grid().iter().enumerate() {
            assert_eq!(row, &vec![format!("a{n_row}"), format!("b{n_row}")]);
        }
    }

    #[test]
    fn test_assemble_ignores_unreferenced_source_lengths() {
        let l_sources = vec![
            source("a", 1, &[&["a0"], &["a1"]]),
            source("unused", 1, &[&["u0"]]),
        ];
        let options = SpecAssembleOptions {
            align_mode: EnumRowAlignMode::Strict,
            ..SpecAssembleOptions::default()
        };

        let table = assemble_output_table(&l_sources, &[SpecColumnRef::new("a", 0)], &options)
            .expect("assemble");
        assert_eq!(table.height(), 2);
    }

    #[test]
    fn test_assemble_strict_mode_rejects_length_mismatch() {
        let l_sources = vec![
            source("a", 1, &[&["a0"], &["a1"]]),
            source("b", 1, &[&["b0"]]),
        ];
        let options = SpecAssembleOptions {
            align_mode: EnumRowAlignMode::Strict,
            ..SpecAssembleOptions::default()
        };

        let err = assemble_output_table(
            &l_sources,
            &[SpecColumnRef::new("a", 0), SpecColumnRef::new("b", 0)],
            &options,
        )
        .expect_err("mismatch");
        assert_eq!(
            err,
            PipelineError::RowCountMismatch {
                counts: "a=2, b=1".to_string()
            }
        );
    }

    #[test]
    fn test_assemble_normalizes_placeholder_but_not_lookalikes() {
        let l_sources = vec![source(
            "a",
            2,
            &[&["nan", "x"], &["", "nan"], &["NaN", "nan value"]],
        )];
        let l_refs = vec![SpecColumnRef::new("a", 0), SpecColumnRef::new("a", 1)];

        let table = assemble_output_table(&l_sources, &l_refs, &SpecAssembleOptions::default())
            .expect("assemble");
        assert_eq!(table.rows[0][0], EnumCellValue::None);
        assert_eq!(table.rows[1][0], EnumCellValue::None);
        assert_eq!(table.rows[1][1], EnumCellValue::None);
        assert_eq!(
            table.to_string_grid(),
            vec![vec!["", "x"], vec!["", ""], vec!["NaN", "nan value"]]
        );
    }

    #[test]
    fn test_assemble_placeholder_can_be_disabled() {
        let l_sources = vec![source("a", 1, &[&["nan"]])];
        let options = SpecAssembleOptions {
            placeholder: None,
            ..SpecAssembleOptions::default()
        };

        let table = assemble_output_table(&l_sources, &[SpecColumnRef::new("a", 0)], &options)
            .expect("assemble");
        assert_eq!(table.rows[0][0], EnumCellValue::from("nan"));
    }

    #[test]
    fn test_assemble_applies_cleaners_by_output_index() {
        let l_sources = vec![source("a", 1, &[&["12345.0"], &["12345.67"], &["ABC123"]])];
        let mut options = SpecAssembleOptions::default();
        options.cleaners.insert(1, EnumValueCleaner::Identifier);

        let table = assemble_output_table(
            &l_sources,
            &[SpecColumnRef::new("a", 0), SpecColumnRef::new("a", 0)],
            &options,
        )
        .expect("assemble");
        assert_eq!(
            table.to_string_grid(),
            vec![
                vec!["12345.0", "12345"],
                vec!["12345.67", "12345"],
                vec!["ABC123", "ABC123"]
            ]
        );
    }

    #[test]
    fn test_assemble_rejects_bad_references() {
        let l_sources = vec![source("a", 2, &[&["x", "y"]])];
        let options = SpecAssembleOptions::default();

        assert_eq!(
            assemble_output_table(&l_sources, &[], &options),
            Err(PipelineError::EmptyAssembly)
        );

        let err = assemble_output_table(
            &l_sources,
            &[SpecColumnRef::new("a", 0), SpecColumnRef::new("a", 2)],
            &options,
        )
        .expect_err("out of range");
        assert!(matches!(
            &err,
            PipelineError::InvalidReference { index: 1, reference, .. } if reference == "a[2]"
        ));

        let err = assemble_output_table(&l_sources, &[SpecColumnRef::new("zz", 0)], &options)
            .expect_err("unknown source");
        assert!(matches!(err, PipelineError::InvalidReference { index: 0, .. }));

        let mut options_bad_cleaner = SpecAssembleOptions::default();
        options_bad_cleaner.cleaners.insert(3, EnumValueCleaner::Trim);
        let refs_single = [SpecColumnRef::new("a", 0)];
        assert!(matches!(
            assemble_output_table(&l_sources, &refs_single, &options_bad_cleaner),
            Err(PipelineError::InvalidReference { index: 3, .. })
        ));
    }
}
