// src/extractors/candidates.rs
//! Picks the right filer out of the search results listing.
//!
//! The portal merges several registered names into one result row when they
//! belong to the same filer, so a row carries a list of names rather than one.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::config::Vocabulary;
use crate::extractors::names::NameNormalizer;
use crate::extractors::text::{cell_text, text_lines};
use crate::portal::models::{ResultCandidate, SearchCriterion};

/// Result links as the live page exposes them; clicks are addressed by ordinal within this selector.
pub const RESULT_LINK_SELECTOR: &str = "table tbody tr td:first-child a";

/// Present once the results listing has rendered at least one row.
pub const RESULT_READY_SELECTOR: &str = r##"table tbody tr td a[href="#"]"##;

static TABLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("table").expect("Failed to compile TABLE_SELECTOR")
});
static HEADER_CELL_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("th").expect("Failed to compile HEADER_CELL_SELECTOR")
});
static BODY_ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("tbody tr").expect("Failed to compile BODY_ROW_SELECTOR")
});
static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("a").expect("Failed to compile ANCHOR_SELECTOR")
});
static RESULT_LINK: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(RESULT_LINK_SELECTOR).expect("Failed to compile RESULT_LINK")
});

/// One clickable row of the results listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    /// Position among the results table's body rows.
    pub row_index: usize,
    pub names: Vec<String>,
}

impl ResultRow {
    pub fn merged_name_count(&self) -> usize {
        self.names.len().max(1)
    }
}

struct RowLink<'a> {
    row_index: usize,
    cell: ElementRef<'a>,
    anchor: ElementRef<'a>,
}

/// Nearest enclosing `<table>` of an element.
pub(crate) fn owning_table(element: ElementRef) -> Option<ElementRef> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "table")
}

fn results_table<'a>(document: &'a Html, vocabulary: &Vocabulary) -> Option<ElementRef<'a>> {
    document.select(&TABLE_SELECTOR).find(|table| {
        table
            .select(&HEADER_CELL_SELECTOR)
            .any(|th| cell_text(th).contains(vocabulary.results_header.as_str()))
    })
}

fn row_links<'a>(document: &'a Html, vocabulary: &Vocabulary) -> Vec<RowLink<'a>> {
    let Some(table) = results_table(document, vocabulary) else {
        tracing::debug!("No table headed '{}' on the results page", vocabulary.results_header);
        return Vec::new();
    };

    table
        .select(&BODY_ROW_SELECTOR)
        .filter(|row| owning_table(*row).map(|t| t.id()) == Some(table.id()))
        .enumerate()
        .filter_map(|(row_index, row)| {
            let cell = row.children().filter_map(ElementRef::wrap).next()?;
            if cell.value().name() != "td" {
                return None;
            }
            let anchor = cell.select(&ANCHOR_SELECTOR).next()?;
            Some(RowLink { row_index, cell, anchor })
        })
        .collect()
}

/// Drops repeated names, keeping first occurrences in order.
fn distinct(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names.into_iter().filter(|name| seen.insert(name.clone())).collect()
}

/// Reads the results listing into rows of distinct merged names.
pub fn collect_result_rows(document: &Html, vocabulary: &Vocabulary) -> Vec<ResultRow> {
    let rows: Vec<ResultRow> = row_links(document, vocabulary)
        .into_iter()
        .map(|link| ResultRow { row_index: link.row_index, names: distinct(text_lines(link.cell)) })
        .collect();
    tracing::debug!("Results listing has {} clickable rows", rows.len());
    rows
}

/// Chooses the row to open for a search.
///
/// Tax number searches take the row with the fewest merged names. Name
/// searches require an exact or prefix match on the suffix-stripped,
/// uppercased name; exact matches always win, then fewest merged names,
/// then the earliest row. A name search with no match returns `None`
/// rather than guessing.
pub fn select_candidate(
    rows: &[ResultRow],
    criterion: &SearchCriterion,
    normalizer: &NameNormalizer,
) -> Option<ResultCandidate> {
    if criterion.is_tax_id() {
        return rows
            .iter()
            .min_by_key(|row| (row.merged_name_count(), row.row_index))
            .map(|row| ResultCandidate {
                row_index: row.row_index,
                merged_name_count: row.merged_name_count(),
                is_exact_match: false,
            });
    }

    let wanted = normalizer.normalize_key(criterion.value());
    if wanted.is_empty() {
        return None;
    }

    rows.iter()
        .filter_map(|row| {
            let keys: Vec<String> = row.names.iter().map(|n| normalizer.normalize_key(n)).collect();
            let is_exact_match = if keys.iter().any(|k| *k == wanted) {
                true
            } else if keys.iter().any(|k| k.starts_with(&wanted)) {
                false
            } else {
                return None;
            };
            Some(ResultCandidate {
                row_index: row.row_index,
                merged_name_count: row.merged_name_count(),
                is_exact_match,
            })
        })
        .min_by_key(|c| (!c.is_exact_match, c.merged_name_count, c.row_index))
}

/// Ordinal of the row's link among all [`RESULT_LINK_SELECTOR`] matches on the page.
pub fn link_ordinal(document: &Html, row_index: usize, vocabulary: &Vocabulary) -> Option<usize> {
    let links = row_links(document, vocabulary);
    let anchor = links.iter().find(|l| l.row_index == row_index)?.anchor;
    document.select(&RESULT_LINK).position(|a| a.id() == anchor.id())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> NameNormalizer {
        NameNormalizer::new(&Vocabulary::default())
    }

    fn row(row_index: usize, names: &[&str]) -> ResultRow {
        ResultRow { row_index, names: names.iter().map(|s| s.to_string()).collect() }
    }

    fn by_name(name: &str) -> SearchCriterion {
        SearchCriterion::name(name, &normalizer())
    }

    const LISTING: &str = r##"
        <html><body>
        <table><tr><td><a href="/">Főoldal</a></td></tr></table>
        <table>
          <thead><tr><th>Cégnév</th><th>Székhely</th></tr></thead>
          <tbody>
            <tr><td><a href="#">MINTA HOLDING ZRT.<br>MINTA INVEST KFT.</a></td><td>Budapest</td></tr>
            <tr><td>nincs link</td><td>Pécs</td></tr>
            <tr><td><a href="#">MINTA KFT.</a></td><td>Győr</td></tr>
          </tbody>
        </table>
        </body></html>
    "##;

    #[test]
    fn reads_merged_rows_from_listing() {
        let doc = Html::parse_document(LISTING);
        let rows = collect_result_rows(&doc, &Vocabulary::default());
        assert_eq!(
            rows,
            vec![
                row(0, &["MINTA HOLDING ZRT.", "MINTA INVEST KFT."]),
                row(2, &["MINTA KFT."]),
            ]
        );
    }

    #[test]
    fn repeated_names_count_once() {
        let doc = Html::parse_document(
            r##"<table><thead><tr><th>Cégnév</th></tr></thead><tbody>
            <tr><td><a href="#">MINTA KFT.<br>MINTA KFT.<br>MINTA BT.</a></td></tr>
            </tbody></table>"##,
        );
        let rows = collect_result_rows(&doc, &Vocabulary::default());
        assert_eq!(rows[0].names, vec!["MINTA KFT.".to_string(), "MINTA BT.".to_string()]);
        assert_eq!(rows[0].merged_name_count(), 2);
    }

    #[test]
    fn missing_results_table_yields_no_rows() {
        let doc = Html::parse_document("<table><tr><th>Valami</th></tr><tr><td><a href=\"#\">X</a></td></tr></table>");
        assert!(collect_result_rows(&doc, &Vocabulary::default()).is_empty());
    }

    #[test]
    fn link_ordinal_skips_unrelated_tables() {
        let doc = Html::parse_document(LISTING);
        let vocab = Vocabulary::default();
        // The navigation table's link comes first in document order.
        assert_eq!(link_ordinal(&doc, 0, &vocab), Some(1));
        assert_eq!(link_ordinal(&doc, 2, &vocab), Some(2));
        assert_eq!(link_ordinal(&doc, 1, &vocab), None);
    }

    #[test]
    fn exact_match_outranks_earlier_prefix_match() {
        let rows = vec![row(0, &["MINTA HOLDING ZRT."]), row(1, &["MINTA KFT."])];
        let picked = select_candidate(&rows, &by_name("Minta Kft."), &normalizer()).unwrap();
        assert_eq!(picked.row_index, 1);
        assert!(picked.is_exact_match);
    }

    #[test]
    fn exact_match_outranks_less_merged_prefix_match() {
        let rows = vec![
            row(0, &["MINTA ÉPÍTŐ KFT."]),
            row(1, &["MINTA ZRT.", "MINTA RÉGI KFT.", "MINTA ÚJ KFT."]),
        ];
        let picked = select_candidate(&rows, &by_name("Minta"), &normalizer()).unwrap();
        assert_eq!(picked.row_index, 1);
        assert_eq!(picked.merged_name_count, 3);
    }

    // Tie-breaks below match observed portal behaviour, not a confirmed entity-resolution rule.
    #[test]
    fn name_tie_prefers_fewest_merged_names() {
        let rows = vec![
            row(0, &["ALFA KFT.", "ALFA SERVICE KFT."]),
            row(1, &["ALFA KFT."]),
        ];
        let picked = select_candidate(&rows, &by_name("Alfa"), &normalizer()).unwrap();
        assert_eq!(picked.row_index, 1);
    }

    #[test]
    fn name_tie_prefers_first_row() {
        let rows = vec![row(3, &["ALFA BT."]), row(5, &["ALFA KFT."])];
        let picked = select_candidate(&rows, &by_name("Alfa"), &normalizer()).unwrap();
        assert_eq!(picked.row_index, 3);
    }

    #[test]
    fn unrelated_name_is_not_found() {
        let rows = vec![row(0, &["BÉTA KFT."]), row(1, &["GAMMA ZRT."])];
        assert_eq!(select_candidate(&rows, &by_name("Alfa Kft."), &normalizer()), None);
    }

    #[test]
    fn empty_name_never_matches() {
        let rows = vec![row(0, &["BÉTA KFT."])];
        assert_eq!(select_candidate(&rows, &by_name("Kft."), &normalizer()), None);
    }

    #[test]
    fn tax_id_prefers_single_name_row() {
        let rows = vec![row(0, &["A KFT.", "B KFT.", "C KFT."]), row(1, &["A KFT."])];
        let picked = select_candidate(&rows, &SearchCriterion::tax_id("12345678"), &normalizer()).unwrap();
        assert_eq!(picked.row_index, 1);
        assert_eq!(picked.merged_name_count, 1);
    }

    #[test]
    fn tax_id_tie_takes_first_row_and_empty_is_not_found() {
        let rows = vec![row(0, &["A KFT."]), row(1, &["B KFT."])];
        let criterion = SearchCriterion::tax_id("12345678");
        assert_eq!(select_candidate(&rows, &criterion, &normalizer()).unwrap().row_index, 0);
        assert_eq!(select_candidate(&[], &criterion, &normalizer()), None);
    }
}
