// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::cmp::Ordering;

use crate::{Project, SortDirection, SortKey, SortSpec, parse_display_date};

/// Case-insensitive substring match on the text fields, exact match on rate.
pub fn matches_search(project: &Project, term: &str) -> bool {
    let needle = term.to_lowercase();
    let text_match = [
        &project.client,
        &project.project,
        &project.domain,
        &project.starting_date,
        &project.ending_date,
    ]
    .into_iter()
    .any(|field| field.to_lowercase().contains(&needle));
    if text_match {
        return true;
    }

    term.trim()
        .parse::<f64>()
        .is_ok_and(|value| value == project.rate)
}

pub fn compare_by(left: &Project, right: &Project, key: SortKey) -> Ordering {
    match key {
        SortKey::Id => left.id.cmp(&right.id),
        SortKey::Rate => left.rate.total_cmp(&right.rate),
        SortKey::Client => compare_text(&left.client, &right.client),
        SortKey::Project => compare_text(&left.project, &right.project),
        SortKey::Domain => compare_text(&left.domain, &right.domain),
        SortKey::StartingDate => compare_dates(&left.starting_date, &right.starting_date),
        SortKey::EndingDate => compare_dates(&left.ending_date, &right.ending_date),
    }
}

fn compare_text(left: &str, right: &str) -> Ordering {
    left.to_lowercase().cmp(&right.to_lowercase())
}

fn compare_dates(left: &str, right: &str) -> Ordering {
    match (parse_display_date(left), parse_display_date(right)) {
        (Some(left), Some(right)) => left.cmp(&right),
        _ => compare_text(left, right),
    }
}

/// Filters `records` by `term` and sorts the survivors. `records` is never
/// reordered; ties keep their position in `records`.
pub fn derive_rows<'a>(
    records: &'a [Project],
    term: &str,
    sort: Option<SortSpec>,
) -> Vec<&'a Project> {
    let mut rows: Vec<&Project> = records
        .iter()
        .filter(|project| matches_search(project, term))
        .collect();

    if let Some(spec) = sort {
        rows.sort_by(|left, right| {
            let ordering = compare_by(left, right, spec.key);
            match spec.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::{compare_by, derive_rows, matches_search};
    use crate::{Project, ProjectId, SortDirection, SortKey, SortSpec};
    use std::cmp::Ordering;

    fn project(id: i64, client: &str, name: &str, rate: f64, start: &str) -> Project {
        Project {
            id: ProjectId::new(id),
            client: client.to_owned(),
            project: name.to_owned(),
            domain: "Banking".to_owned(),
            rate,
            starting_date: start.to_owned(),
            ending_date: String::new(),
        }
    }

    fn fixture() -> Vec<Project> {
        vec![
            project(1, "Zenith", "Ledger", 600.0, "15/03/2021"),
            project(2, "acme", "Portal", 450.0, "02/11/2020"),
            project(3, "Borealis", "Billing", 600.0, "01/01/2022"),
            project(4, "Acme", "Mobile app", 520.0, "2020-06-30"),
        ]
    }

    fn ids(rows: &[&Project]) -> Vec<i64> {
        rows.iter().map(|row| row.id.get()).collect()
    }

    #[test]
    fn search_is_case_insensitive_across_text_fields() {
        let records = fixture();
        assert!(matches_search(&records[1], "ACM"));
        assert!(matches_search(&records[0], "ledg"));
        assert!(matches_search(&records[0], "bank"));
        assert!(matches_search(&records[0], "03/2021"));
        assert!(!matches_search(&records[0], "portal"));
    }

    #[test]
    fn search_matches_rate_only_by_exact_value() {
        let records = fixture();
        assert!(matches_search(&records[1], "450"));
        assert!(matches_search(&records[1], " 450.0 "));
        assert!(!matches_search(&records[1], "45"));
    }

    #[test]
    fn empty_search_keeps_everything() {
        let records = fixture();
        assert_eq!(ids(&derive_rows(&records, "", None)), vec![1, 2, 3, 4]);
    }

    #[test]
    fn filtered_rows_are_a_matching_subset() {
        let records = fixture();
        for term in ["a", "acme", "600", "20", "zz", "Billing", "2020"] {
            let rows = derive_rows(&records, term, None);
            for row in &rows {
                assert!(records.contains(*row), "term {term}");
                assert!(matches_search(row, term), "term {term}");
            }
            let expected = records
                .iter()
                .filter(|record| matches_search(record, term))
                .count();
            assert_eq!(rows.len(), expected, "term {term}");
        }
    }

    #[test]
    fn text_sort_ignores_case_and_keeps_fetch_order_for_ties() {
        let records = fixture();
        let rows = derive_rows(&records, "", Some(SortSpec::ascending(SortKey::Client)));
        assert_eq!(ids(&rows), vec![2, 4, 3, 1]);
    }

    #[test]
    fn descending_sort_keeps_fetch_order_for_ties() {
        let records = fixture();
        let rows = derive_rows(
            &records,
            "",
            Some(SortSpec {
                key: SortKey::Rate,
                direction: SortDirection::Desc,
            }),
        );
        assert_eq!(ids(&rows), vec![1, 3, 4, 2]);
    }

    #[test]
    fn date_sort_is_chronological_across_formats() {
        let records = fixture();
        let rows = derive_rows(
            &records,
            "",
            Some(SortSpec::ascending(SortKey::StartingDate)),
        );
        assert_eq!(ids(&rows), vec![4, 2, 1, 3]);
    }

    #[test]
    fn unparseable_dates_fall_back_to_text_order() {
        let left = project(1, "a", "b", 1.0, "later");
        let right = project(2, "a", "b", 1.0, "asap");
        assert_eq!(
            compare_by(&left, &right, SortKey::StartingDate),
            Ordering::Greater
        );
    }

    #[test]
    fn deriving_rows_does_not_reorder_records() {
        let records = fixture();
        let _ = derive_rows(&records, "a", Some(SortSpec::ascending(SortKey::Rate)));
        assert_eq!(
            records.iter().map(|r| r.id.get()).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
    }
}
