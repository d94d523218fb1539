use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::record::{MergedRecord, PublicationRecord};

/// Collapses records sharing a normalized DOI into one record per DOI.
/// Records without a usable DOI are never merged with anything; each passes
/// through as its own group. Group order follows first appearance.
pub fn merge_records(records: Vec<PublicationRecord>) -> Vec<MergedRecord> {
    let mut groups: Vec<Vec<PublicationRecord>> = Vec::new();
    let mut group_by_doi: HashMap<String, usize> = HashMap::new();

    for record in records {
        match record.normalized_doi() {
            Some(doi) => {
                if let Some(&i) = group_by_doi.get(&doi) {
                    groups[i].push(record);
                } else {
                    group_by_doi.insert(doi, groups.len());
                    groups.push(vec![record]);
                }
            }
            None => groups.push(vec![record]),
        }
    }

    groups.into_iter().map(merge_group).collect()
}

/// Union of one DOI group. Identical values collapse to a scalar; conflicting
/// values are kept as a sorted `|`-join so nothing is silently dropped.
/// Set-union on strings makes the merge commutative and idempotent.
fn merge_group(group: Vec<PublicationRecord>) -> MergedRecord {
    let mut sources: BTreeSet<String> = BTreeSet::new();
    let mut external_ids: BTreeSet<String> = BTreeSet::new();
    for record in &group {
        sources.insert(record.source.as_str().to_string());
        if let Some(id) = record.external_id.as_deref() {
            // Splitting pre-joined values keeps re-merging idempotent.
            for part in id.split('|') {
                if !part.trim().is_empty() {
                    external_ids.insert(part.trim().to_string());
                }
            }
        }
    }

    let extra_keys: BTreeSet<String> = group
        .iter()
        .flat_map(|r| r.extra.keys().cloned())
        .collect();
    let mut extra = BTreeMap::new();
    for key in extra_keys {
        if let Some(value) = merge_column(group.iter().map(|r| r.extra.get(&key).map(String::as_str))) {
            extra.insert(key, value);
        }
    }

    MergedRecord {
        sources: sources.into_iter().collect::<Vec<_>>().join("|"),
        external_ids: external_ids.into_iter().collect::<Vec<_>>().join("|"),
        doi: group[0].normalized_doi(),
        title: merge_column(group.iter().map(|r| r.title.as_deref())),
        venue: merge_column(group.iter().map(|r| r.venue.as_deref())),
        date: merge_column(group.iter().map(|r| r.date.as_deref())),
        extra,
        archive: None,
        open_access: None,
        deposit_condition: None,
        authors: None,
        action: None,
    }
}

fn merge_column<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Option<String> {
    let distinct: BTreeSet<&str> = values.flatten().filter(|v| !v.trim().is_empty()).collect();
    match distinct.len() {
        0 => None,
        1 => distinct.into_iter().next().map(str::to_string),
        _ => Some(distinct.into_iter().collect::<Vec<_>>().join("|")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Source;
    use std::collections::BTreeMap;

    fn record(source: Source, doi: Option<&str>, title: &str) -> PublicationRecord {
        PublicationRecord {
            source,
            title: Some(title.to_string()),
            doi: doi.map(str::to_string),
            external_id: None,
            venue: None,
            date: None,
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn test_same_doi_records_merge() {
        let mut a = record(Source::Scopus, Some("10.1/x"), "A title");
        a.external_id = Some("scp-1".to_string());
        a.venue = Some("Journal of A".to_string());
        let mut b = record(Source::Openalex, Some("10.1/x"), "A different title");
        b.external_id = Some("oal-9".to_string());
        b.venue = Some("Annals of B".to_string());

        let merged = merge_records(vec![a, b]);
        assert_eq!(merged.len(), 1);
        let m = &merged[0];
        assert_eq!(m.sources, "openalex|scopus");
        assert_eq!(m.external_ids, "oal-9|scp-1");
        assert_eq!(m.doi.as_deref(), Some("10.1/x"));
        assert_eq!(m.title.as_deref(), Some("A different title|A title"));
        assert_eq!(m.venue.as_deref(), Some("Annals of B|Journal of A"));
    }

    #[test]
    fn test_identical_values_stay_scalar() {
        let mut a = record(Source::Scopus, Some("10.1/x"), "Same title");
        a.venue = Some("Same venue".to_string());
        let mut b = record(Source::Openalex, Some("10.1/x"), "Same title");
        b.venue = Some("Same venue".to_string());

        let merged = merge_records(vec![a, b]);
        assert_eq!(merged[0].title.as_deref(), Some("Same title"));
        assert_eq!(merged[0].venue.as_deref(), Some("Same venue"));
    }

    #[test]
    fn test_doi_normalized_before_grouping() {
        let a = record(Source::Scopus, Some("https://doi.org/10.1/X"), "T");
        let b = record(Source::Openalex, Some("10.1/x"), "T");

        let merged = merge_records(vec![a, b]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].doi.as_deref(), Some("10.1/x"));
    }

    #[test]
    fn test_doiless_records_never_merge() {
        let a = record(Source::Scopus, None, "Same title");
        let b = record(Source::Openalex, None, "Same title");

        let merged = merge_records(vec![a, b]);
        assert_eq!(merged.len(), 2);
        assert!(merged[0].doi.is_none());
        assert!(merged[1].doi.is_none());
    }

    #[test]
    fn test_doiless_never_merges_with_doi_bearing() {
        let a = record(Source::Scopus, Some("10.1/x"), "T");
        let b = record(Source::Openalex, None, "T");
        assert_eq!(merge_records(vec![a, b]).len(), 2);
    }

    #[test]
    fn test_merge_is_commutative_and_idempotent() {
        let a = record(Source::Scopus, Some("10.1/x"), "Title one");
        let b = record(Source::Openalex, Some("10.1/x"), "Title two");

        let forward = merge_records(vec![a.clone(), b.clone()]);
        let reverse = merge_records(vec![b.clone(), a.clone()]);
        assert_eq!(forward[0].sources, reverse[0].sources);
        assert_eq!(forward[0].title, reverse[0].title);

        // Feeding the group in twice changes nothing.
        let doubled = merge_records(vec![a.clone(), b.clone(), a, b]);
        assert_eq!(doubled.len(), 1);
        assert_eq!(doubled[0].sources, forward[0].sources);
        assert_eq!(doubled[0].external_ids, forward[0].external_ids);
        assert_eq!(doubled[0].title, forward[0].title);
    }

    #[test]
    fn test_extra_columns_merge_like_any_other() {
        let mut a = record(Source::Scopus, Some("10.1/x"), "T");
        a.extra.insert("issn".to_string(), "1111-1111".to_string());
        let mut b = record(Source::Openalex, Some("10.1/x"), "T");
        b.extra.insert("issn".to_string(), "2222-2222".to_string());
        b.extra.insert("volume".to_string(), "12".to_string());

        let merged = merge_records(vec![a, b]);
        assert_eq!(
            merged[0].extra.get("issn").map(String::as_str),
            Some("1111-1111|2222-2222")
        );
        assert_eq!(merged[0].extra.get("volume").map(String::as_str), Some("12"));
    }

    #[test]
    fn test_empty_input() {
        assert!(merge_records(Vec::new()).is_empty());
    }
}
