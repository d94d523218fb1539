use crate::enrich::OaStatus;
use crate::record::MergedRecord;
use crate::xref::CrossRefStatus;
use crate::archive::DepositType;

/// Picks the single follow-up action for a record. Rules run in priority
/// order and the first hit wins: archive membership outranks open-access
/// findings, which outrank the catch-alls.
pub fn recommended_action(record: &MergedRecord) -> &'static str {
    let status = record.archive.as_ref().map(|a| a.status);
    let deposit_type = record.archive.as_ref().and_then(|a| a.matched_deposit_type);
    let has_file = deposit_type == Some(DepositType::File);

    if status == Some(CrossRefStatus::InCollection) && has_file {
        return "deposit already complete";
    }
    if status == Some(CrossRefStatus::InArchiveOutsideCollection) {
        return "verify affiliation, found outside target collection";
    }
    if status == Some(CrossRefStatus::NotInArchive) {
        return "create archive record";
    }
    if status == Some(CrossRefStatus::TitleFuzzyInCollection) {
        return "verify — possible variant already deposited";
    }
    if status == Some(CrossRefStatus::TitleExactInCollection) && has_file {
        return "likely already deposited";
    }
    if status == Some(CrossRefStatus::InvalidTitle) {
        return "invalid title, fix and retry";
    }
    if matches!(
        status,
        Some(CrossRefStatus::TitleExactInArchiveOutsideCollection)
            | Some(CrossRefStatus::TitleFuzzyInArchiveOutsideCollection)
    ) {
        return "found in archive outside collection, verify affiliation";
    }
    if status == Some(CrossRefStatus::LookupError) {
        return "archive lookup failed, review manually";
    }

    if record
        .deposit_condition
        .as_deref()
        .is_some_and(|c| c.contains("publishedVersion"))
    {
        return "retrieve publisher PDF";
    }

    let oa = record.open_access.as_ref();
    let publisher_license = oa
        .and_then(|o| o.publisher_license.as_deref())
        .is_some_and(|l| !l.trim().is_empty());
    let repository_link = oa
        .and_then(|o| o.repository_link.as_deref())
        .is_some_and(|l| !l.trim().is_empty());
    if publisher_license && !repository_link {
        return "add publisher PDF per license";
    }

    if oa.map(|o| o.status) != Some(OaStatus::Open) {
        return "contact author for legal deposit";
    }

    let matched_id = record
        .archive
        .as_ref()
        .and_then(|a| a.matched_archive_id.as_deref())
        .unwrap_or("");
    if matched_id.is_empty() {
        return "no archive record detected, create one";
    }

    "manual review required"
}

/// Stamps every record with its recommended action.
pub fn apply_actions(records: &mut [MergedRecord]) {
    for record in records.iter_mut() {
        record.action = Some(recommended_action(record).to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::OpenAccessResult;
    use crate::xref::CrossReference;
    use std::collections::BTreeMap;

    fn record() -> MergedRecord {
        MergedRecord {
            sources: "scopus".to_string(),
            external_ids: String::new(),
            doi: Some("10.1/x".to_string()),
            title: Some("A title".to_string()),
            venue: None,
            date: None,
            extra: BTreeMap::new(),
            archive: None,
            open_access: None,
            deposit_condition: None,
            authors: None,
            action: None,
        }
    }

    fn xref(status: CrossRefStatus, deposit_type: Option<DepositType>) -> CrossReference {
        CrossReference {
            status,
            matched_title: None,
            matched_archive_id: Some("100".to_string()),
            matched_deposit_type: deposit_type,
            matched_link: None,
            matched_link_id: None,
        }
    }

    #[test]
    fn test_deposited_file_in_collection() {
        let mut r = record();
        r.archive = Some(xref(CrossRefStatus::InCollection, Some(DepositType::File)));
        assert_eq!(recommended_action(&r), "deposit already complete");
    }

    #[test]
    fn test_in_collection_without_file_falls_through() {
        let mut r = record();
        r.archive = Some(xref(CrossRefStatus::InCollection, Some(DepositType::Other)));
        r.open_access = Some(OpenAccessResult::status_only(OaStatus::Closed));
        assert_eq!(recommended_action(&r), "contact author for legal deposit");
    }

    #[test]
    fn test_outside_collection_by_doi() {
        let mut r = record();
        r.archive = Some(xref(
            CrossRefStatus::InArchiveOutsideCollection,
            Some(DepositType::File),
        ));
        assert_eq!(
            recommended_action(&r),
            "verify affiliation, found outside target collection"
        );
    }

    #[test]
    fn test_not_in_archive() {
        let mut r = record();
        r.archive = Some(xref(CrossRefStatus::NotInArchive, None));
        assert_eq!(recommended_action(&r), "create archive record");
    }

    #[test]
    fn test_fuzzy_title_in_collection() {
        let mut r = record();
        r.archive = Some(xref(
            CrossRefStatus::TitleFuzzyInCollection,
            Some(DepositType::File),
        ));
        assert_eq!(
            recommended_action(&r),
            "verify — possible variant already deposited"
        );
    }

    #[test]
    fn test_exact_title_with_file() {
        let mut r = record();
        r.archive = Some(xref(
            CrossRefStatus::TitleExactInCollection,
            Some(DepositType::File),
        ));
        assert_eq!(recommended_action(&r), "likely already deposited");
    }

    #[test]
    fn test_invalid_title() {
        let mut r = record();
        r.archive = Some(xref(CrossRefStatus::InvalidTitle, None));
        assert_eq!(recommended_action(&r), "invalid title, fix and retry");
    }

    #[test]
    fn test_title_matches_outside_collection() {
        for status in [
            CrossRefStatus::TitleExactInArchiveOutsideCollection,
            CrossRefStatus::TitleFuzzyInArchiveOutsideCollection,
        ] {
            let mut r = record();
            r.archive = Some(xref(status, Some(DepositType::Other)));
            assert_eq!(
                recommended_action(&r),
                "found in archive outside collection, verify affiliation"
            );
        }
    }

    #[test]
    fn test_lookup_error() {
        let mut r = record();
        r.archive = Some(xref(CrossRefStatus::LookupError, None));
        assert_eq!(recommended_action(&r), "archive lookup failed, review manually");
    }

    #[test]
    fn test_published_version_permission() {
        let mut r = record();
        r.archive = Some(xref(CrossRefStatus::TitleExactInCollection, Some(DepositType::Other)));
        r.deposit_condition = Some("publishedVersion ; cc-by ; no months".to_string());
        assert_eq!(recommended_action(&r), "retrieve publisher PDF");
    }

    #[test]
    fn test_publisher_license_without_repo_copy() {
        let mut r = record();
        r.archive = Some(xref(CrossRefStatus::NoIdentifier, None));
        r.open_access = Some(OpenAccessResult {
            status: OaStatus::Open,
            publisher_license: Some("cc-by".to_string()),
            ..Default::default()
        });
        assert_eq!(recommended_action(&r), "add publisher PDF per license");
    }

    #[test]
    fn test_publisher_license_with_repo_copy_falls_through() {
        let mut r = record();
        r.archive = Some(xref(CrossRefStatus::NoIdentifier, None));
        r.open_access = Some(OpenAccessResult {
            status: OaStatus::Open,
            publisher_license: Some("cc-by".to_string()),
            repository_link: Some("https://repo.example/x.pdf".to_string()),
            ..Default::default()
        });
        assert_eq!(recommended_action(&r), "manual review required");
    }

    #[test]
    fn test_closed_access_asks_the_author() {
        let mut r = record();
        r.archive = Some(xref(CrossRefStatus::NoIdentifier, None));
        r.open_access = Some(OpenAccessResult::status_only(OaStatus::Closed));
        assert_eq!(recommended_action(&r), "contact author for legal deposit");
    }

    #[test]
    fn test_open_without_archive_match() {
        let mut r = record();
        r.archive = Some(CrossReference {
            matched_archive_id: None,
            ..xref(CrossRefStatus::NoIdentifier, None)
        });
        r.open_access = Some(OpenAccessResult {
            status: OaStatus::Open,
            ..Default::default()
        });
        assert_eq!(recommended_action(&r), "no archive record detected, create one");
    }

    #[test]
    fn test_manual_review_fallback() {
        let mut r = record();
        r.archive = Some(xref(CrossRefStatus::NoIdentifier, None));
        r.open_access = Some(OpenAccessResult {
            status: OaStatus::Open,
            ..Default::default()
        });
        assert_eq!(recommended_action(&r), "manual review required");
    }

    #[test]
    fn test_archive_rules_outrank_enrichment_rules() {
        // A completed deposit wins even when every later rule would also fire.
        let mut r = record();
        r.archive = Some(xref(CrossRefStatus::InCollection, Some(DepositType::File)));
        r.deposit_condition = Some("publishedVersion ; cc-by ; no months".to_string());
        r.open_access = Some(OpenAccessResult {
            status: OaStatus::Closed,
            publisher_license: Some("cc-by".to_string()),
            ..Default::default()
        });
        assert_eq!(recommended_action(&r), "deposit already complete");
    }

    #[test]
    fn test_apply_actions_stamps_every_record() {
        let mut records = vec![record(), record()];
        records[0].archive = Some(xref(CrossRefStatus::NotInArchive, None));
        records[1].archive = Some(xref(CrossRefStatus::InvalidTitle, None));

        apply_actions(&mut records);
        assert_eq!(records[0].action.as_deref(), Some("create archive record"));
        assert_eq!(records[1].action.as_deref(), Some("invalid title, fix and retry"));
    }
}
