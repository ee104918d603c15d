//! Ingestion properties checked against both store backends
//!
//! - Re-ingesting a file leaves the store unchanged
//! - At most one record exists per natural key
//! - Relationship direction updates merge regardless of line order
//! - Delegation lines up to the sentinel are never parsed
//! - Category ASNs lose their `AS` prefix
//! - A malformed record never fails the whole job
//! - Only numeric ASNs become stored keys

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use asnmap_common::types::{
    CategoryLabel, DelegationRecord, EntityKind, OrganizationInfo, Record, RelationshipEdge,
};
use asnmap_server::ingest::ReportStatus;
use common::*;

#[tokio::test]
async fn test_reingesting_same_file_is_idempotent() {
    for (backend, store) in stores().await {
        let dir = tempfile::tempdir().unwrap();
        let cases = [
            (EntityKind::Delegation, "delegated.txt", DELEGATION_FILE, vec!["64500", "64501", "64502"]),
            (EntityKind::Category, "categories.csv", CATEGORY_FILE, vec!["64500", "64501", "64502"]),
            (EntityKind::Organization, "as2org.json", ORGANIZATION_FILE, vec!["64500", "64501", "64502"]),
            (EntityKind::Relationship, "as-rel.txt", RELATIONSHIP_FILE, vec!["64500", "64501", "64502"]),
        ];

        for (kind, name, contents, keys) in cases {
            let path = write_fixture(dir.path(), name, contents);

            let first = run(store.as_ref(), kind, &path).await;
            let after_first = snapshot(store.as_ref(), kind, &keys).await;
            let second = run(store.as_ref(), kind, &path).await;
            let after_second = snapshot(store.as_ref(), kind, &keys).await;

            assert_eq!(after_first, after_second, "{backend}/{kind}: state changed on re-ingest");
            assert_eq!(first.records_processed, second.records_processed, "{backend}/{kind}");
            if kind != EntityKind::Relationship {
                assert_eq!(second.records_inserted, 0, "{backend}/{kind}: second run inserted");
            }
        }
    }
}

#[tokio::test]
async fn test_one_record_per_natural_key() {
    for (backend, store) in stores().await {
        let dir = tempfile::tempdir().unwrap();
        let first = write_fixture(
            dir.path(),
            "categories-1.csv",
            "ASN,Category 1 - Layer 1,Category 1 - Layer 2\nAS1,isp,transit\n1,cdn,\nAS2,edu,\n",
        );
        let second = write_fixture(
            dir.path(),
            "categories-2.csv",
            "ASN,Category 1 - Layer 1,Category 1 - Layer 2\n2,gov,\nAS1,hosting,cloud\n",
        );

        run(store.as_ref(), EntityKind::Category, &first).await;
        run(store.as_ref(), EntityKind::Category, &second).await;

        assert_eq!(store.count(EntityKind::Category).await.unwrap(), 2, "{backend}");
        assert_eq!(
            store.get(EntityKind::Category, "1").await.unwrap(),
            Some(Record::Category(CategoryLabel {
                asn: "1".to_string(),
                category_1: "hosting".to_string(),
                category_2: "cloud".to_string(),
            })),
            "{backend}: last write wins"
        );
    }
}

#[tokio::test]
async fn test_relationship_merge_is_order_independent() {
    for (backend, store) in stores().await {
        let dir = tempfile::tempdir().unwrap();
        let forward = write_fixture(dir.path(), "forward.txt", "100|200|0\n100|300|-1\n");
        let backward = write_fixture(dir.path(), "backward.txt", "101|300|-1\n101|200|0\n");

        run(store.as_ref(), EntityKind::Relationship, &forward).await;
        run(store.as_ref(), EntityKind::Relationship, &backward).await;

        for asn in ["100", "101"] {
            assert_eq!(
                store.relationship(asn).await.unwrap(),
                Some(RelationshipEdge::new(asn, "200", "300")),
                "{backend}: edge for {asn}"
            );
        }
    }
}

#[tokio::test]
async fn test_direction_updates_merge_across_files() {
    for (backend, store) in stores().await {
        let dir = tempfile::tempdir().unwrap();
        let customers = write_fixture(dir.path(), "customers.txt", "100|200|0\n");
        let providers = write_fixture(dir.path(), "providers.txt", "100|300|-1\n");

        run(store.as_ref(), EntityKind::Relationship, &providers).await;
        run(store.as_ref(), EntityKind::Relationship, &customers).await;

        let edge = store.relationship("100").await.unwrap().unwrap();
        assert_eq!(edge.customer, "200", "{backend}");
        assert_eq!(edge.provider, "300", "{backend}");
    }
}

#[tokio::test]
async fn test_lines_through_sentinel_are_skipped() {
    for (backend, store) in stores().await {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(
            dir.path(),
            "delegated.txt",
            "noise\niana|ZZ|asn|0|1|20140311|reserved|ietf|iana\nripencc|FR|asn|1|2|20200101|allocated|x|y\n",
        );

        let report = run(store.as_ref(), EntityKind::Delegation, &path).await;

        assert_eq!(report.status, ReportStatus::Completed, "{backend}");
        assert_eq!(report.records_processed, 1, "{backend}");
        assert_eq!(store.count(EntityKind::Delegation).await.unwrap(), 1, "{backend}");

        let record = store.delegation("2").await.unwrap().unwrap();
        assert_eq!(
            record,
            DelegationRecord {
                value: "2".to_string(),
                registry: "ripencc".to_string(),
                cc: "FR".to_string(),
                allocation_type: "asn".to_string(),
                start: "1".to_string(),
                date: "20200101".to_string(),
                status: "allocated".to_string(),
                opaque_id: "x".to_string(),
                extensions: "y".to_string(),
            },
            "{backend}"
        );
        assert!(store.delegation("1").await.unwrap().is_none(), "{backend}: sentinel stored");
    }
}

#[tokio::test]
async fn test_category_asn_prefix_is_stripped() {
    for (backend, store) in stores().await {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(
            dir.path(),
            "categories.csv",
            "ASN,Category 1 - Layer 1,Category 1 - Layer 2\nAS64500,cdn,content\n",
        );

        run(store.as_ref(), EntityKind::Category, &path).await;

        let label = store.category("64500").await.unwrap();
        assert_eq!(
            label,
            Some(CategoryLabel {
                asn: "64500".to_string(),
                category_1: "cdn".to_string(),
                category_2: "content".to_string(),
            }),
            "{backend}"
        );
        assert!(store.category("AS64500").await.unwrap().is_none(), "{backend}");
    }
}

#[tokio::test]
async fn test_malformed_line_does_not_fail_job() {
    for (backend, store) in stores().await {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), "as-rel.txt", "64500|64501|0\n64502\n");

        let report = run(store.as_ref(), EntityKind::Relationship, &path).await;

        assert_eq!(report.status, ReportStatus::Completed, "{backend}");
        assert!(report.failure.is_none(), "{backend}");
        assert_eq!(report.records_processed, 1, "{backend}");
        assert_eq!(report.errors.len(), 1, "{backend}");
        assert_eq!(report.errors[0].line, Some(2), "{backend}");
    }
}

#[tokio::test]
async fn test_undecodable_csv_row_is_skipped() {
    for (backend, store) in stores().await {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("categories.csv");
        let mut bytes = b"ASN,Category 1 - Layer 1,Category 1 - Layer 2\nAS1,isp,transit\nAS2,c".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe]);
        bytes.extend_from_slice(b"dn,x\nAS3,isp,y\n");
        std::fs::write(&path, bytes).unwrap();

        let report = run(store.as_ref(), EntityKind::Category, &path).await;

        assert_eq!(report.status, ReportStatus::Completed, "{backend}");
        assert_eq!(report.records_processed, 2, "{backend}");
        assert_eq!(report.records_skipped, 1, "{backend}");
        assert_eq!(report.errors[0].line, Some(3), "{backend}");
        assert_eq!(store.count(EntityKind::Category).await.unwrap(), 2, "{backend}");
        assert!(store.get(EntityKind::Category, "3").await.unwrap().is_some(), "{backend}");
    }
}

#[tokio::test]
async fn test_non_numeric_asn_is_never_stored() {
    for (backend, store) in stores().await {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), "as-rel.txt", "A|64501|0\n64500|64501|0\n");

        let report = run(store.as_ref(), EntityKind::Relationship, &path).await;

        assert_eq!(report.status, ReportStatus::Completed, "{backend}");
        assert_eq!(report.records_processed, 1, "{backend}");
        assert_eq!(report.errors[0].key.as_deref(), Some("A"), "{backend}");
        assert!(store.relationship("A").await.unwrap().is_none(), "{backend}");
    }
}

#[tokio::test]
async fn test_org_info_section_is_ingested() {
    for (backend, store) in stores().await {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(
            dir.path(),
            "as-org2info.txt",
            "# name: AS Org\n\
             # format:org_id|changed|org_name|country|source\n\
             ORG-1|20240101|Example Org|FR|RIPE\n\
             ORG-2|20240102|Other Org|DE|RIPE\n\
             # format:aut|changed|aut_name|org_id|opaque_id|source\n\
             64500|20240101|EX|ORG-1|x|RIPE\n",
        );

        let report = run(store.as_ref(), EntityKind::OrgInfo, &path).await;

        assert_eq!(report.records_processed, 2, "{backend}");
        assert_eq!(store.count(EntityKind::OrgInfo).await.unwrap(), 2, "{backend}");
        assert_eq!(
            store.org_info("ORG-1").await.unwrap(),
            Some(OrganizationInfo {
                org_id: "ORG-1".to_string(),
                changed: "20240101".to_string(),
                org_name: "Example Org".to_string(),
                country: "FR".to_string(),
                source: "RIPE".to_string(),
            }),
            "{backend}"
        );
    }
}

#[tokio::test]
async fn test_organization_lists_round_trip_through_store() {
    for (backend, store) in stores().await {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), "as2org.json", ORGANIZATION_FILE);

        run(store.as_ref(), EntityKind::Organization, &path).await;

        let mapping = store.organization("64500").await.unwrap().unwrap();
        assert_eq!(mapping.name, "Alpha", "{backend}");
        assert_eq!(mapping.sibling_asns, vec!["64501".to_string()], "{backend}");
    }
}
