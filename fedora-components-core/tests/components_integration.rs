use std::io::Write;

use fedora_components_core::components::{
    collection_members, collection_objects, disseminate, export_object, ingest_file,
    purge_object, work_objects, DisseminationRequest,
};
use fedora_components_core::config::{MembershipConfig, SearchConfig};
use fedora_components_core::contract::{
    ExportContext, MimeTypedStream, MockObjectAccess, MockObjectManagement, MockObjectSearch,
    MockResourceIndex, ObjectRecord, ResultPage, XmlFormat,
};
use fedora_components_core::{collect_objects, ComponentError, FieldSearchQuery, RepositoryError};
use mockall::predicate::eq;
use tempfile::NamedTempFile;

fn rec(pid: &str, title: &str) -> ObjectRecord {
    ObjectRecord::new(pid, title)
}

/// Deterministic two-page repository: `monk:tcp-1`, `other:1` | `monk:tcp-2`.
fn two_page_search() -> MockObjectSearch {
    let mut search = MockObjectSearch::new();
    search.expect_find_objects().returning(|_| {
        Ok(ResultPage::with_token(
            vec![rec("monk:tcp-1", "Emma"), rec("other:1", "")],
            "session-1",
        ))
    });
    search
        .expect_resume_find_objects()
        .with(eq("session-1"))
        .returning(|_| Ok(ResultPage::last(vec![rec("monk:tcp-2", "Persuasion")])));
    search
}

#[tokio::test]
async fn test_collection_objects_uses_configured_pattern() {
    let mut search = MockObjectSearch::new();
    search
        .expect_find_objects()
        .withf(|q| q.terms == "monk:collection-*" && q.max_results == 10_000)
        .times(1)
        .returning(|_| {
            Ok(ResultPage::last(vec![
                rec("monk:collection-1", "Austen"),
                rec("monk:collection-2", "Shakespeare"),
            ]))
        });

    let out = collection_objects(&search, &SearchConfig::default())
        .await
        .expect("collection listing should succeed");
    assert_eq!(out.len(), 2);
    assert_eq!(out[1].title(), "Shakespeare");
}

#[tokio::test]
async fn test_work_objects_filters_by_prefix_across_pages() {
    let search = two_page_search();
    let out = work_objects(&search, &SearchConfig::default())
        .await
        .expect("work listing should succeed");
    let pids: Vec<&str> = out.iter().map(|r| r.pid()).collect();
    assert_eq!(pids, ["monk:tcp-1", "monk:tcp-2"]);
}

#[tokio::test]
async fn test_collection_is_idempotent_for_deterministic_search() {
    let search = two_page_search();
    let query = FieldSearchQuery::terms("*");
    let first = collect_objects(&search, &query, None).await.unwrap();
    let second = collect_objects(&search, &query, None).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
}

#[tokio::test]
async fn test_work_objects_wraps_search_failure() {
    let mut search = MockObjectSearch::new();
    search
        .expect_find_objects()
        .returning(|_| Ok(ResultPage::with_token(vec![rec("monk:tcp-1", "")], "t")));
    search
        .expect_resume_find_objects()
        .returning(|_| Err(RepositoryError::Malformed("not xml".into())));

    let err = work_objects(&search, &SearchConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ComponentError::Collect(_)));
}

#[tokio::test]
async fn test_collection_members_flattens_rows_and_builds_uri() {
    let mut index = MockResourceIndex::new();
    index
        .expect_tuples()
        .withf(|q: &str| {
            q.contains("<info:fedora/monk:collections>")
                && q.contains("isMemberOfCollection")
                && q.starts_with("select $s from <#ri>")
        })
        .times(1)
        .returning(|_| {
            Ok(vec![
                vec!["info:fedora/monk:collection-1".to_string()],
                vec!["info:fedora/monk:collection-2".to_string()],
            ])
        });

    let listing = collection_members(&index, &MembershipConfig::default())
        .await
        .expect("membership query should succeed");
    assert_eq!(listing.collection_uri, "info:fedora/monk:collections");
    assert_eq!(
        listing.members,
        ["info:fedora/monk:collection-1", "info:fedora/monk:collection-2"]
    );
}

#[tokio::test]
async fn test_ingest_file_sends_file_content_and_log_message() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "<foxml:digitalObject PID=\"test:100\"/>").unwrap();
    let path = file.path().to_path_buf();
    let expected_log = format!("Ingesting file {}", path.display());

    let mut apim = MockObjectManagement::new();
    apim.expect_ingest()
        .withf(move |content, format, log| {
            content.as_slice() == b"<foxml:digitalObject PID=\"test:100\"/>"
                && *format == XmlFormat::Foxml
                && log == expected_log
        })
        .times(1)
        .returning(|_, _, _| Ok("test:100".to_string()));

    let pid = ingest_file(&apim, &path, XmlFormat::Foxml).await.unwrap();
    assert_eq!(pid, "test:100");
}

#[tokio::test]
async fn test_ingest_missing_file_is_io_error_without_remote_call() {
    let mut apim = MockObjectManagement::new();
    apim.expect_ingest().never();

    let err = ingest_file(
        &apim,
        std::path::Path::new("/definitely/not/here.xml"),
        XmlFormat::Foxml,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ComponentError::Io { .. }));
}

#[tokio::test]
async fn test_export_passes_format_and_context() {
    let mut apim = MockObjectManagement::new();
    apim.expect_export()
        .with(eq("demo:5"), eq(XmlFormat::Mets), eq(ExportContext::Archive))
        .times(1)
        .returning(|_, _, _| Ok(b"<mets/>".to_vec()));

    let xml = export_object(&apim, "demo:5", XmlFormat::Mets, ExportContext::Archive)
        .await
        .unwrap();
    assert_eq!(xml, b"<mets/>");
}

#[tokio::test]
async fn test_purge_rejects_invalid_forced_before_calling_repository() {
    let mut apim = MockObjectManagement::new();
    apim.expect_purge_object().never();

    let err = purge_object(&apim, "test:100", "cleanup", "maybe")
        .await
        .unwrap_err();
    assert!(matches!(err, ComponentError::InvalidProperty { .. }));
}

#[tokio::test]
async fn test_purge_returns_repository_timestamp() {
    let mut apim = MockObjectManagement::new();
    apim.expect_purge_object()
        .with(eq("test:100"), eq("cleanup"), eq(true))
        .times(1)
        .returning(|_, _, _| Ok("2008-06-01T12:00:00.000Z".to_string()));

    let at = purge_object(&apim, "test:100", "cleanup", "True")
        .await
        .unwrap();
    assert_eq!(at, "2008-06-01T12:00:00.000Z");
}

#[tokio::test]
async fn test_disseminate_passes_part_as_xmlid() {
    let mut apia = MockObjectAccess::new();
    apia.expect_dissemination()
        .withf(|pid, sdef, method, params| {
            pid == "monk:tcp-1"
                && sdef == "monk:behav-def-book"
                && method == "getChunk"
                && params == [("xmlid".to_string(), "chap-1".to_string())]
        })
        .times(1)
        .returning(|_, _, _, _| {
            Ok(MimeTypedStream {
                mime_type: "text/html".into(),
                content: b"<p>It is a truth</p>".to_vec(),
            })
        });

    let request = DisseminationRequest {
        pid: "monk:tcp-1".into(),
        sdef_pid: "monk:behav-def-book".into(),
        method: "getChunk".into(),
        part_id: "chap-1".into(),
    };
    let stream = disseminate(&apia, &request).await.unwrap();
    assert_eq!(stream.mime_type, "text/html");
}
