//! Repository components: one typed operation per remote call.
//!
//! Each function takes the capability it needs (search, management, access or the
//! resource index) as a parameter, so nothing here holds a client between calls.
//! Listings go through [`collect_objects`]; everything else is a single request.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{error, info};

use crate::collect::collect_objects;
use crate::config::{MembershipConfig, SearchConfig};
use crate::contract::{
    ExportContext, FieldSearchQuery, MimeTypedStream, ObjectAccess, ObjectManagement,
    ObjectRecord, ObjectSearch, ResourceIndex, XmlFormat,
};
use crate::error::ComponentError;

const FEDORA_URI_PREFIX: &str = "info:fedora/";

/// All collection objects: search terms come from `collection_pattern`.
pub async fn collection_objects<S>(
    search: &S,
    config: &SearchConfig,
) -> Result<Vec<ObjectRecord>, ComponentError>
where
    S: ObjectSearch + ?Sized,
{
    info!(pattern = %config.collection_pattern, "Listing collection objects");
    let query = FieldSearchQuery::terms(config.collection_pattern.as_str())
        .with_max_results(config.max_results);
    Ok(collect_objects(search, &query, None).await?)
}

/// All work objects: every object in the repository whose PID starts with `work_prefix`.
pub async fn work_objects<S>(
    search: &S,
    config: &SearchConfig,
) -> Result<Vec<ObjectRecord>, ComponentError>
where
    S: ObjectSearch + ?Sized,
{
    info!(prefix = %config.work_prefix, "Listing work objects");
    let query = FieldSearchQuery::terms("*").with_max_results(config.max_results);
    Ok(collect_objects(search, &query, Some(config.work_prefix.as_str())).await?)
}

/// Members of a super collection, as found in the resource index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MembershipListing {
    /// URI of the super collection the query was run against.
    pub collection_uri: String,
    /// Every value bound in every result row, in row order.
    pub members: Vec<String>,
}

/// `info:fedora/` URI for a PID; values that already are `info:` URIs pass through.
pub fn to_object_uri(pid: &str) -> String {
    if pid.starts_with("info:") {
        pid.to_string()
    } else {
        format!("{FEDORA_URI_PREFIX}{pid}")
    }
}

pub fn membership_query(predicate: &str, object_uri: &str) -> String {
    format!("select $s from <#ri> where $s <{predicate}> <{object_uri}>;")
}

pub async fn collection_members<R>(
    index: &R,
    config: &MembershipConfig,
) -> Result<MembershipListing, ComponentError>
where
    R: ResourceIndex + ?Sized,
{
    let collection_uri = to_object_uri(&config.super_collection);
    let query = membership_query(&config.predicate, &collection_uri);
    info!(query = %query, "Querying resource index for collection members");

    let rows = index.tuples(&query).await.map_err(|e| {
        error!(error = %e, "Resource index query failed");
        e
    })?;
    let members: Vec<String> = rows.into_iter().flatten().collect();
    info!(count = members.len(), collection = %collection_uri, "Collected collection members");
    Ok(MembershipListing {
        collection_uri,
        members,
    })
}

/// Read `path` and ingest its content. Returns the new object's PID.
pub async fn ingest_file<M>(
    apim: &M,
    path: &Path,
    format: XmlFormat,
) -> Result<String, ComponentError>
where
    M: ObjectManagement + ?Sized,
{
    info!(path = %path.display(), format = %format, "Ingesting object from file");
    let content = tokio::fs::read(path).await.map_err(|e| {
        error!(error = ?e, path = %path.display(), "Failed to read ingest file");
        ComponentError::Io {
            path: PathBuf::from(path),
            source: e,
        }
    })?;
    let log_message = format!("Ingesting file {}", path.display());
    let pid = apim.ingest(content, format, &log_message).await?;
    info!(pid = %pid, "Ingested object");
    Ok(pid)
}

pub async fn export_object<M>(
    apim: &M,
    pid: &str,
    format: XmlFormat,
    context: ExportContext,
) -> Result<Vec<u8>, ComponentError>
where
    M: ObjectManagement + ?Sized,
{
    info!(pid, format = %format, context = %context, "Exporting object");
    let xml = apim.export(pid, format, context).await?;
    info!(pid, bytes = xml.len(), "Exported object");
    Ok(xml)
}

pub async fn fetch_object_xml<M>(apim: &M, pid: &str) -> Result<Vec<u8>, ComponentError>
where
    M: ObjectManagement + ?Sized,
{
    info!(pid, "Fetching object XML");
    Ok(apim.object_xml(pid).await?)
}

/// Parse the textual `forced` flag: `true` or `false`, ignoring case.
pub fn parse_forced(value: &str) -> Result<bool, ComponentError> {
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(ComponentError::InvalidProperty {
            name: "forced",
            value: value.to_string(),
        })
    }
}

/// Purge an object. `forced` is validated before anything is sent.
pub async fn purge_object<M>(
    apim: &M,
    pid: &str,
    log_message: &str,
    forced: &str,
) -> Result<String, ComponentError>
where
    M: ObjectManagement + ?Sized,
{
    let forced = parse_forced(forced)?;
    info!(pid, log_message, forced, "Purging object");
    let purged_at = apim.purge_object(pid, log_message, forced).await?;
    info!(pid, purged_at = %purged_at, "Purged object");
    Ok(purged_at)
}

/// A behaviour-method call on one part of an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisseminationRequest {
    pub pid: String,
    pub sdef_pid: String,
    pub method: String,
    /// Identifier of the object part, passed as the `xmlid` parameter.
    pub part_id: String,
}

pub async fn disseminate<A>(
    apia: &A,
    request: &DisseminationRequest,
) -> Result<MimeTypedStream, ComponentError>
where
    A: ObjectAccess + ?Sized,
{
    info!(
        pid = %request.pid,
        sdef = %request.sdef_pid,
        method = %request.method,
        part = %request.part_id,
        "Requesting dissemination"
    );
    let params = vec![("xmlid".to_string(), request.part_id.clone())];
    let stream = apia
        .dissemination(&request.pid, &request.sdef_pid, &request.method, &params)
        .await?;
    info!(mime_type = %stream.mime_type, bytes = stream.content.len(), "Received dissemination");
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_uri_prefixes_bare_pids_only() {
        assert_eq!(to_object_uri("monk:collections"), "info:fedora/monk:collections");
        assert_eq!(to_object_uri("info:fedora/demo:1"), "info:fedora/demo:1");
    }

    #[test]
    fn membership_query_uses_predicate_and_object() {
        assert_eq!(
            membership_query("info:fedora/rel#isMemberOf", "info:fedora/demo:1"),
            "select $s from <#ri> where $s <info:fedora/rel#isMemberOf> <info:fedora/demo:1>;"
        );
    }

    #[test]
    fn forced_flag_accepts_only_booleans() {
        assert!(parse_forced("TRUE").unwrap());
        assert!(!parse_forced("False").unwrap());
        assert!(matches!(
            parse_forced("yes"),
            Err(ComponentError::InvalidProperty { name: "forced", .. })
        ));
    }
}
