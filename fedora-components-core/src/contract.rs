//! # contract: capability interfaces to a Fedora repository
//!
//! This module defines the traits through which every component reaches the
//! repository, and the plain data types that cross them.
//!
//! - [`ObjectSearch`]: field search with session-token paging.
//! - [`ObjectManagement`]: ingest, export, object XML, purge.
//! - [`ObjectAccess`]: behaviour-method disseminations.
//! - [`ResourceIndex`]: iTQL tuple queries against the resource index.
//!
//! All methods are async and return [`RepositoryError`]. The traits are annotated
//! for `mockall`, so consumers get `MockObjectSearch` etc. for tests.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::error::RepositoryError;

/// Default page size requested from the repository.
pub const DEFAULT_MAX_RESULTS: u32 = 10_000;

/// One object in a search result: its PID and display title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pid: String,
    title: String,
}

impl ObjectRecord {
    pub fn new(pid: impl Into<String>, title: impl Into<String>) -> Self {
        ObjectRecord {
            pid: pid.into(),
            title: title.into(),
        }
    }

    pub fn pid(&self) -> &str {
        &self.pid
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

/// Paging state handed back with a result page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSession {
    pub token: String,
    pub cursor: Option<u64>,
    pub complete_list_size: Option<u64>,
}

/// A bounded page of search results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultPage {
    pub records: Vec<ObjectRecord>,
    pub session: Option<ListSession>,
}

impl ResultPage {
    /// Final page: no continuation.
    pub fn last(records: Vec<ObjectRecord>) -> Self {
        ResultPage {
            records,
            session: None,
        }
    }

    /// Page followed by more results reachable through `token`.
    pub fn with_token(records: Vec<ObjectRecord>, token: impl Into<String>) -> Self {
        ResultPage {
            records,
            session: Some(ListSession {
                token: token.into(),
                cursor: None,
                complete_list_size: None,
            }),
        }
    }

    /// The continuation token, if this page has one. An empty token counts as none.
    pub fn token(&self) -> Option<&str> {
        self.session
            .as_ref()
            .map(|s| s.token.as_str())
            .filter(|t| !t.trim().is_empty())
    }
}

/// Field search request. Result fields are always `pid` and `title`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSearchQuery {
    /// Search terms, e.g. `monk:collection-*` or `*`.
    pub terms: String,
    pub max_results: u32,
}

impl FieldSearchQuery {
    pub fn terms(terms: impl Into<String>) -> Self {
        FieldSearchQuery {
            terms: terms.into(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }
}

/// Serialization formats understood by ingest and export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum XmlFormat {
    #[default]
    Foxml,
    Mets,
}

impl XmlFormat {
    /// Format identifier as the repository expects it.
    pub fn as_uri(&self) -> &'static str {
        match self {
            XmlFormat::Foxml => "info:fedora/fedora-system:FOXML-1.1",
            XmlFormat::Mets => "metslikefedora1",
        }
    }
}

impl FromStr for XmlFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("foxml") || s == XmlFormat::Foxml.as_uri() {
            Ok(XmlFormat::Foxml)
        } else if s.eq_ignore_ascii_case("mets") || s.eq_ignore_ascii_case(XmlFormat::Mets.as_uri())
        {
            Ok(XmlFormat::Mets)
        } else {
            Err(format!("unknown xml format `{s}` (expected foxml or mets)"))
        }
    }
}

impl fmt::Display for XmlFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_uri())
    }
}

/// Intended use of an exported object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportContext {
    /// Datastream content is referenced through public callback URLs.
    #[default]
    Public,
    /// Suitable for moving the object to another repository.
    Migrate,
    /// Standalone: content inlined, binaries base64-encoded.
    Archive,
}

impl ExportContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportContext::Public => "public",
            ExportContext::Migrate => "migrate",
            ExportContext::Archive => "archive",
        }
    }
}

impl FromStr for ExportContext {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(ExportContext::Public),
            "migrate" => Ok(ExportContext::Migrate),
            "archive" => Ok(ExportContext::Archive),
            other => Err(format!(
                "unknown export context `{other}` (expected public, migrate or archive)"
            )),
        }
    }
}

impl fmt::Display for ExportContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content returned by a dissemination, with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeTypedStream {
    pub mime_type: String,
    pub content: Vec<u8>,
}

/// Field search with session-token paging.
///
/// `find_objects` starts a search; when the returned page carries a token,
/// `resume_find_objects` fetches the following page. Each token is meant to be
/// used once.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ObjectSearch: Send + Sync {
    async fn find_objects(&self, query: &FieldSearchQuery) -> Result<ResultPage, RepositoryError>;

    async fn resume_find_objects(&self, token: &str) -> Result<ResultPage, RepositoryError>;
}

/// Management operations on repository objects.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ObjectManagement: Send + Sync {
    /// Ingest a serialized object. Returns the PID assigned by the repository.
    async fn ingest(
        &self,
        content: Vec<u8>,
        format: XmlFormat,
        log_message: &str,
    ) -> Result<String, RepositoryError>;

    async fn export(
        &self,
        pid: &str,
        format: XmlFormat,
        context: ExportContext,
    ) -> Result<Vec<u8>, RepositoryError>;

    /// The stored serialization of the object, as-is.
    async fn object_xml(&self, pid: &str) -> Result<Vec<u8>, RepositoryError>;

    /// Remove the object. Returns the purge timestamp reported by the repository.
    async fn purge_object(
        &self,
        pid: &str,
        log_message: &str,
        forced: bool,
    ) -> Result<String, RepositoryError>;
}

/// Read access to computed views of objects.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ObjectAccess: Send + Sync {
    async fn dissemination(
        &self,
        pid: &str,
        sdef_pid: &str,
        method: &str,
        params: &[(String, String)],
    ) -> Result<MimeTypedStream, RepositoryError>;
}

/// Resource index (RDF triple store) queries.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ResourceIndex: Send + Sync {
    /// Run an iTQL tuple query. Each row holds the bound values in column order.
    async fn tuples(&self, itql_query: &str) -> Result<Vec<Vec<String>>, RepositoryError>;
}
