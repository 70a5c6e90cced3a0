//! # Fedora REST client
//!
//! [`FedoraClient`] is the concrete implementation of the traits in
//! [`fedora_components_core::contract`] used by the CLI. It talks to the repository's
//! REST API (`/objects`, `/risearch`) with `reqwest`.
//!
//! - Construct it from a [`RepositoryConfig`]; credentials are sent as basic auth when
//!   a password is configured.
//! - Search results are requested as XML and decoded with `quick-xml`.
//! - Every failure is mapped to a [`RepositoryError`]; nothing is retried.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;

use fedora_components_core::config::RepositoryConfig;
use fedora_components_core::contract::{
    ExportContext, FieldSearchQuery, ListSession, MimeTypedStream, ObjectAccess,
    ObjectManagement, ObjectRecord, ObjectSearch, ResourceIndex, ResultPage, XmlFormat,
};
use fedora_components_core::RepositoryError;

pub struct FedoraClient {
    http: Client,
    base: Url,
    base_url: String,
    user: String,
    password: Option<String>,
}

impl FedoraClient {
    pub fn new(config: &RepositoryConfig) -> Result<Self, RepositoryError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RepositoryError::Config(format!("failed to build HTTP client: {e}")))?;
        tracing::info!(
            base_url = %config.base_url(),
            user = %config.user,
            authenticated = config.password.is_some(),
            "Initialized FedoraClient"
        );
        let base_url = config.base_url();
        let base = Url::parse(&base_url)
            .map_err(|e| RepositoryError::Config(format!("invalid base URL {base_url}: {e}")))?;
        Ok(FedoraClient {
            http,
            base,
            base_url,
            user: config.user.clone(),
            password: config.password.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// `{base}/objects/{pid}/{tail..}` with every segment percent-encoded.
    fn object_url(&self, pid: &str, tail: &[&str]) -> Result<String, RepositoryError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| {
                RepositoryError::Config(format!("base URL {} cannot carry a path", self.base))
            })?
            .pop_if_empty()
            .push("objects")
            .push(pid)
            .extend(tail);
        Ok(url.to_string())
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.password {
            Some(password) => request.basic_auth(&self.user, Some(password)),
            None => request,
        }
    }

    /// Send the request and turn transport errors and non-success statuses into
    /// [`RepositoryError`]s.
    async fn send(&self, url: &str, request: RequestBuilder) -> Result<Response, RepositoryError> {
        let response = self.authorize(request).send().await.map_err(|e| {
            tracing::error!(error = ?e, url = %url, "Request to repository failed");
            RepositoryError::transport(url, e)
        })?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
        tracing::error!(status = %status, url = %url, body = %body, "Repository returned error");
        Err(RepositoryError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        })
    }

    async fn bytes(url: &str, response: Response) -> Result<Vec<u8>, RepositoryError> {
        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| RepositoryError::transport(url, e))
    }

    async fn text(url: &str, response: Response) -> Result<String, RepositoryError> {
        response
            .text()
            .await
            .map_err(|e| RepositoryError::transport(url, e))
    }

    async fn search_page(
        &self,
        url: &str,
        request: RequestBuilder,
    ) -> Result<ResultPage, RepositoryError> {
        let response = self.send(url, request).await?;
        let body = Self::text(url, response).await?;
        let page = parse_find_objects(&body)?;
        tracing::debug!(
            url = %url,
            records = page.records.len(),
            has_token = page.token().is_some(),
            "Fetched search page"
        );
        Ok(page)
    }
}

#[async_trait]
impl ObjectSearch for FedoraClient {
    async fn find_objects(&self, query: &FieldSearchQuery) -> Result<ResultPage, RepositoryError> {
        let url = self.url("/objects");
        tracing::info!(terms = %query.terms, max_results = query.max_results, "Searching objects");
        let max_results = query.max_results.to_string();
        let request = self.http.get(&url).query(&[
            ("terms", query.terms.as_str()),
            ("pid", "true"),
            ("title", "true"),
            ("maxResults", max_results.as_str()),
            ("resultFormat", "xml"),
        ]);
        self.search_page(&url, request).await
    }

    async fn resume_find_objects(&self, token: &str) -> Result<ResultPage, RepositoryError> {
        let url = self.url("/objects");
        tracing::debug!(token, "Resuming object search");
        let request = self.http.get(&url).query(&[
            ("sessionToken", token),
            ("pid", "true"),
            ("title", "true"),
            ("resultFormat", "xml"),
        ]);
        match self.search_page(&url, request).await {
            Err(RepositoryError::Status { status, body, .. })
                if is_token_rejection(StatusCode::from_u16(status).ok()) =>
            {
                Err(RepositoryError::InvalidToken {
                    token: token.to_string(),
                    reason: format!("HTTP {status}: {body}"),
                })
            }
            other => other,
        }
    }
}

#[async_trait]
impl ObjectManagement for FedoraClient {
    async fn ingest(
        &self,
        content: Vec<u8>,
        format: XmlFormat,
        log_message: &str,
    ) -> Result<String, RepositoryError> {
        let url = self.url("/objects/new");
        tracing::info!(bytes = content.len(), format = %format, "Uploading object for ingest");
        let request = self
            .http
            .post(&url)
            .query(&[("format", format.as_uri()), ("logMessage", log_message)])
            .header(reqwest::header::CONTENT_TYPE, "text/xml")
            .body(content);
        let response = self.send(&url, request).await?;
        let pid = Self::text(&url, response).await?.trim().to_string();
        if pid.is_empty() {
            return Err(RepositoryError::Malformed(
                "ingest response did not contain a PID".into(),
            ));
        }
        Ok(pid)
    }

    async fn export(
        &self,
        pid: &str,
        format: XmlFormat,
        context: ExportContext,
    ) -> Result<Vec<u8>, RepositoryError> {
        let url = self.object_url(pid, &["export"])?;
        let request = self
            .http
            .get(&url)
            .query(&[("format", format.as_uri()), ("context", context.as_str())]);
        let response = self.send(&url, request).await?;
        Self::bytes(&url, response).await
    }

    async fn object_xml(&self, pid: &str) -> Result<Vec<u8>, RepositoryError> {
        let url = self.object_url(pid, &["objectXML"])?;
        let response = self.send(&url, self.http.get(&url)).await?;
        Self::bytes(&url, response).await
    }

    async fn purge_object(
        &self,
        pid: &str,
        log_message: &str,
        forced: bool,
    ) -> Result<String, RepositoryError> {
        let url = self.object_url(pid, &[])?;
        // The REST API has no forced purge; the flag is only recorded.
        tracing::info!(pid, forced, "Sending purge request");
        let request = self.http.delete(&url).query(&[("logMessage", log_message)]);
        let response = self.send(&url, request).await?;
        let date_header = response
            .headers()
            .get(reqwest::header::DATE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = Self::text(&url, response).await?;
        let body = body.trim();
        if !body.is_empty() {
            return Ok(body.to_string());
        }
        date_header.ok_or_else(|| {
            RepositoryError::Malformed("purge response carried neither body nor Date header".into())
        })
    }
}

#[async_trait]
impl ObjectAccess for FedoraClient {
    async fn dissemination(
        &self,
        pid: &str,
        sdef_pid: &str,
        method: &str,
        params: &[(String, String)],
    ) -> Result<MimeTypedStream, RepositoryError> {
        let url = self.object_url(pid, &["methods", sdef_pid, method])?;
        let response = self.send(&url, self.http.get(&url).query(params)).await?;
        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let content = Self::bytes(&url, response).await?;
        Ok(MimeTypedStream { mime_type, content })
    }
}

#[async_trait]
impl ResourceIndex for FedoraClient {
    async fn tuples(&self, itql_query: &str) -> Result<Vec<Vec<String>>, RepositoryError> {
        let url = self.url("/risearch");
        let request = self.http.get(&url).query(&[
            ("type", "tuples"),
            ("lang", "itql"),
            ("format", "CSV"),
            ("flush", "true"),
            ("query", itql_query),
        ]);
        let response = self.send(&url, request).await?;
        let body = Self::text(&url, response).await?;
        parse_tuples_csv(&body)
    }
}

fn is_token_rejection(status: Option<StatusCode>) -> bool {
    matches!(
        status,
        Some(StatusCode::BAD_REQUEST) | Some(StatusCode::NOT_FOUND) | Some(StatusCode::GONE)
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FindObjectsXml {
    #[serde(default)]
    list_session: Option<ListSessionXml>,
    #[serde(default)]
    result_list: Option<ResultListXml>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListSessionXml {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    cursor: Option<u64>,
    #[serde(default)]
    complete_list_size: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ResultListXml {
    #[serde(rename = "objectFields", default)]
    object_fields: Vec<ObjectFieldsXml>,
}

#[derive(Debug, Deserialize)]
struct ObjectFieldsXml {
    #[serde(default)]
    pid: Option<String>,
    #[serde(default)]
    title: Vec<String>,
}

/// Decode a `resultFormat=xml` search response.
pub fn parse_find_objects(xml: &str) -> Result<ResultPage, RepositoryError> {
    let parsed: FindObjectsXml = quick_xml::de::from_str(xml)
        .map_err(|e| RepositoryError::Malformed(format!("failed to parse search result XML: {e}")))?;

    let records = parsed
        .result_list
        .unwrap_or_default()
        .object_fields
        .into_iter()
        .map(|fields| {
            let pid = fields
                .pid
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .ok_or_else(|| {
                    RepositoryError::Malformed("search result object without a pid".into())
                })?;
            let title = fields.title.into_iter().next().unwrap_or_default();
            Ok(ObjectRecord::new(pid, title))
        })
        .collect::<Result<Vec<_>, RepositoryError>>()?;

    let session = parsed.list_session.and_then(|s| {
        let token = s.token?.trim().to_string();
        if token.is_empty() {
            return None;
        }
        Some(ListSession {
            token,
            cursor: s.cursor,
            complete_list_size: s.complete_list_size,
        })
    });

    Ok(ResultPage { records, session })
}

/// Decode resource-index CSV output: a header row, then one tuple per record.
pub fn parse_tuples_csv(body: &str) -> Result<Vec<Vec<String>>, RepositoryError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());
    reader
        .records()
        .map(|record| {
            record
                .map(|r| r.iter().map(str::to_string).collect())
                .map_err(|e| RepositoryError::Malformed(format!("failed to parse tuple CSV: {e}")))
        })
        .collect()
}
