//! Paginated object collection.
//!
//! [`collect_objects`] drains a field search into a single ordered list: it issues
//! the initial search, then follows the session token page by page until the
//! repository signals the end of the result stream.
//!
//! # Termination
//! The loop stops at the first page that is empty or carries no token. An empty
//! page that still has a token ends the run as well, so a server that keeps
//! handing out tokens for empty pages cannot keep the loop alive.
//!
//! # Errors
//! Any failure of the search capability aborts the run. Records gathered from
//! earlier pages are dropped and the caller receives only the [`CollectError`].
//! No retry is attempted here.

use tracing::{debug, error, info};

use crate::contract::{FieldSearchQuery, ObjectRecord, ObjectSearch, ResultPage};
use crate::error::{CollectError, RepositoryError};

/// Collect every record matching `query`, keeping only PIDs that start with
/// `pid_prefix` when one is given (case-sensitive).
///
/// Records keep the order in which the repository returned them; duplicates are
/// passed through.
pub async fn collect_objects<S>(
    search: &S,
    query: &FieldSearchQuery,
    pid_prefix: Option<&str>,
) -> Result<Vec<ObjectRecord>, CollectError>
where
    S: ObjectSearch + ?Sized,
{
    info!(terms = %query.terms, max_results = query.max_results, pid_prefix, "[COLLECT] Starting object search");

    let mut records = Vec::new();
    let mut page_number = 1;
    let mut page = search.find_objects(query).await.map_err(|e| {
        error!(error = %e, page = page_number, "[COLLECT][ERROR] Initial search failed");
        CollectError::SearchFailure {
            page: page_number,
            source: e,
        }
    })?;

    loop {
        let fetched = page.records.len();
        let ResultPage {
            records: page_records,
            session,
        } = page;
        let kept_before = records.len();
        records.extend(
            page_records
                .into_iter()
                .filter(|r| pid_prefix.map_or(true, |prefix| r.pid().starts_with(prefix))),
        );
        debug!(
            page = page_number,
            fetched,
            kept = records.len() - kept_before,
            cursor = session.as_ref().and_then(|s| s.cursor),
            complete_list_size = session.as_ref().and_then(|s| s.complete_list_size),
            "[COLLECT] Accumulated page"
        );

        if fetched == 0 {
            break;
        }
        let token = match session.map(|s| s.token).filter(|t| !t.trim().is_empty()) {
            Some(token) => token,
            None => break,
        };

        page_number += 1;
        let next = search.resume_find_objects(&token).await;
        page = next.map_err(|e| resume_failed(e, page_number, token))?;
    }

    info!(
        pages = page_number,
        records = records.len(),
        "[COLLECT] Object search complete"
    );
    Ok(records)
}

fn resume_failed(source: RepositoryError, page: usize, token: String) -> CollectError {
    error!(error = %source, page, token = %token, "[COLLECT][ERROR] Resuming search failed");
    match source {
        RepositoryError::InvalidToken { .. } => CollectError::InvalidToken {
            page,
            token,
            source,
        },
        source => CollectError::SearchFailure { page, source },
    }
}
