// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client for the issue tracker proxy.
//!
//! The proxy exposes two endpoints:
//!
//! | Method | Path                    | Body             |
//! |--------|-------------------------|------------------|
//! | GET    | `/issues`               |                  |
//! | POST   | `/issues/{key}/comment` | `{"body": text}` |
//!
//! Failures come back as `{"error": message}` with a non-2xx status.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use tb_core::{export, Card, ParentIssue};

use crate::error::{Error, Result};
use crate::store::StoreFuture;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Contract of the issue tracker proxy.
pub trait IssueTracker: Send + Sync + 'static {
    /// Issues currently under test.
    fn list_issues(&self) -> StoreFuture<'_, Vec<ParentIssue>>;

    /// Adds a plain-text comment to an issue.
    fn post_comment<'a>(&'a self, issue_key: &'a str, text: &'a str) -> StoreFuture<'a, ()>;
}

#[derive(Serialize)]
struct CommentRequest<'a> {
    body: &'a str,
}

#[derive(Deserialize)]
struct ProxyError {
    error: String,
}

pub fn issues_url(base_url: &str) -> String {
    format!("{}/issues", base_url.trim_end_matches('/'))
}

pub fn comment_url(base_url: &str, issue_key: &str) -> String {
    format!("{}/issues/{issue_key}/comment", base_url.trim_end_matches('/'))
}

/// Human-readable body of a failed proxy response: the `error` field when
/// the body is the proxy's JSON error, the raw text otherwise.
pub fn error_message(body: &str) -> String {
    match serde_json::from_str::<ProxyError>(body) {
        Ok(proxy) => proxy.error,
        Err(_) => body.trim().to_string(),
    }
}

/// Issue tracker proxy reached over HTTP.
pub struct HttpTracker {
    client: Client,
    base_url: String,
}

impl HttpTracker {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(HttpTracker {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn unreachable(err: reqwest::Error) -> Error {
    Error::TrackerUnreachable(err.to_string())
}

/// Passes 2xx responses through and turns anything else into `Remote`.
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::Remote {
        status: status.as_u16(),
        body: error_message(&body),
    })
}

impl IssueTracker for HttpTracker {
    fn list_issues(&self) -> StoreFuture<'_, Vec<ParentIssue>> {
        Box::pin(async move {
            let url = issues_url(&self.base_url);
            let response = self.client.get(&url).send().await.map_err(unreachable)?;
            let issues: Vec<ParentIssue> = check(response)
                .await?
                .json()
                .await
                .map_err(unreachable)?;
            debug!(count = issues.len(), "issues loaded");
            Ok(issues)
        })
    }

    fn post_comment<'a>(&'a self, issue_key: &'a str, text: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let url = comment_url(&self.base_url, issue_key);
            let response = self
                .client
                .post(&url)
                .json(&CommentRequest { body: text })
                .send()
                .await
                .map_err(unreachable)?;
            check(response).await?;
            Ok(())
        })
    }
}

/// Renders the report for one issue's cards and posts it as a comment.
///
/// Returns the posted text.
pub async fn export_to_tracker<T>(tracker: &T, issue_key: &str, cards: &[Card]) -> Result<String>
where
    T: IssueTracker + ?Sized,
{
    let report = export::render(cards);
    tracker.post_comment(issue_key, &report).await?;
    info!(issue = issue_key, cards = cards.len(), "test results exported");
    Ok(report)
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;
