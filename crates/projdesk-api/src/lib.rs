// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use projdesk_app::{Project, ProjectDraft, ProjectId};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const COLLECTION: &str = "projects";

#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            bail!("api.base_url must not be empty");
        }
        let base_url = Url::parse(trimmed)
            .with_context(|| format!("api.base_url {trimmed:?} is not a valid URL"))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            bail!(
                "api.base_url {trimmed:?} must use http or https, got {}",
                base_url.scheme()
            );
        }
        if base_url.cannot_be_a_base() {
            bail!("api.base_url {trimmed:?} cannot be used as a base URL");
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn fetch_projects(&self) -> Result<Vec<Project>> {
        let url = self.endpoint(None)?;
        debug!(%url, "fetching projects");
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|error| connection_error(self.base_url(), error))?;
        let response = check_status(response)?;
        let projects: Vec<Project> = response.json().context("decode project list")?;
        debug!(count = projects.len(), "fetched projects");
        Ok(projects)
    }

    pub fn update_project(&self, project: &Project) -> Result<Project> {
        let url = self.endpoint(Some(project.id))?;
        debug!(%url, id = %project.id, "updating project");
        let response = self
            .http
            .put(url)
            .json(project)
            .send()
            .map_err(|error| connection_error(self.base_url(), error))?;
        let response = check_status(response)?;
        let echoed: Option<Project> = decode_optional_body(response, "decode project")?;
        Ok(echoed.unwrap_or_else(|| project.clone()))
    }

    pub fn create_project(&self, draft: &ProjectDraft) -> Result<Project> {
        let url = self.endpoint(None)?;
        debug!(%url, "creating project");
        let response = self
            .http
            .post(url)
            .json(draft)
            .send()
            .map_err(|error| connection_error(self.base_url(), error))?;
        let response = check_status(response)?;
        decode_optional_body(response, "decode project")?
            .ok_or_else(|| anyhow!("server accepted the project but did not return its id"))
    }

    pub fn delete_project(&self, id: ProjectId) -> Result<()> {
        let url = self.endpoint(Some(id))?;
        debug!(%url, %id, "deleting project");
        let response = self
            .http
            .delete(url)
            .send()
            .map_err(|error| connection_error(self.base_url(), error))?;
        check_status(response)?;
        Ok(())
    }

    pub fn ping(&self) -> Result<()> {
        self.fetch_projects().map(|_| ())
    }

    fn endpoint(&self, id: Option<ProjectId>) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| anyhow!("api.base_url cannot carry a path"))?;
            segments.pop_if_empty().push(COLLECTION);
            if let Some(id) = id {
                segments.push(&id.to_string());
            }
        }
        Ok(url)
    }
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    let error = clean_error_response(status, &body);
    warn!(status = status.as_u16(), "{error}");
    Err(error)
}

fn decode_optional_body<T: DeserializeOwned>(
    response: Response,
    context: &'static str,
) -> Result<Option<T>> {
    let body = response.text().context(context)?;
    if body.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&body).map(Some).context(context)
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    warn!(%base_url, %error, "api unreachable");
    anyhow!(
        "cannot reach {} -- check [api].base_url and that the server is running ({})",
        base_url,
        error
    )
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(message) = parsed.error.or(parsed.message)
        && !message.is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), message);
    }

    if !body.is_empty() && body.len() < 100 && !body.contains('{') {
        return anyhow!("server error ({}): {}", status.as_u16(), body.trim());
    }

    anyhow!("server returned {}", status.as_u16())
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<String>,
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{Client, clean_error_response};
    use anyhow::Result;
    use projdesk_app::ProjectId;
    use reqwest::StatusCode;
    use std::time::Duration;

    #[test]
    fn new_trims_trailing_slashes() -> Result<()> {
        let client = Client::new("http://localhost:3000///", Duration::from_secs(1))?;
        assert_eq!(client.base_url(), "http://localhost:3000");
        assert_eq!(client.timeout(), Duration::from_secs(1));
        Ok(())
    }

    #[test]
    fn new_rejects_empty_and_non_http_urls() {
        assert!(Client::new("  ", Duration::from_secs(1)).is_err());
        let error = Client::new("ftp://files.example", Duration::from_secs(1))
            .expect_err("ftp should be rejected");
        assert!(error.to_string().contains("http or https"));
        assert!(Client::new("not a url", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn endpoints_append_collection_and_id() -> Result<()> {
        let client = Client::new("http://localhost:3000/api/v1/", Duration::from_secs(1))?;
        assert_eq!(
            client.endpoint(None)?.as_str(),
            "http://localhost:3000/api/v1/projects"
        );
        assert_eq!(
            client.endpoint(Some(ProjectId::new(42)))?.as_str(),
            "http://localhost:3000/api/v1/projects/42"
        );

        let bare = Client::new("http://localhost:3000", Duration::from_secs(1))?;
        assert_eq!(
            bare.endpoint(None)?.as_str(),
            "http://localhost:3000/projects"
        );
        Ok(())
    }

    #[test]
    fn error_envelopes_are_unwrapped() {
        let error = clean_error_response(StatusCode::NOT_FOUND, r#"{"error":"no such project"}"#);
        assert_eq!(error.to_string(), "server error (404): no such project");

        let error = clean_error_response(StatusCode::BAD_REQUEST, r#"{"message":"rate required"}"#);
        assert_eq!(error.to_string(), "server error (400): rate required");
    }

    #[test]
    fn short_plain_bodies_are_shown_and_long_ones_are_not() {
        let error = clean_error_response(StatusCode::BAD_GATEWAY, "upstream down\n");
        assert_eq!(error.to_string(), "server error (502): upstream down");

        let long = "x".repeat(400);
        let error = clean_error_response(StatusCode::INTERNAL_SERVER_ERROR, &long);
        assert_eq!(error.to_string(), "server returned 500");

        let error = clean_error_response(StatusCode::INTERNAL_SERVER_ERROR, "");
        assert_eq!(error.to_string(), "server returned 500");
    }
}
