// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use reportview_app::{INDEX_PATH, ReportDescriptor};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, Response};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = normalize_base_url(base_url)?;
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves a report path against the base the way a relative asset
    /// path is resolved against a deployment prefix.
    pub fn resolve(&self, path: &str) -> Result<Url> {
        let relative = path.trim_start_matches('/');
        if relative.trim().is_empty() {
            bail!("report path is empty; check the index entry's `path` field");
        }
        self.base_url
            .join(relative)
            .with_context(|| format!("resolve report path {path:?} against {}", self.base_url))
    }

    pub fn index_url(&self) -> Result<Url> {
        self.resolve(INDEX_PATH)
    }

    pub fn fetch_index(&self) -> Result<Vec<ReportDescriptor>> {
        let url = self.index_url()?;
        let response = self.get(&url)?;
        let body = response.text().context("read report index body")?;
        let reports: Vec<ReportDescriptor> = serde_json::from_str(&body)
            .with_context(|| format!("decode report index from {url}"))?;
        debug!(%url, count = reports.len(), "report index decoded");
        Ok(reports)
    }

    /// Any received response is report text, whatever its status; only
    /// transport and read errors fail.
    pub fn fetch_report(&self, descriptor: &ReportDescriptor) -> Result<String> {
        let url = self.resolve(&descriptor.path)?;
        let response = self.send(&url)?;
        let status = response.status();
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "report served with error status");
        }
        let content = response
            .text()
            .with_context(|| format!("read report body from {url}"))?;
        debug!(%url, id = %descriptor.id, bytes = content.len(), "report fetched");
        Ok(content)
    }

    fn send(&self, url: &Url) -> Result<Response> {
        debug!(%url, "GET");
        self.http
            .get(url.clone())
            .send()
            .map_err(|error| connection_error(url, error))
    }

    fn get(&self, url: &Url) -> Result<Response> {
        let response = self.send(url)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(url, status, &body));
        }
        Ok(response)
    }
}

pub fn normalize_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("source.base_url must not be empty");
    }

    let mut url = Url::parse(trimmed).with_context(|| {
        format!("source.base_url {trimmed:?} is not an absolute URL (for example http://localhost:8080/)")
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!(
            "source.base_url {trimmed:?} uses scheme {:?}; only http and https are supported",
            url.scheme()
        );
    }
    if url.cannot_be_a_base() {
        bail!("source.base_url {trimmed:?} cannot be used as a base URL");
    }

    url.set_query(None);
    url.set_fragment(None);
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn connection_error(url: &Url, error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!("request to {url} timed out -- raise [source].timeout or check the server");
    }
    anyhow!("cannot reach {url} -- check [source].base_url and that the server is up ({error})")
}

fn clean_error_response(url: &Url, status: StatusCode, body: &str) -> anyhow::Error {
    let body = body.trim();
    if !body.is_empty() && body.len() < 100 && !body.contains('<') {
        return anyhow!("server error ({}) for {url}: {body}", status.as_u16());
    }
    anyhow!("server returned {} for {url}", status.as_u16())
}
