// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use reportview_app::ReportDescriptor;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tiny_http::{Header, Request, Response, Server};

const ENCOUNTERS: [(&str, &str, &str); 3] = [
    (
        "e1",
        "Encounter 1",
        "Score: 9/10\n\nStrengths:\n- Clear history taking\n- Good rapport\n",
    ),
    (
        "e2",
        "Encounter 2",
        "Score: 6/10\n\nAreas to improve:\n- Summarize before closing\n",
    ),
    (
        "e3",
        "Encounter 3 (retake)",
        "Score: 8/10\n\nNotes:\n  indented line kept verbatim\n\ttab too\n",
    ),
];

pub fn sample_index() -> Vec<ReportDescriptor> {
    ENCOUNTERS
        .iter()
        .map(|(id, label, _)| ReportDescriptor::new(id, label, &format!("reports/{id}.txt")))
        .collect()
}

pub fn sample_index_json() -> Result<String> {
    serde_json::to_string_pretty(&sample_index()).context("encode sample index")
}

pub fn sample_report(id: &str) -> Option<&'static str> {
    ENCOUNTERS
        .iter()
        .find(|(candidate, _, _)| *candidate == id)
        .map(|(_, _, body)| *body)
}

/// Index plus one text route per encounter, all under `prefix`
/// (empty, or ending in `/`).
pub fn sample_routes(prefix: &str) -> Result<Vec<Route>> {
    let mut routes = vec![Route::json(
        &format!("/{prefix}reports/index.json"),
        &sample_index_json()?,
    )];
    for (id, _, body) in ENCOUNTERS {
        routes.push(Route::text(&format!("/{prefix}reports/{id}.txt"), body));
    }
    Ok(routes)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: String,
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
    pub delay: Duration,
}

impl Route {
    pub fn text(path: &str, body: &str) -> Self {
        Self {
            path: path.to_owned(),
            status: 200,
            content_type: "text/plain; charset=utf-8",
            body: body.to_owned(),
            delay: Duration::ZERO,
        }
    }

    pub fn json(path: &str, body: &str) -> Self {
        Self {
            content_type: "application/json",
            ..Self::text(path, body)
        }
    }

    pub fn status(path: &str, status: u16, body: &str) -> Self {
        Self {
            status,
            ..Self::text(path, body)
        }
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        Self { delay, ..self }
    }
}

/// Static file server on an ephemeral localhost port. Unknown paths get a
/// 404. The server thread stops when the value is dropped.
pub struct ReportServer {
    server: Arc<Server>,
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    handle: Option<JoinHandle<()>>,
}

impl ReportServer {
    pub fn start(routes: Vec<Route>) -> Result<Self> {
        let server = Server::http("127.0.0.1:0")
            .map_err(|error| anyhow!("start report server: {error}"))?;
        let server = Arc::new(server);
        let base_url = format!("http://{}/", server.server_addr());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let worker = Arc::clone(&server);
        let log = Arc::clone(&requests);
        let handle = thread::spawn(move || {
            for request in worker.incoming_requests() {
                if let Ok(mut seen) = log.lock() {
                    seen.push(request.url().to_owned());
                }
                respond(request, &routes);
            }
        });

        Ok(Self {
            server,
            base_url,
            requests,
            handle: Some(handle),
        })
    }

    pub fn sample() -> Result<Self> {
        Self::start(sample_routes("")?)
    }

    /// Root URL with a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn requests(&self) -> Vec<String> {
        match self.requests.lock() {
            Ok(seen) => seen.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Drop for ReportServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn respond(request: Request, routes: &[Route]) {
    let path = request.url().split('?').next().unwrap_or_default().to_owned();
    let Some(route) = routes.iter().find(|route| route.path == path) else {
        let _ = request.respond(Response::from_string("not found").with_status_code(404));
        return;
    };

    if !route.delay.is_zero() {
        thread::sleep(route.delay);
    }

    let mut response = Response::from_string(route.body.clone()).with_status_code(route.status);
    if let Ok(header) = Header::from_bytes("Content-Type", route.content_type) {
        response = response.with_header(header);
    }
    let _ = request.respond(response);
}
