// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::host::{self, Clipboard, HostCommand};
use anyhow::{Context, Result};
use reportview_app::{ReportDescriptor, RequestId};
use reportview_fetch::Client;
use reportview_tui::{InternalEvent, ViewerRuntime};
use std::sync::mpsc::Sender;
use std::thread;

/// Network fetches plus host clipboard and print helpers. Loads run on
/// short-lived worker threads; copies and prints run inline.
pub struct HostRuntime {
    client: Client,
    clipboard: Clipboard,
    print: HostCommand,
}

impl HostRuntime {
    pub fn new(client: Client, clipboard: Clipboard, print: HostCommand) -> Self {
        Self {
            client,
            clipboard,
            print,
        }
    }
}

impl ViewerRuntime for HostRuntime {
    fn load_index(&mut self) -> Result<Vec<ReportDescriptor>> {
        self.client.fetch_index()
    }

    fn load_report(&mut self, descriptor: &ReportDescriptor) -> Result<String> {
        self.client.fetch_report(descriptor)
    }

    fn copy_text(&mut self, text: &str) -> Result<()> {
        self.clipboard.set_text(text)
    }

    fn print_report(&mut self, title: &str, content: &str) -> Result<()> {
        self.print
            .run_with_input(&host::print_document(title, content))
    }

    fn spawn_index_load(&mut self, tx: Sender<InternalEvent>) -> Result<()> {
        let client = self.client.clone();
        thread::Builder::new()
            .name("reportview-index".to_owned())
            .spawn(move || {
                let _ = tx.send(InternalEvent::from_index_result(client.fetch_index()));
            })
            .context("spawn index loader")?;
        Ok(())
    }

    fn spawn_report_load(
        &mut self,
        request_id: RequestId,
        descriptor: &ReportDescriptor,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let client = self.client.clone();
        let descriptor = descriptor.clone();
        thread::Builder::new()
            .name(format!("reportview-report-{}", request_id.get()))
            .spawn(move || {
                let result = client.fetch_report(&descriptor);
                let _ = tx.send(InternalEvent::from_report_result(request_id, result));
            })
            .context("spawn report loader")?;
        Ok(())
    }
}
