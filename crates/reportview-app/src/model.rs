// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Deserializer, Serialize};

use crate::ids::ReportId;

pub const INDEX_PATH: &str = "reports/index.json";

/// One selectable report as listed in the index. Fields absent from (or
/// null in) an index entry decode as empty strings rather than failing the
/// whole index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDescriptor {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: ReportId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,
}

impl ReportDescriptor {
    pub fn new(id: &str, label: &str, path: &str) -> Self {
        Self {
            id: ReportId::new(id),
            label: label.to_owned(),
            path: path.to_owned(),
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewError {
    IndexLoad,
    ReportLoad,
    Clipboard,
}

impl ViewError {
    pub const fn message(self) -> &'static str {
        match self {
            Self::IndexLoad => "Failed to load report list",
            Self::ReportLoad => "Failed to load report",
            Self::Clipboard => "Failed to copy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    Loading,
    Loaded,
    Errored,
}

impl LoadPhase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::Errored => "errored",
        }
    }
}

/// How report responses that overlap a newer selection are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StalePolicy {
    /// Every response is applied in arrival order.
    #[default]
    LastResponseWins,
    /// Only the response to the most recently issued request is applied.
    LatestRequestOnly,
}

impl StalePolicy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LastResponseWins => "last_response_wins",
            Self::LatestRequestOnly => "latest_request_only",
        }
    }

    pub const fn from_discard_flag(discard_stale: bool) -> Self {
        if discard_stale {
            Self::LatestRequestOnly
        } else {
            Self::LastResponseWins
        }
    }
}
