// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{CopyToken, LoadPhase, ReportDescriptor, ReportId, RequestId, StalePolicy, ViewError};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewState {
    pub reports: Vec<ReportDescriptor>,
    pub selected_id: ReportId,
    pub report_content: String,
    pub loading: bool,
    pub error: String,
    pub copied: bool,
    pub stale_policy: StalePolicy,
    index_requested: bool,
    last_request: u64,
    latest_request: Option<RequestId>,
    copy_token: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCommand {
    Activate,
    ReloadIndex,
    IndexLoaded(Vec<ReportDescriptor>),
    IndexFailed,
    Select(ReportId),
    ReportLoaded {
        request_id: RequestId,
        content: String,
    },
    ReportFailed {
        request_id: RequestId,
    },
    Copy,
    CopySucceeded,
    CopyFailed,
    ResetCopied {
        token: CopyToken,
    },
    Print,
}

/// Outcomes of a dispatch. The `*Requested` and `CopyResetScheduled`
/// variants are effects the caller must carry out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    IndexRequested,
    ReportsReplaced(usize),
    SelectionChanged(ReportId),
    ContentCleared,
    ReportRequested {
        request_id: RequestId,
        descriptor: ReportDescriptor,
    },
    LoadingChanged(bool),
    ContentUpdated,
    StaleResponseDropped(RequestId),
    ErrorRaised(ViewError),
    ErrorCleared,
    CopyRequested(String),
    CopiedChanged(bool),
    CopyResetScheduled(CopyToken),
    PrintRequested {
        title: String,
        content: String,
    },
}

pub const FALLBACK_REPORT_LABEL: &str = "Report";

impl ViewState {
    pub fn with_policy(stale_policy: StalePolicy) -> Self {
        Self {
            stale_policy,
            ..Self::default()
        }
    }

    pub fn dispatch(&mut self, command: ViewCommand) -> Vec<ViewEvent> {
        match command {
            ViewCommand::Activate => {
                if self.index_requested {
                    return Vec::new();
                }
                self.index_requested = true;
                vec![ViewEvent::IndexRequested]
            }
            ViewCommand::ReloadIndex => {
                self.index_requested = true;
                vec![ViewEvent::IndexRequested]
            }
            ViewCommand::IndexLoaded(reports) => {
                self.reports = reports;
                let mut events = vec![ViewEvent::ReportsReplaced(self.reports.len())];
                if self.error == ViewError::IndexLoad.message() {
                    self.error.clear();
                    events.push(ViewEvent::ErrorCleared);
                }
                events
            }
            ViewCommand::IndexFailed => vec![self.raise(ViewError::IndexLoad)],
            ViewCommand::Select(new_id) => self.select(new_id),
            ViewCommand::ReportLoaded {
                request_id,
                content,
            } => {
                if !self.accepts(request_id) {
                    return vec![ViewEvent::StaleResponseDropped(request_id)];
                }
                self.report_content = content;
                self.loading = false;
                vec![ViewEvent::ContentUpdated, ViewEvent::LoadingChanged(false)]
            }
            ViewCommand::ReportFailed { request_id } => {
                if !self.accepts(request_id) {
                    return vec![ViewEvent::StaleResponseDropped(request_id)];
                }
                let raised = self.raise(ViewError::ReportLoad);
                self.loading = false;
                vec![raised, ViewEvent::LoadingChanged(false)]
            }
            ViewCommand::Copy => {
                if !self.has_content() {
                    return Vec::new();
                }
                vec![ViewEvent::CopyRequested(self.report_content.clone())]
            }
            ViewCommand::CopySucceeded => {
                self.copied = true;
                self.copy_token = self.copy_token.saturating_add(1);
                vec![
                    ViewEvent::CopiedChanged(true),
                    ViewEvent::CopyResetScheduled(CopyToken::new(self.copy_token)),
                ]
            }
            ViewCommand::CopyFailed => vec![self.raise(ViewError::Clipboard)],
            ViewCommand::ResetCopied { token } => {
                if token.get() != self.copy_token || !self.copied {
                    return Vec::new();
                }
                self.copied = false;
                vec![ViewEvent::CopiedChanged(false)]
            }
            ViewCommand::Print => {
                if !self.has_content() {
                    return Vec::new();
                }
                vec![ViewEvent::PrintRequested {
                    title: self.card_label().to_owned(),
                    content: self.report_content.clone(),
                }]
            }
        }
    }

    pub fn selected_report(&self) -> Option<&ReportDescriptor> {
        if self.selected_id.is_empty() {
            return None;
        }
        self.reports
            .iter()
            .find(|report| report.id == self.selected_id)
    }

    pub fn card_label(&self) -> &str {
        match self.selected_report() {
            Some(report) if !report.label.is_empty() => &report.label,
            _ => FALLBACK_REPORT_LABEL,
        }
    }

    pub fn has_content(&self) -> bool {
        !self.report_content.is_empty()
    }

    pub fn phase(&self) -> LoadPhase {
        if self.loading {
            LoadPhase::Loading
        } else if !self.error.is_empty() {
            LoadPhase::Errored
        } else if self.has_content() {
            LoadPhase::Loaded
        } else {
            LoadPhase::Idle
        }
    }

    pub fn latest_request(&self) -> Option<RequestId> {
        self.latest_request
    }

    fn select(&mut self, new_id: ReportId) -> Vec<ViewEvent> {
        self.selected_id = new_id.clone();
        let mut events = vec![ViewEvent::SelectionChanged(new_id)];

        if self.selected_id.is_empty() {
            self.report_content.clear();
            events.push(ViewEvent::ContentCleared);
            return events;
        }

        let Some(descriptor) = self.selected_report().cloned() else {
            return events;
        };

        self.loading = true;
        events.push(ViewEvent::LoadingChanged(true));
        if !self.error.is_empty() {
            self.error.clear();
            events.push(ViewEvent::ErrorCleared);
        }

        let request_id = self.next_request_id();
        self.latest_request = Some(request_id);
        events.push(ViewEvent::ReportRequested {
            request_id,
            descriptor,
        });
        events
    }

    fn next_request_id(&mut self) -> RequestId {
        self.last_request = self.last_request.saturating_add(1);
        RequestId::new(self.last_request)
    }

    fn accepts(&self, request_id: RequestId) -> bool {
        match self.stale_policy {
            StalePolicy::LastResponseWins => true,
            StalePolicy::LatestRequestOnly => self.latest_request == Some(request_id),
        }
    }

    fn raise(&mut self, error: ViewError) -> ViewEvent {
        self.error = error.message().to_owned();
        ViewEvent::ErrorRaised(error)
    }
}

#[cfg(test)]
mod tests {
    use super::{ViewCommand, ViewEvent, ViewState};
    use crate::{
        CopyToken, LoadPhase, ReportDescriptor, ReportId, RequestId, StalePolicy, ViewError,
    };

    fn sample_reports() -> Vec<ReportDescriptor> {
        vec![
            ReportDescriptor::new("e1", "Encounter 1", "reports/e1.txt"),
            ReportDescriptor::new("e2", "Encounter 2", "reports/e2.txt"),
        ]
    }

    fn loaded_state() -> ViewState {
        let mut state = ViewState::default();
        state.dispatch(ViewCommand::IndexLoaded(sample_reports()));
        state
    }

    fn requested_id(events: &[ViewEvent]) -> Option<RequestId> {
        events.iter().find_map(|event| match event {
            ViewEvent::ReportRequested { request_id, .. } => Some(*request_id),
            _ => None,
        })
    }

    #[test]
    fn activate_requests_index_once() {
        let mut state = ViewState::default();
        assert_eq!(
            state.dispatch(ViewCommand::Activate),
            vec![ViewEvent::IndexRequested]
        );
        assert!(state.dispatch(ViewCommand::Activate).is_empty());
        assert_eq!(
            state.dispatch(ViewCommand::ReloadIndex),
            vec![ViewEvent::IndexRequested]
        );
    }

    #[test]
    fn index_load_keeps_source_order() {
        let state = loaded_state();
        assert_eq!(state.reports, sample_reports());
        assert_eq!(state.phase(), LoadPhase::Idle);
    }

    #[test]
    fn index_failure_sets_list_error_and_leaves_reports_empty() {
        let mut state = ViewState::default();
        let events = state.dispatch(ViewCommand::IndexFailed);
        assert_eq!(events, vec![ViewEvent::ErrorRaised(ViewError::IndexLoad)]);
        assert_eq!(state.error, "Failed to load report list");
        assert!(state.reports.is_empty());
    }

    #[test]
    fn reload_success_clears_only_the_index_error() {
        let mut state = ViewState::default();
        state.dispatch(ViewCommand::IndexFailed);
        let events = state.dispatch(ViewCommand::IndexLoaded(sample_reports()));
        assert_eq!(
            events,
            vec![ViewEvent::ReportsReplaced(2), ViewEvent::ErrorCleared]
        );
        assert!(state.error.is_empty());

        state.dispatch(ViewCommand::CopyFailed);
        state.dispatch(ViewCommand::IndexLoaded(sample_reports()));
        assert_eq!(state.error, "Failed to copy");
    }

    #[test]
    fn failed_reload_keeps_previous_reports() {
        let mut state = loaded_state();
        assert_eq!(
            state.dispatch(ViewCommand::ReloadIndex),
            vec![ViewEvent::IndexRequested]
        );
        let events = state.dispatch(ViewCommand::IndexFailed);
        assert_eq!(events, vec![ViewEvent::ErrorRaised(ViewError::IndexLoad)]);
        assert_eq!(state.reports, sample_reports());
        assert_eq!(state.error, "Failed to load report list");
    }

    #[test]
    fn placeholder_selection_clears_content_without_fetch() {
        let mut state = loaded_state();
        state.report_content = "old".to_owned();
        state.error = "Failed to load report".to_owned();

        let events = state.dispatch(ViewCommand::Select(ReportId::default()));
        assert_eq!(
            events,
            vec![
                ViewEvent::SelectionChanged(ReportId::default()),
                ViewEvent::ContentCleared,
            ]
        );
        assert!(state.report_content.is_empty());
        assert_eq!(state.error, "Failed to load report");
        assert!(!state.loading);
    }

    #[test]
    fn unknown_selection_only_updates_selected_id() {
        let mut state = loaded_state();
        let events = state.dispatch(ViewCommand::Select(ReportId::new("ghost")));
        assert_eq!(
            events,
            vec![ViewEvent::SelectionChanged(ReportId::new("ghost"))]
        );
        assert_eq!(state.selected_id, ReportId::new("ghost"));
        assert!(!state.loading);
        assert_eq!(state.card_label(), "Report");
    }

    #[test]
    fn selecting_report_sets_loading_and_requests_fetch() {
        let mut state = loaded_state();
        state.error = "Failed to copy".to_owned();

        let events = state.dispatch(ViewCommand::Select(ReportId::new("e1")));
        assert!(state.loading);
        assert!(state.error.is_empty());
        assert_eq!(state.phase(), LoadPhase::Loading);
        assert_eq!(
            events,
            vec![
                ViewEvent::SelectionChanged(ReportId::new("e1")),
                ViewEvent::LoadingChanged(true),
                ViewEvent::ErrorCleared,
                ViewEvent::ReportRequested {
                    request_id: RequestId::new(1),
                    descriptor: ReportDescriptor::new("e1", "Encounter 1", "reports/e1.txt"),
                },
            ]
        );
    }

    #[test]
    fn report_success_replaces_content_verbatim() {
        let mut state = loaded_state();
        let events = state.dispatch(ViewCommand::Select(ReportId::new("e1")));
        let request_id = requested_id(&events).expect("fetch requested");

        state.dispatch(ViewCommand::ReportLoaded {
            request_id,
            content: "Score: 9/10".to_owned(),
        });
        assert_eq!(state.report_content, "Score: 9/10");
        assert!(!state.loading);
        assert_eq!(state.card_label(), "Encounter 1");
        assert_eq!(state.phase(), LoadPhase::Loaded);
    }

    #[test]
    fn report_failure_keeps_previous_content() {
        let mut state = loaded_state();
        let first = requested_id(&state.dispatch(ViewCommand::Select(ReportId::new("e1"))))
            .expect("fetch requested");
        state.dispatch(ViewCommand::ReportLoaded {
            request_id: first,
            content: "  first report\n".to_owned(),
        });

        let second = requested_id(&state.dispatch(ViewCommand::Select(ReportId::new("e2"))))
            .expect("fetch requested");
        let events = state.dispatch(ViewCommand::ReportFailed { request_id: second });
        assert_eq!(
            events,
            vec![
                ViewEvent::ErrorRaised(ViewError::ReportLoad),
                ViewEvent::LoadingChanged(false),
            ]
        );
        assert_eq!(state.error, "Failed to load report");
        assert_eq!(state.report_content, "  first report\n");
        assert!(!state.loading);
        assert_eq!(state.phase(), LoadPhase::Errored);
    }

    #[test]
    fn reselecting_same_id_issues_a_new_request() {
        let mut state = loaded_state();
        let first = requested_id(&state.dispatch(ViewCommand::Select(ReportId::new("e1"))));
        let second = requested_id(&state.dispatch(ViewCommand::Select(ReportId::new("e1"))));
        assert_eq!(first, Some(RequestId::new(1)));
        assert_eq!(second, Some(RequestId::new(2)));
        assert_eq!(state.latest_request(), Some(RequestId::new(2)));
    }

    #[test]
    fn last_response_wins_applies_out_of_order_responses() {
        let mut state = loaded_state();
        let older = requested_id(&state.dispatch(ViewCommand::Select(ReportId::new("e1"))))
            .expect("fetch requested");
        let newer = requested_id(&state.dispatch(ViewCommand::Select(ReportId::new("e2"))))
            .expect("fetch requested");

        state.dispatch(ViewCommand::ReportLoaded {
            request_id: newer,
            content: "e2 body".to_owned(),
        });
        state.dispatch(ViewCommand::ReportLoaded {
            request_id: older,
            content: "e1 body".to_owned(),
        });
        assert_eq!(state.report_content, "e1 body");
        assert_eq!(state.selected_id, ReportId::new("e2"));
        assert_eq!(state.card_label(), "Encounter 2");
    }

    #[test]
    fn latest_request_only_drops_stale_responses() {
        let mut state = ViewState::with_policy(StalePolicy::LatestRequestOnly);
        state.dispatch(ViewCommand::IndexLoaded(sample_reports()));
        let older = requested_id(&state.dispatch(ViewCommand::Select(ReportId::new("e1"))))
            .expect("fetch requested");
        let newer = requested_id(&state.dispatch(ViewCommand::Select(ReportId::new("e2"))))
            .expect("fetch requested");

        let dropped = state.dispatch(ViewCommand::ReportLoaded {
            request_id: older,
            content: "e1 body".to_owned(),
        });
        assert_eq!(dropped, vec![ViewEvent::StaleResponseDropped(older)]);
        assert!(state.loading);
        assert!(state.report_content.is_empty());

        state.dispatch(ViewCommand::ReportLoaded {
            request_id: newer,
            content: "e2 body".to_owned(),
        });
        assert!(!state.loading);
        assert_eq!(state.report_content, "e2 body");
    }

    #[test]
    fn copy_and_print_require_content() {
        let mut state = loaded_state();
        assert!(state.dispatch(ViewCommand::Copy).is_empty());
        assert!(state.dispatch(ViewCommand::Print).is_empty());

        state.report_content = "text".to_owned();
        assert_eq!(
            state.dispatch(ViewCommand::Copy),
            vec![ViewEvent::CopyRequested("text".to_owned())]
        );
        assert_eq!(
            state.dispatch(ViewCommand::Print),
            vec![ViewEvent::PrintRequested {
                title: "Report".to_owned(),
                content: "text".to_owned(),
            }]
        );
    }

    #[test]
    fn copy_success_schedules_reset_and_newer_copy_replaces_it() {
        let mut state = loaded_state();
        state.report_content = "text".to_owned();

        let first = state.dispatch(ViewCommand::CopySucceeded);
        assert!(state.copied);
        assert_eq!(
            first,
            vec![
                ViewEvent::CopiedChanged(true),
                ViewEvent::CopyResetScheduled(CopyToken::new(1)),
            ]
        );

        state.dispatch(ViewCommand::CopySucceeded);
        let stale = state.dispatch(ViewCommand::ResetCopied {
            token: CopyToken::new(1),
        });
        assert!(stale.is_empty());
        assert!(state.copied);

        let fresh = state.dispatch(ViewCommand::ResetCopied {
            token: CopyToken::new(2),
        });
        assert_eq!(fresh, vec![ViewEvent::CopiedChanged(false)]);
        assert!(!state.copied);
    }

    #[test]
    fn copy_failure_sets_error_and_leaves_copied_false() {
        let mut state = loaded_state();
        state.report_content = "text".to_owned();
        let events = state.dispatch(ViewCommand::CopyFailed);
        assert_eq!(events, vec![ViewEvent::ErrorRaised(ViewError::Clipboard)]);
        assert_eq!(state.error, "Failed to copy");
        assert!(!state.copied);
    }
}
