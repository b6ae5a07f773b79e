// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;

use crate::{
    FormMode, FormSubmission, Project, ProjectDraft, ProjectForm, ProjectId, SortKey, SortSpec,
    derive_rows,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Loaded,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    Fetch,
    Update(Project),
    Create(ProjectDraft),
    Delete(ProjectId),
}

impl ApiCall {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Fetch => "load",
            Self::Update(_) => "save",
            Self::Create(_) => "create",
            Self::Delete(_) => "delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub ticket: u64,
    pub call: ApiCall,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiReply {
    Fetched(Vec<Project>),
    Updated(Project),
    Created(Project),
    Deleted(ProjectId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableCommand {
    Load,
    SetSearch(String),
    PushSearchChar(char),
    PopSearchChar,
    SortBy(SortKey),
    MoveCursor(isize),
    JumpFirst,
    JumpLast,
    OpenEdit,
    OpenCreate,
    FormChar(char),
    FormBackspace,
    FormFocus(isize),
    SubmitForm,
    CloseForm,
    RequestDelete,
    ConfirmDelete,
    CancelDelete,
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableEvent {
    RequestStarted(ApiRequest),
    RequestRefused,
    RecordsReplaced(usize),
    SearchChanged(String),
    SortChanged(SortSpec),
    CursorMoved(usize),
    FormOpened(FormMode),
    FormUpdated,
    FormClosed,
    DeleteConfirmOpened(ProjectId),
    DeleteConfirmClosed,
    StatusUpdated(String),
    StatusCleared,
}

/// Client-side state of the project table. Rows are always derived from
/// `records`; nothing here reorders the canonical set.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectTable {
    pub records: Vec<Project>,
    pub search: String,
    pub sort: Option<SortSpec>,
    pub load: LoadState,
    pub form: Option<ProjectForm>,
    pub confirm_delete: Option<ProjectId>,
    pub selected: usize,
    pub status_line: Option<String>,
    pending: Option<ApiRequest>,
    next_ticket: u64,
}

impl Default for ProjectTable {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            search: String::new(),
            sort: None,
            load: LoadState::Loading,
            form: None,
            confirm_delete: None,
            selected: 0,
            status_line: None,
            pending: None,
            next_ticket: 0,
        }
    }
}

impl ProjectTable {
    pub fn with_sort(sort: Option<SortSpec>) -> Self {
        Self {
            sort,
            ..Self::default()
        }
    }

    pub fn rows(&self) -> Vec<&Project> {
        derive_rows(&self.records, &self.search, self.sort)
    }

    pub fn selected_project(&self) -> Option<&Project> {
        self.rows().get(self.selected).copied()
    }

    pub fn pending(&self) -> Option<&ApiRequest> {
        self.pending.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn dispatch(&mut self, command: TableCommand) -> Vec<TableEvent> {
        match command {
            TableCommand::Load => self.begin(ApiCall::Fetch),
            TableCommand::SetSearch(term) => self.set_search(term),
            TableCommand::PushSearchChar(ch) => {
                let mut term = self.search.clone();
                term.push(ch);
                self.set_search(term)
            }
            TableCommand::PopSearchChar => {
                let mut term = self.search.clone();
                term.pop();
                self.set_search(term)
            }
            TableCommand::SortBy(key) => {
                let previous = self.selected_id();
                let spec = SortSpec::toggle(self.sort, key);
                self.sort = Some(spec);
                self.reselect(previous);
                let label = format!("sort {} {}", key.label(), spec.direction.as_str());
                vec![TableEvent::SortChanged(spec), self.set_status(label)]
            }
            TableCommand::MoveCursor(delta) => {
                let len = self.rows().len();
                if len == 0 {
                    self.selected = 0;
                } else {
                    let next = (self.selected as isize + delta).clamp(0, len as isize - 1);
                    self.selected = next as usize;
                }
                vec![TableEvent::CursorMoved(self.selected)]
            }
            TableCommand::JumpFirst => {
                self.selected = 0;
                vec![TableEvent::CursorMoved(self.selected)]
            }
            TableCommand::JumpLast => {
                self.selected = self.rows().len().saturating_sub(1);
                vec![TableEvent::CursorMoved(self.selected)]
            }
            TableCommand::OpenEdit => {
                let Some(form) = self.selected_project().map(ProjectForm::for_project) else {
                    return vec![self.set_status("no project selected")];
                };
                let mode = form.mode;
                self.form = Some(form);
                vec![TableEvent::FormOpened(mode)]
            }
            TableCommand::OpenCreate => {
                self.form = Some(ProjectForm::blank());
                vec![TableEvent::FormOpened(FormMode::Create)]
            }
            TableCommand::FormChar(ch) => self.edit_form(|form| form.push_char(ch)),
            TableCommand::FormBackspace => self.edit_form(ProjectForm::pop_char),
            TableCommand::FormFocus(delta) => self.edit_form(|form| form.move_focus(delta)),
            TableCommand::SubmitForm => self.submit_form(),
            TableCommand::CloseForm => {
                if self.form.take().is_some() {
                    vec![TableEvent::FormClosed]
                } else {
                    Vec::new()
                }
            }
            TableCommand::RequestDelete => {
                let Some(id) = self.selected_id() else {
                    return vec![self.set_status("no project selected")];
                };
                self.confirm_delete = Some(id);
                vec![TableEvent::DeleteConfirmOpened(id)]
            }
            TableCommand::ConfirmDelete => {
                let Some(id) = self.confirm_delete else {
                    return Vec::new();
                };
                if self.is_busy() {
                    return self.refuse();
                }
                self.confirm_delete = None;
                let mut events = vec![TableEvent::DeleteConfirmClosed];
                events.extend(self.begin(ApiCall::Delete(id)));
                events
            }
            TableCommand::CancelDelete => {
                if self.confirm_delete.take().is_some() {
                    vec![TableEvent::DeleteConfirmClosed]
                } else {
                    Vec::new()
                }
            }
            TableCommand::ClearStatus => {
                self.status_line = None;
                vec![TableEvent::StatusCleared]
            }
        }
    }

    /// Applies the outcome of a request started by this table. Outcomes for
    /// any ticket other than the pending one are dropped.
    pub fn complete(&mut self, ticket: u64, outcome: Result<ApiReply>) -> Vec<TableEvent> {
        let Some(request) = self.pending.take_if(|pending| pending.ticket == ticket) else {
            return Vec::new();
        };

        let reply = match outcome {
            Ok(reply) => reply,
            Err(error) => {
                let message = format!("{} failed: {error:#}", request.call.label());
                if request.call == ApiCall::Fetch {
                    self.load = LoadState::Failed(message.clone());
                }
                return vec![self.set_status(message)];
            }
        };

        match reply {
            ApiReply::Fetched(records) => {
                let previous = self.selected_id();
                self.records = records;
                self.load = LoadState::Loaded;
                self.reselect(previous);
                vec![TableEvent::RecordsReplaced(self.records.len())]
            }
            ApiReply::Updated(project) => {
                let mut events = self.close_form_for(FormMode::Edit(project.id));
                events.push(self.set_status(format!("project {} saved", project.id)));
                events.extend(self.begin(ApiCall::Fetch));
                events
            }
            ApiReply::Created(project) => {
                let mut events = self.close_form_for(FormMode::Create);
                events.push(self.set_status(format!("project {} created", project.id)));
                events.extend(self.begin(ApiCall::Fetch));
                events
            }
            ApiReply::Deleted(id) => {
                let mut events = vec![self.set_status(format!("project {id} deleted"))];
                events.extend(self.begin(ApiCall::Fetch));
                events
            }
        }
    }

    fn begin(&mut self, call: ApiCall) -> Vec<TableEvent> {
        if self.is_busy() {
            return self.refuse();
        }
        self.next_ticket = self.next_ticket.wrapping_add(1);
        if call == ApiCall::Fetch {
            self.load = LoadState::Loading;
        }
        let request = ApiRequest {
            ticket: self.next_ticket,
            call,
        };
        self.pending = Some(request.clone());
        vec![TableEvent::RequestStarted(request)]
    }

    fn refuse(&mut self) -> Vec<TableEvent> {
        vec![
            TableEvent::RequestRefused,
            self.set_status("request in flight -- wait for it to finish"),
        ]
    }

    fn submit_form(&mut self) -> Vec<TableEvent> {
        let Some(form) = &self.form else {
            return Vec::new();
        };
        match form.submit() {
            Ok(FormSubmission::Create(draft)) => self.begin(ApiCall::Create(draft)),
            Ok(FormSubmission::Update(project)) => self.begin(ApiCall::Update(project)),
            Err(error) => vec![self.set_status(format!("{error:#}"))],
        }
    }

    fn edit_form(&mut self, edit: impl FnOnce(&mut ProjectForm)) -> Vec<TableEvent> {
        match &mut self.form {
            Some(form) => {
                edit(form);
                vec![TableEvent::FormUpdated]
            }
            None => Vec::new(),
        }
    }

    fn close_form_for(&mut self, mode: FormMode) -> Vec<TableEvent> {
        if self.form.as_ref().is_some_and(|form| form.mode == mode) {
            self.form = None;
            vec![TableEvent::FormClosed]
        } else {
            Vec::new()
        }
    }

    fn set_search(&mut self, term: String) -> Vec<TableEvent> {
        let previous = self.selected_id();
        self.search = term;
        self.reselect(previous);
        vec![TableEvent::SearchChanged(self.search.clone())]
    }

    fn selected_id(&self) -> Option<ProjectId> {
        self.selected_project().map(|project| project.id)
    }

    fn reselect(&mut self, previous: Option<ProjectId>) {
        let rows = self.rows();
        let index = previous
            .and_then(|id| rows.iter().position(|project| project.id == id))
            .unwrap_or(self.selected);
        self.selected = index.min(rows.len().saturating_sub(1));
    }

    fn set_status(&mut self, message: impl Into<String>) -> TableEvent {
        let message = message.into();
        self.status_line = Some(message.clone());
        TableEvent::StatusUpdated(message)
    }
}
