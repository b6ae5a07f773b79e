// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use projdesk_api::Client;
use projdesk_app::{ApiCall, ApiReply, ApiRequest, Project, ProjectId};
use projdesk_tui::{AppRuntime, InternalEvent};
use std::sync::mpsc::Sender;
use std::thread;
use tracing::debug;

const DEMO_SEED: u64 = 7;
const DEMO_RECORDS: usize = 24;

fn execute(client: &Client, call: &ApiCall) -> Result<ApiReply> {
    match call {
        ApiCall::Fetch => client.fetch_projects().map(ApiReply::Fetched),
        ApiCall::Update(project) => client.update_project(project).map(ApiReply::Updated),
        ApiCall::Create(draft) => client.create_project(draft).map(ApiReply::Created),
        ApiCall::Delete(id) => client.delete_project(*id).map(|()| ApiReply::Deleted(*id)),
    }
}

/// Talks to the HTTP backend. Each request runs on its own thread so the
/// event loop keeps drawing while the server answers.
pub struct ApiRuntime {
    client: Client,
}

impl ApiRuntime {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl AppRuntime for ApiRuntime {
    fn run_request(&mut self, call: &ApiCall) -> Result<ApiReply> {
        execute(&self.client, call)
    }

    fn spawn_request(&mut self, request: ApiRequest, tx: Sender<InternalEvent>) -> Result<()> {
        let client = self.client.clone();
        thread::Builder::new()
            .name(format!("projdesk-request-{}", request.ticket))
            .spawn(move || {
                let outcome = execute(&client, &request.call);
                debug!(
                    ticket = request.ticket,
                    ok = outcome.is_ok(),
                    "request finished"
                );
                let _ = tx.send(InternalEvent::Completed {
                    ticket: request.ticket,
                    outcome,
                });
            })
            .context("spawn request thread")?;
        Ok(())
    }
}

/// In-memory backend for `--demo`.
#[derive(Debug, Clone)]
pub struct DemoRuntime {
    records: Vec<Project>,
}

impl DemoRuntime {
    pub fn seeded() -> Self {
        Self::with_records(projdesk_testkit::demo_projects(DEMO_SEED, DEMO_RECORDS))
    }

    pub fn with_records(records: Vec<Project>) -> Self {
        Self { records }
    }

    fn next_id(&self) -> ProjectId {
        let max = self
            .records
            .iter()
            .map(|project| project.id.get())
            .max()
            .unwrap_or(0);
        ProjectId::new(max + 1)
    }

    fn not_found(id: ProjectId) -> anyhow::Error {
        anyhow!("server error (404): project {id} not found")
    }
}

impl AppRuntime for DemoRuntime {
    fn run_request(&mut self, call: &ApiCall) -> Result<ApiReply> {
        match call {
            ApiCall::Fetch => Ok(ApiReply::Fetched(self.records.clone())),
            ApiCall::Update(project) => {
                let slot = self
                    .records
                    .iter_mut()
                    .find(|existing| existing.id == project.id)
                    .ok_or_else(|| Self::not_found(project.id))?;
                *slot = project.clone();
                Ok(ApiReply::Updated(project.clone()))
            }
            ApiCall::Create(draft) => {
                let project = draft.clone().with_id(self.next_id());
                self.records.push(project.clone());
                Ok(ApiReply::Created(project))
            }
            ApiCall::Delete(id) => {
                let before = self.records.len();
                self.records.retain(|project| project.id != *id);
                if self.records.len() == before {
                    return Err(Self::not_found(*id));
                }
                Ok(ApiReply::Deleted(*id))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiRuntime, DemoRuntime};
    use anyhow::{Result, anyhow};
    use projdesk_api::Client;
    use projdesk_app::{ApiCall, ApiReply, ApiRequest, ProjectId};
    use projdesk_testkit::{ProjectFaker, fixture_projects};
    use projdesk_tui::{AppRuntime, InternalEvent};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;
    use tiny_http::{Header, Response, Server};

    #[test]
    fn demo_runtime_serves_seeded_records() -> Result<()> {
        let mut runtime = DemoRuntime::seeded();
        let ApiReply::Fetched(records) = runtime.run_request(&ApiCall::Fetch)? else {
            panic!("fetch should return records");
        };
        assert_eq!(records.len(), 24);
        Ok(())
    }

    #[test]
    fn demo_create_assigns_the_next_id() -> Result<()> {
        let mut runtime = DemoRuntime::with_records(fixture_projects());
        let draft = ProjectFaker::new(3).draft();
        let ApiReply::Created(project) = runtime.run_request(&ApiCall::Create(draft.clone()))?
        else {
            panic!("create should return the new record");
        };
        assert_eq!(project.id, ProjectId::new(5));
        assert_eq!(project.client, draft.client);
        Ok(())
    }

    #[test]
    fn demo_update_and_delete_report_unknown_ids() -> Result<()> {
        let mut runtime = DemoRuntime::with_records(fixture_projects());
        let mut ghost = fixture_projects().remove(0);
        ghost.id = ProjectId::new(99);

        let error = runtime
            .run_request(&ApiCall::Update(ghost))
            .expect_err("unknown id should fail");
        assert!(error.to_string().contains("404"));

        runtime.run_request(&ApiCall::Delete(ProjectId::new(2)))?;
        let error = runtime
            .run_request(&ApiCall::Delete(ProjectId::new(2)))
            .expect_err("second delete should fail");
        assert!(error.to_string().contains("project 2 not found"));
        Ok(())
    }

    #[test]
    fn api_runtime_completes_on_the_channel() -> Result<()> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let addr = format!("http://{}", server.server_addr());
        let handle = thread::spawn(move || {
            let request = server.recv().expect("request expected");
            assert_eq!(request.url(), "/projects");
            let response = Response::from_string("[]").with_header(
                Header::from_bytes("Content-Type", "application/json")
                    .expect("valid content type header"),
            );
            request.respond(response).expect("response should succeed");
        });

        let mut runtime = ApiRuntime::new(Client::new(&addr, Duration::from_secs(1))?);
        let (tx, rx) = mpsc::channel();
        runtime.spawn_request(
            ApiRequest {
                ticket: 3,
                call: ApiCall::Fetch,
            },
            tx,
        )?;

        let event = rx.recv_timeout(Duration::from_secs(5))?;
        let InternalEvent::Completed { ticket, outcome } = event else {
            panic!("expected a completion event");
        };
        assert_eq!(ticket, 3);
        assert!(matches!(outcome, Ok(ApiReply::Fetched(records)) if records.is_empty()));

        handle.join().expect("server thread should join");
        Ok(())
    }

    #[test]
    fn api_runtime_reports_unreachable_servers_as_failures() -> Result<()> {
        let mut runtime = ApiRuntime::new(Client::new(
            "http://127.0.0.1:1",
            Duration::from_millis(50),
        )?);
        let (tx, rx) = mpsc::channel();
        runtime.spawn_request(
            ApiRequest {
                ticket: 1,
                call: ApiCall::Delete(ProjectId::new(4)),
            },
            tx,
        )?;

        let InternalEvent::Completed { outcome, .. } = rx.recv_timeout(Duration::from_secs(5))?
        else {
            panic!("expected a completion event");
        };
        let error = outcome.expect_err("unreachable server should fail");
        assert!(error.to_string().contains("cannot reach"));
        Ok(())
    }
}
