//! Test doubles shared by the integration tests: a transport that answers
//! by route and a console fed from a script.

#![allow(dead_code)]

use hello_pr::{ApiClient, ApiRequest, ApiResponse, Console, Credentials, Transport, TransportError};
use reqwest::Method;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io;

pub const ACCOUNT: &str = "octocat";

/// Answers `METHOD path` routes with queued responses. The last queued
/// response for a route keeps being replayed. Unrouted requests get a 500.
#[derive(Default)]
pub struct RouteTransport {
    routes: RefCell<HashMap<String, VecDeque<ApiResponse>>>,
    requests: RefCell<Vec<ApiRequest>>,
}

impl RouteTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, method: Method, path: &str, status: u16, body: &str) -> Self {
        self.routes
            .borrow_mut()
            .entry(format!("{} {}", method, path))
            .or_default()
            .push_back(ApiResponse {
                status,
                body: body.to_string(),
            });
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.borrow().clone()
    }

    pub fn requests_to(&self, method: Method, path: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }
}

impl Transport for RouteTransport {
    fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.requests.borrow_mut().push(request.clone());
        let key = format!("{} {}", request.method, request.path);
        let mut routes = self.routes.borrow_mut();
        let reply = match routes.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        Ok(reply.unwrap_or(ApiResponse {
            status: 500,
            body: format!("unrouted request: {}", key),
        }))
    }
}

/// Console that answers prompts from a script and records what was shown.
#[derive(Default)]
pub struct ScriptedConsole {
    inputs: VecDeque<String>,
    pub prompts: Vec<String>,
    pub lines: Vec<String>,
    pub warnings: Vec<String>,
}

impl ScriptedConsole {
    pub fn with_inputs(inputs: &[&str]) -> Self {
        Self {
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn shows(&self, text: &str) -> bool {
        self.lines.iter().chain(&self.warnings).any(|l| l.contains(text))
    }
}

impl Console for ScriptedConsole {
    fn say(&mut self, message: &str) {
        self.lines.push(message.to_string());
    }

    fn warn(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.prompts.push(prompt.to_string());
        Ok(self.inputs.pop_front())
    }
}

pub fn client(transport: RouteTransport) -> ApiClient<RouteTransport> {
    ApiClient::new(transport, &Credentials::new("ghp_test", ACCOUNT)).unwrap()
}

/// Routes for a repository `hello` whose default branch `main` is at `abc123`,
/// with branch creation succeeding.
pub fn hello_repo() -> RouteTransport {
    RouteTransport::new()
        .on(Method::GET, "users/octocat/repos", 200, r#"[{"name":"hello"}]"#)
        .on(
            Method::GET,
            "repos/octocat/hello",
            200,
            r#"{"name":"hello","default_branch":"main"}"#,
        )
        .on(
            Method::GET,
            "repos/octocat/hello/commits/main",
            200,
            r#"{"sha":"abc123"}"#,
        )
        .on(
            Method::POST,
            "repos/octocat/hello/git/refs",
            201,
            r#"{"ref":"refs/heads/hello-file","object":{"sha":"abc123"}}"#,
        )
}
