// Library root
// -----------
// The binary (`main.rs`) wires these modules together:
// - `config`: loads the GitHub credentials and API settings.
// - `transport`: the HTTP seam; reqwest in production, scripted in tests.
// - `api`: typed, idempotent GitHub operations on top of a transport.
// - `workflow`: the branch -> file -> pull request run.
// - `ui`: the console the workflow prompts and reports through.
pub mod api;
pub mod config;
pub mod error;
pub mod transport;
pub mod ui;
pub mod workflow;

pub use api::ApiClient;
pub use config::{Config, Credentials};
pub use error::{ApiError, ConfigError, GatewayError, TransportError};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
pub use ui::{Console, TerminalConsole};
pub use workflow::{ChangePlan, Outcome, Workflow};
