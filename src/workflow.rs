// Workflow orchestrator: one pass of select repository -> prepare branch ->
// write file -> ensure pull request. Every terminal state prints a plain
// sentence and yields an `Outcome`; nothing loops back.

use crate::api::{ApiClient, FileChange, FileCreation, PullRequestDraft};
use crate::error::Result;
use crate::transport::Transport;
use crate::ui::Console;
use std::ops::ControlFlow;

/// What the run writes and proposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangePlan {
    pub branch: String,
    pub file: FileChange,
    pub update_message: String,
    pub pr_title: String,
    pub pr_body: String,
}

impl ChangePlan {
    /// Add `Hello.txt` on the `hello-file` branch.
    pub fn hello() -> Self {
        Self {
            branch: "hello-file".into(),
            file: FileChange {
                path: "Hello.txt".into(),
                content: "Hello world".into(),
                message: "Add Hello.txt".into(),
            },
            update_message: "Update Hello.txt".into(),
            pr_title: "Add file Hello.txt".into(),
            pr_body: "This Pull Request adds a file named Hello.txt".into(),
        }
    }
}

impl Default for ChangePlan {
    fn default() -> Self {
        Self::hello()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    PullRequestOpened,
    /// An open pull request already targets the working branch.
    PullRequestAlreadyOpen,
    NoRepositories,
    InvalidSelection,
    /// The operator declined to overwrite the existing file.
    FileNotUpdated,
    Failed,
}

impl Outcome {
    /// 0 success or nothing to do, 2 failure, 3 operator abort.
    pub fn exit_code(self) -> u8 {
        match self {
            Outcome::PullRequestOpened | Outcome::PullRequestAlreadyOpen | Outcome::NoRepositories => 0,
            Outcome::Failed => 2,
            Outcome::InvalidSelection | Outcome::FileNotUpdated => 3,
        }
    }
}

type Step<T> = Result<ControlFlow<Outcome, T>>;

pub struct Workflow<'a, T, C> {
    api: &'a ApiClient<T>,
    account: &'a str,
    console: &'a mut C,
    plan: ChangePlan,
}

impl<'a, T: Transport, C: Console> Workflow<'a, T, C> {
    pub fn new(api: &'a ApiClient<T>, account: &'a str, console: &'a mut C, plan: ChangePlan) -> Self {
        Self {
            api,
            account,
            console,
            plan,
        }
    }

    /// Run the whole workflow once. Gateway errors with no fallback end
    /// the run with an "Unexpected error" line.
    pub fn run(mut self) -> Outcome {
        let outcome = match self.drive() {
            Ok(outcome) => outcome,
            Err(err) => {
                self.console.warn(&format!("Unexpected error: {}", err));
                Outcome::Failed
            }
        };
        tracing::info!(?outcome, "workflow finished");
        outcome
    }

    fn drive(&mut self) -> Result<Outcome> {
        let repo = match self.select_repository()? {
            ControlFlow::Continue(repo) => repo,
            ControlFlow::Break(outcome) => return Ok(outcome),
        };
        let base = match self.prepare_branch(&repo)? {
            ControlFlow::Continue(base) => base,
            ControlFlow::Break(outcome) => {
                self.console.warn("Error preparing branch. Exiting.");
                return Ok(outcome);
            }
        };
        if let ControlFlow::Break(outcome) = self.write_file(&repo)? {
            return Ok(outcome);
        }
        self.ensure_pull_request(&repo, &base)
    }

    fn select_repository(&mut self) -> Step<String> {
        self.console.status("Fetching repositories...");
        let repos = self.api.list_repositories(self.account)?;
        if repos.is_empty() {
            self.console.say("No repositories found in your account.");
            return Ok(ControlFlow::Break(Outcome::NoRepositories));
        }

        self.console.say("Available repositories:");
        for (i, repo) in repos.iter().enumerate() {
            self.console.say(&format!("{}) {}", i + 1, repo));
        }

        let answer = self.prompt("Select a repository by typing its number");
        let choice = match answer.as_deref().map(str::trim).map(str::parse::<i64>) {
            Some(Ok(choice)) => choice,
            _ => {
                self.console.warn("Invalid input. Please enter a valid number next time.");
                return Ok(ControlFlow::Break(Outcome::InvalidSelection));
            }
        };
        let Some(index) = usize::try_from(choice)
            .ok()
            .filter(|c| (1..=repos.len()).contains(c))
        else {
            self.console.warn("Invalid choice. Please restart the program and try again.");
            return Ok(ControlFlow::Break(Outcome::InvalidSelection));
        };

        let repo = repos[index - 1].clone();
        tracing::info!(repo = %repo, "repository selected");
        Ok(ControlFlow::Continue(repo))
    }

    /// Branch the working branch off the tip of the default branch.
    /// Continues with the default branch name, the pull request's base.
    fn prepare_branch(&mut self, repo: &str) -> Step<String> {
        self.console.status("Preparing branch...");
        let Some(base) = self.api.get_default_branch(self.account, repo)? else {
            self.console.warn(&format!("Default branch not found for repository {}.", repo));
            return Ok(ControlFlow::Break(Outcome::Failed));
        };

        let Some(sha) = self.api.get_latest_commit_sha(self.account, repo, &base)? else {
            self.console.warn(&format!(
                "Unable to retrieve latest commit SHA for branch {}.",
                base
            ));
            return Ok(ControlFlow::Break(Outcome::Failed));
        };

        let branch = &self.plan.branch;
        if !self.api.create_branch(self.account, repo, branch, &sha).is_ready() {
            self.console.warn(&format!("Error creating new branch {}.", branch));
            return Ok(ControlFlow::Break(Outcome::Failed));
        }
        Ok(ControlFlow::Continue(base))
    }

    fn write_file(&mut self, repo: &str) -> Step<()> {
        self.console.status("Writing file...");
        let branch = &self.plan.branch;
        match self.api.create_file(self.account, repo, branch, &self.plan.file)? {
            FileCreation::Created => {
                self.console.say(&format!("File created: {}", self.plan.file.path));
                Ok(ControlFlow::Continue(()))
            }
            FileCreation::Failed => {
                self.console.warn("Error creating file in repository. Exiting.");
                Ok(ControlFlow::Break(Outcome::Failed))
            }
            FileCreation::AlreadyExists => self.offer_update(repo),
        }
    }

    fn offer_update(&mut self, repo: &str) -> Step<()> {
        let answer = self.prompt("File already exists. Do you want to update it? [y/n]");
        if !is_confirmation(answer.as_deref()) {
            self.console.say("File not updated");
            return Ok(ControlFlow::Break(Outcome::FileNotUpdated));
        }

        let change = FileChange {
            message: self.plan.update_message.clone(),
            ..self.plan.file.clone()
        };
        self.console.status("Updating file...");
        if !self.api.update_file(self.account, repo, &self.plan.branch, &change)? {
            self.console.warn("Error updating file. Exiting.");
            return Ok(ControlFlow::Break(Outcome::Failed));
        }
        self.console
            .say(&format!("File updated successfully: {}", change.path));
        Ok(ControlFlow::Continue(()))
    }

    /// `base` is the repository's default branch (the one the working
    /// branch was cut from) rather than a fixed `main`.
    fn ensure_pull_request(&mut self, repo: &str, base: &str) -> Result<Outcome> {
        self.console.status("Checking pull requests...");
        if self.api.pull_request_exists(self.account, repo, &self.plan.branch)? {
            self.console.say("Pull request already exists. Exiting.");
            return Ok(Outcome::PullRequestAlreadyOpen);
        }

        let draft = PullRequestDraft {
            title: self.plan.pr_title.clone(),
            head: self.plan.branch.clone(),
            base: base.to_string(),
            body: self.plan.pr_body.clone(),
        };
        if self.api.create_pull_request(self.account, repo, &draft) {
            self.console.say("Pull request created successfully!");
            Ok(Outcome::PullRequestOpened)
        } else {
            self.console.warn("Error creating pull request. Exiting.");
            Ok(Outcome::Failed)
        }
    }

    /// Unreadable input is treated the same as no input.
    fn prompt(&mut self, prompt: &str) -> Option<String> {
        match self.console.read_line(prompt) {
            Ok(answer) => answer,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read operator input");
                None
            }
        }
    }
}

/// Only an answer starting with a lowercase `y` confirms.
fn is_confirmation(answer: Option<&str>) -> bool {
    answer.is_some_and(|a| a.starts_with('y'))
}
