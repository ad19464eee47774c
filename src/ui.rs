// UI layer: the operator-facing side of the tool. The workflow only talks
// to the `Console` trait, so it can be driven by a real terminal or by a
// scripted console in tests.

use crossterm::style::Stylize;
use crossterm::tty::IsTty;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::time::Duration;

pub trait Console {
    /// Progress or result line for the operator.
    fn say(&mut self, message: &str);

    /// Error line for the operator.
    fn warn(&mut self, message: &str);

    /// Prompt and read one line. `Ok(None)` means input is exhausted.
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;

    /// Transient "working on it" indicator. Replaced by the next message.
    fn status(&mut self, _message: &str) {}
}

/// Interactive terminal console: dialoguer prompts, an indicatif spinner
/// while requests are in flight, warnings in red on stderr.
#[derive(Default)]
pub struct TerminalConsole {
    spinner: Option<ProgressBar>,
}

impl TerminalConsole {
    pub fn new() -> Self {
        Self::default()
    }

    fn clear_status(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

impl Console for TerminalConsole {
    fn say(&mut self, message: &str) {
        self.clear_status();
        println!("{}", message);
    }

    fn warn(&mut self, message: &str) {
        self.clear_status();
        eprintln!("{}", message.red());
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.clear_status();
        // dialoguer reads keys from the terminal behind stderr; piped stdin
        // or a redirected stderr needs a plain line read instead.
        if !(io::stdin().is_tty() && io::stderr().is_tty()) {
            return read_plain_line(&mut io::stdin().lock(), &mut io::stdout(), prompt);
        }
        Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map(Some)
    }

    fn status(&mut self, message: &str) {
        let spinner = self.spinner.get_or_insert_with(|| {
            let spinner = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
                spinner.set_style(style);
            }
            spinner.enable_steady_tick(Duration::from_millis(100));
            spinner
        });
        spinner.set_message(message.to_string());
    }
}

impl Drop for TerminalConsole {
    fn drop(&mut self) {
        self.clear_status();
    }
}

/// Print `prompt` and read one line, without the line ending. `None` at
/// end of input.
fn read_plain_line<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
) -> io::Result<Option<String>> {
    writeln!(output, "{}:", prompt)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let trimmed = line.trim_end_matches(['\n', '\r']).len();
    line.truncate(trimmed);
    Ok(Some(line))
}
