//! Colored terminal output utilities.

use console::{Style, Term};

/// Terminal output formatter.
///
/// Status lines go to stderr; the served URL goes to stdout so it can be
/// piped into other tools.
pub(crate) struct Output {
    term: Term,
    stdout: Term,
    red: Style,
    cyan_bold: Style,
}

impl Output {
    /// Create a new output formatter.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            stdout: Term::stdout(),
            red: Style::new().red(),
            cyan_bold: Style::new().cyan().bold(),
        }
    }

    /// Print an info message.
    pub(crate) fn info(&self, msg: &str) {
        let _ = self.term.write_line(msg);
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.term.write_line(&self.red.apply_to(msg).to_string());
    }

    /// Print the URL the server is reachable at (cyan bold, stdout).
    pub(crate) fn serving(&self, url: &str) {
        let line = format!("Serving at {url}");
        let _ = self
            .stdout
            .write_line(&self.cyan_bold.apply_to(line).to_string());
    }

    /// Print the shutdown message (stdout).
    pub(crate) fn stopped(&self) {
        let _ = self.stdout.write_line("\nServer stopped.");
    }
}
