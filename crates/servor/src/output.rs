//! Colored terminal output utilities.
//!
//! Banner lines carry a short colored label in front of the message:
//!
//! ```text
//!  serving   files from ./public on https://localhost:8080
//!  network   https://192.168.1.20:8080
//! ```

use console::{Style, Term};

/// Width the labels are padded to.
const LABEL_WIDTH: usize = 9;

/// Terminal output formatter.
pub(crate) struct Output {
    term: Term,
    label: Style,
    yellow: Style,
    red: Style,
}

impl Output {
    /// Create a new output formatter writing to stderr.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            label: Style::new().cyan().bold(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
        }
    }

    /// Print a labelled banner line.
    pub(crate) fn banner(&self, label: &str, msg: &str) {
        let label = format!("{label:<LABEL_WIDTH$}");
        let _ = self
            .term
            .write_line(&format!(" {} {msg}", self.label.apply_to(label)));
    }

    /// Print an empty line.
    pub(crate) fn blank(&self) {
        let _ = self.term.write_line("");
    }

    /// Print a warning message (yellow).
    pub(crate) fn warning(&self, msg: &str) {
        let _ = self.term.write_line(&self.yellow.apply_to(msg).to_string());
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.term.write_line(&self.red.apply_to(msg).to_string());
    }
}
