//! Interactive terminal UI.

use console::Term;
use std::io::Write;

use crate::error::Result;
use crate::scan::{FixOption, Report};

use super::output::format_report;
use super::prompts::prompt_fix;
use super::{NonInteractiveUI, ProgressSpinner, SpinnerHandle, UserInterface, VkDiagTheme};

/// Interactive terminal UI implementation.
pub struct TerminalUI {
    term: Term,
    theme: VkDiagTheme,
}

impl TerminalUI {
    /// Create a new terminal UI.
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
            theme: VkDiagTheme::detect(),
        }
    }
}

impl Default for TerminalUI {
    fn default() -> Self {
        Self::new()
    }
}

impl UserInterface for TerminalUI {
    fn message(&mut self, msg: &str) {
        writeln!(self.term, "{}", msg).ok();
    }

    fn report(&mut self, report: &Report) {
        for line in format_report(&self.theme, report) {
            writeln!(self.term, "{}", line).ok();
        }
    }

    fn error(&mut self, msg: &str) {
        let mark = self.theme.error.apply_to('x');
        writeln!(Term::stderr(), "[{}] {}", mark, msg).ok();
    }

    fn choose_fix(&mut self, options: &[FixOption]) -> Result<Option<FixOption>> {
        prompt_fix(options, &self.term)
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        Box::new(ProgressSpinner::new(message))
    }

    fn wait_for_exit(&mut self) {
        writeln!(
            self.term,
            "{}",
            self.theme.dim.apply_to("Press any key to exit the tool...")
        )
        .ok();
        self.term.read_key().ok();
    }

    fn is_interactive(&self) -> bool {
        self.term.is_term()
    }
}

/// Create the appropriate UI based on interactivity.
pub fn create_ui(interactive: bool) -> Box<dyn UserInterface> {
    if interactive && Term::stdout().is_term() {
        Box::new(TerminalUI::new())
    } else {
        Box::new(NonInteractiveUI::new())
    }
}
