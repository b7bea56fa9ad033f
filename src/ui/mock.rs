//! Mock UI implementation for testing.
//!
//! `MockUI` implements the `UserInterface` trait and captures everything
//! shown for later assertion. Fix menu answers are queued up front.
//!
//! # Example
//!
//! ```
//! use vkdiag::scan::FixOption;
//! use vkdiag::ui::{MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.queue_fix_choice(Some(FixOption::RemoveBroken));
//!
//! ui.message("Everything seems to be fine.");
//! let choice = ui.choose_fix(&[FixOption::RemoveBroken]).unwrap();
//!
//! assert_eq!(choice, Some(FixOption::RemoveBroken));
//! assert!(ui.has_message("Everything seems to be fine."));
//! assert_eq!(ui.menus_shown().len(), 1);
//! ```

use std::collections::VecDeque;

use crate::error::Result;
use crate::scan::{FixOption, Report};

use super::output::format_report;
use super::theme::VkDiagTheme;
use super::{SpinnerHandle, UserInterface};

/// Mock UI implementation for testing.
#[derive(Debug, Default)]
pub struct MockUI {
    interactive: bool,
    lines: Vec<String>,
    messages: Vec<String>,
    errors: Vec<String>,
    spinners: Vec<String>,
    menus: Vec<Vec<FixOption>>,
    fix_choices: VecDeque<Option<FixOption>>,
    exit_waits: usize,
}

impl MockUI {
    /// Create a new MockUI.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the answer for the next fix menu. An empty queue answers `None`.
    pub fn queue_fix_choice(&mut self, choice: Option<FixOption>) {
        self.fix_choices.push_back(choice);
    }

    /// Set whether the UI reports itself as interactive.
    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    /// Every rendered report line and message, in order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Messages shown with `message()`.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Errors shown with `error()`.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Spinner messages started.
    pub fn spinners(&self) -> &[String] {
        &self.spinners
    }

    /// Options offered by each fix menu shown.
    pub fn menus_shown(&self) -> &[Vec<FixOption>] {
        &self.menus
    }

    /// How many times the UI waited for a key before exit.
    pub fn exit_waits(&self) -> usize {
        self.exit_waits
    }

    /// Whether a message was shown.
    pub fn has_message(&self, msg: &str) -> bool {
        self.messages.iter().any(|m| m == msg)
    }

    /// Whether any rendered line contains `needle`.
    pub fn output_contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.contains(needle))
    }
}

impl UserInterface for MockUI {
    fn message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
        self.lines.push(msg.to_string());
    }

    fn report(&mut self, report: &Report) {
        self.lines
            .extend(format_report(&VkDiagTheme::plain(), report));
    }

    fn error(&mut self, msg: &str) {
        self.errors.push(msg.to_string());
    }

    fn choose_fix(&mut self, options: &[FixOption]) -> Result<Option<FixOption>> {
        self.menus.push(options.to_vec());
        Ok(self.fix_choices.pop_front().flatten())
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        self.spinners.push(message.to_string());
        Box::new(MockSpinner::new())
    }

    fn wait_for_exit(&mut self) {
        self.exit_waits += 1;
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }
}

/// Mock spinner that records its updates.
#[derive(Debug, Default)]
pub struct MockSpinner {
    messages: Vec<String>,
    finished: bool,
}

impl MockSpinner {
    /// Create a new mock spinner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages set on the spinner.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Whether the spinner was finished.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl SpinnerHandle for MockSpinner {
    fn set_message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}
