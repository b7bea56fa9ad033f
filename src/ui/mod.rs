//! User interface components.
//!
//! This module provides:
//! - [`UserInterface`] trait for UI abstraction
//! - [`TerminalUI`] for interactive terminal usage
//! - [`NonInteractiveUI`] for redirected output and scripted runs
//! - Report formatting, the fix menu prompt, and a spinner
//!
//! # Example
//!
//! ```
//! use vkdiag::scan::{Report, StatusMark, Tone};
//! use vkdiag::ui::{format_report, VkDiagTheme};
//!
//! let mut report = Report::new();
//! report.status(Tone::Green, StatusMark::Vulkan, "    Proper Vulkan driver registration");
//!
//! let lines = format_report(&VkDiagTheme::plain(), &report);
//! assert_eq!(lines, vec!["    [v] Proper Vulkan driver registration"]);
//! ```

pub mod mock;
pub mod non_interactive;
pub mod output;
pub mod prompts;
pub mod spinner;
pub mod terminal;
pub mod theme;

pub use mock::{MockSpinner, MockUI};
pub use non_interactive::{NonInteractiveUI, FIX_CHOICE_ENV};
pub use output::{format_fix_option, format_line, format_menu_entry, format_report};
pub use prompts::prompt_fix;
pub use spinner::ProgressSpinner;
pub use terminal::{create_ui, TerminalUI};
pub use theme::{should_use_colors, VkDiagTheme};

use crate::error::Result;
use crate::scan::{FixOption, Report};

/// Trait for user interface interactions.
///
/// This trait allows mocking the UI in tests.
pub trait UserInterface {
    /// Display a plain message line.
    fn message(&mut self, msg: &str);

    /// Display a scan or version report.
    fn report(&mut self, report: &Report);

    /// Display an error.
    fn error(&mut self, msg: &str);

    /// Offer the fix menu. `None` means leave everything as it is.
    fn choose_fix(&mut self, options: &[FixOption]) -> Result<Option<FixOption>>;

    /// Start a spinner.
    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle>;

    /// Keep the window open until a key is pressed.
    fn wait_for_exit(&mut self);

    /// Check if running in interactive mode.
    fn is_interactive(&self) -> bool;
}

/// Handle for controlling a spinner.
pub trait SpinnerHandle {
    /// Update the spinner message.
    fn set_message(&mut self, msg: &str);

    /// Stop and erase the spinner.
    fn finish(&mut self);
}
