//! Non-interactive UI for redirected output and scripted runs.

use crate::error::Result;
use crate::scan::{FixOption, Report};

use super::output::{format_fix_option, format_menu_entry, format_report};
use super::prompts::{option_for_key, NOTHING_KEY, NOTHING_LABEL};
use super::theme::VkDiagTheme;
use super::{SpinnerHandle, UserInterface};

/// Environment variable holding the menu key to pick without prompting.
pub const FIX_CHOICE_ENV: &str = "VKDIAG_FIX";

/// UI implementation for non-interactive mode.
///
/// Output is uncolored. The fix menu is printed but never waits for input:
/// the choice comes from `VKDIAG_FIX`, defaulting to "do nothing".
pub struct NonInteractiveUI {
    theme: VkDiagTheme,
    fix_choice: Option<char>,
}

impl NonInteractiveUI {
    /// Create a new non-interactive UI.
    pub fn new() -> Self {
        let fix_choice = std::env::var(FIX_CHOICE_ENV)
            .ok()
            .and_then(|value| value.trim().chars().next());
        Self::with_choice(fix_choice)
    }

    /// Create with an explicit menu choice (for testing).
    pub fn with_choice(fix_choice: Option<char>) -> Self {
        Self {
            theme: VkDiagTheme::plain(),
            fix_choice,
        }
    }
}

impl Default for NonInteractiveUI {
    fn default() -> Self {
        Self::new()
    }
}

impl UserInterface for NonInteractiveUI {
    fn message(&mut self, msg: &str) {
        println!("{}", msg);
    }

    fn report(&mut self, report: &Report) {
        for line in format_report(&self.theme, report) {
            println!("{}", line);
        }
    }

    fn error(&mut self, msg: &str) {
        eprintln!("[x] {}", msg);
    }

    fn choose_fix(&mut self, options: &[FixOption]) -> Result<Option<FixOption>> {
        println!("There are some issues, what would you like to do?");
        for option in options {
            println!("{}", format_fix_option(&self.theme, *option));
        }
        println!("{}", format_menu_entry(&self.theme, NOTHING_KEY, NOTHING_LABEL));

        let choice = self
            .fix_choice
            .and_then(|key| option_for_key(options, key));
        let key = choice.map_or(NOTHING_KEY, |option| option.key());
        println!("Selected option: {}", key);
        Ok(choice)
    }

    fn start_spinner(&mut self, _message: &str) -> Box<dyn SpinnerHandle> {
        Box::new(NoopSpinner)
    }

    fn wait_for_exit(&mut self) {}

    fn is_interactive(&self) -> bool {
        false
    }
}

/// Spinner that prints nothing.
struct NoopSpinner;

impl SpinnerHandle for NoopSpinner {
    fn set_message(&mut self, _msg: &str) {}

    fn finish(&mut self) {}
}
