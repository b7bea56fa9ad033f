//! Fix menu prompt.

use console::{style, Term};
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;

use crate::error::{Result, VkDiagError};
use crate::scan::FixOption;

use super::output::{format_fix_option, format_menu_entry};
use super::theme::VkDiagTheme;

/// Key of the menu entry that leaves everything as it is.
pub const NOTHING_KEY: char = 'n';

/// Label of the menu entry that leaves everything as it is.
pub const NOTHING_LABEL: &str = "Do nothing and exit (default)";

/// Convert dialoguer errors to VkDiagError.
fn map_dialoguer_err(e: dialoguer::Error) -> VkDiagError {
    VkDiagError::Io(e.into())
}

/// Dialoguer theme without the default yellow `?` prefix.
fn prompt_theme() -> ColorfulTheme {
    ColorfulTheme {
        prompt_prefix: style("".to_string()),
        ..ColorfulTheme::default()
    }
}

/// Menu labels for `options`, followed by the "do nothing" entry.
pub fn menu_labels(options: &[FixOption]) -> Vec<String> {
    let plain = VkDiagTheme::plain();
    options
        .iter()
        .map(|option| format_fix_option(&plain, *option))
        .chain(std::iter::once(format_menu_entry(
            &plain,
            NOTHING_KEY,
            NOTHING_LABEL,
        )))
        .collect()
}

/// Map a menu key to its option. `None` for the "do nothing" key and any
/// key that isn't offered.
pub fn option_for_key(options: &[FixOption], key: char) -> Option<FixOption> {
    let key = key.to_ascii_lowercase();
    options.iter().copied().find(|option| option.key() == key)
}

/// Ask which fix to apply. Escape and "do nothing" both return `None`.
pub fn prompt_fix(options: &[FixOption], term: &Term) -> Result<Option<FixOption>> {
    let labels = menu_labels(options);

    let selection = Select::with_theme(&prompt_theme())
        .with_prompt("There are some issues, what would you like to do?")
        .items(&labels)
        .default(labels.len() - 1)
        .interact_on_opt(term)
        .map_err(map_dialoguer_err)?;

    Ok(selection.and_then(|index| options.get(index).copied()))
}
