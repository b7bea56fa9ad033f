//! Report line formatting.
//!
//! Status lines render as `<indent>[<mark>] <text>`: the leading whitespace
//! of the text is kept in front of the bracket and only the mark is colored.

use crate::scan::{FixOption, Report, ReportLine, Tone};

use super::theme::VkDiagTheme;

/// Format one report line.
pub fn format_line(theme: &VkDiagTheme, line: &ReportLine) -> String {
    match line {
        ReportLine::Blank => String::new(),
        ReportLine::Heading(text) => theme.heading.apply_to(text).to_string(),
        ReportLine::Status { mark, tone, text } => {
            format_status(theme, *tone, &mark.symbol().to_string(), text)
        }
    }
}

/// Format a whole report, one entry per line.
pub fn format_report(theme: &VkDiagTheme, report: &Report) -> Vec<String> {
    report
        .lines()
        .iter()
        .map(|line| format_line(theme, line))
        .collect()
}

/// Format a fix menu entry, e.g. `[f] Remove broken entries`.
pub fn format_menu_entry(theme: &VkDiagTheme, key: char, label: &str) -> String {
    format_status(theme, Tone::Cyan, &key.to_string(), label)
}

/// Format a fix option as a menu entry.
pub fn format_fix_option(theme: &VkDiagTheme, option: FixOption) -> String {
    format_menu_entry(theme, option.key(), option.label())
}

fn format_status(theme: &VkDiagTheme, tone: Tone, status: &str, text: &str) -> String {
    let trimmed = text.trim_start();
    let indent = &text[..text.len() - trimmed.len()];
    format!(
        "{}[{}] {}",
        indent,
        theme.tone(tone).apply_to(status),
        trimmed
    )
}
