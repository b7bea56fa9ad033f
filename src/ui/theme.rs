//! Visual theme and styling.

use console::Style;

use crate::scan::Tone;

/// Colors used for report and menu output.
#[derive(Debug, Clone)]
pub struct VkDiagTheme {
    /// Healthy entries and up-to-date versions (green).
    pub success: Style,
    /// Problems that can wait or were fixed partially (yellow).
    pub warning: Style,
    /// Broken registrations and failed fixes (red).
    pub error: Style,
    /// Hints and menu keys (cyan).
    pub info: Style,
    /// Section headings (bold).
    pub heading: Style,
    /// Secondary text such as prompts.
    pub dim: Style,
}

impl Default for VkDiagTheme {
    fn default() -> Self {
        Self::new()
    }
}

impl VkDiagTheme {
    /// Create the default colored theme.
    pub fn new() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().yellow(),
            error: Style::new().red(),
            info: Style::new().cyan(),
            heading: Style::new().bold(),
            dim: Style::new().dim(),
        }
    }

    /// Create a theme without colors (for non-TTY or --no-color).
    pub fn plain() -> Self {
        Self {
            success: Style::new(),
            warning: Style::new(),
            error: Style::new(),
            info: Style::new(),
            heading: Style::new(),
            dim: Style::new(),
        }
    }

    /// Pick the theme for the current terminal.
    pub fn detect() -> Self {
        if should_use_colors() {
            Self::new()
        } else {
            Self::plain()
        }
    }

    /// Style for a report tone. `Default` leaves text uncolored.
    pub fn tone(&self, tone: Tone) -> Style {
        match tone {
            Tone::Default => Style::new(),
            Tone::Green => self.success.clone(),
            Tone::Yellow => self.warning.clone(),
            Tone::Red => self.error.clone(),
            Tone::Cyan => self.info.clone(),
        }
    }
}

/// Check if colors should be enabled.
pub fn should_use_colors() -> bool {
    // https://no-color.org/
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    console::Term::stdout().is_term()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_theme_does_not_style() {
        let theme = VkDiagTheme::plain();
        for tone in [Tone::Default, Tone::Green, Tone::Yellow, Tone::Red, Tone::Cyan] {
            let styled = theme.tone(tone).apply_to("x").to_string();
            assert_eq!(styled, "x");
        }
    }

    #[test]
    fn default_tone_is_unstyled_in_color_theme() {
        let theme = VkDiagTheme::new();
        let styled = theme
            .tone(Tone::Default)
            .force_styling(true)
            .apply_to("x")
            .to_string();
        assert_eq!(styled, "x");
    }

    #[test]
    fn colored_tones_emit_escape_codes() {
        let theme = VkDiagTheme::new();
        let styled = theme
            .tone(Tone::Red)
            .force_styling(true)
            .apply_to("x")
            .to_string();
        assert!(styled.contains("\u{1b}["));
        assert!(styled.contains('x'));
    }
}
