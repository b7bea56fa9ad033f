//! Aggregate scan results.
//!
//! Every scanner owns a fresh [`ScanOutcome`] and returns it alongside a
//! [`Report`]. The orchestrator merges outcomes with
//! [`ScanOutcome::merge`]. Flags that start out `true` can only ever be
//! downgraded, both by the recording methods and by merging.

use super::ScanOptions;

/// Status marker shown in brackets in front of a report line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusMark {
    /// `+` nothing wrong.
    Ok,
    /// `!` an issue that deserves attention.
    Warning,
    /// `x` a broken entry or hard failure.
    Error,
    /// `v` proper Vulkan driver registration.
    Vulkan,
    /// `-` an inactive device.
    Inactive,
    /// ` ` a disabled entry.
    Disabled,
    /// `i` an informational hint.
    Info,
}

impl StatusMark {
    /// The marker character.
    pub fn symbol(&self) -> char {
        match self {
            StatusMark::Ok => '+',
            StatusMark::Warning => '!',
            StatusMark::Error => 'x',
            StatusMark::Vulkan => 'v',
            StatusMark::Inactive => '-',
            StatusMark::Disabled => ' ',
            StatusMark::Info => 'i',
        }
    }
}

/// Color of a status marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Default,
    Green,
    Yellow,
    Red,
    Cyan,
}

/// One line of scanner output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportLine {
    Blank,
    Heading(String),
    Status {
        mark: StatusMark,
        tone: Tone,
        text: String,
    },
}

impl ReportLine {
    /// The line's text, if any.
    pub fn text(&self) -> &str {
        match self {
            ReportLine::Blank => "",
            ReportLine::Heading(text) => text,
            ReportLine::Status { text, .. } => text,
        }
    }
}

/// Ordered output of a scanner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    lines: Vec<ReportLine>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blank(&mut self) {
        self.lines.push(ReportLine::Blank);
    }

    pub fn heading(&mut self, text: impl Into<String>) {
        self.lines.push(ReportLine::Heading(text.into()));
    }

    pub fn status(&mut self, tone: Tone, mark: StatusMark, text: impl Into<String>) {
        self.lines.push(ReportLine::Status {
            mark,
            tone,
            text: text.into(),
        });
    }

    pub fn lines(&self) -> &[ReportLine] {
        &self.lines
    }

    pub fn extend(&mut self, other: Report) {
        self.lines.extend(other.lines);
    }

    /// Find the first status line whose text contains `needle`.
    pub fn find(&self, needle: &str) -> Option<&ReportLine> {
        self.lines
            .iter()
            .find(|line| matches!(line, ReportLine::Status { .. }) && line.text().contains(needle))
    }

    /// Whether any line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.text().contains(needle))
    }
}

/// Process-wide scan flags, threaded explicitly through each scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOutcome {
    has_broken_entries: bool,
    has_proper_vulkan_drivers: bool,
    has_explicit_driver_reg: bool,
    has_conflicting_layers: bool,
    disabled_conflicting_layers: bool,
    removed_explicit_driver_reg: bool,
    fixed_everything: bool,
    everything_is_fine: bool,
}

impl Default for ScanOutcome {
    fn default() -> Self {
        Self {
            has_broken_entries: false,
            has_proper_vulkan_drivers: false,
            has_explicit_driver_reg: false,
            has_conflicting_layers: false,
            disabled_conflicting_layers: true,
            removed_explicit_driver_reg: true,
            fixed_everything: true,
            everything_is_fine: true,
        }
    }
}

impl ScanOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_broken_entries(&self) -> bool {
        self.has_broken_entries
    }

    pub fn has_proper_vulkan_drivers(&self) -> bool {
        self.has_proper_vulkan_drivers
    }

    pub fn has_explicit_driver_reg(&self) -> bool {
        self.has_explicit_driver_reg
    }

    pub fn has_conflicting_layers(&self) -> bool {
        self.has_conflicting_layers
    }

    pub fn disabled_conflicting_layers(&self) -> bool {
        self.disabled_conflicting_layers
    }

    pub fn removed_explicit_driver_reg(&self) -> bool {
        self.removed_explicit_driver_reg
    }

    pub fn fixed_everything(&self) -> bool {
        self.fixed_everything
    }

    pub fn everything_is_fine(&self) -> bool {
        self.everything_is_fine
    }

    pub(crate) fn record_broken_entry(&mut self) {
        self.has_broken_entries = true;
    }

    pub(crate) fn record_proper_vulkan_driver(&mut self) {
        self.has_proper_vulkan_drivers = true;
    }

    pub(crate) fn record_explicit_driver_reg(&mut self) {
        self.has_explicit_driver_reg = true;
    }

    pub(crate) fn record_conflicting_layer(&mut self) {
        self.has_conflicting_layers = true;
    }

    pub(crate) fn downgrade_disabled_conflicting_layers(&mut self) {
        self.disabled_conflicting_layers = false;
    }

    pub(crate) fn downgrade_removed_explicit_driver_reg(&mut self) {
        self.removed_explicit_driver_reg = false;
    }

    pub(crate) fn downgrade_fixed_everything(&mut self) {
        self.fixed_everything = false;
    }

    pub(crate) fn downgrade_everything_is_fine(&mut self) {
        self.everything_is_fine = false;
    }

    /// Fold another scanner's outcome into this one.
    pub fn merge(&mut self, other: &ScanOutcome) {
        self.has_broken_entries |= other.has_broken_entries;
        self.has_proper_vulkan_drivers |= other.has_proper_vulkan_drivers;
        self.has_explicit_driver_reg |= other.has_explicit_driver_reg;
        self.has_conflicting_layers |= other.has_conflicting_layers;
        self.disabled_conflicting_layers &= other.disabled_conflicting_layers;
        self.removed_explicit_driver_reg &= other.removed_explicit_driver_reg;
        self.fixed_everything &= other.fixed_everything;
        self.everything_is_fine &= other.everything_is_fine;
    }

    /// Fixes that a re-run in fix mode could still apply.
    pub fn fix_options(&self) -> Vec<FixOption> {
        let mut options = Vec::new();
        if self.has_broken_entries && !self.fixed_everything {
            options.push(FixOption::RemoveBroken);
        }
        if self.has_conflicting_layers && !self.disabled_conflicting_layers {
            options.push(FixOption::DisableLayers);
        }
        if self.has_explicit_driver_reg
            && self.has_proper_vulkan_drivers
            && !self.removed_explicit_driver_reg
        {
            options.push(FixOption::ClearExplicit);
        }
        if options.len() > 1 {
            options.push(FixOption::All);
        }
        options
    }

    /// Whether the run found nothing left to fix or warn about.
    pub fn is_clean(&self) -> bool {
        self.fix_options().is_empty() && self.everything_is_fine
    }
}

/// A fix the user can choose after a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixOption {
    RemoveBroken,
    DisableLayers,
    ClearExplicit,
    All,
}

impl FixOption {
    /// Menu key.
    pub fn key(&self) -> char {
        match self {
            FixOption::RemoveBroken => 'f',
            FixOption::DisableLayers => 'd',
            FixOption::ClearExplicit => 'c',
            FixOption::All => 'a',
        }
    }

    /// Menu label.
    pub fn label(&self) -> &'static str {
        match self {
            FixOption::RemoveBroken => "Remove broken entries",
            FixOption::DisableLayers => "Disable incompatible Vulkan layers",
            FixOption::ClearExplicit => "Clear explicit (legacy) Vulkan driver registration",
            FixOption::All => "All of the above",
        }
    }

    /// Turn on the scan modes this option needs.
    pub fn apply(&self, options: ScanOptions) -> ScanOptions {
        match self {
            FixOption::RemoveBroken => ScanOptions {
                autofix: true,
                ..options
            },
            FixOption::DisableLayers => ScanOptions {
                disable_layers: true,
                ..options
            },
            FixOption::ClearExplicit => ScanOptions {
                clear: true,
                ..options
            },
            FixOption::All => ScanOptions {
                autofix: true,
                clear: true,
                disable_layers: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_initial_flags() {
        let outcome = ScanOutcome::new();
        assert!(!outcome.has_broken_entries());
        assert!(!outcome.has_proper_vulkan_drivers());
        assert!(!outcome.has_explicit_driver_reg());
        assert!(!outcome.has_conflicting_layers());
        assert!(outcome.disabled_conflicting_layers());
        assert!(outcome.removed_explicit_driver_reg());
        assert!(outcome.fixed_everything());
        assert!(outcome.everything_is_fine());
        assert!(outcome.is_clean());
    }

    #[test]
    fn merge_never_upgrades_downgraded_flags() {
        let mut failed = ScanOutcome::new();
        failed.downgrade_fixed_everything();
        failed.downgrade_everything_is_fine();

        failed.merge(&ScanOutcome::new());
        assert!(!failed.fixed_everything());
        assert!(!failed.everything_is_fine());

        let mut fresh = ScanOutcome::new();
        let snapshot = failed;
        fresh.merge(&snapshot);
        assert!(!fresh.fixed_everything());
    }

    #[test]
    fn merge_ors_discovery_flags() {
        let mut a = ScanOutcome::new();
        let mut b = ScanOutcome::new();
        b.record_proper_vulkan_driver();
        b.record_conflicting_layer();
        a.merge(&b);
        assert!(a.has_proper_vulkan_drivers());
        assert!(a.has_conflicting_layers());
        assert!(!a.has_broken_entries());
    }

    #[test]
    fn fix_options_follow_unfixed_issues() {
        let mut outcome = ScanOutcome::new();
        outcome.record_broken_entry();
        assert!(outcome.fix_options().is_empty());

        outcome.downgrade_fixed_everything();
        assert_eq!(outcome.fix_options(), vec![FixOption::RemoveBroken]);

        outcome.record_conflicting_layer();
        outcome.downgrade_disabled_conflicting_layers();
        assert_eq!(
            outcome.fix_options(),
            vec![
                FixOption::RemoveBroken,
                FixOption::DisableLayers,
                FixOption::All
            ]
        );
    }

    #[test]
    fn clear_option_requires_proper_drivers() {
        let mut outcome = ScanOutcome::new();
        outcome.record_explicit_driver_reg();
        outcome.downgrade_removed_explicit_driver_reg();
        assert!(outcome.fix_options().is_empty());

        outcome.record_proper_vulkan_driver();
        assert_eq!(outcome.fix_options(), vec![FixOption::ClearExplicit]);
    }

    #[test]
    fn fix_option_enables_modes() {
        let base = ScanOptions::default();
        assert!(FixOption::RemoveBroken.apply(base).autofix);
        assert!(FixOption::DisableLayers.apply(base).disable_layers);
        assert!(FixOption::ClearExplicit.apply(base).clear);
        let all = FixOption::All.apply(base);
        assert!(all.autofix && all.clear && all.disable_layers);
        assert_eq!(FixOption::All.key(), 'a');
    }

    #[test]
    fn status_mark_symbols() {
        let symbols: String = [
            StatusMark::Ok,
            StatusMark::Warning,
            StatusMark::Error,
            StatusMark::Vulkan,
            StatusMark::Inactive,
            StatusMark::Disabled,
            StatusMark::Info,
        ]
        .iter()
        .map(StatusMark::symbol)
        .collect();
        assert_eq!(symbols, "+!xv- i");
    }

    #[test]
    fn report_find_skips_headings() {
        let mut report = Report::new();
        report.heading("Found 1 active GPU:");
        report.status(Tone::Green, StatusMark::Ok, "GPU");
        assert!(report.find("Found").is_none());
        assert!(report.contains("Found"));
        assert!(report.find("GPU").is_some());
    }
}
