//! The diagnose command.
//!
//! Loads a registry snapshot, prints the version and scan reports, and
//! offers the fix menu. A chosen fix re-runs the scans with the matching
//! modes turned on; `--output` then writes the repaired snapshot.

use chrono::Utc;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::cli::args::DiagnoseArgs;
use crate::config::{load_config, VkDiagConfig};
use crate::elevation::{Elevation, NotRequired};
use crate::error::Result;
use crate::probe::{FileProber, FsProber};
use crate::scan::{run_scans, Report, ScanOptions, ScanRun, ScanSettings, StatusMark, Tone};
use crate::store::{MemoryStore, RegistryStore};
use crate::ui::UserInterface;
use crate::updates::{check_for_updates, version_report, VERSION};

use super::dispatcher::{Command, CommandResult};

/// Printed before the fix menu and at the end of a clean run.
pub const SCREENSHOT_HINT: &str = "Remember to screenshot or copy this screen content for support.";

/// Printed when no fix is offered and nothing needs attention.
pub const ALL_FINE: &str = "Everything seems to be fine.";

/// The diagnose command implementation.
pub struct DiagnoseCommand {
    args: DiagnoseArgs,
    config_path: Option<PathBuf>,
}

impl DiagnoseCommand {
    /// Create a new diagnose command.
    pub fn new(args: DiagnoseArgs, config_path: Option<PathBuf>) -> Self {
        Self { args, config_path }
    }

    fn show_version(&self, ui: &mut dyn UserInterface, config: &VkDiagConfig) {
        if self.args.no_update_check || !config.updates.check {
            debug!("Update check disabled");
            let mut report = Report::new();
            report.status(
                Tone::Default,
                StatusMark::Ok,
                format!("VkDiag version: {}", VERSION),
            );
            ui.report(&report);
            return;
        }

        let mut spinner = ui.start_spinner("Checking for updates...");
        let check = check_for_updates(&config.updates.releases_url);
        spinner.finish();
        ui.report(&version_report(VERSION, &check));
    }
}

impl Command for DiagnoseCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = load_config(self.config_path.as_deref())?;

        let Some(snapshot) = self.args.snapshot.as_deref() else {
            ui.error("No registry snapshot given; pass --snapshot <FILE> or set VKDIAG_SNAPSHOT");
            return Ok(CommandResult::failure(2));
        };

        debug!("Loading registry snapshot {}", snapshot.display());
        let mut store = MemoryStore::load_snapshot(snapshot)?;

        self.show_version(ui, &config);

        let settings = config.scan_settings(Utc::now());
        let run = diagnose(
            ui,
            &mut store,
            &FsProber,
            &mut NotRequired,
            self.args.scan_options(),
            &settings,
        )?;
        debug!("Final outcome: {:?}", run.outcome);

        if let Some(output) = &self.args.output {
            store.save_snapshot(output)?;
            info!("Wrote registry snapshot to {}", output.display());
        }

        Ok(CommandResult::success())
    }
}

/// Scan, report, and offer fixes until the user is done.
///
/// Returns the last scan run.
pub fn diagnose(
    ui: &mut dyn UserInterface,
    store: &mut dyn RegistryStore,
    prober: &dyn FileProber,
    elevation: &mut dyn Elevation,
    mut options: ScanOptions,
    settings: &ScanSettings,
) -> Result<ScanRun> {
    loop {
        let run = run_scans(store, prober, elevation, options, settings);
        ui.report(&run.report);
        if run.found_inactive {
            debug!("Found inactive GPUs");
        }

        let fixes = run.outcome.fix_options();
        if fixes.is_empty() {
            if run.outcome.everything_is_fine() {
                ui.message(ALL_FINE);
            }
            ui.message("");
            ui.message(SCREENSHOT_HINT);
            ui.message("");
            if ui.is_interactive() {
                ui.wait_for_exit();
            }
            return Ok(run);
        }

        ui.message("");
        ui.message(SCREENSHOT_HINT);
        ui.message("");

        match ui.choose_fix(&fixes)? {
            Some(fix) => {
                options = fix.apply(options);
                debug!("Re-running with {:?}", options);
                ui.message("");
            }
            None => return Ok(run),
        }
    }
}
