//! VkDiag - Vulkan driver and layer registration diagnostics.
//!
//! VkDiag inspects the Windows registry entries that tell the Vulkan loader
//! where to find drivers and layers, reports what it finds, and optionally
//! repairs broken, incompatible, or legacy registrations.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration loading and parsing
//! - [`elevation`] - Privilege elevation before mutations
//! - [`error`] - Error types and result aliases
//! - [`probe`] - File existence and version probing
//! - [`scan`] - Registration analysis and repair
//! - [`store`] - Registry store abstraction and the snapshot store
//! - [`ui`] - Report rendering, the fix menu, and spinners
//! - [`updates`] - Release checking
//! - [`version`] - Four-part version numbers
//!
//! # Example
//!
//! ```
//! use vkdiag::elevation::NotRequired;
//! use vkdiag::probe::MemoryProber;
//! use vkdiag::scan::{run_scans, ScanOptions, ScanSettings};
//! use vkdiag::store::{Hive, MemoryStore, RegValue};
//!
//! let mut store = MemoryStore::new().with_value(
//!     Hive::LocalMachine,
//!     r"SOFTWARE\Khronos\Vulkan\ImplicitLayers",
//!     r"C:\missing\layer.json",
//!     RegValue::Dword(0),
//! );
//! let prober = MemoryProber::new();
//!
//! let run = run_scans(
//!     &mut store,
//!     &prober,
//!     &mut NotRequired,
//!     ScanOptions::default(),
//!     &ScanSettings::default(),
//! );
//! assert!(run.outcome.has_broken_entries());
//! assert!(!run.outcome.fixed_everything());
//! ```

pub mod cli;
pub mod config;
pub mod elevation;
pub mod error;
pub mod probe;
pub mod scan;
pub mod store;
pub mod ui;
pub mod updates;
pub mod version;

pub use error::{Result, VkDiagError};
