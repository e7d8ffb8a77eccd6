//! Export of a completed run.
//!
//! # Submodules
//!
//! - [`markdown`]: writes the final article as a Markdown document
//! - [`json`]: writes the full [`RunReport`](crate::models::RunReport)
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── 2025-05-06_acme-merger.md      # Final article
//! └── 2025-05-06/
//!     └── acme-merger.json           # Run report
//! ```
//!
//! A second run on the same topic and day overwrites both files.

pub mod json;
pub mod markdown;
