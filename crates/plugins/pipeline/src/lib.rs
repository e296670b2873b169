//! Export pipeline for jiradump.
//!
//! This crate turns the stream of compact issues into a CSV file:
//!
//! - **Markdown**: strip description markup down to plain text
//! - **Flatten**: splice custom fields into top-level columns
//! - **CSV**: encode rows and write the export file
//!
//! # Example
//!
//! ```ignore
//! use jiradump_pipeline::{export_to_csv, output_file_path, DescriptionPolicy};
//!
//! let path = output_file_path(&outdir, &project_ids);
//! let written = export_to_csv(issues, &spec, DescriptionPolicy::Drop, &path).await?;
//! ```

pub mod csv_export;
pub mod flatten;
pub mod markdown;

pub use csv_export::{export_to_csv, output_file_path};
pub use flatten::{flatten, DescriptionPolicy, ExportRecord};
pub use markdown::strip_markdown;
