//! Report generation module.
//!
//! [`EdaReport`] collects the results of one pipeline run and is suitable for:
//! - JSON output to stdout (`--json` CLI flag)
//! - JSON file output (`--emit-report` CLI flag)
//! - Programmatic access in library mode
//!
//! # Example
//!
//! ```rust,ignore
//! use listing_eda::reporting::ReportGenerator;
//!
//! let report = pipeline.run("data/AB_NYC_2019.csv")?;
//! println!("{}", ReportGenerator::to_json(&report)?);
//!
//! let generator = ReportGenerator::new(PathBuf::from("outputs"));
//! generator.write_report_to_file(&report, "AB_NYC_2019")?;
//! ```

mod generator;

pub use generator::{EdaReport, ReportGenerator, TrimSummary};
