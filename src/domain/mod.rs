//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the commodity registry (`Commodity`) and run configuration (`AnalysisConfig`)
//! - series and aligned records (`DailySeries`, `WeatherTable`, `AlignedRecord`)
//! - result records (`DescriptiveStats`, `ComparisonResult`, `ConclusionReport`)

pub mod types;

pub use types::*;
