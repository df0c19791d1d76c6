//! `rainprice` library crate.
//!
//! The binary is a thin wrapper around this library so the pipeline can be
//! driven from tests with stub fetchers, without spawning processes or
//! touching the network.

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod plot;
pub mod report;
pub mod stats;
pub mod tui;
