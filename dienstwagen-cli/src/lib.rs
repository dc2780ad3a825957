//! Command-line front end for comparing company car offers.

pub mod app;
pub mod cli;
pub mod logging;
pub mod output;
pub mod settings;
