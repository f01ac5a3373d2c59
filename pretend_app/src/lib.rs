//! # pretend_app
//!
//! Command-line front end for the Pretend API client

pub mod cli;
pub mod config_loader;
pub mod lookup;
pub mod tracing_setup;
