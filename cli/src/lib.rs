//! Harbor CLI library — exposes modules for integration testing.

#![cfg_attr(test, allow(clippy::expect_used))]

pub mod app;
pub mod cli;
pub mod command_runner;
pub mod commands;
pub mod compose;
pub mod entropy;
pub mod environment;
pub mod error;
pub mod hooks;
pub mod lifecycle;
pub mod output;
pub mod paths;
pub mod registry;
pub mod resolver;
pub mod template;
