//! CLI support for the `timeweave` binary.

pub mod commands;
