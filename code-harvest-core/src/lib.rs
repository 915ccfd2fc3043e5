#![doc = "code-harvest-core: core logic library for code-harvest."]

//! This crate holds the search, aggregation and publishing pipeline for code-harvest.
//! Transport lives behind the traits in [`contract`]; the binary crate provides the
//! GitHub-backed implementation.
//!
//! # Usage
//! Build a [`config::HarvestConfig`], hand implementations of the [`contract`] traits to
//! [`synchronise::synchronise`], and inspect the returned report.

pub mod config;
pub mod contract;
pub mod error;
pub mod publish;
pub mod search;
pub mod synchronise;

pub use error::{HarvestError, PublishError};
