#![doc = "notion-docs-sync-core: core logic library for notion-docs-sync."]

//! This crate contains the data models and pipeline for publishing a
//! directory of markdown documentation to a Notion page tree. The HTTP client
//! lives in the CLI crate; everything here talks to Notion only through the
//! [`contract::Publisher`] trait.
//!
//! # Usage
//! Add this as a dependency for markdown conversion, docs scanning and the
//! [`synchronise::synchronise`] pipeline.

pub mod block;
pub mod config;
pub mod contract;
pub mod docs;
pub mod dry_run;
pub mod markdown;
pub mod payload;
pub mod synchronise;
pub mod target;
