//! solarplan — a staged pipeline that turns county planning documents
//! (agendas, minutes, staff reports) into structured records about solar
//! land-use projects and the public sentiment around them.
//!
//! Stages, each resumable through the staging database:
//! ingest → extract → screen → analyze → export.

pub mod cli;
pub mod config;
pub mod db;
pub mod export;
pub mod models;
pub mod pipeline;
