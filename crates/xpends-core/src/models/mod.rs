//! Data models for uploads, extraction results, and configuration.

pub mod config;
pub mod document;
pub mod receipt;
