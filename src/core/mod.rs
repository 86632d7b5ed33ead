//! core
//!
//! Core types shared by the metadata, engine and cli layers.
//!
//! # Modules
//!
//! - [`types`] - Identities: CommandTypeId, FilterKey, PropertyId
//! - [`value`] - Option value types and typed values
//! - [`naming`] - Option naming rules and reserved tokens
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing keeps type identities and display names apart
//! - Schemas are strict and self-describing
//! - Nothing here performs parsing of command-line text

pub mod config;
pub mod naming;
pub mod types;
pub mod value;
