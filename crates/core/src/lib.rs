//! Core storage logic for cosgate.
//!
//! This crate contains the object storage adapter with ZERO web dependencies.
//! Configuration resolution, key building, naming and the case-insensitive
//! serve fallback all live here.
//!
//! # Modules
//!
//! - `storage` - Object storage adapter (save, exists, delete, read, serve)

pub mod storage;
