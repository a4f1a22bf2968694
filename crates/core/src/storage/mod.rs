//! Object storage adapter backed by Apache OpenDAL.
//!
//! Replaces local disk storage for uploaded assets. Production runs against
//! Tencent Cloud COS; local filesystem and in-memory backends exist for
//! development and tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       StorageService                            │
//! │  save / exists / delete / read / serve                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ StorageHost (naming)       │ AdapterConfig (host, prefix, mode) │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                      Apache OpenDAL Operator                    │
//! │ op.write_with(key, data)   │ op.stat(key)                       │
//! │ op.read(key)               │ op.delete(key)                     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod host;
mod key;
mod service;

pub use config::{
    AdapterConfig, COS_DEFAULT_DOMAIN, DEFAULT_PROTOCOL, StorageConfig, StorageProvider, env,
};
pub use error::StorageError;
pub use host::{DatedDirectories, ExistenceProbe, FlatDirectory, StorageHost, StoredFile};
pub use key::{IMAGE_EXTENSIONS, case_variants, join_key};
pub use service::{ReadOptions, ServeHandler, ServedObject, StorageService, UPLOAD_CACHE_CONTROL};
