//! Trellis Index - template discovery
//!
//! This crate handles the filesystem side of things:
//! - Resolving which directories to scan (global root, per-site folders)
//! - Walking them for template files and folders
//! - Merging, deduplicating and sorting the result
//!
//! Hidden entries are skipped entirely; `_`-prefixed folders are walked
//! but never listed themselves.

mod indexer;
mod roots;

pub use indexer::{build_index, IndexOptions, IndexResult};
pub use roots::{resolve_roots, roots_from_config, IndexRoot};
