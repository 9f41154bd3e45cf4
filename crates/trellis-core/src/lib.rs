//! Trellis Core - shared model for the template index service
//!
//! This crate holds the types every other Trellis crate agrees on:
//! the `TemplateEntry` that flows from the index builder to the
//! autocomplete widget, the error types, and the JSON configuration.
//!
//! # Example
//!
//! ```
//! use trellis_core::{EntryKind, TemplateEntry};
//!
//! let entry = TemplateEntry::directory("blog");
//! assert_eq!(entry.kind, EntryKind::Directory);
//! assert_eq!(entry.label, "blog/");
//! ```

pub mod config;
pub mod entry;
pub mod error;

pub use config::{
    AutocompleteSettings, Config, NativeMarkerSettings, RootConfig, ServerSettings, SiteRoot,
    CONFIG_DIR, CONFIG_FILE,
};
pub use entry::{EntryKind, TemplateEntry, TemplatesResponse, TEMPLATES_ENDPOINT};
pub use error::{ConfigError, IndexError, Result};
