//! Template index building.
//!
//! Walks each configured root for template files and folders, then
//! merges, deduplicates and sorts the entries into the list served to
//! the autocomplete widget.

use crate::roots::IndexRoot;
use ignore::{DirEntry, WalkBuilder};
use std::collections::HashSet;
use std::io;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};
use trellis_core::{Config, IndexError, Result, TemplateEntry, TemplatesResponse};

/// Folders starting with this are walked but not listed.
const RESERVED_PREFIX: char = '_';

/// Result of building the index.
#[derive(Debug, Clone)]
pub struct IndexResult {
    /// Unique entries, ascending by path.
    pub entries: Vec<TemplateEntry>,

    /// Roots that existed and were walked.
    pub roots_scanned: usize,

    /// Template files found, before deduplication.
    pub files_found: usize,

    /// Listed folders found, before deduplication.
    pub directories_found: usize,

    /// Entries dropped because an earlier root already had the path.
    pub duplicates_dropped: usize,

    /// Time taken in milliseconds.
    pub duration_ms: u64,
}

impl IndexResult {
    /// Wraps the entries as the HTTP response body.
    pub fn into_response(self) -> TemplatesResponse {
        TemplatesResponse {
            templates: self.entries,
        }
    }
}

/// Options for index building.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// Recognized template extensions, without the dot.
    pub extensions: Vec<String>,

    /// Follow symbolic links when walking directories.
    pub follow_symlinks: bool,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            extensions: vec!["twig".to_string()],
            follow_symlinks: false,
        }
    }
}

impl IndexOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            extensions: config.extensions.clone(),
            follow_symlinks: config.follow_symlinks,
        }
    }

    /// Returns the stem of `name` if it ends in a recognized extension.
    ///
    /// The longest matching extension wins, so `html.twig` beats `twig`
    /// when both are configured.
    fn strip_extension<'a>(&self, name: &'a str) -> Option<&'a str> {
        self.extensions
            .iter()
            .filter_map(|ext| {
                let stem = name.strip_suffix(ext.as_str())?.strip_suffix('.')?;
                (!stem.is_empty()).then_some((ext.len(), stem))
            })
            .max_by_key(|(len, _)| *len)
            .map(|(_, stem)| stem)
    }
}

/// Builds the template index across all roots.
///
/// Roots are walked in order and their entries merged; the first entry
/// seen for a path wins and the list is sorted by path. Missing roots
/// contribute nothing. A walk failure under a required root aborts the
/// build; under an optional root it is logged and the root is skipped.
///
/// # Example
///
/// ```no_run
/// use trellis_index::{build_index, IndexOptions, IndexRoot};
///
/// let roots = [IndexRoot::required("templates", "")];
/// let result = build_index(&roots, &IndexOptions::default()).unwrap();
/// println!("{} entries", result.entries.len());
/// ```
pub fn build_index(roots: &[IndexRoot], options: &IndexOptions) -> Result<IndexResult> {
    let start = Instant::now();
    let mut merged = Vec::new();
    let mut roots_scanned = 0;

    for root in roots {
        if !root.path.is_dir() {
            debug!("Skipping missing root {}", root.path.display());
            continue;
        }

        match scan_root(root, options) {
            Ok(entries) => {
                roots_scanned += 1;
                merged.extend(entries);
            }
            Err(e) if !root.required => {
                warn!("Skipping optional root {}: {}", root.path.display(), e);
            }
            Err(e) => return Err(e),
        }
    }

    let files_found = merged.iter().filter(|e| e.kind.is_file()).count();
    let directories_found = merged.len() - files_found;

    let mut seen: HashSet<String> = HashSet::with_capacity(merged.len());
    merged.retain(|entry| seen.insert(entry.path.clone()));
    let duplicates_dropped = files_found + directories_found - merged.len();

    merged.sort_by(|a, b| a.path.cmp(&b.path));

    let duration = start.elapsed();
    info!(
        "Indexed {} roots: {} entries ({} duplicates dropped) in {:?}",
        roots_scanned,
        merged.len(),
        duplicates_dropped,
        duration
    );

    Ok(IndexResult {
        entries: merged,
        roots_scanned,
        files_found,
        directories_found,
        duplicates_dropped,
        duration_ms: duration.as_millis() as u64,
    })
}

/// Walks a single root and returns its entries in walk order.
fn scan_root(root: &IndexRoot, options: &IndexOptions) -> Result<Vec<TemplateEntry>> {
    let mut entries = Vec::new();

    // Only the hidden-name rule applies; ignore files are not honored.
    let walker = WalkBuilder::new(&root.path)
        .standard_filters(false)
        .follow_links(options.follow_symlinks)
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry))
        .build();

    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) if is_vanished(&e) => {
                // Dangling links and entries removed mid-walk contribute nothing.
                debug!("Skipping missing entry under {}: {}", root.path.display(), e);
                continue;
            }
            Err(e) => {
                let message = e.to_string();
                let source = e.into_io_error().unwrap_or_else(|| io::Error::other(message));
                return Err(IndexError::walk(&root.path, source));
            }
        };

        if entry.depth() == 0 {
            continue;
        }

        let Some(relative) = relative_components(&root.path, entry.path()) else {
            continue;
        };
        let Some((name, parents)) = relative.split_last() else {
            continue;
        };
        let prefix = join_prefix(&root.prefix, parents);

        let is_dir = entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false);
        if is_dir {
            if !name.starts_with(RESERVED_PREFIX) {
                let path = join_path(&prefix, name);
                debug!("Folder: {}", path);
                entries.push(TemplateEntry::directory(path));
            }
        } else if entry.file_type().is_some_and(|ft| ft.is_file()) {
            let Some(stem) = options.strip_extension(name) else {
                continue;
            };
            let path = join_path(&prefix, stem);
            let full_label = (!prefix.is_empty()).then(|| nested_label(&prefix, stem));
            debug!("Template: {}", path);
            entries.push(TemplateEntry::file(path, full_label));
        }
    }

    Ok(entries)
}

fn is_vanished(error: &ignore::Error) -> bool {
    error.depth().is_some_and(|depth| depth > 0)
        && error
            .io_error()
            .is_some_and(|e| e.kind() == io::ErrorKind::NotFound)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn relative_components(root: &Path, path: &Path) -> Option<Vec<String>> {
    let relative = path.strip_prefix(root).ok()?;
    Some(
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect(),
    )
}

fn join_prefix(root_prefix: &str, parents: &[String]) -> String {
    std::iter::once(root_prefix)
        .chain(parents.iter().map(String::as_str))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}

/// Indented label for a nested template, e.g. `  └ card (blog/partials)`.
fn nested_label(prefix: &str, base_name: &str) -> String {
    let depth = prefix.matches('/').count();
    format!("{}└ {} ({})", "  ".repeat(depth), base_name, prefix)
}
