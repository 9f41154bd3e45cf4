//! Client-side filtering of the cached index.

use trellis_core::TemplateEntry;

/// Rows shown in the dropdown at most.
pub const DEFAULT_MAX_RESULTS: usize = 20;

/// Returns up to `limit` entries whose path contains `query`,
/// ignoring case, in index order.
///
/// ```
/// use trellis_complete::filter_entries;
/// use trellis_core::TemplateEntry;
///
/// let entries = vec![
///     TemplateEntry::file("blog/post", None),
///     TemplateEntry::directory("blog"),
///     TemplateEntry::file("index", None),
/// ];
/// let paths: Vec<_> = filter_entries(&entries, "BLO", 20)
///     .into_iter()
///     .map(|e| e.path.as_str())
///     .collect();
/// assert_eq!(paths, vec!["blog/post", "blog"]);
/// ```
pub fn filter_entries<'a>(
    entries: &'a [TemplateEntry],
    query: &str,
    limit: usize,
) -> Vec<&'a TemplateEntry> {
    let query = query.to_lowercase();
    entries
        .iter()
        .filter(|entry| entry.matches(&query))
        .take(limit)
        .collect()
}
