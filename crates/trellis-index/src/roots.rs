//! Root resolution.
//!
//! Turns deployment configuration into the ordered list of directories
//! the builder walks. Order matters: on duplicate paths the first root
//! wins.

use std::path::{Path, PathBuf};
use trellis_core::{Config, SiteRoot};

/// A directory to scan and the prefix its entries are listed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRoot {
    pub path: PathBuf,

    /// Prepended to every path found below this root. No leading or
    /// trailing slash.
    pub prefix: String,

    /// When set, a walk failure aborts the whole build. Otherwise the
    /// root contributes nothing and the build carries on.
    pub required: bool,
}

impl IndexRoot {
    /// A primary root: failures while walking it are fatal.
    pub fn required(path: impl Into<PathBuf>, prefix: impl AsRef<str>) -> Self {
        Self {
            path: path.into(),
            prefix: normalize_prefix(prefix.as_ref()),
            required: true,
        }
    }

    /// A secondary root that may be absent or unreadable.
    pub fn optional(path: impl Into<PathBuf>, prefix: impl AsRef<str>) -> Self {
        Self {
            required: false,
            ..Self::required(path, prefix)
        }
    }
}

fn normalize_prefix(prefix: &str) -> String {
    prefix.trim_matches('/').to_string()
}

/// Builds the root list for a templates directory and its sites.
///
/// Each site contributes `templates_path/<folder>` listed under
/// `<folder>/`, in declaration order. The global directory comes last
/// with an empty prefix, so site-specific folders win on duplicates.
pub fn resolve_roots(templates_path: &Path, sites: &[SiteRoot]) -> Vec<IndexRoot> {
    let mut roots: Vec<IndexRoot> = sites
        .iter()
        .map(|site| IndexRoot::optional(templates_path.join(site.folder()), site.folder()))
        .collect();
    roots.push(IndexRoot::required(templates_path, ""));
    roots
}

/// Resolves the roots described by `config`, relative to `base`.
///
/// Explicit `roots` entries are used verbatim when present.
pub fn roots_from_config(config: &Config, base: &Path) -> Vec<IndexRoot> {
    if !config.roots.is_empty() {
        return config
            .roots
            .iter()
            .map(|root| IndexRoot {
                path: base.join(&root.path),
                prefix: normalize_prefix(&root.prefix),
                required: root.required,
            })
            .collect();
    }

    resolve_roots(&base.join(&config.templates_path), &config.sites)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::RootConfig;

    #[test]
    fn test_sites_come_before_global_root() {
        let sites = vec![
            SiteRoot {
                handle: "en".into(),
                template: None,
            },
            SiteRoot {
                handle: "german".into(),
                template: Some("de".into()),
            },
        ];
        let roots = resolve_roots(Path::new("templates"), &sites);

        assert_eq!(
            roots,
            vec![
                IndexRoot::optional("templates/en", "en"),
                IndexRoot::optional("templates/de", "de"),
                IndexRoot::required("templates", ""),
            ]
        );
    }

    #[test]
    fn test_explicit_roots_override_sites() {
        let config = Config {
            sites: vec![SiteRoot {
                handle: "en".into(),
                template: None,
            }],
            roots: vec![RootConfig {
                path: "site-templates/de".into(),
                prefix: "/de/".into(),
                required: false,
            }],
            ..Config::default()
        };
        let roots = roots_from_config(&config, Path::new("/srv"));

        assert_eq!(roots, vec![IndexRoot::optional("/srv/site-templates/de", "de")]);
    }

    #[test]
    fn test_default_config_scans_templates_dir() {
        let roots = roots_from_config(&Config::default(), Path::new("/srv"));
        assert_eq!(roots, vec![IndexRoot::required("/srv/templates", "")]);
    }
}
