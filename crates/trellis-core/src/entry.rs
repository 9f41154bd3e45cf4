//! Template entry representation.
//!
//! A TemplateEntry is one filesystem node that is worth offering in
//! an autocomplete list: either a template file (extension stripped)
//! or a folder the user can type into.

use serde::{Deserialize, Serialize};

/// Path of the "list templates" endpoint, relative to the admin base.
pub const TEMPLATES_ENDPOINT: &str = "template-service/templates";

/// What kind of filesystem node an entry stands for.
///
/// The wire names match what the admin widget has always consumed,
/// so files are `"template"` and directories are `"folder"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    /// A template file with its extension stripped.
    #[serde(rename = "template")]
    File,
    /// A directory that is not reserved.
    #[serde(rename = "folder")]
    Directory,
}

impl EntryKind {
    pub fn is_file(self) -> bool {
        matches!(self, Self::File)
    }

    /// Icon shown next to the entry in the dropdown.
    pub fn icon(self) -> &'static str {
        match self {
            Self::File => "📄",
            Self::Directory => "📁",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::File => "template",
            Self::Directory => "folder",
        };
        write!(f, "{}", s)
    }
}

/// One discovered template or folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateEntry {
    /// Slash-separated identifier relative to the index root.
    pub path: String,

    /// File or folder.
    #[serde(rename = "type")]
    pub kind: EntryKind,

    /// Short display text. Folders carry a trailing slash.
    pub label: String,

    /// Indented label encoding depth and parent directory.
    /// Only present for files below the top level.
    #[serde(
        rename = "fullLabel",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub full_label: Option<String>,
}

impl TemplateEntry {
    /// Creates a file entry. The label is the path itself.
    pub fn file(path: impl Into<String>, full_label: Option<String>) -> Self {
        let path = path.into();
        Self {
            label: path.clone(),
            path,
            kind: EntryKind::File,
            full_label,
        }
    }

    /// Creates a folder entry labelled `path/`.
    pub fn directory(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            label: format!("{}/", path),
            path,
            kind: EntryKind::Directory,
            full_label: None,
        }
    }

    /// Case-insensitive substring match against the path.
    ///
    /// `query_lower` must already be lowercased so callers filtering a
    /// long list only pay for that once.
    pub fn matches(&self, query_lower: &str) -> bool {
        query_lower.is_empty() || self.path.to_lowercase().contains(query_lower)
    }

    /// The label to show in a flat list, preferring the indented form.
    pub fn display_label(&self) -> &str {
        self.full_label.as_deref().unwrap_or(&self.label)
    }
}

/// Body of a successful "list templates" response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplatesResponse {
    pub templates: Vec<TemplateEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_labels() {
        let file = TemplateEntry::file("blog/post", Some("└ post (blog)".into()));
        assert_eq!(file.label, "blog/post");
        assert_eq!(file.display_label(), "└ post (blog)");

        let dir = TemplateEntry::directory("blog");
        assert_eq!(dir.label, "blog/");
        assert_eq!(dir.display_label(), "blog/");
    }

    #[test]
    fn test_wire_format() {
        let file = TemplateEntry::file("index", None);
        assert_eq!(
            serde_json::to_value(&file).unwrap(),
            json!({ "path": "index", "type": "template", "label": "index" })
        );

        let nested = TemplateEntry::file("blog/post", Some("└ post (blog)".into()));
        assert_eq!(
            serde_json::to_value(&nested).unwrap()["fullLabel"],
            json!("└ post (blog)")
        );

        let dir = TemplateEntry::directory("blog");
        assert_eq!(serde_json::to_value(&dir).unwrap()["type"], json!("folder"));
    }

    #[test]
    fn test_response_parses_without_full_label() {
        let body = r#"{"templates":[{"path":"blog","type":"folder","label":"blog/"}]}"#;
        let parsed: TemplatesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.templates, vec![TemplateEntry::directory("blog")]);
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let entry = TemplateEntry::file("Blog/Post", None);
        assert!(entry.matches("blo"));
        assert!(entry.matches("post"));
        assert!(entry.matches(""));
        assert!(!entry.matches("index"));
    }
}
