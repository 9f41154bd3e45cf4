//! Dropdown view model.
//!
//! The controller describes what to show; the host decides how to
//! inject it. [`Dropdown::render_html`] covers hosts that just want
//! markup to insert into the page.

use askama::Template;
use trellis_core::{EntryKind, TemplateEntry};

/// Placeholder shown when nothing matches.
pub const NO_RESULTS_TEXT: &str = "No templates found";

/// Geometry of the bound field, as reported by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Anchor {
    pub left: f64,
    pub bottom: f64,
    pub width: f64,
    /// Page scroll offset at the time of the event.
    pub scroll_y: f64,
}

/// One rendered candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropdownRow {
    /// Value written to the field on selection.
    pub path: String,
    pub label: String,
    pub kind: EntryKind,
    pub highlighted: bool,
}

/// A positioned dropdown below a field.
#[derive(Debug, Clone, PartialEq)]
pub struct Dropdown {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub rows: Vec<DropdownRow>,
}

#[derive(Template)]
#[template(path = "dropdown.html")]
struct DropdownTemplate<'a> {
    top: f64,
    left: f64,
    width: f64,
    rows: &'a [DropdownRow],
    no_results: &'a str,
}

impl Dropdown {
    /// Lays out `entries` below the anchor, matching its width.
    pub fn new(anchor: Anchor, entries: &[TemplateEntry], highlighted: Option<usize>) -> Self {
        let rows = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| DropdownRow {
                path: entry.path.clone(),
                label: entry.label.clone(),
                kind: entry.kind,
                highlighted: highlighted == Some(i),
            })
            .collect();

        Self {
            top: anchor.bottom + anchor.scroll_y,
            left: anchor.left,
            width: anchor.width,
            rows,
        }
    }

    /// True when the "no results" placeholder is shown.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn highlighted(&self) -> Option<&DropdownRow> {
        self.rows.iter().find(|row| row.highlighted)
    }

    /// Markup for the dropdown. Paths and labels are escaped; each row
    /// carries its path in `data-path`.
    pub fn render_html(&self) -> Result<String, askama::Error> {
        DropdownTemplate {
            top: self.top,
            left: self.left,
            width: self.width,
            rows: &self.rows,
            no_results: NO_RESULTS_TEXT,
        }
        .render()
    }
}
