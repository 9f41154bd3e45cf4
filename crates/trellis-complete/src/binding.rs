//! Field discovery and binding.
//!
//! The host describes the candidate fields on the page; the registry
//! decides which ones get autocomplete. Rescanning is idempotent, so
//! the host can call it every time it inserts new UI.

use crate::selector::FieldSelector;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;
use trellis_core::NativeMarkerSettings;

/// Host-assigned identity of a field. Must be stable for the lifetime
/// of the element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(pub u64);

/// What the host knows about one form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub id: FieldId,
    /// Lowercase element name, e.g. `input`.
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    /// Classes of every ancestor element, nearest first.
    pub ancestor_classes: Vec<String>,
}

impl FieldInfo {
    pub fn new(id: FieldId, tag: impl Into<String>) -> Self {
        Self {
            id,
            tag: tag.into().to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            ancestor_classes: Vec::new(),
        }
    }

    /// Shorthand for an `<input>` element.
    pub fn input(id: FieldId) -> Self {
        Self::new(id, "input")
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn within_class(mut self, class: impl Into<String>) -> Self {
        self.ancestor_classes.push(class.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// The input type, defaulting to `text` like browsers do.
    pub fn input_type(&self) -> String {
        self.attribute("type")
            .map(|t| t.trim().to_ascii_lowercase())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "text".to_string())
    }

    fn own_classes(&self) -> impl Iterator<Item = &str> {
        self.attribute("class")
            .into_iter()
            .flat_map(str::split_whitespace)
    }

    pub fn name(&self) -> &str {
        self.attribute("name").unwrap_or("")
    }
}

/// Signals that the host already provides autocomplete for a field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NativeMarkers {
    pub attributes: Vec<String>,
    pub container_classes: Vec<String>,
}

impl From<&NativeMarkerSettings> for NativeMarkers {
    fn from(settings: &NativeMarkerSettings) -> Self {
        Self {
            attributes: settings
                .attributes
                .iter()
                .map(|a| a.to_ascii_lowercase())
                .collect(),
            container_classes: settings.container_classes.clone(),
        }
    }
}

impl NativeMarkers {
    /// Whether `field` or one of its containers carries a marker.
    pub fn present_on(&self, field: &FieldInfo) -> bool {
        let marked_attr = self
            .attributes
            .iter()
            .any(|attr| field.attribute(attr).is_some());

        let marked_container = field
            .own_classes()
            .chain(field.ancestor_classes.iter().map(String::as_str))
            .any(|class| self.container_classes.iter().any(|c| c == class));

        marked_attr || marked_container
    }
}

/// Tracks which fields are bound.
#[derive(Debug, Default)]
pub struct BindingRegistry {
    selectors: Vec<FieldSelector>,
    markers: NativeMarkers,
    bound: HashSet<FieldId>,
}

impl BindingRegistry {
    pub fn new(selectors: Vec<FieldSelector>, markers: NativeMarkers) -> Self {
        Self {
            selectors,
            markers,
            bound: HashSet::new(),
        }
    }

    /// Whether a field should get autocomplete, ignoring whether it
    /// already has it.
    pub fn eligible(&self, field: &FieldInfo) -> bool {
        self.selectors.iter().any(|s| s.matches(field))
            && field.input_type() == "text"
            && !self.markers.present_on(field)
    }

    /// Binds every eligible field not bound yet and returns the ids of
    /// the newly bound ones, in the order given.
    pub fn rescan<'a>(&mut self, fields: impl IntoIterator<Item = &'a FieldInfo>) -> Vec<FieldId> {
        let mut added = Vec::new();
        for field in fields {
            if self.bound.contains(&field.id) || !self.eligible(field) {
                continue;
            }
            debug!("Binding template autocomplete to '{}'", field.name());
            self.bound.insert(field.id);
            added.push(field.id);
        }
        added
    }

    pub fn is_bound(&self, id: FieldId) -> bool {
        self.bound.contains(&id)
    }

    /// Forgets a field the host removed from the page.
    pub fn release(&mut self, id: FieldId) -> bool {
        self.bound.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> BindingRegistry {
        BindingRegistry::new(
            vec![
                FieldSelector::parse(r#"input[name="section[template]"]"#).unwrap(),
                FieldSelector::parse(r#"input[name="settings[template]"]"#).unwrap(),
            ],
            NativeMarkers::from(&NativeMarkerSettings::default()),
        )
    }

    fn template_field(id: u64) -> FieldInfo {
        FieldInfo::input(FieldId(id)).with_attribute("name", "section[template]")
    }

    #[test]
    fn test_rescan_is_idempotent() {
        let mut registry = registry();
        let fields = vec![template_field(1), template_field(2)];

        assert_eq!(registry.rescan(&fields), vec![FieldId(1), FieldId(2)]);
        assert!(registry.rescan(&fields).is_empty());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_rescan_picks_up_new_fields() {
        let mut registry = registry();
        registry.rescan(&[template_field(1)]);

        let after_insert = vec![template_field(1), template_field(7)];
        assert_eq!(registry.rescan(&after_insert), vec![FieldId(7)]);
        assert!(registry.is_bound(FieldId(1)));
        assert!(registry.is_bound(FieldId(7)));
    }

    #[test]
    fn test_skips_non_matching_and_non_text() {
        let mut registry = registry();
        let fields = vec![
            FieldInfo::input(FieldId(1)).with_attribute("name", "section[handle]"),
            template_field(2).with_attribute("type", "hidden"),
            template_field(3).with_attribute("type", "TEXT"),
        ];
        assert_eq!(registry.rescan(&fields), vec![FieldId(3)]);
    }

    #[test]
    fn test_skips_native_autocomplete() {
        let mut registry = registry();
        let fields = vec![
            template_field(1).with_attribute("data-autosuggest", ""),
            template_field(2).within_class("field").within_class("autosuggest-container"),
            template_field(3).with_attribute("class", "text autosuggest-container"),
            template_field(4).within_class("field"),
        ];
        assert_eq!(registry.rescan(&fields), vec![FieldId(4)]);
    }

    #[test]
    fn test_release() {
        let mut registry = registry();
        registry.rescan(&[template_field(1)]);
        assert!(registry.release(FieldId(1)));
        assert!(registry.is_empty());
        assert_eq!(registry.rescan(&[template_field(1)]), vec![FieldId(1)]);
    }
}
