//! The autocomplete state machine.
//!
//! Each bound field is either idle or active. At most one field is
//! active at a time: it is loading the index, or its dropdown is open
//! with an optional highlighted row. Events that make no sense in the
//! current state (arrow keys on an idle field, say) are no-ops.

use crate::binding::{BindingRegistry, FieldId, FieldInfo, NativeMarkers};
use crate::cache::{FetchTicket, IndexCache};
use crate::dropdown::{Anchor, Dropdown};
use crate::filter::filter_entries;
use crate::selector::{FieldSelector, SelectorError};
use crate::source::{FetchError, TemplateSource};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use trellis_core::{AutocompleteSettings, TemplateEntry};

/// Controller settings. The default matches [`AutocompleteSettings::default`].
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub selectors: Vec<FieldSelector>,
    pub markers: NativeMarkers,
    pub cache_ttl: Duration,
    pub blur_grace: Duration,
    pub max_results: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        let settings = AutocompleteSettings::default();
        Self {
            selectors: settings
                .selectors
                .iter()
                .filter_map(|s| FieldSelector::parse(s).ok())
                .collect(),
            markers: NativeMarkers::from(&settings.native_markers),
            cache_ttl: Duration::from_millis(settings.cache_ttl_ms),
            blur_grace: Duration::from_millis(settings.blur_grace_ms),
            max_results: settings.max_results,
        }
    }
}

impl ControllerConfig {
    /// Builds the config from the JSON settings, parsing selectors.
    pub fn from_settings(settings: &AutocompleteSettings) -> Result<Self, SelectorError> {
        let selectors = settings
            .selectors
            .iter()
            .map(|s| FieldSelector::parse(s))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            selectors,
            markers: NativeMarkers::from(&settings.native_markers),
            cache_ttl: Duration::from_millis(settings.cache_ttl_ms),
            blur_grace: Duration::from_millis(settings.blur_grace_ms),
            max_results: settings.max_results,
        })
    }
}

/// Keys the controller reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowDown,
    ArrowUp,
    Enter,
    Escape,
    Other,
}

impl Key {
    /// Maps a DOM `KeyboardEvent.key` value.
    pub fn from_dom(key: &str) -> Self {
        match key {
            "ArrowDown" => Self::ArrowDown,
            "ArrowUp" => Self::ArrowUp,
            "Enter" => Self::Enter,
            "Escape" => Self::Escape,
            _ => Self::Other,
        }
    }
}

/// Something that happened on a bound field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEvent {
    Focus { value: String, anchor: Anchor },
    Input { value: String, anchor: Anchor },
    Blur,
    Key(Key),
    /// The pointer entered the field's dropdown.
    PointerEnter,
    /// The pointer left the field's dropdown.
    PointerLeave,
    /// A rendered row was clicked; carries its `data-path`.
    Select { path: String },
}

/// What the host should do in response.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Fetch the index and report back through `index_loaded`.
    Fetch(FetchTicket),
    /// Show (or replace) the dropdown for a field.
    Render { field: FieldId, dropdown: Dropdown },
    /// Remove the field's dropdown.
    Close { field: FieldId },
    SetValue { field: FieldId, value: String },
    /// Dispatch a bubbling `change` event on the field.
    EmitChange { field: FieldId },
    /// Suppress the browser's default handling of the key.
    PreventDefault,
    /// Call `tick` at (or after) this instant.
    ScheduleTick { at: Instant },
}

/// Externally visible state of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPhase {
    Idle,
    Loading,
    Open { highlighted: Option<usize> },
}

#[derive(Debug)]
struct OpenState {
    anchor: Anchor,
    rows: Vec<TemplateEntry>,
    highlighted: Option<usize>,
    close_at: Option<Instant>,
    hovering: bool,
}

#[derive(Debug)]
enum ActivePhase {
    Loading { query: String, anchor: Anchor },
    Open(OpenState),
}

#[derive(Debug)]
struct Active {
    field: FieldId,
    phase: ActivePhase,
}

/// Autocomplete for every bound field on a page.
#[derive(Debug)]
pub struct AutocompleteController {
    config: ControllerConfig,
    cache: IndexCache,
    bindings: BindingRegistry,
    active: Option<Active>,
}

impl AutocompleteController {
    pub fn new(config: ControllerConfig) -> Self {
        let cache = IndexCache::new(config.cache_ttl);
        let bindings = BindingRegistry::new(config.selectors.clone(), config.markers.clone());
        Self {
            config,
            cache,
            bindings,
            active: None,
        }
    }

    pub fn cache(&self) -> &IndexCache {
        &self.cache
    }

    pub fn bindings(&self) -> &BindingRegistry {
        &self.bindings
    }

    /// Binds any newly inserted eligible fields. Safe to call repeatedly.
    pub fn rescan<'a>(&mut self, fields: impl IntoIterator<Item = &'a FieldInfo>) -> Vec<FieldId> {
        self.bindings.rescan(fields)
    }

    /// Unbinds a field the host removed, closing it if it was active.
    pub fn release(&mut self, field: FieldId) -> Vec<Command> {
        let mut commands = Vec::new();
        if self.active_field() == Some(field) {
            commands.extend(self.close());
        }
        self.bindings.release(field);
        commands
    }

    pub fn phase(&self, field: FieldId) -> FieldPhase {
        match &self.active {
            Some(active) if active.field == field => match &active.phase {
                ActivePhase::Loading { .. } => FieldPhase::Loading,
                ActivePhase::Open(open) => FieldPhase::Open {
                    highlighted: open.highlighted,
                },
            },
            _ => FieldPhase::Idle,
        }
    }

    fn active_field(&self) -> Option<FieldId> {
        self.active.as_ref().map(|active| active.field)
    }

    /// Feeds one field event through the state machine.
    pub fn handle(&mut self, field: FieldId, event: FieldEvent, now: Instant) -> Vec<Command> {
        if !self.bindings.is_bound(field) {
            return Vec::new();
        }

        match event {
            FieldEvent::Focus { value, anchor } | FieldEvent::Input { value, anchor } => {
                self.show(field, value, anchor, now)
            }
            FieldEvent::Blur => self.blur(field, now),
            FieldEvent::Key(key) => self.key(field, key),
            FieldEvent::PointerEnter => {
                if let Some(open) = self.open_state(field) {
                    open.hovering = true;
                }
                Vec::new()
            }
            FieldEvent::PointerLeave => self.pointer_leave(field, now),
            FieldEvent::Select { path } => self.select_path(field, &path),
        }
    }

    /// Closes the active dropdown if its blur grace period has run out
    /// and the pointer is not over it.
    pub fn tick(&mut self, now: Instant) -> Vec<Command> {
        let expired = matches!(
            &self.active,
            Some(Active { phase: ActivePhase::Open(open), .. })
                if !open.hovering && open.close_at.is_some_and(|at| at <= now)
        );
        if expired {
            self.close()
        } else {
            Vec::new()
        }
    }

    /// Reports the outcome of a `Command::Fetch`.
    ///
    /// A field waiting on the index is opened with the result. A failed
    /// fetch opens it with no candidates; the cache keeps whatever it
    /// had. A result for a superseded ticket only updates the cache.
    pub fn index_loaded(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<TemplateEntry>, FetchError>,
        now: Instant,
    ) -> Vec<Command> {
        let current = self.cache.is_current(ticket);
        let failed = match result {
            Ok(entries) => {
                debug!("Loaded {} templates (fetch #{})", entries.len(), ticket.seq());
                self.cache.complete(ticket, entries);
                false
            }
            Err(e) => {
                warn!("Failed to fetch templates: {}", e);
                self.cache.fail(ticket);
                true
            }
        };
        if !current {
            // A newer fetch is outstanding; the waiting field opens with that one.
            return Vec::new();
        }

        let Some(Active {
            field,
            phase: ActivePhase::Loading { query, anchor },
        }) = &self.active
        else {
            return Vec::new();
        };
        let (field, query, anchor) = (*field, query.clone(), *anchor);

        let rows = if failed {
            Vec::new()
        } else {
            let entries = self
                .cache
                .fresh(now)
                .or_else(|| self.cache.entries())
                .unwrap_or_default();
            self.matching(entries, &query)
        };
        self.open(field, anchor, rows)
    }

    /// Runs a fetch issued by this controller against `source` and
    /// feeds the result back.
    pub async fn fulfil(
        &mut self,
        ticket: FetchTicket,
        source: &dyn TemplateSource,
    ) -> Vec<Command> {
        let result = source.fetch_templates().await;
        self.index_loaded(ticket, result, Instant::now())
    }

    fn matching(&self, entries: &[TemplateEntry], query: &str) -> Vec<TemplateEntry> {
        filter_entries(entries, query, self.config.max_results)
            .into_iter()
            .cloned()
            .collect()
    }

    fn show(&mut self, field: FieldId, query: String, anchor: Anchor, now: Instant) -> Vec<Command> {
        let mut commands = Vec::new();
        if self.active_field().is_some_and(|active| active != field) {
            commands.extend(self.close());
        }

        if let Some(entries) = self.cache.fresh(now) {
            let rows = self.matching(entries, &query);
            commands.extend(self.open(field, anchor, rows));
            return commands;
        }

        self.active = Some(Active {
            field,
            phase: ActivePhase::Loading { query, anchor },
        });
        if let Some(ticket) = self.cache.begin_fetch(now) {
            commands.push(Command::Fetch(ticket));
        }
        commands
    }

    fn open(&mut self, field: FieldId, anchor: Anchor, rows: Vec<TemplateEntry>) -> Vec<Command> {
        let dropdown = Dropdown::new(anchor, &rows, None);
        self.active = Some(Active {
            field,
            phase: ActivePhase::Open(OpenState {
                anchor,
                rows,
                highlighted: None,
                close_at: None,
                hovering: false,
            }),
        });
        vec![Command::Render { field, dropdown }]
    }

    fn close(&mut self) -> Vec<Command> {
        match self.active.take() {
            Some(Active {
                field,
                phase: ActivePhase::Open(_),
            }) => vec![Command::Close { field }],
            _ => Vec::new(),
        }
    }

    fn open_state(&mut self, field: FieldId) -> Option<&mut OpenState> {
        match &mut self.active {
            Some(Active {
                field: active,
                phase: ActivePhase::Open(open),
            }) if *active == field => Some(open),
            _ => None,
        }
    }

    fn blur(&mut self, field: FieldId, now: Instant) -> Vec<Command> {
        if self.phase(field) == FieldPhase::Loading {
            self.active = None;
            return Vec::new();
        }

        let at = now + self.config.blur_grace;
        match self.open_state(field) {
            Some(open) => {
                open.close_at = Some(at);
                vec![Command::ScheduleTick { at }]
            }
            None => Vec::new(),
        }
    }

    fn pointer_leave(&mut self, field: FieldId, now: Instant) -> Vec<Command> {
        let grace = self.config.blur_grace;
        let Some(open) = self.open_state(field) else {
            return Vec::new();
        };
        open.hovering = false;

        // Leaving after blur restarts the grace period.
        if open.close_at.is_some() {
            let at = now + grace;
            open.close_at = Some(at);
            vec![Command::ScheduleTick { at }]
        } else {
            Vec::new()
        }
    }

    fn key(&mut self, field: FieldId, key: Key) -> Vec<Command> {
        let Some(open) = self.open_state(field) else {
            return Vec::new();
        };

        let len = open.rows.len();
        let next = match key {
            Key::ArrowDown => match open.highlighted {
                _ if len == 0 => None,
                Some(i) => Some((i + 1) % len),
                None => Some(0),
            },
            Key::ArrowUp => match open.highlighted {
                _ if len == 0 => None,
                Some(0) | None => Some(len - 1),
                Some(i) => Some(i - 1),
            },
            Key::Enter => {
                let path = open.highlighted.map(|i| open.rows[i].path.clone());
                let mut commands = vec![Command::PreventDefault];
                if let Some(path) = path {
                    commands.extend(self.select_path(field, &path));
                }
                return commands;
            }
            Key::Escape => return self.close(),
            Key::Other => return Vec::new(),
        };

        let Some(index) = next else {
            return vec![Command::PreventDefault];
        };
        open.highlighted = Some(index);
        let dropdown = Dropdown::new(open.anchor, &open.rows, open.highlighted);
        vec![
            Command::PreventDefault,
            Command::Render { field, dropdown },
        ]
    }

    fn select_path(&mut self, field: FieldId, path: &str) -> Vec<Command> {
        let Some(open) = self.open_state(field) else {
            return Vec::new();
        };
        if !open.rows.iter().any(|row| row.path == path) {
            return Vec::new();
        }

        let mut commands = vec![
            Command::SetValue {
                field,
                value: path.to_string(),
            },
            Command::EmitChange { field },
        ];
        commands.extend(self.close());
        commands
    }
}
