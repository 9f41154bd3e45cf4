//! Trellis Complete - autocomplete for template path fields
//!
//! The controller in this crate never touches a real DOM. The host
//! forwards field events ([`FieldEvent`]) and carries out the
//! [`Command`]s that come back: render or close a dropdown, set a
//! field value, start a fetch. That keeps the whole widget testable as
//! a plain state machine.
//!
//! Pieces:
//! - [`IndexCache`] holds the fetched index for a short window
//! - [`BindingRegistry`] decides which fields get autocomplete
//! - [`AutocompleteController`] runs the per-field Idle/Open machine
//! - [`HttpTemplateSource`] fetches the index from the server

mod binding;
mod cache;
mod controller;
mod dropdown;
mod filter;
mod selector;
mod source;

pub use binding::{BindingRegistry, FieldId, FieldInfo, NativeMarkers};
pub use cache::{FetchTicket, IndexCache};
pub use controller::{
    AutocompleteController, Command, ControllerConfig, FieldEvent, FieldPhase, Key,
};
pub use dropdown::{Anchor, Dropdown, DropdownRow, NO_RESULTS_TEXT};
pub use filter::{filter_entries, DEFAULT_MAX_RESULTS};
pub use selector::{FieldSelector, SelectorError};
pub use source::{FetchError, HttpTemplateSource, TemplateSource};
