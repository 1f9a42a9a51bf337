//! Lede typeahead: the interactive side of post search.
//!
//! - [`Session`]: pure panel state (input, open flag, highlight, rows) and
//!   keyboard/mouse handling.
//! - [`spawn_controller`]: task that owns a session, debounces input, queries
//!   the local corpus and optional remote, caches replies, and publishes a
//!   [`View`] on every change.

#![forbid(unsafe_code)]

mod config;
mod controller;
mod model;
mod nav;

pub use config::TypeaheadConfig;
pub use controller::{spawn_controller, ControllerClosed, ControllerHandle, Input};
pub use model::{
    min_chars_message, search_href, Action, Session, View, MSG_INDEXING, MSG_NO_RESULTS, MSG_SEARCH_FAILED,
};
pub use nav::{step, Key, UnknownKey, PAGE_STEP};
