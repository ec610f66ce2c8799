//! Core library crate exposing the event-window resolution engine.
//!
//! Pure and stateless: every call is independent, so callers may resolve
//! events sequentially or concurrently with identical results.

pub mod extract;
pub mod resolve;

pub use extract::{extract_field, parse_date};
pub use resolve::{
    EventStatus, EventWindow, RawEvent, ResolvedEvent, classify, derive_display_name,
    permanent_end, remaining_label, resolve, resolve_all, resolve_window,
};
