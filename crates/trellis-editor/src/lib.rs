//! Trellis Editor - Link interaction on a live text surface
//!
//! - [`DecorationEngine`] keeps `[[link]]` and `#tag` regions in sync with
//!   the document and dispatches clicks
//! - [`LinkResolver`] routes a clicked link to a note or to note creation
//! - [`AutocompleteProvider`] offers note titles inside an open `[[`
//! - [`Backlinks`] lists the notes linking to a title, with context

pub mod autocomplete;
pub mod backlinks;
pub mod decoration;
pub mod resolver;
pub mod sequence;

#[cfg(test)]
mod testing;

pub use autocomplete::{AutocompleteProvider, Completion, CompletionList, CompletionOption};
pub use backlinks::{Backlink, Backlinks};
pub use decoration::{
    DecorationEngine, Decorations, DocumentSnapshot, Interaction, Modifiers, Region, RegionKind,
    Viewport,
};
pub use resolver::{LinkResolver, Resolution};
pub use sequence::{RequestSequencer, Ticket};
