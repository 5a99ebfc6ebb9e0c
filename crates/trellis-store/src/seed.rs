//! Demo corpus for running without a note server

use trellis_core::{NewNote, Visibility};

use crate::error::StoreResult;
use crate::memory::MemoryStore;

/// A small team wiki: a hub, a few linked pages, one dangling link and one
/// note nothing links to.
pub fn demo_notes() -> Vec<NewNote> {
    vec![
        NewNote::new(
            "Home",
            "# Home\n\nStart at [[Engineering]] or [[Product|the product page]].\n\
             Weekly notes live in [[Standups]]. #index",
        )
        .with_visibility(Visibility::Public),
        NewNote::new(
            "Engineering",
            "# Engineering\n\nOwns the [[Roadmap]] and the [[Release Checklist]]. #eng",
        ),
        NewNote::new(
            "Product",
            "# Product\n\nPriorities feed into the [[Roadmap]]. #product",
        ),
        NewNote::new(
            "Roadmap",
            "# Roadmap\n\nQ3: search, graph view. Q4: [[Offline Mode]]. #eng #product",
        ),
        NewNote::new(
            "Release Checklist",
            "# Release Checklist\n\n1. Tag the build\n2. Update [[Roadmap]] #eng",
        ),
        NewNote::new("Standups", "# Standups\n\nSee [[Home]]. #meetings"),
        NewNote::new("Salaries 2024", "# Salaries 2024\n\nConfidential.")
            .with_visibility(Visibility::Private),
    ]
}

/// An in-memory store loaded with [`demo_notes`]
pub fn demo_store() -> StoreResult<MemoryStore> {
    let store = MemoryStore::new();
    for note in demo_notes() {
        store.insert(note)?;
    }
    Ok(store)
}
