//! CLI command implementations

use std::io::Read;
use std::path::Path;

use anyhow::Context;

pub mod backlinks;
pub mod complete;
pub mod config;
pub mod graph;
pub mod layout;
pub mod resolve;
pub mod scan;

/// Read a document from `path`, or from stdin when `path` is `-`
pub fn read_input(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
