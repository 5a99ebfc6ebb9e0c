//! Link autocomplete
//!
//! Offers note titles while the user types inside an unclosed `[[`.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use trellis_store::{with_timeout, NoteStore};

use crate::resolver::DEFAULT_TIMEOUT;
use crate::sequence::RequestSequencer;

/// Detail shown next to every candidate
pub const OPTION_DETAIL: &str = "Note";

fn trigger_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[\[([^\]|]*)$").expect("trigger pattern is valid"))
}

/// An open `[[` before the cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    /// Start of the partial title, just after `[[`
    pub from: usize,
    /// The cursor
    pub to: usize,
    pub query: String,
}

/// Find an open link before `cursor`, looking at the cursor's line only
///
/// Returns `None` when the cursor is out of range or not on a `char`
/// boundary.
pub fn trigger(text: &str, cursor: usize) -> Option<Trigger> {
    let before = text.get(..cursor)?;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line = &before[line_start..];

    let caps = trigger_regex().captures(line)?;
    let partial = caps.get(1)?;
    Some(Trigger {
        from: line_start + partial.start(),
        to: cursor,
        query: partial.as_str().to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionOption {
    pub label: String,
    pub detail: String,
    /// Text that replaces `[from, to)`; always the title, never the id
    pub insert: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionList {
    pub from: usize,
    pub to: usize,
    pub options: Vec<CompletionOption>,
}

/// Outcome of one completion request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Completion {
    /// Not inside an open link, or nothing typed on an implicit request
    Inactive,
    /// A newer request was issued while this one was in flight
    Stale,
    Ready(CompletionList),
}

impl Completion {
    pub fn list(&self) -> Option<&CompletionList> {
        match self {
            Self::Ready(list) => Some(list),
            _ => None,
        }
    }
}

/// Completion source backed by the store's title search
pub struct AutocompleteProvider<S> {
    store: S,
    timeout: Duration,
    sequencer: RequestSequencer,
}

impl<S: NoteStore> AutocompleteProvider<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            timeout: DEFAULT_TIMEOUT,
            sequencer: RequestSequencer::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Complete at `cursor`
    ///
    /// `explicit` is set when the user asked for completion (e.g.
    /// Ctrl+Space) rather than it firing while typing.
    pub async fn complete(&self, text: &str, cursor: usize, explicit: bool) -> Completion {
        let Some(trigger) = trigger(text, cursor) else {
            return Completion::Inactive;
        };
        if trigger.query.is_empty() && !explicit {
            return Completion::Inactive;
        }

        let ticket = self.sequencer.issue();
        let result = with_timeout(self.timeout, self.store.search_notes(&trigger.query)).await;

        if !self.sequencer.is_latest(ticket) {
            tracing::debug!("Discarding stale completion #{}", ticket.value());
            return Completion::Stale;
        }

        let options = match result {
            Ok(notes) => notes
                .into_iter()
                .map(|note| CompletionOption {
                    label: note.title.clone(),
                    detail: OPTION_DETAIL.to_string(),
                    insert: note.title,
                })
                .collect(),
            Err(e) => {
                tracing::warn!("Completion search for {:?} failed: {}", trigger.query, e);
                Vec::new()
            }
        };

        Completion::Ready(CompletionList {
            from: trigger.from,
            to: trigger.to,
            options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedStore;

    #[test]
    fn test_trigger_range() {
        let text = "See [[Pla";
        let t = trigger(text, text.len()).unwrap();
        assert_eq!(t.query, "Pla");
        assert_eq!((t.from, t.to), (6, 9));
        assert_eq!(&text[t.from..t.to], "Pla");
    }

    #[test]
    fn test_no_trigger() {
        // closed link
        assert_eq!(trigger("[[Plan]] x", 10), None);
        // alias part
        assert_eq!(trigger("[[Plan|al", 9), None);
        // open link on a previous line
        assert_eq!(trigger("[[Pla\nnext", 10), None);
        // out of range and mid-char cursors
        assert_eq!(trigger("[[a", 4), None);
        assert_eq!(trigger("[[é", 3), None);
    }

    #[test]
    fn test_trigger_on_later_line() {
        let text = "first\nsecond [[Ro";
        let t = trigger(text, text.len()).unwrap();
        assert_eq!(t.query, "Ro");
        assert_eq!(&text[t.from..t.to], "Ro");
    }

    #[test]
    fn test_empty_trigger() {
        let t = trigger("[[", 2).unwrap();
        assert_eq!(t.query, "");
        assert_eq!((t.from, t.to), (2, 2));
    }

    #[tokio::test]
    async fn test_options_insert_titles() {
        let provider =
            AutocompleteProvider::new(ScriptedStore::returning(&[(4, "Plan"), (9, "plan b")]));
        let completion = provider.complete("[[pl", 4, false).await;
        let list = completion.list().unwrap();

        assert_eq!((list.from, list.to), (2, 4));
        assert_eq!(list.options.len(), 2);
        assert_eq!(list.options[0].label, "Plan");
        assert_eq!(list.options[0].insert, "Plan");
        assert_eq!(list.options[1].detail, "Note");
    }

    #[tokio::test]
    async fn test_empty_query_needs_explicit() {
        let provider = AutocompleteProvider::new(ScriptedStore::returning(&[(1, "Plan")]));

        assert_eq!(provider.complete("[[", 2, false).await, Completion::Inactive);
        assert!(provider.store.queries().is_empty());

        let completion = provider.complete("[[", 2, true).await;
        assert_eq!(completion.list().unwrap().options.len(), 1);
        assert_eq!(provider.store.queries(), vec![String::new()]);
    }

    #[tokio::test]
    async fn test_outside_link_is_inactive() {
        let provider = AutocompleteProvider::new(ScriptedStore::returning(&[(1, "Plan")]));
        assert_eq!(provider.complete("plain text", 5, true).await, Completion::Inactive);
        assert!(provider.store.queries().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_yields_empty_list() {
        let provider = AutocompleteProvider::new(ScriptedStore::failing());
        let completion = provider.complete("[[pl", 4, false).await;
        assert!(completion.list().unwrap().options.is_empty());
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let store = ScriptedStore::returning(&[(1, "Plan")])
            .slow_for("p", Duration::from_millis(50));
        let provider = AutocompleteProvider::new(store);

        let (old, new) = tokio::join!(
            provider.complete("[[p", 3, false),
            provider.complete("[[pl", 4, false)
        );
        assert_eq!(old, Completion::Stale);
        assert!(new.list().is_some());
    }
}
