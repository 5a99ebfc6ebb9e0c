//! Link and tag markup matchers
//!
//! Two grammars are recognised in note text:
//!
//! - links: `[[Title]]` and `[[Title|Alias]]`
//! - tags: `#token`, where token is one or more word characters
//!
//! Scanning is leftmost-first and non-overlapping. Unterminated markup simply
//! produces no span. Offsets are UTF-8 byte offsets into the scanned text and
//! always fall on `char` boundaries.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

const LINK_PATTERN: &str = r"\[\[([^\]|]+)(?:\|([^\]]+))?\]\]";
const TAG_PATTERN: &str = r"#(\w+)";

fn link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(LINK_PATTERN).expect("link pattern is valid"))
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TAG_PATTERN).expect("tag pattern is valid"))
}

/// A matched markup span, half-open `[from, to)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSpan {
    pub from: usize,
    pub to: usize,

    /// The full matched text, e.g. `[[Plan|the plan]]`
    pub raw_text: String,

    /// Capture groups in pattern order; `None` for groups that did not take part
    pub captures: Vec<Option<String>>,
}

impl MatchSpan {
    pub fn len(&self) -> usize {
        self.to - self.from
    }

    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }

    /// Whether `pos` falls inside the span
    pub fn contains(&self, pos: usize) -> bool {
        pos >= self.from && pos < self.to
    }

    /// Whether the span shares at least one position with `[from, to)`
    pub fn overlaps(&self, from: usize, to: usize) -> bool {
        self.from < to && from < self.to
    }

    fn capture(&self, index: usize) -> Option<&str> {
        self.captures.get(index).and_then(|c| c.as_deref())
    }
}

/// A `[[Title]]` / `[[Title|Alias]]` occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSpan {
    #[serde(flatten)]
    pub span: MatchSpan,
}

impl LinkSpan {
    /// Link target, exactly as written
    pub fn title(&self) -> &str {
        self.span.capture(0).unwrap_or_default()
    }

    /// Display-only alias, if any
    pub fn alias(&self) -> Option<&str> {
        self.span.capture(1)
    }

    /// Text a renderer would show for the link
    pub fn label(&self) -> &str {
        self.alias().unwrap_or_else(|| self.title())
    }
}

/// A `#token` occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSpan {
    #[serde(flatten)]
    pub span: MatchSpan,
}

impl TagSpan {
    /// Tag name without the leading `#`
    pub fn name(&self) -> &str {
        self.span.capture(0).unwrap_or_default()
    }
}

fn scan_with(re: &Regex, text: &str) -> Vec<MatchSpan> {
    re.captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let captures = (1..caps.len())
                .map(|i| caps.get(i).map(|m| m.as_str().to_string()))
                .collect();
            Some(MatchSpan {
                from: whole.start(),
                to: whole.end(),
                raw_text: whole.as_str().to_string(),
                captures,
            })
        })
        .collect()
}

/// Find every link span in `text`, ordered by position
pub fn scan_links(text: &str) -> Vec<LinkSpan> {
    scan_with(link_regex(), text)
        .into_iter()
        .map(|span| LinkSpan { span })
        .collect()
}

/// Find every tag span in `text`, ordered by position
pub fn scan_tags(text: &str) -> Vec<TagSpan> {
    scan_with(tag_regex(), text)
        .into_iter()
        .map(|span| TagSpan { span })
        .collect()
}

/// Unique link targets in first-occurrence order
pub fn link_titles(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    scan_links(text)
        .iter()
        .map(|link| link.title().to_string())
        .filter(|title| seen.insert(title.clone()))
        .collect()
}

/// Unique tag names in first-occurrence order
pub fn tag_names(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    scan_tags(text)
        .iter()
        .map(|tag| tag.name().to_string())
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Text surrounding the first link to `title`, for backlink listings
///
/// Matching is case-insensitive on the title and accepts an alias. Up to
/// `context_chars` characters are kept on each side; clipped ends are marked
/// with `...`. Returns an empty string when `text` does not link to `title`.
pub fn link_snippet(text: &str, title: &str, context_chars: usize) -> String {
    let pattern = format!(r"(?i)\[\[{}(?:\|[^\]]+)?\]\]", regex::escape(title));
    let Ok(re) = Regex::new(&pattern) else {
        return String::new();
    };
    let Some(m) = re.find(text) else {
        return String::new();
    };

    let start = if context_chars == 0 {
        m.start()
    } else {
        text[..m.start()]
            .char_indices()
            .rev()
            .nth(context_chars - 1)
            .map(|(i, _)| i)
            .unwrap_or(0)
    };
    let end = text[m.end()..]
        .char_indices()
        .nth(context_chars)
        .map(|(i, _)| m.end() + i)
        .unwrap_or(text.len());

    format!(
        "{}{}{}",
        if start > 0 { "..." } else { "" },
        &text[start..end],
        if end < text.len() { "..." } else { "" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_link() {
        let links = scan_links("see [[A]] now");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].title(), "A");
        assert_eq!(links[0].alias(), None);
        assert_eq!(links[0].span.from, 4);
        assert_eq!(links[0].span.to, 9);
        assert_eq!(links[0].span.raw_text, "[[A]]");
    }

    #[test]
    fn test_aliased_link() {
        let links = scan_links("[[A|B]]");
        assert_eq!(links[0].title(), "A");
        assert_eq!(links[0].alias(), Some("B"));
        assert_eq!(links[0].label(), "B");
    }

    #[test]
    fn test_unterminated_link_is_ignored() {
        assert!(scan_links("an [[open link").is_empty());
        assert!(scan_links("[[]]").is_empty());
        assert!(scan_links("[[A|]]").is_empty());
    }

    #[test]
    fn test_links_are_ordered_and_disjoint() {
        let text = "[[One]] and [[Two|2]] then [[Three]]";
        let links = scan_links(text);
        let titles: Vec<_> = links.iter().map(|l| l.title()).collect();
        assert_eq!(titles, vec!["One", "Two", "Three"]);

        for pair in links.windows(2) {
            assert!(pair[0].span.to <= pair[1].span.from);
        }
        for link in &links {
            assert_eq!(&text[link.span.from..link.span.to], link.span.raw_text);
        }
    }

    #[test]
    fn test_rescan_is_idempotent() {
        let text = "[[Plan]] #roadmap [[Spec|s]] #q3";
        assert_eq!(scan_links(text), scan_links(text));
        assert_eq!(scan_tags(text), scan_tags(text));
    }

    #[test]
    fn test_tags() {
        let tags = scan_tags("#project work on #long_tag, not # alone");
        let names: Vec<_> = tags.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["project", "long_tag"]);
        assert_eq!(tags[0].span.from, 0);
        assert_eq!(tags[0].span.to, 8);
    }

    #[test]
    fn test_multibyte_offsets_stay_on_boundaries() {
        let text = "café [[Zoë]] #naïve";
        let links = scan_links(text);
        assert_eq!(&text[links[0].span.from..links[0].span.to], "[[Zoë]]");
        let tags = scan_tags(text);
        assert_eq!(tags[0].name(), "naïve");
    }

    #[test]
    fn test_unique_titles_and_tags() {
        let text = "[[A]] [[B|b]] [[A|again]] #x #y #x";
        assert_eq!(link_titles(text), vec!["A", "B"]);
        assert_eq!(tag_names(text), vec!["x", "y"]);
    }

    #[test]
    fn test_link_snippet() {
        let text = "Intro text before the [[plan|roadmap]] and after it.";
        assert_eq!(
            link_snippet(text, "Plan", 7),
            "...re the [[plan|roadmap]] and af..."
        );
        assert_eq!(link_snippet(text, "Plan", 500), text);
        assert_eq!(link_snippet(text, "Missing", 10), "");
    }
}
