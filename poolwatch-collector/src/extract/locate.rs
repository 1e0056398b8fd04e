//! Locators find the raw text of one value in a page.

use crate::markup::{find_element, text_runs};

/// One way of finding a value in the markup.
///
/// Locators are pure and cheap to copy; fields list them most specific
/// first and the first one that yields a usable value wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator {
    /// Element with `id="..."`.
    Id(&'static str),
    /// First element carrying the class.
    Class(&'static str),
    /// Element with `data-field="..."`.
    DataField(&'static str),
    /// Text following a label, either `Label: value` in one text run or a
    /// label cell followed by the value cell.
    Label(&'static str),
}

impl Locator {
    /// Visible text at this location, if the location exists.
    pub fn locate(&self, doc: &str) -> Option<String> {
        match *self {
            Locator::Id(id) => find_element(doc, |e| e.attr("id") == Some(id)).map(|e| e.text()),
            Locator::Class(class) => find_element(doc, |e| e.has_class(class)).map(|e| e.text()),
            Locator::DataField(field) => {
                find_element(doc, |e| e.attr("data-field") == Some(field)).map(|e| e.text())
            }
            Locator::Label(label) => label_value(doc, label),
        }
    }
}

/// The value run after a matching label. An empty value cell comes back as
/// an empty string, which callers treat as a placeholder.
fn label_value(doc: &str, label: &str) -> Option<String> {
    let segments = text_runs(doc);
    for (i, segment) in segments.iter().enumerate() {
        let head = segment.trim_end_matches(':').trim_end();
        if head.eq_ignore_ascii_case(label) {
            return segments.get(i + 1).cloned();
        }

        if let Some(rest) = strip_prefix_ci(segment, label).and_then(|r| r.strip_prefix(':')) {
            let rest = rest.trim();
            if !rest.is_empty() {
                return Some(rest.to_string());
            }
            return segments.get(i + 1).cloned();
        }
    }
    None
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

/// Text that stands for "no reading".
pub fn is_placeholder(text: &str) -> bool {
    let text = text.trim();
    text.is_empty() || text.chars().all(|c| c == '-') || text.eq_ignore_ascii_case("n/a")
}
