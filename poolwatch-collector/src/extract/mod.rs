//! Metric extraction from panel pages.
//!
//! Every field is described by an ordered list of [`Locator`]s. The chain
//! evaluators below walk that list and return the first usable value, so a
//! redesigned page only needs a new locator at the front of a list.
//!
//! Extraction never fails: missing or unrecognised markup yields null
//! fields, and conflicting status text resolves to null rather than a guess.

mod classify;
mod groups;
mod locate;
mod schedules;

use poolwatch_types::{Endpoint, MetricGroup};
use tracing::debug;

use crate::markup::first_number;

pub use classify::{classify, Verdict};
pub use groups::{extract_chlorinator, extract_dashboard, extract_filter, extract_heater, extract_lights};
pub use locate::{is_placeholder, Locator};
pub use schedules::extract_schedules;

/// Extract the metric group served by `endpoint` from its markup.
pub fn extract(endpoint: Endpoint, markup: &str) -> MetricGroup {
    match endpoint {
        Endpoint::Dashboard => MetricGroup::Dashboard(extract_dashboard(markup)),
        Endpoint::Filter => MetricGroup::Filter(extract_filter(markup)),
        Endpoint::Chlorinator => MetricGroup::Chlorinator(extract_chlorinator(markup)),
        Endpoint::Heater => MetricGroup::Heater(extract_heater(markup)),
        Endpoint::Lights => MetricGroup::Lights(extract_lights(markup)),
        Endpoint::Schedules => MetricGroup::Schedules(extract_schedules(markup)),
    }
}

/// Raw text of the first candidate that is present and not a placeholder.
fn candidates<'a>(doc: &'a str, chain: &'a [Locator]) -> impl Iterator<Item = (Locator, String)> + 'a {
    chain.iter().filter_map(move |locator| {
        locator
            .locate(doc)
            .filter(|text| !is_placeholder(text))
            .map(|text| (*locator, text))
    })
}

/// First candidate whose text contains a number.
pub fn number(doc: &str, chain: &[Locator]) -> Option<f64> {
    candidates(doc, chain).find_map(|(_, text)| first_number(&text))
}

/// First candidate whose text classifies as on or off.
///
/// Candidates with no recognised words are skipped; a candidate with both
/// vocabularies stops the chain and yields `None`.
pub fn status(doc: &str, chain: &[Locator]) -> Option<bool> {
    for (locator, text) in candidates(doc, chain) {
        match classify(&text) {
            Verdict::On => return Some(true),
            Verdict::Off => return Some(false),
            Verdict::Ambiguous => {
                debug!(?locator, %text, "Ambiguous status text, leaving field null");
                return None;
            }
            Verdict::Unknown => continue,
        }
    }
    None
}

/// First candidate's text.
pub fn text(doc: &str, chain: &[Locator]) -> Option<String> {
    candidates(doc, chain).next().map(|(_, text)| text)
}
