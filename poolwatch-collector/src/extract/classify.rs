//! On/off keyword classification for status text.

const ON_WORDS: &[&str] = &["on", "running", "active", "enabled", "true"];
const OFF_WORDS: &[&str] = &["off", "stopped", "inactive", "disabled", "false"];

/// Outcome of classifying one piece of status text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    On,
    Off,
    /// Both vocabularies matched.
    Ambiguous,
    /// Neither vocabulary matched.
    Unknown,
}

impl Verdict {
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Verdict::On => Some(true),
            Verdict::Off => Some(false),
            Verdict::Ambiguous | Verdict::Unknown => None,
        }
    }
}

/// Classify status text by whole-word, case-insensitive vocabulary matches.
///
/// The digits `1` and `0` only count when they are the entire text, so
/// numeric diagnostics such as "Error 10" never read as a state.
pub fn classify(text: &str) -> Verdict {
    let text = text.trim().to_ascii_lowercase();
    match text.as_str() {
        "1" => return Verdict::On,
        "0" => return Verdict::Off,
        _ => {}
    }

    let mut on = false;
    let mut off = false;
    for word in text.split(|c: char| !c.is_ascii_alphanumeric()) {
        on |= ON_WORDS.contains(&word);
        off |= OFF_WORDS.contains(&word);
    }

    match (on, off) {
        (true, false) => Verdict::On,
        (false, true) => Verdict::Off,
        (true, true) => Verdict::Ambiguous,
        (false, false) => Verdict::Unknown,
    }
}
