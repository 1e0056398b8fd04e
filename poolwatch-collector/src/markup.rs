//! Low-level markup helpers.
//!
//! These are deliberately naive but tailored to the controller panel's
//! server-rendered pages. Tag and attribute names match case-insensitively;
//! nothing here ever fails, missing structure simply yields `None` or an
//! empty result.

use std::sync::OnceLock;

use regex::Regex;

fn open_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<([a-zA-Z][a-zA-Z0-9-]*)(\s[^>]*)?>").expect("valid regex"))
}

fn attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"([a-zA-Z_:][-a-zA-Z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>/]+))"#)
            .expect("valid regex")
    })
}

fn table_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<table\b[^>]*>(.*?)</table\s*>").expect("valid regex"))
}

fn row_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<tr\b[^>]*>(.*?)</tr\s*>").expect("valid regex"))
}

fn cell_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<t([dh])\b[^>]*>(.*?)</t[dh]\s*>").expect("valid regex"))
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid regex"))
}

/// Elements that never have a closing tag.
const VOID_TAGS: &[&str] = &["input", "img", "br", "hr", "meta", "link"];

/// One located element.
#[derive(Debug, Clone, PartialEq)]
pub struct Element<'a> {
    /// Lowercased tag name.
    pub tag: String,
    /// Attributes with lowercased names, in document order.
    pub attrs: Vec<(String, String)>,
    /// Markup between the opening and closing tag.
    pub inner: &'a str,
}

impl Element<'_> {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_whitespace().any(|token| token.eq_ignore_ascii_case(class)))
    }

    /// Visible text; for form inputs, their `value` attribute.
    pub fn text(&self) -> String {
        if self.tag == "input" {
            return self.attr("value").map(clean_text).unwrap_or_default();
        }
        clean_text(self.inner)
    }
}

/// First element whose opening tag satisfies `matches`.
pub fn find_element<'a, F>(doc: &'a str, matches: F) -> Option<Element<'a>>
where
    F: Fn(&Element<'_>) -> bool,
{
    for caps in open_tag_re().captures_iter(doc) {
        let whole = caps.get(0)?;
        let tag = caps[1].to_ascii_lowercase();
        let attrs = caps.get(2).map(|m| parse_attrs(m.as_str())).unwrap_or_default();

        let probe = Element {
            tag,
            attrs,
            inner: "",
        };
        if !matches(&probe) {
            continue;
        }

        let self_closing = whole.as_str().ends_with("/>");
        let inner = if self_closing || VOID_TAGS.contains(&probe.tag.as_str()) {
            ""
        } else {
            inner_until_close(doc, whole.end(), &probe.tag)
        };

        return Some(Element { inner, ..probe });
    }
    None
}

/// Markup from `from` up to the close tag matching an already-open `tag`,
/// accounting for nested elements of the same name. Runs to the end of the
/// document when the close tag is missing.
fn inner_until_close<'a>(doc: &'a str, from: usize, tag: &str) -> &'a str {
    let lc = to_lowercase_fast(&doc[from..]);
    let open_pat = format!("<{}", tag);
    let close_pat = format!("</{}", tag);

    let mut depth = 1usize;
    let mut pos = 0usize;
    loop {
        let next_open = find_tag_start(&lc, &open_pat, pos);
        let Some(close) = find_tag_start(&lc, &close_pat, pos) else {
            return &doc[from..];
        };

        match next_open {
            Some(open) if open < close => {
                depth += 1;
                pos = open + open_pat.len();
            }
            _ => {
                depth -= 1;
                if depth == 0 {
                    return &doc[from..from + close];
                }
                pos = close + close_pat.len();
            }
        }
    }
}

/// Position of `pat` at or after `from` where it is followed by a tag-name
/// boundary, so `<td` does not match `<tdx`.
fn find_tag_start(lc: &str, pat: &str, from: usize) -> Option<usize> {
    let mut pos = from;
    while let Some(rel) = lc.get(pos..)?.find(pat) {
        let at = pos + rel;
        let boundary = lc[at + pat.len()..]
            .chars()
            .next()
            .map_or(true, |c| c == '>' || c == '/' || c.is_whitespace());
        if boundary {
            return Some(at);
        }
        pos = at + pat.len();
    }
    None
}

fn parse_attrs(raw: &str) -> Vec<(String, String)> {
    attr_re()
        .captures_iter(raw)
        .map(|c| {
            let value = c
                .get(2)
                .or_else(|| c.get(3))
                .or_else(|| c.get(4))
                .map(|m| normalize_entities(m.as_str()))
                .unwrap_or_default();
            (c[1].to_ascii_lowercase(), value)
        })
        .collect()
}

/// Value attribute of the first `<input>` named `name`.
pub fn input_value(doc: &str, name: &str) -> Option<String> {
    find_element(doc, |e| e.tag == "input" && e.attr("name") == Some(name))
        .and_then(|e| e.attr("value").map(str::to_string))
}

/// Whether the document contains a password field, i.e. renders a login form.
pub fn has_password_field(doc: &str) -> bool {
    find_element(doc, |e| {
        e.tag == "input"
            && e
                .attr("type")
                .is_some_and(|t| t.eq_ignore_ascii_case("password"))
    })
    .is_some()
}

/// Non-empty visible text runs, in document order. Script and style
/// contents are skipped.
pub fn text_segments(doc: &str) -> Vec<String> {
    text_runs(doc).into_iter().filter(|run| !run.is_empty()).collect()
}

/// Visible text runs like [`text_segments`], plus an empty run for every
/// element that opens and closes with nothing visible inside, so an empty
/// value cell keeps its place between its neighbours.
pub fn text_runs(doc: &str) -> Vec<String> {
    let doc = remove_blocks_ci(doc, "script");
    let doc = remove_blocks_ci(&doc, "style");

    let mut runs = Vec::new();
    let mut text = String::new();
    let mut tag = String::new();
    let mut in_tag = false;
    // Last opened element with no visible text after it yet.
    let mut open: Option<String> = None;
    for ch in doc.chars() {
        match ch {
            '<' if !in_tag => {
                in_tag = true;
                let run = normalize_ws(&normalize_entities(&text));
                if !run.is_empty() {
                    runs.push(run);
                    open = None;
                }
                text.clear();
                tag.clear();
            }
            '>' if in_tag => {
                in_tag = false;
                match parse_tag(&tag) {
                    Some((name, true)) => {
                        if open.as_deref() == Some(name.as_str()) {
                            runs.push(String::new());
                        }
                        open = None;
                    }
                    Some((name, false)) => {
                        let childless = tag.ends_with('/') || VOID_TAGS.contains(&name.as_str());
                        open = if childless { None } else { Some(name) };
                    }
                    None => {}
                }
            }
            _ if in_tag => tag.push(ch),
            _ => text.push(ch),
        }
    }

    let run = normalize_ws(&normalize_entities(&text));
    if !run.is_empty() {
        runs.push(run);
    }
    runs
}

/// Lowercased name of the tag between `<` and `>`, and whether it closes.
fn parse_tag(raw: &str) -> Option<(String, bool)> {
    let (closing, rest) = match raw.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };
    let name: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    if name.is_empty() || !rest.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    Some((name.to_ascii_lowercase(), closing))
}

/// Remove every `<tag ...>...</tag>` block, case-insensitive.
fn remove_blocks_ci(doc: &str, tag: &str) -> String {
    let lc = to_lowercase_fast(doc);
    let open_pat = format!("<{}", tag);
    let close_pat = format!("</{}", tag);

    let mut out = String::with_capacity(doc.len());
    let mut pos = 0usize;
    while let Some(start) = find_tag_start(&lc, &open_pat, pos) {
        out.push_str(&doc[pos..start]);
        let Some(close) = find_tag_start(&lc, &close_pat, start) else {
            return out;
        };
        pos = lc[close..].find('>').map_or(doc.len(), |gt| close + gt + 1);
    }
    out.push_str(&doc[pos..]);
    out
}

/// A parsed `<table>`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// All tables in the document, in order.
///
/// The header is the first row containing `<th>` cells, or the first row if
/// none does. Data rows are the following rows with at least one `<td>`.
pub fn tables(doc: &str) -> Vec<Table> {
    table_re()
        .captures_iter(doc)
        .map(|caps| parse_table(&caps[1]))
        .collect()
}

fn parse_table(inner: &str) -> Table {
    let rows: Vec<Vec<(bool, String)>> = row_re()
        .captures_iter(inner)
        .map(|row| {
            cell_re()
                .captures_iter(&row[1])
                .map(|cell| (cell[1].eq_ignore_ascii_case("h"), clean_text(&cell[2])))
                .collect()
        })
        .collect();

    let header_idx = rows
        .iter()
        .position(|cells| cells.iter().any(|(is_th, _)| *is_th))
        .unwrap_or(0);

    let Some(header_cells) = rows.get(header_idx) else {
        return Table::default();
    };

    Table {
        headers: header_cells.iter().map(|(_, t)| t.clone()).collect(),
        rows: rows
            .iter()
            .skip(header_idx + 1)
            .filter(|cells| cells.iter().any(|(is_th, _)| !*is_th))
            .map(|cells| cells.iter().map(|(_, t)| t.clone()).collect())
            .collect(),
    }
}

/// First numeric substring (`\d+(\.\d+)?`) of `text`, parsed.
pub fn first_number(text: &str) -> Option<f64> {
    number_re()
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Tags stripped, entities decoded, whitespace collapsed.
pub fn clean_text(s: &str) -> String {
    normalize_ws(&normalize_entities(&strip_tags(s)))
}

/// Remove all tags `<...>` from the string.
pub fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => {
                in_tag = true;
                out.push(' ');
            }
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

/// Decode the handful of entities the panel emits.
pub fn normalize_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&deg;", "°")
        .replace("&#176;", "°")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Collapse sequences of whitespace into a single space and trim.
pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fast ASCII-only lowercasing for tag matching; byte offsets are preserved.
pub fn to_lowercase_fast(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii() { c.to_ascii_lowercase() } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_element_by_id_with_nested_markup() {
        let doc = r#"<div class="card"><span id="poolTemp" class="reading"><b>82</b>&deg;F</span></div>"#;
        let el = find_element(doc, |e| e.attr("id") == Some("poolTemp")).unwrap();
        assert_eq!(el.tag, "span");
        assert!(el.has_class("reading"));
        assert_eq!(el.text(), "82 °F");
    }

    #[test]
    fn nested_same_tag_is_balanced() {
        let doc = r#"<div id="outer"><div>inner</div> tail</div><div>after</div>"#;
        let el = find_element(doc, |e| e.attr("id") == Some("outer")).unwrap();
        assert_eq!(el.inner, "<div>inner</div> tail");
    }

    #[test]
    fn attribute_quoting_styles() {
        let doc = r#"<P ID='a'>one</P><p data-field=b>two</p>"#;
        assert_eq!(find_element(doc, |e| e.attr("id") == Some("a")).unwrap().text(), "one");
        assert_eq!(
            find_element(doc, |e| e.attr("data-field") == Some("b")).unwrap().text(),
            "two"
        );
    }

    #[test]
    fn unclosed_element_runs_to_end() {
        let doc = r#"<span id="x">3100 ppm"#;
        let el = find_element(doc, |e| e.attr("id") == Some("x")).unwrap();
        assert_eq!(el.text(), "3100 ppm");
    }

    #[test]
    fn input_text_is_its_value() {
        let doc = r#"<form><input type="hidden" name="csrf_token" value="abc123"/><input type="password" name="password"></form>"#;
        assert_eq!(input_value(doc, "csrf_token").as_deref(), Some("abc123"));
        assert!(has_password_field(doc));
        assert!(!has_password_field("<p>welcome</p>"));
    }

    #[test]
    fn segments_skip_script_and_style() {
        let doc = "<style>p { color: red }</style><p>Pool Temp:</p><script>var x = '<b>';</script><td> 82 </td>";
        assert_eq!(text_segments(doc), vec!["Pool Temp:", "82"]);
    }

    #[test]
    fn runs_keep_empty_cells() {
        let doc = "<dt>Mode:</dt><dd></dd><dt>Valve:</dt><dd> Pool </dd><br/><td><span> </span></td>";
        assert_eq!(text_runs(doc), vec!["Mode:", "", "Valve:", "Pool", ""]);
        assert_eq!(text_segments(doc), vec!["Mode:", "Valve:", "Pool"]);
    }

    #[test]
    fn parses_tables_with_th_header() {
        let doc = r#"
            <table><tr><td>layout</td></tr></table>
            <table class="schedules">
              <thead><tr><th>Name</th><th>Start</th></tr></thead>
              <tbody>
                <tr><td>Filter</td><td>08:00</td></tr>
                <tr><td>Spa &amp; Jets</td><td>18:30</td></tr>
              </tbody>
            </table>"#;

        let tables = tables(doc);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].headers, vec!["layout"]);
        assert!(tables[0].rows.is_empty());
        assert_eq!(tables[1].headers, vec!["Name", "Start"]);
        assert_eq!(tables[1].rows[1], vec!["Spa & Jets", "18:30"]);
    }

    #[test]
    fn first_number_takes_leading_match() {
        assert_eq!(first_number("Salt: 3,200 ppm"), Some(3.0));
        assert_eq!(first_number("82.5°F"), Some(82.5));
        assert_eq!(first_number("Speed 75%"), Some(75.0));
        assert_eq!(first_number("off"), None);
    }

    #[test]
    fn whitespace_and_entities() {
        assert_eq!(clean_text("  a&nbsp;&nbsp;<br>b \n c "), "a b c");
        assert_eq!(normalize_entities("&amp;lt;"), "&lt;");
    }
}
