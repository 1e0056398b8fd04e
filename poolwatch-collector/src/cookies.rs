//! Minimal cookie store: names and values only, replayed verbatim.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: BTreeMap<String, String>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorb `Set-Cookie` header values.
    ///
    /// Only the leading `name=value` pair is kept; attributes are ignored
    /// except that `Max-Age=0` or an empty value deletes the cookie.
    /// Returns how many cookies were set.
    pub fn absorb<'a>(&mut self, headers: impl IntoIterator<Item = &'a str>) -> usize {
        let mut set = 0;
        for header in headers {
            let mut parts = header.split(';');
            let Some((name, value)) = parts.next().and_then(|pair| pair.split_once('=')) else {
                continue;
            };
            let name = name.trim();
            let value = value.trim().trim_matches('"');
            if name.is_empty() {
                continue;
            }

            let expired = parts.any(|attr| {
                attr.split_once('=').is_some_and(|(k, v)| {
                    k.trim().eq_ignore_ascii_case("max-age") && v.trim() == "0"
                })
            });

            if expired || value.is_empty() {
                self.cookies.remove(name);
            } else {
                self.cookies.insert(name.to_string(), value.to_string());
                set += 1;
            }
        }
        set
    }

    /// The `Cookie` request header value, or `None` when empty.
    pub fn header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn clear(&mut self) {
        self.cookies.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absorbs_name_value_and_ignores_attributes() {
        let mut jar = CookieJar::new();
        let set = jar.absorb([
            "SESSIONID=abc123; Path=/; HttpOnly",
            "theme=\"dark\"; Max-Age=3600",
        ]);

        assert_eq!(set, 2);
        assert_eq!(jar.get("SESSIONID"), Some("abc123"));
        assert_eq!(jar.get("theme"), Some("dark"));
        assert_eq!(jar.header().as_deref(), Some("SESSIONID=abc123; theme=dark"));
    }

    #[test]
    fn later_values_overwrite_and_expired_cookies_are_removed() {
        let mut jar = CookieJar::new();
        jar.absorb(["a=1", "b=2"]);
        jar.absorb(["a=3", "b=; Max-Age=0"]);

        assert_eq!(jar.get("a"), Some("3"));
        assert_eq!(jar.get("b"), None);
        assert_eq!(jar.len(), 1);
    }

    #[test]
    fn malformed_headers_are_skipped() {
        let mut jar = CookieJar::new();
        assert_eq!(jar.absorb(["garbage", "=nameless"]), 0);
        assert!(jar.header().is_none());
    }

    #[test]
    fn clear_empties_jar() {
        let mut jar = CookieJar::new();
        jar.absorb(["a=1"]);
        jar.clear();
        assert!(jar.is_empty());
    }
}
