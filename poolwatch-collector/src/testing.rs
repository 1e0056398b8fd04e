//! In-memory stand-in for the controller panel.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::FetchError;
use crate::transport::{HttpResponse, Transport};

pub(crate) const BASE_URL: &str = "http://panel.test";

#[derive(Debug, Default)]
struct PanelState {
    pages: HashMap<String, String>,
    scripted: HashMap<String, VecDeque<Result<HttpResponse, FetchError>>>,
    sessions: HashSet<String>,
    next_session: u64,
    gets: HashMap<String, usize>,
    logins: usize,
}

/// Serves a login form guarded by a CSRF token, issues `SESSION` cookies on
/// correct credentials, and redirects cookieless page requests to `/login`.
#[derive(Debug, Default)]
pub(crate) struct MockPanel {
    login_delay: Duration,
    state: Mutex<PanelState>,
}

impl MockPanel {
    pub(crate) const PASSWORD: &'static str = "hunter2";
    pub(crate) const TOKEN: &'static str = "tok-42";

    pub(crate) fn with_login_delay(delay: Duration) -> Self {
        Self {
            login_delay: delay,
            ..Default::default()
        }
    }

    pub(crate) fn set_page(&self, path: &str, body: &str) {
        self.state.lock().pages.insert(path.to_string(), body.to_string());
    }

    /// The next `times` GETs of `path` fail with `err` before any auth check.
    pub(crate) fn fail_next(&self, path: &str, err: FetchError, times: usize) {
        let mut state = self.state.lock();
        let queue = state.scripted.entry(path.to_string()).or_default();
        queue.extend(std::iter::repeat(Err(err)).take(times));
    }

    /// The next `times` GETs of `path` answer with `status`.
    pub(crate) fn respond_next(&self, path: &str, status: u16, times: usize) {
        let mut state = self.state.lock();
        let queue = state.scripted.entry(path.to_string()).or_default();
        let response = HttpResponse {
            status,
            ..Default::default()
        };
        queue.extend(std::iter::repeat(Ok(response)).take(times));
    }

    /// The next `times` GETs of `path` redirect to `location`.
    pub(crate) fn redirect_next(&self, path: &str, location: &str, times: usize) {
        let mut state = self.state.lock();
        let queue = state.scripted.entry(path.to_string()).or_default();
        queue.extend(std::iter::repeat(Ok(Self::redirect(location))).take(times));
    }

    /// Forget every issued session cookie.
    pub(crate) fn expire_sessions(&self) {
        self.state.lock().sessions.clear();
    }

    pub(crate) fn logins(&self) -> usize {
        self.state.lock().logins
    }

    pub(crate) fn gets(&self, path: &str) -> usize {
        self.state.lock().gets.get(path).copied().unwrap_or(0)
    }

    fn login_form() -> String {
        format!(
            r#"<form method="post" action="/login">
                 <input type="hidden" name="csrf_token" value="{}">
                 <input type="text" name="username">
                 <input type="password" name="password">
               </form>"#,
            Self::TOKEN
        )
    }

    fn redirect(location: &str) -> HttpResponse {
        HttpResponse {
            status: 302,
            location: Some(location.to_string()),
            ..Default::default()
        }
    }
}

fn path_of(url: &str) -> &str {
    url.strip_prefix(BASE_URL).unwrap_or(url)
}

fn session_cookie(cookie: Option<&str>) -> Option<&str> {
    cookie?
        .split("; ")
        .find_map(|pair| pair.strip_prefix("SESSION="))
}

#[async_trait]
impl Transport for MockPanel {
    async fn get(&self, url: &str, cookie: Option<&str>) -> Result<HttpResponse, FetchError> {
        let path = path_of(url);
        let mut state = self.state.lock();
        *state.gets.entry(path.to_string()).or_default() += 1;

        if let Some(scripted) = state.scripted.get_mut(path).and_then(VecDeque::pop_front) {
            return scripted;
        }

        if path == "/login" {
            return Ok(HttpResponse {
                set_cookies: vec!["pre=1; Path=/".to_string()],
                ..HttpResponse::ok(Self::login_form())
            });
        }

        let authorized = session_cookie(cookie).is_some_and(|id| state.sessions.contains(id));
        if !authorized {
            return Ok(Self::redirect("/login?next=%2F"));
        }

        match state.pages.get(path) {
            Some(body) => Ok(HttpResponse::ok(body.clone())),
            None => Ok(HttpResponse {
                status: 404,
                ..Default::default()
            }),
        }
    }

    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
        _cookie: Option<&str>,
    ) -> Result<HttpResponse, FetchError> {
        self.state.lock().logins += 1;
        if !self.login_delay.is_zero() {
            tokio::time::sleep(self.login_delay).await;
        }

        if path_of(url) != "/login" {
            return Ok(HttpResponse {
                status: 404,
                ..Default::default()
            });
        }

        let field = |name: &str| form.iter().find(|(k, _)| *k == name).map(|(_, v)| *v);
        let accepted = field("username") == Some("admin")
            && field("password") == Some(Self::PASSWORD)
            && field("csrf_token") == Some(Self::TOKEN);
        if !accepted {
            return Ok(HttpResponse::ok(Self::login_form()));
        }

        let mut state = self.state.lock();
        state.next_session += 1;
        let id = format!("s{}", state.next_session);
        state.sessions.insert(id.clone());

        Ok(HttpResponse {
            set_cookies: vec![format!("SESSION={}; Path=/; HttpOnly", id)],
            ..Self::redirect("/dashboard")
        })
    }
}
