//! Authenticated session against the controller panel.
//!
//! The panel only speaks browser: a login form, a session cookie, and HTML
//! pages. [`Session`] owns that cookie for one identity and is the only thing
//! in the crate allowed to issue requests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use poolwatch_types::{current_timestamp_ms, Credentials, Endpoint};
use tokio::sync::OnceCell;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::cookies::CookieJar;
use crate::error::{AuthError, FetchError};
use crate::markup;
use crate::transport::{HttpResponse, Transport};

/// Sessions idle longer than this are considered stale.
pub const DEFAULT_STALENESS: Duration = Duration::from_secs(30 * 60);

/// Default path of the login form.
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Same-origin redirects followed by [`Session::fetch`] before giving up.
const MAX_REDIRECTS: usize = 5;

/// Hidden form fields that carry an anti-forgery token, in lookup order.
const TOKEN_FIELDS: &[&str] = &[
    "csrf_token",
    "__RequestVerificationToken",
    "authenticity_token",
    "token",
];

/// Where and how to log in.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub base_url: String,
    pub login_path: String,
    pub staleness: Duration,
}

impl SessionConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            staleness: DEFAULT_STALENESS,
        }
    }

    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    pub fn with_staleness(mut self, staleness: Duration) -> Self {
        self.staleness = staleness;
        self
    }
}

/// Lifecycle position of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    /// A login handshake is in flight.
    Authenticating,
    Authenticated,
    /// Authenticated, but idle past the staleness window.
    Stale,
    /// The panel rejected our cookie; re-authentication is required.
    Invalidated,
}

/// One fetched page, alive for the duration of one extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    pub endpoint: Endpoint,
    pub markup: String,
    pub fetched_at_ms: u64,
}

#[derive(Debug, Default)]
struct Inner {
    cookies: CookieJar,
    authenticated: bool,
    invalidated: bool,
    last_activity: Option<Instant>,
    token: Option<String>,
    /// Bumped on every successful login, so a stale expiry report from a
    /// request sent under an older login does not clobber a newer one.
    generation: u64,
}

impl Inner {
    fn is_fresh(&self, staleness: Duration) -> bool {
        self.last_activity
            .is_some_and(|at| at.elapsed() < staleness)
    }

    fn is_valid(&self, staleness: Duration) -> bool {
        self.authenticated && !self.invalidated && self.is_fresh(staleness)
    }

    fn reset(&mut self) {
        self.cookies.clear();
        self.authenticated = false;
        self.invalidated = false;
        self.last_activity = None;
        self.token = None;
    }
}

type LoginCell = Arc<OnceCell<Result<(), AuthError>>>;

/// Authenticated session for one identity.
///
/// Concurrent [`authenticate`](Self::authenticate) calls share a single
/// login handshake and all observe its outcome.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    credentials: Credentials,
    transport: Arc<dyn Transport>,
    inner: Mutex<Inner>,
    in_flight: Mutex<Option<LoginCell>>,
    handshakes: AtomicU64,
}

impl Session {
    pub fn new(config: SessionConfig, credentials: Credentials, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            credentials,
            transport,
            inner: Mutex::new(Inner::default()),
            in_flight: Mutex::new(None),
            handshakes: AtomicU64::new(0),
        }
    }

    /// Log in, unless the session is already valid.
    pub async fn authenticate(&self) -> Result<(), AuthError> {
        let cell = {
            let mut slot = self.in_flight.lock();
            match slot.as_ref() {
                Some(cell) => Arc::clone(cell),
                None => {
                    if self.is_valid() {
                        return Ok(());
                    }
                    let cell: LoginCell = Arc::new(OnceCell::new());
                    *slot = Some(Arc::clone(&cell));
                    cell
                }
            }
        };

        let result = cell.get_or_init(|| self.login()).await.clone();

        let mut slot = self.in_flight.lock();
        if slot.as_ref().is_some_and(|current| Arc::ptr_eq(current, &cell)) {
            *slot = None;
        }

        result
    }

    async fn login(&self) -> Result<(), AuthError> {
        if self.credentials.is_blank() {
            return Err(AuthError::MissingCredentials);
        }

        self.handshakes.fetch_add(1, Ordering::Relaxed);
        info!(username = %self.credentials.username(), "Logging in to panel");

        match self.handshake().await {
            Ok((cookies, token)) => {
                let mut inner = self.inner.lock();
                inner.cookies = cookies;
                inner.token = token;
                inner.authenticated = true;
                inner.invalidated = false;
                inner.last_activity = Some(Instant::now());
                inner.generation += 1;
                info!(username = %self.credentials.username(), "Panel session established");
                Ok(())
            }
            Err(err) => {
                self.inner.lock().reset();
                Err(err)
            }
        }
    }

    async fn handshake(&self) -> Result<(CookieJar, Option<String>), AuthError> {
        let url = self.url(&self.config.login_path);
        let mut jar = CookieJar::new();

        let page = self
            .transport
            .get(&url, None)
            .await
            .map_err(|e| AuthError::Handshake(format!("login page: {}", e)))?;
        if !page.is_success() {
            return Err(AuthError::Handshake(format!(
                "login page returned status {}",
                page.status
            )));
        }
        jar.absorb(page.set_cookies.iter().map(String::as_str));

        let token = TOKEN_FIELDS
            .iter()
            .find_map(|name| markup::input_value(&page.body, name).map(|value| (*name, value)));

        let mut form = vec![
            ("username", self.credentials.username()),
            ("password", self.credentials.password()),
        ];
        if let Some((name, value)) = &token {
            form.push((name, value.as_str()));
        }

        let response = self
            .transport
            .post_form(&url, &form, jar.header().as_deref())
            .await
            .map_err(|e| AuthError::Handshake(format!("login post: {}", e)))?;

        match response.status {
            401 | 403 => {
                return Err(AuthError::Rejected(format!("status {}", response.status)));
            }
            status if status >= 400 => {
                return Err(AuthError::Handshake(format!("login returned status {}", status)));
            }
            _ => {}
        }

        if self.is_login_page(&response) {
            return Err(AuthError::Rejected("login form shown again".to_string()));
        }

        jar.absorb(response.set_cookies.iter().map(String::as_str));
        if jar.is_empty() {
            return Err(AuthError::Handshake("no session cookie issued".to_string()));
        }

        Ok((jar, token.map(|(_, value)| value)))
    }

    /// True iff authenticated and active within the staleness window.
    pub fn is_valid(&self) -> bool {
        self.inner.lock().is_valid(self.config.staleness)
    }

    pub fn state(&self) -> SessionState {
        if self.in_flight.lock().is_some() {
            return SessionState::Authenticating;
        }

        let inner = self.inner.lock();
        if inner.invalidated {
            SessionState::Invalidated
        } else if !inner.authenticated {
            SessionState::Unauthenticated
        } else if inner.is_fresh(self.config.staleness) {
            SessionState::Authenticated
        } else {
            SessionState::Stale
        }
    }

    /// Fetch one page with the session cookie attached.
    ///
    /// Fails with [`FetchError::NotAuthenticated`] when the session is not
    /// valid, and with [`FetchError::SessionExpired`] when the panel answers
    /// with its login page; the session is then invalidated.
    pub async fn fetch(&self, endpoint: Endpoint, path: &str) -> Result<RawDocument, FetchError> {
        let (cookie, generation) = {
            let inner = self.inner.lock();
            if !inner.is_valid(self.config.staleness) {
                return Err(FetchError::NotAuthenticated);
            }
            (inner.cookies.header(), inner.generation)
        };

        let mut url = self.url(path);
        let mut response = self.transport.get(&url, cookie.as_deref()).await?;
        for _ in 0..MAX_REDIRECTS {
            if !response.is_redirect() || self.is_login_page(&response) {
                break;
            }
            let Some(next) = response.location.as_deref().and_then(|l| self.same_origin(l)) else {
                break;
            };
            debug!(endpoint = %endpoint, from = %url, to = %next, "Following redirect");
            url = next;
            response = self.transport.get(&url, cookie.as_deref()).await?;
        }

        if matches!(response.status, 401 | 403) || self.is_login_page(&response) {
            self.invalidate(generation);
            warn!(endpoint = %endpoint, status = response.status, "Panel session expired");
            return Err(FetchError::SessionExpired);
        }

        if !response.is_success() {
            return Err(FetchError::Status(response.status));
        }

        {
            let mut inner = self.inner.lock();
            if inner.generation == generation {
                inner.cookies.absorb(response.set_cookies.iter().map(String::as_str));
            }
            inner.last_activity = Some(Instant::now());
        }

        debug!(endpoint = %endpoint, bytes = response.body.len(), "Fetched page");
        Ok(RawDocument {
            endpoint,
            markup: response.body,
            fetched_at_ms: current_timestamp_ms(),
        })
    }

    fn invalidate(&self, generation: u64) {
        let mut inner = self.inner.lock();
        if inner.generation == generation && inner.authenticated {
            inner.cookies.clear();
            inner.authenticated = false;
            inner.invalidated = true;
        }
    }

    /// Drop cookies and return to unauthenticated. Idempotent.
    pub fn cleanup(&self) {
        let mut inner = self.inner.lock();
        if inner.authenticated || inner.invalidated || !inner.cookies.is_empty() {
            debug!("Cleaning up panel session");
        }
        inner.reset();
    }

    /// Number of login handshakes attempted.
    pub fn handshakes(&self) -> u64 {
        self.handshakes.load(Ordering::Relaxed)
    }

    /// Anti-forgery token captured during the last login.
    pub fn session_token(&self) -> Option<String> {
        self.inner.lock().token.clone()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.config.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }

    /// Absolute URL for a redirect target on the panel's own origin.
    /// Relative targets resolve against the base URL.
    fn same_origin(&self, location: &str) -> Option<String> {
        if location.starts_with("//") {
            return None;
        }
        if !location.contains("://") {
            return Some(self.url(location));
        }
        origin(location)
            .eq_ignore_ascii_case(origin(&self.config.base_url))
            .then(|| location.to_string())
    }

    /// Whether the response is the login page, either rendered or as a
    /// redirect target.
    fn is_login_page(&self, response: &HttpResponse) -> bool {
        if response.is_redirect() {
            return response
                .location
                .as_deref()
                .is_some_and(|location| same_path(location, &self.config.login_path));
        }
        response.is_success() && markup::has_password_field(&response.body)
    }
}

/// `scheme://host[:port]` of an absolute URL.
fn origin(url: &str) -> &str {
    let Some(scheme_end) = url.find("://") else {
        return "";
    };
    let host_start = scheme_end + 3;
    match url[host_start..].find(['/', '?', '#']) {
        Some(end) => &url[..host_start + end],
        None => url,
    }
}

/// Compare the path of a (possibly absolute) URL with `path`, ignoring query
/// string, trailing slash and case.
fn same_path(url: &str, path: &str) -> bool {
    let without_origin = match url.find("://") {
        Some(scheme_end) => {
            let rest = &url[scheme_end + 3..];
            rest.find('/').map_or("/", |slash| &rest[slash..])
        }
        None => url,
    };
    let target = without_origin
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');

    target.eq_ignore_ascii_case(path.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use futures_util::future::join_all;

    use super::*;
    use crate::testing::{MockPanel, BASE_URL};

    fn session(panel: &Arc<MockPanel>) -> Session {
        Session::new(
            SessionConfig::new(BASE_URL),
            Credentials::new("admin", MockPanel::PASSWORD),
            panel.clone(),
        )
    }

    #[tokio::test]
    async fn authenticate_establishes_session() {
        let panel = Arc::new(MockPanel::default());
        let session = session(&panel);
        assert_eq!(session.state(), SessionState::Unauthenticated);

        session.authenticate().await.unwrap();

        assert!(session.is_valid());
        assert_eq!(session.state(), SessionState::Authenticated);
        assert_eq!(session.session_token().as_deref(), Some(MockPanel::TOKEN));
        assert_eq!(panel.logins(), 1);

        // Already valid: no second handshake.
        session.authenticate().await.unwrap();
        assert_eq!(session.handshakes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_one_handshake() {
        let panel = Arc::new(MockPanel::with_login_delay(Duration::from_millis(50)));
        let session = session(&panel);

        let results = join_all((0..8).map(|_| session.authenticate())).await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(panel.logins(), 1);
        assert_eq!(session.handshakes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_one_failure() {
        let panel = Arc::new(MockPanel::with_login_delay(Duration::from_millis(50)));
        let session = Session::new(
            SessionConfig::new(BASE_URL),
            Credentials::new("admin", "wrong"),
            panel.clone(),
        );

        let results = join_all((0..5).map(|_| session.authenticate())).await;

        assert_eq!(panel.logins(), 1);
        for result in results {
            assert!(matches!(result, Err(AuthError::Rejected(_))));
        }
        assert_eq!(session.state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn blank_credentials_never_reach_the_panel() {
        let panel = Arc::new(MockPanel::default());
        let session = Session::new(SessionConfig::new(BASE_URL), Credentials::new("", ""), panel.clone());

        assert_eq!(session.authenticate().await, Err(AuthError::MissingCredentials));
        assert_eq!(panel.logins(), 0);
    }

    #[tokio::test]
    async fn unreachable_panel_is_a_handshake_failure() {
        let panel = Arc::new(MockPanel::default());
        panel.fail_next("/login", FetchError::Connection("refused".into()), 1);
        let session = session(&panel);

        let err = session.authenticate().await.unwrap_err();
        assert!(matches!(err, AuthError::Handshake(_)));
    }

    #[tokio::test]
    async fn fetch_requires_authentication() {
        let panel = Arc::new(MockPanel::default());
        let session = session(&panel);

        let err = session.fetch(Endpoint::Dashboard, "/dashboard").await.unwrap_err();
        assert_eq!(err, FetchError::NotAuthenticated);
        assert_eq!(panel.gets("/dashboard"), 0);
    }

    #[tokio::test]
    async fn fetch_returns_page_markup() {
        let panel = Arc::new(MockPanel::default());
        panel.set_page("/dashboard", "<span id=\"airTemp\">71</span>");
        let session = session(&panel);
        session.authenticate().await.unwrap();

        let doc = session.fetch(Endpoint::Dashboard, "/dashboard").await.unwrap();
        assert_eq!(doc.endpoint, Endpoint::Dashboard);
        assert!(doc.markup.contains("airTemp"));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_session_goes_stale() {
        let panel = Arc::new(MockPanel::default());
        panel.set_page("/dashboard", "<p>ok</p>");
        let session = session(&panel);
        session.authenticate().await.unwrap();

        tokio::time::advance(Duration::from_secs(20 * 60)).await;
        session.fetch(Endpoint::Dashboard, "/dashboard").await.unwrap();

        // Activity refreshed the window.
        tokio::time::advance(Duration::from_secs(20 * 60)).await;
        assert!(session.is_valid());

        tokio::time::advance(Duration::from_secs(11 * 60)).await;
        assert!(!session.is_valid());
        assert_eq!(session.state(), SessionState::Stale);
        assert_eq!(
            session.fetch(Endpoint::Dashboard, "/dashboard").await,
            Err(FetchError::NotAuthenticated)
        );
    }

    #[tokio::test]
    async fn login_page_response_invalidates_session() {
        let panel = Arc::new(MockPanel::default());
        panel.set_page("/equipment/filter", "<p>Pump: On</p>");
        let session = session(&panel);
        session.authenticate().await.unwrap();

        panel.expire_sessions();
        let err = session.fetch(Endpoint::Filter, "/equipment/filter").await.unwrap_err();
        assert_eq!(err, FetchError::SessionExpired);
        assert_eq!(session.state(), SessionState::Invalidated);
        assert!(!session.is_valid());

        session.authenticate().await.unwrap();
        assert_eq!(panel.logins(), 2);
        assert!(session.fetch(Endpoint::Filter, "/equipment/filter").await.is_ok());
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let panel = Arc::new(MockPanel::default());
        let session = session(&panel);
        session.authenticate().await.unwrap();

        let err = session.fetch(Endpoint::Lights, "/missing").await.unwrap_err();
        assert_eq!(err, FetchError::Status(404));
        assert!(session.is_valid());
    }

    #[tokio::test]
    async fn follows_same_origin_redirects() {
        let panel = Arc::new(MockPanel::default());
        panel.set_page("/equipment/filter/", "<b id=\"pumpStatus\">On</b>");
        panel.redirect_next("/equipment/filter", "/equipment/filter/", 1);
        let session = session(&panel);
        session.authenticate().await.unwrap();

        let doc = session.fetch(Endpoint::Filter, "/equipment/filter").await.unwrap();
        assert!(doc.markup.contains("pumpStatus"));
        assert_eq!(panel.gets("/equipment/filter/"), 1);

        let absolute = format!("{}/equipment/filter/", BASE_URL);
        panel.redirect_next("/equipment/filter", &absolute, 1);
        assert!(session.fetch(Endpoint::Filter, "/equipment/filter").await.is_ok());
    }

    #[tokio::test]
    async fn foreign_and_endless_redirects_are_reported() {
        let panel = Arc::new(MockPanel::default());
        let session = session(&panel);
        session.authenticate().await.unwrap();

        panel.redirect_next("/lights", "http://elsewhere.test/lights", 1);
        let err = session.fetch(Endpoint::Lights, "/lights").await.unwrap_err();
        assert_eq!(err, FetchError::Status(302));

        panel.redirect_next("/lights", "/lights", 10);
        let err = session.fetch(Endpoint::Lights, "/lights").await.unwrap_err();
        assert_eq!(err, FetchError::Status(302));
        assert_eq!(panel.gets("/lights"), 1 + 1 + MAX_REDIRECTS);
        assert!(session.is_valid());
    }

    #[test]
    fn origin_of_urls() {
        assert_eq!(origin("http://panel.test:8080/a?b"), "http://panel.test:8080");
        assert_eq!(origin("https://panel.test"), "https://panel.test");
        assert_eq!(origin("/relative"), "");
    }

    #[tokio::test]
    async fn cleanup_is_idempotent() {
        let panel = Arc::new(MockPanel::default());
        let session = session(&panel);
        session.authenticate().await.unwrap();

        session.cleanup();
        session.cleanup();

        assert_eq!(session.state(), SessionState::Unauthenticated);
        assert!(session.session_token().is_none());
        assert_eq!(
            session.fetch(Endpoint::Dashboard, "/dashboard").await,
            Err(FetchError::NotAuthenticated)
        );
    }

    #[test]
    fn redirect_targets_compare_by_path() {
        assert!(same_path("/login", "/login"));
        assert!(same_path("http://panel.local/Login/?next=%2F", "/login"));
        assert!(!same_path("/dashboard", "/login"));
        assert!(!same_path("https://panel.local", "/login"));
    }
}
