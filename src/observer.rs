use log::{debug, info};
use reqwest::Method;

/// Diagnostics hook injected into a session.
///
/// The session calls it around every HTTP exchange; nothing else in the crate
/// keeps logging state.
pub trait RequestObserver: Send + Sync {
    /// A session was opened with the given credential mode
    fn on_session(&self, _base_url: &str, _auth_mode: &str) {}

    /// A request is about to be sent
    fn on_request(&self, _method: &Method, _url: &str) {}

    /// A response arrived (any status)
    fn on_response(&self, _method: &Method, _url: &str, _status: u16) {}

    /// A paginated fetch requests another page
    fn on_page(&self, _endpoint: &str, _page: usize) {}
}

/// Forwards events to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl RequestObserver for LogObserver {
    fn on_session(&self, base_url: &str, auth_mode: &str) {
        debug!("Initialize session by {} for {}", auth_mode, base_url);
    }

    fn on_request(&self, method: &Method, url: &str) {
        debug!("HTTP {} {}", method, url);
    }

    fn on_response(&self, method: &Method, url: &str, status: u16) {
        if status >= 400 {
            info!("HTTP {} {} failed with {}", method, url, status);
        } else {
            debug!("HTTP {} {} -> {}", method, url, status);
        }
    }

    fn on_page(&self, endpoint: &str, page: usize) {
        debug!("Fetching page {} of {}", page, endpoint);
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RequestObserver for NoopObserver {}
