//! Rate Limit Tracking
//!
//! Reads the rate limit headers the API attaches to every response and works out
//! how long to hold off before the next request.

use parking_lot::RwLock;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use std::time::{Duration, Instant};
use tracing::debug;

const REMAINING_REQUESTS: &str = "x-ratelimit-remaining-requests";
const REMAINING_TOKENS: &str = "x-ratelimit-remaining-tokens";
const RESET_REQUESTS: &str = "x-ratelimit-reset-requests";

/// Longest wait taken from server headers unless configured otherwise
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(60 * 60);

/// Last known rate limit state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitState {
    /// Remaining requests in the current window
    pub requests_remaining: Option<u32>,

    /// Remaining tokens in the current window
    pub tokens_remaining: Option<u32>,

    /// When the request window resets
    pub reset_at: Option<Instant>,

    /// Set after a 429 that carried `retry-after`
    pub retry_at: Option<Instant>,
}

/// Tracks rate limit headers across requests; shared by every call a client makes
#[derive(Debug)]
pub struct RateLimitTracker {
    state: RwLock<RateLimitState>,

    /// Upper bound on any wait read from headers
    max_wait: Duration,
}

impl Default for RateLimitTracker {
    fn default() -> Self {
        Self::with_max_wait(DEFAULT_MAX_WAIT)
    }
}

impl RateLimitTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clamp every header-derived wait to `max_wait`.
    pub fn with_max_wait(max_wait: Duration) -> Self {
        Self {
            state: RwLock::new(RateLimitState::default()),
            max_wait,
        }
    }

    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }

    fn deadline(&self, wait: Duration) -> Option<Instant> {
        Instant::now().checked_add(wait.min(self.max_wait))
    }

    /// Record the headers of any response.
    pub fn record(&self, headers: &HeaderMap) {
        let mut state = self.state.write();

        if let Some(n) = header_str(headers, REMAINING_REQUESTS).and_then(parse_count) {
            state.requests_remaining = Some(n);
        }
        if let Some(n) = header_str(headers, REMAINING_TOKENS).and_then(parse_count) {
            state.tokens_remaining = Some(n);
        }
        if let Some(reset) = header_str(headers, RESET_REQUESTS).and_then(parse_duration_string) {
            state.reset_at = self.deadline(reset);
        }
    }

    /// Record a 429 response. Returns the server's `retry-after`, clamped to
    /// the maximum wait, if it sent one.
    pub fn record_rate_limited(&self, headers: &HeaderMap) -> Option<Duration> {
        self.record(headers);

        let retry_after = header_str(headers, RETRY_AFTER.as_str())
            .and_then(parse_duration_string)
            .map(|wait| wait.min(self.max_wait));
        if let Some(wait) = retry_after {
            debug!(?wait, "rate limited");
            self.state.write().retry_at = self.deadline(wait);
        }
        retry_after
    }

    /// How long to wait before sending the next request, if at all.
    pub fn should_wait(&self) -> Option<Duration> {
        let state = self.state.read();
        let now = Instant::now();

        let exhausted = state
            .reset_at
            .filter(|_| state.requests_remaining == Some(0));

        [state.retry_at, exhausted]
            .into_iter()
            .flatten()
            .filter(|&at| at > now)
            .max()
            .map(|at| at - now)
    }

    /// A copy of the current state
    pub fn snapshot(&self) -> RateLimitState {
        self.state.read().clone()
    }

    /// Forget everything recorded so far
    pub fn clear(&self) {
        *self.state.write() = RateLimitState::default();
    }
}

fn parse_count(s: &str) -> Option<u32> {
    s.trim().parse().ok()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Parse plain seconds (`"20"`, `"1.5"`) or a unit string such as `"6m0s"`,
/// `"1h2m3.5s"` or `"20ms"`.
pub(crate) fn parse_duration_string(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(secs) = s.parse::<f64>() {
        return Duration::try_from_secs_f64(secs).ok();
    }

    let mut total = 0f64;
    let mut rest = s;
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if digits == 0 {
            return None;
        }
        let value: f64 = rest[..digits].parse().ok()?;
        rest = &rest[digits..];

        let (scale, unit_len) = if rest.starts_with("ms") {
            (0.001, 2)
        } else if rest.starts_with('h') {
            (3600.0, 1)
        } else if rest.starts_with('m') {
            (60.0, 1)
        } else if rest.starts_with('s') {
            (1.0, 1)
        } else {
            return None;
        };
        total += value * scale;
        rest = &rest[unit_len..];
    }

    Duration::try_from_secs_f64(total).ok()
}
