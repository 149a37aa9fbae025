//! Named diagnostic hooks, one `log` target per concern.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::app::{ActionKind, Origin};
use crate::error::DashboardError;

const ACTION: &str = "dashboard.action";
const FETCH: &str = "dashboard.fetch";
const URL: &str = "dashboard.url";
const CHART: &str = "dashboard.chart";
const SETTINGS: &str = "dashboard.settings";

pub fn log_action_start(action: ActionKind, origin: Origin) {
    log::debug!(target: ACTION, "{action:?} started ({origin:?})");
}

pub fn log_action_failed(action: ActionKind, origin: Origin, err: &DashboardError) {
    match (origin, err) {
        (Origin::Replay, _) => {
            log::debug!(target: ACTION, "{action:?} replay failed, ignored: {err}")
        }
        (_, DashboardError::Validation(_)) => {
            log::debug!(target: ACTION, "{action:?} rejected: {err}")
        }
        _ => log::warn!(target: ACTION, "{action:?} failed: {err}"),
    }
}

pub fn log_action_done(action: ActionKind, detail: impl AsRef<str>) {
    log::info!(target: ACTION, "{action:?} done: {}", detail.as_ref());
}

pub fn log_fetch_issued(token: u64, ticker: &str) {
    log::debug!(target: FETCH, "request #{token} for {ticker}");
}

pub fn log_fetch_request(url: &str) {
    log::debug!(target: FETCH, "GET {url}");
}

pub fn log_payload_unwrapped(key: &str, rows: usize) {
    log::trace!(target: FETCH, "payload wrapped under {key:?}; {rows} rows");
}

pub fn log_stale_response(token: u64, latest: u64) {
    static COUNT: AtomicU64 = AtomicU64::new(0);
    let n = COUNT.fetch_add(1, Ordering::Relaxed) + 1;
    if n <= 10 || n % 50 == 0 {
        log::info!(
            target: FETCH,
            "discarding response #{token}; superseded for its panel, last issued #{latest} (stale #{n})"
        );
    }
}

pub fn log_url_replaced(query: &str) {
    log::trace!(target: URL, "replaceState ?{query}");
}

pub fn log_tab_opened(url: &str) {
    log::debug!(target: URL, "open tab {url}");
}

pub fn log_chart_rebuild(build: u64, points: usize, secondary: bool) {
    log::debug!(
        target: CHART,
        "chart build #{build}: {points} points, secondary axis={secondary}"
    );
}

pub fn log_settings_fallback(detail: impl AsRef<str>) {
    log::warn!(target: SETTINGS, "{}", detail.as_ref());
}
