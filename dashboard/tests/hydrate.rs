mod common;

use common::*;
use quantmini_dashboard::app::{ActionPhase, StatusLine};
use quantmini_dashboard::query::FormInputs;

#[tokio::test]
async fn reload_with_table_panel_replays_the_table() {
    let url = factors_url("MSFT", "2024-01-01", "2024-03-01");
    let transport = ScriptedTransport::new().respond(&url, 200, &rows_body(2));
    let host = MemoryHost::default()
        .with_query("panel=table&ticker=msft&start=2024-01-01&end=2024-03-01");
    let mut rt = runtime(host, transport);

    let jobs = rt.hydrate();
    assert_eq!(jobs.len(), 1);
    assert_eq!(rt.host().form, FormInputs::new("MSFT", "2024-01-01", "2024-03-01"));
    assert_eq!(rt.host().status, StatusLine::info("Ready."));

    rt.settle(jobs).await;
    assert!(rt.host().table_visible);
    assert!(!rt.host().chart_visible);
    assert_eq!(rt.host().status, StatusLine::info("Loaded 2 rows."));
    assert_eq!(rt.api().transport().requests(), [url]);
}

#[tokio::test]
async fn reload_with_chart_panel_builds_chart() {
    let url = factors_url("AAPL", "2024-01-01", "2024-01-31");
    let transport = ScriptedTransport::new().respond(&url, 200, &rows_body(4));
    let host = MemoryHost::default()
        .with_query("ticker=AAPL&start=2024-01-01&end=2024-01-31&panel=chart");
    let mut rt = runtime(host, transport);

    let jobs = rt.hydrate();
    rt.settle(jobs).await;
    assert!(rt.host().chart_visible);
    assert_eq!(rt.chart_builds(), 1);
    assert_eq!(rt.host().status, StatusLine::info("Chart loaded."));
}

#[tokio::test]
async fn replay_fetch_failure_stays_silent() {
    let url = factors_url("AAPL", "2024-01-01", "2024-01-31");
    let transport = ScriptedTransport::new().respond(&url, 500, "boom");
    let host = MemoryHost::default()
        .with_query("ticker=AAPL&start=2024-01-01&end=2024-01-31&panel=table");
    let mut rt = runtime(host, transport);

    let jobs = rt.hydrate();
    rt.settle(jobs).await;
    assert_eq!(rt.host().status, StatusLine::info("Ready."));
    assert!(!rt.host().table_visible);
    assert!(matches!(rt.state.phase, ActionPhase::Failed { .. }));
}

#[tokio::test]
async fn replay_with_missing_dates_issues_nothing() {
    let host = MemoryHost::default().with_query("ticker=AAPL&panel=chart");
    let mut rt = runtime(host, ScriptedTransport::new());

    let jobs = rt.hydrate();
    assert!(jobs.is_empty());
    assert_eq!(rt.host().form.ticker, "AAPL");
    assert_eq!(rt.host().status, StatusLine::info("Ready."));
    assert_eq!(rt.host().url_writes, 0);
    assert!(rt.api().transport().requests().is_empty());
}

#[tokio::test]
async fn reload_without_panel_only_prefills() {
    let host = MemoryHost::with_form("", "2023-12-01", "")
        .with_query("ticker=nvda&end=2024-02-01&panel=bogus");
    let mut rt = runtime(host, ScriptedTransport::new());

    let jobs = rt.hydrate();
    assert!(jobs.is_empty());
    assert_eq!(rt.host().form, FormInputs::new("NVDA", "2023-12-01", "2024-02-01"));
    assert_eq!(rt.host().status, StatusLine::info("Ready."));
    assert_eq!(rt.state.phase, ActionPhase::Idle);
}
