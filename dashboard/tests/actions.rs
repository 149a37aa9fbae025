mod common;

use common::*;
use quantmini_dashboard::app::{ActionKind, ActionPhase, StatusLine};
use quantmini_dashboard::query::{FormInputs, PanelKind};

#[tokio::test]
async fn show_chart_end_to_end() {
    let url = factors_url("AAPL", "2024-01-01", "2024-01-31");
    let transport = ScriptedTransport::new().respond(&url, 200, &rows_body(3));
    let mut rt = runtime(MemoryHost::with_form("aapl", "2024-01-01", "2024-01-31"), transport);

    let jobs = rt.trigger(ActionKind::ShowChart);
    assert_eq!(
        rt.host().query,
        "ticker=AAPL&start=2024-01-01&end=2024-01-31&panel=chart"
    );
    assert_eq!(rt.host().status, StatusLine::info("Loading chart..."));
    assert!(!rt.host().chart_visible);

    rt.settle(jobs).await;

    assert_eq!(rt.api().transport().requests(), [url]);
    assert!(rt.host().chart_visible);
    assert!(!rt.host().table_visible);
    assert_eq!(rt.host().status, StatusLine::info("Chart loaded."));
    assert_eq!(rt.chart_builds(), 1);

    let spec = rt.host().last_chart.clone().expect("chart built");
    assert_eq!(spec.labels, ["2024-01-02 00:00", "2024-01-03 00:00", "2024-01-04 00:00"]);
    assert!(spec.has_secondary_axis());
    assert_eq!(rt.state.phase, ActionPhase::Done);
}

#[tokio::test]
async fn show_table_end_to_end() {
    let url = factors_url("MSFT", "2024-01-01", "2024-03-01");
    let transport = ScriptedTransport::new().respond(&url, 200, &rows_body(2));
    let mut rt = runtime(MemoryHost::with_form("msft", "2024-01-01", "2024-03-01"), transport);

    let jobs = rt.trigger(ActionKind::ShowTable);
    assert_eq!(rt.host().status, StatusLine::info("Loading table..."));
    rt.settle(jobs).await;

    assert_eq!(rt.host().status, StatusLine::info("Loaded 2 rows."));
    assert!(rt.host().table_visible);
    let table = rt.host().table.clone().expect("table rendered");
    assert_eq!(table.columns, ["t", "close", "cum_return", "sector"]);
    assert_eq!(table.rows[1], ["2024-01-03 00:00", "181.5000", "0.010000", "tech"]);
    assert_eq!(
        rt.host().query,
        "ticker=MSFT&start=2024-01-01&end=2024-03-01&panel=table"
    );
}

#[tokio::test]
async fn validation_errors_skip_url_and_network() {
    let mut rt = runtime(
        MemoryHost::with_form("aapl", "2024-01-01", "").with_query("foo=bar"),
        ScriptedTransport::new(),
    );

    let jobs = rt.trigger(ActionKind::ShowChart);
    assert!(jobs.is_empty());
    assert_eq!(rt.host().status, StatusLine::error("end required"));
    assert_eq!(rt.host().query, "foo=bar");
    assert_eq!(rt.host().url_writes, 0);

    rt.host_mut().form = FormInputs::new("aapl", "2024-02-01", "2024-01-01");
    rt.trigger(ActionKind::ShowTable);
    assert_eq!(
        rt.host().status,
        StatusLine::error("start must be on or before end")
    );

    rt.host_mut().form = FormInputs::default();
    rt.trigger(ActionKind::OpenRawPrices);
    assert_eq!(rt.host().status, StatusLine::error("ticker required"));
    assert!(rt.api().transport().requests().is_empty());
    assert!(rt.host().opened.is_empty());
}

#[tokio::test]
async fn http_errors_show_status_and_excerpt() {
    let url = factors_url("AAPL", "2024-01-01", "2024-01-31");
    let body = format!("upstream exploded: {}", "!".repeat(400));
    let transport = ScriptedTransport::new().respond(&url, 500, &body);
    let mut rt = runtime(MemoryHost::with_form("AAPL", "2024-01-01", "2024-01-31"), transport);

    let jobs = rt.trigger(ActionKind::ShowTable);
    rt.settle(jobs).await;

    let status = rt.host().status.clone();
    assert!(status.is_error());
    assert!(status.text.starts_with("HTTP 500: upstream exploded: !!!"));
    assert_eq!(status.text.chars().count(), "HTTP 500: ".len() + 200);
    assert!(!rt.host().table_visible);
    assert!(rt.host().table.is_none());
}

#[tokio::test]
async fn unexpected_shape_is_reported() {
    let url = factors_url("AAPL", "2024-01-01", "2024-01-31");
    let transport = ScriptedTransport::new().respond(&url, 200, r#"{"rows": []}"#);
    let mut rt = runtime(MemoryHost::with_form("AAPL", "2024-01-01", "2024-01-31"), transport);

    let jobs = rt.trigger(ActionKind::ShowChart);
    rt.settle(jobs).await;
    assert_eq!(
        rt.host().status,
        StatusLine::error("Unexpected response shape from /api/factors.")
    );
    assert_eq!(rt.chart_builds(), 0);
}

#[tokio::test]
async fn empty_series_cannot_be_charted() {
    let url = factors_url("AAPL", "2024-01-01", "2024-01-31");
    let transport = ScriptedTransport::new().respond(&url, 200, "[]");
    let mut rt = runtime(MemoryHost::with_form("AAPL", "2024-01-01", "2024-01-31"), transport);

    let jobs = rt.trigger(ActionKind::ShowChart);
    rt.settle(jobs).await;
    assert_eq!(rt.host().status, StatusLine::error("No data to plot."));
    assert!(!rt.host().chart_visible);

    // the same empty payload is fine for the table
    let jobs = rt.trigger(ActionKind::ShowTable);
    rt.settle(jobs).await;
    assert_eq!(rt.host().status, StatusLine::info("Loaded 0 rows."));
    assert_eq!(rt.host().table.as_ref().map(|t| t.columns.clone()), Some(vec!["No data".to_string()]));
}

#[tokio::test]
async fn enter_key_runs_show_chart() {
    let url = factors_url("AAPL", "2024-01-01", "2024-01-31");
    let transport = ScriptedTransport::new().respond(&url, 200, &rows_body(1));
    let mut rt = runtime(MemoryHost::with_form("aapl", "2024-01-01", "2024-01-31"), transport);

    assert!(rt.key_down("a").is_empty());
    assert_eq!(rt.host().url_writes, 0);

    let jobs = rt.key_down("Enter");
    rt.settle(jobs).await;
    assert!(rt.host().chart_visible);
    assert!(rt.host().query.ends_with("panel=chart"));
}

#[tokio::test]
async fn raw_prices_opens_tab_without_dates() {
    let mut rt = runtime(
        MemoryHost::with_form(" msft ", "", "")
            .with_query("ticker=OLD&start=2024-01-01&end=2024-02-01&panel=chart"),
        ScriptedTransport::new(),
    );

    let jobs = rt.trigger(ActionKind::OpenRawPrices);
    assert!(jobs.is_empty());
    assert_eq!(rt.host().opened, [format!("{BASE}/api/prices/MSFT")]);
    assert_eq!(rt.host().query, "ticker=MSFT&start=2024-01-01&end=2024-02-01");
    assert!(rt.api().transport().requests().is_empty());
    assert_eq!(rt.state.query.panel, None);
}

#[tokio::test]
async fn factors_json_opens_tab_and_clears_panel() {
    let mut rt = runtime(
        MemoryHost::with_form("ibm", "2024-01-01", "2024-06-30").with_query("panel=table"),
        ScriptedTransport::new(),
    );

    rt.trigger(ActionKind::OpenFactorsJson);
    assert_eq!(
        rt.host().opened,
        [factors_url("IBM", "2024-01-01", "2024-06-30")]
    );
    assert_eq!(rt.host().query, "ticker=IBM&start=2024-01-01&end=2024-06-30");
    assert!(rt.api().transport().requests().is_empty());
}

#[tokio::test]
async fn repeated_action_leaves_url_unchanged() {
    let url = factors_url("AAPL", "2024-01-01", "2024-01-31");
    let transport = ScriptedTransport::new().respond(&url, 200, &rows_body(2));
    let mut rt = runtime(MemoryHost::with_form("aapl", "2024-01-01", "2024-01-31"), transport);

    let jobs = rt.trigger(ActionKind::ShowChart);
    rt.settle(jobs).await;
    let first = rt.host().query.clone();
    let jobs = rt.trigger(ActionKind::ShowChart);
    rt.settle(jobs).await;

    assert_eq!(rt.host().query, first);
    assert_eq!(rt.host().url_writes, 1);
}

#[tokio::test]
async fn rebuilding_chart_destroys_previous_first() {
    let url = factors_url("AAPL", "2024-01-01", "2024-01-31");
    let transport = ScriptedTransport::new().respond(&url, 200, &rows_body(2));
    let mut rt = runtime(MemoryHost::with_form("aapl", "2024-01-01", "2024-01-31"), transport);

    for _ in 0..3 {
        let jobs = rt.trigger(ActionKind::ShowChart);
        rt.settle(jobs).await;
    }
    assert_eq!(
        rt.host().chart_events(),
        ["build 1", "destroy 1", "build 2", "destroy 2", "build 3"]
    );
    assert_eq!(rt.chart_builds(), 3);
}

#[tokio::test]
async fn slower_earlier_request_cannot_overwrite_newer_view() {
    let aapl = factors_url("AAPL", "2024-01-01", "2024-01-31");
    let msft = factors_url("MSFT", "2024-01-01", "2024-01-31");
    let transport = ScriptedTransport::new()
        .respond(&aapl, 200, &rows_body(5))
        .respond(&msft, 200, &rows_body(2));
    let mut rt = runtime(MemoryHost::with_form("aapl", "2024-01-01", "2024-01-31"), transport);

    let mut first = rt.trigger(ActionKind::ShowChart);
    rt.host_mut().form.ticker = "msft".to_string();
    let mut second = rt.trigger(ActionKind::ShowChart);

    // newer response lands first, then the older one
    rt.complete(second.remove(0)).await;
    rt.complete(first.remove(0)).await;

    assert_eq!(rt.chart_builds(), 1);
    let spec = rt.host().last_chart.clone().expect("chart built");
    assert_eq!(spec.labels.len(), 2);
    assert_eq!(rt.host().status, StatusLine::info("Chart loaded."));
    assert!(rt.host().query.starts_with("ticker=MSFT"));
}

#[tokio::test]
async fn panels_are_independent_and_collapsible() {
    let url = factors_url("AAPL", "2024-01-01", "2024-01-31");
    let transport = ScriptedTransport::new().respond(&url, 200, &rows_body(2));
    let mut rt = runtime(MemoryHost::with_form("aapl", "2024-01-01", "2024-01-31"), transport);

    let jobs = rt.trigger(ActionKind::ShowChart);
    rt.settle(jobs).await;
    let jobs = rt.trigger(ActionKind::ShowTable);
    rt.settle(jobs).await;
    assert!(rt.host().chart_visible && rt.host().table_visible);

    let writes = rt.host().url_writes;
    rt.hide_panel(PanelKind::Chart);
    assert!(!rt.host().chart_visible);
    assert!(rt.host().table_visible);
    assert_eq!(rt.host().url_writes, writes);
    assert_eq!(rt.chart_builds(), 1);
}

#[tokio::test]
async fn table_then_chart_both_render() {
    let url = factors_url("AAPL", "2024-01-01", "2024-01-31");
    let transport = ScriptedTransport::new().respond(&url, 200, &rows_body(3));
    let mut rt = runtime(MemoryHost::with_form("aapl", "2024-01-01", "2024-01-31"), transport);

    let mut table = rt.trigger(ActionKind::ShowTable);
    let mut chart = rt.trigger(ActionKind::ShowChart);

    rt.complete(table.remove(0)).await;
    rt.complete(chart.remove(0)).await;

    assert!(rt.host().table_visible);
    assert!(rt.host().chart_visible);
    assert_eq!(rt.host().table.as_ref().map(|t| t.rows.len()), Some(3));
    assert_eq!(rt.chart_builds(), 1);
    assert_eq!(rt.host().status, StatusLine::info("Chart loaded."));
}

#[tokio::test]
async fn failed_chart_keeps_table_as_current_view() {
    let good = factors_url("AAPL", "2024-01-01", "2024-01-31");
    let bad = factors_url("MSFT", "2024-01-01", "2024-01-31");
    let transport = ScriptedTransport::new()
        .respond(&good, 200, &rows_body(2))
        .respond(&bad, 503, "maintenance");
    let mut rt = runtime(MemoryHost::with_form("aapl", "2024-01-01", "2024-01-31"), transport);

    let jobs = rt.trigger(ActionKind::ShowTable);
    rt.settle(jobs).await;
    rt.host_mut().form.ticker = "msft".to_string();
    let jobs = rt.trigger(ActionKind::ShowChart);
    rt.settle(jobs).await;

    assert_eq!(rt.host().status, StatusLine::error("HTTP 503: maintenance"));
    assert_eq!(rt.state.query.panel, Some(PanelKind::Table));
    assert!(!rt.host().chart_visible);
}
