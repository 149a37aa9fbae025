#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;
use quantmini_dashboard::api::{FactorsApi, HttpResponse, Transport};
use quantmini_dashboard::app::{AppRuntime, AppState, Host, StatusLine};
use quantmini_dashboard::chart::{ChartInstance, ChartSpec, ChartWidget};
use quantmini_dashboard::format::TimeMode;
use quantmini_dashboard::query::{FormInputs, PanelKind};
use quantmini_dashboard::table::TableView;
use quantmini_dashboard::{DashboardSettings, FetchError};

pub const BASE: &str = "http://dash.test";

pub type TestRuntime = AppRuntime<MemoryHost, ScriptedTransport>;

/// Page stand-in: plain fields for every surface, plus a chart lifecycle log.
#[derive(Default)]
pub struct MemoryHost {
    pub form: FormInputs,
    pub query: String,
    pub url_writes: usize,
    pub opened: Vec<String>,
    pub status: StatusLine,
    pub chart_visible: bool,
    pub table_visible: bool,
    pub table: Option<TableView>,
    pub last_chart: Option<ChartSpec>,
    pub chart_log: Rc<RefCell<Vec<String>>>,
    next_chart: u32,
}

impl MemoryHost {
    pub fn with_form(ticker: &str, start: &str, end: &str) -> Self {
        Self {
            form: FormInputs::new(ticker, start, end),
            ..Self::default()
        }
    }

    pub fn with_query(mut self, query: &str) -> Self {
        self.query = query.to_string();
        self
    }

    pub fn chart_events(&self) -> Vec<String> {
        self.chart_log.borrow().clone()
    }
}

pub struct MemoryChart {
    id: u32,
    log: Rc<RefCell<Vec<String>>>,
}

impl ChartInstance for MemoryChart {
    fn destroy(&mut self) {
        self.log.borrow_mut().push(format!("destroy {}", self.id));
    }
}

impl ChartWidget for MemoryHost {
    type Instance = MemoryChart;

    fn build_chart(&mut self, spec: &ChartSpec) -> MemoryChart {
        self.next_chart += 1;
        self.chart_log
            .borrow_mut()
            .push(format!("build {}", self.next_chart));
        self.last_chart = Some(spec.clone());
        MemoryChart {
            id: self.next_chart,
            log: self.chart_log.clone(),
        }
    }
}

impl Host for MemoryHost {
    fn read_form(&self) -> FormInputs {
        self.form.clone()
    }

    fn write_form(&mut self, inputs: &FormInputs) {
        self.form = inputs.clone();
    }

    fn location_query(&self) -> String {
        if self.query.is_empty() {
            String::new()
        } else {
            format!("?{}", self.query)
        }
    }

    fn replace_location_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.url_writes += 1;
    }

    fn open_tab(&mut self, url: &str) {
        self.opened.push(url.to_string());
    }

    fn set_status(&mut self, status: &StatusLine) {
        self.status = status.clone();
    }

    fn set_panel_visible(&mut self, panel: PanelKind, visible: bool) {
        match panel {
            PanelKind::Chart => self.chart_visible = visible,
            PanelKind::Table => self.table_visible = visible,
        }
    }

    fn show_table(&mut self, view: &TableView) {
        self.table = Some(view.clone());
    }
}

/// Canned responses by exact URL; anything else is a 404.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: HashMap<String, HttpResponse>,
    requests: RefCell<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, url: &str, status: u16, body: &str) -> Self {
        self.routes.insert(
            url.to_string(),
            HttpResponse {
                status,
                body: body.to_string(),
            },
        );
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

#[async_trait(?Send)]
impl Transport for ScriptedTransport {
    async fn get_json(&self, url: &str) -> Result<HttpResponse, FetchError> {
        self.requests.borrow_mut().push(url.to_string());
        Ok(self.routes.get(url).cloned().unwrap_or(HttpResponse {
            status: 404,
            body: "not found".to_string(),
        }))
    }
}

pub fn runtime(host: MemoryHost, transport: ScriptedTransport) -> TestRuntime {
    let settings = DashboardSettings {
        api_base: BASE.to_string(),
        time_mode: TimeMode::Utc,
        ..DashboardSettings::default()
    };
    AppRuntime::new(
        AppState::from_settings(&settings),
        host,
        FactorsApi::new(transport, BASE),
    )
}

pub fn factors_url(ticker: &str, start: &str, end: &str) -> String {
    format!("{BASE}/api/factors/{ticker}?start={start}&end={end}&as=series")
}

pub fn rows_body(n: usize) -> String {
    let rows: Vec<String> = (0..n)
        .map(|i| {
            format!(
                r#"{{"t": "2024-01-{:02}T00:00:00Z", "close": {}, "cum_return": {}, "sector": "tech"}}"#,
                i + 2,
                180.5 + i as f64,
                0.01 * i as f64
            )
        })
        .collect();
    format!(r#"{{"data": [{}]}}"#, rows.join(","))
}
