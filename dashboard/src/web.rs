//! Browser host: DOM form and panels, `history.replaceState`, `window.open`
//! and a canvas line chart.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{anyhow, Result};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    CanvasRenderingContext2d, Document, Element, Event, EventTarget, HtmlCanvasElement,
    HtmlElement, HtmlInputElement, KeyboardEvent, MouseEvent, Window,
};

use crate::api::{FactorsApi, ReqwestTransport};
use crate::app::{run_fetch, ActionKind, AppRuntime, AppState, FetchJob, Host, StatusLine};
use crate::chart::{Axis, ChartInstance, ChartSpec, ChartWidget};
use crate::format::format_number;
use crate::query::{FormInputs, PanelKind};
use crate::settings::DashboardSettings;
use crate::table::TableView;

const HIDDEN_CLASS: &str = "hidden";
const INFO_COLOR: &str = "#9aa4b2";
const ERROR_COLOR: &str = "#fca5a5";
const SERIES_COLORS: [&str; 2] = ["#60a5fa", "#f59e0b"];
const LABEL_COLOR: &str = "#9aa4b2";

type Runtime = AppRuntime<WebHost, ReqwestTransport>;

fn js_err(e: JsValue) -> anyhow::Error {
    anyhow!("{e:?}")
}

fn by_id<T: JsCast>(doc: &Document, id: &str) -> Result<T> {
    doc.get_element_by_id(id)
        .ok_or_else(|| anyhow!("missing #{id}"))?
        .dyn_into::<T>()
        .map_err(|_| anyhow!("#{id} has an unexpected element type"))
}

struct Elements {
    ticker: HtmlInputElement,
    start: HtmlInputElement,
    end: HtmlInputElement,
    status: HtmlElement,
    chart_panel: Element,
    table_panel: Element,
    table: Element,
    canvas: HtmlCanvasElement,
}

pub struct WebHost {
    window: Window,
    document: Document,
    els: Elements,
}

impl WebHost {
    pub fn new(window: Window, document: Document) -> Result<Self> {
        let els = Elements {
            ticker: by_id(&document, "ticker")?,
            start: by_id(&document, "start")?,
            end: by_id(&document, "end")?,
            status: by_id(&document, "status")?,
            chart_panel: by_id(&document, "chart-panel")?,
            table_panel: by_id(&document, "table-panel")?,
            table: by_id(&document, "factors-table")?,
            canvas: by_id(&document, "priceChart")?,
        };
        Ok(Self {
            window,
            document,
            els,
        })
    }

    fn fill_table(&self, view: &TableView) -> Result<(), JsValue> {
        let section = |sel: &str| -> Result<Element, JsValue> {
            self.els
                .table
                .query_selector(sel)?
                .ok_or_else(|| JsValue::from_str(&format!("table has no {sel}")))
        };
        let thead = section("thead")?;
        let tbody = section("tbody")?;
        thead.set_inner_html("");
        tbody.set_inner_html("");

        let header = self.document.create_element("tr")?;
        for col in &view.columns {
            let th = self.document.create_element("th")?;
            th.set_text_content(Some(col));
            header.append_child(&th)?;
        }
        thead.append_child(&header)?;

        for row in &view.rows {
            let tr = self.document.create_element("tr")?;
            for cell in row {
                let td = self.document.create_element("td")?;
                td.set_text_content(Some(cell));
                tr.append_child(&td)?;
            }
            tbody.append_child(&tr)?;
        }
        Ok(())
    }
}

impl Host for WebHost {
    fn read_form(&self) -> FormInputs {
        FormInputs::new(self.els.ticker.value(), self.els.start.value(), self.els.end.value())
    }

    fn write_form(&mut self, inputs: &FormInputs) {
        self.els.ticker.set_value(&inputs.ticker);
        self.els.start.set_value(&inputs.start);
        self.els.end.set_value(&inputs.end);
    }

    fn location_query(&self) -> String {
        self.window.location().search().unwrap_or_default()
    }

    fn replace_location_query(&mut self, query: &str) {
        let loc = self.window.location();
        let path = loc.pathname().unwrap_or_default();
        let hash = loc.hash().unwrap_or_default();
        let url = if query.is_empty() {
            format!("{path}{hash}")
        } else {
            format!("{path}?{query}{hash}")
        };
        let replaced = self
            .window
            .history()
            .and_then(|h| h.replace_state_with_url(&JsValue::NULL, "", Some(&url)));
        if let Err(e) = replaced {
            log::warn!(target: "dashboard.url", "replaceState failed: {e:?}");
        }
    }

    fn open_tab(&mut self, url: &str) {
        if let Err(e) = self
            .window
            .open_with_url_and_target_and_features(url, "_blank", "noopener")
        {
            log::warn!(target: "dashboard.url", "window.open failed: {e:?}");
        }
    }

    fn set_status(&mut self, status: &StatusLine) {
        self.els.status.set_text_content(Some(&status.text));
        let color = if status.is_error() { ERROR_COLOR } else { INFO_COLOR };
        let _ = self.els.status.style().set_property("color", color);
    }

    fn set_panel_visible(&mut self, panel: PanelKind, visible: bool) {
        let el = match panel {
            PanelKind::Chart => &self.els.chart_panel,
            PanelKind::Table => &self.els.table_panel,
        };
        let classes = el.class_list();
        let toggled = if visible {
            classes.remove_1(HIDDEN_CLASS)
        } else {
            classes.add_1(HIDDEN_CLASS)
        };
        if let Err(e) = toggled {
            log::warn!(target: "dashboard.ui", "panel toggle failed: {e:?}");
        }
    }

    fn show_table(&mut self, view: &TableView) {
        if let Err(e) = self.fill_table(view) {
            log::warn!(target: "dashboard.ui", "table render failed: {e:?}");
        }
    }
}

impl ChartWidget for WebHost {
    type Instance = CanvasChart;

    fn build_chart(&mut self, spec: &ChartSpec) -> CanvasChart {
        CanvasChart::draw(self.els.canvas.clone(), spec)
    }
}

/// A painted chart plus its hover listener; destroy clears both.
pub struct CanvasChart {
    canvas: HtmlCanvasElement,
    ctx: Option<CanvasRenderingContext2d>,
    hover: Option<Closure<dyn FnMut(Event)>>,
}

struct Frame {
    width: f64,
    height: f64,
    left: f64,
    top: f64,
    plot_w: f64,
    plot_h: f64,
}

impl Frame {
    fn x_at(&self, i: usize, n: usize) -> f64 {
        if n <= 1 {
            self.left + self.plot_w / 2.0
        } else {
            self.left + self.plot_w * i as f64 / (n - 1) as f64
        }
    }

    fn index_at(&self, x: f64, n: usize) -> Option<usize> {
        if n == 0 || x < self.left || x > self.left + self.plot_w {
            return None;
        }
        if n == 1 {
            return Some(0);
        }
        let frac = (x - self.left) / self.plot_w;
        Some(((frac * (n - 1) as f64).round() as usize).min(n - 1))
    }
}

fn value_range(points: &[Option<f64>]) -> Option<(f64, f64)> {
    let mut it = points.iter().flatten();
    let first = *it.next()?;
    let (lo, hi) = it.fold((first, first), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    if hi > lo {
        Some((lo, hi))
    } else {
        Some((lo - 1.0, hi + 1.0))
    }
}

impl CanvasChart {
    fn draw(canvas: HtmlCanvasElement, spec: &ChartSpec) -> Self {
        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok());

        let width = f64::from(canvas.client_width().max(320));
        let height = f64::from(canvas.client_height().max(200));
        canvas.set_width(width as u32);
        canvas.set_height(height as u32);

        let right = if spec.has_secondary_axis() { 64.0 } else { 16.0 };
        let frame = Frame {
            width,
            height,
            left: 64.0,
            top: 28.0,
            plot_w: (width - 64.0 - right).max(1.0),
            plot_h: (height - 28.0 - 28.0).max(1.0),
        };

        if let Some(ctx) = &ctx {
            paint(ctx, &frame, spec);
        }

        let hover = install_hover(&canvas, frame, spec.clone());
        Self { canvas, ctx, hover }
    }
}

fn paint(ctx: &CanvasRenderingContext2d, frame: &Frame, spec: &ChartSpec) {
    ctx.clear_rect(0.0, 0.0, frame.width, frame.height);
    ctx.set_font("12px sans-serif");
    let n = spec.labels.len();

    for (idx, series) in spec.series.iter().enumerate() {
        let Some((lo, hi)) = value_range(&series.points) else {
            continue;
        };
        let color = SERIES_COLORS[idx % SERIES_COLORS.len()];
        let y_at = |v: f64| frame.top + frame.plot_h * (hi - v) / (hi - lo);

        ctx.set_stroke_style_str(color);
        ctx.set_line_width(2.0);
        ctx.begin_path();
        let mut pen_down = false;
        for (i, p) in series.points.iter().enumerate() {
            match p {
                Some(v) if pen_down => ctx.line_to(frame.x_at(i, n), y_at(*v)),
                Some(v) => {
                    ctx.move_to(frame.x_at(i, n), y_at(*v));
                    pen_down = true;
                }
                None => pen_down = false,
            }
        }
        ctx.stroke();

        let gutter_x = match series.axis {
            Axis::Left => 4.0,
            Axis::Right => frame.left + frame.plot_w + 4.0,
        };
        ctx.set_fill_style_str(color);
        let _ = ctx.fill_text(&format_number(hi), gutter_x, frame.top + 10.0);
        let _ = ctx.fill_text(&format_number(lo), gutter_x, frame.top + frame.plot_h);
        let _ = ctx.fill_text(&series.label, frame.left + 8.0 + idx as f64 * 120.0, frame.top + 14.0);
    }

    ctx.set_fill_style_str(LABEL_COLOR);
    for axis in &spec.axes {
        let x = match axis.axis {
            Axis::Left => 4.0,
            Axis::Right => frame.left + frame.plot_w + 4.0,
        };
        let _ = ctx.fill_text(&axis.title, x, 14.0);
    }
    if let (Some(first), Some(last)) = (spec.labels.first(), spec.labels.last()) {
        let y = frame.height - 8.0;
        let _ = ctx.fill_text(first, frame.left, y);
        let _ = ctx.fill_text(last, (frame.left + frame.plot_w - 100.0).max(frame.left), y);
    }
}

fn install_hover(
    canvas: &HtmlCanvasElement,
    frame: Frame,
    spec: ChartSpec,
) -> Option<Closure<dyn FnMut(Event)>> {
    let target = canvas.clone();
    let hover = Closure::<dyn FnMut(Event)>::new(move |e: Event| {
        let Some(mouse) = e.dyn_ref::<MouseEvent>() else {
            return;
        };
        let n = spec.labels.len();
        let Some(i) = frame.index_at(f64::from(mouse.offset_x()), n) else {
            return;
        };
        let mut tip = spec.tooltip_title(i).to_string();
        for s in &spec.series {
            let value = s.points[i].map(format_number).unwrap_or_default();
            tip.push_str(&format!("\n{}: {}", s.label, value));
        }
        let _ = target.set_attribute("title", &tip);
    });
    canvas
        .add_event_listener_with_callback("mousemove", hover.as_ref().unchecked_ref())
        .map_err(|e| log::warn!(target: "dashboard.chart", "hover listener failed: {e:?}"))
        .ok()?;
    Some(hover)
}

impl ChartInstance for CanvasChart {
    fn destroy(&mut self) {
        if let Some(hover) = self.hover.take() {
            let _ = self
                .canvas
                .remove_event_listener_with_callback("mousemove", hover.as_ref().unchecked_ref());
        }
        let _ = self.canvas.remove_attribute("title");
        if let Some(ctx) = self.ctx.take() {
            let (w, h) = (f64::from(self.canvas.width()), f64::from(self.canvas.height()));
            ctx.clear_rect(0.0, 0.0, w, h);
        }
    }
}

fn spawn_jobs(rt: &Rc<RefCell<Runtime>>, jobs: Vec<FetchJob>) {
    for job in jobs {
        let api = rt.borrow().api().clone();
        let rt = rt.clone();
        spawn_local(async move {
            let ev = run_fetch(&api, job).await;
            let more = rt.borrow_mut().dispatch(ev);
            spawn_jobs(&rt, more);
        });
    }
}

fn listen(target: &EventTarget, kind: &str, mut f: impl FnMut(Event) + 'static) -> Result<()> {
    let closure = Closure::<dyn FnMut(Event)>::new(move |e: Event| f(e));
    target
        .add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())
        .map_err(js_err)?;
    // page-lifetime listener
    closure.forget();
    Ok(())
}

fn panel_for_selector(sel: &str) -> Option<PanelKind> {
    match sel.trim() {
        "#chart-panel" => Some(PanelKind::Chart),
        "#table-panel" => Some(PanelKind::Table),
        _ => None,
    }
}

fn wire(rt: &Rc<RefCell<Runtime>>, document: &Document) -> Result<()> {
    let buttons = [
        ("btn-raw-prices", ActionKind::OpenRawPrices),
        ("btn-factors-api", ActionKind::OpenFactorsJson),
        ("btn-show-chart", ActionKind::ShowChart),
        ("btn-show-table", ActionKind::ShowTable),
    ];
    for (id, action) in buttons {
        let el: Element = by_id(document, id)?;
        let rt = rt.clone();
        listen(&el, "click", move |_| {
            let jobs = rt.borrow_mut().trigger(action);
            spawn_jobs(&rt, jobs);
        })?;
    }

    for id in ["ticker", "start", "end"] {
        let el: Element = by_id(document, id)?;
        let rt = rt.clone();
        listen(&el, "keydown", move |e| {
            let Some(key) = e.dyn_ref::<KeyboardEvent>().map(KeyboardEvent::key) else {
                return;
            };
            let jobs = rt.borrow_mut().key_down(&key);
            spawn_jobs(&rt, jobs);
        })?;
    }

    let collapsers = document
        .query_selector_all("#chart-panel [data-collapse], #table-panel [data-collapse]")
        .map_err(js_err)?;
    for i in 0..collapsers.length() {
        let Some(el) = collapsers.get(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
            continue;
        };
        let Some(panel) = el
            .get_attribute("data-collapse")
            .as_deref()
            .and_then(panel_for_selector)
        else {
            continue;
        };
        let rt = rt.clone();
        listen(&el, "click", move |_| rt.borrow_mut().hide_panel(panel))?;
    }
    Ok(())
}

fn boot(settings_toml: Option<&str>) -> Result<()> {
    let settings = match settings_toml {
        Some(text) => DashboardSettings::from_toml_str(text)?,
        None => DashboardSettings::default(),
    };
    let level = settings.level_filter().to_level().unwrap_or(log::Level::Info);
    if console_log::init_with_level(level).is_err() {
        log::debug!(target: "dashboard.settings", "logger already installed");
    }

    let window = web_sys::window().ok_or_else(|| anyhow!("no window"))?;
    let document = window.document().ok_or_else(|| anyhow!("no document"))?;
    let origin = window.location().origin().map_err(js_err)?;

    let mut resolved = settings.clone();
    resolved.api_base = settings.api_base_or(&origin);

    let host = WebHost::new(window, document.clone())?;
    let api = FactorsApi::new(ReqwestTransport::default(), resolved.api_base.clone())
        .with_excerpt_chars(resolved.excerpt_chars);
    let rt = Rc::new(RefCell::new(AppRuntime::new(
        AppState::from_settings(&resolved),
        host,
        api,
    )));

    wire(&rt, &document)?;
    let jobs = rt.borrow_mut().hydrate();
    spawn_jobs(&rt, jobs);
    log::info!(target: "dashboard.action", "dashboard ready (api base {})", resolved.api_base);
    Ok(())
}

/// Entry point, called once the DOM is loaded. `settings_toml` is optional
/// [`DashboardSettings`] text.
#[wasm_bindgen]
pub fn start(settings_toml: Option<String>) -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    boot(settings_toml.as_deref()).map_err(|e| JsValue::from_str(&format!("{e:#}")))
}
