pub mod event;
pub mod reducer;
pub mod render;
pub mod state;

pub use event::*;
pub use reducer::{Effect, FetchJob};
pub use state::*;

use std::collections::VecDeque;

use crate::api::{FactorsApi, Transport};
use crate::chart::ChartWidget;
use crate::hooks;
use crate::query::{self, FormInputs, PanelKind, UrlState};
use crate::table::TableView;

use render::Presented;

/// The page surfaces the controller reads and writes. Everything here is
/// synchronous; network I/O goes through [`Transport`].
pub trait Host: ChartWidget {
    fn read_form(&self) -> FormInputs;
    fn write_form(&mut self, inputs: &FormInputs);

    /// Current query string, with or without the leading `?`.
    fn location_query(&self) -> String;
    /// Replaces the query string without a history entry or navigation.
    fn replace_location_query(&mut self, query: &str);

    fn open_tab(&mut self, url: &str);

    fn set_status(&mut self, status: &StatusLine);
    fn set_panel_visible(&mut self, panel: PanelKind, visible: bool);
    fn show_table(&mut self, view: &TableView);
}

pub struct AppRuntime<H: Host, T: Transport> {
    pub state: AppState,
    host: H,
    api: FactorsApi<T>,
    shown: Presented<H>,
}

impl<H: Host, T: Transport> AppRuntime<H, T> {
    pub fn new(state: AppState, host: H, api: FactorsApi<T>) -> Self {
        Self {
            state,
            host,
            api,
            shown: Presented::default(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn api(&self) -> &FactorsApi<T> {
        &self.api
    }

    pub fn chart_builds(&self) -> u64 {
        self.shown.chart_builds()
    }

    /// Reduces one event, applies its immediate effects, renders, and hands
    /// back the fetches the caller must run.
    pub fn dispatch(&mut self, ev: AppEvent) -> Vec<FetchJob> {
        let effects = reducer::reduce(&mut self.state, ev);
        let mut jobs = Vec::new();
        for effect in effects {
            match effect {
                Effect::ReplaceUrl(patch) => {
                    let current = self.host.location_query();
                    let current = current.strip_prefix('?').unwrap_or(&current);
                    let next = query::apply_patch(current, &patch);
                    if next != current {
                        hooks::log_url_replaced(&next);
                        self.host.replace_location_query(&next);
                    }
                }
                Effect::OpenTab(url) => {
                    hooks::log_tab_opened(&url);
                    self.host.open_tab(&url);
                }
                Effect::Fetch(job) => jobs.push(job),
            }
        }
        render::render(&self.state, &mut self.host, &mut self.shown);
        jobs
    }

    /// Runs an Action against the current form values.
    pub fn trigger(&mut self, action: ActionKind) -> Vec<FetchJob> {
        let inputs = self.host.read_form();
        self.dispatch(AppEvent::Ui(UiEvent::Action {
            action,
            inputs,
            origin: Origin::User,
        }))
    }

    pub fn key_down(&mut self, key: &str) -> Vec<FetchJob> {
        let inputs = self.host.read_form();
        self.dispatch(AppEvent::Ui(UiEvent::KeyDown {
            key: key.to_string(),
            inputs,
        }))
    }

    pub fn hide_panel(&mut self, panel: PanelKind) {
        self.dispatch(AppEvent::Ui(UiEvent::HidePanel { panel }));
    }

    /// Page load: fill the form from the URL, replay the panel it names (failures
    /// stay silent), then report ready.
    pub fn hydrate(&mut self) -> Vec<FetchJob> {
        let url = UrlState::parse(&self.host.location_query());
        let inputs = url.prefill(&self.host.read_form());
        self.host.write_form(&inputs);

        let mut jobs = Vec::new();
        if let Some(panel) = url.panel() {
            let action = match panel {
                PanelKind::Chart => ActionKind::ShowChart,
                PanelKind::Table => ActionKind::ShowTable,
            };
            jobs = self.dispatch(AppEvent::Ui(UiEvent::Action {
                action,
                inputs,
                origin: Origin::Replay,
            }));
        }
        jobs.extend(self.dispatch(AppEvent::Ready));
        jobs
    }

    /// Runs one fetch to completion and feeds the result back.
    pub async fn complete(&mut self, job: FetchJob) -> Vec<FetchJob> {
        let ev = run_fetch(&self.api, job).await;
        self.dispatch(ev)
    }

    /// Runs fetches one after another until none are left.
    pub async fn settle(&mut self, jobs: Vec<FetchJob>) {
        let mut queue: VecDeque<FetchJob> = jobs.into();
        while let Some(job) = queue.pop_front() {
            let more = self.complete(job).await;
            queue.extend(more);
        }
    }
}

/// Performs the request for `job`; usable without borrowing the runtime.
pub async fn run_fetch<T: Transport>(api: &FactorsApi<T>, job: FetchJob) -> AppEvent {
    let result = api.fetch_factors(&job.query).await;
    AppEvent::FactorsLoaded {
        token: job.token,
        result,
    }
}
