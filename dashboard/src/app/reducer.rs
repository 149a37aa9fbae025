use crate::api::{self, Record};
use crate::chart::build_chart_spec;
use crate::error::{DashboardError, FetchError};
use crate::hooks;
use crate::query::{PanelKind, QueryState, UrlPatch};
use crate::table::render_table;
use crate::validate::validate;

use super::event::*;
use super::state::*;

/// Side effects the runtime carries out after a reduction, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ReplaceUrl(UrlPatch),
    OpenTab(String),
    Fetch(FetchJob),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchJob {
    pub token: u64,
    pub query: QueryState,
}

pub fn reduce(state: &mut AppState, ev: AppEvent) -> Vec<Effect> {
    match ev {
        AppEvent::Ui(u) => reduce_ui(state, u),
        AppEvent::Ready => {
            state.status = StatusLine::info("Ready.");
            Vec::new()
        }
        AppEvent::FactorsLoaded { token, result } => reduce_loaded(state, token, result),
    }
}

fn reduce_ui(state: &mut AppState, ev: UiEvent) -> Vec<Effect> {
    match ev {
        UiEvent::Action { action, inputs, origin } => {
            begin_action(state, action, QueryState::from_inputs(&inputs), origin)
        }
        UiEvent::KeyDown { key, inputs } => {
            if key == "Enter" {
                begin_action(state, ActionKind::ShowChart, QueryState::from_inputs(&inputs), Origin::User)
            } else {
                Vec::new()
            }
        }
        UiEvent::HidePanel { panel } => {
            state.set_panel_visible(panel, false);
            Vec::new()
        }
    }
}

fn begin_action(
    state: &mut AppState,
    action: ActionKind,
    query: QueryState,
    origin: Origin,
) -> Vec<Effect> {
    hooks::log_action_start(action, origin);
    state.last_action = Some(action);
    state.phase = ActionPhase::Validating;

    if let Err(err) = validate(&query, action.requires_dates()) {
        fail(state, action, origin, err.into());
        return Vec::new();
    }

    match action {
        ActionKind::ShowChart | ActionKind::ShowTable => {
            let panel = action.panel();
            if origin == Origin::User {
                state.status = StatusLine::info(match action {
                    ActionKind::ShowChart => "Loading chart...",
                    _ => "Loading table...",
                });
            }
            let token = state.issue_token();
            hooks::log_fetch_issued(token, &query.ticker);
            if let Some(kind) = panel {
                // supersedes only this panel's pending fetch
                *state.in_flight.slot_mut(kind) = Some(InFlight { token, action, origin });
            }
            state.phase = ActionPhase::Fetching { token };

            let patch = UrlPatch::view(&query, panel);
            // panel moves only once the view has rendered
            state.query = query.clone().with_panel(state.query.panel);
            vec![Effect::ReplaceUrl(patch), Effect::Fetch(FetchJob { token, query })]
        }
        ActionKind::OpenRawPrices => {
            let url = api::endpoint(&state.api_base, &api::prices_path(&query.ticker));
            let patch = UrlPatch::ticker_only(&query.ticker);
            state.query = query.with_panel(None);
            state.phase = ActionPhase::Done;
            vec![Effect::ReplaceUrl(patch), Effect::OpenTab(url)]
        }
        ActionKind::OpenFactorsJson => {
            let url = api::endpoint(&state.api_base, &api::factors_path(&query));
            let patch = UrlPatch::view(&query, None);
            state.query = query.with_panel(None);
            state.phase = ActionPhase::Done;
            vec![Effect::ReplaceUrl(patch), Effect::OpenTab(url)]
        }
    }
}

fn reduce_loaded(
    state: &mut AppState,
    token: u64,
    result: Result<Vec<Record>, FetchError>,
) -> Vec<Effect> {
    // only the newest request for a panel may touch that panel
    let Some(flight) = state.in_flight.take(token) else {
        hooks::log_stale_response(token, state.latest_token);
        return Vec::new();
    };

    let records = match result {
        Ok(records) => records,
        Err(err) => {
            fail(state, flight.action, flight.origin, err.into());
            return Vec::new();
        }
    };

    state.phase = ActionPhase::Rendering;
    match flight.action {
        ActionKind::ShowChart => match build_chart_spec(&records, state.time_mode) {
            Ok(spec) => {
                state.chart = Some(spec);
                state.chart_generation += 1;
                state.chart_visible = true;
                state.query.panel = Some(PanelKind::Chart);
                state.status = StatusLine::info("Chart loaded.");
                state.phase = ActionPhase::Done;
                hooks::log_action_done(flight.action, format!("{} points", records.len()));
            }
            Err(err) => fail(state, flight.action, flight.origin, err.into()),
        },
        ActionKind::ShowTable => {
            state.table = Some(render_table(&records, state.time_mode));
            state.table_generation += 1;
            state.table_visible = true;
            state.query.panel = Some(PanelKind::Table);
            state.status = StatusLine::info(format!("Loaded {} rows.", records.len()));
            state.phase = ActionPhase::Done;
            hooks::log_action_done(flight.action, format!("{} rows", records.len()));
        }
        ActionKind::OpenRawPrices | ActionKind::OpenFactorsJson => {
            state.phase = ActionPhase::Done;
        }
    }
    Vec::new()
}

fn fail(state: &mut AppState, action: ActionKind, origin: Origin, err: DashboardError) {
    hooks::log_action_failed(action, origin, &err);
    let reason = err.to_string();
    if origin == Origin::User {
        state.status = StatusLine::error(reason.clone());
    }
    state.phase = ActionPhase::Failed { reason };
}
