use crate::chart::ChartSpec;
use crate::format::TimeMode;
use crate::query::{PanelKind, QueryState};
use crate::settings::DashboardSettings;
use crate::table::TableView;

use super::event::{ActionKind, Origin};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusLine {
    pub text: String,
    pub severity: Severity,
}

impl StatusLine {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Info,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Where the most recent Action is. `Done` and `Failed` are resting states:
/// the next Action leaves them through `Validating`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ActionPhase {
    #[default]
    Idle,
    Validating,
    Fetching { token: u64 },
    Rendering,
    Done,
    Failed { reason: String },
}

impl ActionPhase {
    pub fn is_idle(&self) -> bool {
        matches!(self, ActionPhase::Idle | ActionPhase::Done | ActionPhase::Failed { .. })
    }
}

/// The fetch a panel is waiting on. Older fetches for that panel are not
/// tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InFlight {
    pub token: u64,
    pub action: ActionKind,
    pub origin: Origin,
}

/// Newest fetch per panel. A response is current only if its token is the
/// one its panel waits on; the panels never invalidate each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PendingFetches {
    pub chart: Option<InFlight>,
    pub table: Option<InFlight>,
}

impl PendingFetches {
    pub fn slot_mut(&mut self, panel: PanelKind) -> &mut Option<InFlight> {
        match panel {
            PanelKind::Chart => &mut self.chart,
            PanelKind::Table => &mut self.table,
        }
    }

    pub fn get(&self, panel: PanelKind) -> Option<InFlight> {
        match panel {
            PanelKind::Chart => self.chart,
            PanelKind::Table => self.table,
        }
    }

    /// Removes and returns the pending fetch holding `token`, if any.
    pub fn take(&mut self, token: u64) -> Option<InFlight> {
        for slot in [&mut self.chart, &mut self.table] {
            if slot.is_some_and(|f| f.token == token) {
                return slot.take();
            }
        }
        None
    }

    pub fn is_empty(&self) -> bool {
        self.chart.is_none() && self.table.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub api_base: String,
    pub time_mode: TimeMode,

    pub status: StatusLine,
    pub phase: ActionPhase,
    pub last_action: Option<ActionKind>,

    /// Last validated query; `panel` is the last successfully rendered view,
    /// or `None` after a raw-JSON action.
    pub query: QueryState,

    pub chart_visible: bool,
    pub table_visible: bool,

    // rendered view models; generations bump on every new render
    pub chart: Option<ChartSpec>,
    pub chart_generation: u64,
    pub table: Option<TableView>,
    pub table_generation: u64,

    /// Last token issued, across both panels.
    pub latest_token: u64,
    pub in_flight: PendingFetches,
}

impl Default for AppState {
    fn default() -> Self {
        Self::from_settings(&DashboardSettings::default())
    }
}

impl AppState {
    pub fn from_settings(settings: &DashboardSettings) -> Self {
        Self {
            api_base: settings.api_base.clone(),
            time_mode: settings.time_mode,

            status: StatusLine::default(),
            phase: ActionPhase::Idle,
            last_action: None,

            query: QueryState::default(),

            chart_visible: false,
            table_visible: false,

            chart: None,
            chart_generation: 0,
            table: None,
            table_generation: 0,

            latest_token: 0,
            in_flight: PendingFetches::default(),
        }
    }

    pub fn issue_token(&mut self) -> u64 {
        self.latest_token += 1;
        self.latest_token
    }

    pub fn panel_visible(&self, panel: PanelKind) -> bool {
        match panel {
            PanelKind::Chart => self.chart_visible,
            PanelKind::Table => self.table_visible,
        }
    }

    pub fn set_panel_visible(&mut self, panel: PanelKind, visible: bool) {
        match panel {
            PanelKind::Chart => self.chart_visible = visible,
            PanelKind::Table => self.table_visible = visible,
        }
    }
}
