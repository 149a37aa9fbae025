use crate::api::Record;
use crate::error::FetchError;
use crate::query::{FormInputs, PanelKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    ShowChart,
    ShowTable,
    OpenRawPrices,
    OpenFactorsJson,
}

impl ActionKind {
    /// The price link works with the server's default range; everything else
    /// needs both dates.
    pub fn requires_dates(&self) -> bool {
        !matches!(self, ActionKind::OpenRawPrices)
    }

    pub fn panel(&self) -> Option<PanelKind> {
        match self {
            ActionKind::ShowChart => Some(PanelKind::Chart),
            ActionKind::ShowTable => Some(PanelKind::Table),
            ActionKind::OpenRawPrices | ActionKind::OpenFactorsJson => None,
        }
    }
}

/// Who started an Action. Replays come from the URL at page load and never
/// surface errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    User,
    Replay,
}

#[derive(Debug, Clone)]
pub enum AppEvent {
    Ui(UiEvent),
    /// Page hydration finished.
    Ready,
    FactorsLoaded {
        token: u64,
        result: Result<Vec<Record>, FetchError>,
    },
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    Action {
        action: ActionKind,
        inputs: FormInputs,
        origin: Origin,
    },
    KeyDown {
        key: String,
        inputs: FormInputs,
    },
    HidePanel {
        panel: PanelKind,
    },
}
