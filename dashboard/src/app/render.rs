use crate::chart::ChartSlot;
use crate::hooks;
use crate::query::PanelKind;

use super::state::AppState;
use super::Host;

/// What the host currently shows, so unchanged views are not rebuilt.
pub struct Presented<H: Host> {
    pub(crate) chart: ChartSlot<H::Instance>,
    chart_generation: u64,
    table_generation: u64,
}

impl<H: Host> Default for Presented<H> {
    fn default() -> Self {
        Self {
            chart: ChartSlot::new(),
            chart_generation: 0,
            table_generation: 0,
        }
    }
}

impl<H: Host> Presented<H> {
    pub fn chart_builds(&self) -> u64 {
        self.chart.builds()
    }
}

pub fn render<H: Host>(state: &AppState, host: &mut H, shown: &mut Presented<H>) {
    host.set_status(&state.status);

    if state.table_generation != shown.table_generation {
        if let Some(view) = &state.table {
            host.show_table(view);
        }
        shown.table_generation = state.table_generation;
    }

    if state.chart_generation != shown.chart_generation {
        if let Some(spec) = &state.chart {
            shown.chart.replace_with(|| host.build_chart(spec));
            hooks::log_chart_rebuild(
                shown.chart.builds(),
                spec.labels.len(),
                spec.has_secondary_axis(),
            );
        }
        shown.chart_generation = state.chart_generation;
    }

    // reveal after the content is in place
    for panel in [PanelKind::Chart, PanelKind::Table] {
        host.set_panel_visible(panel, state.panel_visible(panel));
    }
}
