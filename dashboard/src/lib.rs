//! Price/factor dashboard controller.
//!
//! Reads a ticker and date range from the page, keeps the URL query in sync
//! with the view, fetches factor series and renders them as a line chart or a
//! table. The page itself sits behind [`app::Host`], the network behind
//! [`api::Transport`].

pub mod api;
pub mod app;
pub mod chart;
pub mod error;
pub mod format;
pub mod hooks;
pub mod query;
pub mod settings;
pub mod table;
pub mod validate;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use api::{FactorsApi, Record, ReqwestTransport, Transport};
pub use app::{AppRuntime, Host};
pub use error::{DashboardError, FetchError, RenderError, ValidationError};
pub use query::{PanelKind, QueryState};
pub use settings::DashboardSettings;
