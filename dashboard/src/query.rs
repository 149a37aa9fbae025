//! Canonical query state and its two surfaces: form inputs and the URL query string.
//!
//! The URL is a cache of the last validated state. It is only treated as a source
//! of truth during hydration on page load.

use url::form_urlencoded;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelKind {
    Chart,
    Table,
}

impl PanelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PanelKind::Chart => "chart",
            PanelKind::Table => "table",
        }
    }

    /// Only the exact values `chart` and `table` name a panel.
    pub fn from_param(s: &str) -> Option<Self> {
        match s {
            "chart" => Some(PanelKind::Chart),
            "table" => Some(PanelKind::Table),
            _ => None,
        }
    }
}

/// Raw values as they sit in the form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormInputs {
    pub ticker: String,
    pub start: String,
    pub end: String,
}

impl FormInputs {
    pub fn new(ticker: impl Into<String>, start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            start: start.into(),
            end: end.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryState {
    pub ticker: String,
    pub start: String,
    pub end: String,
    pub panel: Option<PanelKind>,
}

impl QueryState {
    /// Trims every field and uppercases the ticker. `panel` is left unset: it is
    /// decided by the Action, not read from the form.
    pub fn from_inputs(inputs: &FormInputs) -> Self {
        Self {
            ticker: inputs.ticker.trim().to_uppercase(),
            start: inputs.start.trim().to_string(),
            end: inputs.end.trim().to_string(),
            panel: None,
        }
    }

    pub fn with_panel(mut self, panel: Option<PanelKind>) -> Self {
        self.panel = panel;
        self
    }
}

/// A partial write to the URL. `None` leaves the key untouched; `Some("")`
/// removes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlPatch {
    pub ticker: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub panel: Option<String>,
}

impl UrlPatch {
    /// Full view state: ticker, range and panel (cleared when `panel` is `None`).
    pub fn view(query: &QueryState, panel: Option<PanelKind>) -> Self {
        Self {
            ticker: Some(query.ticker.clone()),
            start: Some(query.start.clone()),
            end: Some(query.end.clone()),
            panel: Some(panel.map(|p| p.as_str()).unwrap_or_default().to_string()),
        }
    }

    /// Ticker only, panel cleared; start/end stay as they are.
    pub fn ticker_only(ticker: &str) -> Self {
        Self {
            ticker: Some(ticker.to_string()),
            start: None,
            end: None,
            panel: Some(String::new()),
        }
    }

    fn entries(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("ticker", self.ticker.as_deref()),
            ("start", self.start.as_deref()),
            ("end", self.end.as_deref()),
            ("panel", self.panel.as_deref()),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k, v)))
    }
}

/// Applies `patch` to a query string (with or without the leading `?`) and
/// returns the new query string without `?`.
///
/// Setting a key replaces its first occurrence in place and drops any
/// duplicates; a key that was absent is appended. Empty values remove the key.
pub fn apply_patch(query: &str, patch: &UrlPatch) -> String {
    let mut pairs: Vec<(String, String)> = parse_pairs(query);

    for (key, value) in patch.entries() {
        if value.is_empty() {
            pairs.retain(|(k, _)| k != key);
            continue;
        }
        match pairs.iter().position(|(k, _)| k == key) {
            Some(first) => {
                pairs[first].1 = value.to_string();
                let mut idx = 0;
                pairs.retain(|(k, _)| {
                    let keep = k != key || idx == first;
                    idx += 1;
                    keep
                });
            }
            None => pairs.push((key.to_string(), value.to_string())),
        }
    }

    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter())
        .finish()
}

/// What the URL says at page load. Empty strings mean the key was absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlState {
    pub ticker: String,
    pub start: String,
    pub end: String,
    pub panel: String,
}

impl UrlState {
    pub fn parse(query: &str) -> Self {
        let mut out = UrlState::default();
        for (k, v) in parse_pairs(query) {
            let slot = match k.as_str() {
                "ticker" => &mut out.ticker,
                "start" => &mut out.start,
                "end" => &mut out.end,
                "panel" => &mut out.panel,
                _ => continue,
            };
            // first occurrence wins, like URLSearchParams::get
            if slot.is_empty() {
                *slot = v;
            }
        }
        out
    }

    pub fn panel(&self) -> Option<PanelKind> {
        PanelKind::from_param(&self.panel)
    }

    /// Overlays present URL values onto the current form values.
    pub fn prefill(&self, current: &FormInputs) -> FormInputs {
        let pick = |url: &str, form: &str| {
            if url.is_empty() {
                form.to_string()
            } else {
                url.to_string()
            }
        };
        FormInputs {
            ticker: pick(&self.ticker.to_uppercase(), &current.ticker),
            start: pick(&self.start, &current.start),
            end: pick(&self.end, &current.end),
        }
    }
}

fn parse_pairs(query: &str) -> Vec<(String, String)> {
    let query = query.strip_prefix('?').unwrap_or(query);
    form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}
