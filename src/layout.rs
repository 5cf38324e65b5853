//! Dashboard layout configuration persisted per dataset.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetKind {
    KpiCards,
    RevenueLine,
    EbitdaWaterfall,
    OpexBreakdown,
    NoiTrend,
    CensusAdr,
    DetailTable,
}

impl WidgetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetKind::KpiCards => "kpi-cards",
            WidgetKind::RevenueLine => "revenue-line",
            WidgetKind::EbitdaWaterfall => "ebitda-waterfall",
            WidgetKind::OpexBreakdown => "opex-breakdown",
            WidgetKind::NoiTrend => "noi-trend",
            WidgetKind::CensusAdr => "census-adr",
            WidgetKind::DetailTable => "detail-table",
        }
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grid placement in dashboard units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WidgetLayout {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

fn default_visible() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WidgetConfig {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: WidgetKind,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default = "default_visible")]
    pub visible: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<WidgetLayout>,
}

impl WidgetConfig {
    pub fn new(id: &str, kind: WidgetKind, title: &str) -> Self {
        Self {
            id: id.to_string(),
            kind,
            title: title.to_string(),
            description: None,
            visible: true,
            layout: None,
        }
    }

    fn placed(kind: WidgetKind, title: &str, description: &str, layout: WidgetLayout) -> Self {
        Self {
            description: Some(description.to_string()),
            layout: Some(layout),
            ..Self::new(kind.as_str(), kind, title)
        }
    }
}

/// Partial update applied by [`LayoutConfig::update_widget`]; `None` leaves a
/// field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WidgetUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub visible: Option<bool>,
    pub layout: Option<WidgetLayout>,
}

impl WidgetUpdate {
    pub fn visibility(visible: bool) -> Self {
        Self {
            visible: Some(visible),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LayoutFilters {
    pub selected_periods: Vec<String>,
    pub compare_with: Option<String>,
    pub show_comparison: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LayoutConfig {
    pub dataset_id: String,
    pub widgets: Vec<WidgetConfig>,
    #[serde(default)]
    pub filters: LayoutFilters,
}

impl LayoutConfig {
    pub fn default_for(dataset_id: &str) -> Self {
        let at = |x, y, w, h| WidgetLayout { x, y, w, h };

        Self {
            dataset_id: dataset_id.to_string(),
            widgets: vec![
                WidgetConfig::placed(
                    WidgetKind::KpiCards,
                    "Key Performance Indicators",
                    "Revenue, EBITDA, NOI and other key metrics",
                    at(0, 0, 12, 4),
                ),
                WidgetConfig::placed(
                    WidgetKind::RevenueLine,
                    "Monthly Revenue Trend",
                    "Revenue over time with comparison",
                    at(0, 4, 8, 6),
                ),
                WidgetConfig::placed(
                    WidgetKind::EbitdaWaterfall,
                    "EBITDA Waterfall",
                    "Revenue breakdown to EBITDA",
                    at(8, 4, 4, 6),
                ),
                WidgetConfig::placed(
                    WidgetKind::OpexBreakdown,
                    "Operating Expenses",
                    "Labor vs non-labor expense breakdown",
                    at(0, 10, 6, 6),
                ),
                WidgetConfig::placed(
                    WidgetKind::NoiTrend,
                    "NOI Trend",
                    "Net Operating Income over time",
                    at(6, 10, 6, 6),
                ),
                WidgetConfig::placed(
                    WidgetKind::DetailTable,
                    "Detailed Financials",
                    "Complete financial data table",
                    at(0, 16, 12, 8),
                ),
            ],
            filters: LayoutFilters::default(),
        }
    }

    pub fn widget(&self, widget_id: &str) -> Option<&WidgetConfig> {
        self.widgets.iter().find(|w| w.id == widget_id)
    }

    pub fn visible_widgets(&self) -> impl Iterator<Item = &WidgetConfig> {
        self.widgets.iter().filter(|w| w.visible)
    }

    /// Returns false when no widget has the given id.
    pub fn update_widget(&mut self, widget_id: &str, update: WidgetUpdate) -> bool {
        let Some(widget) = self.widgets.iter_mut().find(|w| w.id == widget_id) else {
            return false;
        };

        if let Some(title) = update.title {
            widget.title = title;
        }
        if let Some(description) = update.description {
            widget.description = Some(description);
        }
        if let Some(visible) = update.visible {
            widget.visible = visible;
        }
        if let Some(layout) = update.layout {
            widget.layout = Some(layout);
        }
        true
    }

    pub fn add_widget(&mut self, widget: WidgetConfig) {
        self.widgets.push(widget);
    }

    pub fn remove_widget(&mut self, widget_id: &str) -> bool {
        let before = self.widgets.len();
        self.widgets.retain(|w| w.id != widget_id);
        self.widgets.len() != before
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(LayoutConfig)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let layout = LayoutConfig::default_for("ds-1");
        assert_eq!(layout.dataset_id, "ds-1");
        assert_eq!(layout.widgets.len(), 6);
        assert!(layout.widgets.iter().all(|w| w.visible));
        assert!(layout.widget("census-adr").is_none());
        assert_eq!(
            layout.widget("detail-table").unwrap().layout,
            Some(WidgetLayout { x: 0, y: 16, w: 12, h: 8 })
        );
        assert!(layout.filters.selected_periods.is_empty());
    }

    #[test]
    fn test_widget_kind_serializes_kebab_case() {
        let widget = WidgetConfig::new("census", WidgetKind::CensusAdr, "Census & ADR");
        let json = serde_json::to_value(&widget).unwrap();
        assert_eq!(json["type"], "census-adr");
        assert!(json.get("layout").is_none());

        let parsed: WidgetConfig =
            serde_json::from_str(r#"{"id":"x","type":"noi-trend","title":"NOI"}"#).unwrap();
        assert_eq!(parsed.kind, WidgetKind::NoiTrend);
        assert!(parsed.visible);
    }

    #[test]
    fn test_unknown_widget_kind_is_rejected() {
        let result: Result<WidgetConfig, _> =
            serde_json::from_str(r#"{"id":"x","type":"pie-chart","title":"Pie"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_update_add_remove() {
        let mut layout = LayoutConfig::default_for("ds-1");

        assert!(layout.update_widget("noi-trend", WidgetUpdate::visibility(false)));
        assert!(!layout.widget("noi-trend").unwrap().visible);
        assert_eq!(layout.visible_widgets().count(), 5);
        assert!(!layout.update_widget("missing", WidgetUpdate::visibility(false)));

        layout.add_widget(WidgetConfig::new("census-adr", WidgetKind::CensusAdr, "Census"));
        assert_eq!(layout.widgets.len(), 7);

        assert!(layout.remove_widget("kpi-cards"));
        assert!(!layout.remove_widget("kpi-cards"));
        assert_eq!(layout.widgets.len(), 6);
    }

    #[test]
    fn test_layout_json_uses_camel_case() {
        let layout = LayoutConfig::default_for("ds-1");
        let json = serde_json::to_string(&layout).unwrap();
        assert!(json.contains("\"datasetId\":\"ds-1\""));
        assert!(json.contains("\"showComparison\":false"));

        let back: LayoutConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, layout);
    }
}
