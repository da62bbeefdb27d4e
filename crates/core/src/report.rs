//! Report model: an ordered list of typed sections decoded from the backend payload.
//!
//! Decoding never fails on a section: an unknown `type` becomes
//! [`SectionBody::Unknown`] and a known visualization whose payload does not
//! have the expected shape keeps `None` as its data, so renderers can show a
//! "no data" state. The original JSON of every section is kept in
//! [`Section::raw`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

fn default_title() -> String {
    "Untitled report".to_string()
}

impl Report {
    /// Decode a result payload. Fails only when the payload is not a JSON object.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        if !value.is_object() {
            return Err(serde::de::Error::custom("report payload is not a JSON object"));
        }
        serde_json::from_value(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
    Doughnut,
    Radar,
    Scatter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<Value>,
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub data: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineData {
    pub events: Vec<TimelineEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    #[serde(default, alias = "time", alias = "year")]
    pub date: Option<Value>,
    #[serde(default, alias = "event", alias = "label")]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonData {
    pub items: Vec<String>,
    pub criteria: Vec<String>,
    /// `values[item][criterion]`.
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowData {
    pub nodes: Vec<FlowNode>,
    #[serde(default)]
    pub edges: Vec<FlowEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
    pub id: Value,
    #[serde(default, alias = "text", alias = "name")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowEdge {
    pub from: Value,
    pub to: Value,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaugeData {
    pub value: f64,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindMapData {
    pub center: String,
    #[serde(default)]
    pub branches: Vec<MindMapBranch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindMapBranch {
    #[serde(alias = "name", alias = "text")]
    pub label: String,
    #[serde(default)]
    pub children: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkData {
    pub nodes: Vec<FlowNode>,
    #[serde(default)]
    pub links: Vec<NetworkLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkLink {
    pub source: Value,
    pub target: Value,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeData {
    pub root: String,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(alias = "name", alias = "text")]
    pub label: String,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleData {
    pub steps: Vec<String>,
}

/// Typed content of a section, selected by its `type` string.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionBody {
    Paragraph { content: String },
    Heading { content: String },
    Chart { kind: ChartKind, data: Option<ChartData> },
    Timeline(Option<TimelineData>),
    Comparison(Option<ComparisonData>),
    ProcessFlow(Option<FlowData>),
    Flowchart(Option<FlowData>),
    Gauge(Option<GaugeData>),
    MindMap(Option<MindMapData>),
    Network(Option<NetworkData>),
    Tree(Option<TreeData>),
    Cycle(Option<CycleData>),
    Unknown { type_name: String },
}

impl SectionBody {
    fn decode(type_name: &str, content: Option<String>, data: Option<&Value>) -> Self {
        fn payload<T: serde::de::DeserializeOwned>(data: Option<&Value>) -> Option<T> {
            data.and_then(|value| T::deserialize(value).ok())
        }
        let chart = |kind| SectionBody::Chart {
            kind,
            data: payload::<ChartData>(data),
        };

        match type_name {
            "paragraph" | "text" => SectionBody::Paragraph {
                content: content.unwrap_or_default(),
            },
            "heading" => SectionBody::Heading {
                content: content.unwrap_or_default(),
            },
            "bar_chart" | "bar" => chart(ChartKind::Bar),
            "line_chart" | "line" => chart(ChartKind::Line),
            "pie_chart" | "pie" => chart(ChartKind::Pie),
            "doughnut" => chart(ChartKind::Doughnut),
            "radar" => chart(ChartKind::Radar),
            "scatter_plot" | "scatter" => chart(ChartKind::Scatter),
            "timeline" => SectionBody::Timeline(payload(data)),
            "comparison_table" | "comparison" | "matrix" => SectionBody::Comparison(payload(data)),
            "process_flow" => SectionBody::ProcessFlow(payload(data)),
            "flowchart" | "process" => SectionBody::Flowchart(payload(data)),
            "gauge_chart" => SectionBody::Gauge(payload(data)),
            "mindmap" => SectionBody::MindMap(payload(data)),
            "network" => SectionBody::Network(payload(data)),
            "tree" | "hierarchy" => SectionBody::Tree(payload(data)),
            "cycle" => SectionBody::Cycle(payload(data)),
            other => SectionBody::Unknown {
                type_name: other.to_string(),
            },
        }
    }

    pub fn is_visualization(&self) -> bool {
        !matches!(
            self,
            SectionBody::Paragraph { .. } | SectionBody::Heading { .. } | SectionBody::Unknown { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    /// The `type` string exactly as the backend sent it.
    pub type_name: String,
    pub title: Option<String>,
    pub position: Option<i64>,
    pub body: SectionBody,
    /// The section as received, for inspection of unknown or malformed payloads.
    pub raw: Value,
}

impl Section {
    pub fn from_value(raw: Value) -> Self {
        let field = |name: &str| raw.get(name).and_then(Value::as_str).map(str::to_string);

        let type_name = field("type").unwrap_or_default();
        let title = field("title");
        let position = raw.get("position").and_then(Value::as_i64);
        let body = SectionBody::decode(
            type_name.trim().to_ascii_lowercase().as_str(),
            field("content"),
            raw.get("data").filter(|data| !data.is_null()),
        );

        Self {
            type_name,
            title,
            position,
            body,
            raw,
        }
    }

    /// The section's `data` payload, or the whole section if it has none.
    pub fn raw_payload(&self) -> &Value {
        self.raw.get("data").unwrap_or(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Section {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Section::from_value)
    }
}

impl Serialize for Section {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}
