use serde_json::Value;

use crate::report::{
    ChartData, ChartKind, ComparisonData, CycleData, FlowData, GaugeData, MindMapData,
    NetworkData, Report, Section, SectionBody, TimelineData, TreeData,
};

/// One rendering strategy per section shape.
///
/// Implementors only decide how to draw; choosing the strategy is done by
/// [`dispatch`], which is an exhaustive match over [`SectionBody`].
pub trait SectionRenderer {
    type Output;

    fn paragraph(&mut self, title: Option<&str>, content: &str) -> Self::Output;
    fn heading(&mut self, content: &str) -> Self::Output;
    fn chart(&mut self, title: Option<&str>, kind: ChartKind, data: &ChartData) -> Self::Output;
    fn timeline(&mut self, title: Option<&str>, data: &TimelineData) -> Self::Output;
    fn comparison(&mut self, title: Option<&str>, data: &ComparisonData) -> Self::Output;
    fn flow(&mut self, title: Option<&str>, data: &FlowData) -> Self::Output;
    fn gauge(&mut self, title: Option<&str>, data: &GaugeData) -> Self::Output;
    fn mindmap(&mut self, title: Option<&str>, data: &MindMapData) -> Self::Output;
    fn network(&mut self, title: Option<&str>, data: &NetworkData) -> Self::Output;
    fn tree(&mut self, title: Option<&str>, data: &TreeData) -> Self::Output;
    fn cycle(&mut self, title: Option<&str>, data: &CycleData) -> Self::Output;

    /// A known visualization whose payload is missing or malformed.
    fn no_data(&mut self, title: Option<&str>, type_name: &str, raw: &Value) -> Self::Output;

    /// A section type this client does not know. Must not fail.
    fn fallback(&mut self, title: Option<&str>, type_name: &str, raw: &Value) -> Self::Output;
}

pub fn dispatch<R: SectionRenderer>(renderer: &mut R, section: &Section) -> R::Output {
    let title = section.title.as_deref();
    let no_data = |renderer: &mut R| renderer.no_data(title, &section.type_name, section.raw_payload());

    match &section.body {
        SectionBody::Paragraph { content } => renderer.paragraph(title, content),
        SectionBody::Heading { content } => renderer.heading(content),
        SectionBody::Chart {
            kind,
            data: Some(data),
        } => renderer.chart(title, *kind, data),
        SectionBody::Timeline(Some(data)) => renderer.timeline(title, data),
        SectionBody::Comparison(Some(data)) => renderer.comparison(title, data),
        SectionBody::ProcessFlow(Some(data)) | SectionBody::Flowchart(Some(data)) => {
            renderer.flow(title, data)
        }
        SectionBody::Gauge(Some(data)) => renderer.gauge(title, data),
        SectionBody::MindMap(Some(data)) => renderer.mindmap(title, data),
        SectionBody::Network(Some(data)) => renderer.network(title, data),
        SectionBody::Tree(Some(data)) => renderer.tree(title, data),
        SectionBody::Cycle(Some(data)) => renderer.cycle(title, data),
        SectionBody::Chart { data: None, .. }
        | SectionBody::Timeline(None)
        | SectionBody::Comparison(None)
        | SectionBody::ProcessFlow(None)
        | SectionBody::Flowchart(None)
        | SectionBody::Gauge(None)
        | SectionBody::MindMap(None)
        | SectionBody::Network(None)
        | SectionBody::Tree(None)
        | SectionBody::Cycle(None) => no_data(renderer),
        SectionBody::Unknown { type_name } => {
            renderer.fallback(title, type_name, section.raw_payload())
        }
    }
}

/// Render every section in report order.
pub fn dispatch_all<R: SectionRenderer>(renderer: &mut R, report: &Report) -> Vec<R::Output> {
    report
        .sections
        .iter()
        .map(|section| dispatch(renderer, section))
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    /// Records which strategy was chosen for each section.
    struct Probe;

    impl SectionRenderer for Probe {
        type Output = String;

        fn paragraph(&mut self, _: Option<&str>, content: &str) -> String {
            format!("paragraph:{content}")
        }
        fn heading(&mut self, content: &str) -> String {
            format!("heading:{content}")
        }
        fn chart(&mut self, _: Option<&str>, kind: ChartKind, _: &ChartData) -> String {
            format!("chart:{kind:?}")
        }
        fn timeline(&mut self, _: Option<&str>, _: &TimelineData) -> String {
            "timeline".into()
        }
        fn comparison(&mut self, _: Option<&str>, _: &ComparisonData) -> String {
            "comparison".into()
        }
        fn flow(&mut self, _: Option<&str>, _: &FlowData) -> String {
            "flow".into()
        }
        fn gauge(&mut self, _: Option<&str>, _: &GaugeData) -> String {
            "gauge".into()
        }
        fn mindmap(&mut self, _: Option<&str>, _: &MindMapData) -> String {
            "mindmap".into()
        }
        fn network(&mut self, _: Option<&str>, _: &NetworkData) -> String {
            "network".into()
        }
        fn tree(&mut self, _: Option<&str>, _: &TreeData) -> String {
            "tree".into()
        }
        fn cycle(&mut self, _: Option<&str>, _: &CycleData) -> String {
            "cycle".into()
        }
        fn no_data(&mut self, _: Option<&str>, type_name: &str, _: &Value) -> String {
            format!("no_data:{type_name}")
        }
        fn fallback(&mut self, _: Option<&str>, type_name: &str, raw: &Value) -> String {
            format!("fallback:{type_name}:{raw}")
        }
    }

    #[test]
    fn dispatch_follows_section_order_and_type() {
        let report = Report::from_value(json!({
            "title": "X",
            "sections": [
                {"type": "heading", "content": "Intro"},
                {"type": "line_chart", "data": {"labels": [1], "datasets": []}},
                {"type": "gauge_chart", "data": {"value": 0.7}},
                {"type": "cycle", "data": {"steps": ["plan", "do"]}},
                {"type": "mindmap"},
                {"type": "hologram", "data": {"x": 1}},
            ]
        }))
        .unwrap();

        let rendered = dispatch_all(&mut Probe, &report);
        assert_eq!(
            rendered,
            vec![
                "heading:Intro".to_string(),
                "chart:Line".to_string(),
                "gauge".to_string(),
                "cycle".to_string(),
                "no_data:mindmap".to_string(),
                r#"fallback:hologram:{"x":1}"#.to_string(),
            ]
        );
    }
}
