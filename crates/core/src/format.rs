use serde_json::Value;

use crate::{
    dispatch::{SectionRenderer, dispatch_all},
    report::{
        ChartData, ChartKind, ComparisonData, CycleData, FlowData, GaugeData, MindMapData,
        NetworkData, Report, TimelineData, TreeData, TreeNode,
    },
    types::Job,
};

/// Renders sections as markdown blocks.
#[derive(Default)]
pub struct MarkdownRenderer;

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

fn section_title(output: &mut String, title: Option<&str>) {
    if let Some(title) = title.filter(|t| !t.trim().is_empty()) {
        output.push_str(&format!("### {}\n\n", title));
    }
}

fn tree_lines(output: &mut String, node: &TreeNode, depth: usize) {
    output.push_str(&format!("{}- {}\n", "  ".repeat(depth), node.label));
    for child in &node.children {
        tree_lines(output, child, depth + 1);
    }
}

impl SectionRenderer for MarkdownRenderer {
    type Output = String;

    fn paragraph(&mut self, title: Option<&str>, content: &str) -> String {
        let mut output = String::new();
        section_title(&mut output, title);
        output.push_str(content.trim());
        output.push_str("\n\n");
        output
    }

    fn heading(&mut self, content: &str) -> String {
        format!("## {}\n\n", content.trim())
    }

    fn chart(&mut self, title: Option<&str>, kind: ChartKind, data: &ChartData) -> String {
        let mut output = String::new();
        section_title(&mut output, title);
        output.push_str(&format!("_{:?} chart_\n\n", kind));

        output.push_str("| |");
        for label in &data.labels {
            output.push_str(&format!(" {} |", value_text(label)));
        }
        output.push_str("\n|---|");
        output.push_str(&"---|".repeat(data.labels.len()));
        output.push('\n');

        for (i, dataset) in data.datasets.iter().enumerate() {
            let name = dataset
                .label
                .clone()
                .unwrap_or_else(|| format!("Series {}", i + 1));
            output.push_str(&format!("| {} |", name));
            for idx in 0..data.labels.len() {
                let cell = dataset.data.get(idx).map(value_text).unwrap_or_default();
                output.push_str(&format!(" {} |", cell));
            }
            output.push('\n');
        }
        output.push('\n');
        output
    }

    fn timeline(&mut self, title: Option<&str>, data: &TimelineData) -> String {
        let mut output = String::new();
        section_title(&mut output, title);
        for event in &data.events {
            let date = event.date.as_ref().map(value_text).unwrap_or_default();
            let name = event.title.as_deref().unwrap_or("");
            output.push_str(&format!("- **{}** {}", date, name));
            if let Some(description) = &event.description {
                output.push_str(&format!(": {}", description));
            }
            output.push('\n');
        }
        output.push('\n');
        output
    }

    fn comparison(&mut self, title: Option<&str>, data: &ComparisonData) -> String {
        let mut output = String::new();
        section_title(&mut output, title);
        output.push_str("| |");
        for criterion in &data.criteria {
            output.push_str(&format!(" {} |", criterion));
        }
        output.push_str("\n|---|");
        output.push_str(&"---|".repeat(data.criteria.len()));
        output.push('\n');

        for (i, item) in data.items.iter().enumerate() {
            output.push_str(&format!("| {} |", item));
            for idx in 0..data.criteria.len() {
                let cell = data
                    .values
                    .get(i)
                    .and_then(|row| row.get(idx))
                    .map(value_text)
                    .unwrap_or_default();
                output.push_str(&format!(" {} |", cell));
            }
            output.push('\n');
        }
        output.push('\n');
        output
    }

    fn flow(&mut self, title: Option<&str>, data: &FlowData) -> String {
        let mut output = String::new();
        section_title(&mut output, title);
        let label_of = |id: &Value| {
            data.nodes
                .iter()
                .find(|node| &node.id == id)
                .and_then(|node| node.label.clone())
                .unwrap_or_else(|| value_text(id))
        };

        if data.edges.is_empty() {
            for (i, node) in data.nodes.iter().enumerate() {
                output.push_str(&format!("{}. {}\n", i + 1, label_of(&node.id)));
            }
        } else {
            for edge in &data.edges {
                output.push_str(&format!("- {} → {}", label_of(&edge.from), label_of(&edge.to)));
                if let Some(label) = &edge.label {
                    output.push_str(&format!(" ({})", label));
                }
                output.push('\n');
            }
        }
        output.push('\n');
        output
    }

    fn gauge(&mut self, title: Option<&str>, data: &GaugeData) -> String {
        let mut output = String::new();
        section_title(&mut output, title);
        let min = data.min.unwrap_or(0.0);
        let max = data.max.unwrap_or(100.0);
        let ratio = if max > min {
            ((data.value - min) / (max - min)).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let filled = (ratio * 20.0).round() as usize;
        output.push_str(&format!(
            "`[{}{}]` {}{}\n\n",
            "#".repeat(filled),
            ".".repeat(20 - filled),
            data.value,
            data.label
                .as_deref()
                .map(|label| format!(" {}", label))
                .unwrap_or_default()
        ));
        output
    }

    fn mindmap(&mut self, title: Option<&str>, data: &MindMapData) -> String {
        let mut output = String::new();
        section_title(&mut output, title);
        output.push_str(&format!("**{}**\n", data.center));
        for branch in &data.branches {
            output.push_str(&format!("- {}\n", branch.label));
            for child in &branch.children {
                output.push_str(&format!("  - {}\n", child));
            }
        }
        output.push('\n');
        output
    }

    fn network(&mut self, title: Option<&str>, data: &NetworkData) -> String {
        let mut output = String::new();
        section_title(&mut output, title);
        let label_of = |id: &Value| {
            data.nodes
                .iter()
                .find(|node| &node.id == id)
                .and_then(|node| node.label.clone())
                .unwrap_or_else(|| value_text(id))
        };
        output.push_str(&format!(
            "Nodes: {}\n\n",
            data.nodes
                .iter()
                .map(|node| label_of(&node.id))
                .collect::<Vec<_>>()
                .join(", ")
        ));
        for link in &data.links {
            output.push_str(&format!(
                "- {} — {}",
                label_of(&link.source),
                label_of(&link.target)
            ));
            if let Some(label) = &link.label {
                output.push_str(&format!(" ({})", label));
            }
            output.push('\n');
        }
        output.push('\n');
        output
    }

    fn tree(&mut self, title: Option<&str>, data: &TreeData) -> String {
        let mut output = String::new();
        section_title(&mut output, title);
        output.push_str(&format!("- {}\n", data.root));
        for child in &data.children {
            tree_lines(&mut output, child, 1);
        }
        output.push('\n');
        output
    }

    fn cycle(&mut self, title: Option<&str>, data: &CycleData) -> String {
        let mut output = String::new();
        section_title(&mut output, title);
        let mut steps = data.steps.clone();
        if let Some(first) = data.steps.first() {
            steps.push(first.clone());
        }
        output.push_str(&steps.join(" → "));
        output.push_str("\n\n");
        output
    }

    fn no_data(&mut self, title: Option<&str>, type_name: &str, _raw: &Value) -> String {
        let mut output = String::new();
        section_title(&mut output, title);
        output.push_str(&format!("> ⚠ No data to display for this {} section.\n\n", type_name));
        output
    }

    fn fallback(&mut self, title: Option<&str>, type_name: &str, raw: &Value) -> String {
        let mut output = String::new();
        section_title(&mut output, title);
        let pretty = serde_json::to_string_pretty(raw).unwrap_or_else(|_| raw.to_string());
        output.push_str(&format!(
            "<details><summary>Unsupported section type `{}`</summary>\n\n```json\n{}\n```\n\n</details>\n\n",
            type_name, pretty
        ));
        output
    }
}

/// Format a report as human-readable markdown
pub fn format_report_readable(report: &Report) -> String {
    let mut output = String::new();
    output.push_str(&format!("# {}\n\n", report.title));

    if let Some(created_at) = &report.created_at {
        output.push_str(&format!("**Created:** {}\n\n", created_at));
    }

    if let Some(summary) = report.summary.as_deref().filter(|s| !s.trim().is_empty()) {
        output.push_str("## Summary\n\n");
        output.push_str(summary.trim());
        output.push_str("\n\n");
    }

    if let Some(statistics) = report.statistics.as_ref().filter(|s| !s.is_empty()) {
        output.push_str("## Statistics\n\n");
        for (key, value) in statistics {
            output.push_str(&format!("• {}: {}\n", key, value_text(value)));
        }
        output.push('\n');
    }

    for block in dispatch_all(&mut MarkdownRenderer, report) {
        output.push_str(&block);
    }

    output
}

/// One-line description of a job, for status output and history listings.
pub fn format_job_line(job: &Job) -> String {
    let id = job.job_id.as_deref().unwrap_or("(pending)");
    let mut line = format!("{}  {:<10} {:>3}%", id, job.status.as_str(), job.progress);
    if let Some(url) = &job.youtube_url {
        line.push_str(&format!("  {}", url));
    }
    if !job.message.is_empty() {
        line.push_str(&format!("  {}", job.message));
    }
    line
}
