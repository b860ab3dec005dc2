//! Report generation for scenario runs.
//!
//! Generates both JSON and human-readable text reports.

use std::fs;
use std::path::Path;

use color_eyre::eyre::{Context, Result};

use super::types::*;
use crate::address::NodeId;

/// Generate JSON report
pub fn generate_json_report(report: &ScenarioReport, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)
        .context("Failed to serialize report to JSON")?;

    fs::write(output_path, json)
        .with_context(|| format!("Failed to write JSON report to {}", output_path.display()))?;

    log::info!("JSON report written to {}", output_path.display());
    Ok(())
}

/// Generate human-readable text report
pub fn generate_text_report(report: &ScenarioReport, output_path: &Path) -> Result<()> {
    let content = render_text_report(report);
    fs::write(output_path, content)
        .with_context(|| format!("Failed to write text report to {}", output_path.display()))?;

    log::info!("Text report written to {}", output_path.display());
    Ok(())
}

fn ids(nodes: &[NodeId]) -> String {
    let names: Vec<String> = nodes.iter().map(|node| node.to_string()).collect();
    format!("[{}]", names.join(", "))
}

pub fn render_text_report(report: &ScenarioReport) -> String {
    let mut lines: Vec<String> = Vec::new();

    // Header
    lines.push("=".repeat(80));
    lines.push("                        FLOCKSIM LEADER ELECTION REPORT".to_string());
    lines.push("=".repeat(80));
    lines.push(String::new());

    lines.push(format!("Scenario: {}", report.metadata.scenario));
    lines.push(format!("Initial Nodes: {}", report.metadata.initial_nodes));
    lines.push(format!("Timeline Steps: {}", report.metadata.timeline_steps));
    lines.push(format!("Final Clock: t={}", report.metadata.final_clock));
    lines.push(format!(
        "Packets: {} issued, {} sent, {} delivered, {} discarded",
        report.metadata.stats.packets_issued,
        report.metadata.stats.sent,
        report.metadata.stats.delivered,
        report.metadata.stats.discarded
    ));
    lines.push(String::new());

    for step in &report.steps {
        lines.push("=".repeat(80));
        lines.push(format!(
            "STEP {}  ({} nodes, {} edges, {} events, t={})",
            step.step, step.nodes, step.edges, step.events, step.clock
        ));
        lines.push("=".repeat(80));

        if step.edits.is_empty() {
            lines.push("Edits: none".to_string());
        } else {
            lines.push("Edits:".to_string());
            for edit in &step.edits {
                lines.push(format!("  {:?}", edit));
            }
        }
        lines.push(String::new());

        for (index, component) in step.components.iter().enumerate() {
            lines.push(format!(
                "Component {}: members {}",
                index + 1,
                ids(&component.members)
            ));
            lines.push(format!(
                "  Center {} (radius {}, diameter {})",
                ids(&component.center),
                component.radius,
                component.diameter
            ));
            if component.route_mismatches > 0 {
                lines.push(format!("  Route mismatches: {}", component.route_mismatches));
            }
            for agent in &component.agents {
                let marker = if agent.agrees { "ok" } else { "MISMATCH" };
                let elected = agent
                    .elected
                    .map(|node| node.to_string())
                    .unwrap_or_else(|| "-".to_string());
                lines.push(format!(
                    "    node {:>4}  ecc {:>4}  leaders {:<16} elected {:>4}  {}",
                    agent.node.to_string(),
                    agent.eccentricity,
                    ids(&agent.leaders),
                    elected,
                    marker
                ));
            }
        }

        lines.push(String::new());
        lines.push(format!(
            "Converged: {}",
            if step.converged { "yes" } else { "NO" }
        ));
        lines.push(String::new());
    }

    // Footer
    lines.push("=".repeat(80));
    lines.push(format!(
        "Overall: {}",
        if report.converged() {
            "all steps converged"
        } else {
            "some steps did not converge"
        }
    ));
    lines.push("=".repeat(80));

    lines.join("\n")
}

/// Print a summary to stdout
pub fn print_summary(report: &ScenarioReport) {
    println!("\n=== FLOCKSIM SUMMARY: {} ===\n", report.metadata.scenario);
    for step in &report.steps {
        let centers: Vec<String> = step
            .components
            .iter()
            .map(|component| ids(&component.center))
            .collect();
        println!(
            "Step {:>2}: {} component(s), centers {}, converged: {}",
            step.step,
            step.components.len(),
            centers.join(" "),
            step.converged
        );
    }
    println!(
        "\nPackets delivered: {}  Final clock: t={}",
        report.metadata.stats.delivered, report.metadata.final_clock
    );
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::SimulationStats;
    use tempfile::tempdir;

    fn sample() -> ScenarioReport {
        let node = NodeId::new(0);
        ScenarioReport {
            metadata: ReportMetadata {
                scenario: "pair".to_string(),
                initial_nodes: 2,
                timeline_steps: 0,
                final_clock: 3,
                stats: SimulationStats::default(),
            },
            steps: vec![StepReport {
                step: 0,
                edits: vec![],
                events: 6,
                clock: 3,
                nodes: 2,
                edges: 1,
                components: vec![ComponentReport {
                    members: vec![node, NodeId::new(1)],
                    center: vec![node, NodeId::new(1)],
                    radius: 1,
                    diameter: 1,
                    route_mismatches: 0,
                    agents: vec![AgentLeadership {
                        node,
                        eccentricity: 1,
                        leaders: vec![node, NodeId::new(1)],
                        elected: Some(NodeId::new(1)),
                        agrees: true,
                    }],
                    converged: true,
                }],
                converged: true,
            }],
            agents: vec![],
        }
    }

    #[test]
    fn test_text_report_sections() {
        let text = render_text_report(&sample());
        assert!(text.contains("Scenario: pair"));
        assert!(text.contains("STEP 0"));
        assert!(text.contains("Center [0, 1]"));
        assert!(text.contains("all steps converged"));
    }

    #[test]
    fn test_json_report_written() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.json");
        generate_json_report(&sample(), &path).unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["metadata"]["scenario"], "pair");
        assert_eq!(parsed["steps"][0]["components"][0]["radius"], 1);
    }
}
