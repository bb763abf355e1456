use crate::cli::OutputFormat;
use crate::models::CheckReport;
use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};
use std::fs;
use std::path::Path;

/// Generate and output a report in the specified format
pub fn generate_report(
    report: &CheckReport,
    format: OutputFormat,
    output_path: Option<&Path>,
) -> Result<()> {
    let output = match format {
        OutputFormat::Terminal => format_terminal(report),
        OutputFormat::Markdown => format_markdown(report),
        OutputFormat::Json => format_json(report)?,
    };

    if let Some(path) = output_path {
        fs::write(path, output)
            .with_context(|| format!("Failed to write output to {}", path.display()))?;
        println!("Report written to {}", path.display());
    } else {
        println!("{}", output);
    }

    Ok(())
}

fn status_label(redundant: bool) -> &'static str {
    if redundant { "RESOLVED" } else { "open" }
}

fn scanned_paths(report: &CheckReport) -> String {
    report
        .scan_paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Keep the last `width` characters of `value`, marking the cut with `…`
fn fit_width(value: &str, width: usize) -> String {
    let len = value.chars().count();
    if len <= width {
        return value.to_string();
    }
    let tail: String = value.chars().skip(len - width + 1).collect();
    format!("…{}", tail)
}

/// Format report as terminal table
fn format_terminal(report: &CheckReport) -> String {
    let mut output = String::new();

    // Header
    let line = "─".repeat(58);
    output.push_str(&format!("╭{}╮\n", line));
    output.push_str(&format!("│ {:^56} │\n", "Workaround Tracker Report"));
    output.push_str(&format!(
        "│ Scanned: {:<47} │\n",
        fit_width(&scanned_paths(report), 47)
    ));
    output.push_str(&format!("│ Workarounds: {:<43} │\n", report.total_count));
    output.push_str(&format!("│ Redundant: {:<45} │\n", report.redundant_count));
    output.push_str(&format!("╰{}╯\n\n", line));

    if report.workarounds.is_empty() {
        return output;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("File").fg(Color::Cyan),
            Cell::new("Line").fg(Color::Cyan),
            Cell::new("Issue").fg(Color::Cyan),
            Cell::new("Status").fg(Color::Cyan),
        ]);

    for checked in &report.workarounds {
        let status = Cell::new(status_label(checked.redundant));
        table.add_row(vec![
            Cell::new(checked.workaround.file.as_str()),
            Cell::new(checked.workaround.line.to_string()),
            Cell::new(&checked.workaround.url),
            if checked.redundant {
                status.fg(Color::Red)
            } else {
                status
            },
        ]);
    }

    output.push_str(&format!("{}\n", table));
    output
}

/// Format report as Markdown
fn format_markdown(report: &CheckReport) -> String {
    let mut output = String::new();

    output.push_str("# Workaround Tracker Report\n\n");
    output.push_str(&format!("**Scanned**: `{}`\n", scanned_paths(report)));
    output.push_str(&format!("**Workarounds**: {}\n", report.total_count));
    output.push_str(&format!("**Redundant**: {}\n", report.redundant_count));
    output.push_str(&format!(
        "**Generated**: {}\n\n",
        report.check_time.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    if report.has_redundant() {
        output.push_str("## Redundant Workarounds\n\n");
        for workaround in report.redundant() {
            output.push_str(&format!(
                "- `{}:{}` {}\n",
                workaround.file, workaround.line, workaround.url
            ));
        }
        output.push('\n');
    }

    if !report.by_file.is_empty() {
        output.push_str("## Workarounds by File\n\n");
        for (file, count) in &report.by_file {
            output.push_str(&format!("- `{}`: {}\n", file, count));
        }
        output.push('\n');
    }

    output
}

/// Format report as JSON
fn format_json(report: &CheckReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize report to JSON")
}
