//! Text (terminal) reporter with colors and formatting

use anyhow::Result;

use crate::models::{AnalysisReport, Severity, Violation};

/// Severity colors (ANSI escape codes)
fn severity_color(severity: &Severity) -> &'static str {
    match severity {
        Severity::Error => "\x1b[31m",   // Red
        Severity::Warning => "\x1b[33m", // Yellow
        Severity::Info => "\x1b[90m",    // Gray
    }
}

/// Reset ANSI color
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Severity tag
fn severity_tag(severity: &Severity) -> &'static str {
    match severity {
        Severity::Error => "[E]",
        Severity::Warning => "[W]",
        Severity::Info => "[I]",
    }
}

/// Render report as formatted terminal output
pub fn render(report: &AnalysisReport) -> Result<String> {
    let mut out = String::new();

    // Header
    out.push_str(&format!("\n{BOLD}Cogload Analysis{RESET}\n"));
    out.push_str(&format!(
        "{DIM}──────────────────────────────────────{RESET}\n"
    ));
    let verdict = if report.clean {
        "\x1b[32mclean\x1b[0m"
    } else {
        "\x1b[31mnot clean\x1b[0m"
    };
    out.push_str(&format!(
        "Status: {}  Verdict: {verdict}  Units: {}  Skipped: {}\n\n",
        report.status,
        report.units.len(),
        report.skipped_units.len()
    ));

    // Violations summary
    let s = &report.summary;
    out.push_str(&format!("{BOLD}VIOLATIONS{RESET} ({} total)\n", s.total));
    let mut summary_parts = Vec::new();
    if s.error > 0 {
        summary_parts.push(format!("\x1b[31m{} error{RESET}", s.error));
    }
    if s.warning > 0 {
        summary_parts.push(format!("\x1b[33m{} warning{RESET}", s.warning));
    }
    if s.info > 0 {
        summary_parts.push(format!("\x1b[90m{} info{RESET}", s.info));
    }
    if !summary_parts.is_empty() {
        out.push_str(&format!("  {}\n\n", summary_parts.join(" | ")));
    }

    // Violations table
    if !report.violations.is_empty() {
        out.push_str(&format!(
            "{DIM}  SEV   KIND              UNIT                          MESSAGE{RESET}\n"
        ));
        out.push_str(&format!(
            "{DIM}  ─────────────────────────────────────────────────────────────────{RESET}\n"
        ));
        for violation in &report.violations {
            out.push_str(&render_violation_row(violation));
        }
        out.push('\n');
    }

    // Suggested splits for low-cohesion units
    for violation in &report.violations {
        let Some(split) = &violation.suggested_split else {
            continue;
        };
        out.push_str(&format!(
            "{BOLD}Suggested split for {}{RESET}\n",
            violation.unit_id
        ));
        for (i, group) in split.iter().enumerate() {
            out.push_str(&format!(
                "  {}. methods: {}  members: {}\n",
                i + 1,
                group.methods.join(", "),
                group.members.join(", ")
            ));
        }
        out.push('\n');
    }

    // Advisories
    if !report.advisories.is_empty() {
        out.push_str(&format!("{BOLD}ADVISORIES{RESET}\n"));
        for advisory in &report.advisories {
            out.push_str(&format!(
                "  {DIM}{}: {}{RESET}\n",
                advisory.unit_id, advisory.message
            ));
        }
        out.push('\n');
    }

    // Skipped units
    if !report.skipped_units.is_empty() {
        out.push_str(&format!("{BOLD}SKIPPED{RESET}\n"));
        for skip in &report.skipped_units {
            out.push_str(&format!(
                "  {DIM}{}: {}{RESET}\n",
                skip.source, skip.message
            ));
        }
        out.push('\n');
    }

    Ok(out)
}

fn render_violation_row(violation: &Violation) -> String {
    let sev_c = severity_color(&violation.severity);
    let sev_tag = severity_tag(&violation.severity);

    // Truncate with chars() to avoid UTF-8 slicing panics
    let unit: String = violation.unit_id.chars().take(28).collect();
    let message: String = violation.message.chars().take(60).collect();
    let message = if violation.message.chars().count() > 60 {
        format!("{message}...")
    } else {
        message
    };

    format!(
        "  {sev_c}{sev_tag}{RESET}   {:<16}  {:<28}  {DIM}{}{RESET}\n",
        violation.kind.to_string(),
        unit,
        message
    )
}
