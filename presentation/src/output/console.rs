//! Console output formatter for command results

use colored::Colorize;
use mplp_domain::collab::{CollabMode, StrategyRecommendation};
use mplp_domain::core::validation::{Severity, ValidationIssue};
use mplp_infrastructure::{ConfigIssue, ConfigSource};

/// Formats command results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format a strategy recommendation
    pub fn format_recommendation(
        mode: CollabMode,
        participants: usize,
        recommendation: &StrategyRecommendation,
    ) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Coordination Strategy"));
        output.push('\n');

        output.push_str(&format!(
            "{} {} mode, {} participants\n\n",
            "Team:".cyan().bold(),
            mode,
            participants
        ));
        output.push_str(&format!(
            "{} {}\n",
            "Coordination:".cyan().bold(),
            recommendation.coordination_type.to_string().yellow().bold()
        ));
        output.push_str(&format!(
            "{} {}\n",
            "Decision making:".cyan().bold(),
            recommendation.decision_making.to_string().yellow().bold()
        ));
        output.push_str(&format!(
            "{} {:.2}\n",
            "Capability diversity:".cyan().bold(),
            recommendation.capability_diversity
        ));

        output.push_str(&Self::section_header("Rationale"));
        output.push_str(&format!("  {}\n", recommendation.rationale));

        output.push_str(&Self::footer());
        output
    }

    /// Format schema validation issues. An empty list reads as valid.
    pub fn format_schema_issues(source: &str, issues: &[ValidationIssue]) -> String {
        if issues.is_empty() {
            return format!("{} {} is a valid collaboration\n", "✓".green().bold(), source);
        }

        let errors = issues.iter().filter(|i| i.is_error()).count();
        let mut output = format!(
            "{} {} ({} error(s), {} warning(s))\n",
            "✗".red().bold(),
            source,
            errors,
            issues.len() - errors
        );
        for issue in issues {
            output.push_str(&format!(
                "  {} {} {}\n",
                Self::severity_tag(issue.severity),
                format!("[{}]", issue.code).dimmed(),
                issue.message
            ));
        }
        output
    }

    /// Format configuration problems found at startup
    pub fn format_config_issues(issues: &[ConfigIssue]) -> String {
        issues
            .iter()
            .map(|issue| format!("{} {}\n", Self::severity_tag(issue.severity), issue.message))
            .collect()
    }

    /// Format config file locations in priority order
    pub fn format_config_sources(sources: &[ConfigSource]) -> String {
        let mut output = Self::section_header("Configuration sources (highest priority first)");
        for source in sources {
            let marker = if source.found {
                "●".green()
            } else {
                "○".dimmed()
            };
            output.push_str(&format!(
                "  {} {:<9} {}\n",
                marker,
                source.label.bold(),
                source.location
            ));
        }
        output
    }

    fn severity_tag(severity: Severity) -> String {
        match severity {
            Severity::Error => "error:".red().bold().to_string(),
            Severity::Warning => "warning:".yellow().bold().to_string(),
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    pub fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mplp_domain::collab::CollabCoordinationService;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_format_recommendation() {
        plain();
        let rec = CollabCoordinationService::calculate_optimal_strategy(CollabMode::Parallel, 6, &[]);
        let text = ConsoleFormatter::format_recommendation(CollabMode::Parallel, 6, &rec);
        assert!(text.contains("Coordination: hierarchical"));
        assert!(text.contains("Decision making: majority"));
        assert!(text.contains("parallel mode, 6 participants"));
    }

    #[test]
    fn test_format_schema_issues() {
        plain();
        let text = ConsoleFormatter::format_schema_issues("collab.json", &[]);
        assert!(text.contains("collab.json is a valid collaboration"));

        let issues = vec![
            ValidationIssue::error("REQUIRED_FIELD_MISSING", "Missing required field: name"),
            ValidationIssue::warning("SOMETHING", "minor"),
        ];
        let text = ConsoleFormatter::format_schema_issues("collab.json", &issues);
        assert!(text.contains("1 error(s), 1 warning(s)"));
        assert!(text.contains("[REQUIRED_FIELD_MISSING] Missing required field: name"));
    }

    #[test]
    fn test_format_config_sources() {
        plain();
        let sources = vec![ConfigSource {
            label: "Default",
            location: "built-in defaults".to_string(),
            found: true,
        }];
        let text = ConsoleFormatter::format_config_sources(&sources);
        assert!(text.contains("built-in defaults"));
    }
}
