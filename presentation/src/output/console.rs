//! Console output formatter for deliberation records

use agora_domain::{DeliberationRecord, FinalArtifacts, Flavor, Turn};
use colored::Colorize;

/// Formats deliberation records for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Full transcript, retrieval sources and synthesis
    pub fn format_transcript(record: &DeliberationRecord) -> String {
        let mut output = String::new();

        output.push_str(&Self::header(Self::title(record.flavor)));
        output.push('\n');

        output.push_str(&format!(
            "{} {}\n",
            "Session:".cyan().bold(),
            record.session_id
        ));
        for (key, value) in record.parameters.iter() {
            let rendered = match value.as_str() {
                Some(s) => s.to_string(),
                None => value.to_string(),
            };
            if !rendered.is_empty() {
                output.push_str(&format!("{} {}\n", format!("{}:", key).cyan(), rendered));
            }
        }

        output.push_str(&Self::section_header("Transcript"));
        let mut current_cycle = None;
        for turn in &record.transcript {
            if current_cycle != Some(turn.round_or_turn) {
                current_cycle = Some(turn.round_or_turn);
                output.push_str(&format!(
                    "\n{}\n",
                    format!("[{} {}]", Self::cycle_label(record.flavor), turn.round_or_turn).dimmed()
                ));
            }
            output.push_str(&Self::format_turn(turn));
        }

        let sources: Vec<&str> = record
            .retrieved_docs
            .values()
            .flatten()
            .map(|snippet| snippet.source_id.as_str())
            .collect();
        if !sources.is_empty() {
            output.push_str(&Self::section_header("References"));
            let mut seen = Vec::new();
            for source in sources {
                if !seen.contains(&source) {
                    seen.push(source);
                    output.push_str(&format!("  * {}\n", source));
                }
            }
        }

        match &record.final_artifacts {
            Some(artifacts) => {
                output.push_str(&Self::section_header("Synthesis"));
                output.push_str(&Self::format_artifacts(artifacts));
            }
            None => {
                output.push_str(&format!(
                    "\n{}\n",
                    "Deliberation did not complete; no synthesis.".red()
                ));
            }
        }

        output.push_str(&Self::footer());
        output
    }

    /// Synthesis only (concise output)
    pub fn format_summary(record: &DeliberationRecord) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{}\n\n",
            format!("=== {} ===", Self::title(record.flavor)).cyan().bold()
        ));
        output.push_str(&format!(
            "{} {} {} {}\n\n",
            format!("{}s:", Self::cycle_label(record.flavor)).dimmed(),
            record.rounds,
            "turns:".dimmed(),
            record.transcript.len()
        ));

        match &record.final_artifacts {
            Some(artifacts) => output.push_str(&Self::format_artifacts(artifacts)),
            None => output.push_str("(no synthesis)\n"),
        }
        output
    }

    /// Pretty JSON of the whole record
    pub fn format_json(record: &DeliberationRecord) -> String {
        serde_json::to_string_pretty(record).unwrap_or_else(|_| "{}".to_string())
    }

    /// Consultation type catalogue, one per line
    pub fn format_catalogue(catalogue: &[(&str, &str, &str)]) -> String {
        let width = catalogue.iter().map(|(code, _, _)| code.len()).max().unwrap_or(0);
        catalogue
            .iter()
            .map(|(code, name, description)| {
                format!(
                    "{}{}  {} - {}",
                    code.bold(),
                    " ".repeat(width - code.len()),
                    name,
                    description.dimmed()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn format_turn(turn: &Turn) -> String {
        format!(
            "\n{}\n{}\n",
            format!("── {} ──", turn.role.display_name()).yellow().bold(),
            Self::indent(&turn.content, "  ")
        )
    }

    fn format_artifacts(artifacts: &FinalArtifacts) -> String {
        let mut output = format!(
            "\n{}\n\n{}\n",
            artifacts.role.display_name().yellow().bold(),
            artifacts.summary
        );

        if !artifacts.recommended_items.is_empty() {
            output.push_str(&format!("\n{}\n", "Recommended:".green().bold()));
            for item in &artifacts.recommended_items {
                match &item.rationale {
                    Some(rationale) => {
                        output.push_str(&format!("  * {} - {}\n", item.name.bold(), rationale))
                    }
                    None => output.push_str(&format!("  * {}\n", item.name.bold())),
                }
            }
        }

        if !artifacts.follow_up_options.is_empty() {
            output.push_str(&format!("\n{}\n", "Follow-up searches:".cyan().bold()));
            for option in &artifacts.follow_up_options {
                output.push_str(&format!("  * {}\n", option));
            }
        }

        output
    }

    fn title(flavor: Flavor) -> &'static str {
        match flavor {
            Flavor::Adversarial => "Advisory Debate",
            Flavor::Dialogic => "Consultation",
        }
    }

    fn cycle_label(flavor: Flavor) -> &'static str {
        match flavor {
            Flavor::Adversarial => "Round",
            Flavor::Dialogic => "Turn",
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
