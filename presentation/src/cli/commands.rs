//! CLI command definitions

use agora_application::RunDeliberationInput;
use agora_domain::{ConsultationType, Flavor, Parameters};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::json;
use std::path::PathBuf;

/// Output format for deliberation results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Full transcript followed by the synthesis
    Transcript,
    /// Only the final synthesis
    Summary,
    /// The finished record as JSON
    Json,
    /// Raw server-sent event lines as they arrive
    Sse,
}

/// CLI arguments for agora
#[derive(Parser, Debug)]
#[command(name = "agora")]
#[command(author, version, about = "Multi-agent deliberation - advisors debate, a mediator decides")]
#[command(long_about = r#"
agora runs a bounded deliberation between role-playing agents and closes it
with a synthesis.

Flavors:
  debate    A rational and an emotional advisor argue over a property
            search for a fixed number of rounds; a mediator recommends.
  consult   A doctor and a patient talk until the patient is satisfied or
            the turn ceiling is reached; a coordinator summarizes.

Configuration files are loaded from (in priority order):
1. AGORA_* environment variables (e.g. AGORA_PROVIDER__MODEL)
2. --config <path>     Explicit config file
3. ./agora.toml        Project-level config
4. ~/.config/agora/config.toml   Global config

Example:
  agora debate --budget "500M" --property-type apartment --preference1 "quiet"
  agora consult "When can I return to work?" --consultation-type post_surgery
  agora -o sse consult "Is swimming safe?"
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "transcript", global = true)]
    pub output: OutputFormat,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Write diagnostic logs to this file instead of stderr
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Adversarial deliberation over a property search
    Debate(DebateArgs),
    /// Dialogic consultation between a doctor and a patient
    Consult(ConsultArgs),
    /// List the known consultation types
    ConsultationTypes,
}

impl Command {
    /// Build the run input, or `None` for informational commands.
    pub fn to_input(&self) -> Option<RunDeliberationInput> {
        match self {
            Command::Debate(args) => Some(args.run.apply(RunDeliberationInput::new(
                Flavor::Adversarial,
                args.to_parameters(),
            ))),
            Command::Consult(args) => Some(args.run.apply(RunDeliberationInput::new(
                Flavor::Dialogic,
                args.to_parameters(),
            ))),
            Command::ConsultationTypes => None,
        }
    }
}

/// Options shared by every deliberation command
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Round ceiling (debate) or turn ceiling (consult)
    #[arg(long, value_name = "N")]
    pub max: Option<u32>,

    /// Disable reference retrieval for every role
    #[arg(long)]
    pub no_retrieval: bool,

    /// Session identifier (a UUID is generated when absent)
    #[arg(long, value_name = "ID")]
    pub session_id: Option<String>,
}

impl RunArgs {
    fn apply(&self, mut input: RunDeliberationInput) -> RunDeliberationInput {
        if let Some(max) = self.max {
            input = input.with_max_rounds_or_turns(max);
        }
        if self.no_retrieval {
            input = input.without_retrieval();
        }
        if let Some(id) = &self.session_id {
            input = input.with_session_id(id.clone());
        }
        input
    }
}

#[derive(Args, Debug, Clone)]
pub struct DebateArgs {
    /// Available budget (free text, e.g. "500M KRW")
    #[arg(long)]
    pub budget: String,

    /// Kind of property (apartment, officetel, villa, ...)
    #[arg(long)]
    pub property_type: String,

    /// Desired floor area range
    #[arg(long, default_value = "")]
    pub area_range: String,

    /// First preference
    #[arg(long, default_value = "")]
    pub preference1: String,

    /// Second preference
    #[arg(long, default_value = "")]
    pub preference2: String,

    #[command(flatten)]
    pub run: RunArgs,
}

impl DebateArgs {
    pub fn to_parameters(&self) -> Parameters {
        Parameters::new()
            .with("budget", self.budget.clone())
            .with("property_type", self.property_type.clone())
            .with("area_range", self.area_range.clone())
            .with("preference1", self.preference1.clone())
            .with("preference2", self.preference2.clone())
    }
}

#[derive(Args, Debug, Clone)]
pub struct ConsultArgs {
    /// The patient's question
    pub query: String,

    /// pre_surgery, post_surgery, rehabilitation, complications or general
    #[arg(long, default_value = "general")]
    pub consultation_type: String,

    #[arg(long)]
    pub age: Option<String>,

    #[arg(long)]
    pub occupation: Option<String>,

    #[arg(long)]
    pub family: Option<String>,

    /// Time since surgery (e.g. "2 weeks")
    #[arg(long)]
    pub post_surgery_period: Option<String>,

    #[arg(long)]
    pub symptoms: Option<String>,

    #[command(flatten)]
    pub run: RunArgs,
}

impl ConsultArgs {
    /// Patient profile flags are only sent when at least one is given, so
    /// the flavor defaults apply otherwise.
    pub fn to_parameters(&self) -> Parameters {
        let consultation_type = ConsultationType::from_code(&self.consultation_type);
        let mut params = Parameters::new()
            .with("patient_query", self.query.clone())
            .with("consultation_type", consultation_type.code());

        let profile = [
            ("age", &self.age, "50"),
            ("occupation", &self.occupation, "office worker"),
            ("family", &self.family, "spouse and two children"),
            ("post_surgery_period", &self.post_surgery_period, "surgery scheduled"),
            ("symptoms", &self.symptoms, "lower back pain"),
        ];
        if profile.iter().any(|(_, value, _)| value.is_some()) {
            let mut info = serde_json::Map::new();
            for (key, value, default) in profile {
                let value = value.clone().unwrap_or_else(|| default.to_string());
                info.insert(key.to_string(), json!(value));
            }
            params = params.with("patient_info", serde_json::Value::Object(info));
        }
        params
    }
}
