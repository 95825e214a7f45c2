//! CLI entrypoint for agora
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use agora_application::{
    ConversationLogger, DeliberationEvent, LlmGateway, NoConversationLogger, NoRetrieval,
    RetrievalPort, RunDeliberationInput, RunDeliberationUseCase,
};
use agora_domain::ConsultationType;
use agora_infrastructure::{
    ConfigLoader, CorpusRetrieval, FileConfig, JsonlConversationLogger, OpenAiCompatibleGateway, RetrievalBackend, WebSearchRetrieval,
};
use agora_presentation::{
    Cli, Command, ConsoleFormatter, OutputFormat, ProgressReporter, SseEncoder,
};
use anyhow::{Context, Result, anyhow, bail};
use clap::{CommandFactory, Parser};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Everything a run needs besides the retrieval backend
struct RunContext {
    config: FileConfig,
    output: OutputFormat,
    quiet: bool,
    input: RunDeliberationInput,
    logger: Arc<dyn ConversationLogger>,
    cancel: CancellationToken,
}

fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    match log_file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
            let dir = dir.unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow!("log file path has no file name: {}", path.display()))?;
            std::fs::create_dir_all(dir)
                .with_context(|| format!("could not create log directory {}", dir.display()))?;

            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
    }
}

/// Session id used for both the conversation log and the run.
///
/// Blank ids are replaced the same way the use case does, so the log file
/// name always matches the record.
fn resolve_session_id(input: &mut RunDeliberationInput) -> String {
    let session_id = input
        .session_id
        .take()
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    input.session_id = Some(session_id.clone());
    session_id
}

/// Write one SSE frame; returns the message of an `error` event.
fn write_sse_event<W: Write>(out: &mut W, event: &DeliberationEvent) -> Result<Option<String>> {
    out.write_all(SseEncoder::encode(event).as_bytes())?;
    out.flush()?;
    Ok(match event {
        DeliberationEvent::Error { message } => Some(message.clone()),
        _ => None,
    })
}

fn load_config(cli: &Cli) -> Result<FileConfig> {
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).map_err(|e| anyhow!("invalid configuration: {}", e))?
    };
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources();
        return Ok(());
    }

    let config = load_config(&cli)?;

    let log_file = cli.log_file.clone().or_else(|| config.logging.log_file.clone());
    let _log_guard = init_logging(cli.verbose, log_file.as_deref())?;

    info!("Starting agora");

    let Some(command) = &cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let Some(mut input) = command.to_input() else {
        if let Command::ConsultationTypes = command {
            println!(
                "{}",
                ConsoleFormatter::format_catalogue(&ConsultationType::catalogue())
            );
        }
        return Ok(());
    };

    let session_id = resolve_session_id(&mut input);

    // === Dependency Injection ===
    let logger: Arc<dyn ConversationLogger> = match &config.logging.conversation_log_dir {
        Some(dir) => match JsonlConversationLogger::for_session(dir, &session_id) {
            Some(logger) => {
                info!("Conversation log: {}", logger.path().display());
                Arc::new(logger)
            }
            None => Arc::new(NoConversationLogger),
        },
        None => Arc::new(NoConversationLogger),
    };

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling deliberation");
            signal_token.cancel();
        }
    });

    let gateway = Arc::new(OpenAiCompatibleGateway::from_config(&config.provider)?);
    let backend = config.retrieval_backend()?;

    let ctx = RunContext {
        output: cli.output,
        quiet: cli.quiet,
        input,
        logger,
        cancel,
        config,
    };

    // Retrieval is a generic parameter of the use case, so each backend
    // gets its own instantiation.
    match backend {
        RetrievalBackend::None => run(gateway, Arc::new(NoRetrieval), ctx).await,
        RetrievalBackend::Web => {
            let web = WebSearchRetrieval::new(
                ctx.config.retrieval.region.clone(),
                Duration::from_secs(ctx.config.retrieval.timeout_seconds),
            );
            run(gateway, Arc::new(web), ctx).await
        }
        RetrievalBackend::Corpus => {
            let path = ctx
                .config
                .retrieval
                .corpus_path
                .clone()
                .ok_or_else(|| anyhow!("retrieval.corpus_path is not set"))?;
            let corpus = CorpusRetrieval::load(&path)?;
            run(gateway, Arc::new(corpus), ctx).await
        }
    }
}

async fn run<G, R>(gateway: Arc<G>, retrieval: Arc<R>, ctx: RunContext) -> Result<()>
where
    G: LlmGateway + 'static,
    R: RetrievalPort + 'static,
{
    // No transcript store: records would not outlive the process.
    let use_case = RunDeliberationUseCase::new(gateway, retrieval)
        .with_settings(ctx.config.to_settings())
        .with_conversation_logger(ctx.logger)
        .with_cancellation(ctx.cancel);

    if ctx.output == OutputFormat::Sse {
        let mut stream = use_case.stream(ctx.input)?;
        let mut stdout = std::io::stdout();
        let mut failure = None;
        while let Some(event) = stream.recv().await {
            if let Some(message) = write_sse_event(&mut stdout, &event)? {
                failure = Some(message);
            }
        }
        if let Some(message) = failure {
            bail!("deliberation failed: {}", message);
        }
        return Ok(());
    }

    let result = if ctx.quiet {
        use_case.execute(ctx.input).await
    } else {
        let progress = ProgressReporter::new();
        use_case.execute_with_progress(ctx.input, &progress).await
    };

    let record = match result {
        Ok(record) => record,
        Err(e) if e.is_cancelled() => bail!("deliberation cancelled"),
        Err(e) => return Err(e.into()),
    };

    let output = match ctx.output {
        OutputFormat::Transcript => ConsoleFormatter::format_transcript(&record),
        OutputFormat::Summary => ConsoleFormatter::format_summary(&record),
        OutputFormat::Json | OutputFormat::Sse => ConsoleFormatter::format_json(&record),
    };

    println!("{}", output);

    Ok(())
}
