//! StoryForge - conversation to issue-tracker pipeline
//!
//! CLI entry point for interviews, transcript parsing and project creation.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, info};

use storyforge::cli::{Cli, Command, generate_after_help, get_log_path};
use storyforge::config::Config;
use storyforge::llm::{LlmClient, create_client};
use storyforge::plan::{Extraction, PlanExtractor, PlanSource, parse_markdown};
use storyforge::prompts::PromptLoader;
use storyforge::session::{Session, SessionSettings};
use storyforge::tracker::{CreatedProject, DryRunTracker, IssueKind, JiraClient, Tracker, TrackerCall};
use storyforge::{Materializer, PipelineError};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level).map(|s| s.to_uppercase()) {
        Some(s) => match s.as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(cli.log_level.as_deref(), config.log_level.as_deref()).context("Failed to setup logging")?;
    info!(provider = %config.llm.provider, "StoryForge loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Chat { create, dry_run }) => {
            debug!(create, dry_run, "main: matched Chat command");
            cmd_chat(&config, create, dry_run).await
        }
        Some(Command::Parse { file }) => {
            debug!(?file, "main: matched Parse command");
            cmd_parse(&file)
        }
        Some(Command::Extract { file }) => {
            debug!(?file, "main: matched Extract command");
            cmd_extract(&config, &file).await
        }
        Some(Command::Create { file, dry_run }) => {
            debug!(?file, dry_run, "main: matched Create command");
            cmd_create(&config, &file, dry_run).await
        }
        None => {
            debug!("main: no command specified, starting chat");
            cmd_chat(&config, false, false).await
        }
    }
}

/// Tracker chosen by the `--dry-run` flag
enum TrackerChoice {
    DryRun(DryRunTracker),
    Jira(JiraClient),
}

impl TrackerChoice {
    fn from_config(config: &Config, dry_run: bool) -> Result<Self> {
        if dry_run {
            debug!("TrackerChoice::from_config: dry run");
            return Ok(Self::DryRun(DryRunTracker::new()));
        }
        config.validate_tracker()?;
        let client = JiraClient::from_config(&config.tracker).context("Failed to create tracker client")?;
        Ok(Self::Jira(client))
    }

    fn as_tracker(&self) -> &dyn Tracker {
        match self {
            Self::DryRun(t) => t,
            Self::Jira(t) => t,
        }
    }

    /// Print recorded calls for a dry run
    fn report(&self) {
        let Self::DryRun(tracker) = self else {
            return;
        };
        println!("{}", "Dry run, no tracker calls were sent:".dimmed());
        for call in tracker.calls() {
            match call {
                TrackerCall::CreateProject(p) => println!("  project  {} {}", p.key.bright_cyan(), p.name),
                TrackerCall::CreateIssue(i) => {
                    let indent = match i.kind {
                        IssueKind::Epic => "  ",
                        IssueKind::Story => "    ",
                        IssueKind::Subtask => "      ",
                    };
                    println!("{}{:?} {}", indent, i.kind, i.summary);
                }
            }
        }
    }
}

fn read_transcript(path: &Path) -> Result<String> {
    fs::read_to_string(path).context(format!("Failed to read transcript {}", path.display()))
}

fn prompt_loader(config: &Config) -> Result<Arc<PromptLoader>> {
    let cwd = std::env::current_dir()?;
    Ok(Arc::new(PromptLoader::new(cwd, config.session.prompts_dir.clone())))
}

fn llm_client(config: &Config) -> Result<Arc<dyn LlmClient>> {
    config.validate_llm()?;
    create_client(&config.llm).context("Failed to create LLM client")
}

fn print_created(project: &CreatedProject) {
    println!(
        "\n{} Project {} ({}) created",
        "✓".bright_green(),
        project.key.bright_cyan(),
        project.name
    );
}

/// Offline heading parse of a transcript file
fn cmd_parse(file: &Path) -> Result<()> {
    debug!(?file, "cmd_parse: called");
    let plan = parse_markdown(&read_transcript(file)?);
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

async fn extract_from_file(config: &Config, file: &Path) -> Result<Extraction> {
    let transcript = read_transcript(file)?;
    let extractor = PlanExtractor::new(llm_client(config)?, prompt_loader(config)?, config.llm.extraction.clone());
    let extraction = extractor.extract(&transcript).await?;
    if extraction.truncated {
        eprintln!("{}", "Model response hit the token limit (llm.extraction.max-tokens)".yellow());
    }
    if extraction.source == PlanSource::Fallback {
        eprintln!("{}", "Model output was not a valid plan; used the heading parser".yellow());
    }
    Ok(extraction)
}

async fn cmd_extract(config: &Config, file: &Path) -> Result<()> {
    debug!(?file, "cmd_extract: called");
    let extraction = extract_from_file(config, file).await?;
    println!("{}", serde_json::to_string_pretty(&extraction.plan)?);
    Ok(())
}

async fn cmd_create(config: &Config, file: &Path, dry_run: bool) -> Result<()> {
    debug!(?file, dry_run, "cmd_create: called");
    let tracker = TrackerChoice::from_config(config, dry_run)?;
    let extraction = extract_from_file(config, file).await?;
    println!(
        "Creating {} with {} issues...",
        extraction.plan.key.bright_cyan(),
        extraction.plan.issue_count()
    );

    let result = Materializer::new(tracker.as_tracker()).materialize(extraction.plan).await;
    tracker.report();
    let project = result?;
    print_created(&project);
    Ok(())
}

/// Interactive requirements interview
async fn cmd_chat(config: &Config, create: bool, dry_run: bool) -> Result<()> {
    debug!(create, dry_run, "cmd_chat: called");
    let llm = llm_client(config)?;
    if create && !dry_run {
        config.validate_tracker()?;
    }
    let mut session = Session::new(llm, prompt_loader(config)?, SessionSettings::from(config));
    let transcript_path = config.session.transcript_path.clone();

    print_welcome();
    let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

    loop {
        let readline = rl.readline(&format!("{} ", ">".bright_green()));
        let line = match readline {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!();
                break;
            }
            Err(err) => return Err(eyre::eyre!("Readline error: {}", err)),
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(input);

        match input {
            "/quit" | "/q" | "/exit" => break,
            "/help" | "/h" => print_help(),
            "/transcript" => show_transcript(&session, transcript_path.as_deref()),
            "/create" => {
                if create_from_session(&session, config, dry_run).await {
                    break;
                }
            }
            _ if input.starts_with('/') => {
                println!("{} Unknown command: {}", "?".yellow(), input);
            }
            _ => match session.submit_turn(input).await {
                Ok(reply) => {
                    println!("\n{}\n", reply.response);
                    if reply.is_complete {
                        println!("{}", "Interview complete.".bright_cyan());
                        if create {
                            create_from_session(&session, config, dry_run).await;
                            break;
                        }
                        println!("Type {} to create the project or {} to exit", "/create".yellow(), "/quit".yellow());
                    }
                }
                Err(e) => print_pipeline_error(&e),
            },
        }
    }

    println!("Goodbye!");
    Ok(())
}

/// Run the pipeline for a chat session; true when the project was created
async fn create_from_session(session: &Session, config: &Config, dry_run: bool) -> bool {
    if session.conversation().is_empty() {
        println!("{}", "Nothing to create yet, describe your project first.".dimmed());
        return false;
    }
    let tracker = match TrackerChoice::from_config(config, dry_run) {
        Ok(tracker) => tracker,
        Err(e) => {
            println!("{} {}", "✗".bright_red(), e);
            return false;
        }
    };
    println!("{}", "Extracting project plan...".dimmed());
    let result = session.run_pipeline(tracker.as_tracker()).await;
    tracker.report();
    match result {
        Ok(project) => {
            print_created(&project);
            true
        }
        Err(e) => {
            print_pipeline_error(&e);
            false
        }
    }
}

fn show_transcript(session: &Session, path: Option<&Path>) {
    match session.generate_transcript() {
        Ok(markdown) => {
            println!("\n{}", markdown);
            if let Some(path) = path {
                println!("{} {}", "Saved to".dimmed(), path.display());
            }
        }
        Err(e) => print_pipeline_error(&e),
    }
}

fn print_pipeline_error(err: &PipelineError) {
    println!("{} {}", "✗".bright_red(), err);
}

fn print_welcome() {
    println!();
    println!("{}", "StoryForge requirements interview".bright_cyan().bold());
    println!("Describe the project you want to build.");
    println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
    println!();
}

fn print_help() {
    println!();
    println!("{}", "Available Commands:".bright_cyan());
    println!("  {:14} Show this help", "/help".yellow());
    println!("  {:14} Show and save the transcript", "/transcript".yellow());
    println!("  {:14} Extract the plan and create the project", "/create".yellow());
    println!("  {:14} Exit", "/quit".yellow());
    println!();
}
