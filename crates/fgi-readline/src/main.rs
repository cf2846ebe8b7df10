use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tracing_subscriber::EnvFilter;

use fgi_application::orchestrator::{CycleOutcome, CycleReport, TurnOutcome};
use fgi_application::{SessionUseCase, report_markdown, transcript_csv};
use fgi_core::session::Phase;
use fgi_interaction::OpenAIApiBackend;

const COMMANDS: &[&str] = &[
    "/config",
    "/persona",
    "/strategy",
    "/phase",
    "/advance",
    "/batch",
    "/stimulus",
    "/report",
    "/export",
    "/reset",
];

/// CLI helper for rustyline that provides completion, highlighting, and hints.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: COMMANDS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

fn print_status(usecase: &SessionUseCase) {
    let session = usecase.session();
    let progress = session.progress();
    println!(
        "{}",
        format!(
            "Phase: {} | Progress: {} of {} min ({}%, {}) | Personas: {}",
            session.phase.label(),
            progress.elapsed_minutes,
            session.config.target_duration_minutes,
            progress.percent,
            progress.stage.label(),
            session.personas.len(),
        )
        .bright_black()
    );
}

fn print_cycle(report: &CycleReport) {
    println!("{}", "[Moderator]".bright_magenta());
    for line in report.moderator.lines() {
        println!("{}", line.bright_blue());
    }
    println!();
    for participant in &report.participants {
        match &participant.outcome {
            TurnOutcome::Spoke(text) => {
                println!("{}", format!("[{}]", participant.name).bright_magenta());
                for line in text.lines() {
                    println!("{}", line.bright_blue());
                }
                println!();
            }
            TurnOutcome::Skipped(reason) => {
                println!(
                    "{}",
                    format!("[{}] (skipped: {})", participant.name, reason).yellow()
                );
            }
        }
    }
}

fn print_help() {
    println!("{}", "Commands:".bright_yellow());
    for line in [
        "/config [<topic> | <minutes> | <style 1-5>]  show or change the session setup",
        "/persona [list]                              list participants",
        "/persona add <Name>: <profile>               add or overwrite a participant",
        "/persona remove <Name>                       remove a participant",
        "/persona clear                               remove all participants",
        "/persona load <path>                         load a Name: profile roster file",
        "/strategy <text>                             brief the moderator (strategy phase)",
        "/phase                                       show phase and progress",
        "/phase next                                  advance to the next phase",
        "/advance                                     run one interview cycle",
        "/batch [n]                                   run n cycles (default 3)",
        "/stimulus <type> <content>                   present stimulus material",
        "/report                                      show the insight report (report phase)",
        "/export log|report                           write CSV transcript / Markdown report",
        "/reset [--keep-personas]                     start over",
        "quit                                         exit",
    ] {
        println!("  {}", line.bright_black());
    }
}

async fn handle_command(usecase: &mut SessionUseCase, input: &str) {
    let (command, rest) = match input.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (input, ""),
    };

    let result = match command {
        "/config" => config_command(usecase, rest),
        "/persona" => persona_command(usecase, rest),
        "/strategy" => strategy_command(usecase, rest).await,
        "/phase" => phase_command(usecase, rest),
        "/advance" => advance_command(usecase).await,
        "/batch" => batch_command(usecase, rest).await,
        "/stimulus" => stimulus_command(usecase, rest).await,
        "/report" => report_command(usecase).await,
        "/export" => export_command(usecase, rest),
        "/reset" => {
            usecase.reset(rest == "--keep-personas");
            println!("{}", "Session reset.".bright_green());
            Ok(())
        }
        "/help" => {
            print_help();
            Ok(())
        }
        _ => {
            // Free text during the strategy phase goes straight to the
            // moderator briefing, matching the planning-chat workflow.
            if !command.starts_with('/') && usecase.session().phase == Phase::Strategy {
                strategy_command(usecase, input).await
            } else {
                println!("{}", "Unknown command (try /help)".bright_black());
                Ok(())
            }
        }
    };

    if let Err(err) = result {
        eprintln!("{}", format!("{err}").red());
    }

    print_status(usecase);
}

fn config_command(usecase: &mut SessionUseCase, rest: &str) -> fgi_core::error::Result<()> {
    if rest.is_empty() {
        let config = &usecase.session().config;
        println!(
            "{}",
            format!(
                "Topic: {} | Target: {} min | Style level: {}",
                config.topic, config.target_duration_minutes, config.style_level
            )
            .bright_blue()
        );
        return Ok(());
    }

    let parts: Vec<&str> = rest.split('|').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(fgi_core::FgiError::validation(
            "usage: /config <topic> | <minutes> | <style 1-5>",
        ));
    }
    let minutes: u32 = parts[1]
        .parse()
        .map_err(|_| fgi_core::FgiError::validation("minutes must be a number"))?;
    let style: u8 = parts[2]
        .parse()
        .map_err(|_| fgi_core::FgiError::validation("style must be a number from 1 to 5"))?;

    usecase.configure(parts[0], minutes, style)?;
    println!("{}", "Configuration updated.".bright_green());
    Ok(())
}

fn persona_command(usecase: &mut SessionUseCase, rest: &str) -> fgi_core::error::Result<()> {
    let (sub, args) = match rest.split_once(char::is_whitespace) {
        Some((sub, args)) => (sub, args.trim()),
        None => (rest, ""),
    };

    match sub {
        "" | "list" => {
            let personas = usecase.session().personas.list();
            if personas.is_empty() {
                println!("{}", "No participants registered.".bright_black());
            }
            for persona in personas {
                println!(
                    "{}",
                    format!("- {}: {}", persona.name, persona.profile).bright_blue()
                );
            }
            Ok(())
        }
        "add" => {
            let (name, profile) = args.split_once(':').ok_or_else(|| {
                fgi_core::FgiError::validation("usage: /persona add <Name>: <profile>")
            })?;
            usecase.add_persona(name.trim(), profile.trim())?;
            println!("{}", format!("Added {}.", name.trim()).bright_green());
            Ok(())
        }
        "remove" => {
            usecase.remove_persona(args);
            println!("{}", format!("Removed {args}.").bright_green());
            Ok(())
        }
        "clear" => {
            usecase.clear_personas();
            println!("{}", "All participants removed.".bright_green());
            Ok(())
        }
        "load" => {
            let text = std::fs::read_to_string(Path::new(args))?;
            let count = usecase.load_roster(&text)?;
            println!("{}", format!("Loaded {count} participants.").bright_green());
            Ok(())
        }
        _ => Err(fgi_core::FgiError::validation(
            "usage: /persona [list|add|remove|clear|load]",
        )),
    }
}

async fn strategy_command(usecase: &mut SessionUseCase, text: &str) -> fgi_core::error::Result<()> {
    let ack = usecase.submit_strategy(text).await?;
    println!("{}", "[Moderator]".bright_magenta());
    for line in ack.lines() {
        println!("{}", line.bright_blue());
    }
    Ok(())
}

fn phase_command(usecase: &mut SessionUseCase, rest: &str) -> fgi_core::error::Result<()> {
    match rest {
        "" => Ok(()),
        "next" => {
            let phase = usecase.advance_phase()?;
            println!(
                "{}",
                format!("Entered the {} phase.", phase.label()).bright_green()
            );
            if phase == Phase::Report {
                println!("{}", "Run /report to synthesize the insights.".bright_black());
            }
            Ok(())
        }
        _ => Err(fgi_core::FgiError::validation("usage: /phase [next]")),
    }
}

async fn advance_command(usecase: &mut SessionUseCase) -> fgi_core::error::Result<()> {
    let report = usecase.advance_cycle().await?;
    print_cycle(&report);
    Ok(())
}

async fn batch_command(usecase: &mut SessionUseCase, rest: &str) -> fgi_core::error::Result<()> {
    let cycles = if rest.is_empty() {
        None
    } else {
        Some(rest.parse::<usize>().map_err(|_| {
            fgi_core::FgiError::validation("usage: /batch [number of cycles]")
        })?)
    };

    let report = usecase.advance_batch(cycles).await?;
    for outcome in &report.cycles {
        match outcome {
            CycleOutcome::Completed(cycle) => print_cycle(cycle),
            CycleOutcome::Skipped { reason } => {
                println!("{}", format!("(cycle skipped: {reason})").yellow());
            }
        }
    }
    println!(
        "{}",
        format!("{} of {} cycles completed.", report.completed(), report.cycles.len())
            .bright_black()
    );
    Ok(())
}

async fn stimulus_command(usecase: &mut SessionUseCase, rest: &str) -> fgi_core::error::Result<()> {
    let (stimulus_type, content) = rest.split_once(char::is_whitespace).ok_or_else(|| {
        fgi_core::FgiError::validation("usage: /stimulus <type> <content>")
    })?;

    let record = usecase.present_stimulus(stimulus_type, content.trim()).await?;
    println!("{}", "[Moderator]".bright_magenta());
    for line in record.content.as_log_text().lines() {
        println!("{}", line.bright_blue());
    }
    Ok(())
}

async fn report_command(usecase: &mut SessionUseCase) -> fgi_core::error::Result<()> {
    let analysis = usecase.report().await?;
    println!("{}", "=== Insight Report ===".bright_yellow().bold());
    for line in analysis.lines() {
        println!("{}", line.bright_blue());
    }
    Ok(())
}

fn export_command(usecase: &mut SessionUseCase, rest: &str) -> fgi_core::error::Result<()> {
    let export = match rest {
        "log" => transcript_csv(usecase.session())?,
        "report" => report_markdown(usecase.session())?,
        _ => {
            return Err(fgi_core::FgiError::validation("usage: /export log|report"));
        }
    };
    let path = export.write_to(Path::new("."))?;
    println!(
        "{}",
        format!("Wrote {}.", path.display()).bright_green()
    );
    Ok(())
}

/// Entry point of the FGI simulator REPL.
///
/// Initializes tracing, builds the OpenAI-backed session use case from the
/// environment, and processes operator commands strictly one at a time.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let backend = Arc::new(OpenAIApiBackend::try_from_env()?);
    let mut usecase = SessionUseCase::new(backend);

    let helper = CliHelper::new();
    let mut rl = Editor::new()?;
    rl.set_helper(Some(helper));

    println!("{}", "=== FGI Simulator ===".bright_magenta().bold());
    println!(
        "{}",
        "Brief the moderator, add participants with /persona, then /phase next to start. /help for all commands."
            .bright_black()
    );
    println!();
    print_status(&usecase);

    loop {
        let readline = rl.readline(">> ");

        match readline {
            Ok(line) => {
                let trimmed = line.trim();

                if trimmed == "quit" || trimmed == "exit" {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }

                if trimmed.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(&line);

                handle_command(&mut usecase, trimmed).await;
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    Ok(())
}
