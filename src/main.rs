use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

mod cli;
mod config;

use cli::Cli;
use cli::commands::{Commands, SettingsCommands};
use config::Config;
use xue::coordination::ControlSignals;
use xue::domain::{EngineEvent, LanguageLabel, LearningObject, Phase, SessionMode};
use xue::runner::PlaybackEngine;
use xue::selection::selection_probabilities;
use xue::settings::{Settings, SettingsHandle};
use xue::store::{self, Collection};
use xue::XueError;

fn setup_logging(level: &str) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("xue")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("xue.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        None => handle_play_command(SessionMode::Normal, None, config).await,
        Some(Commands::Play { mode, dir }) => handle_play_command(*mode, dir.as_deref(), config).await,
        Some(Commands::List { flagged, dir }) => handle_list_command(*flagged, dir.as_deref(), config),
        Some(Commands::Show { path }) => handle_show_command(path),
        Some(Commands::Flag { path }) => handle_flag_command(path),
        Some(Commands::Settings { command }) => handle_settings_command(command.as_ref(), config),
    }
}

async fn handle_play_command(mode: SessionMode, dir: Option<&Path>, config: &Config) -> Result<()> {
    let dir = dir.unwrap_or_else(|| config.library.dir_for(mode));
    info!("Starting {} session from {}", mode, dir.display());

    let collection = Collection::load_dir(dir).context(format!("Failed to load learning objects from {}", dir.display()))?;
    let settings = SettingsHandle::load(&config.library.settings_file).context("Failed to load settings")?;
    let audio = config.audio.backend.open().context("Failed to open audio output")?;

    let engine = PlaybackEngine::new(collection, audio, settings.clone(), mode)
        .with_timing(config.engine.timing())
        .with_scratch_dir(&config.library.scratch_dir);

    let (handle, mut events) = match engine.spawn() {
        Ok(session) => session,
        Err(XueError::EmptyCollection) => {
            let what = if mode == SessionMode::Focused { "flagged learning objects" } else { "learning objects" };
            println!("{} No {} found in {}", "Nothing to play:".yellow(), what, dir.display());
            return Ok(());
        }
        Err(e) => return Err(e).context("Failed to start session"),
    };

    println!(
        "{} {} mode, {} picker. {}",
        "Session:".green(),
        mode,
        settings.snapshot().picker_mode,
        "[p] pause/resume  [s] skip  [f] flag  [q] quit".dimmed()
    );
    spawn_input_thread(handle.signals()).context("Failed to start input thread")?;

    while let Some(event) = events.recv().await {
        let stopped = matches!(event, EngineEvent::Stopped);
        render_event(&event, &settings.snapshot());
        if stopped {
            break;
        }
    }

    let report = handle.join().await.context("Session ended abnormally")?;
    println!(
        "\n{} {} played, {} failed, {} write failure(s)",
        "Done:".green(),
        report.items_played,
        report.items_failed,
        report.write_failures
    );
    Ok(())
}

/// Read single-letter commands from stdin on a dedicated thread
fn spawn_input_thread(signals: Arc<ControlSignals>) -> io::Result<()> {
    thread::Builder::new().name("xue-input".to_string()).spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match line.trim() {
                "p" if signals.is_paused() => signals.resume(),
                "p" => signals.pause(),
                "s" => signals.request_skip(),
                "f" => signals.request_flag_toggle(),
                "q" => break,
                "" => {}
                other => eprintln!("{} {}", "Unknown command:".red(), other),
            }
        }
        // EOF or quit
        signals.request_stop();
    })?;
    Ok(())
}

fn side_text(object: &LearningObject, language: LanguageLabel, settings: &Settings) -> String {
    match language {
        LanguageLabel::English => object.prompt_text.clone(),
        LanguageLabel::Native if settings.show_native && !object.native_text.is_empty() => {
            format!("{}  {}", object.answer_text, object.native_text)
        }
        LanguageLabel::Native => object.answer_text.clone(),
    }
}

fn render_event(event: &EngineEvent, settings: &Settings) {
    match event {
        EngineEvent::ItemStarted { object, direction } => {
            let flag = if object.flagged { " ⚑".yellow().to_string() } else { String::new() };
            println!(
                "\n{} {}{} {}",
                "▶".green(),
                object.display_name().bold(),
                flag,
                format!("[{}, played {}]", direction, object.stats.times_played).dimmed()
            );
        }
        EngineEvent::PhaseStarted { object, phase, language } => {
            let label = match phase {
                Phase::Learning => "learn ".cyan(),
                Phase::Reviewing => "review".magenta(),
            };
            println!("  {} {}", label, side_text(object, *language, settings));
        }
        EngineEvent::Progress { fraction_remaining, .. } => {
            let width = 30;
            let filled = (fraction_remaining * width as f64).round() as usize;
            print!(
                "\r  {}{} ",
                "█".repeat(filled.min(width)).blue(),
                "░".repeat(width - filled.min(width)).dimmed()
            );
            let _ = io::stdout().flush();
        }
        EngineEvent::FlagToggled { flagged, .. } => {
            let text = if *flagged { "flagged" } else { "unflagged" };
            println!("\n  {} {}", "⚑".yellow(), text);
        }
        EngineEvent::ItemFinished { outcome, .. } => {
            println!("\r  {}{}", format!("{:?}", outcome).to_lowercase().dimmed(), " ".repeat(30));
        }
        EngineEvent::FlagSaveFailed { path, error }
        | EngineEvent::ItemFailed { path, error }
        | EngineEvent::WriteBackFailed { path, error } => {
            println!("\n  {} {}: {}", "✗".red(), path.display(), error);
        }
        EngineEvent::Stopped => println!("{}", "Stopped".yellow()),
    }
}

fn handle_list_command(flagged: bool, dir: Option<&Path>, config: &Config) -> Result<()> {
    let dir = dir.unwrap_or(config.library.objects_dir.as_path());
    info!("Listing {} (flagged only: {})", dir.display(), flagged);

    let mut collection = Collection::load_dir(dir).context(format!("Failed to load learning objects from {}", dir.display()))?;
    if flagged {
        collection = collection.flagged_only();
    }
    if collection.is_empty() {
        println!("{}", "No learning objects".yellow());
        return Ok(());
    }

    let probabilities = selection_probabilities(&collection)?;
    println!(
        "{:<2} {:<32} {:>6} {:>8} {:>7}  {}",
        "", "prompt", "plays", "wrong", "p(w)", "last played"
    );
    for (object, p) in collection.iter().zip(probabilities) {
        let last = object
            .stats
            .last_played
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "{:<2} {:<32} {:>6} {:>8} {:>7.3}  {}",
            if object.flagged { "⚑".yellow().to_string() } else { String::new() },
            object.display_name(),
            object.stats.times_played,
            object.stats.times_incorrect,
            p,
            last.dimmed()
        );
    }
    Ok(())
}

fn handle_show_command(path: &Path) -> Result<()> {
    let object = store::load(path).context(format!("Failed to load {}", path.display()))?;
    let entries = store::entry_names(path)?;

    println!("{} {}", "Object:".green(), path.display());
    println!("  english:  {}", object.prompt_text);
    println!("  pinyin:   {}", object.answer_text);
    println!("  native:   {}", object.native_text);
    println!("  language: {}", object.language);
    if !object.tags.is_empty() {
        println!("  tags:     {}", object.tags.join(", "));
    }
    println!("  flagged:  {}", object.flagged);
    println!("  schema:   {}", object.schema_version);
    println!(
        "  stats:    played {}, correct {}, incorrect {}",
        object.stats.times_played, object.stats.times_correct, object.stats.times_incorrect
    );
    println!("  entries:  {}", entries.join(", "));
    Ok(())
}

fn handle_flag_command(path: &Path) -> Result<()> {
    info!("Toggling flag on {}", path.display());
    let flagged = store::toggle_flag(path).context(format!("Failed to flag {}", path.display()))?;
    let text = if flagged { "Flagged:".yellow() } else { "Unflagged:".green() };
    println!("{} {}", text, path.display());
    Ok(())
}

fn handle_settings_command(command: Option<&SettingsCommands>, config: &Config) -> Result<()> {
    let settings = SettingsHandle::load(&config.library.settings_file).context("Failed to load settings")?;

    match command.unwrap_or(&SettingsCommands::Show) {
        SettingsCommands::Show => {}
        SettingsCommands::CyclePicker => {
            settings.cycle_picker()?;
        }
        SettingsCommands::BumpInstructionDelay => {
            settings.bump_instruction_delay()?;
        }
        SettingsCommands::BumpQuizInterval => {
            settings.bump_quiz_interval()?;
        }
        SettingsCommands::ToggleNative => {
            settings.toggle_show_native()?;
        }
        SettingsCommands::SecondsPerChar { value } => {
            settings.set_seconds_per_char(*value)?;
        }
    }

    let current = settings.snapshot();
    println!("{} {}", "Settings:".green(), config.library.settings_file.display());
    println!("  picker:            {}", current.picker_mode);
    println!("  instruction delay: {}s", current.instruction_delay);
    println!("  quiz interval:     {}s", current.quiz_interval);
    println!("  show native:       {}", current.show_native);
    println!("  seconds per char:  {}", current.seconds_per_char);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    let level = if cli.is_verbose() {
        "debug"
    } else {
        config.log_level.as_deref().unwrap_or("info")
    };
    setup_logging(level).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
