use anyhow::Result;
use clap::{CommandFactory, Parser};
use meetscribe::cli::{Cli, Commands, ConfigAction};
use meetscribe::config::Config;
use meetscribe::diagnostics::check_dependencies;
use meetscribe::error::MeetscribeError;
use meetscribe::models::list_models;
use meetscribe::output;
use meetscribe::paths;
use meetscribe::pipeline::{PipelineOptions, default_pipeline};
use owo_colors::OwoColorize;
use std::cell::RefCell;
use std::path::Path;
use std::process::exit;
use std::rc::Rc;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None => {
            let Some(audio_file) = cli.audio_file else {
                Cli::command().print_help()?;
                exit(2);
            };
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(model) = cli.model {
                config.model = model;
            }
            if let Some(dir) = cli.output_dir {
                config.paths.output_dir = Some(dir);
            }
            let options = PipelineOptions {
                use_gpu: !cli.cpu,
                diarize: !cli.no_diarize,
                cleanup: !cli.no_cleanup,
                show_progress: !cli.no_progress,
                debug: cli.debug,
                language: cli.language,
            };
            run_transcription(&audio_file, &config, &options);
        }
        Some(Commands::Models) => {
            let config = load_config(cli.config.as_deref())?;
            print_model_catalog(&config);
        }
        Some(Commands::Config { action }) => {
            handle_config_command(action, cli.config.as_deref())?;
        }
        Some(Commands::Check) => {
            let config = load_config(cli.config.as_deref())?;
            check_dependencies(&config);
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "meetscribe",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

/// Load configuration and apply `MEETSCRIBE_*` environment overrides.
///
/// Priority order:
/// 1. Explicit `--config` path
/// 2. `meetscribe.json` in the current directory
/// 3. `meetscribe.json` next to the executable
/// 4. The per-user config file
/// 5. Built-in defaults
fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    Ok(Config::load_search(custom_path)?.with_env_overrides()?)
}

/// Run the pipeline on one recording, print the transcript, and save it.
///
/// Degraded stages (diarization) recover on their own; anything that reaches
/// this function as an error is fatal and names the stage that raised it.
fn run_transcription(audio: &Path, config: &Config, options: &PipelineOptions) {
    if !audio.exists() {
        eprintln!(
            "{}",
            format!("ERROR: File not found: {}", audio.display()).red()
        );
        exit(1);
    }

    // Track the running stage so a failure can name it
    let current_stage = Rc::new(RefCell::new(String::from("Pipeline")));
    let tracker = Rc::clone(&current_stage);
    let pipeline = default_pipeline(config, options)
        .on_stage_start(move |name| *tracker.borrow_mut() = name.to_string());

    match pipeline.run(audio) {
        Ok(segments) => {
            output::print_transcript(&segments);
            match output::write_transcript(&segments, audio, &paths::output_dir(&config.paths)) {
                Ok(path) => output::print_saved_footer(&path),
                Err(e) => {
                    eprintln!("{}", format!("Failed to save transcript: {e}").red());
                    exit(1);
                }
            }
        }
        Err(e) => report_failure(&current_stage.borrow(), &e),
    }
}

/// Print a fatal pipeline error and exit.
fn report_failure(stage: &str, error: &MeetscribeError) -> ! {
    eprintln!("{}", format!("\n{stage} failed: {error}").red());
    if let MeetscribeError::Whisper { stderr, .. } = error
        && !stderr.is_empty()
    {
        eprintln!("{}", stderr.dimmed());
    }
    exit(1);
}

/// Print the model catalog, marking the configured model and whether each
/// model's weights are on disk.
fn print_model_catalog(config: &Config) {
    let models_dir = paths::whisper_cpp_models(&config.paths);
    println!("Models (current: {}):", config.model.green());
    for m in list_models() {
        let installed = if models_dir.join(m.file).is_file() {
            "installed".green().to_string()
        } else {
            "not installed".dimmed().to_string()
        };
        if m.name == config.model.as_str() {
            println!(
                "  {} {} ({}MB, {}) {}",
                "●".green(),
                m.name,
                m.size_mb,
                installed,
                m.description
            );
        } else {
            println!("  ○ {} ({}MB, {}) {}", m.name, m.size_mb, installed, m.description);
        }
    }
    println!("\nWeights directory: {}", models_dir.display());
}

fn handle_config_command(action: ConfigAction, custom_path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(custom_path)?;
            println!("{}", config.to_json_pretty()?);
        }
        ConfigAction::Dump => {
            println!("{}", Config::default().to_json_pretty()?);
        }
        ConfigAction::Path => {
            println!("{}", Config::default_path().display());
        }
    }
    Ok(())
}
