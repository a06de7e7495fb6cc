//! Birdlog - identify birds from short recordings and keep a field log.
//!
//! Captured audio flows through [`audio::AudioBuffer`], is shaped into a
//! fixed-size tensor by [`audio::FeatureShaper`], scored by the classifier
//! behind [`inference::ModelHandle`] and interpreted into a ranked
//! [`inference::ClassificationResult`] by [`inference::ClassificationEngine`].
//! A [`session::RecordingSession`] owns one capture-to-result cycle and
//! [`journal::ObservationLog`] keeps what was identified.

#![warn(missing_docs)]

pub mod audio;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod inference;
pub mod journal;
pub mod locking;
pub mod output;
pub mod session;

use audio::{CaptureSource, FileCapture};
use clap::Parser;
use cli::{Cli, Command, ConfigAction, IdentifyArgs};
use config::{Config, config_file_path, load_default_config, save_default_config};
use error::ErrorKind;
use inference::{ClassificationEngine, LabelTable};
use journal::ObservationLog;
use output::progress;
use session::{RecordingSession, SessionState};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

pub use error::{Error, Result};

/// Main entry point for birdlog CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet);

    // Install Ctrl+C handler to clean up lock files on interrupt
    if let Err(e) = ctrlc::set_handler(|| {
        locking::cleanup_all_locks();
        std::process::exit(130); // 128 + SIGINT(2)
    }) {
        warn!("Failed to install Ctrl+C handler: {e}");
    }

    let config_override = cli.global.config.as_deref();

    match cli.command {
        Command::Config { action } => handle_config_command(action, config_override),
        Command::Identify(args) => {
            let config = load_default_config(config_override)?;
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(identify(args, config, cli.global.quiet))
        }
        Command::History { format } => {
            let config = load_default_config(config_override)?;
            let log = ObservationLog::from_config(&config.journal)?;
            let entries = log.entries()?;
            output::write_history(&entries, format, std::io::stdout().lock())
        }
        Command::Labels => {
            let config = load_default_config(config_override)?;
            handle_labels_command(&config)
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    // ORT logging stays off unless asked for with -v
    let filter_str = if quiet {
        "warn,ort=off".to_string()
    } else {
        match verbose {
            0 => "info,ort=off".to_string(),
            1 => "debug,ort=warn".to_string(),
            2 => "trace,ort=info".to_string(),
            _ => "trace".to_string(),
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn handle_labels_command(config: &Config) -> Result<()> {
    let labels = match &config.model.labels {
        Some(path) => LabelTable::from_file(path)?,
        None => LabelTable::default(),
    };
    for (index, label) in labels.iter().enumerate() {
        println!("{index:>3}  {label}");
    }
    Ok(())
}

/// Run one capture-to-result cycle over a recording.
async fn identify(mut args: IdentifyArgs, mut config: Config, quiet: bool) -> Result<()> {
    if let Some(path) = args.model_path.take() {
        config.model.path = Some(path);
    }
    if let Some(path) = args.labels_path.take() {
        config.model.labels = Some(path);
    }
    let location = args
        .location
        .take()
        .unwrap_or_else(|| config.journal.location.clone());

    let engine = Arc::new(ClassificationEngine::from_config(&config)?);
    let mut session = RecordingSession::new(Arc::clone(&engine), config.capture.clone());

    let sender = session.start()?;
    let source =
        FileCapture::new(&args.file, config.capture.chunk_size).realtime(args.realtime);
    if let Err(e) = source.run(sender).await {
        return conclude(&mut session, &engine, Err(e));
    }

    let spinner = progress::create_spinner("Identifying...", !quiet && !args.no_progress);
    let state = session.stop().await;
    progress::finish_progress(spinner);

    let outcome = match state {
        Err(e) => Err(e),
        Ok(SessionState::Completed) => record_result(&session, &config, &location, &args),
        Ok(_) => {
            let kind = session.failure_kind().unwrap_or(ErrorKind::Other);
            println!("Could not identify the bird. Please try again.");
            error!("Identification failed ({kind})");
            Err(Error::IdentificationFailed { kind })
        }
    };

    conclude(&mut session, &engine, outcome)
}

/// Release the model and return the session to idle, whatever the outcome.
///
/// The first error wins: a failed reset only surfaces when `outcome` is `Ok`.
fn conclude(
    session: &mut RecordingSession,
    engine: &ClassificationEngine,
    outcome: Result<()>,
) -> Result<()> {
    engine.model().release();
    let reset = session.reset();
    outcome.and(reset)
}

fn record_result(
    session: &RecordingSession,
    config: &Config,
    location: &str,
    args: &IdentifyArgs,
) -> Result<()> {
    let Some(result) = session.result() else {
        return Err(Error::Internal {
            message: "completed session has no result".to_string(),
        });
    };

    println!(
        "{} ({:.1}%)",
        result.label(),
        result.confidence() * 100.0
    );
    for alternative in result.ranked().iter().skip(1) {
        println!(
            "  {} ({:.1}%)",
            alternative.label,
            alternative.confidence * 100.0
        );
    }

    if args.no_save {
        return Ok(());
    }

    let log = ObservationLog::from_config(&config.journal)?;
    let clip = if args.keep_clip || config.journal.keep_clips {
        session.captured_audio()
    } else {
        None
    };
    let observation = log.record(result, location, clip)?;
    info!("Logged observation to {}", log.path().display());
    if let Some(path) = &observation.clip {
        println!("Clip saved: {}", path.display());
    }
    Ok(())
}

fn handle_config_command(action: ConfigAction, override_path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Init => {
            let path = config_file_path(override_path)?;
            if path.exists() {
                println!("Configuration file already exists: {}", path.display());
            } else {
                let saved_path = save_default_config(&Config::default(), override_path)?;
                println!("Created configuration file: {}", saved_path.display());
                println!("\nNext steps:");
                println!("  Set [model] path to your ONNX classifier in that file");
            }
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_default_config(override_path)?;
            let contents = toml::to_string_pretty(&config)
                .map_err(|e| Error::ConfigSerialize { source: e })?;
            println!("{contents}");
            Ok(())
        }
        ConfigAction::Path => {
            let path = config_file_path(override_path)?;
            println!("{}", path.display());
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use config::CaptureConfig;
    use inference::{ModelHandle, ScoringModel};

    struct Fixed;

    impl ScoringModel for Fixed {
        fn input_size(&self) -> usize {
            16
        }

        fn score(&mut self, _input: &[f32]) -> Result<Vec<f32>> {
            Ok(vec![0.1, 0.7, 0.05, 0.15])
        }
    }

    #[tokio::test]
    async fn test_conclude_releases_model_after_failed_record() {
        let model = ModelHandle::from_model(Box::new(Fixed));
        let engine = Arc::new(ClassificationEngine::new(
            Arc::new(model),
            LabelTable::default(),
            16,
            16_000,
        ));
        let mut session = RecordingSession::new(Arc::clone(&engine), CaptureConfig::default());

        let sender = session.start().unwrap();
        sender.push(vec![0.0; 64]).await.unwrap();
        assert_eq!(session.stop().await.unwrap(), SessionState::Completed);

        let failed = Err(Error::Internal {
            message: "journal unavailable".to_string(),
        });
        assert!(matches!(
            conclude(&mut session, &engine, failed),
            Err(Error::Internal { .. })
        ));
        assert!(!engine.model().is_loaded());
        assert_eq!(session.state(), SessionState::Idle);
    }
}
