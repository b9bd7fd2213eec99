//! # purity_study_cli
//!
//! Part of the purity_study crate family.
//!
//! Command line application which extracts the electron lifetime from an HDF5 file of
//! reconstructed tracks and writes the lifetime corrected dE/dx histograms.
//!
//! ## Use
//!
//! ```bash
//! purity_study_cli /path/to/tracks.h5
//! ```
//!
//! The histograms are written to `results.h5` and a summary to `results.yml` in the
//! current directory.
use clap::{Arg, Command};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;

use libpurity_study::config::Config;
use libpurity_study::process::process;
use libpurity_study::worker_status::{Pass, WorkerStatus};

/// Resolution of the progress bars
const BAR_LENGTH: u64 = 1000;

fn make_bar(pb_manager: &MultiProgress, pass: Pass) -> ProgressBar {
    let pb = pb_manager.add(ProgressBar::new(BAR_LENGTH));
    let template = "{prefix:>10} [{bar:40.cyan/blue}] {percent:>3}%";
    if let Ok(style) = ProgressStyle::with_template(template) {
        pb.set_style(style.progress_chars("=> "));
    }
    pb.set_prefix(pass.to_string());
    pb
}

fn main() -> ExitCode {
    // Create a cli
    let matches = Command::new("purity_study_cli")
        .about("Measure the electron lifetime and the corrected dE/dx from TPC tracks")
        .arg(
            Arg::new("input")
                .required(true)
                .help("Path to the HDF5 file of reconstructed tracks"),
        )
        .get_matches();

    // Initialize feedback
    let logger = simplelog::TermLogger::new(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );

    let pb_manager = MultiProgress::new();

    if let Err(e) = LogWrapper::new(pb_manager.clone(), logger).try_init() {
        eprintln!("Could not create logging/progress: {e}");
        return ExitCode::FAILURE;
    }

    // Parse the cli
    let input_path = match matches.get_one::<String>("input") {
        Some(p) => PathBuf::from(p),
        None => {
            log::error!("No input file name specified! Aborting.");
            return ExitCode::FAILURE;
        }
    };
    let config = Config::with_input(&input_path);
    log::info!("Input Path: {}", config.input_path.to_string_lossy());
    log::info!("Output Path: {}", config.output_path.to_string_lossy());
    log::info!("Summary Path: {}", config.get_summary_path().to_string_lossy());

    // Setup the progress bars
    let lifetime_bar = make_bar(&pb_manager, Pass::Lifetime);
    let correction_bar = make_bar(&pb_manager, Pass::Correction);
    let (tx, rx) = mpsc::channel::<WorkerStatus>();

    // Spawn the task!
    let handle = std::thread::spawn(move || process(config, tx));

    loop {
        // No UI to repaint, so just check in a few times a second
        std::thread::sleep(std::time::Duration::from_millis(250));
        for status in rx.try_iter() {
            let position = (status.progress * BAR_LENGTH as f32) as u64;
            match status.pass {
                Pass::Lifetime => lifetime_bar.set_position(position),
                Pass::Correction => correction_bar.set_position(position),
            }
        }

        if handle.is_finished() {
            break;
        }
    }

    lifetime_bar.finish();
    correction_bar.finish();

    match handle.join() {
        Ok(Ok(summary)) => {
            log::info!(
                "Electron Lifetime: {:.2} +- {:.2} ms",
                summary.lifetime_ms,
                summary.lifetime_uncertainty_ms
            );
            log::info!(
                "Used {} of {} tracks.",
                summary.correction_pass_tracks,
                summary.total_tracks
            );
            log::info!("Done.");
            ExitCode::SUCCESS
        }
        Ok(Err(e)) => {
            log::error!("Analysis failed with error: {e}");
            ExitCode::FAILURE
        }
        Err(_) => {
            log::error!("Failed to join analysis task!");
            ExitCode::FAILURE
        }
    }
}
