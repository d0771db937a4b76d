use clap::{Arg, ArgAction, Command};
use indicatif::{MultiProgress, ProgressBar};
use indicatif_log_bridge::LogWrapper;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use libptm_scanner::config::Config;
use libptm_scanner::plot_maker::{HistStore, PlotMaker};

fn make_template_config(path: &Path) {
    let config = Config::default();
    let yaml_str = serde_yaml::to_string(&config).unwrap();
    let mut file = File::create(path).expect("Could create template config file!");
    file.write_all(yaml_str.as_bytes())
        .expect("Failed to write yaml data to file!");
}

fn main() {
    // Create a cli
    let matches = Command::new("ptm_scanner_cli")
        .arg_required_else_help(true)
        .subcommand(Command::new("new").about("Make a template configuration yaml file"))
        .arg(
            Arg::new("path")
                .short('p')
                .long("path")
                .help("Path to the config file"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable debug printouts"),
        )
        .get_matches();

    // Initialize feedback
    let log_level = if matches.get_flag("verbose") {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };
    let logger = simplelog::TermLogger::new(
        log_level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );

    let pb_manager = MultiProgress::new();

    LogWrapper::new(pb_manager.clone(), logger)
        .try_init()
        .expect("Could not create logging/progress!");

    // Parse the cli
    let config_path = PathBuf::from(matches.get_one::<String>("path").expect("We require args"));

    if let Some(("new", _)) = matches.subcommand() {
        log::info!(
            "Making a template config at {}...",
            config_path.to_string_lossy()
        );

        make_template_config(&config_path);
        log::info!("Done.");
        return;
    }

    // Load our config
    log::info!("Loading config from {}...", config_path.to_string_lossy());
    let config = match Config::read_config_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{e}");
            return;
        }
    };
    log::info!("Config successfully loaded.");
    log::info!("Job Name: {}", config.job_name);
    log::info!("Data Path: {}", config.data_path.to_string_lossy());
    log::info!("Output Path: {}", config.output_path.to_string_lossy());
    log::info!(
        "Target hists: {} PTM virtual hists: {} Scanner plots: {}",
        config.make_target_hists,
        config.make_ptm_virtual_hists,
        config.make_scanner_plots
    );
    log::info!(
        "Signal conversion: {} V/MeV Total signal err: {}",
        config.signal_conversion_const,
        config.total_signal_err
    );

    if !config.any_plots_enabled() {
        log::warn!("No plot groups are enabled in the config; nothing to do.");
        return;
    }

    let n_passes = [
        config.make_target_hists,
        config.make_ptm_virtual_hists,
        config.make_scanner_plots,
    ]
    .iter()
    .filter(|enabled| **enabled)
    .count() as u64;
    let pb = pb_manager.add(ProgressBar::new(n_passes));

    let mut maker = PlotMaker::new(config.clone());
    if let Err(e) = maker.gather_chains() {
        log::error!("{e}");
        return;
    }
    if let Err(e) = std::fs::create_dir_all(&config.output_path) {
        log::error!("{e}");
        return;
    }

    let mut store = HistStore::new();
    if config.make_target_hists {
        if let Err(e) = maker.save_target_hists(&mut store) {
            log::error!("Target histograms failed with error: {e}");
            return;
        }
        pb.inc(1);
    }
    if config.make_ptm_virtual_hists {
        if let Err(e) = maker.save_ptm_virtual_hists(&mut store) {
            log::error!("PTM virtual histograms failed with error: {e}");
            return;
        }
        pb.inc(1);
    }
    if config.make_scanner_plots {
        if let Err(e) = maker.save_scanner_plots(&mut store) {
            log::error!("Scanner plots failed with error: {e}");
            return;
        }
        pb.inc(1);
    }
    pb.finish();

    if config.print_accounting && config.make_ptm_virtual_hists {
        if let Err(e) = maker.log_accounting() {
            log::error!("Particle accounting failed with error: {e}");
            return;
        }
    }

    if config.retain_hists {
        log::info!("Retained {} histograms:", store.len());
        for name in store.names() {
            log::info!("  {name}");
        }
    }

    log::info!("Done.");
}
