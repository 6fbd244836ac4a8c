use clap::Parser;
use halosweep::ics;
use halosweep::prelude::*;
use log::error;
use log::info;
use log::LevelFilter;
use simplelog::ColorChoice;
use simplelog::ConfigBuilder;
use simplelog::LevelPadding;
use simplelog::TermLogger;
use simplelog::TerminalMode;

fn main() {
    let options = CommandLineOptions::parse();
    init_logging(options.verbosity);
    let parameters = match ParameterFile::from_file(&options.parameter_file_path) {
        Ok(parameters) => parameters,
        Err(err) => {
            error!("{err}");
            std::process::exit(1);
        }
    };
    let snapshot = match ics::generate(&parameters.ics) {
        Ok(snapshot) => snapshot,
        Err(err) => {
            error!("{err}");
            std::process::exit(1);
        }
    };
    info!(
        "Generated snapshot: {} particles in a {} Mpc box at z = {}",
        snapshot.npart, snapshot.boxsize, snapshot.redshift
    );
    let catalogue = run(&snapshot, &parameters.finder, options.num_workers);
    let real = catalogue
        .halos
        .real_flag
        .iter()
        .filter(|&&real| real)
        .count();
    info!(
        "Catalogue: {} halos ({} real), {} subhalos",
        catalogue.num_halos(),
        real,
        catalogue.num_subhalos()
    );
}

fn init_logging(verbosity: usize) {
    let level = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let config = ConfigBuilder::default()
        .set_level_padding(LevelPadding::Right)
        .set_thread_level(LevelFilter::Off)
        .build();
    TermLogger::init(level, config, TerminalMode::Mixed, ColorChoice::Auto)
        .expect("Failed to initialize logger");
}
