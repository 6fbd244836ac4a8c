use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct CommandLineOptions {
    pub parameter_file_path: PathBuf,
    /// Number of worker ranks besides the coordinator.
    #[clap(long, default_value_t = 2)]
    pub num_workers: usize,
    #[clap(short, parse(from_occurrences))]
    pub verbosity: usize,
}
