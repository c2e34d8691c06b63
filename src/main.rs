mod cli;
mod error;
mod fmt;
mod loader;
mod models;
mod settings;
mod summary;
mod writer;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Check { data_dir } => cli::check::run(data_dir),
        Commands::Summary {
            month,
            year,
            school,
            output,
            no_write,
            data_dir,
        } => cli::summary::run(cli::summary::SummaryArgs {
            month,
            year,
            school,
            output,
            no_write,
            data_dir,
        }),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
