use clap::Parser;
use trpcgen::cli::{run_cli, Cli};
use trpcgen::logging::{init_logging, LogConfig};

fn main() {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env();
    if cli.verbose {
        log_config = log_config.verbose();
    }
    if let Err(err) = init_logging(&log_config) {
        eprintln!("Warning: {err:#}");
    }

    if let Err(err) = run_cli(cli) {
        eprintln!("❌ {err:#}");
        std::process::exit(1);
    }
}
