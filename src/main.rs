use clap::Parser;
use log::{error, info};

use meetnotes::{App, Cli, Config, FileSlot, NoteStore};

pub fn initialize_logger(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_secs()
        .format_module_path(true)
        .init();

    info!("Logger initialized");
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    initialize_logger(cli.verbose);

    if let Err(e) = run(cli).await {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> meetnotes::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(data_file) = cli.data_file {
        config.data_file = data_file;
    }

    let slot = FileSlot::new(config.data_file.clone());
    info!("Using notes file {}", slot.path().display());
    let store = NoteStore::open(slot);
    let app = App::new(store, config, cli.verbose);
    app.run(cli.command).await
}
