use std::io;

use anyhow::Context;
use clap::Parser;

use dienstwagen_cli::cli::Cli;
use dienstwagen_cli::settings::Settings;
use dienstwagen_cli::{app, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::discover(cli.global.config.as_deref())?;
    let config = settings.resolve(&cli.global);
    logging::init(&config).context("cannot initialise logging")?;

    app::run(&cli.command, &config, &mut io::stdout().lock()).await
}
