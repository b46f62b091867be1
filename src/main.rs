use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
#[allow(unused_imports)]
use tracing::*;
use tracing_subscriber::prelude::*;

use crate::{
    config::Configuration,
    model::{EntityKind, UserId},
    store::BookStore,
};

mod add;
mod aliases;
mod assemble;
mod calendar;
mod catalog;
mod config;
mod defaults;
mod entities;
mod error;
mod installments;
mod model;
mod parsing;
mod print;
mod recurrent;
mod resolve;
mod store;
mod sweep;
mod templates;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, value_name = "FILE", default_value = "quickledger.json")]
    config: PathBuf,
    /// Act as this user instead of the configured one.
    #[arg(short, long)]
    user: Option<u32>,
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Records a transaction typed as a single line.
    Add(add::Command),
    List(print::Command),
    /// Materializes every recurrent transaction that fell due.
    CatchUp(sweep::Command),
    Recurrent(templates::Command),
    Storage(entities::Command),
    Category(entities::Command),
    Alias(aliases::Command),
    #[command(name = "default")]
    Defaults(defaults::Command),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    fn get_rust_log(verbose: u8) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| {
            match verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
            .into()
        })
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(get_rust_log(cli.verbose)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Configuration::load(&cli.config)?;
    let user = cli.user.map(UserId).unwrap_or(config.user);
    let now = config.now()?;
    let mut store = BookStore::open(&config.book)?;

    debug!(%user, %now, "session");

    match &cli.command {
        Commands::Add(cmd) => add::execute_command(&mut store, user, now, cmd),
        Commands::List(cmd) => print::execute_command(&store, user, cmd),
        Commands::CatchUp(cmd) => sweep::execute_command(&mut store, now, cmd),
        Commands::Recurrent(cmd) => templates::execute_command(&mut store, user, now, cmd),
        Commands::Storage(cmd) => {
            entities::execute_command(&mut store, user, EntityKind::Storage, cmd)
        }
        Commands::Category(cmd) => {
            entities::execute_command(&mut store, user, EntityKind::Category, cmd)
        }
        Commands::Alias(cmd) => aliases::execute_command(&mut store, user, cmd),
        Commands::Defaults(cmd) => defaults::execute_command(&mut store, user, cmd),
    }
}
