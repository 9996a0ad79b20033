//! relaydeck - connect screen and DNS settings for a VPN client
//!
//! Plays scripted sessions against the connect screen state holder and
//! manages custom DNS servers stored in the configuration file.

use clap::{Parser, Subcommand};
use relaydeck_core::{error::RelaydeckError, init_logging};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "relaydeck")]
#[command(about = "Connect screen playback and custom DNS management for a VPN client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive the connect screen from a TOML script and print what it shows
    Play {
        /// Path to the script
        script: PathBuf,
        /// Print one JSON object per line instead of text
        #[arg(long)]
        json: bool,
    },
    /// Manage custom DNS servers
    Dns {
        #[command(subcommand)]
        action: DnsCommands,
    },
}

#[derive(Subcommand)]
enum DnsCommands {
    /// List custom DNS servers
    List,
    /// Add a custom DNS server
    Add { address: String },
    /// Replace the server at INDEX
    Edit { index: usize, address: String },
    /// Remove the server at INDEX
    Remove { index: usize },
    /// Allow or block local network sharing
    AllowLan {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

fn main() {
    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(2);
    }

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Play { script, json } => cli::play::run_play(&script, json),
        Commands::Dns { action } => match action {
            DnsCommands::List => cli::dns::run_dns_list(),
            DnsCommands::Add { address } => cli::dns::run_dns_add(&address),
            DnsCommands::Edit { index, address } => cli::dns::run_dns_edit(index, &address),
            DnsCommands::Remove { index } => cli::dns::run_dns_remove(index),
            DnsCommands::AllowLan { enabled } => cli::dns::run_dns_allow_lan(enabled),
        },
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            let exit_code = match e {
                // Configuration errors (exit code 2)
                RelaydeckError::Config(_)
                | RelaydeckError::Toml(_)
                | RelaydeckError::TomlSerialize(_) => 2,
                // Runtime errors (exit code 1)
                RelaydeckError::Connect(_) | RelaydeckError::Dns(_) | RelaydeckError::Io(_) => 1,
            };

            eprintln!("{}", e);
            std::process::exit(exit_code);
        }
    }
}
