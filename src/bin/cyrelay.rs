// CLASSIFICATION: COMMUNITY
// Filename: cyrelay.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-17

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use cyrelay::{ClientConfig, CyClient};

#[derive(Parser)]
#[command(about = "Send commands to Cytoscape, directly or through Jupyter-bridge")]
struct Cli {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Treat this process as notebook-hosted and probe the bridge
    #[arg(long)]
    notebook: bool,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Print the resolved connectivity mode
    Mode,
    /// Run a command with GET and print its result lines
    Get { command: Vec<String> },
    /// Run a command with POST and print its data as JSON
    Post { command: Vec<String> },
    /// List sub-commands of a command namespace
    Help { command: Vec<String> },
    /// Select a sandbox
    Sandbox {
        name: Option<String>,
        #[arg(long)]
        no_copy_samples: bool,
        #[arg(long)]
        keep: bool,
    },
    /// Remove a sandbox, the current one by default
    RemoveSandbox { name: Option<String> },
    /// Print the browser client script bound to a fresh channel
    BrowserJs,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ClientConfig::from_env(),
    };
    config.notebook |= cli.notebook;
    let client = CyClient::new(config);

    match cli.cmd {
        Cmd::Mode => println!("{:?}", client.connectivity_mode()?),
        Cmd::Get { command } => {
            for line in client.commands_get(&command.join(" "))? {
                println!("{line}");
            }
        }
        Cmd::Post { command } => {
            let data = client.commands_post(&command.join(" "))?;
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Cmd::Help { command } => {
            for line in client.commands_help(&command.join(" "))? {
                println!("{line}");
            }
        }
        Cmd::Sandbox {
            name,
            no_copy_samples,
            keep,
        } => {
            let current = client.sandbox_set(name.as_deref(), !no_copy_samples, !keep)?;
            match current.path {
                Some(path) => println!("{} at {path}", current.name.unwrap_or_default()),
                None => println!("no sandbox, using working directory"),
            }
        }
        Cmd::RemoveSandbox { name } => {
            let data = client.sandbox_remove(name.as_deref())?;
            println!("{data}");
        }
        Cmd::BrowserJs => print!("{}", client.browser_client_js()?),
    }
    Ok(())
}
