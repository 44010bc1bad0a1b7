mod args;
mod mx;
mod output;

use anyhow::{Context, Result};
use maildiscover_lib::Discover;
use tracing_subscriber::EnvFilter;

use std::io::{self, BufRead};

use args::{Cli, Commands, Workflow};

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let (workflow, emails) = if cli.stdin {
        let workflow = cli.stdin_workflow()?;
        let mut emails = Vec::new();
        for line in io::stdin().lock().lines() {
            let line = line.context("read stdin")?;
            let email = line.trim();
            if !email.is_empty() {
                emails.push(email.to_string());
            }
        }
        (workflow, emails)
    } else {
        match &cli.cmd {
            Some(Commands::Imap { email }) => (Workflow::Imap, vec![email.clone()]),
            Some(Commands::Smtp { email }) => (Workflow::Smtp, vec![email.clone()]),
            Some(Commands::All { email }) => (Workflow::All, vec![email.clone()]),
            Some(Commands::Mx { domain }) => {
                return mx::run(domain, &cli.format, cli.discover_options().dns_timeout());
            }
            None => {
                Cli::clap_command().print_help()?;
                println!();
                return Ok(());
            }
        }
    };

    let mut engine =
        Discover::from_system_conf(cli.discover_options()).context("initialise DNS resolver")?;
    let rows: Vec<_> = emails
        .iter()
        .map(|email| output::make_row(&mut engine, email, workflow))
        .collect();

    output::write_reports(&rows, &cli)?;

    // codes de sortie: 0 tout découvert, 2 invalide ou non découvert, 1 fatal
    if output::any_incomplete(&rows) {
        std::process::exit(2);
    }
    Ok(())
}
