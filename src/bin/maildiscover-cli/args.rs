use anyhow::{Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use maildiscover_lib::{DiscoverOptions, ValidationMode};

#[derive(Parser)]
#[command(name = "maildiscover-cli", version)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Option<Commands>,

    /// lit des adresses depuis stdin (une par ligne)
    #[arg(long)]
    pub stdin: bool,

    /// workflow utilisé avec --stdin: imap|smtp|all
    #[arg(long, default_value = "all")]
    pub protocol: String,

    /// write report to file (JSON/NDJSON/CSV selon --format)
    #[arg(long)]
    pub out: Option<String>,

    /// mode: strict|relaxed
    #[arg(long, default_value = "strict")]
    pub mode: String,

    /// format: human|json|ndjson|csv
    #[arg(long, default_value = "human")]
    pub format: String,

    /// timeout de connexion TCP par tentative (ms)
    #[arg(long = "timeout-ms", default_value_t = 3_000)]
    pub timeout_ms: u64,

    /// DNS query timeout (ms)
    #[arg(long = "dns-timeout-ms", default_value_t = 3_000)]
    pub dns_timeout_ms: u64,

    /// teste tous les ports d'un hôte en parallèle
    #[arg(long)]
    pub parallel: bool,

    /// more logs on stderr (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// découvre le serveur IMAP d'une adresse
    Imap { email: String },
    /// découvre le serveur SMTP d'une adresse
    Smtp { email: String },
    /// discover both, sharing one engine
    All { email: String },
    /// résout les enregistrements MX du domaine
    Mx { domain: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workflow {
    Imap,
    Smtp,
    All,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn clap_command() -> clap::Command {
        <Self as clap::CommandFactory>::command()
    }

    pub fn discover_options(&self) -> DiscoverOptions {
        DiscoverOptions {
            validation_mode: mode_from_str(&self.mode),
            connect_timeout_ms: self.timeout_ms,
            dns_timeout_ms: self.dns_timeout_ms,
            parallel_ports: self.parallel,
        }
    }

    pub fn stdin_workflow(&self) -> Result<Workflow> {
        workflow_from_str(&self.protocol)
    }
}

pub fn mode_from_str(s: &str) -> ValidationMode {
    match s {
        "relaxed" => ValidationMode::Relaxed,
        _ => ValidationMode::Strict,
    }
}

pub fn workflow_from_str(s: &str) -> Result<Workflow> {
    match s {
        "imap" => Ok(Workflow::Imap),
        "smtp" => Ok(Workflow::Smtp),
        "all" => Ok(Workflow::All),
        other => bail!("unknown --protocol '{other}', use: imap|smtp|all"),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        <Cli as Parser>::try_parse_from(args).expect("valid command line")
    }

    #[test]
    fn dns_timeout_reaches_options() {
        let cli = parse(&["maildiscover-cli", "--dns-timeout-ms", "250", "mx", "example.com"]);
        assert!(matches!(cli.cmd, Some(Commands::Mx { .. })));
        assert_eq!(cli.discover_options().dns_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn flags_map_onto_options() {
        let cli = parse(&[
            "maildiscover-cli",
            "--mode",
            "relaxed",
            "--timeout-ms",
            "0",
            "--parallel",
            "imap",
            "a@example.com",
        ]);
        let options = cli.discover_options();
        assert_eq!(options.validation_mode, ValidationMode::Relaxed);
        assert_eq!(options.connect_timeout(), Duration::from_millis(1));
        assert!(options.parallel_ports);
    }

    #[test]
    fn unknown_mode_falls_back_to_strict() {
        assert_eq!(mode_from_str("lenient"), ValidationMode::Strict);
    }

    #[test]
    fn stdin_workflow_names() {
        assert_eq!(workflow_from_str("imap").unwrap(), Workflow::Imap);
        assert_eq!(workflow_from_str("all").unwrap(), Workflow::All);
        assert!(workflow_from_str("pop3").is_err());
    }
}
