#[cfg(any(feature = "with-serde", feature = "with-csv"))]
use anyhow::Context;
use anyhow::{Result, bail};

use crate::args::{Cli, Workflow};
#[cfg(feature = "with-csv")]
use maildiscover_lib::ServerSettings;
use maildiscover_lib::{Discover, Discovery, MailDns, PortProbe, Protocol};

#[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
pub struct OutputRow {
    pub email: String,
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
    pub error: Option<String>,
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
    pub imap: Option<Discovery>,
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
    pub smtp: Option<Discovery>,
}

impl OutputRow {
    fn new(email: &str) -> Self {
        Self {
            email: email.to_string(),
            error: None,
            imap: None,
            smtp: None,
        }
    }

    fn discoveries(&self) -> impl Iterator<Item = &Discovery> {
        self.imap.iter().chain(self.smtp.iter())
    }

    /// Valid address and every requested workflow found a server.
    pub fn complete(&self) -> bool {
        self.error.is_none() && self.discoveries().all(Discovery::is_found)
    }

    fn status(&self) -> &'static str {
        if self.error.is_some() {
            "invalid"
        } else if self.complete() {
            "found"
        } else if self.discoveries().any(Discovery::is_found) {
            "partial"
        } else {
            "not_found"
        }
    }
}

pub fn make_row<D, P>(engine: &mut Discover<D, P>, email: &str, workflow: Workflow) -> OutputRow
where
    D: MailDns,
    P: PortProbe,
{
    let mut row = OutputRow::new(email);
    let protocols: &[Protocol] = match workflow {
        Workflow::Imap => &[Protocol::Imap],
        Workflow::Smtp => &[Protocol::Smtp],
        Workflow::All => &[Protocol::Imap, Protocol::Smtp],
    };

    for &protocol in protocols {
        match engine.discover(protocol, email) {
            Ok(report) => match protocol {
                Protocol::Imap => row.imap = Some(report),
                Protocol::Smtp => row.smtp = Some(report),
            },
            Err(err) => {
                row.error = Some(err.to_string());
                break;
            }
        }
    }
    row
}

pub fn write_reports(rows: &[OutputRow], cli: &Cli) -> Result<()> {
    match cli.format.as_str() {
        "human" => write_human(rows),
        "json" => write_json(rows, cli),
        "ndjson" => write_ndjson(rows, cli),
        "csv" => write_csv(rows, cli),
        other => bail!("unknown --format '{other}', use: human|json|ndjson|csv"),
    }
}

pub fn any_incomplete(rows: &[OutputRow]) -> bool {
    rows.iter().any(|row| !row.complete())
}

fn write_human(rows: &[OutputRow]) -> Result<()> {
    for row in rows {
        if let Some(error) = &row.error {
            println!("[INVALID] {error}");
            continue;
        }
        let tag = match row.status() {
            "found" => "[FOUND]  ",
            "partial" => "[PARTIAL]",
            _ => "[NONE]   ",
        };
        println!("{tag} {}", row.email);
        for discovery in row.discoveries() {
            println!("        {}: {}", discovery.protocol, describe(discovery));
        }
        if let Some(mx) = row.discoveries().find_map(|d| d.mx.as_ref()) {
            println!("        mx: {} (root {})", mx.server, mx.root);
        }
    }
    Ok(())
}

fn describe(discovery: &Discovery) -> String {
    match (&discovery.settings, discovery.source()) {
        (Some(settings), Some(source)) => format!("{settings} via {source}"),
        (Some(settings), None) => settings.to_string(),
        (None, _) => format!("not found ({} hosts tried)", discovery.attempts.len()),
    }
}

#[cfg(feature = "with-serde")]
fn write_json(rows: &[OutputRow], cli: &Cli) -> Result<()> {
    let s = serde_json::to_string_pretty(rows)?;
    if let Some(path) = &cli.out {
        write_all_atomically(path, s.as_bytes())?;
    } else {
        println!("{s}");
    }
    Ok(())
}

#[cfg(not(feature = "with-serde"))]
fn write_json(_: &[OutputRow], _: &Cli) -> Result<()> {
    bail!("format=json requires the 'with-serde' feature")
}

#[cfg(feature = "with-serde")]
fn write_ndjson(rows: &[OutputRow], cli: &Cli) -> Result<()> {
    if let Some(path) = &cli.out {
        let mut buf = Vec::new();
        for row in rows {
            let line = serde_json::to_string(row)?;
            buf.extend_from_slice(line.as_bytes());
            buf.push(b'\n');
        }
        write_all_atomically(path, &buf)?;
    } else {
        for row in rows {
            println!("{}", serde_json::to_string(row)?);
        }
    }
    Ok(())
}

#[cfg(not(feature = "with-serde"))]
fn write_ndjson(_: &[OutputRow], _: &Cli) -> Result<()> {
    bail!("format=ndjson requires the 'with-serde' feature")
}

#[cfg(feature = "with-csv")]
const CSV_HEADER: [&str; 10] = [
    "email",
    "status",
    "imap_host",
    "imap_port",
    "imap_encryption",
    "smtp_host",
    "smtp_port",
    "smtp_encryption",
    "mx_server",
    "error",
];

#[cfg(feature = "with-csv")]
fn write_csv(rows: &[OutputRow], cli: &Cli) -> Result<()> {
    if let Some(path) = &cli.out {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(CSV_HEADER)?;
        for row in rows {
            wtr.write_record(csv_record(row))?;
        }
        let data = wtr.into_inner()?;
        write_all_atomically(path, &data)?;
    } else {
        let mut wtr = csv::Writer::from_writer(std::io::stdout());
        wtr.write_record(CSV_HEADER)?;
        for row in rows {
            wtr.write_record(csv_record(row))?;
        }
        wtr.flush()?;
    }
    Ok(())
}

#[cfg(not(feature = "with-csv"))]
fn write_csv(_: &[OutputRow], _: &Cli) -> Result<()> {
    bail!("format=csv requires the 'with-csv' feature")
}

#[cfg(feature = "with-csv")]
fn csv_record(row: &OutputRow) -> Vec<String> {
    let mut record = vec![row.email.clone(), row.status().to_string()];
    for discovery in [&row.imap, &row.smtp] {
        let settings = discovery.as_ref().and_then(|d| d.settings.as_ref());
        record.extend(settings_fields(settings));
    }
    let mx = row
        .discoveries()
        .find_map(|d| d.mx.as_ref())
        .map(|mx| mx.server.clone())
        .unwrap_or_default();
    record.push(mx);
    record.push(row.error.clone().unwrap_or_default());
    record
}

#[cfg(feature = "with-csv")]
fn settings_fields(settings: Option<&ServerSettings>) -> [String; 3] {
    match settings {
        Some(s) => [
            s.host.clone(),
            s.port.to_string(),
            s.encryption.map(|e| e.to_string()).unwrap_or_default(),
        ],
        None => Default::default(),
    }
}

#[cfg(any(feature = "with-serde", feature = "with-csv"))]
fn write_all_atomically(path: &str, bytes: &[u8]) -> Result<()> {
    use std::io::Write;

    let tmp = format!("{path}.tmp");
    {
        let mut f = std::fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    std::fs::rename(&tmp, path).with_context(|| format!("rename {tmp} -> {path}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::net::IpAddr;
    use std::time::Duration;

    use maildiscover_lib::{DiscoverOptions, MxRecord};
    use trust_dns_resolver::error::ResolveError;

    use super::*;

    /// DNS answering only MX queries from a fixed table.
    #[derive(Default)]
    struct FixedDns {
        mx: HashMap<String, Vec<MxRecord>>,
    }

    impl MailDns for FixedDns {
        fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, ResolveError> {
            Ok(self.mx.get(domain).cloned().unwrap_or_default())
        }

        fn lookup_ip(&self, _host: &str) -> Result<Vec<IpAddr>, ResolveError> {
            Ok(Vec::new())
        }

        fn reverse_lookup(&self, _ip: IpAddr) -> Result<Vec<String>, ResolveError> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct OpenPorts {
        open: HashMap<String, Vec<u16>>,
    }

    impl PortProbe for OpenPorts {
        fn probe(&self, host: &str, ports: &[u16], _timeout: Duration) -> Option<u16> {
            let open = self.open.get(host)?;
            ports.iter().copied().find(|p| open.contains(p))
        }
    }

    fn engine(listening: &[(&str, &[u16])]) -> Discover<FixedDns, OpenPorts> {
        let mut dns = FixedDns::default();
        dns.mx.insert(
            "example.com".to_string(),
            vec![MxRecord::new(10, "mx.example.net")],
        );
        let mut probe = OpenPorts::default();
        for (host, ports) in listening {
            probe.open.insert(host.to_string(), ports.to_vec());
        }
        Discover::with_parts(dns, probe, DiscoverOptions::default())
    }

    #[test]
    fn found_when_every_workflow_succeeds() {
        let mut engine = engine(&[("imap.example.com", &[993]), ("smtp.example.com", &[587])]);
        let row = make_row(&mut engine, "alice@example.com", Workflow::All);
        assert!(row.complete());
        assert_eq!(row.status(), "found");
        assert!(!any_incomplete(&[row]));
    }

    #[test]
    fn partial_when_one_workflow_fails() {
        let mut engine = engine(&[("imap.example.com", &[143])]);
        let row = make_row(&mut engine, "alice@example.com", Workflow::All);
        assert!(row.imap.as_ref().is_some_and(Discovery::is_found));
        assert!(row.smtp.as_ref().is_some_and(|d| !d.is_found()));
        assert!(!row.complete());
        assert_eq!(row.status(), "partial");
    }

    #[test]
    fn not_found_when_nothing_answers() {
        let mut engine = engine(&[]);
        let row = make_row(&mut engine, "alice@example.com", Workflow::Smtp);
        assert!(row.imap.is_none());
        assert_eq!(row.status(), "not_found");
        assert!(any_incomplete(&[row]));
    }

    #[test]
    fn single_workflow_found_is_complete() {
        let mut engine = engine(&[("mx.example.net", &[465])]);
        let row = make_row(&mut engine, "alice@example.com", Workflow::Smtp);
        assert_eq!(row.status(), "found");
    }

    #[test]
    fn invalid_address_stops_all_workflow() {
        let mut engine = engine(&[("imap.example.com", &[993])]);
        let row = make_row(&mut engine, "not-an-email", Workflow::All);
        assert_eq!(row.status(), "invalid");
        assert!(row.imap.is_none() && row.smtp.is_none());
        let error = row.error.as_deref().expect("error recorded");
        assert!(error.contains("exactly one '@'"), "{error}");
        // rejected before any MX lookup
        assert!(engine.mx_info().is_none());
        assert!(any_incomplete(&[row]));
    }

    #[test]
    fn one_incomplete_row_is_enough() {
        let mut engine = engine(&[("imap.example.com", &[993])]);
        let rows = [
            make_row(&mut engine, "alice@example.com", Workflow::Imap),
            make_row(&mut engine, "bob@", Workflow::Imap),
        ];
        assert_eq!(rows[0].status(), "found");
        assert!(any_incomplete(&rows));
    }

    #[cfg(feature = "with-csv")]
    #[test]
    fn csv_columns_follow_header() {
        let mut engine = engine(&[("imap.example.com", &[993]), ("smtp.example.com", &[587])]);
        let row = make_row(&mut engine, "alice@example.com", Workflow::All);
        assert_eq!(
            csv_record(&row),
            [
                "alice@example.com",
                "found",
                "imap.example.com",
                "993",
                "ssl",
                "smtp.example.com",
                "587",
                "tls",
                "mx.example.net",
                "",
            ]
        );
        assert_eq!(csv_record(&row).len(), CSV_HEADER.len());
    }

    #[cfg(feature = "with-csv")]
    #[test]
    fn csv_invalid_row_keeps_error_last() {
        let mut engine = engine(&[]);
        let row = make_row(&mut engine, "bob@", Workflow::All);
        let record = csv_record(&row);
        assert_eq!(record[1], "invalid");
        assert!(record[2..9].iter().all(String::is_empty));
        assert!(record[9].starts_with("invalid email address 'bob@'"));
    }
}
