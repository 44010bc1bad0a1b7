use std::time::Duration;

use anyhow::{Context, Result, bail};

use maildiscover_lib::{MxStatus, check_mx_with_timeout};

pub fn run(domain: &str, format: &str, timeout: Duration) -> Result<()> {
    let status = check_mx_with_timeout(domain, timeout)
        .with_context(|| format!("MX lookup for {domain}"))?;

    match format {
        "human" => {
            println!("{}", human_summary(domain, &status));
            Ok(())
        }
        "json" | "ndjson" => write_json(&status, format == "json"),
        other => bail!("unknown --format '{other}' for mx, use: human|json|ndjson"),
    }
}

fn human_summary(domain: &str, status: &MxStatus) -> String {
    match status {
        MxStatus::Records(records) => {
            let mut lines = vec![format!("{domain}:")];
            lines.extend(
                records
                    .iter()
                    .map(|r| format!("  {:>5} {}", r.preference, r.exchange)),
            );
            lines.join("\n")
        }
        MxStatus::NoRecords => format!("{domain}: no MX records"),
    }
}

#[cfg(feature = "with-serde")]
fn write_json(status: &MxStatus, pretty: bool) -> Result<()> {
    let s = if pretty {
        serde_json::to_string_pretty(status)?
    } else {
        serde_json::to_string(status)?
    };
    println!("{s}");
    Ok(())
}

#[cfg(not(feature = "with-serde"))]
fn write_json(_: &MxStatus, _: bool) -> Result<()> {
    bail!("format=json requires the 'with-serde' feature")
}
