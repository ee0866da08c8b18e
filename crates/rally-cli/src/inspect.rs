//! Offline decoding of a rally record.

use std::io::{Read, Write};
use std::path::Path;

use anyhow::Context;

use rally_core::codec;
use rally_proto::{ParseError, Rally};

/// What `rally inspect` learned about one record.
#[derive(Debug)]
pub struct Report {
    pub rally: Rally,
    /// `encode(decode(text))` reproduces the input. Trailing whitespace is
    /// ignored on both sides since Telegram strips it from message text.
    pub exact: bool,
    pub reencoded: String,
}

pub fn inspect(text: &str) -> Result<Report, ParseError> {
    let rally = codec::decode(text)?;
    let reencoded = codec::encode(&rally);
    Ok(Report {
        exact: reencoded.trim_end() == text.trim_end(),
        rally,
        reencoded,
    })
}

/// Read the record at `path`, or stdin for `-`.
fn read_input(path: &Path) -> anyhow::Result<String> {
    let mut text = String::new();
    if path.as_os_str() == "-" {
        std::io::stdin()
            .read_to_string(&mut text)
            .context("reading stdin")?;
    } else {
        text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
    }
    Ok(text)
}

pub fn run(path: &Path, out: &mut impl Write) -> anyhow::Result<()> {
    let text = read_input(path)?;
    let report = inspect(&text).context("not a rally record")?;

    writeln!(out, "{}", serde_json::to_string_pretty(&report.rally)?)?;
    if report.exact {
        writeln!(out, "round trip: exact")?;
    } else {
        writeln!(out, "round trip: differs, re-encoded text follows")?;
        writeln!(out, "{}", report.reencoded)?;
    }
    Ok(())
}
