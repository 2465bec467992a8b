/// `actor` command: look up market participants by MaStR number as JSON lines.
use std::io::Write;
use std::path::Path;

use serde_json::{Value, json};
use tracing::{info, warn};

use super::FetchSettings;
use crate::cli::OutputCtx;
use crate::cli::args::ActorArgs;
use crate::cli::output::{JsonlWriter, OutputTarget};
use crate::mastr::{MastrError, Record, RegistryApi};

/// Result counts of a lookup batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LookupSummary {
    pub found: u64,
    pub not_found: u64,
}

/// Run `mastr-fetch actor`.
///
/// # Errors
///
/// Returns `MastrError::InvalidArgument` for blank or missing numbers,
/// `MastrError::Io` when `--from` cannot be read, otherwise any credential or
/// remote failure. Unknown numbers are written as `not_found` lines.
pub fn run(args: &ActorArgs, settings: &FetchSettings, ctx: &OutputCtx) -> Result<(), MastrError> {
    let mut nummern = args.mastr_nummern.clone();
    if let Some(path) = &args.from {
        nummern.extend(read_numbers(path)?);
    }
    let nummern = normalize(nummern)?;

    let t_connect = ctx.timer("connect");
    let client = settings.connect()?;
    drop(t_connect);

    let target = OutputTarget::open(args.out.as_deref())?;

    let t_lookup = ctx.timer("lookup_actors");
    let (summary, target) = export(&client, &nummern, target)?;
    target.commit()?;
    drop(t_lookup);

    info!(
        requested = nummern.len(),
        found = summary.found,
        not_found = summary.not_found,
        "looked up market participants"
    );
    Ok(())
}

/// Look up each number in order and write one line per number.
///
/// Found participants are written as `{"MastrNummer", "Marktakteur"}`,
/// unknown ones as `{"MastrNummer", "error": "not_found"}`.
///
/// # Errors
///
/// Returns the first remote failure other than "not found", or a write error.
pub fn export<A, W>(api: &A, nummern: &[String], out: W) -> Result<(LookupSummary, W), MastrError>
where
    A: RegistryApi + ?Sized,
    W: Write,
{
    let mut writer = JsonlWriter::new(out);
    let mut summary = LookupSummary::default();

    for nummer in nummern {
        let mut line = Record::new();
        line.insert("MastrNummer".to_owned(), json!(nummer));
        match api.marktakteur(nummer)? {
            Some(actor) => {
                summary.found += 1;
                line.insert("Marktakteur".to_owned(), Value::Object(actor));
            }
            None => {
                summary.not_found += 1;
                warn!(mastr_nummer = %nummer, "market participant not found");
                line.insert("error".to_owned(), json!("not_found"));
            }
        }
        writer.write_record(&line)?;
    }

    Ok((summary, writer.finish()?))
}

fn read_numbers(path: &Path) -> Result<Vec<String>, MastrError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| MastrError::io(format!("reading {}", path.display()), e))?;
    Ok(parse_numbers(&text))
}

/// One number per line; blank lines and `#` comments are skipped.
fn parse_numbers(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.split('#').next().unwrap_or_default().trim())
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Trim, reject blanks, and drop repeats while keeping first-seen order.
fn normalize(nummern: Vec<String>) -> Result<Vec<String>, MastrError> {
    let mut out: Vec<String> = Vec::with_capacity(nummern.len());
    for raw in nummern {
        let nummer = raw.trim();
        if nummer.is_empty() {
            return Err(MastrError::InvalidArgument(
                "MaStR number must not be empty".to_owned(),
            ));
        }
        if !out.iter().any(|seen| seen == nummer) {
            out.push(nummer.to_owned());
        }
    }
    if out.is_empty() {
        return Err(MastrError::InvalidArgument(
            "no MaStR numbers given".to_owned(),
        ));
    }
    Ok(out)
}
