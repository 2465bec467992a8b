/// Output: JSONL record sinks, role listing, error envelopes, TTY detection.
use std::fs::File;
use std::io::{self, BufWriter, IsTerminal, StdoutLock, Write};
use std::path::{Path, PathBuf};

use comfy_table::{Table, presets::UTF8_BORDERS_ONLY};
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::debug;

use super::args::OutputFormat;
use crate::mastr::{MastrError, Record};
use crate::types::{ErrorOutput, RoleOutput};

/// Resolve the effective output format, handling `--json` flag and TTY auto-detection.
#[must_use]
pub fn resolve_format(fmt: OutputFormat, json_flag: bool) -> OutputFormat {
    if json_flag {
        return OutputFormat::Json;
    }
    if fmt == OutputFormat::Auto {
        if std::io::stdout().is_terminal() {
            OutputFormat::Table
        } else {
            OutputFormat::Json
        }
    } else {
        fmt
    }
}

/// Output context passed to all commands.
pub struct OutputCtx {
    pub format: OutputFormat,
    pub no_header: bool,
    /// When true, log step timings.
    pub debug: bool,
}

impl OutputCtx {
    /// Construct from CLI args.
    #[must_use]
    pub fn new(fmt: OutputFormat, json_flag: bool, no_header: bool, debug: bool) -> Self {
        Self {
            format: resolve_format(fmt, json_flag),
            no_header,
            debug,
        }
    }

    /// Start a named debug timer. Logs elapsed time on drop only when `--debug` is set.
    #[must_use]
    pub fn timer(&self, label: &'static str) -> DebugTimer {
        DebugTimer::new(label, self.debug)
    }
}

// --- JSONL records ---

/// Writes one compact JSON object per line.
pub struct JsonlWriter<W: Write> {
    out: W,
    written: u64,
}

impl<W: Write> JsonlWriter<W> {
    #[must_use]
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    /// Append one record. Non-ASCII text is written as UTF-8, not escaped.
    ///
    /// # Errors
    ///
    /// Returns `MastrError` when serialization or the underlying write fails.
    pub fn write_record(&mut self, record: &Record) -> Result<(), MastrError> {
        serde_json::to_writer(&mut self.out, record)?;
        self.out
            .write_all(b"\n")
            .map_err(|e| MastrError::io("writing record", e))?;
        self.written += 1;
        Ok(())
    }

    /// Records written so far.
    #[must_use]
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush and hand back the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns `MastrError::Io` when the flush fails.
    pub fn finish(mut self) -> Result<W, MastrError> {
        self.out
            .flush()
            .map_err(|e| MastrError::io("flushing output", e))?;
        Ok(self.out)
    }
}

/// Where a record stream goes.
///
/// A file target writes to a temporary sibling of the destination and only
/// renames it into place on [`OutputTarget::commit`]; dropping an uncommitted
/// target deletes the temporary file, so failed runs never leave partial output.
pub enum OutputTarget {
    Stdout(BufWriter<StdoutLock<'static>>),
    File {
        tmp: BufWriter<NamedTempFile>,
        path: PathBuf,
    },
}

impl OutputTarget {
    /// Open stdout (`None`) or a staged file next to `path`.
    ///
    /// # Errors
    ///
    /// Returns `MastrError::Io` when the temporary file cannot be created.
    pub fn open(path: Option<&Path>) -> Result<Self, MastrError> {
        let Some(path) = path else {
            return Ok(Self::Stdout(BufWriter::new(io::stdout().lock())));
        };
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let tmp = tempfile::Builder::new()
            .prefix(".mastr-fetch-")
            .suffix(".part")
            .tempfile_in(dir)
            .map_err(|e| MastrError::io(format!("creating output in {}", dir.display()), e))?;
        debug!(path = %path.display(), staging = %tmp.path().display(), "staging output");
        Ok(Self::File {
            tmp: BufWriter::new(tmp),
            path: path.to_owned(),
        })
    }

    /// Flush, and for file targets move the staged file into place.
    ///
    /// # Errors
    ///
    /// Returns `MastrError::Io` when flushing or renaming fails.
    pub fn commit(self) -> Result<(), MastrError> {
        match self {
            Self::Stdout(mut out) => out
                .flush()
                .map_err(|e| MastrError::io("flushing stdout", e)),
            Self::File { tmp, path } => {
                let tmp = tmp
                    .into_inner()
                    .map_err(|e| MastrError::io("flushing output", e.into_error()))?;
                let file: File = tmp
                    .persist(&path)
                    .map_err(|e| MastrError::io(format!("writing {}", path.display()), e.error))?;
                file.sync_all()
                    .map_err(|e| MastrError::io(format!("syncing {}", path.display()), e))
            }
        }
    }

    /// Destination path, when writing to a file.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Stdout(_) => None,
            Self::File { path, .. } => Some(path),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Stdout(out) => out.write(buf),
            Self::File { tmp, .. } => tmp.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Stdout(out) => out.flush(),
            Self::File { tmp, .. } => tmp.flush(),
        }
    }
}

// --- Roles ---

/// Write the role list to stdout.
pub fn write_roles(roles: &[RoleOutput], ctx: &OutputCtx) {
    match ctx.format {
        OutputFormat::Json => print_json(roles),
        OutputFormat::Compact => print_compact_json(roles),
        OutputFormat::Table | OutputFormat::Auto => {
            let mut table = Table::new();
            table.load_preset(UTF8_BORDERS_ONLY);
            if !ctx.no_header {
                table.set_header(["ROLE", "NAME", "REGISTRY CODE"]);
            }
            for r in roles {
                table.add_row([r.role.as_str(), r.label.as_str(), r.code.as_str()]);
            }
            println!("{table}");
        }
    }
}

// --- Error output ---

/// Write a structured error to stderr.
pub fn write_error(err: &ErrorOutput, format: OutputFormat, json_flag: bool) {
    let fmt = resolve_format(format, json_flag);
    let stderr = std::io::stderr();
    let mut out = stderr.lock();
    match fmt {
        OutputFormat::Json | OutputFormat::Compact => {
            let s = serde_json::to_string_pretty(err).unwrap_or_default();
            let _ = writeln!(out, "{s}");
        }
        _ => {
            let _ = writeln!(out, "Error: {}", err.error.message);
        }
    }
}

// --- Debug timer ---

/// A RAII timer that logs elapsed milliseconds on drop.
///
/// Created via [`OutputCtx::timer`]. Does nothing when `debug` is false.
pub struct DebugTimer {
    label: &'static str,
    start: std::time::Instant,
    active: bool,
}

impl DebugTimer {
    #[must_use]
    fn new(label: &'static str, active: bool) -> Self {
        Self {
            label,
            start: std::time::Instant::now(),
            active,
        }
    }
}

impl Drop for DebugTimer {
    fn drop(&mut self) {
        if self.active {
            let ms = self.start.elapsed().as_secs_f64() * 1000.0;
            debug!(step = self.label, "took {ms:.2}ms");
        }
    }
}

// --- Generic JSON helpers ---

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("JSON serialization error: {e}"),
    }
}

fn print_compact_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("JSON serialization error: {e}"),
    }
}
