/// Command dispatch: routes `Command` enum variants to their implementations.
pub mod actor;
pub mod actors;
pub mod roles;
pub mod storage_units;

use std::time::Duration;

use crate::cli::args::{Command, PagingArgs};
use crate::cli::{Cli, OutputCtx};
use crate::mastr::{Credentials, MastrClient, MastrError, PageQuery};

/// Connection and delta settings shared by every registry command.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub wsdl: String,
    pub timeout: Duration,
    pub datum_ab: Option<String>,
    /// Pause between page requests.
    pub pause: Duration,
}

impl FetchSettings {
    /// Collect the global flags.
    #[must_use]
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            wsdl: cli.wsdl.clone(),
            timeout: Duration::from_secs(cli.timeout),
            datum_ab: cli.datum_ab.clone(),
            pause: Duration::try_from_secs_f64(cli.sleep).unwrap_or(Duration::MAX),
        }
    }

    /// Read credentials from the environment, then load the WSDL.
    ///
    /// # Errors
    ///
    /// Returns `MastrError::MissingCredential` before any network access when a
    /// variable is unset, or `MastrError::Soap` when the WSDL cannot be loaded.
    pub fn connect(&self) -> Result<MastrClient, MastrError> {
        let credentials = Credentials::from_env()?;
        MastrClient::connect(&self.wsdl, self.timeout, credentials)
    }

    /// Paging parameters for a streaming command.
    #[must_use]
    pub fn paging<'a>(&'a self, args: &PagingArgs) -> Paging<'a> {
        Paging {
            limit: args.limit,
            max_records: args.max_records,
            datum_ab: self.datum_ab.as_deref(),
            pause: self.pause,
        }
    }
}

/// How a record stream is paged.
#[derive(Debug, Clone, Copy)]
pub struct Paging<'a> {
    pub limit: u32,
    pub max_records: Option<u64>,
    pub datum_ab: Option<&'a str>,
    pub pause: Duration,
}

impl<'a> Paging<'a> {
    fn query(&self, start: u64, limit: u32) -> PageQuery<'a> {
        PageQuery {
            start,
            limit,
            datum_ab: self.datum_ab,
        }
    }
}

/// Counters reported after an export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Lines written.
    pub records: u64,
    /// Page requests answered.
    pub pages: u64,
    /// List entries examined.
    pub scanned: u64,
}

/// Dispatch a parsed `Command` to its handler.
///
/// # Errors
///
/// Returns `MastrError` on any command failure.
pub fn dispatch(command: &Command, settings: &FetchSettings, ctx: &OutputCtx) -> Result<(), MastrError> {
    match command {
        Command::Actors(args) => actors::run(args, settings, ctx),
        Command::StorageUnits(args) => storage_units::run(args, settings, ctx),
        Command::Actor(args) => actor::run(args, settings, ctx),
        Command::Roles => {
            roles::run(ctx);
            Ok(())
        }
    }
}
