/// `actors` command: stream market participants holding one role as JSON lines.
use std::io::Write;

use tracing::info;

use super::{ExportSummary, FetchSettings, Paging};
use crate::cli::OutputCtx;
use crate::cli::args::ActorsArgs;
use crate::cli::output::{JsonlWriter, OutputTarget};
use crate::mastr::{MastrError, Pages, RegistryApi, Role};

/// Run `mastr-fetch actors`.
///
/// # Errors
///
/// Returns `MastrError` on missing credentials, remote failure, or I/O failure.
/// An `--out` file is only created when every page was written.
pub fn run(args: &ActorsArgs, settings: &FetchSettings, ctx: &OutputCtx) -> Result<(), MastrError> {
    let t_connect = ctx.timer("connect");
    let client = settings.connect()?;
    drop(t_connect);

    let target = OutputTarget::open(args.paging.out.as_deref())?;
    let destination = target
        .path()
        .map_or_else(|| "stdout".to_owned(), |p| p.display().to_string());

    let t_export = ctx.timer("export_actors");
    let (summary, target) = export(&client, args.role, &settings.paging(&args.paging), target)?;
    target.commit()?;
    drop(t_export);

    info!(
        role = args.role.shorthand(),
        records = summary.records,
        pages = summary.pages,
        out = %destination,
        "exported market participants"
    );
    Ok(())
}

/// Page through participants with `role` and write each as one line to `out`.
///
/// # Errors
///
/// Returns the first page or write error; `out` is dropped unflushed.
pub fn export<A, W>(api: &A, role: Role, paging: &Paging<'_>, out: W) -> Result<(ExportSummary, W), MastrError>
where
    A: RegistryApi + ?Sized,
    W: Write,
{
    let mut pages = Pages::new(paging.limit, |start, limit| {
        api.marktakteure_page(&paging.query(start, limit), role)
    })
    .with_pause(paging.pause)
    .with_max_records(paging.max_records);

    let mut writer = JsonlWriter::new(out);
    for record in pages.by_ref() {
        writer.write_record(&record?)?;
    }

    let summary = ExportSummary {
        records: writer.written(),
        pages: pages.pages_fetched(),
        scanned: writer.written(),
    };
    Ok((summary, writer.finish()?))
}
