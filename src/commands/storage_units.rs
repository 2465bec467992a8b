/// `storage-units` command: unit list -> storage filter -> details -> criteria -> JSON lines.
use std::io::Write;

use tracing::{debug, info, warn};

use super::{ExportSummary, FetchSettings, Paging};
use crate::cli::OutputCtx;
use crate::cli::args::StorageUnitsArgs;
use crate::cli::output::{JsonlWriter, OutputTarget};
use crate::mastr::storage::{storage_record, storage_unit_number};
use crate::mastr::{MastrError, Pages, RegistryApi, StorageCriteria};

/// Run `mastr-fetch storage-units`.
///
/// # Errors
///
/// Returns `MastrError` on missing credentials, remote failure, or I/O failure.
pub fn run(args: &StorageUnitsArgs, settings: &FetchSettings, ctx: &OutputCtx) -> Result<(), MastrError> {
    let criteria = StorageCriteria {
        battery: args.battery,
        lithium: args.lithium,
        min_power_kw: args.min_power_kw,
        exclude_natural_persons: args.exclude_natural_persons,
    };

    let t_connect = ctx.timer("connect");
    let client = settings.connect()?;
    drop(t_connect);

    let target = OutputTarget::open(args.paging.out.as_deref())?;
    let destination = target
        .path()
        .map_or_else(|| "stdout".to_owned(), |p| p.display().to_string());

    let t_export = ctx.timer("export_storage_units");
    let (summary, target) = export(
        &client,
        &settings.paging(&args.paging),
        !args.no_details,
        &criteria,
        target,
    )?;
    target.commit()?;
    drop(t_export);

    info!(
        records = summary.records,
        scanned = summary.scanned,
        pages = summary.pages,
        out = %destination,
        "exported storage units"
    );
    Ok(())
}

/// Walk the unit list and write every storage unit that passes `criteria`.
///
/// With `with_details` each unit is written as
/// `{"EinheitMastrNummer", "Einheit", "Details"}`; without it the list entry is
/// written as returned and `criteria` is not consulted. `max_records` counts
/// written lines, so paging stops as soon as enough units were selected.
/// While criteria are set, a unit whose details cannot be fetched is skipped.
///
/// # Errors
///
/// Returns the first page or write error, and the first detail error when no
/// criteria are set.
pub fn export<A, W>(
    api: &A,
    paging: &Paging<'_>,
    with_details: bool,
    criteria: &StorageCriteria,
    out: W,
) -> Result<(ExportSummary, W), MastrError>
where
    A: RegistryApi + ?Sized,
    W: Write,
{
    let mut pages = Pages::new(paging.limit, |start, limit| {
        api.einheiten_page(&paging.query(start, limit))
    })
    .with_pause(paging.pause);

    let mut writer = JsonlWriter::new(out);
    let mut scanned = 0;

    for einheit in pages.by_ref() {
        let einheit = einheit?;
        scanned += 1;

        let Some(nummer) = storage_unit_number(&einheit).map(str::to_owned) else {
            continue;
        };

        if with_details {
            let details = match api.einheit_stromspeicher(&nummer) {
                Ok(details) => details,
                Err(err) if !criteria.is_empty() => {
                    warn!(unit = %nummer, error = %err, "detail lookup failed; skipping unit");
                    continue;
                }
                Err(err) => return Err(err),
            };
            if !criteria.is_empty() && !criteria.matches(&einheit, &details, api) {
                continue;
            }
            writer.write_record(&storage_record(&nummer, einheit, details))?;
        } else {
            writer.write_record(&einheit)?;
        }
        debug!(unit = %nummer, "selected storage unit");

        if paging.max_records.is_some_and(|max| writer.written() >= max) {
            break;
        }
    }

    let summary = ExportSummary {
        records: writer.written(),
        pages: pages.pages_fetched(),
        scanned,
    };
    Ok((summary, writer.finish()?))
}
