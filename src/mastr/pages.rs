/// Offset pagination over a page-fetching function.
///
/// Pages are requested lazily as the consumer drains records. After a page of
/// `n` records the loop stops when `n < limit`; otherwise the offset advances
/// by `limit`, the optional pause elapses, and the next page is requested. The
/// registry reports no totals, so a record count that is an exact multiple of
/// the page size costs one trailing empty request.
use std::time::Duration;

use tracing::debug;

use super::api::Record;
use super::errors::MastrError;

/// Lazily paginated records.
pub struct Pages<F> {
    fetch: F,
    limit: u32,
    start: u64,
    pause: Duration,
    sleep: fn(Duration),
    max_records: Option<u64>,
    buffer: std::vec::IntoIter<Record>,
    emitted: u64,
    pages_fetched: u64,
    exhausted: bool,
}

impl<F> Pages<F>
where
    F: FnMut(u64, u32) -> Result<Vec<Record>, MastrError>,
{
    /// Paginate with page size `limit`; `fetch` receives `(start, limit)`.
    #[must_use]
    pub fn new(limit: u32, fetch: F) -> Self {
        Self {
            fetch,
            limit: limit.max(1),
            start: 0,
            pause: Duration::ZERO,
            sleep: std::thread::sleep,
            max_records: None,
            buffer: Vec::new().into_iter(),
            emitted: 0,
            pages_fetched: 0,
            exhausted: false,
        }
    }

    /// Wait `pause` before every page request after the first.
    #[must_use]
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Stop after `max` records without requesting further pages.
    #[must_use]
    pub fn with_max_records(mut self, max: Option<u64>) -> Self {
        self.max_records = max;
        self
    }

    #[cfg(test)]
    fn with_sleep(mut self, sleep: fn(Duration)) -> Self {
        self.sleep = sleep;
        self
    }

    /// Number of page requests that returned successfully.
    #[must_use]
    pub fn pages_fetched(&self) -> u64 {
        self.pages_fetched
    }

    fn fetch_next_page(&mut self) -> Result<(), MastrError> {
        if self.pages_fetched > 0 && !self.pause.is_zero() {
            (self.sleep)(self.pause);
        }
        let page = (self.fetch)(self.start, self.limit)?;
        self.pages_fetched += 1;

        let count = page.len();
        debug!(
            page = self.pages_fetched,
            start = self.start,
            limit = self.limit,
            count,
            "fetched page"
        );

        if count < self.limit as usize {
            self.exhausted = true;
        } else {
            self.start += u64::from(self.limit);
        }
        self.buffer = page.into_iter();
        Ok(())
    }
}

impl<F> Iterator for Pages<F>
where
    F: FnMut(u64, u32) -> Result<Vec<Record>, MastrError>,
{
    type Item = Result<Record, MastrError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.max_records.is_some_and(|max| self.emitted >= max) {
                return None;
            }
            if let Some(record) = self.buffer.next() {
                self.emitted += 1;
                return Some(Ok(record));
            }
            if self.exhausted {
                return None;
            }
            if let Err(err) = self.fetch_next_page() {
                self.exhausted = true;
                return Some(Err(err));
            }
        }
    }
}
