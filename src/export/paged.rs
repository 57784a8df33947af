//! Bounded-retry paged fetching
//!
//! Collection endpoints are read window by window with `limit`/`offset`
//! parameters. A window that times out is retried at half the limit (down
//! to a floor) with a growing pause in between; a window that exhausts its
//! retries is treated as empty rather than aborting the whole fetch. A page
//! shorter than the requested limit marks the end of the collection.

use std::marker::PhantomData;
use std::time::Duration;

use tracing::warn;

use crate::endpoint::EndpointError;

/// Default pause added per retry attempt.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// Default number of attempts per window, the first one included.
pub const DEFAULT_MAX_RETRIES: usize = 3;

/// Paging policy: window size, retry budget and backoff.
#[derive(Debug, Clone)]
pub struct PagedFetcher {
    page_size: usize,
    min_limit: usize,
    max_retries: usize,
    backoff: Duration,
}

impl PagedFetcher {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            min_limit: 1,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: DEFAULT_BACKOFF,
        }
    }

    /// Floor for the halved limit during retries.
    pub fn with_min_limit(mut self, min_limit: usize) -> Self {
        self.min_limit = min_limit.max(1);
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Lazily iterate pages starting at `start_offset`.
    ///
    /// `get_page` receives `(limit, offset)` and returns one window of
    /// items; it may return more or fewer items than requested.
    pub fn pages<T, F>(&self, start_offset: usize, get_page: F) -> Pages<T, F>
    where
        F: FnMut(usize, usize) -> Result<Vec<T>, EndpointError>,
    {
        Pages {
            get_page,
            offset: start_offset,
            limit: self.page_size,
            attempt: 0,
            page_size: self.page_size,
            min_limit: self.min_limit,
            max_retries: self.max_retries,
            backoff: self.backoff,
            done: false,
            _items: PhantomData,
        }
    }

    /// Fetch every page and flatten the items into one list.
    pub fn fetch_all<T, F>(
        &self,
        start_offset: usize,
        get_page: F,
    ) -> Result<Vec<T>, EndpointError>
    where
        F: FnMut(usize, usize) -> Result<Vec<T>, EndpointError>,
    {
        let mut items = Vec::new();
        for page in self.pages(start_offset, get_page) {
            items.extend(page?);
        }
        Ok(items)
    }
}

/// Iterator over fetched pages. Non-timeout transport errors end the
/// iteration with an `Err` item.
pub struct Pages<T, F>
where
    F: FnMut(usize, usize) -> Result<Vec<T>, EndpointError>,
{
    get_page: F,
    offset: usize,
    limit: usize,
    attempt: usize,
    page_size: usize,
    min_limit: usize,
    max_retries: usize,
    backoff: Duration,
    done: bool,
    _items: PhantomData<fn() -> T>,
}

impl<T, F> Iterator for Pages<T, F>
where
    F: FnMut(usize, usize) -> Result<Vec<T>, EndpointError>,
{
    type Item = Result<Vec<T>, EndpointError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match (self.get_page)(self.limit, self.offset) {
                Ok(items) => {
                    let used = self.limit;
                    self.offset += used;
                    if items.len() < used {
                        self.done = true;
                    }
                    self.limit = self.page_size;
                    self.attempt = 0;
                    return Some(Ok(items));
                }
                Err(err) if err.is_timeout() && self.attempt + 1 < self.max_retries => {
                    self.attempt += 1;
                    self.limit = (self.limit / 2).max(self.min_limit);
                    warn!(
                        "Timeout at offset {}, retrying with limit {} (attempt {}/{})",
                        self.offset,
                        self.limit,
                        self.attempt + 1,
                        self.max_retries
                    );
                    std::thread::sleep(self.backoff * self.attempt as u32);
                }
                Err(err) if err.is_timeout() => {
                    warn!(
                        "Offset {} still timing out after {} attempt(s), skipping window",
                        self.offset, self.max_retries
                    );
                    self.offset += self.limit;
                    self.limit = self.page_size;
                    self.attempt = 0;
                    self.done = true;
                    return Some(Ok(Vec::new()));
                }
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
    }
}
