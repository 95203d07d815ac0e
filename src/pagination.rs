//! Lazy record iteration over the vendor pagination schemes.
//!
//! A [`Paginator`] owns its query parameters and the records of the page it
//! last fetched. The next page is requested only once those records have been
//! handed out and the caller asks for more.

use crate::{
    error::{ZephyrError, ZephyrResult},
    models::{CursorPage, ExecutionPage, LabelPage},
    session::{QueryParams, ZephyrSession},
};
use futures_util::stream::{self, Stream};
use log::debug;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Upper bound on page requests issued by one paginator
pub const DEFAULT_MAX_PAGES: usize = 10_000;

/// Name the Squad API gives to its "tests without a label" bucket
pub const NO_LABEL_SENTINEL: &str = "No Label";

const OFFSET: &str = "offset";

/// Continuation scheme of a paginated endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationMode {
    /// `values` + `isLast` + `next` URL (Scale Cloud)
    CursorUrl,
    /// `values` + `totalCount`, offset advanced by records returned (Squad tests by label)
    TestLabel,
    /// `executions` + `maxResultAllowed` + `currentIndex` + `linksNew` + `totalCount` (Squad ZQL)
    Execution,
}

impl PaginationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CursorUrl => "cursor",
            Self::TestLabel => "test-label",
            Self::Execution => "execution",
        }
    }
}

impl fmt::Display for PaginationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaginationMode {
    type Err = ZephyrError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "cursor" | "cursor-url" => Ok(Self::CursorUrl),
            "test-label" => Ok(Self::TestLabel),
            "execution" => Ok(Self::Execution),
            other => Err(ZephyrError::config(format!(
                "{} is not a valid query type! Available: cursor,test-label,execution",
                other
            ))),
        }
    }
}

/// Single-pass iterator over the records of a paginated endpoint
pub struct Paginator<'a> {
    session: &'a ZephyrSession,
    endpoint: String,
    mode: PaginationMode,
    params: QueryParams,
    buffer: VecDeque<Value>,
    pages: usize,
    max_pages: usize,
    sentinel_yielded: bool,
    finished: bool,
}

impl<'a> Paginator<'a> {
    pub(crate) fn new(
        session: &'a ZephyrSession,
        endpoint: String,
        mode: PaginationMode,
        params: QueryParams,
    ) -> Self {
        debug!(
            "Get paginated data from endpoint={} mode={} params={:?}",
            endpoint, mode, params
        );
        Self {
            session,
            endpoint,
            mode,
            params,
            buffer: VecDeque::new(),
            pages: 0,
            max_pages: DEFAULT_MAX_PAGES,
            sentinel_yielded: false,
            finished: false,
        }
    }

    /// Change the page request cap
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn mode(&self) -> PaginationMode {
        self.mode
    }

    /// Query parameters the next page request would use
    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    /// Number of page requests issued so far
    pub fn pages_fetched(&self) -> usize {
        self.pages
    }

    /// Next record, fetching another page when the current one is used up.
    ///
    /// Returns `Ok(None)` once the endpoint is exhausted or after an error.
    pub async fn next_record(&mut self) -> ZephyrResult<Option<Value>> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Ok(Some(record));
            }
            if self.finished {
                return Ok(None);
            }
            if let Err(e) = self.fetch_page().await {
                self.finished = true;
                return Err(e);
            }
        }
    }

    /// Drain every remaining record
    pub async fn collect_all(mut self) -> ZephyrResult<Vec<Value>> {
        let mut records = Vec::new();
        while let Some(record) = self.next_record().await? {
            records.push(record);
        }
        Ok(records)
    }

    /// Adapt into a `Stream` of records
    pub fn into_stream(self) -> impl Stream<Item = ZephyrResult<Value>> + 'a {
        stream::try_unfold(self, |mut pager| async move {
            Ok::<_, ZephyrError>(pager.next_record().await?.map(|record| (record, pager)))
        })
    }

    async fn fetch_page(&mut self) -> ZephyrResult<()> {
        if self.pages >= self.max_pages {
            return Err(ZephyrError::protocol(format!(
                "{} did not finish within {} pages",
                self.endpoint, self.max_pages
            )));
        }
        self.pages += 1;
        self.session.observer().on_page(&self.endpoint, self.pages);

        let body = self.session.get(&self.endpoint, &self.params).await?;
        match self.mode {
            PaginationMode::CursorUrl => self.absorb_cursor(body),
            PaginationMode::TestLabel => self.absorb_label(body),
            PaginationMode::Execution => self.absorb_execution(body),
        }
    }

    fn absorb_cursor(&mut self, body: Value) -> ZephyrResult<()> {
        if !has_key(&body, "values") {
            self.finished = true;
            return Ok(());
        }
        let page: CursorPage = decode(body, "cursor")?;

        match page.is_last {
            Some(true) => self.finished = true,
            Some(false) => {
                let next = page
                    .next
                    .ok_or_else(|| ZephyrError::protocol("isLast is false but next is missing"))?;
                let next = Url::parse(&next)?;
                for (key, value) in next.query_pairs() {
                    self.params.insert(key.into_owned(), value.into_owned());
                }
            }
            None => return Err(ZephyrError::protocol("cursor page is missing isLast")),
        }

        self.buffer.extend(page.values.unwrap_or_default());
        Ok(())
    }

    // The "No Label" bucket is only a real record when it is all the page has.
    fn absorb_label(&mut self, body: Value) -> ZephyrResult<()> {
        if !has_key(&body, "values") {
            self.finished = true;
            return Ok(());
        }
        let page: LabelPage = decode(body, "test-label")?;
        let total = page
            .total_count
            .ok_or_else(|| ZephyrError::protocol("test-label page is missing totalCount"))?;
        let offset = self.offset()?;
        let values = page.values.unwrap_or_default();
        let returned = values.len() as u64;
        let sole = values.len() == 1;
        let next = advance(offset, returned)?;

        for value in values {
            if is_sentinel(&value) {
                if !sole || self.sentinel_yielded {
                    continue;
                }
                self.sentinel_yielded = true;
            }
            self.buffer.push_back(value);
        }

        if returned == 0 || next >= total {
            self.finished = true;
        } else {
            self.params.insert(OFFSET.to_string(), next.to_string());
        }
        Ok(())
    }

    fn absorb_execution(&mut self, body: Value) -> ZephyrResult<()> {
        let has_executions = body
            .get("executions")
            .and_then(Value::as_array)
            .is_some_and(|executions| !executions.is_empty());
        if !has_executions {
            self.finished = true;
            return Ok(());
        }

        let page: ExecutionPage = decode(body, "execution")?;
        let missing = |field: &str| ZephyrError::protocol(format!("execution page is missing {}", field));
        let max = page.max_result_allowed.ok_or_else(|| missing("maxResultAllowed"))?;
        let current = page.current_index.ok_or_else(|| missing("currentIndex"))?;
        let links = page.links_new.ok_or_else(|| missing("linksNew"))?;
        let total = page.total_count.ok_or_else(|| missing("totalCount"))?;
        if max == 0 {
            return Err(ZephyrError::protocol("maxResultAllowed is 0"));
        }
        let offset = self.offset()?;

        let next = advance(offset, max)?;
        if links.last() == Some(&current) || next >= total {
            self.finished = true;
        } else {
            self.params.insert(OFFSET.to_string(), next.to_string());
        }

        self.buffer.extend(page.executions.unwrap_or_default());
        Ok(())
    }

    fn offset(&self) -> ZephyrResult<u64> {
        match self.params.get(OFFSET) {
            Some(value) => value.parse().map_err(|_| {
                ZephyrError::config(format!("offset must be a non-negative integer, got {:?}", value))
            }),
            None => Ok(0),
        }
    }
}

impl fmt::Debug for Paginator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Paginator")
            .field("endpoint", &self.endpoint)
            .field("mode", &self.mode)
            .field("params", &self.params)
            .field("pages", &self.pages)
            .field("finished", &self.finished)
            .finish()
    }
}

fn advance(offset: u64, step: u64) -> ZephyrResult<u64> {
    offset.checked_add(step).ok_or_else(|| {
        ZephyrError::protocol(format!("offset overflow: {} + {}", offset, step))
    })
}

fn has_key(body: &Value, key: &str) -> bool {
    body.as_object().is_some_and(|object| object.contains_key(key))
}

fn is_sentinel(value: &Value) -> bool {
    value.get("name").and_then(Value::as_str) == Some(NO_LABEL_SENTINEL)
}

fn decode<T: DeserializeOwned>(body: Value, mode: &str) -> ZephyrResult<T> {
    serde_json::from_value(body)
        .map_err(|e| ZephyrError::protocol(format!("malformed {} page: {}", mode, e)))
}
