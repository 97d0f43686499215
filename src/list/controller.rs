// List Data Controller - paginated remote fetch with client-side mapping,
// filtering and search, plus an in-memory mirror of everything loaded

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::core::{EpochTicket, Record, RequestEpoch};
use crate::error::{AppError, AppResult};
use crate::infrastructure::action::{user_message, ActionRequest, ResponseCodes};
use crate::infrastructure::traits::ActionTransport;
use crate::list::export::{ExportColumn, ExportTable};
use crate::list::search::search_records;

/// Per-record augmentation applied to every fetched item
pub type RecordMapper = Arc<dyn Fn(Record) -> Record + Send + Sync>;

/// Predicate deciding whether a fetched item is kept
pub type RecordFilter = Arc<dyn Fn(&Record) -> bool + Send + Sync>;

/// Where a list's records come from
#[derive(Debug, Clone)]
pub struct ListSource {
    pub model: String,
    pub action: String,
    /// Key identifying a record; its value on the last item is the page token
    pub item_id: String,
    pub response_codes: ResponseCodes,
    pub search_fields: Vec<String>,
}

/// One fetched page: the visible items plus the continuation token
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListPage {
    pub items: Vec<Record>,
    pub page_token: Option<Value>,
}

/// A page load in flight
#[derive(Debug, Clone)]
pub struct PageRequest {
    ticket: EpochTicket,
    pub max: usize,
    pub last: Option<Value>,
    pub args: Record,
}

impl PageRequest {
    pub fn is_first_page(&self) -> bool {
        self.last.is_none()
    }
}

/// Cloneable half of the controller that performs the remote call
#[derive(Clone)]
pub struct PageFetcher {
    transport: Arc<dyn ActionTransport>,
    source: ListSource,
}

impl PageFetcher {
    /// Call the list action with `{max, last}` and decode the raw records
    pub async fn fetch(&self, request: &PageRequest) -> AppResult<Vec<Record>> {
        let mut action = ActionRequest::new(&self.source.model, &self.source.action)
            .params(&request.args)
            .param("max", request.max);
        if let Some(last) = &request.last {
            action = action.param("last", last.clone());
        }

        let response = self.transport.execute(action).await?;
        let data = self.source.response_codes.decode(response)?;

        match data {
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(record) => Ok(record),
                    other => Err(AppError::InvalidResponse(format!(
                        "list item is not an object: {}",
                        other
                    ))),
                })
                .collect(),
            other => Err(AppError::InvalidResponse(format!(
                "list data is not an array: {}",
                other
            ))),
        }
    }
}

pub struct ListDataController {
    fetcher: PageFetcher,
    mapper: Option<RecordMapper>,
    filter: Option<RecordFilter>,
    epoch: RequestEpoch,
    page_size: usize,
    query_args: Record,
    search: String,
    dataset: Vec<Record>,
    page_token: Option<Value>,
    exhausted: bool,
    loading: bool,
    refresh_count: u64,
    notice: Option<String>,
}

impl fmt::Debug for ListDataController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListDataController")
            .field("source", &self.fetcher.source)
            .field("rows", &self.dataset.len())
            .field("page_token", &self.page_token)
            .field("exhausted", &self.exhausted)
            .field("loading", &self.loading)
            .finish()
    }
}

impl ListDataController {
    pub fn new(transport: Arc<dyn ActionTransport>, source: ListSource, page_size: usize) -> Self {
        Self {
            fetcher: PageFetcher { transport, source },
            mapper: None,
            filter: None,
            epoch: RequestEpoch::new(),
            page_size: page_size.max(1),
            query_args: Record::new(),
            search: String::new(),
            dataset: Vec::new(),
            page_token: None,
            exhausted: false,
            loading: false,
            refresh_count: 0,
            notice: None,
        }
    }

    pub fn with_mapper(mut self, mapper: RecordMapper) -> Self {
        self.mapper = Some(mapper);
        self
    }

    pub fn with_filter(mut self, filter: RecordFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn fetcher(&self) -> PageFetcher {
        self.fetcher.clone()
    }

    pub fn source(&self) -> &ListSource {
        &self.fetcher.source
    }

    /// Start a page load; the returned request is only applied while current
    pub fn begin_load(&mut self, max: usize, last: Option<Value>, args: Record) -> PageRequest {
        self.loading = true;
        PageRequest {
            ticket: self.epoch.begin(),
            max,
            last,
            args,
        }
    }

    /// Fold a fetch outcome into the controller.
    ///
    /// Returns `None` when the request was superseded by a refresh or remount.
    pub fn apply(&mut self, request: PageRequest, outcome: AppResult<Vec<Record>>) -> Option<ListPage> {
        if !self.epoch.is_current(request.ticket) {
            debug!(
                "Discarding stale page for {}.{} (epoch {})",
                self.fetcher.source.model,
                self.fetcher.source.action,
                request.ticket.value()
            );
            return None;
        }
        self.loading = false;

        let raw = match outcome {
            Ok(raw) => raw,
            Err(err) => {
                warn!(
                    "Loading {}.{} failed: {}",
                    self.fetcher.source.model, self.fetcher.source.action, err
                );
                self.notice = Some(user_message(&err));
                return Some(ListPage {
                    items: Vec::new(),
                    page_token: request.last,
                });
            }
        };
        self.notice = None;

        let token = raw
            .last()
            .and_then(|item| item.get(&self.fetcher.source.item_id))
            .cloned();
        // A later page that does not move the cursor means there is nothing further
        self.exhausted =
            raw.is_empty() || (request.last.is_some() && (token.is_none() || token == request.last));

        let kept: Vec<Record> = raw
            .into_iter()
            .map(|item| match &self.mapper {
                Some(mapper) => mapper(item),
                None => item,
            })
            .filter(|item| self.filter.as_ref().map(|keep| keep(item)).unwrap_or(true))
            .collect();

        if request.is_first_page() {
            self.dataset = kept.clone();
        } else {
            self.dataset.extend(kept.iter().cloned());
        }
        if token.is_some() {
            self.page_token = token.clone();
        }

        let items = search_records(kept, &self.search, &self.fetcher.source.search_fields);
        debug!(
            "Loaded {} item(s) from {}.{}, {} in memory",
            items.len(),
            self.fetcher.source.model,
            self.fetcher.source.action,
            self.dataset.len()
        );

        Some(ListPage {
            items,
            page_token: if self.exhausted { None } else { token },
        })
    }

    /// Fetch one page with `{max, last}` and fold it in
    pub async fn load_page(&mut self, max: usize, last: Option<Value>, args: Record) -> ListPage {
        let request = self.begin_load(max, last, args);
        let outcome = self.fetcher.fetch(&request).await;
        self.apply(request, outcome).unwrap_or_default()
    }

    pub async fn load_first(&mut self) -> ListPage {
        let args = self.query_args.clone();
        self.load_page(self.page_size, None, args).await
    }

    /// Next page after the current token; empty once the data is exhausted
    pub async fn load_more(&mut self) -> ListPage {
        if !self.can_load_more() {
            return ListPage {
                items: Vec::new(),
                page_token: None,
            };
        }
        let args = self.query_args.clone();
        let last = self.page_token.clone();
        self.load_page(self.page_size, last, args).await
    }

    /// Drop cached pages and in-flight results
    pub fn invalidate(&mut self) {
        self.epoch.advance();
        self.dataset.clear();
        self.page_token = None;
        self.exhausted = false;
        self.loading = false;
        self.refresh_count += 1;
    }

    /// Discard everything loaded and refetch from the first page
    pub async fn refresh(&mut self) -> ListPage {
        self.invalidate();
        self.load_first().await
    }

    pub fn set_search(&mut self, term: &str) {
        self.search = term.to_string();
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_query_args(&mut self, args: Record) {
        self.query_args = args;
    }

    /// Rows to draw: the in-memory dataset under the current search
    pub fn visible_rows(&self) -> Vec<Record> {
        search_records(self.dataset.clone(), &self.search, &self.fetcher.source.search_fields)
    }

    pub fn dataset(&self) -> &[Record] {
        &self.dataset
    }

    pub fn row_count(&self) -> usize {
        self.dataset.len()
    }

    pub fn page_token(&self) -> Option<&Value> {
        self.page_token.as_ref()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn can_load_more(&self) -> bool {
        !self.loading && !self.exhausted && self.page_token.is_some()
    }

    pub fn refresh_count(&self) -> u64 {
        self.refresh_count
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    pub fn export(&self, columns: &[ExportColumn]) -> ExportTable {
        ExportTable::from_records(&self.dataset, columns)
    }
}
