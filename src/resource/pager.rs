//! Paginated list calls
//!
//! List methods return one page of items plus a continuation token. A
//! [`Pager`] drives such a method one page at a time, either manually
//! ([`Pager::next_page`]), as a lazy stream of items ([`Pager::into_stream`]),
//! push-style with a stop signal ([`Pager::for_each`]) or all at once
//! ([`Pager::collect_all`]).

use std::collections::VecDeque;
use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;

use futures::stream::{self, Stream};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{DlpError, Result};

/// Field names a list method uses for pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageDescriptor {
    /// Request field carrying the page token
    pub request_page_token_field: &'static str,
    /// Response field carrying the next page token
    pub response_page_token_field: &'static str,
    /// Response field holding the page's items
    pub resource_field: &'static str,
}

impl PageDescriptor {
    pub const fn new(
        request_page_token_field: &'static str,
        response_page_token_field: &'static str,
        resource_field: &'static str,
    ) -> Self {
        Self {
            request_page_token_field,
            response_page_token_field,
            resource_field,
        }
    }
}

pub const LIST_INSPECT_TEMPLATES: PageDescriptor =
    PageDescriptor::new("pageToken", "nextPageToken", "inspectTemplates");
pub const LIST_DEIDENTIFY_TEMPLATES: PageDescriptor =
    PageDescriptor::new("pageToken", "nextPageToken", "deidentifyTemplates");
pub const LIST_DLP_JOBS: PageDescriptor = PageDescriptor::new("pageToken", "nextPageToken", "jobs");

/// One page of a list call
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// `None` once the server reports no further pages
    pub next_page_token: Option<String>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            next_page_token: None,
        }
    }
}

impl<T> Page<T> {
    pub fn is_last(&self) -> bool {
        self.next_page_token.is_none()
    }
}

/// Parse a raw list response according to `descriptor`.
///
/// An absent items field is an empty page: JSON encodings of list responses
/// omit empty repeated fields.
pub fn parse_page<T: DeserializeOwned>(
    descriptor: &PageDescriptor,
    response: Value,
) -> Result<Page<T>> {
    let Value::Object(mut map) = response else {
        return Err(DlpError::ServerPage(
            "response is not a JSON object".to_string(),
        ));
    };

    let next_page_token = match map.remove(descriptor.response_page_token_field) {
        None | Some(Value::Null) => None,
        Some(Value::String(token)) if token.is_empty() => None,
        Some(Value::String(token)) => Some(token),
        Some(_) => {
            return Err(DlpError::ServerPage(format!(
                "`{}` is not a string",
                descriptor.response_page_token_field
            )))
        },
    };

    let raw_items = match map.remove(descriptor.resource_field) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(DlpError::ServerPage(format!(
                "`{}` is not an array",
                descriptor.resource_field
            )))
        },
    };

    let items = raw_items
        .into_iter()
        .map(serde_json::from_value)
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(|e| {
            DlpError::ServerPage(format!(
                "item in `{}` could not be decoded: {}",
                descriptor.resource_field, e
            ))
        })?;

    Ok(Page {
        items,
        next_page_token,
    })
}

/// Single-pass iterator over a paginated list call.
///
/// `call` performs one unary request. The request is a JSON object; the
/// pager only ever touches its page token field, and only after a page was
/// obtained successfully.
///
/// Items of a fetched page that [`Pager::for_each`] did not deliver stay
/// buffered and are handed out first by the next call on the same pager.
pub struct Pager<T, C> {
    call: C,
    descriptor: &'static PageDescriptor,
    request: Value,
    page_timeout: Option<Duration>,
    done: bool,
    pages_fetched: usize,
    buffered: VecDeque<T>,
}

impl<T, C, Fut> Pager<T, C>
where
    T: DeserializeOwned,
    C: FnMut(Value) -> Fut,
    Fut: Future<Output = Result<Value>>,
{
    pub fn new(call: C, descriptor: &'static PageDescriptor, request: Value) -> Self {
        let request = match request {
            Value::Object(_) => request,
            _ => Value::Object(Map::new()),
        };

        Self {
            call,
            descriptor,
            request,
            page_timeout: None,
            done: false,
            pages_fetched: 0,
            buffered: VecDeque::new(),
        }
    }

    /// Abort any single page fetch that takes longer than `timeout`
    pub fn with_page_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.page_timeout = timeout;
        self
    }

    /// True once the server reported the last page
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Token the next fetch will send. Items still [`Pager::buffered`] come
    /// from the page before it.
    pub fn page_token(&self) -> Option<&str> {
        self.request
            .get(self.descriptor.request_page_token_field)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Items already fetched but not yet delivered
    pub fn buffered(&self) -> usize {
        self.buffered.len()
    }

    /// Fetch exactly one page. Returns `Ok(None)` once the listing is exhausted.
    ///
    /// Buffered items left over from an interrupted [`Pager::for_each`] are
    /// returned as a page of their own, without a fetch.
    ///
    /// A transport error or timeout leaves the page token untouched, so the
    /// same page can be requested again. A malformed page ends the listing.
    pub async fn next_page(&mut self) -> Result<Option<Page<T>>> {
        if !self.buffered.is_empty() {
            let next_page_token = if self.done {
                None
            } else {
                self.page_token().map(str::to_string)
            };
            return Ok(Some(Page {
                items: self.buffered.drain(..).collect(),
                next_page_token,
            }));
        }

        if self.done {
            return Ok(None);
        }

        let fetch = (self.call)(self.request.clone());
        let response = match self.page_timeout {
            Some(limit) => tokio::time::timeout(limit, fetch)
                .await
                .map_err(|_| DlpError::Timeout(limit))??,
            None => fetch.await?,
        };

        let page = match parse_page::<T>(self.descriptor, response) {
            Ok(page) => page,
            Err(e) => {
                self.done = true;
                return Err(e);
            },
        };
        self.pages_fetched += 1;

        tracing::debug!(
            "page {} of `{}`: {} items, more={}",
            self.pages_fetched,
            self.descriptor.resource_field,
            page.items.len(),
            page.next_page_token.is_some()
        );

        match &page.next_page_token {
            Some(token) => {
                if let Value::Object(map) = &mut self.request {
                    map.insert(
                        self.descriptor.request_page_token_field.to_string(),
                        Value::String(token.clone()),
                    );
                }
            },
            None => self.done = true,
        }

        Ok(Some(page))
    }

    /// Push items to `f` until it breaks or the listing ends.
    ///
    /// A `Break` is honoured before the next page is requested. Returns the
    /// number of items delivered. The rest of the page being consumed stays
    /// buffered in the pager; [`Pager::page_token`] already points past it.
    pub async fn for_each<F>(&mut self, mut f: F) -> Result<usize>
    where
        F: FnMut(T) -> ControlFlow<()>,
    {
        let mut delivered = 0;
        loop {
            while let Some(item) = self.buffered.pop_front() {
                delivered += 1;
                if f(item).is_break() {
                    return Ok(delivered);
                }
            }
            match self.next_page().await? {
                Some(page) => self.buffered.extend(page.items),
                None => return Ok(delivered),
            }
        }
    }

    /// Fetch every page and concatenate the items
    pub async fn collect_all(mut self) -> Result<Vec<T>> {
        let mut all_items = Vec::new();
        while let Some(page) = self.next_page().await? {
            all_items.extend(page.items);
        }
        Ok(all_items)
    }

    /// Lazy stream of items in server order.
    ///
    /// Pages are requested only when the previous one has been drained.
    /// Dropping the stream stops further fetches; after an error item the
    /// stream ends.
    pub fn into_stream(self) -> impl Stream<Item = Result<T>> {
        stream::unfold((self, false), |(mut pager, failed)| async move {
            loop {
                if let Some(item) = pager.buffered.pop_front() {
                    return Some((Ok(item), (pager, failed)));
                }
                if failed {
                    return None;
                }
                match pager.next_page().await {
                    Ok(Some(page)) => pager.buffered.extend(page.items),
                    Ok(None) => return None,
                    Err(e) => return Some((Err(e), (pager, true))),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    type Responses = Arc<Mutex<VecDeque<Result<Value>>>>;
    type Requests = Arc<Mutex<Vec<Value>>>;

    /// A list call that replays canned responses and records requests
    fn mock_call(
        responses: Vec<Result<Value>>,
    ) -> (
        impl FnMut(Value) -> std::future::Ready<Result<Value>>,
        Requests,
    ) {
        let queue: Responses = Arc::new(Mutex::new(responses.into()));
        let requests: Requests = Arc::new(Mutex::new(Vec::new()));
        let seen = requests.clone();

        let call = move |request: Value| {
            seen.lock().unwrap().push(request);
            let next = queue.lock().unwrap().pop_front().unwrap_or_else(|| {
                Err(DlpError::transport(None, "no more canned responses"))
            });
            std::future::ready(next)
        };

        (call, requests)
    }

    fn jobs_page(names: &[&str], token: &str) -> Result<Value> {
        let jobs: Vec<Value> = names.iter().map(|n| json!({ "name": n })).collect();
        Ok(json!({ "jobs": jobs, "nextPageToken": token }))
    }

    fn names(items: &[Value]) -> Vec<String> {
        items
            .iter()
            .map(|v| v["name"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_exhausts_three_pages_in_order() {
        let (call, requests) = mock_call(vec![
            jobs_page(&["j1", "j2"], "a"),
            jobs_page(&["j3", "j4"], "b"),
            jobs_page(&["j5"], ""),
        ]);

        let pager: Pager<Value, _> = Pager::new(call, &LIST_DLP_JOBS, json!({ "pageSize": 2 }));
        let items = pager.collect_all().await.unwrap();

        assert_eq!(names(&items), vec!["j1", "j2", "j3", "j4", "j5"]);

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 3);
        assert!(requests[0].get("pageToken").is_none());
        assert_eq!(requests[1]["pageToken"], "a");
        assert_eq!(requests[2]["pageToken"], "b");
        assert_eq!(requests[2]["pageSize"], 2);
    }

    #[tokio::test]
    async fn test_stream_yields_items_then_ends() {
        let (call, requests) = mock_call(vec![
            jobs_page(&["j1", "j2"], "a"),
            jobs_page(&["j3", "j4"], "b"),
            jobs_page(&["j5"], ""),
        ]);

        let pager: Pager<Value, _> = Pager::new(call, &LIST_DLP_JOBS, json!({}));
        let results: Vec<Result<Value>> = pager.into_stream().collect().await;

        assert_eq!(results.len(), 5);
        let items: Vec<Value> = results.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(names(&items), vec!["j1", "j2", "j3", "j4", "j5"]);
        assert_eq!(requests.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_empty_page_with_token_continues() {
        let (call, requests) = mock_call(vec![
            jobs_page(&[], "a"),
            Ok(json!({ "nextPageToken": "b" })),
            jobs_page(&["j1"], ""),
        ]);

        let pager: Pager<Value, _> = Pager::new(call, &LIST_DLP_JOBS, json!({}));
        let items = pager.collect_all().await.unwrap();

        assert_eq!(names(&items), vec!["j1"]);
        assert_eq!(requests.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_absent_token_terminates() {
        let (call, requests) = mock_call(vec![Ok(json!({ "jobs": [{ "name": "only" }] }))]);

        let mut pager: Pager<Value, _> = Pager::new(call, &LIST_DLP_JOBS, json!({}));
        let page = pager.next_page().await.unwrap().unwrap();
        assert!(page.is_last());
        assert!(pager.is_done());
        assert!(pager.next_page().await.unwrap().is_none());
        assert_eq!(requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_mid_stream_keeps_earlier_items() {
        let (call, requests) = mock_call(vec![
            jobs_page(&["j1", "j2"], "a"),
            Err(DlpError::transport(Some(503), "unavailable")),
            jobs_page(&["j5"], ""),
        ]);

        let pager: Pager<Value, _> = Pager::new(call, &LIST_DLP_JOBS, json!({}));
        let results: Vec<Result<Value>> = pager.into_stream().collect().await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap()["name"], "j1");
        assert_eq!(results[1].as_ref().unwrap()["name"], "j2");
        assert!(matches!(
            results[2],
            Err(DlpError::Transport {
                status: Some(503),
                ..
            })
        ));
        // page 3 never requested
        assert_eq!(requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_manual_mode_is_resumable_after_error() {
        let (call, requests) = mock_call(vec![
            jobs_page(&["j1"], "a"),
            Err(DlpError::transport(None, "connection reset")),
            jobs_page(&["j2"], ""),
        ]);

        let mut pager: Pager<Value, _> = Pager::new(call, &LIST_DLP_JOBS, json!({}));
        let first = pager.next_page().await.unwrap().unwrap();
        assert_eq!(first.next_page_token.as_deref(), Some("a"));
        assert_eq!(pager.page_token(), Some("a"));

        assert!(pager.next_page().await.is_err());
        assert_eq!(pager.page_token(), Some("a"));
        assert!(!pager.is_done());

        let second = pager.next_page().await.unwrap().unwrap();
        assert_eq!(names(&second.items), vec!["j2"]);
        assert!(pager.is_done());

        let requests = requests.lock().unwrap();
        assert_eq!(requests[1]["pageToken"], "a");
        assert_eq!(requests[2]["pageToken"], "a");
    }

    #[tokio::test]
    async fn test_push_mode_stop_prevents_next_fetch() {
        let (call, requests) = mock_call(vec![
            jobs_page(&["j1", "j2"], "a"),
            jobs_page(&["j3"], ""),
        ]);

        let mut pager: Pager<Value, _> = Pager::new(call, &LIST_DLP_JOBS, json!({}));
        let mut seen = Vec::new();
        let delivered = pager
            .for_each(|item| {
                seen.push(item);
                if seen.len() == 2 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .await
            .unwrap();

        assert_eq!(delivered, 2);
        assert_eq!(requests.lock().unwrap().len(), 1);
        assert_eq!(pager.page_token(), Some("a"));
    }

    #[tokio::test]
    async fn test_break_mid_page_keeps_rest_for_next_call() {
        let (call, requests) = mock_call(vec![
            jobs_page(&["j1", "j2"], "a"),
            jobs_page(&["j3"], ""),
        ]);

        let mut pager: Pager<Value, _> = Pager::new(call, &LIST_DLP_JOBS, json!({}));
        let delivered = pager.for_each(|_| ControlFlow::Break(())).await.unwrap();

        assert_eq!(delivered, 1);
        assert_eq!(pager.buffered(), 1);
        assert_eq!(pager.page_token(), Some("a"));

        let rest = pager.collect_all().await.unwrap();
        assert_eq!(names(&rest), vec!["j2", "j3"]);
        assert_eq!(requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_buffered_rest_served_by_next_page_and_stream() {
        let (call, requests) = mock_call(vec![
            jobs_page(&["j1", "j2", "j3"], "a"),
            jobs_page(&["j4"], ""),
        ]);

        let mut pager: Pager<Value, _> = Pager::new(call, &LIST_DLP_JOBS, json!({}));
        pager.for_each(|_| ControlFlow::Break(())).await.unwrap();

        let leftover = pager.next_page().await.unwrap().unwrap();
        assert_eq!(names(&leftover.items), vec!["j2", "j3"]);
        assert_eq!(leftover.next_page_token.as_deref(), Some("a"));
        assert_eq!(requests.lock().unwrap().len(), 1);

        pager.for_each(|_| ControlFlow::Break(())).await.unwrap();
        assert!(pager.is_done());
        assert_eq!(pager.buffered(), 0);
        let tail: Vec<Result<Value>> = pager.into_stream().collect().await;
        assert!(tail.is_empty());
        assert_eq!(requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_stream_starts_with_buffered_items() {
        let (call, _requests) = mock_call(vec![
            jobs_page(&["j1", "j2"], "a"),
            jobs_page(&["j3"], ""),
        ]);

        let mut pager: Pager<Value, _> = Pager::new(call, &LIST_DLP_JOBS, json!({}));
        pager.for_each(|_| ControlFlow::Break(())).await.unwrap();

        let rest: Vec<Value> = pager
            .into_stream()
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(names(&rest), vec!["j2", "j3"]);
    }

    #[tokio::test]
    async fn test_dropping_stream_stops_fetching() {
        let (call, requests) = mock_call(vec![
            jobs_page(&["j1", "j2"], "a"),
            jobs_page(&["j3"], ""),
        ]);

        let pager: Pager<Value, _> = Pager::new(call, &LIST_DLP_JOBS, json!({}));
        let first: Vec<Result<Value>> = pager.into_stream().take(1).collect().await;

        assert_eq!(first.len(), 1);
        assert_eq!(requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_page_timeout_leaves_pager_resumable() {
        let mut attempts = 0;
        let call = move |_request: Value| {
            attempts += 1;
            let slow = attempts == 1;
            async move {
                if slow {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                }
                Ok::<_, DlpError>(json!({ "jobs": [{ "name": "j1" }] }))
            }
        };

        let mut pager: Pager<Value, _> = Pager::new(call, &LIST_DLP_JOBS, json!({}))
            .with_page_timeout(Some(Duration::from_millis(20)));

        assert!(matches!(
            pager.next_page().await,
            Err(DlpError::Timeout(_))
        ));
        assert!(!pager.is_done());
        assert_eq!(pager.pages_fetched(), 0);

        let page = pager.next_page().await.unwrap().unwrap();
        assert_eq!(page.items.len(), 1);
        assert!(pager.is_done());
    }

    #[derive(Debug, Deserialize)]
    struct Job {
        #[allow(dead_code)]
        name: String,
    }

    #[tokio::test]
    async fn test_malformed_page_is_fatal() {
        let (call, requests) = mock_call(vec![
            Ok(json!({ "jobs": { "name": "not-an-array" }, "nextPageToken": "a" })),
            jobs_page(&["j1"], ""),
        ]);

        let mut pager: Pager<Job, _> = Pager::new(call, &LIST_DLP_JOBS, json!({}));
        assert!(matches!(
            pager.next_page().await,
            Err(DlpError::ServerPage(_))
        ));
        assert!(pager.is_done());
        assert!(pager.next_page().await.unwrap().is_none());
        assert_eq!(requests.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_parse_page_rejects_bad_shapes() {
        assert!(parse_page::<Job>(&LIST_DLP_JOBS, json!([])).is_err());
        assert!(parse_page::<Job>(&LIST_DLP_JOBS, json!({ "nextPageToken": 7 })).is_err());
        assert!(parse_page::<Job>(&LIST_DLP_JOBS, json!({ "jobs": [{ "id": 1 }] })).is_err());

        let page = parse_page::<Job>(&LIST_DLP_JOBS, json!({})).unwrap();
        assert!(page.items.is_empty());
        assert!(page.is_last());
    }

    #[test]
    fn test_descriptors() {
        assert_eq!(LIST_INSPECT_TEMPLATES.resource_field, "inspectTemplates");
        assert_eq!(LIST_DEIDENTIFY_TEMPLATES.resource_field, "deidentifyTemplates");
        assert_eq!(LIST_DLP_JOBS.resource_field, "jobs");
        assert_eq!(LIST_DLP_JOBS.request_page_token_field, "pageToken");
        assert_eq!(LIST_DLP_JOBS.response_page_token_field, "nextPageToken");
    }
}
