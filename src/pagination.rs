//! Cursor-based pagination over `next_page_token`.
//!
//! [`PaginatedFetcher`] drives any [`PageSource`]: it requests a page, appends
//! its records, and follows the continuation token until the server stops
//! returning one. Any error aborts the whole fetch; nothing partial is
//! returned.

use std::collections::HashSet;

use indicatif::ProgressBar;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::query::Query;

/// One record as returned by the API. Its schema is opaque to the client.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// One decoded response body.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Page {
    #[serde(rename = "resources")]
    pub items: Vec<Record>,
    #[serde(default, rename = "next_page_token")]
    next_page_token: Option<String>,
}

impl Page {
    pub fn new(items: Vec<Record>, next_page_token: Option<String>) -> Self {
        Self {
            items,
            next_page_token,
        }
    }

    /// Continuation token, if more data exists. An empty token means "done".
    pub fn next_page_token(&self) -> Option<&str> {
        self.next_page_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Something that can turn a [`Query`] into a single [`Page`].
pub trait PageSource {
    fn fetch_page(&self, query: &Query) -> Result<Page>;
}

pub struct PaginatedFetcher<'a, S: ?Sized> {
    source: &'a S,
    progress: Option<ProgressBar>,
}

impl<'a, S: PageSource + ?Sized> PaginatedFetcher<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Fetches every page of `query` and returns the records in server order.
    ///
    /// Fails with [`Error::RepeatedPageToken`] if the server hands back a
    /// token this fetch already sent, instead of looping forever.
    pub fn fetch_all(&self, query: &Query) -> Result<Vec<Record>> {
        let mut records: Vec<Record> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut current = query.clone();
        let mut pages = 0usize;

        if let Some(token) = current.page_token_value() {
            seen.insert(token.to_string());
        }

        let result = loop {
            let page = match self.source.fetch_page(&current) {
                Ok(page) => page,
                Err(e) => break Err(e),
            };
            pages += 1;

            debug!(
                collection = current.collection(),
                page = pages,
                items = page.items.len(),
                has_next = page.next_page_token().is_some(),
                "fetched page"
            );

            let next = page.next_page_token().map(str::to_string);
            records.extend(page.items);

            if let Some(pb) = &self.progress {
                pb.set_message(format!("{} page(s), {} record(s)", pages, records.len()));
                pb.tick();
            }

            match next {
                None => break Ok(()),
                Some(token) => {
                    if !seen.insert(token.clone()) {
                        warn!(%token, pages, "server repeated a page token");
                        break Err(Error::RepeatedPageToken { token, pages });
                    }
                    current = query.with_page_token(token);
                }
            }
        };

        if let Some(pb) = &self.progress {
            pb.finish_and_clear();
        }

        result?;
        info!(
            collection = query.collection(),
            pages,
            records = records.len(),
            "fetch complete"
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::cell::RefCell;

    fn record(id: u32) -> Record {
        match json!({ "id": format!("nmdc:sty-{}", id) }) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    /// Serves canned pages keyed by the incoming page token.
    struct FakeSource {
        pages: Vec<(Option<&'static str>, Result<Page>)>,
        seen_tokens: RefCell<Vec<Option<String>>>,
    }

    impl FakeSource {
        fn new(pages: Vec<(Option<&'static str>, Result<Page>)>) -> Self {
            Self {
                pages,
                seen_tokens: RefCell::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.seen_tokens.borrow().len()
        }
    }

    impl PageSource for FakeSource {
        fn fetch_page(&self, query: &Query) -> Result<Page> {
            self.seen_tokens
                .borrow_mut()
                .push(query.page_token_value().map(str::to_string));
            let (_, page) = self
                .pages
                .iter()
                .find(|(token, _)| *token == query.page_token_value())
                .expect("unexpected page token");
            match page {
                Ok(p) => Ok(p.clone()),
                Err(Error::Api { status, url, body }) => Err(Error::Api {
                    status: *status,
                    url: url.clone(),
                    body: body.clone(),
                }),
                Err(_) => unreachable!(),
            }
        }
    }

    fn page(ids: &[u32], next: Option<&str>) -> Result<Page> {
        Ok(Page::new(
            ids.iter().copied().map(record).collect(),
            next.map(str::to_string),
        ))
    }

    #[test]
    fn empty_result_takes_one_request() {
        let source = FakeSource::new(vec![(None, page(&[], None))]);
        let out = PaginatedFetcher::new(&source)
            .fetch_all(&Query::new("study_set"))
            .unwrap();

        assert!(out.is_empty());
        assert_eq!(source.calls(), 1);
    }

    #[test]
    fn concatenates_pages_in_order() {
        let source = FakeSource::new(vec![
            (None, page(&[1, 2], Some("t1"))),
            (Some("t1"), page(&[3, 4], Some("t2"))),
            (Some("t2"), page(&[5], None)),
        ]);
        let query = Query::new("study_set").page_size(2);
        let out = PaginatedFetcher::new(&source).fetch_all(&query).unwrap();

        assert_eq!(out, (1..=5).map(record).collect::<Vec<_>>());
        assert_eq!(
            *source.seen_tokens.borrow(),
            vec![None, Some("t1".to_string()), Some("t2".to_string())]
        );
    }

    #[test]
    fn empty_token_terminates() {
        let source = FakeSource::new(vec![
            (None, page(&[1], Some("t1"))),
            (Some("t1"), page(&[2], Some(""))),
        ]);
        let out = PaginatedFetcher::new(&source)
            .fetch_all(&Query::new("study_set"))
            .unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(source.calls(), 2);
    }

    #[test]
    fn error_on_later_page_discards_everything() {
        let source = FakeSource::new(vec![
            (None, page(&[1, 2], Some("t1"))),
            (
                Some("t1"),
                Err(Error::Api {
                    status: 503,
                    url: "http://x".into(),
                    body: String::new(),
                }),
            ),
        ]);
        let err = PaginatedFetcher::new(&source)
            .fetch_all(&Query::new("study_set"))
            .unwrap_err();

        assert_eq!(err.status(), Some(503));
        assert_eq!(source.calls(), 2);
    }

    #[test]
    fn repeated_token_is_rejected() {
        let source = FakeSource::new(vec![
            (None, page(&[1], Some("t1"))),
            (Some("t1"), page(&[2], Some("t1"))),
        ]);
        let err = PaginatedFetcher::new(&source)
            .fetch_all(&Query::new("study_set"))
            .unwrap_err();

        match err {
            Error::RepeatedPageToken { token, pages } => {
                assert_eq!(token, "t1");
                assert_eq!(pages, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn starting_token_counts_as_seen() {
        let source = FakeSource::new(vec![(Some("t0"), page(&[1], Some("t0")))]);
        let err = PaginatedFetcher::new(&source)
            .fetch_all(&Query::new("study_set").page_token("t0"))
            .unwrap_err();

        assert!(matches!(err, Error::RepeatedPageToken { pages: 1, .. }));
    }

    #[test]
    fn page_decodes_wire_shape() {
        let page: Page = serde_json::from_value(json!({
            "resources": [{"id": "a"}, {"id": "b"}],
            "next_page_token": "nxt"
        }))
        .unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.next_page_token(), Some("nxt"));

        let last: Page = serde_json::from_value(json!({"resources": []})).unwrap();
        assert_eq!(last.next_page_token(), None);

        assert!(serde_json::from_value::<Page>(json!({"results": []})).is_err());
        assert!(serde_json::from_value::<Page>(json!({"resources": [1, 2]})).is_err());
    }
}
