use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use wikicodename_cache::{FileCache, KeyValueCache};
use wikicodename_wiki::api::{section_list_url, section_url};
use wikicodename_wiki::{FetchError, TransportError, WikiFetcher, WikiTransport};

const WIKI: &str = "https://en.wikipedia.org/";
const PAGE: &str = "List of animal names";

#[derive(Default)]
struct MockTransport {
    responses: HashMap<String, String>,
    failures: HashMap<String, u16>,
    requests: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockTransport {
    fn respond(mut self, url: String, body: serde_json::Value) -> Self {
        self.responses.insert(url, body.to_string());
        self
    }

    fn fail(mut self, url: String, status: u16) -> Self {
        self.failures.insert(url, status);
        self
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl WikiTransport for MockTransport {
    async fn get(&self, url: &str) -> Result<String, TransportError> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(url.to_string());
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(status) = self.failures.get(url) {
            return Err(TransportError::Status { status: *status });
        }
        Ok(self
            .responses
            .get(url)
            .cloned()
            .unwrap_or_else(|| panic!("unexpected request: {url}")))
    }
}

fn section_list(titles: &[&str]) -> serde_json::Value {
    let sections: Vec<_> = titles
        .iter()
        .enumerate()
        .map(|(i, title)| json!({"index": (i + 1).to_string(), "line": title, "level": "2"}))
        .collect();
    json!({"parse": {"title": PAGE, "pageid": 1, "sections": sections}})
}

fn section_text(markup: &str) -> serde_json::Value {
    json!({"parse": {"title": PAGE, "pageid": 1, "text": {"*": markup}}})
}

fn list_url() -> String {
    section_list_url(WIKI, PAGE).expect("list url")
}

fn sec_url(index: u32) -> String {
    section_url(WIKI, PAGE, index).expect("section url")
}

/// Lead + four titled sections, each with one list item naming it.
fn five_section_transport() -> MockTransport {
    MockTransport::default()
        .respond(list_url(), section_list(&["Mammals", "Birds", "See also", "References"]))
        .respond(sec_url(0), section_text("<p>Intro</p><ul><li>Lead</li></ul>"))
        .respond(
            sec_url(1),
            section_text(
                "<table><tbody><tr><th>Animal</th></tr><tr><td>Aardvark</td></tr></tbody></table>",
            ),
        )
        .respond(sec_url(2), section_text("<ul><li>Albatross</li></ul>"))
        .respond(sec_url(3), section_text("<ul><li>Zoology</li></ul>"))
        .respond(sec_url(4), section_text("<ul><li>Citation</li></ul>"))
}

fn excluded() -> Vec<String> {
    vec!["See also".to_string(), "References".to_string()]
}

#[tokio::test]
async fn excluded_sections_are_never_fetched() {
    let transport = Arc::new(five_section_transport());
    let fetcher = WikiFetcher::new(temp_cache("excluded"), transport.clone(), WIKI);

    let content = fetcher.fetch(PAGE, &excluded(), None).await.expect("fetch");

    let requests = transport.requests();
    assert_eq!(requests.len(), 4, "one section list plus three sections");
    assert_eq!(requests[0], list_url());
    let mut sections: Vec<_> = requests[1..].to_vec();
    sections.sort();
    let mut expected = vec![sec_url(0), sec_url(1), sec_url(2)];
    expected.sort();
    assert_eq!(sections, expected);

    assert_eq!(content.table_count(), 1);
    assert_eq!(
        content.table_values_by_header(0, "Animal"),
        vec!["Aardvark".to_string()]
    );
    let mut items: Vec<String> = (0..content.list_count())
        .flat_map(|i| content.list_values(i))
        .collect();
    items.sort();
    assert_eq!(items, vec!["Albatross".to_string(), "Lead".to_string()]);
}

#[tokio::test]
async fn second_fetch_is_served_from_cache() {
    let cache = temp_cache("cached");
    let transport = Arc::new(five_section_transport());
    let fetcher = WikiFetcher::new(cache, transport.clone(), WIKI);

    let first = fetcher.fetch(PAGE, &excluded(), None).await.expect("first fetch");
    let second = fetcher.fetch(PAGE, &excluded(), None).await.expect("second fetch");

    assert_eq!(transport.requests().len(), 4);
    assert_eq!(first.table_count(), second.table_count());
    assert_eq!(first.list_count(), second.list_count());
}

#[tokio::test]
async fn cached_section_list_with_uncached_sections() {
    let cache = temp_cache("partial");
    cache
        .write(&list_url(), r#"[[0,""],[1,"Mammals"]]"#)
        .expect("seed section list");
    let transport = Arc::new(
        MockTransport::default()
            .respond(sec_url(0), section_text("<ul><li>Lead</li></ul>"))
            .respond(sec_url(1), section_text("<ul><li>Aardvark</li></ul>")),
    );
    let fetcher = WikiFetcher::new(cache, transport.clone(), WIKI);

    let content = fetcher.fetch(PAGE, &[], None).await.expect("fetch");

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert!(!requests.contains(&list_url()));
    assert_eq!(content.list_count(), 2);
}

#[tokio::test]
async fn failing_section_aborts_the_fetch() {
    let transport = Arc::new(five_section_transport().fail(sec_url(2), 503));
    let fetcher = WikiFetcher::new(temp_cache("failing"), transport, WIKI);

    let err = fetcher.fetch(PAGE, &excluded(), None).await.unwrap_err();

    match err {
        FetchError::Transport { page, url, source } => {
            assert_eq!(page, PAGE);
            assert_eq!(url, sec_url(2));
            assert!(matches!(source, TransportError::Status { status: 503 }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn remote_error_on_section_list_is_reported() {
    let transport = Arc::new(MockTransport::default().respond(
        list_url(),
        json!({"error": {"code": "missingtitle", "info": "The page you specified doesn't exist."}}),
    ));
    let fetcher = WikiFetcher::new(temp_cache("remote"), transport, WIKI);

    let err = fetcher.fetch(PAGE, &[], None).await.unwrap_err();

    assert!(matches!(err, FetchError::Remote { .. }));
    assert_eq!(err.page(), Some(PAGE));
}

#[tokio::test]
async fn url_override_targets_another_wiki() {
    let other = "https://de.wikipedia.org/";
    let transport = Arc::new(
        MockTransport::default()
            .respond(
                section_list_url(other, PAGE).expect("list url"),
                json!({"parse": {"sections": []}}),
            )
            .respond(
                section_url(other, PAGE, 0).expect("section url"),
                section_text("<ol><li>Katze</li></ol>"),
            ),
    );
    let fetcher = WikiFetcher::new(temp_cache("override"), transport.clone(), WIKI);

    let content = fetcher.fetch(PAGE, &[], Some(other)).await.expect("fetch");

    assert_eq!(content.list_values(0), vec!["Katze".to_string()]);
    assert!(transport.requests().iter().all(|url| url.starts_with(other)));
}

#[tokio::test]
async fn worker_width_bounds_concurrent_requests() {
    let titles: Vec<String> = (1..=12).map(|i| format!("Section {i}")).collect();
    let title_refs: Vec<&str> = titles.iter().map(String::as_str).collect();
    let mut transport = MockTransport::default().respond(list_url(), section_list(&title_refs));
    for index in 0..=12 {
        transport = transport.respond(
            sec_url(index),
            section_text(&format!("<ul><li>Item {index}</li></ul>")),
        );
    }
    let transport = Arc::new(transport);
    let fetcher =
        WikiFetcher::new(temp_cache("width"), transport.clone(), WIKI).with_max_workers(3);

    let content = fetcher.fetch(PAGE, &[], None).await.expect("fetch");

    assert_eq!(content.list_count(), 13);
    assert!(transport.max_in_flight.load(Ordering::SeqCst) <= 3);
}

fn temp_cache(label: &str) -> Arc<FileCache> {
    let mut dir = std::env::temp_dir();
    dir.push(format!("wikicodename_fetch_{label}_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).expect("create temp dir");
    let cache = FileCache::new(PathBuf::from(&dir));
    cache.setup().expect("setup cache");
    Arc::new(cache)
}
