use std::path::Path;
use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use tokio::io::AsyncReadExt;
use tokio::sync::RwLock;
use tracing::{error, info};

use sr_core::{
    coerce_id, ContentType, Error, Navigator, Result, Route, SortKey, Summary, SummaryPreview,
};

use crate::api::{ApiClient, ApiResponse};

const SUMMARY_URL: &str = "/summary/";
const WEBSITE_URL: &str = "/summary/website/";
const TEXT_URL: &str = "/summary/text/";
const FILE_URL: &str = "/summary/file/";
const VIDEO_URL: &str = "/summary/video/";
const SEARCH_URL: &str = "/summary/search/";

/// How many rows a list page asks for unless told otherwise.
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Search is capped small; results replace instead of paginate.
pub const SEARCH_LIMIT: u32 = 5;

const CREATE_FALLBACK: &str = "Something went wrong";

/// Filters accepted by the list endpoints.
#[derive(Debug, Clone)]
pub struct SummaryFilters {
    pub limit: u32,
    pub private: Option<bool>,
    pub me: bool,
    pub sort: SortKey,
    pub content_type: Option<ContentType>,
    pub category: Option<String>,
}

impl Default for SummaryFilters {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            private: None,
            me: false,
            sort: SortKey::default(),
            content_type: None,
            category: None,
        }
    }
}

/// One cursor-paginated list. Pages append; the cursor is the id of the
/// last row of the previous page.
#[derive(Debug, Clone, Default)]
pub struct PagedList {
    pub items: Vec<SummaryPreview>,
    pub cursor: Option<String>,
    pub complete: bool,
    pub loading: bool,
}

impl PagedList {
    fn push_page(&mut self, page: Vec<SummaryPreview>, limit: u32) {
        // a page shorter than asked for means the server ran out
        if (page.len() as u32) < limit {
            self.complete = true;
        }
        if let Some(last) = page.last() {
            self.cursor = Some(last.id.clone());
        }
        self.items.extend(page);
    }
}

#[derive(Debug, Clone, Copy)]
enum ListTarget {
    Own,
    Discovery,
    Previews,
}

/// Observable content state the interface renders from.
#[derive(Debug, Clone, Default)]
pub struct SummaryState {
    pub summaries: PagedList,
    pub discovery: PagedList,
    pub previews: PagedList,
    pub search_results: Vec<SummaryPreview>,
    pub search_loading: bool,
    pub current: Option<Summary>,
    pub detail_loading: bool,
    pub created_id: Option<String>,
    pub create_loading: bool,
    pub error: Option<String>,
}

impl SummaryState {
    fn list_mut(&mut self, target: ListTarget) -> &mut PagedList {
        match target {
            ListTarget::Own => &mut self.summaries,
            ListTarget::Discovery => &mut self.discovery,
            ListTarget::Previews => &mut self.previews,
        }
    }
}

/// Content manager: everything the client knows about summaries.
pub struct SummaryStore {
    api: Arc<ApiClient>,
    navigator: Arc<dyn Navigator>,
    state: RwLock<SummaryState>,
}

impl SummaryStore {
    pub fn new(api: Arc<ApiClient>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            api,
            navigator,
            state: RwLock::new(SummaryState::default()),
        }
    }

    pub async fn state(&self) -> SummaryState {
        self.state.read().await.clone()
    }

    /// Next page of the signed-in user's own summaries. Returns whether
    /// the page actually loaded; a rejected or unreachable server leaves
    /// the list as it was.
    pub async fn get_summaries(&self, filters: &SummaryFilters) -> Result<bool> {
        let mut filters = filters.clone();
        filters.me = true;
        self.fetch_page(ListTarget::Own, &filters).await
    }

    /// Next page of other people's public summaries. Returns whether the
    /// page actually loaded.
    pub async fn get_discovery_summaries(&self, filters: &SummaryFilters) -> Result<bool> {
        let mut filters = filters.clone();
        filters.me = false;
        filters.private = Some(false);
        self.fetch_page(ListTarget::Discovery, &filters).await
    }

    /// Next page of the mixed preview rail, filters taken as given.
    /// Returns whether the page actually loaded.
    pub async fn get_preview_summaries(&self, filters: &SummaryFilters) -> Result<bool> {
        self.fetch_page(ListTarget::Previews, filters).await
    }

    pub async fn reset_summaries(&self) {
        self.state.write().await.summaries = PagedList::default();
    }

    pub async fn reset_discovery(&self) {
        self.state.write().await.discovery = PagedList::default();
    }

    pub async fn reset_previews(&self) {
        self.state.write().await.previews = PagedList::default();
    }

    /// Full-text search. Results replace the previous ones; a failed
    /// search keeps them.
    pub async fn search_summaries(&self, query: &str) -> Result<()> {
        self.state.write().await.search_loading = true;

        let params = [
            ("query", query.to_string()),
            ("limit", SEARCH_LIMIT.to_string()),
        ];
        let outcome = self
            .api
            .send_query(Method::GET, SEARCH_URL, &params, None)
            .await;

        let mut state = self.state.write().await;
        state.search_loading = false;
        if let Ok(response) = outcome {
            if response.ok() {
                state.search_results = map_preview_page(&response.body);
            }
        }
        Ok(())
    }

    /// Summarize a web page.
    pub async fn create_website_summary(
        &self,
        url: &str,
        prompt: &str,
        private: bool,
    ) -> Result<Option<String>> {
        let payload = json!({ "url": url, "prompt": prompt, "private": private });
        self.create(WEBSITE_URL, &payload).await
    }

    /// Summarize a pasted block of text.
    pub async fn create_text_summary(
        &self,
        text: &str,
        prompt: &str,
        private: bool,
    ) -> Result<Option<String>> {
        let payload = json!({ "text": text, "prompt": prompt, "private": private });
        self.create(TEXT_URL, &payload).await
    }

    /// Summarize a video by its URL.
    pub async fn create_video_summary(
        &self,
        url: &str,
        prompt: &str,
        private: bool,
    ) -> Result<Option<String>> {
        let payload = json!({ "url": url, "prompt": prompt, "private": private });
        self.create(VIDEO_URL, &payload).await
    }

    /// Summarize a document, uploaded as multipart form data. Only the
    /// local file read can fail hard; server rejections land in the
    /// error field like every other create.
    pub async fn create_file_summary(
        &self,
        path: &Path,
        prompt: &str,
        private: bool,
    ) -> Result<Option<String>> {
        let mut file = tokio::fs::File::open(path).await?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer).await?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload")
            .to_string();

        self.begin_create().await;
        let form = Form::new()
            .part("file", Part::bytes(buffer).file_name(file_name))
            .text("prompt", prompt.to_string())
            .text("private", private.to_string());

        let outcome = self.api.send_multipart(FILE_URL, form).await;
        self.finish_create(outcome).await
    }

    /// Like a summary. The server answers with the updated record, which
    /// replaces every local copy; nothing is recomputed client-side.
    pub async fn add_like(&self, id: &str) -> Result<Option<Summary>> {
        self.mutate("like", id).await
    }

    /// Dislike a summary.
    pub async fn add_dislike(&self, id: &str) -> Result<Option<Summary>> {
        self.mutate("dislike", id).await
    }

    /// Toggle a summary in the signed-in user's favorites.
    pub async fn add_favorite(&self, id: &str) -> Result<Option<Summary>> {
        self.mutate("favorite", id).await
    }

    /// Delete a summary, prune it from every loaded list and leave its
    /// view for the panel.
    pub async fn delete_summary(&self, id: &str) -> Result<bool> {
        let path = format!("/summary/id/{}/", id);
        let outcome = self.api.send(Method::DELETE, &path, None).await;
        if !ApiClient::is_ok(&outcome) {
            return Ok(false);
        }

        {
            let mut state = self.state.write().await;
            state.summaries.items.retain(|item| item.id != id);
            state.discovery.items.retain(|item| item.id != id);
            state.previews.items.retain(|item| item.id != id);
            state.search_results.retain(|item| item.id != id);
            if state.current.as_ref().map(|c| c.id == id).unwrap_or(false) {
                state.current = None;
            }
        }
        info!("Deleted summary {}", id);
        self.navigator.navigate(Route::Panel);
        Ok(true)
    }

    /// Fetch one summary in full. A 401 surfaces as
    /// [`Error::Unauthorized`] so the caller can bounce to login; any
    /// other rejection reads as not found.
    pub async fn get_summary_by_id(&self, id: &str) -> Result<Summary> {
        self.state.write().await.detail_loading = true;

        let path = format!("/summary/id/{}/", id);
        let outcome = self.api.send(Method::GET, &path, None).await;

        let mut state = self.state.write().await;
        state.detail_loading = false;
        let response = outcome?;
        if response.status == StatusCode::UNAUTHORIZED {
            return Err(Error::Unauthorized);
        }
        if !response.ok() {
            return Err(Error::NotFound);
        }

        let summary = map_summary_body(&response.body);
        state.current = Some(summary.clone());
        Ok(summary)
    }

    /// Back to a blank slate, as after logout.
    pub async fn reset_state(&self) {
        *self.state.write().await = SummaryState::default();
    }

    async fn fetch_page(&self, target: ListTarget, filters: &SummaryFilters) -> Result<bool> {
        let cursor = {
            let mut state = self.state.write().await;
            let list = state.list_mut(target);
            list.loading = true;
            list.cursor.clone()
        };

        let mut query: Vec<(&str, String)> = vec![
            ("limit", filters.limit.to_string()),
            ("me", filters.me.to_string()),
            ("sort", filters.sort.to_string()),
        ];
        if let Some(cursor) = cursor {
            query.push(("startAfter", cursor));
        }
        if let Some(private) = filters.private {
            query.push(("private", private.to_string()));
        }
        if let Some(content_type) = filters.content_type {
            query.push(("contentType", content_type.to_string()));
        }
        if let Some(category) = &filters.category {
            query.push(("category", category.clone()));
        }

        let outcome = self
            .api
            .send_query(Method::GET, SUMMARY_URL, &query, None)
            .await;

        let mut state = self.state.write().await;
        let list = state.list_mut(target);
        list.loading = false;
        let loaded = match outcome {
            Ok(response) if response.ok() => {
                list.push_page(map_preview_page(&response.body), filters.limit);
                true
            }
            _ => false,
        };
        Ok(loaded)
    }

    async fn create(&self, path: &str, payload: &Value) -> Result<Option<String>> {
        self.begin_create().await;
        let outcome = self.api.send(Method::POST, path, Some(payload)).await;
        self.finish_create(outcome).await
    }

    async fn begin_create(&self) {
        let mut state = self.state.write().await;
        state.create_loading = true;
        state.created_id = None;
        state.error = None;
    }

    async fn finish_create(&self, outcome: Result<ApiResponse>) -> Result<Option<String>> {
        let mut state = self.state.write().await;
        state.create_loading = false;
        match outcome {
            Ok(response) if response.ok() => {
                let id = response
                    .body
                    .get("id")
                    .and_then(coerce_id)
                    .unwrap_or_default();
                state.created_id = Some(id.clone());
                state.error = None;
                Ok(Some(id))
            }
            Ok(response) => {
                state.error = Some(response.message(CREATE_FALLBACK));
                Ok(None)
            }
            Err(e) => {
                error!("Create request failed: {}", e);
                state.error = Some(CREATE_FALLBACK.to_string());
                Ok(None)
            }
        }
    }

    async fn mutate(&self, action: &str, id: &str) -> Result<Option<Summary>> {
        let path = format!("/summary/{}/{}/", action, id);
        let outcome = self.api.send(Method::POST, &path, None).await;
        let response = match outcome {
            Ok(response) if response.ok() => response,
            _ => return Ok(None),
        };

        let updated = map_summary_body(&response.body);
        self.apply_update(&updated).await;
        Ok(Some(updated))
    }

    // The server's record replaces every local copy wholesale.
    async fn apply_update(&self, summary: &Summary) {
        let preview = SummaryPreview::from_summary(summary);
        let mut state = self.state.write().await;
        replace_in(&mut state.summaries.items, &preview);
        replace_in(&mut state.discovery.items, &preview);
        replace_in(&mut state.previews.items, &preview);
        replace_in(&mut state.search_results, &preview);
        if state
            .current
            .as_ref()
            .map(|c| c.id == summary.id)
            .unwrap_or(false)
        {
            state.current = Some(summary.clone());
        }
    }
}

fn replace_in(items: &mut [SummaryPreview], preview: &SummaryPreview) {
    for item in items.iter_mut() {
        if item.id == preview.id {
            *item = preview.clone();
        }
    }
}

/// Rows out of a list response, wrapped (`{"summaries": [...]}`) or bare.
fn map_preview_page(body: &Value) -> Vec<SummaryPreview> {
    let rows = match body {
        Value::Array(rows) => rows.as_slice(),
        _ => body
            .get("summaries")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]),
    };
    rows.iter().map(SummaryPreview::from_value).collect()
}

/// One record out of a detail or mutation response, wrapped or bare.
fn map_summary_body(body: &Value) -> Summary {
    Summary::from_value(body.get("summary").unwrap_or(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sr_storage::MemoryStorage;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::ClientConfig;
    use crate::navigation::RouteLog;

    struct Harness {
        store: SummaryStore,
        navigator: Arc<RouteLog>,
    }

    fn harness(server: &MockServer) -> Harness {
        let storage = Arc::new(MemoryStorage::new());
        let navigator = Arc::new(RouteLog::new());
        let api = Arc::new(
            ApiClient::new(ClientConfig::new(server.uri()), storage).unwrap(),
        );
        let store = SummaryStore::new(api, navigator.clone());
        Harness { store, navigator }
    }

    fn page(ids: &[&str]) -> Value {
        json!({
            "summaries": ids
                .iter()
                .map(|id| json!({ "id": id, "title": format!("title {}", id) }))
                .collect::<Vec<_>>(),
        })
    }

    #[tokio::test]
    async fn test_pages_append_and_cursor_follows_the_last_row() {
        let server = MockServer::start().await;
        let filters = SummaryFilters {
            limit: 2,
            ..SummaryFilters::default()
        };

        Mock::given(method("GET"))
            .and(path(SUMMARY_URL))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(&["5", "3"])))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        let h = harness(&server);
        assert!(h.store.get_summaries(&filters).await.unwrap());

        let state = h.store.state().await;
        assert_eq!(state.summaries.items.len(), 2);
        assert_eq!(state.summaries.cursor, Some("3".to_string()));
        assert!(!state.summaries.complete);
        assert!(!state.summaries.loading);

        // the next page is requested after the cursor and, being short,
        // closes the list
        Mock::given(method("GET"))
            .and(path(SUMMARY_URL))
            .and(query_param("startAfter", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(&["1"])))
            .expect(1)
            .mount(&server)
            .await;

        h.store.get_summaries(&filters).await.unwrap();

        let state = h.store.state().await;
        assert_eq!(state.summaries.items.len(), 3);
        assert_eq!(state.summaries.cursor, Some("1".to_string()));
        assert!(state.summaries.complete);
    }

    #[tokio::test]
    async fn test_own_and_discovery_lists_send_their_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SUMMARY_URL))
            .and(query_param("me", "true"))
            .and(query_param("sort", "date"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(&["a"])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(SUMMARY_URL))
            .and(query_param("me", "false"))
            .and(query_param("private", "false"))
            .and(query_param("sort", "likes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(&["b"])))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server);
        h.store
            .get_summaries(&SummaryFilters::default())
            .await
            .unwrap();
        h.store
            .get_discovery_summaries(&SummaryFilters {
                sort: SortKey::Likes,
                ..SummaryFilters::default()
            })
            .await
            .unwrap();

        let state = h.store.state().await;
        assert_eq!(state.summaries.items[0].id, "a");
        assert_eq!(state.discovery.items[0].id, "b");
    }

    #[tokio::test]
    async fn test_preview_rail_passes_content_filters_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SUMMARY_URL))
            .and(query_param("contentType", "video"))
            .and(query_param("category", "science"))
            .and(query_param("limit", "4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(&["v1"])))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server);
        h.store
            .get_preview_summaries(&SummaryFilters {
                limit: 4,
                content_type: Some(ContentType::Video),
                category: Some("science".to_string()),
                ..SummaryFilters::default()
            })
            .await
            .unwrap();

        assert_eq!(h.store.state().await.previews.items.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_page_load_reports_it_and_keeps_the_list_as_it_was() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SUMMARY_URL))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({})))
            .mount(&server)
            .await;

        let h = harness(&server);
        let loaded = h
            .store
            .get_summaries(&SummaryFilters::default())
            .await
            .unwrap();

        assert!(!loaded);
        let state = h.store.state().await;
        assert!(state.summaries.items.is_empty());
        assert_eq!(state.summaries.cursor, None);
        assert!(!state.summaries.complete);
        assert!(!state.summaries.loading);
    }

    #[tokio::test]
    async fn test_unreachable_server_reads_as_a_failed_page() {
        let storage = Arc::new(MemoryStorage::new());
        let navigator = Arc::new(RouteLog::new());
        let api = Arc::new(
            ApiClient::new(ClientConfig::new("http://127.0.0.1:9"), storage).unwrap(),
        );
        let store = SummaryStore::new(api, navigator);

        let loaded = store
            .get_summaries(&SummaryFilters::default())
            .await
            .unwrap();
        assert!(!loaded);
        assert!(!store.state().await.summaries.loading);
    }

    #[tokio::test]
    async fn test_search_replaces_previous_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SEARCH_URL))
            .and(query_param("query", "rust"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(&["r1", "r2"])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(SEARCH_URL))
            .and(query_param("query", "go"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(&["g1"])))
            .mount(&server)
            .await;

        let h = harness(&server);
        h.store.search_summaries("rust").await.unwrap();
        assert_eq!(h.store.state().await.search_results.len(), 2);

        h.store.search_summaries("go").await.unwrap();
        let state = h.store.state().await;
        assert_eq!(state.search_results.len(), 1);
        assert_eq!(state.search_results[0].id, "g1");
    }

    #[tokio::test]
    async fn test_failed_search_keeps_the_old_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SEARCH_URL))
            .and(query_param("query", "rust"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(&["r1"])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(SEARCH_URL))
            .and(query_param("query", "down"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({})))
            .mount(&server)
            .await;

        let h = harness(&server);
        h.store.search_summaries("rust").await.unwrap();
        h.store.search_summaries("down").await.unwrap();

        let state = h.store.state().await;
        assert_eq!(state.search_results.len(), 1);
        assert!(!state.search_loading);
    }

    #[tokio::test]
    async fn test_create_stores_the_new_id_and_clears_the_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TEXT_URL))
            .and(body_json(json!({
                "text": "long article",
                "prompt": "short please",
                "private": true,
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "abc" })))
            .mount(&server)
            .await;

        let h = harness(&server);
        let created = h
            .store
            .create_text_summary("long article", "short please", true)
            .await
            .unwrap();

        assert_eq!(created, Some("abc".to_string()));
        let state = h.store.state().await;
        assert_eq!(state.created_id, Some("abc".to_string()));
        assert_eq!(state.error, None);
        assert!(!state.create_loading);
    }

    #[tokio::test]
    async fn test_create_failure_surfaces_the_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(WEBSITE_URL))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({ "message": "that url is unreachable" })),
            )
            .mount(&server)
            .await;

        let h = harness(&server);
        let created = h
            .store
            .create_website_summary("http://nope.example", "tl;dr", false)
            .await
            .unwrap();

        assert_eq!(created, None);
        let state = h.store.state().await;
        assert_eq!(state.created_id, None);
        assert_eq!(state.error, Some("that url is unreachable".to_string()));
    }

    #[tokio::test]
    async fn test_create_transport_failure_uses_the_fallback_message() {
        let storage = Arc::new(MemoryStorage::new());
        let navigator = Arc::new(RouteLog::new());
        let api = Arc::new(
            ApiClient::new(ClientConfig::new("http://127.0.0.1:9"), storage).unwrap(),
        );
        let store = SummaryStore::new(api, navigator);

        let created = store
            .create_video_summary("http://vid.example/x", "", false)
            .await
            .unwrap();

        assert_eq!(created, None);
        assert_eq!(store.state().await.error, Some(CREATE_FALLBACK.to_string()));
    }

    #[tokio::test]
    async fn test_create_numeric_id_coerces_to_a_string() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(VIDEO_URL))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 42 })))
            .mount(&server)
            .await;

        let h = harness(&server);
        let created = h
            .store
            .create_video_summary("http://vid.example/x", "", false)
            .await
            .unwrap();
        assert_eq!(created, Some("42".to_string()));
    }

    #[tokio::test]
    async fn test_create_file_uploads_multipart_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(FILE_URL))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "f1" })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("paper.txt");
        tokio::fs::write(&file_path, b"the full paper text")
            .await
            .unwrap();

        let h = harness(&server);
        let created = h
            .store
            .create_file_summary(&file_path, "key findings", false)
            .await
            .unwrap();
        assert_eq!(created, Some("f1".to_string()));

        let requests = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&requests[0].body);
        assert!(body.contains("name=\"file\""));
        assert!(body.contains("paper.txt"));
        assert!(body.contains("the full paper text"));
        assert!(body.contains("name=\"prompt\""));
        assert!(body.contains("key findings"));
        assert!(body.contains("name=\"private\""));
    }

    #[tokio::test]
    async fn test_missing_upload_file_is_an_io_error() {
        let server = MockServer::start().await;
        let h = harness(&server);

        let result = h
            .store
            .create_file_summary(Path::new("/definitely/not/here.txt"), "", false)
            .await;
        assert!(matches!(result, Err(Error::Io(_))));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reactions_replace_the_local_copies_wholesale() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SUMMARY_URL))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "summaries": [
                    { "id": "s1", "title": "first", "likes": 40 },
                    { "id": "s2", "title": "second", "likes": 7 },
                ],
            })))
            .mount(&server)
            .await;
        // the server answers with its own idea of the new counter
        Mock::given(method("POST"))
            .and(path("/summary/like/s1/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "summary": { "id": "s1", "title": "first", "likes": 44 },
            })))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server);
        h.store
            .get_summaries(&SummaryFilters {
                limit: 2,
                ..SummaryFilters::default()
            })
            .await
            .unwrap();

        let updated = h.store.add_like("s1").await.unwrap().unwrap();
        assert_eq!(updated.likes, 44);

        let state = h.store.state().await;
        assert_eq!(state.summaries.items[0].likes, 44);
        assert_eq!(state.summaries.items[1].likes, 7);
    }

    #[tokio::test]
    async fn test_reaction_updates_the_open_detail_view() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/summary/id/s1/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "summary": { "id": "s1", "title": "first", "favorites": 1 },
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/summary/favorite/s1/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "summary": { "id": "s1", "title": "first", "favorites": 2 },
            })))
            .mount(&server)
            .await;

        let h = harness(&server);
        h.store.get_summary_by_id("s1").await.unwrap();
        h.store.add_favorite("s1").await.unwrap();

        let state = h.store.state().await;
        assert_eq!(state.current.unwrap().favorites, 2);
    }

    #[tokio::test]
    async fn test_failed_reaction_changes_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/summary/dislike/s1/"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({})))
            .mount(&server)
            .await;

        let h = harness(&server);
        assert_eq!(h.store.add_dislike("s1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_prunes_everywhere_and_returns_to_the_panel() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SUMMARY_URL))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(&["s1", "s2"])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/summary/id/s1/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "summary": { "id": "s1", "title": "doomed" },
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/summary/id/s1/"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let h = harness(&server);
        h.store
            .get_summaries(&SummaryFilters {
                limit: 2,
                ..SummaryFilters::default()
            })
            .await
            .unwrap();
        h.store.get_summary_by_id("s1").await.unwrap();

        assert!(h.store.delete_summary("s1").await.unwrap());

        let state = h.store.state().await;
        assert_eq!(state.summaries.items.len(), 1);
        assert_eq!(state.summaries.items[0].id, "s2");
        assert_eq!(state.current, None);
        assert_eq!(h.navigator.last(), Some(Route::Panel));
    }

    #[tokio::test]
    async fn test_failed_delete_leaves_everything_in_place() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SUMMARY_URL))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(&["s1"])))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/summary/id/s1/"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({})))
            .mount(&server)
            .await;

        let h = harness(&server);
        h.store
            .get_summaries(&SummaryFilters::default())
            .await
            .unwrap();

        assert!(!h.store.delete_summary("s1").await.unwrap());
        assert_eq!(h.store.state().await.summaries.items.len(), 1);
        assert!(h.navigator.history().is_empty());
    }

    #[tokio::test]
    async fn test_detail_distinguishes_unauthorized_from_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/summary/id/locked/"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/summary/id/gone/"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({})))
            .mount(&server)
            .await;

        let h = harness(&server);
        assert!(matches!(
            h.store.get_summary_by_id("locked").await,
            Err(Error::Unauthorized)
        ));
        assert!(matches!(
            h.store.get_summary_by_id("gone").await,
            Err(Error::NotFound)
        ));
        let state = h.store.state().await;
        assert_eq!(state.current, None);
        assert!(!state.detail_loading);
    }

    #[tokio::test]
    async fn test_reset_state_forgets_everything() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SUMMARY_URL))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(&["s1"])))
            .mount(&server)
            .await;

        let h = harness(&server);
        h.store
            .get_summaries(&SummaryFilters::default())
            .await
            .unwrap();
        assert!(!h.store.state().await.summaries.items.is_empty());

        h.store.reset_state().await;

        let state = h.store.state().await;
        assert!(state.summaries.items.is_empty());
        assert_eq!(state.summaries.cursor, None);
        assert_eq!(state.created_id, None);
        assert_eq!(state.error, None);
    }
}
