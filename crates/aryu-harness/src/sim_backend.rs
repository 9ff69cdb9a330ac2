//! In-memory backend implementing the Backend trait.
//!
//! `SimBackend` keeps one item list per resource and behaves like the REST
//! API would: sends get server ids, reads flip flags, lists come back in
//! insertion order. Latency is simulated with tokio sleeps, so under a
//! paused clock a test decides exactly when responses land. Failures are
//! queued and consumed one per request.

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use aryu_app::{ApiError, Backend, Draft};
use aryu_proto::{Attachment, Item, ItemId, QuizQuestion, Resource};

#[derive(Default)]
struct BackendState {
    items: HashMap<Resource, Vec<Item>>,
    questions: HashMap<Resource, Vec<QuizQuestion>>,
    failures: VecDeque<ApiError>,
    latency: Duration,
    requests: Vec<String>,
}

/// In-memory REST backend for deterministic testing.
#[derive(Clone, Default)]
pub struct SimBackend {
    state: Arc<Mutex<BackendState>>,
}

impl SimBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed the item list of a resource.
    #[must_use]
    pub fn with_items(self, resource: &Resource, items: Vec<Item>) -> Self {
        self.lock().items.insert(resource.clone(), items);
        self
    }

    /// Seed the question list of a quiz.
    #[must_use]
    pub fn with_questions(self, resource: &Resource, questions: Vec<QuizQuestion>) -> Self {
        self.lock().questions.insert(resource.clone(), questions);
        self
    }

    /// Delay every response by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.lock().latency = latency;
    }

    /// Fail the next request with `error`. Queued failures apply in order.
    pub fn fail_next(&self, error: ApiError) {
        self.lock().failures.push_back(error);
    }

    /// Add an item on the server side, as if another user had sent it.
    pub fn insert(&self, resource: &Resource, item: Item) {
        self.lock().items.entry(resource.clone()).or_default().push(item);
    }

    /// Current server-side items of a resource.
    pub fn items(&self, resource: &Resource) -> Vec<Item> {
        self.lock().items.get(resource).cloned().unwrap_or_default()
    }

    /// Requests received so far, as `verb kind/id[/item]`.
    pub fn requests(&self) -> Vec<String> {
        self.lock().requests.clone()
    }

    /// Log a request, wait out the latency, and consume a queued failure.
    async fn begin(&self, request: String) -> Result<(), ApiError> {
        let (latency, failure) = {
            let mut state = self.lock();
            state.requests.push(request);
            (state.latency, state.failures.pop_front())
        };

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        failure.map_or(Ok(()), Err)
    }

    fn not_found() -> ApiError {
        ApiError::Status { code: 404, message: Some("Not found.".into()) }
    }
}

impl Backend for SimBackend {
    async fn list_items(&self, resource: &Resource) -> Result<Vec<Item>, ApiError> {
        self.begin(format!("list {resource}")).await?;
        Ok(self.items(resource))
    }

    async fn get_one(&self, resource: &Resource, id: ItemId) -> Result<Item, ApiError> {
        self.begin(format!("get {resource}/{id}")).await?;
        self.lock()
            .items
            .get(resource)
            .and_then(|items| items.iter().find(|i| i.id == id).cloned())
            .ok_or_else(Self::not_found)
    }

    async fn send(&self, resource: &Resource, draft: &Draft) -> Result<Item, ApiError> {
        self.begin(format!("send {resource}")).await?;

        let mut state = self.lock();
        let items = state.items.entry(resource.clone()).or_default();
        let id = items.iter().map(|i| i.id).max().unwrap_or(0) + 1;

        let mut item = Item::new(id, draft.body.clone()).with_read(true);
        item.attachments = draft
            .attachments
            .iter()
            .map(|a| Attachment {
                kind: a.kind,
                url: format!("/media/{}", a.name),
                name: Some(a.name.clone()),
            })
            .collect();

        items.push(item.clone());
        Ok(item)
    }

    async fn mark_read(&self, resource: &Resource, id: ItemId) -> Result<(), ApiError> {
        self.begin(format!("read {resource}/{id}")).await?;
        let mut state = self.lock();
        let item = state
            .items
            .get_mut(resource)
            .and_then(|items| items.iter_mut().find(|i| i.id == id))
            .ok_or_else(Self::not_found)?;
        item.read = true;
        Ok(())
    }

    async fn mark_all_read(&self, resource: &Resource) -> Result<(), ApiError> {
        self.begin(format!("read-all {resource}")).await?;
        if let Some(items) = self.lock().items.get_mut(resource) {
            for item in items {
                item.read = true;
            }
        }
        Ok(())
    }

    async fn list_questions(&self, resource: &Resource) -> Result<Vec<QuizQuestion>, ApiError> {
        self.begin(format!("questions {resource}")).await?;
        Ok(self.lock().questions.get(resource).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_assigns_next_id() {
        let room = Resource::chat(1);
        let backend = SimBackend::new().with_items(&room, vec![Item::new(4, "a")]);

        let item = backend.send(&room, &Draft::text("hi")).await.unwrap();
        assert_eq!(item.id, 5);
        assert_eq!(backend.items(&room).len(), 2);
    }

    #[tokio::test]
    async fn queued_failure_applies_once() {
        let room = Resource::chat(1);
        let backend = SimBackend::new();
        backend.fail_next(ApiError::Timeout);

        assert_eq!(backend.list_items(&room).await, Err(ApiError::Timeout));
        assert_eq!(backend.list_items(&room).await, Ok(vec![]));
        assert_eq!(backend.requests(), vec!["list chat/1", "list chat/1"]);
    }

    #[tokio::test]
    async fn mark_read_unknown_item_is_not_found() {
        let room = Resource::notifications(1);
        let backend = SimBackend::new();

        let err = backend.mark_read(&room, 9).await.unwrap_err();
        assert!(matches!(err, ApiError::Status { code: 404, .. }));
    }
}
