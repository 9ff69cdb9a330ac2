//! REST backend over `reqwest`.

use std::sync::Arc;

use aryu_app::{ApiError, Backend, Draft};
use aryu_core::{ChannelConfig, SessionContext};
use aryu_proto::{Item, ItemId, QuizQuestion, Resource};
use reqwest::{
    Method, RequestBuilder,
    multipart::{Form, Part},
};

use crate::{
    Endpoints,
    body::{self, BODY_FIELD},
};

/// [`Backend`] talking to the portal's REST API with the session's bearer
/// token. Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    endpoints: Endpoints,
    token: Arc<str>,
}

impl HttpBackend {
    /// Backend for a signed-in session.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ChannelConfig, session: &SessionContext) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self { client, endpoints: Endpoints::new(config), token: Arc::from(session.token.as_str()) })
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        self.client.request(method, url).bearer_auth(&self.token)
    }

    /// Send a request and return the body of a success response.
    async fn execute(&self, request: RequestBuilder) -> Result<Vec<u8>, ApiError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let raw = response.bytes().await.map_err(transport_error)?;

        if status.is_success() {
            Ok(raw.to_vec())
        } else {
            tracing::debug!(status = status.as_u16(), "request rejected");
            Err(body::status_error(status.as_u16(), &raw))
        }
    }
}

impl Backend for HttpBackend {
    async fn list_items(&self, resource: &Resource) -> Result<Vec<Item>, ApiError> {
        let raw = self.execute(self.request(Method::GET, self.endpoints.items(resource))).await?;
        body::decode_list(&raw)
    }

    async fn get_one(&self, resource: &Resource, id: ItemId) -> Result<Item, ApiError> {
        let raw = self.execute(self.request(Method::GET, self.endpoints.item(resource, id))).await?;
        body::decode_one(&raw)
    }

    async fn send(&self, resource: &Resource, draft: &Draft) -> Result<Item, ApiError> {
        let mut form = Form::new().text(BODY_FIELD, draft.body.clone());
        for attachment in &draft.attachments {
            let part = Part::bytes(attachment.bytes.clone()).file_name(attachment.name.clone());
            form = form.part(body::attachment_field(attachment.kind), part);
        }

        let request = self.request(Method::POST, self.endpoints.items(resource)).multipart(form);
        let raw = self.execute(request).await?;
        body::decode_one(&raw)
    }

    async fn mark_read(&self, resource: &Resource, id: ItemId) -> Result<(), ApiError> {
        let url = self.endpoints.mark_read(resource, id);
        self.execute(self.request(Method::PATCH, url)).await.map(drop)
    }

    async fn mark_all_read(&self, resource: &Resource) -> Result<(), ApiError> {
        let url = self.endpoints.read_all(resource);
        self.execute(self.request(Method::POST, url)).await.map(drop)
    }

    async fn list_questions(&self, resource: &Resource) -> Result<Vec<QuizQuestion>, ApiError> {
        let raw = self.execute(self.request(Method::GET, self.endpoints.questions(resource))).await?;
        let mut questions: Vec<QuizQuestion> = body::decode_list(&raw)?;
        questions.sort_by_key(|q| q.index);
        Ok(questions)
    }
}

fn transport_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else if e.is_decode() {
        ApiError::Decode(e.to_string())
    } else {
        ApiError::Network(e.without_url().to_string())
    }
}
