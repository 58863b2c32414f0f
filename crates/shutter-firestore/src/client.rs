//! Firestore REST client.

use reqwest::header::AUTHORIZATION;
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument, trace};

use shutter_core::error::{ProtocolError, TransportError};
use shutter_core::feed::Collection;
use shutter_core::types::StoreUrl;
use shutter_core::{Error, Result};

use crate::document::{Document, Fields};
use crate::query::StructuredQuery;

/// Map a reqwest failure onto the transport taxonomy.
pub(crate) fn transport(err: reqwest::Error) -> Error {
    let transport = if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
    };
    Error::Transport(transport)
}

/// Firestore error body: `{"error": {"code", "message", "status"}}`.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// One element of a `:runQuery` response stream.
#[derive(Debug, Deserialize)]
struct RunQueryResponse {
    #[serde(default)]
    document: Option<Document>,
}

/// HTTP client for the Firestore documents API.
#[derive(Debug, Clone)]
pub struct FirestoreClient {
    client: reqwest::Client,
    root: StoreUrl,
    token: Option<String>,
}

impl FirestoreClient {
    /// Create a client for the documents root `root`.
    ///
    /// `token` is sent as a bearer token when present; emulators need none.
    pub fn new(root: StoreUrl, token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("shutter/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(transport)?;

        Ok(Self {
            client,
            root,
            token,
        })
    }

    /// Returns the documents root this client talks to.
    pub fn root(&self) -> &StoreUrl {
        &self.root
    }

    /// The resource name of a document, as `__name__` orders and matches it.
    pub fn document_name(&self, collection: Collection, id: &str) -> String {
        let path = self.root.as_url().path().trim_end_matches('/');
        let root = path.find("projects/").map_or(path, |at| &path[at..]);
        format!("{}/{}/{}", root, collection, id)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        }
    }

    /// Run a structured query and return the matching documents.
    #[instrument(skip(self, query), fields(root = %self.root))]
    pub async fn run_query(&self, query: &StructuredQuery) -> Result<Vec<Document>> {
        let url = self.root.endpoint(":runQuery");
        trace!(?query, "runQuery");

        let response = self
            .authorize(self.client.post(&url))
            .json(&json!({ "structuredQuery": query }))
            .send()
            .await
            .map_err(transport)?;

        let results: Vec<RunQueryResponse> = self.handle_response(response).await?;
        let documents: Vec<Document> = results.into_iter().filter_map(|r| r.document).collect();

        debug!(count = documents.len(), "Query returned documents");

        Ok(documents)
    }

    /// Create a document; Firestore picks the id when `id` is `None`.
    #[instrument(skip(self, values), fields(root = %self.root))]
    pub async fn create_document(
        &self,
        collection: Collection,
        id: Option<&str>,
        values: Fields,
    ) -> Result<Document> {
        let url = self.root.endpoint(&format!("/{}", collection));
        let mut request = self.client.post(&url);
        if let Some(id) = id {
            request = request.query(&[("documentId", id)]);
        }

        let response = self
            .authorize(request)
            .json(&json!({ "fields": values }))
            .send()
            .await
            .map_err(transport)?;

        let document: Document = self.handle_response(response).await?;
        debug!(name = %document.name, "Created document");

        Ok(document)
    }

    /// Fetch a document, or `None` if it does not exist.
    #[instrument(skip(self), fields(root = %self.root))]
    pub async fn get_document(&self, collection: Collection, id: &str) -> Result<Option<Document>> {
        let url = self.root.endpoint(&format!("/{}/{}", collection, id));

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(transport)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        self.handle_response(response).await.map(Some)
    }

    /// Delete a document. Deleting a missing document succeeds.
    #[instrument(skip(self), fields(root = %self.root))]
    pub async fn delete_document(&self, collection: Collection, id: &str) -> Result<()> {
        let url = self.root.endpoint(&format!("/{}/{}", collection, id));

        let response = self
            .authorize(self.client.delete(&url))
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(Error::Protocol(self.parse_error_response(response).await))
        }
    }

    /// Handle a response, parsing the body or error.
    async fn handle_response<R: DeserializeOwned>(&self, response: reqwest::Response) -> Result<R> {
        let status = response.status();
        trace!(status = %status, "Firestore response");

        if status.is_success() {
            response.json::<R>().await.map_err(transport)
        } else {
            Err(Error::Protocol(self.parse_error_response(response).await))
        }
    }

    /// Parse a Firestore error response.
    async fn parse_error_response(&self, response: reqwest::Response) -> ProtocolError {
        let status = response.status().as_u16();

        match response.json::<ErrorResponse>().await {
            Ok(body) => ProtocolError::new(status, body.error.status, body.error.message),
            Err(_) => ProtocolError::new(status, None, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::document::string_value;
    use crate::query::FieldOp;

    async fn client(server: &MockServer, token: Option<&str>) -> FirestoreClient {
        let root = StoreUrl::new(format!("{}/v1/projects/demo/databases/(default)/documents", server.uri()))
            .unwrap();
        FirestoreClient::new(root, token.map(str::to_string)).unwrap()
    }

    const ROOT: &str = "/v1/projects/demo/databases/(default)/documents";

    #[tokio::test]
    async fn run_query_skips_read_time_only_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{}:runQuery", ROOT)))
            .and(header("authorization", "Bearer secret"))
            .and(body_partial_json(json!({
                "structuredQuery": { "from": [{ "collectionId": "posts" }] }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "document": { "name": "x/posts/a", "fields": {} }, "readTime": "t" },
                { "readTime": "t" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server, Some("secret")).await;
        let query = StructuredQuery::new(Collection::Posts).filter("author", FieldOp::Equal, string_value("u1"));
        let documents = client.run_query(&query).await.unwrap();

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].id(), "a");
    }

    #[tokio::test]
    async fn create_document_passes_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{}/follows", ROOT)))
            .and(query_param("documentId", "u1_u2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "x/follows/u1_u2",
                "fields": { "follower": { "stringValue": "u1" } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server, None).await;
        let mut fields = Fields::new();
        fields.insert("follower".into(), string_value("u1"));
        let document = client
            .create_document(Collection::Follows, Some("u1_u2"), fields)
            .await
            .unwrap();
        assert_eq!(document.id(), "u1_u2");
    }

    #[tokio::test]
    async fn document_name_is_relative_to_the_project() {
        let server = MockServer::start().await;
        let client = client(&server, None).await;
        assert_eq!(
            client.document_name(Collection::Posts, "p1"),
            "projects/demo/databases/(default)/documents/posts/p1"
        );
    }

    #[tokio::test]
    async fn missing_document_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{}/users/nobody", ROOT)))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": { "code": 404, "message": "not found", "status": "NOT_FOUND" }
            })))
            .mount(&server)
            .await;

        let client = client(&server, None).await;
        assert!(client.get_document(Collection::Users, "nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn error_body_maps_to_protocol_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{}:runQuery", ROOT)))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {
                    "code": 400,
                    "message": "order by clause cannot contain a field with an equality filter",
                    "status": "INVALID_ARGUMENT"
                }
            })))
            .mount(&server)
            .await;

        let client = client(&server, None).await;
        let err = client
            .run_query(&StructuredQuery::new(Collection::Posts))
            .await
            .unwrap_err();

        match err {
            Error::Protocol(p) => {
                assert_eq!(p.status, 400);
                assert_eq!(p.error.as_deref(), Some("INVALID_ARGUMENT"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
