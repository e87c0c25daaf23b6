use crate::store::{StoreError, TemplateFilter, TemplateStore};
use crate::template::Template;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use url::Url;

#[derive(Serialize)]
struct FindOneRequest<'a> {
    database: &'a str,
    collection: &'a str,
    filter: Value,
}

#[derive(Deserialize)]
struct FindOneResponse {
    document: Option<Value>,
}

/// Template store backed by an HTTP document API exposing a `findOne` action
/// (`POST {base}/action/findOne`).
pub struct DocumentApiStore {
    client: reqwest::Client,
    find_one_url: Url,
    database: String,
    collection: String,
    api_key: Option<String>,
}

impl DocumentApiStore {
    pub fn new(
        base_url: &Url,
        database: String,
        collection: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let full_url = format!("{}/action/findOne", base_url.as_str().trim_end_matches('/'));
        let find_one_url =
            Url::parse(&full_url).map_err(|e| StoreError::InvalidUrl(e.to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(StoreError::from)?;

        Ok(DocumentApiStore {
            client,
            find_one_url,
            database,
            collection,
            api_key,
        })
    }
}

#[async_trait]
impl TemplateStore for DocumentApiStore {
    async fn find_one(&self, filter: &TemplateFilter) -> Result<Option<Template>, StoreError> {
        let body = FindOneRequest {
            database: &self.database,
            collection: &self.collection,
            filter: filter.to_document(),
        };

        let mut request = self.client.post(self.find_one_url.clone()).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.header("api-key", api_key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(StoreError::Status(response.status().as_u16()));
        }

        let found = response.json::<FindOneResponse>().await?;
        tracing::debug!(filter = ?filter, found = found.document.is_some(), "Template lookup");

        found
            .document
            .map(Template::from_document)
            .transpose()
            .map_err(StoreError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::StatusCode;
    use shared::testutils::{TestServer, unused_port};
    use serde_json::json;

    fn store_for(url: &str) -> DocumentApiStore {
        DocumentApiStore::new(
            &Url::parse(url).unwrap(),
            "templates_db".into(),
            "session_templates".into(),
            Some("secret".into()),
            Duration::from_secs(2),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_find_one() {
        let server = TestServer::spawn(
            StatusCode::OK,
            json!({"document": {
                "_id": "session.meta.ads.v1",
                "active": true,
                "channel": "ads",
                "require": ["campaign_id"]
            }}),
        )
        .await;
        let store = store_for(&format!("{}/app/data-api/v1/", server.url()));

        let template = store
            .find_one(&TemplateFilter::ActiveById("session.meta.ads.v1".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(template.id, "session.meta.ads.v1");
        assert_eq!(template.require, vec!["campaign_id"]);

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, "/app/data-api/v1/action/findOne");
        assert_eq!(requests[0].header("api-key"), Some("secret"));
        assert_eq!(
            requests[0].body,
            json!({
                "database": "templates_db",
                "collection": "session_templates",
                "filter": {"_id": "session.meta.ads.v1", "active": true}
            })
        );
    }

    #[tokio::test]
    async fn test_find_one_absent() {
        let server = TestServer::spawn(StatusCode::OK, json!({"document": null})).await;
        let store = store_for(&server.url());

        let found = store
            .find_one(&TemplateFilter::ActiveBySource("meta".into()))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_find_one_errors() {
        let server =
            TestServer::spawn(StatusCode::SERVICE_UNAVAILABLE, json!({"error": "down"})).await;
        let err = store_for(&server.url())
            .find_one(&TemplateFilter::ActiveBySource("meta".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Status(503)));

        let server = TestServer::spawn(StatusCode::OK, json!({"document": {"_id": "x"}})).await;
        let err = store_for(&server.url())
            .find_one(&TemplateFilter::ActiveBySource("meta".into()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "malformed_template");

        let port = unused_port().await;
        let err = store_for(&format!("http://127.0.0.1:{port}"))
            .find_one(&TemplateFilter::ActiveBySource("meta".into()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "connect");
    }
}
