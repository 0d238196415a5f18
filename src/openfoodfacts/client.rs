use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::{NutritionSource, SourceError};
use crate::rating::RawNutritionPayload;

#[derive(Debug, Deserialize)]
struct ProductEnvelope {
    #[serde(default)]
    status: i64,
    #[serde(default)]
    product: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    products: Vec<Value>,
}

#[derive(Clone)]
pub struct OpenFoodFactsClient {
    base_url: String,
    client: reqwest::Client,
}

impl OpenFoodFactsClient {
    pub fn new(base_url: &str, user_agent: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl NutritionSource for OpenFoodFactsClient {
    #[instrument(skip(self))]
    async fn fetch(&self, barcode: &str) -> Result<RawNutritionPayload, SourceError> {
        let url = format!("{}/api/v2/product/{}.json", self.base_url, barcode);
        let res = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| SourceError::Upstream(e.to_string()))?;

        match res.status() {
            reqwest::StatusCode::NOT_FOUND => {
                debug!(%barcode, "open food facts returned 404");
                return Err(SourceError::NotFound(barcode.to_string()));
            }
            status if !status.is_success() => {
                let body = res.text().await.unwrap_or_default();
                warn!(%barcode, %status, "unexpected response from open food facts");
                return Err(SourceError::Upstream(format!(
                    "status code {}: {}",
                    status, body
                )));
            }
            _ => {}
        }

        let envelope = res
            .json::<ProductEnvelope>()
            .await
            .map_err(|e| SourceError::Upstream(e.to_string()))?;

        if envelope.status == 0 {
            return Err(SourceError::NotFound(barcode.to_string()));
        }
        envelope
            .product
            .and_then(RawNutritionPayload::from_value)
            .ok_or_else(|| SourceError::NotFound(barcode.to_string()))
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<RawNutritionPayload>, SourceError> {
        let url = format!("{}/cgi/search.pl", self.base_url);
        let res = self
            .client
            .get(&url)
            .query(&[
                ("search_terms", query),
                ("search_simple", "1"),
                ("action", "process"),
                ("json", "1"),
            ])
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| SourceError::Upstream(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!(%query, %status, "open food facts search failed");
            return Err(SourceError::Upstream(format!(
                "status code {}: {}",
                status, body
            )));
        }

        let envelope = res
            .json::<SearchEnvelope>()
            .await
            .map_err(|e| SourceError::Upstream(e.to_string()))?;
        debug!(%query, hits = envelope.products.len(), "open food facts search");

        Ok(envelope
            .products
            .into_iter()
            .filter_map(RawNutritionPayload::from_value)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BARCODE: &str = "3017620422003";

    async fn client_for(server: &MockServer) -> OpenFoodFactsClient {
        OpenFoodFactsClient::new(&format!("{}/", server.uri()), "NutriScan/test").unwrap()
    }

    #[tokio::test]
    async fn fetch_returns_product_object() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/api/v2/product/{BARCODE}.json")))
            .and(header("user-agent", "NutriScan/test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": 1,
                "product": {
                    "product_name": "Nutella",
                    "nutriments": { "fat": 30.9, "fat_unit": "g" }
                }
            })))
            .mount(&server)
            .await;

        let payload = client_for(&server).await.fetch(BARCODE).await.unwrap();
        assert_eq!(payload.text(&["product_name"]), "Nutella");
        assert_eq!(payload.nutrients().len(), 1);
    }

    #[tokio::test]
    async fn http_404_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client_for(&server).await.fetch(BARCODE).await.unwrap_err();
        assert!(matches!(err, SourceError::NotFound(b) if b == BARCODE));
    }

    #[tokio::test]
    async fn status_zero_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "status": 0, "status_verbose": "product not found" })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).await.fetch(BARCODE).await.unwrap_err();
        assert!(matches!(err, SourceError::NotFound(_)));
    }

    #[tokio::test]
    async fn server_error_is_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = client_for(&server).await.fetch(BARCODE).await.unwrap_err();
        match err {
            SourceError::Upstream(msg) => assert!(msg.contains("maintenance")),
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn garbage_body_is_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).await.fetch(BARCODE).await.unwrap_err();
        assert!(matches!(err, SourceError::Upstream(_)));
    }

    #[tokio::test]
    async fn search_sends_terms_and_keeps_object_hits() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cgi/search.pl"))
            .and(query_param("search_terms", "hazelnut spread"))
            .and(query_param("search_simple", "1"))
            .and(query_param("action", "process"))
            .and(query_param("json", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 3,
                "products": [
                    { "code": BARCODE, "product_name": "Nutella" },
                    "broken",
                    { "code": "8000500310427", "product_name": "Nutella B-ready" }
                ]
            })))
            .mount(&server)
            .await;

        let hits = client_for(&server)
            .await
            .search("hazelnut spread")
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text(&["code"]), BARCODE);
        assert_eq!(hits[1].text(&["product_name"]), "Nutella B-ready");
    }

    #[tokio::test]
    async fn search_without_products_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cgi/search.pl"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "count": 0 })))
            .mount(&server)
            .await;

        let hits = client_for(&server).await.search("nothing").await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn search_server_error_is_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cgi/search.pl"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client_for(&server).await.search("nutella").await.unwrap_err();
        assert!(matches!(err, SourceError::Upstream(_)));
    }
}
