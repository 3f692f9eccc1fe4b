use serde::de::DeserializeOwned;
use std::time::Duration;

use super::error::FetchError;
use super::types::{Position, TrackPoint, Vehicle, VehicleId};
use super::Backend;

/// `Backend` over the dashboard's JSON HTTP API.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("GET {} {:?}", url, query);

        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(response.json::<T>().await?)
    }
}

impl Backend for HttpBackend {
    async fn vehicles(&self) -> Result<Vec<Vehicle>, FetchError> {
        self.get_json("/api/vehicles", &[]).await
    }

    async fn latest(&self, ids: &[VehicleId]) -> Result<Vec<Position>, FetchError> {
        if ids.is_empty() {
            return self.get_json("/api/latest", &[]).await;
        }
        let query = [("vehiculo_ids", join_ids(ids))];
        self.get_json("/api/latest", &query).await
    }

    async fn track(&self, id: &VehicleId, limit: u32) -> Result<Vec<TrackPoint>, FetchError> {
        let query = [
            ("vehiculo_id", id.to_string()),
            ("limit", limit.to_string()),
        ];
        self.get_json("/api/track", &query).await
    }
}

fn join_ids(ids: &[VehicleId]) -> String {
    ids.iter()
        .map(VehicleId::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, http::StatusCode, routing::get, Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    async fn serve(app: Router) -> HttpBackend {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        HttpBackend::new(&format!("http://{}", addr), Duration::from_secs(5)).unwrap()
    }

    async fn latest(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
        let ids = query.get("vehiculo_ids").cloned().unwrap_or_default();
        Json(json!([{
            "vehiculo_id": 7,
            "name": ids,
            "timestamp": "2024-05-01 13:45:10",
            "lat": -33.45,
            "lon": -70.66
        }]))
    }

    fn stub() -> Router {
        Router::new()
            .route(
                "/api/vehicles",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
            )
            .route("/api/latest", get(latest))
            .route("/api/track", get(|| async { "not json" }))
    }

    #[tokio::test]
    async fn non_success_status_is_reported_with_its_code() {
        let backend = serve(stub()).await;

        let err = backend.vehicles().await.unwrap_err();
        assert_eq!(err, FetchError::Status(500));
        assert_eq!(err.to_string(), "500");
    }

    #[tokio::test]
    async fn latest_sends_ids_as_csv() {
        let backend = serve(stub()).await;

        let ids = [VehicleId::new("12"), VehicleId::new("3")];
        let latest = backend.latest(&ids).await.unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].vehicle_id, VehicleId::new("7"));
        assert_eq!(latest[0].name, "12,3");

        let all = backend.latest(&[]).await.unwrap();
        assert_eq!(all[0].name, "");
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let backend = serve(stub()).await;

        let err = backend.track(&VehicleId::new("7"), 5).await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)), "got {:?}", err);
    }

    #[test]
    fn ids_are_joined_in_selection_order() {
        let ids = vec![VehicleId::new("12"), VehicleId::new("3"), VehicleId::new("7")];
        assert_eq!(join_ids(&ids), "12,3,7");
    }

    #[test]
    fn trailing_slash_is_dropped_from_base_url() {
        let backend = HttpBackend::new("http://localhost:8081/", Duration::from_secs(1)).unwrap();
        assert_eq!(backend.base_url, "http://localhost:8081");
    }
}
