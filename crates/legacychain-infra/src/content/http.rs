//! HTTP blob gateway client.
//!
//! `POST {gateway}/blobs` with the raw ciphertext returns
//! `{ "reference": "..." }`; `GET {gateway}/blobs/{reference}` returns the
//! bytes, with the reference escaped as a single path segment. Transport
//! errors, 5xx and 429 are `Unavailable` (retried by the caller), 404 is
//! `NotFound`, anything else is `Rejected`.

use std::time::Duration;

use reqwest::{StatusCode, Url};
use serde::Deserialize;

use legacychain_core::service::content::ContentStore;
use legacychain_types::error::ContentStoreError;

#[derive(Deserialize)]
struct UploadResponse {
    reference: String,
}

/// Content store backed by an HTTP gateway.
#[derive(Clone)]
pub struct HttpContentStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpContentStore {
    pub fn new(gateway_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            base_url: gateway_url.trim_end_matches('/').to_string(),
        }
    }

    /// `{gateway}/blobs[/{reference}]`, with the reference percent-encoded
    /// as one path segment so it can never address another gateway route.
    fn blobs_url(&self, reference: Option<&str>) -> Result<Url, ContentStoreError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ContentStoreError::Rejected(format!("invalid gateway url: {e}")))?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                ContentStoreError::Rejected(format!("invalid gateway url: {}", self.base_url))
            })?;
            segments.pop_if_empty().push("blobs");
            if let Some(reference) = reference {
                segments.push(reference);
            }
        }
        Ok(url)
    }
}

/// `.` and `..` are dropped by URL path normalisation, so they could only
/// ever resolve to a different route.
fn check_reference(reference: &str) -> Result<(), ContentStoreError> {
    if reference.is_empty() || reference == "." || reference == ".." {
        return Err(ContentStoreError::Rejected(format!(
            "invalid content reference: '{reference}'"
        )));
    }
    Ok(())
}

fn transport_error(e: reqwest::Error) -> ContentStoreError {
    ContentStoreError::Unavailable(e.to_string())
}

fn status_error(status: StatusCode, reference: &str) -> ContentStoreError {
    if status == StatusCode::NOT_FOUND {
        ContentStoreError::NotFound(reference.to_string())
    } else if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        ContentStoreError::Unavailable(format!("gateway returned {status}"))
    } else {
        ContentStoreError::Rejected(format!("gateway returned {status}"))
    }
}

impl ContentStore for HttpContentStore {
    async fn upload(&self, ciphertext: &[u8]) -> Result<String, ContentStoreError> {
        let response = self
            .client
            .post(self.blobs_url(None)?)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(ciphertext.to_vec())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, "upload"));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| ContentStoreError::Rejected(format!("malformed gateway response: {e}")))?;
        if body.reference.trim().is_empty() {
            return Err(ContentStoreError::Rejected(
                "gateway returned an empty reference".to_string(),
            ));
        }

        tracing::debug!(reference = %body.reference, bytes = ciphertext.len(), "blob uploaded");
        Ok(body.reference)
    }

    async fn fetch(&self, reference: &str) -> Result<Vec<u8>, ContentStoreError> {
        check_reference(reference)?;
        let response = self
            .client
            .get(self.blobs_url(Some(reference))?)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, reference));
        }

        let bytes = response.bytes().await.map_err(transport_error)?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::Router;
    use axum::body::Bytes;
    use axum::extract::{Path, State};
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::{get, post};

    type Blobs = Arc<Mutex<HashMap<String, Vec<u8>>>>;

    async fn spawn_gateway(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn gateway_router(blobs: Blobs) -> Router {
        Router::new()
            .route(
                "/blobs",
                post(|State(blobs): State<Blobs>, body: Bytes| async move {
                    let mut blobs = blobs.lock().unwrap();
                    let reference = format!("ref{}", blobs.len());
                    blobs.insert(reference.clone(), body.to_vec());
                    axum::Json(serde_json::json!({ "reference": reference }))
                }),
            )
            .route(
                "/blobs/{reference}",
                get(|State(blobs): State<Blobs>, Path(reference): Path<String>| async move {
                    match blobs.lock().unwrap().get(&reference) {
                        Some(bytes) => Ok(bytes.clone()),
                        None => Err(AxumStatus::NOT_FOUND),
                    }
                }),
            )
            .with_state(blobs)
    }

    #[tokio::test]
    async fn test_upload_then_fetch() {
        let url = spawn_gateway(gateway_router(Blobs::default())).await;
        let store = HttpContentStore::new(&format!("{url}/"));

        let reference = store.upload(b"\x01ciphertext").await.unwrap();
        assert_eq!(reference, "ref0");
        assert_eq!(store.fetch(&reference).await.unwrap(), b"\x01ciphertext");
    }

    #[tokio::test]
    async fn test_reference_cannot_escape_blobs_route() {
        let router = gateway_router(Blobs::default())
            .route("/admin", get(|| async { "ADMIN-ENDPOINT" }));
        let url = spawn_gateway(router).await;
        let store = HttpContentStore::new(&url);

        for reference in ["../admin", "..%2Fadmin", "x/../../admin", "/admin"] {
            match store.fetch(reference).await {
                Ok(bytes) => panic!("{reference} fetched {:?}", String::from_utf8_lossy(&bytes)),
                Err(err) => assert!(
                    matches!(err, ContentStoreError::NotFound(_)),
                    "{reference}: {err:?}"
                ),
            }
        }
        for reference in ["..", ".", ""] {
            let err = store.fetch(reference).await.unwrap_err();
            assert!(matches!(err, ContentStoreError::Rejected(_)), "{reference}: {err:?}");
        }
    }

    #[test]
    fn test_reference_is_one_encoded_segment() {
        let store = HttpContentStore::new("http://gateway.local/prefix/");
        assert_eq!(
            store.blobs_url(Some("../admin")).unwrap().as_str(),
            "http://gateway.local/prefix/blobs/..%2Fadmin"
        );
        assert_eq!(
            store.blobs_url(None).unwrap().as_str(),
            "http://gateway.local/prefix/blobs"
        );
    }

    #[tokio::test]
    async fn test_missing_blob_is_not_found() {
        let url = spawn_gateway(gateway_router(Blobs::default())).await;
        let store = HttpContentStore::new(&url);
        let err = store.fetch("nope").await.unwrap_err();
        assert!(matches!(err, ContentStoreError::NotFound(r) if r == "nope"));
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let router = Router::new().route(
            "/blobs",
            post(|| async { AxumStatus::SERVICE_UNAVAILABLE }),
        );
        let url = spawn_gateway(router).await;
        let err = HttpContentStore::new(&url).upload(b"x").await.unwrap_err();
        assert!(matches!(err, ContentStoreError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_client_error_is_rejected() {
        let router = Router::new().route("/blobs", post(|| async { AxumStatus::PAYLOAD_TOO_LARGE }));
        let url = spawn_gateway(router).await;
        let err = HttpContentStore::new(&url).upload(b"x").await.unwrap_err();
        assert!(matches!(err, ContentStoreError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_unavailable() {
        // Bind then drop to get a port with nothing listening.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = HttpContentStore::new(&format!("http://{addr}"))
            .fetch("ref")
            .await
            .unwrap_err();
        assert!(matches!(err, ContentStoreError::Unavailable(_)));
    }
}
