use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};

use super::GuestBackend;
use crate::error::{GuestListError, Result};
use crate::guest::{Guest, NewGuest, Partition};

const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Deserialize)]
struct RosterResponse {
    guests: Vec<Guest>,
}

/// The create endpoint wraps the record as `{"guest": {...}}`; accept a bare record too.
#[derive(Deserialize)]
#[serde(untagged)]
enum CreatedGuest {
    Wrapped { guest: Guest },
    Bare(Guest),
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Serialize)]
struct AttendanceRequest {
    is_at_party: bool,
}

/// Client for a party's guest endpoints (`{base_url}/guests`).
#[derive(Clone)]
pub struct GuestApi {
    client: Client,
    base_url: String,
}

impl GuestApi {
    /// `base_url` is the party URL, e.g. `http://localhost:5000/parties/7`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(GuestListError::Invalid("base_url is not set".into()));
        }
        Url::parse(base_url)
            .map_err(|e| GuestListError::Invalid(format!("Bad base_url {}: {}", base_url, e)))?;

        crate::ensure_tls_provider();
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    pub fn with_default_timeout(base_url: &str) -> Result<Self> {
        Self::new(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn roster_url(&self, partition: Partition) -> String {
        format!("{}/guests?is_male={}", self.base_url, partition.query_value())
    }

    fn guests_url(&self) -> String {
        format!("{}/guests", self.base_url)
    }

    fn guest_url(&self, id: i64) -> String {
        format!("{}/guests/{}", self.base_url, id)
    }
}

/// Turn a non-2xx response into [`GuestListError::Api`] carrying the server's message.
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_else(|| format!("server returned {}", status));

    Err(GuestListError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl GuestBackend for GuestApi {
    async fn fetch_roster(&self, partition: Partition) -> Result<Vec<Guest>> {
        let response = self.client.get(self.roster_url(partition)).send().await?;
        let roster: RosterResponse = check(response).await?.json().await?;
        tracing::debug!("Fetched {} {} guests", roster.guests.len(), partition);
        Ok(roster.guests)
    }

    async fn create_guest(&self, guest: &NewGuest) -> Result<Guest> {
        let response = self
            .client
            .post(self.guests_url())
            .json(guest)
            .send()
            .await?;

        let response = check(response).await?;
        let status = response.status().as_u16();
        let created = match response.json::<CreatedGuest>().await? {
            CreatedGuest::Wrapped { guest } | CreatedGuest::Bare(guest) => guest,
        };
        if created.id.is_none() {
            return Err(GuestListError::Api {
                status,
                message: "server did not assign an id to the new guest".into(),
            });
        }
        tracing::info!("Added {} (host: {})", created.name, created.host);
        Ok(created)
    }

    async fn delete_guest(&self, id: i64) -> Result<()> {
        let response = self.client.delete(self.guest_url(id)).send().await?;
        check(response).await?;
        tracing::info!("Deleted guest {}", id);
        Ok(())
    }

    async fn set_attendance(&self, id: i64, is_at_party: bool) -> Result<()> {
        let response = self
            .client
            .patch(self.guest_url(id))
            .json(&AttendanceRequest { is_at_party })
            .send()
            .await?;
        check(response).await?;
        tracing::info!(
            "Guest {} checked {}",
            id,
            if is_at_party { "in" } else { "out" }
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::routing::{get, patch};
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use super::*;

    async fn list_guests(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        let is_male = params.get("is_male").map(|v| v == "true").unwrap_or(true);
        Json(json!({
            "guests": [
                { "id": 1, "name": "Ada", "host": "Sam Host", "is_male": is_male,
                  "is_at_party": false, "entered_at": null, "left_at": null },
                { "id": 2, "name": "Bob", "host": "Kim Other", "is_male": is_male,
                  "is_at_party": true, "entered_at": "Sat, 01 Nov 2025 22:00:00 GMT", "left_at": null },
            ]
        }))
    }

    async fn create_guest(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if body["name"] == "Ada" {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "That guest is already on this party list" })),
            );
        }
        (
            StatusCode::CREATED,
            Json(json!({ "guest": {
                "id": 9, "name": body["name"], "host": body["host"],
                "is_male": body["is_male"], "is_at_party": false
            }})),
        )
    }

    async fn delete_guest(Path(id): Path<i64>) -> Response {
        if id == 2 {
            return (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": "You can't edit guests you didn't add" })),
            )
                .into_response();
        }
        StatusCode::NO_CONTENT.into_response()
    }

    async fn switch_guest(Path(id): Path<i64>, Json(body): Json<Value>) -> StatusCode {
        if id == 1 && body["is_at_party"] == true {
            StatusCode::ACCEPTED
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    async fn serve() -> GuestApi {
        crate::ensure_tls_provider();
        let router = Router::new()
            .route("/parties/7/guests", get(list_guests).post(create_guest))
            .route(
                "/parties/7/guests/{id}",
                patch(switch_guest).delete(delete_guest),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        GuestApi::with_default_timeout(&format!("http://{}/parties/7/", addr)).unwrap()
    }

    #[test]
    fn test_rejects_bad_base_url() {
        assert!(matches!(
            GuestApi::with_default_timeout(""),
            Err(GuestListError::Invalid(_))
        ));
        assert!(matches!(
            GuestApi::with_default_timeout("not a url"),
            Err(GuestListError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_roster() {
        let api = serve().await;
        assert!(api.base_url().ends_with("/parties/7"));

        let guests = api.fetch_roster(Partition::Female).await.unwrap();
        assert_eq!(guests.len(), 2);
        assert!(guests.iter().all(|g| !g.is_male));
        assert_eq!(guests[1].id, Some(2));
        assert!(guests[1].is_at_party);
        assert!(guests[1].entered_at.is_some());
    }

    #[tokio::test]
    async fn test_create_guest() {
        let api = serve().await;
        let new = NewGuest::new("Grace Hopper", Partition::Female, "Sam Host").unwrap();

        let created = api.create_guest(&new).await.unwrap();
        assert_eq!(created.id, Some(9));
        assert_eq!(created.name, "Grace Hopper");
        assert_eq!(created.host, "Sam Host");
        assert!(!created.is_male);
    }

    #[tokio::test]
    async fn test_create_guest_surfaces_server_error() {
        let api = serve().await;
        let new = NewGuest::new("Ada", Partition::Male, "Sam Host").unwrap();

        match api.create_guest(&new).await {
            Err(GuestListError::Api { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "That guest is already on this party list");
            }
            other => panic!("expected API error, got {:?}", other.map(|g| g.name)),
        }
    }

    #[tokio::test]
    async fn test_delete_guest() {
        let api = serve().await;
        api.delete_guest(1).await.unwrap();

        let err = api.delete_guest(2).await.unwrap_err();
        assert_eq!(err.to_string(), "You can't edit guests you didn't add");
    }

    #[tokio::test]
    async fn test_set_attendance() {
        let api = serve().await;
        api.set_attendance(1, true).await.unwrap();

        let err = api.set_attendance(1, false).await.unwrap_err();
        assert_eq!(err.to_string(), "server returned 500 Internal Server Error");
    }
}
