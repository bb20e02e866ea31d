use std::fmt;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    RequestBuilder,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use tracing::debug;

use super::{ListQuery, Record, RemoteStore};
use crate::{config::StoreConnection, error::StoreError};

const PREFER_REPRESENTATION: (&str, &str) = ("Prefer", "return=representation");

/// Client for a PostgREST table service such as the Supabase REST API.
#[derive(Clone)]
pub struct RestStore {
    client: reqwest::Client,
    endpoint: String,
}

impl RestStore {
    /// Build a client authenticated with the connection's access key.
    pub fn new(connection: &StoreConnection) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&connection.key)
            .context("store key is not a valid header value")?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", connection.key))
            .context("store key is not a valid header value")?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .gzip(true)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: connection.endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn table_url(&self, collection: &str) -> String {
        format!("{}/rest/v1/{collection}", self.endpoint)
    }
}

/// Query string for a `list` call.
pub(crate) fn list_params(query: &ListQuery) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    if let Some(filter) = &query.filter {
        params.push((filter.column.to_string(), format!("eq.{}", filter.value)));
    }
    if let Some(order) = &query.order {
        let direction = if order.ascending { "asc" } else { "desc" };
        params.push(("order".to_string(), format!("{}.{direction}", order.column)));
    }
    params
}

fn id_params(id: &impl fmt::Display) -> Vec<(String, String)> {
    vec![("id".to_string(), format!("eq.{id}"))]
}

#[derive(Debug, Deserialize)]
struct PostgrestError {
    message: Option<String>,
    details: Option<String>,
    hint: Option<String>,
    code: Option<String>,
}

/// Human readable explanation extracted from an error response body.
pub(crate) fn rejection_message(body: &str) -> String {
    match serde_json::from_str::<PostgrestError>(body) {
        Ok(err) => {
            let mut message = err.message.unwrap_or_else(|| "unknown error".to_string());
            if let Some(code) = err.code.filter(|code| !code.is_empty()) {
                message = format!("{message} [{code}]");
            }
            for extra in [err.details, err.hint].into_iter().flatten() {
                if !extra.is_empty() {
                    message.push_str(" · ");
                    message.push_str(&extra);
                }
            }
            message
        }
        Err(_) if body.trim().is_empty() => "empty error response".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

/// Decode a JSON array of rows; an empty body means no rows.
pub(crate) fn decode_rows<T: DeserializeOwned>(
    collection: &'static str,
    body: &str,
) -> Result<Vec<T>, StoreError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(body).map_err(|err| StoreError::Decode {
        collection,
        message: err.to_string(),
    })
}

async fn fetch_rows<T: DeserializeOwned>(
    collection: &'static str,
    request: RequestBuilder,
) -> Result<Vec<T>, StoreError> {
    let response = request
        .send()
        .await
        .map_err(|source| StoreError::Transport { collection, source })?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|source| StoreError::Transport { collection, source })?;
    debug!(collection, status = status.as_u16(), "store response");
    classify_response(collection, status.as_u16(), &body)
}

/// Map a response status and body onto rows or a [`StoreError`].
pub(crate) fn classify_response<T: DeserializeOwned>(
    collection: &'static str,
    status: u16,
    body: &str,
) -> Result<Vec<T>, StoreError> {
    if !(200..300).contains(&status) {
        return Err(StoreError::Rejected {
            collection,
            status,
            message: rejection_message(body),
        });
    }
    decode_rows(collection, body)
}

/// A write filtered by id that returned no rows touched nothing.
pub(crate) fn require_affected(
    collection: &'static str,
    id: &impl fmt::Display,
    rows: &[Value],
) -> Result<(), StoreError> {
    if rows.is_empty() {
        return Err(not_found(collection, id));
    }
    Ok(())
}

pub(crate) fn first_inserted<R>(collection: &'static str, rows: Vec<R>) -> Result<R, StoreError> {
    rows.into_iter().next().ok_or_else(|| StoreError::Decode {
        collection,
        message: "insert returned no row".to_string(),
    })
}

fn not_found(collection: &'static str, id: &impl fmt::Display) -> StoreError {
    StoreError::NotFound {
        collection,
        id: id.to_string(),
    }
}

#[async_trait]
impl RemoteStore for RestStore {
    async fn list<R: Record>(&self, query: &ListQuery) -> Result<Vec<R>, StoreError> {
        let request = self
            .client
            .get(self.table_url(R::COLLECTION))
            .query(&list_params(query));
        fetch_rows(R::COLLECTION, request).await
    }

    async fn get_by_id<R: Record>(&self, id: &R::Id) -> Result<R, StoreError> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(id_params(id));
        let request = self
            .client
            .get(self.table_url(R::COLLECTION))
            .query(&params);
        fetch_rows::<R>(R::COLLECTION, request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| not_found(R::COLLECTION, id))
    }

    async fn insert<R: Record>(&self, fields: &R::Insert) -> Result<R, StoreError> {
        let request = self
            .client
            .post(self.table_url(R::COLLECTION))
            .header(PREFER_REPRESENTATION.0, PREFER_REPRESENTATION.1)
            .json(&[fields]);
        let rows = fetch_rows::<R>(R::COLLECTION, request).await?;
        first_inserted(R::COLLECTION, rows)
    }

    async fn update<R: Record>(&self, id: &R::Id, changes: &R::Update) -> Result<(), StoreError> {
        let request = self
            .client
            .patch(self.table_url(R::COLLECTION))
            .query(&id_params(id))
            .header(PREFER_REPRESENTATION.0, PREFER_REPRESENTATION.1)
            .json(changes);
        let rows: Vec<Value> = fetch_rows(R::COLLECTION, request).await?;
        require_affected(R::COLLECTION, id, &rows)
    }

    async fn delete<R: Record>(&self, id: &R::Id) -> Result<(), StoreError> {
        let request = self
            .client
            .delete(self.table_url(R::COLLECTION))
            .query(&id_params(id))
            .header(PREFER_REPRESENTATION.0, PREFER_REPRESENTATION.1);
        let rows: Vec<Value> = fetch_rows(R::COLLECTION, request).await?;
        require_affected(R::COLLECTION, id, &rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Player, PlayerChanges, PlayerId};
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    /// Drain one request, body included, so closing the socket does not reset it.
    async fn read_request(socket: &mut tokio::net::TcpStream) {
        let mut request = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let Ok(read) = socket.read(&mut chunk).await else {
                return;
            };
            if read == 0 {
                return;
            }
            request.extend_from_slice(&chunk[..read]);
            let text = String::from_utf8_lossy(&request);
            let Some(head_end) = text.find("\r\n\r\n") else {
                continue;
            };
            let body_len = text[..head_end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if request.len() >= head_end + 4 + body_len {
                return;
            }
        }
    }

    /// Serve one canned HTTP response and return the store pointed at it.
    async fn one_shot_server(
        status_line: &'static str,
        body: &'static str,
    ) -> Result<RestStore> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                read_request(&mut socket).await;
                let response = format!(
                    "HTTP/1.1 {status_line}\r\n\
                     content-type: application/json\r\n\
                     content-length: {}\r\n\
                     connection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        RestStore::new(&StoreConnection {
            endpoint: format!("http://{addr}"),
            key: "anon-key".to_string(),
        })
    }

    fn pairs(params: &[(String, String)]) -> Vec<(&str, &str)> {
        params
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect()
    }

    #[test]
    fn renders_filter_and_order() {
        let query = ListQuery::all().eq("player_id", "p1").descending("date");
        let params = list_params(&query);
        assert_eq!(
            pairs(&params),
            vec![
                ("select", "*"),
                ("player_id", "eq.p1"),
                ("order", "date.desc")
            ]
        );
        assert_eq!(pairs(&list_params(&ListQuery::all())), vec![("select", "*")]);
    }

    #[test]
    fn table_url_ignores_trailing_slash() -> Result<()> {
        let store = RestStore::new(&StoreConnection {
            endpoint: "https://abc.supabase.co/".to_string(),
            key: "anon-key".to_string(),
        })?;
        assert_eq!(
            store.table_url("players"),
            "https://abc.supabase.co/rest/v1/players"
        );
        Ok(())
    }

    #[test]
    fn extracts_postgrest_error_details() {
        let body = r#"{"message":"null value in column \"name\"","code":"23502","details":"Failing row","hint":null}"#;
        assert_eq!(
            rejection_message(body),
            "null value in column \"name\" [23502] · Failing row"
        );
        assert_eq!(rejection_message("  "), "empty error response");
        assert_eq!(rejection_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn empty_body_decodes_to_no_rows() -> Result<()> {
        let rows: Vec<Player> = decode_rows("players", "")?;
        assert!(rows.is_empty());
        let err = decode_rows::<Player>("players", "{not json").unwrap_err();
        assert!(matches!(err, StoreError::Decode { collection: "players", .. }));
        Ok(())
    }

    #[test]
    fn non_success_status_is_rejected() {
        let body = r#"{"message":"permission denied for table players","code":"42501"}"#;
        let err = classify_response::<Player>("players", 401, body).unwrap_err();
        match err {
            StoreError::Rejected {
                collection,
                status,
                message,
            } => {
                assert_eq!(collection, "players");
                assert_eq!(status, 401);
                assert_eq!(message, "permission denied for table players [42501]");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(
            classify_response::<Player>("players", 503, ""),
            Err(StoreError::Rejected { status: 503, .. })
        ));
    }

    #[test]
    fn success_status_decodes_rows() -> Result<()> {
        let rows: Vec<Value> = classify_response("charts", 204, "")?;
        assert!(rows.is_empty());
        let rows: Vec<Value> = classify_response("charts", 200, r#"[{"id":"c1"}]"#)?;
        assert_eq!(rows.len(), 1);
        Ok(())
    }

    #[test]
    fn write_touching_no_rows_is_not_found() {
        let err = require_affected("charts", &"c9", &[]).unwrap_err();
        assert!(err.is_not_found());
        assert!(require_affected("charts", &"c1", &[Value::Null]).is_ok());
    }

    #[test]
    fn insert_without_returned_row_is_decode_error() {
        let err = first_inserted::<Player>("players", Vec::new()).unwrap_err();
        assert!(matches!(err, StoreError::Decode { collection: "players", .. }));
    }

    #[tokio::test]
    async fn update_matching_nothing_reports_not_found() -> Result<()> {
        let store = one_shot_server("200 OK", "[]").await?;
        let changes = PlayerChanges {
            name: "Sato".to_string(),
            team: None,
            number: None,
        };
        let err = store
            .update::<Player>(&PlayerId::new("missing"), &changes)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        Ok(())
    }

    #[tokio::test]
    async fn server_error_surfaces_as_rejected() -> Result<()> {
        let store = one_shot_server(
            "500 Internal Server Error",
            r#"{"message":"boom","code":"XX000"}"#,
        )
        .await?;
        let err = store
            .get_by_id::<Player>(&PlayerId::new("p1"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected { status: 500, .. }));
        Ok(())
    }
}
