//! Bookmark table access over PostgREST.

use reqwest::{Client, RequestBuilder, Response};

use crate::auth::parse_api_error;
use crate::config::RemoteConfig;
use crate::models::{Bookmark, BookmarkId, NewBookmark};
use crate::{Error, Result};

const ORDER_NEWEST_FIRST: &str = "created_at.desc";

/// Stateless table client; every call carries the caller's access token.
#[derive(Debug, Clone)]
pub struct PostgrestBookmarkStore {
    table_url: String,
    anon_key: String,
    client: Client,
}

impl PostgrestBookmarkStore {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        Ok(Self {
            table_url: config.rest_table_url(),
            anon_key: config.supabase_anon_key.clone(),
            client: Client::builder().build()?,
        })
    }

    pub async fn select(&self, access_token: &str) -> Result<Vec<Bookmark>> {
        let request = self.authorized(self.client.get(&self.table_url), access_token).query(&[
            ("select", "*"),
            ("order", ORDER_NEWEST_FIRST),
        ]);
        let response = check_status(request.send().await?).await?;
        Ok(response.json::<Vec<Bookmark>>().await?)
    }

    /// Insert one row and return the stored representation.
    pub async fn insert(&self, access_token: &str, record: &NewBookmark) -> Result<Bookmark> {
        let request = self
            .authorized(self.client.post(&self.table_url), access_token)
            .header("Prefer", "return=representation")
            .json(&[record]);
        let response = check_status(request.send().await?).await?;
        response
            .json::<Vec<Bookmark>>()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Api("Insert returned no rows".to_string()))
    }

    pub async fn delete(&self, access_token: &str, id: &BookmarkId) -> Result<()> {
        let request = self
            .authorized(self.client.delete(&self.table_url), access_token)
            .query(&[("id", format!("eq.{id}"))]);
        check_status(request.send().await?).await?;
        Ok(())
    }

    fn authorized(&self, request: RequestBuilder, access_token: &str) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .header("Accept", "application/json")
            .bearer_auth(access_token)
    }
}

async fn check_status(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(Error::Api(parse_api_error(status, &body)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_targets_rest_table_endpoint() {
        let config = RemoteConfig::new("https://project.supabase.co/", "anon")
            .unwrap()
            .with_table(Some("saved_links".to_string()));
        let store = PostgrestBookmarkStore::new(&config).unwrap();
        assert_eq!(
            store.table_url,
            "https://project.supabase.co/rest/v1/saved_links"
        );
        assert_eq!(store.anon_key, "anon");
    }

    #[test]
    fn insert_payload_is_a_single_row_array() {
        let record = NewBookmark::new("Docs", "docs.rs", "user-1");
        let body = serde_json::to_value([&record]).unwrap();
        assert_eq!(
            body,
            serde_json::json!([{"url": "https://docs.rs", "title": "Docs", "user_id": "user-1"}])
        );
    }
}
