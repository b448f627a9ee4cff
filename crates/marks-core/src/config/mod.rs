//! Remote project configuration.
//!
//! A [`RemoteConfig`] names the Supabase project plus the table and realtime
//! channel the bookmark view is bound to. Only public values live here; the
//! anon key is safe to ship, session tokens are not.

use serde::{Deserialize, Serialize};

use crate::util::{is_http_url, normalize_text_option};
use crate::{Error, Result};

pub const DEFAULT_SCHEMA: &str = "public";
pub const DEFAULT_TABLE: &str = "bookmarks";
pub const DEFAULT_CHANNEL: &str = "bookmarks_changes";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_channel")]
    pub channel: String,
}

impl RemoteConfig {
    /// Validate and normalize a project URL/key pair with default table names.
    pub fn new(supabase_url: &str, supabase_anon_key: &str) -> Result<Self> {
        let supabase_url = normalize_project_url(supabase_url)?;
        let supabase_anon_key = normalize_text_option(Some(supabase_anon_key.to_string()))
            .ok_or_else(|| Error::Config("supabase_anon_key must not be empty".to_string()))?;

        Ok(Self {
            supabase_url,
            supabase_anon_key,
            schema: default_schema(),
            table: default_table(),
            channel: default_channel(),
        })
    }

    #[must_use]
    pub fn with_table(mut self, table: Option<String>) -> Self {
        if let Some(table) = normalize_text_option(table) {
            self.table = table;
        }
        self
    }

    #[must_use]
    pub fn with_channel(mut self, channel: Option<String>) -> Self {
        if let Some(channel) = normalize_text_option(channel) {
            self.channel = channel;
        }
        self
    }

    /// PostgREST endpoint for the bookmark table.
    pub fn rest_table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.supabase_url, self.table)
    }

    /// Realtime websocket endpoint (`http` schemes mapped to `ws`).
    pub fn realtime_url(&self) -> String {
        let base = self
            .supabase_url
            .strip_prefix("https://")
            .map(|host| format!("wss://{host}"))
            .or_else(|| {
                self.supabase_url
                    .strip_prefix("http://")
                    .map(|host| format!("ws://{host}"))
            })
            .unwrap_or_else(|| self.supabase_url.clone());
        format!(
            "{base}/realtime/v1/websocket?apikey={}&vsn=1.0.0",
            self.supabase_anon_key
        )
    }
}

fn normalize_project_url(raw: &str) -> Result<String> {
    let value = normalize_text_option(Some(raw.to_string()))
        .ok_or_else(|| Error::Config("supabase_url must not be empty".to_string()))?;
    if !is_http_url(&value) {
        return Err(Error::Config(
            "supabase_url must include http:// or https://".to_string(),
        ));
    }
    Ok(value.trim_end_matches('/').to_string())
}

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

fn default_channel() -> String {
    DEFAULT_CHANNEL.to_string()
}
