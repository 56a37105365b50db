use anyhow::{anyhow, Result};
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Client, Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

/// Thin PostgREST client over the Supabase REST endpoint. All queries the
/// cells run go through `request`; the typed helpers cover the three verbs
/// the application needs.
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.clone(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn headers(&self, representation: bool) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(&self.anon_key)
                .map_err(|_| anyhow!("invalid characters in Supabase anon key"))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if representation {
            headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        }
        Ok(headers)
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        representation: bool,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making request to {}", url);

        let mut req = self
            .client
            .request(method, &url)
            .headers(self.headers(representation)?);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => anyhow!("Authentication error: {}", error_text),
                404 => anyhow!("Resource not found: {}", error_text),
                _ => anyhow!("API error ({}): {}", status, error_text),
            });
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// SELECT: `path` carries the table plus PostgREST filters.
    pub async fn select<T>(&self, path: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        self.request(Method::GET, path, None, false).await
    }

    /// INSERT with `Prefer: return=representation`; returns the created row.
    pub async fn insert<T>(&self, table: &str, row: Value) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let path = format!("/rest/v1/{}", table);
        let mut rows: Vec<T> = self.request(Method::POST, &path, Some(row), true).await?;
        rows.pop()
            .ok_or_else(|| anyhow!("insert into {} returned no representation", table))
    }

    /// UPDATE matching rows; returns the updated rows.
    pub async fn update<T>(&self, path: &str, patch: Value) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        self.request(Method::PATCH, path, Some(patch), true).await
    }
}
