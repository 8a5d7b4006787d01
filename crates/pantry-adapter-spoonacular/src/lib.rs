use pantry_core::{SearchParameters, ToolError};
use reqwest::{Client as HttpClient, StatusCode};
use serde_json::Value;
use std::env;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.spoonacular.com";
pub const API_KEY_VAR: &str = "SPOONACULAR_API_KEY";
pub const BASE_URL_VAR: &str = "SPOONACULAR_BASE_URL";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const API_KEY_PARAM: &str = "apiKey";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    /// Free text plus filters (`complexSearch`).
    Complex,
    /// Nutrient min/max bounds (`findByNutrients`).
    ByNutrients,
    /// Pantry contents (`findByIngredients`); needs `ingredients`.
    ByIngredients,
}

impl SearchKind {
    fn path(self) -> &'static str {
        match self {
            Self::Complex => "recipes/complexSearch",
            Self::ByNutrients => "recipes/findByNutrients",
            Self::ByIngredients => "recipes/findByIngredients",
        }
    }

    fn check(self, params: &SearchParameters) -> Result<(), ToolError> {
        if self == Self::ByIngredients && !has_value(params.get("ingredients")) {
            return Err(ToolError::InvalidInput(
                "the `ingredients` parameter is required, e.g. \"apples,flour,sugar\"".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct SpoonacularClient {
    api_key: Option<String>,
    pub base_url: Url,
    client: HttpClient,
}

impl SpoonacularClient {
    pub fn new(api_key: Option<String>) -> Result<Self, ToolError> {
        let base_url =
            Url::parse(DEFAULT_BASE_URL).map_err(|e| ToolError::Internal(e.to_string()))?;
        Self::with_base_url(api_key, base_url)
    }

    pub fn with_base_url(api_key: Option<String>, base_url: Url) -> Result<Self, ToolError> {
        let client = HttpClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ToolError::Internal(format!("failed to build http client: {e}")))?;
        Ok(Self {
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url: with_trailing_slash(base_url),
            client,
        })
    }

    /// A missing key is not an error here; every search reports it instead.
    pub fn from_env() -> Result<Self, ToolError> {
        let api_key = env::var(API_KEY_VAR).ok();
        match env::var(BASE_URL_VAR) {
            Ok(raw) => {
                let base_url = Url::parse(&raw).map_err(|e| {
                    ToolError::InvalidInput(format!("invalid {BASE_URL_VAR}: {e}"))
                })?;
                Self::with_base_url(api_key, base_url)
            }
            Err(_) => Self::new(api_key),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn search_recipes(&self, params: &SearchParameters) -> Result<Value, ToolError> {
        self.search(SearchKind::Complex, params).await
    }

    pub async fn search_by_nutrients(&self, params: &SearchParameters) -> Result<Value, ToolError> {
        self.search(SearchKind::ByNutrients, params).await
    }

    pub async fn search_by_ingredients(
        &self,
        params: &SearchParameters,
    ) -> Result<Value, ToolError> {
        self.search(SearchKind::ByIngredients, params).await
    }

    /// Forwards `params` verbatim as query parameters and returns the
    /// upstream JSON untouched.
    pub async fn search(&self, kind: SearchKind, params: &SearchParameters) -> Result<Value, ToolError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ToolError::MissingConfiguration(format!(
                "Spoonacular API key not found. Please set {API_KEY_VAR} environment variable."
            ))
        })?;
        kind.check(params)?;

        let url = self.endpoint_url(kind, params, api_key)?;
        debug!(endpoint = kind.path(), "searching recipes");
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ToolError::Transport("request timed out".to_string())
            } else {
                ToolError::Transport(format!("request failed: {e}"))
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            return Err(upstream_error(status, body));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ToolError::Backend(format!("invalid json response: {e}")))
    }

    fn endpoint_url(
        &self,
        kind: SearchKind,
        params: &SearchParameters,
        api_key: &str,
    ) -> Result<Url, ToolError> {
        let mut url = self
            .base_url
            .join(kind.path())
            .map_err(|e| ToolError::Internal(format!("failed to construct endpoint url: {e}")))?;
        {
            let mut qp = url.query_pairs_mut();
            for (name, value) in params {
                if name == API_KEY_PARAM {
                    continue;
                }
                if let Some(value) = query_value(value) {
                    qp.append_pair(name, &value);
                }
            }
            qp.append_pair(API_KEY_PARAM, api_key);
        }
        Ok(url)
    }
}

// `Url::join` replaces the last segment unless the path ends in `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn upstream_error(status: StatusCode, body: String) -> ToolError {
    warn!(status = status.as_u16(), "spoonacular returned an error");
    ToolError::Upstream {
        status: status.as_u16(),
        body,
    }
}

fn has_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(_) => true,
    }
}

/// Lists become the comma-separated form the API expects.
fn query_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(query_value)
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Object(_) => Some(value.to_string()),
    }
}
