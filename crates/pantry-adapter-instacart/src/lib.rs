use pantry_core::{GroceryItem, ToolError};
use reqwest::{Client as HttpClient, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

pub const DEFAULT_BASE_URL: &str = "https://connect.dev.instacart.tools/idp/v1/";
pub const DEFAULT_LINKBACK_URL: &str = "https://your-website.com";
pub const CREDENTIALS_VAR: &str = "INSTACART_API_CREDENTIALS";
pub const BASE_URL_VAR: &str = "INSTACART_BASE_URL";
pub const LINKBACK_URL_VAR: &str = "INSTACART_LINKBACK_URL";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Days until the generated shopping link expires.
const LINK_EXPIRY_DAYS: u32 = 30;
const UNKNOWN_LINK: &str = "Unknown";

#[derive(Clone, Deserialize)]
pub struct Credentials {
    /// Absent and blank keys both read as "not configured".
    #[serde(default)]
    pub api_key: String,
}

impl Credentials {
    pub fn parse(raw: &str) -> Result<Self, ToolError> {
        let credentials: Credentials = serde_json::from_str(raw).map_err(|e| {
            ToolError::MissingConfiguration(format!(
                "Instacart API credentials in {CREDENTIALS_VAR} are malformed: {e}"
            ))
        })?;
        if credentials.api_key.trim().is_empty() {
            return Err(missing_credentials());
        }
        Ok(credentials)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").field("api_key", &"<redacted>").finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipePayload {
    pub title: String,
    pub author: String,
    pub servings: u32,
    pub cooking_time: u32,
    pub external_reference_id: String,
    pub expires_in: u32,
    pub ingredients: Vec<Ingredient>,
    pub landing_page_configuration: LandingPageConfiguration,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ingredient {
    pub name: String,
    pub display_text: String,
    pub measurements: Vec<Measurement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    pub quantity: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandingPageConfiguration {
    pub partner_linkback_url: String,
    pub enable_pantry_items: bool,
}

impl RecipePayload {
    /// Wraps the order in a single synthetic recipe. An empty list still
    /// yields a well-formed payload with no ingredients.
    pub fn for_order(items: &[GroceryItem], linkback_url: &str) -> Self {
        Self {
            title: "Grocery Order".to_string(),
            author: "AI Assistant".to_string(),
            servings: 1,
            cooking_time: 30,
            external_reference_id: Uuid::new_v4().to_string(),
            expires_in: LINK_EXPIRY_DAYS,
            ingredients: items.iter().map(Ingredient::from).collect(),
            landing_page_configuration: LandingPageConfiguration {
                partner_linkback_url: linkback_url.to_string(),
                enable_pantry_items: true,
            },
        }
    }
}

impl From<&GroceryItem> for Ingredient {
    fn from(item: &GroceryItem) -> Self {
        Self {
            name: item.name.clone(),
            display_text: format!("{} {}", item.quantity, item.name),
            measurements: vec![Measurement {
                quantity: item.quantity,
                unit: item.unit.clone(),
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderConfirmation {
    pub link: String,
}

#[derive(Clone, Debug)]
pub struct InstacartClient {
    credentials: Option<Result<Credentials, String>>,
    pub base_url: Url,
    pub linkback_url: String,
    client: HttpClient,
}

impl InstacartClient {
    /// `raw_credentials` is the JSON blob from configuration; problems with
    /// it are reported when an order is placed, not here.
    pub fn new(raw_credentials: Option<String>) -> Result<Self, ToolError> {
        let base_url =
            Url::parse(DEFAULT_BASE_URL).map_err(|e| ToolError::Internal(e.to_string()))?;
        Self::with_base_url(raw_credentials, base_url)
    }

    pub fn with_base_url(raw_credentials: Option<String>, base_url: Url) -> Result<Self, ToolError> {
        let client = HttpClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ToolError::Internal(format!("failed to build http client: {e}")))?;
        let credentials = raw_credentials
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| Credentials::parse(&raw).map_err(|e| e.to_string()));
        Ok(Self {
            credentials,
            base_url: with_trailing_slash(base_url),
            linkback_url: DEFAULT_LINKBACK_URL.to_string(),
            client,
        })
    }

    pub fn with_linkback_url(mut self, linkback_url: impl Into<String>) -> Self {
        self.linkback_url = linkback_url.into();
        self
    }

    pub fn from_env() -> Result<Self, ToolError> {
        let raw = env::var(CREDENTIALS_VAR).ok();
        let client = match env::var(BASE_URL_VAR) {
            Ok(base) => {
                let base_url = Url::parse(&base).map_err(|e| {
                    ToolError::InvalidInput(format!("invalid {BASE_URL_VAR}: {e}"))
                })?;
                Self::with_base_url(raw, base_url)?
            }
            Err(_) => Self::new(raw)?,
        };
        Ok(match env::var(LINKBACK_URL_VAR) {
            Ok(linkback) => client.with_linkback_url(linkback),
            Err(_) => client,
        })
    }

    fn credentials(&self) -> Result<&Credentials, ToolError> {
        match &self.credentials {
            None => Err(missing_credentials()),
            Some(Ok(credentials)) => Ok(credentials),
            Some(Err(message)) => Err(ToolError::MissingConfiguration(message.clone())),
        }
    }

    /// Creates a shoppable recipe page for `items` and returns its link.
    /// Items are not validated locally; the upstream decides.
    pub async fn place_order(&self, items: &[GroceryItem]) -> Result<OrderConfirmation, ToolError> {
        let credentials = self.credentials()?;
        let payload = RecipePayload::for_order(items, &self.linkback_url);
        let url = self
            .base_url
            .join("products/recipe")
            .map_err(|e| ToolError::Internal(format!("failed to construct endpoint url: {e}")))?;

        info!(
            items = items.len(),
            reference = %payload.external_reference_id,
            "creating instacart recipe page"
        );
        let response = self
            .client
            .post(url)
            .bearer_auth(&credentials.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
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

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| ToolError::Backend(format!("invalid json response: {e}")))?;
        Ok(OrderConfirmation {
            link: body
                .get("products_link_url")
                .and_then(Value::as_str)
                .unwrap_or(UNKNOWN_LINK)
                .to_string(),
        })
    }
}

/// Keeps the last path segment when endpoint paths are joined on.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn missing_credentials() -> ToolError {
    ToolError::MissingConfiguration(format!(
        "Instacart API credentials not found. Please set {CREDENTIALS_VAR} environment variable."
    ))
}

fn upstream_error(status: StatusCode, body: String) -> ToolError {
    warn!(status = status.as_u16(), "instacart returned an error");
    ToolError::Upstream {
        status: status.as_u16(),
        body,
    }
}
