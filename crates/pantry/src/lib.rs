//! High-level pantry toolbox: every tool wired to its backend.

mod prompts;
pub mod tools;

pub use pantry_core;
pub use pantry_tools;

use pantry_adapter_instacart::InstacartClient;
use pantry_adapter_spoonacular::SpoonacularClient;
use pantry_core::{PromptDefinition, ToolError};
use pantry_store::{BackendHandle, ItemFetcher};
use pantry_tools::ToolRegistry;
use std::sync::Arc;
use tracing::info;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    DynamoDb { profile: String },
    Disabled,
}

#[derive(Debug, Clone)]
pub struct PantryConfig {
    pub spoonacular_api_key: Option<String>,
    pub spoonacular_base_url: Url,
    pub instacart_credentials: Option<String>,
    pub instacart_base_url: Url,
    pub instacart_linkback_url: String,
    pub store: StoreConfig,
}

pub struct Pantry {
    registry: ToolRegistry,
    prompts: Vec<PromptDefinition>,
}

impl Pantry {
    /// Builds every backend from `config`. The key-value connection is
    /// attempted once here; failing it leaves that tool degraded.
    pub async fn connect(config: PantryConfig) -> Result<Self, ToolError> {
        let backend = match &config.store {
            StoreConfig::DynamoDb { profile } => BackendHandle::connect_dynamodb(profile).await,
            StoreConfig::Disabled => BackendHandle::unavailable("key-value backend disabled"),
        };
        let recipes = SpoonacularClient::with_base_url(
            config.spoonacular_api_key,
            config.spoonacular_base_url,
        )?;
        let grocery =
            InstacartClient::with_base_url(config.instacart_credentials, config.instacart_base_url)?
                .with_linkback_url(config.instacart_linkback_url);
        Ok(Self::from_parts(backend, recipes, grocery))
    }

    pub fn from_parts(
        backend: BackendHandle,
        recipes: SpoonacularClient,
        grocery: InstacartClient,
    ) -> Self {
        info!(
            store_available = backend.is_available(),
            recipe_key = recipes.has_api_key(),
            "assembling pantry tools"
        );
        let recipes = Arc::new(recipes);
        let registry = ToolRegistry::new()
            .with(tools::ValidateAge)
            .with(tools::ValidateWeight)
            .with(tools::ValidateHeight)
            .with(tools::CalculateBmi)
            .with(tools::GetItem::new(ItemFetcher::new(backend)))
            .with(tools::RecipeSearch::complex(recipes.clone()))
            .with(tools::RecipeSearch::by_nutrients(recipes.clone()))
            .with(tools::RecipeSearch::by_ingredients(recipes))
            .with(tools::PlaceOrder::new(grocery));
        Self {
            registry,
            prompts: prompts::all(),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn prompts(&self) -> &[PromptDefinition] {
        &self.prompts
    }

    pub fn prompt(&self, name: &str) -> Option<&PromptDefinition> {
        self.prompts.iter().find(|prompt| prompt.name == name)
    }

    pub fn into_parts(self) -> (ToolRegistry, Vec<PromptDefinition>) {
        (self.registry, self.prompts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pantry_tools::ToolExecutor;
    use serde_json::json;

    fn pantry() -> Pantry {
        Pantry::from_parts(
            BackendHandle::unavailable("test"),
            SpoonacularClient::new(None).unwrap(),
            InstacartClient::new(None).unwrap(),
        )
    }

    #[test]
    fn exposes_the_full_catalogue() {
        let pantry = pantry();
        let names: Vec<&str> = pantry.registry().names().collect();
        assert_eq!(
            names,
            vec![
                "get_dynamodb_item",
                "place_grocery_order",
                "search_recipes",
                "search_recipes_by_ingredients",
                "search_recipes_by_nutrients",
                "validate_age",
                "validate_height",
                "validate_height_and_calculate_bmi",
                "validate_weight",
            ]
        );
        assert!(pantry.prompt("collect_user_info").is_some());
    }

    #[tokio::test]
    async fn disabled_store_config_leaves_lookups_degraded() {
        let pantry = Pantry::connect(PantryConfig {
            spoonacular_api_key: None,
            spoonacular_base_url: Url::parse("https://api.spoonacular.com").unwrap(),
            instacart_credentials: None,
            instacart_base_url: Url::parse("https://connect.dev.instacart.tools/idp/v1/").unwrap(),
            instacart_linkback_url: "https://example.com".to_string(),
            store: StoreConfig::Disabled,
        })
        .await
        .unwrap();

        let out = pantry
            .registry()
            .call("get_dynamodb_item", json!({"table_name": "t", "key": {"id": "1"}}))
            .await
            .unwrap();
        assert!(out.is_error);
        assert_eq!(out.text, tools::STORE_UNAVAILABLE_MESSAGE);
    }
}
