use async_trait::async_trait;
use pantry_adapter_spoonacular::{SearchKind, SpoonacularClient};
use pantry_core::{SearchParameters, ToolDefinition, ToolError};
use pantry_tools::{schema, Arguments, Tool};
use std::sync::Arc;

/// One of the three recipe searches; they differ only in endpoint and name.
pub struct RecipeSearch {
    kind: SearchKind,
    client: Arc<SpoonacularClient>,
}

impl RecipeSearch {
    pub fn complex(client: Arc<SpoonacularClient>) -> Self {
        Self {
            kind: SearchKind::Complex,
            client,
        }
    }

    pub fn by_nutrients(client: Arc<SpoonacularClient>) -> Self {
        Self {
            kind: SearchKind::ByNutrients,
            client,
        }
    }

    pub fn by_ingredients(client: Arc<SpoonacularClient>) -> Self {
        Self {
            kind: SearchKind::ByIngredients,
            client,
        }
    }

    fn name(&self) -> &'static str {
        match self.kind {
            SearchKind::Complex => "search_recipes",
            SearchKind::ByNutrients => "search_recipes_by_nutrients",
            SearchKind::ByIngredients => "search_recipes_by_ingredients",
        }
    }

    fn description(&self) -> &'static str {
        match self.kind {
            SearchKind::Complex => {
                "Search recipes with a free-text query and filters such as cuisine, diet, \
                 intolerances, type, maxReadyTime, offset and number."
            }
            SearchKind::ByNutrients => {
                "Find recipes within nutrient bounds, e.g. minProtein, maxCalories, \
                 minCarbs, maxFat, offset and number."
            }
            SearchKind::ByIngredients => {
                "Find recipes that use the given ingredients. `ingredients` is required \
                 (comma-separated); optional: number, ranking, ignorePantry."
            }
        }
    }
}

#[async_trait]
impl Tool for RecipeSearch {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: Some(self.description().to_string()),
            input_schema: schema::object(
                [(
                    "params",
                    schema::open_object("Query parameters forwarded to the recipe API"),
                )],
                &["params"],
            ),
        }
    }

    async fn invoke(&self, arguments: Arguments) -> Result<String, ToolError> {
        let params: SearchParameters = arguments.optional("params")?.unwrap_or_default();
        let body = self.client.search(self.kind, &params).await?;
        serde_json::to_string_pretty(&body).map_err(|e| ToolError::Internal(e.to_string()))
    }

    fn render_error(&self, error: &ToolError) -> String {
        match error {
            ToolError::MissingConfiguration(message) | ToolError::InvalidInput(message) => {
                format!("Error: {message}")
            }
            other => format!("Error searching recipes: {other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pantry_tools::{ToolExecutor, ToolRegistry};
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn registry(client: SpoonacularClient) -> ToolRegistry {
        let client = Arc::new(client);
        ToolRegistry::new()
            .with(RecipeSearch::complex(client.clone()))
            .with(RecipeSearch::by_nutrients(client.clone()))
            .with(RecipeSearch::by_ingredients(client))
    }

    #[tokio::test]
    async fn results_are_pretty_printed_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/recipes/complexSearch"))
            .and(query_param("cuisine", "italian"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": [], "totalResults": 0})))
            .mount(&server)
            .await;
        let client = SpoonacularClient::with_base_url(
            Some("k".to_string()),
            Url::parse(&server.uri()).unwrap(),
        )
        .unwrap();

        let out = registry(client)
            .call("search_recipes", json!({"params": {"cuisine": "italian"}}))
            .await
            .unwrap();
        assert!(!out.is_error);
        assert_eq!(out.text, "{\n  \"results\": [],\n  \"totalResults\": 0\n}");
    }

    #[tokio::test]
    async fn missing_key_names_the_variable() {
        let out = registry(SpoonacularClient::new(None).unwrap())
            .call("search_recipes_by_nutrients", json!({"params": {"maxCalories": 400}}))
            .await
            .unwrap();
        assert!(out.is_error);
        assert!(out.text.starts_with("Error: Spoonacular API key not found."));
    }

    #[tokio::test]
    async fn ingredient_search_fast_fails_without_ingredients() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let client = SpoonacularClient::with_base_url(
            Some("k".to_string()),
            Url::parse(&server.uri()).unwrap(),
        )
        .unwrap();

        let out = registry(client)
            .call("search_recipes_by_ingredients", json!({"params": {"number": 5}}))
            .await
            .unwrap();
        assert!(out.is_error);
        assert!(out.text.contains("`ingredients` parameter is required"));
    }

    #[tokio::test]
    async fn upstream_failure_is_described() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;
        let client = SpoonacularClient::with_base_url(
            Some("bad".to_string()),
            Url::parse(&server.uri()).unwrap(),
        )
        .unwrap();

        let out = registry(client)
            .call("search_recipes", json!({"params": {"query": "soup"}}))
            .await
            .unwrap();
        assert_eq!(
            out.text,
            "Error searching recipes: upstream returned 401: invalid api key"
        );
    }
}
