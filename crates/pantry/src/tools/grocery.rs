use async_trait::async_trait;
use pantry_adapter_instacart::InstacartClient;
use pantry_core::{GroceryItem, ToolDefinition, ToolError};
use pantry_tools::{schema, Arguments, Tool};
use serde_json::json;

pub struct PlaceOrder {
    client: InstacartClient,
}

impl PlaceOrder {
    pub fn new(client: InstacartClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for PlaceOrder {
    fn definition(&self) -> ToolDefinition {
        let item = json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "description": "Name of the item"},
                "quantity": {"type": "number", "description": "Quantity of the item"},
                "unit": {"type": "string", "description": "Unit of measurement (e.g. 'each', 'lb', 'oz')", "default": "each"}
            },
            "required": ["name", "quantity"]
        });
        ToolDefinition {
            name: "place_grocery_order".to_string(),
            description: Some("Place a grocery delivery order on Instacart.".to_string()),
            input_schema: schema::object(
                [("items", schema::array("List of grocery items", item))],
                &["items"],
            ),
        }
    }

    async fn invoke(&self, arguments: Arguments) -> Result<String, ToolError> {
        let items: Vec<GroceryItem> = arguments.required("items")?;
        let confirmation = self.client.place_order(&items).await?;
        Ok(format!(
            "Order placed successfully! Order link: {}",
            confirmation.link
        ))
    }

    fn render_error(&self, error: &ToolError) -> String {
        match error {
            ToolError::MissingConfiguration(message) => format!("Error: {message}"),
            ToolError::Upstream { body, .. } => format!("Error placing order: {body}"),
            other => format!("Error placing order: {other}"),
        }
    }
}
