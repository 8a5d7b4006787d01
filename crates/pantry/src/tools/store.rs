use async_trait::async_trait;
use pantry_core::{ToolDefinition, ToolError};
use pantry_store::{ItemFetcher, Lookup};
use pantry_tools::{schema, Arguments, Tool};
use serde_json::{Map, Value};

pub const STORE_UNAVAILABLE_MESSAGE: &str =
    "Error: DynamoDB client not initialized. Please check AWS credentials in ~/.aws/credentials";

pub struct GetItem {
    fetcher: ItemFetcher,
}

impl GetItem {
    pub fn new(fetcher: ItemFetcher) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl Tool for GetItem {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_dynamodb_item".to_string(),
            description: Some("Retrieve an item from DynamoDB.".to_string()),
            input_schema: schema::object(
                [
                    ("table_name", schema::string("Name of the DynamoDB table")),
                    (
                        "key",
                        schema::open_object(
                            "Primary key attributes, e.g. {\"id\": \"123\"} or {\"partition_key\": \"pk\", \"sort_key\": \"sk\"}",
                        ),
                    ),
                ],
                &["table_name", "key"],
            ),
        }
    }

    async fn invoke(&self, arguments: Arguments) -> Result<String, ToolError> {
        let table_name: String = arguments.required("table_name")?;
        let key: Map<String, Value> = arguments.required("key")?;

        match self.fetcher.fetch(&table_name, &key).await? {
            Lookup::Found(item) => serde_json::to_string_pretty(&item)
                .map_err(|e| ToolError::Internal(e.to_string())),
            Lookup::Missing { key } => Ok(format!("No item found with key: {key}")),
        }
    }

    fn render_error(&self, error: &ToolError) -> String {
        match error {
            ToolError::Unavailable(_) => STORE_UNAVAILABLE_MESSAGE.to_string(),
            ToolError::Backend(message)
            | ToolError::Internal(message)
            | ToolError::InvalidInput(message) => format!("Error retrieving item: {message}"),
            other => format!("Error retrieving item: {other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pantry_store::{AttributeValue, BackendHandle, MemoryStore, Record};
    use pantry_tools::{ToolExecutor, ToolRegistry};
    use serde_json::json;

    fn registry(backend: BackendHandle) -> ToolRegistry {
        ToolRegistry::new().with(GetItem::new(ItemFetcher::new(backend)))
    }

    fn identity_store() -> MemoryStore {
        MemoryStore::new().with_item(
            "identity",
            Record::from([
                ("userId".to_string(), AttributeValue::String("user123".to_string())),
                ("weight".to_string(), AttributeValue::Number("72.5".to_string())),
            ]),
        )
    }

    #[tokio::test]
    async fn found_item_is_pretty_json() {
        let out = registry(BackendHandle::available(identity_store()))
            .call("get_dynamodb_item", json!({"table_name": "identity", "key": {"userId": "user123"}}))
            .await
            .unwrap();
        assert!(!out.is_error);
        assert_eq!(
            out.text,
            "{\n  \"userId\": \"user123\",\n  \"weight\": 72.5\n}"
        );
    }

    #[tokio::test]
    async fn missing_item_is_not_an_error() {
        let out = registry(BackendHandle::available(identity_store()))
            .call("get_dynamodb_item", json!({"table_name": "identity", "key": {"userId": "nobody"}}))
            .await
            .unwrap();
        assert!(!out.is_error);
        assert_eq!(out.text, "No item found with key: {\"userId\":\"nobody\"}");
    }

    #[tokio::test]
    async fn unavailable_backend_always_gives_the_fixed_text() {
        let registry = registry(BackendHandle::unavailable("expired token"));
        for id in ["1", "2", "1"] {
            let out = registry
                .call("get_dynamodb_item", json!({"table_name": "t", "key": {"id": id}}))
                .await
                .unwrap();
            assert!(out.is_error);
            assert_eq!(out.text, STORE_UNAVAILABLE_MESSAGE);
        }
    }

    #[tokio::test]
    async fn backend_message_is_relayed() {
        let out = registry(BackendHandle::available(MemoryStore::failing(
            "The provided key element does not match the schema",
        )))
        .call("get_dynamodb_item", json!({"table_name": "t", "key": {"wrong": 1}}))
        .await
        .unwrap();
        assert_eq!(
            out.text,
            "Error retrieving item: The provided key element does not match the schema"
        );
    }
}
