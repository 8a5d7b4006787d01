use clap::Parser;
use pantry::{PantryConfig, StoreConfig};
use pantry_observability::LogFormat;
use url::Url;

#[derive(Parser, Debug, Clone)]
#[command(name = "pantry-gateway")]
#[command(about = "Recipe, grocery, health and DynamoDB tools over MCP stdio")]
#[command(version)]
pub struct Cli {
    /// Spoonacular API key
    #[arg(long, env = pantry_adapter_spoonacular::API_KEY_VAR, hide_env_values = true)]
    pub spoonacular_api_key: Option<String>,

    /// Spoonacular API base URL
    #[arg(long, env = pantry_adapter_spoonacular::BASE_URL_VAR, default_value = pantry_adapter_spoonacular::DEFAULT_BASE_URL)]
    pub spoonacular_base_url: Url,

    /// Instacart credentials as JSON, e.g. {"api_key": "..."}
    #[arg(long, env = pantry_adapter_instacart::CREDENTIALS_VAR, hide_env_values = true)]
    pub instacart_credentials: Option<String>,

    /// Instacart API base URL
    #[arg(long, env = pantry_adapter_instacart::BASE_URL_VAR, default_value = pantry_adapter_instacart::DEFAULT_BASE_URL)]
    pub instacart_base_url: Url,

    /// Link back to the partner site shown on the shopping page
    #[arg(long, env = pantry_adapter_instacart::LINKBACK_URL_VAR, default_value = pantry_adapter_instacart::DEFAULT_LINKBACK_URL)]
    pub instacart_linkback_url: String,

    /// AWS profile used for DynamoDB
    #[arg(long, env = "AWS_PROFILE", default_value = "default")]
    pub aws_profile: String,

    /// Start without connecting to DynamoDB
    #[arg(long)]
    pub no_dynamodb: bool,

    /// Default log level when RUST_LOG is not set
    #[arg(long, env = "PANTRY_LOG", default_value = "info")]
    pub log_level: String,

    /// Log output format: compact or json
    #[arg(long, env = "PANTRY_LOG_FORMAT", default_value = "compact")]
    pub log_format: LogFormat,
}

impl Cli {
    pub fn pantry_config(&self) -> PantryConfig {
        PantryConfig {
            spoonacular_api_key: self.spoonacular_api_key.clone(),
            spoonacular_base_url: self.spoonacular_base_url.clone(),
            instacart_credentials: self.instacart_credentials.clone(),
            instacart_base_url: self.instacart_base_url.clone(),
            instacart_linkback_url: self.instacart_linkback_url.clone(),
            store: if self.no_dynamodb {
                StoreConfig::Disabled
            } else {
                StoreConfig::DynamoDb {
                    profile: self.aws_profile.clone(),
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_onto_config() {
        let cli = Cli::try_parse_from([
            "pantry-gateway",
            "--spoonacular-api-key",
            "abc",
            "--spoonacular-base-url",
            "http://localhost:9000",
            "--instacart-base-url",
            "http://localhost:9001/idp/v1/",
            "--no-dynamodb",
            "--log-format",
            "json",
        ])
        .unwrap();
        let config = cli.pantry_config();

        assert_eq!(config.spoonacular_api_key.as_deref(), Some("abc"));
        assert_eq!(config.spoonacular_base_url.as_str(), "http://localhost:9000/");
        assert_eq!(config.store, StoreConfig::Disabled);
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    #[test]
    fn dynamodb_profile_is_used_unless_disabled() {
        let cli = Cli::try_parse_from(["pantry-gateway", "--aws-profile", "kitchen"]).unwrap();
        assert_eq!(
            cli.pantry_config().store,
            StoreConfig::DynamoDb {
                profile: "kitchen".to_string()
            }
        );
    }
}
