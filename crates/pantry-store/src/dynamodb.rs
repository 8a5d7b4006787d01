use crate::{AttributeValue, ItemStore, Record, StoreError};
use async_trait::async_trait;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue as SdkAttributeValue;
use aws_sdk_dynamodb::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{error, info};

pub const DEFAULT_REGION: &str = "us-east-1";

const OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct DynamoDbStore {
    client: Client,
}

impl DynamoDbStore {
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Loads the named profile, falls back to [`DEFAULT_REGION`] and checks
    /// the credentials with a caller-identity request.
    pub async fn connect(profile: &str) -> Result<Self, StoreError> {
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .profile_name(profile)
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(OPERATION_TIMEOUT)
                    .build(),
            )
            .load()
            .await;
        let region = shared
            .region()
            .cloned()
            .unwrap_or_else(|| Region::new(DEFAULT_REGION));

        let sts = aws_sdk_sts::Client::from_conf(
            aws_sdk_sts::config::Builder::from(&shared)
                .region(region.clone())
                .build(),
        );
        sts.get_caller_identity().send().await.map_err(|err| {
            StoreError::Unavailable(aws_sdk_sts::error::DisplayErrorContext(&err).to_string())
        })?;
        info!(profile, region = %region, "connected to AWS");

        let client = Client::from_conf(
            aws_sdk_dynamodb::config::Builder::from(&shared)
                .region(region)
                .build(),
        );
        Ok(Self { client })
    }
}

#[async_trait]
impl ItemStore for DynamoDbStore {
    async fn get_item(&self, table_name: &str, key: Record) -> Result<Option<Record>, StoreError> {
        let key: HashMap<String, SdkAttributeValue> = key
            .into_iter()
            .map(|(name, value)| (name, to_sdk(value)))
            .collect();

        let output = self
            .client
            .get_item()
            .table_name(table_name)
            .set_key(Some(key))
            .send()
            .await
            .map_err(|err| match err.as_service_error() {
                Some(service) => {
                    let message = service.message().unwrap_or("unknown DynamoDB error");
                    error!(table_name, reason = message, "DynamoDB error");
                    StoreError::Backend(message.to_string())
                }
                None => {
                    let message = DisplayErrorContext(&err).to_string();
                    error!(table_name, reason = %message, "DynamoDB request failed");
                    StoreError::Unexpected(message)
                }
            })?;

        output
            .item()
            .map(|item| {
                item.iter()
                    .map(|(name, value)| Ok((name.clone(), from_sdk(value)?)))
                    .collect::<Result<Record, StoreError>>()
            })
            .transpose()
    }
}

fn to_sdk(value: AttributeValue) -> SdkAttributeValue {
    match value {
        AttributeValue::String(s) => SdkAttributeValue::S(s),
        AttributeValue::Number(n) => SdkAttributeValue::N(n),
        AttributeValue::Binary(bytes) => SdkAttributeValue::B(Blob::new(bytes)),
        AttributeValue::Bool(b) => SdkAttributeValue::Bool(b),
        AttributeValue::Null => SdkAttributeValue::Null(true),
        AttributeValue::List(items) => {
            SdkAttributeValue::L(items.into_iter().map(to_sdk).collect())
        }
        AttributeValue::Map(record) => SdkAttributeValue::M(
            record
                .into_iter()
                .map(|(name, value)| (name, to_sdk(value)))
                .collect(),
        ),
        AttributeValue::StringSet(items) => SdkAttributeValue::Ss(items),
        AttributeValue::NumberSet(items) => SdkAttributeValue::Ns(items),
        AttributeValue::BinarySet(items) => {
            SdkAttributeValue::Bs(items.into_iter().map(Blob::new).collect())
        }
    }
}

fn from_sdk(value: &SdkAttributeValue) -> Result<AttributeValue, StoreError> {
    Ok(match value {
        SdkAttributeValue::S(s) => AttributeValue::String(s.clone()),
        SdkAttributeValue::N(n) => AttributeValue::Number(n.clone()),
        SdkAttributeValue::B(blob) => AttributeValue::Binary(blob.as_ref().to_vec()),
        SdkAttributeValue::Bool(b) => AttributeValue::Bool(*b),
        SdkAttributeValue::Null(_) => AttributeValue::Null,
        SdkAttributeValue::L(items) => AttributeValue::List(
            items.iter().map(from_sdk).collect::<Result<_, _>>()?,
        ),
        SdkAttributeValue::M(map) => AttributeValue::Map(
            map.iter()
                .map(|(name, value)| Ok((name.clone(), from_sdk(value)?)))
                .collect::<Result<_, StoreError>>()?,
        ),
        SdkAttributeValue::Ss(items) => AttributeValue::StringSet(items.clone()),
        SdkAttributeValue::Ns(items) => AttributeValue::NumberSet(items.clone()),
        SdkAttributeValue::Bs(items) => {
            AttributeValue::BinarySet(items.iter().map(|blob| blob.as_ref().to_vec()).collect())
        }
        other => {
            return Err(StoreError::Unexpected(format!(
                "unsupported attribute type: {other:?}"
            )))
        }
    })
}
