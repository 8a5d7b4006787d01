use async_trait::async_trait;
use pantry_core::{ToolDefinition, ToolError};
use pantry_health::{finalize, validate_age, validate_height, validate_weight};
use pantry_tools::{schema, Arguments, Tool};

pub struct ValidateAge;

#[async_trait]
impl Tool for ValidateAge {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "validate_age".to_string(),
            description: Some("Validate the user's age input".to_string()),
            input_schema: schema::object([("age", schema::integer("Age in years"))], &["age"]),
        }
    }

    async fn invoke(&self, arguments: Arguments) -> Result<String, ToolError> {
        let age = arguments.integer("age")?;
        Ok(validate_age(age).to_string())
    }
}

pub struct ValidateWeight;

#[async_trait]
impl Tool for ValidateWeight {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "validate_weight".to_string(),
            description: Some("Validate the user's weight input".to_string()),
            input_schema: schema::object(
                [("weight_kg", schema::number("Weight in kilograms"))],
                &["weight_kg"],
            ),
        }
    }

    async fn invoke(&self, arguments: Arguments) -> Result<String, ToolError> {
        let weight_kg: f64 = arguments.required("weight_kg")?;
        Ok(validate_weight(weight_kg).to_string())
    }
}

pub struct ValidateHeight;

#[async_trait]
impl Tool for ValidateHeight {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "validate_height".to_string(),
            description: Some("Validate the user's height input".to_string()),
            input_schema: schema::object(
                [("height_cm", schema::number("Height in centimeters"))],
                &["height_cm"],
            ),
        }
    }

    async fn invoke(&self, arguments: Arguments) -> Result<String, ToolError> {
        let height_cm: f64 = arguments.required("height_cm")?;
        Ok(validate_height(height_cm).to_string())
    }
}

pub struct CalculateBmi;

#[async_trait]
impl Tool for CalculateBmi {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "validate_height_and_calculate_bmi".to_string(),
            description: Some(
                "Validate height and calculate BMI based on collected information".to_string(),
            ),
            input_schema: schema::object(
                [
                    ("age", schema::integer("Age in years")),
                    ("weight_kg", schema::number("Weight in kilograms")),
                    ("height_cm", schema::number("Height in centimeters")),
                ],
                &["age", "weight_kg", "height_cm"],
            ),
        }
    }

    async fn invoke(&self, arguments: Arguments) -> Result<String, ToolError> {
        let age = arguments.integer("age")?;
        let weight_kg: f64 = arguments.required("weight_kg")?;
        let height_cm: f64 = arguments.required("height_cm")?;
        Ok(finalize(age, weight_kg, height_cm).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pantry_tools::{ToolExecutor, ToolRegistry};
    use serde_json::json;

    fn registry() -> ToolRegistry {
        ToolRegistry::new()
            .with(ValidateAge)
            .with(ValidateWeight)
            .with(ValidateHeight)
            .with(CalculateBmi)
    }

    #[tokio::test]
    async fn out_of_range_is_a_soft_warning() {
        let out = registry().call("validate_age", json!({"age": 150})).await.unwrap();
        assert!(!out.is_error);
        assert!(out.text.starts_with("That age seems outside the normal human range."));
    }

    #[tokio::test]
    async fn whole_float_age_is_validated_not_rejected() {
        let out = registry().call("validate_age", json!({"age": 30.0})).await.unwrap();
        assert!(!out.is_error);
        assert!(out.text.starts_with("Age validated."));

        let out = registry()
            .call(
                "validate_height_and_calculate_bmi",
                json!({"age": 25.0, "weight_kg": 70, "height_cm": 175}),
            )
            .await
            .unwrap();
        assert!(out.text.contains("- Age: 25 years"));

        let err = registry().call("validate_age", json!({"age": 30.5})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn validators_accept_integral_weights() {
        let out = registry().call("validate_weight", json!({"weight_kg": 70})).await.unwrap();
        assert!(out.text.starts_with("Weight validated."));
    }

    #[tokio::test]
    async fn bmi_summary_over_the_wire() {
        let out = registry()
            .call(
                "validate_height_and_calculate_bmi",
                json!({"age": 25, "weight_kg": 70, "height_cm": 175}),
            )
            .await
            .unwrap();
        assert!(out.text.contains("- BMI: 22.9 (normal weight)"));
    }

    #[tokio::test]
    async fn bmi_with_bad_height_returns_the_height_warning() {
        let out = registry()
            .call(
                "validate_height_and_calculate_bmi",
                json!({"age": 25, "weight_kg": 70, "height_cm": 20}),
            )
            .await
            .unwrap();
        assert!(out.text.starts_with("That height seems unusual."));
        assert!(!out.text.contains("BMI"));
    }
}
