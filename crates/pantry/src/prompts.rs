use pantry_core::PromptDefinition;

const COLLECT_USER_INFO: &str = "\
Your task is to collect the following information from the user:
1. Age (in years)
2. Weight (in kg)
3. Height (in cm)

Instructions:
- Ask for only ONE piece of information at a time
- Wait for the user's response before asking for the next piece
- Check each answer with the matching tool: validate_age, validate_weight, validate_height
- Use a friendly, conversational tone
- After collecting all information, call validate_height_and_calculate_bmi and share their BMI
- Begin by introducing yourself and asking for their age

Start the conversation by saying: \"Hi there! I'm here to collect some basic health information. Could you please tell me your age in years?\"";

pub(crate) fn all() -> Vec<PromptDefinition> {
    vec![PromptDefinition {
        name: "collect_user_info".to_string(),
        description: Some(
            "Guide the conversation to collect age, weight and height one at a time".to_string(),
        ),
        text: COLLECT_USER_INFO.to_string(),
    }]
}
