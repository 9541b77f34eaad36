//! Customer-service email drafting.

use crate::error::{AppError, Result};
use crate::models::email::{EmailDraft, EmailDraftRequest};
use crate::provider::{Provider, TextGenerationConfig};

/// Builds the text-generation prompt for a reply to negative feedback.
pub fn email_prompt(customer_name: &str, feedback_details: &str) -> String {
    format!(
        "Command: Write an email from Bob, Customer Service Manager, to the customer \"{customer_name}\" \
         who provided negative feedback on the service provided by our customer support engineer.\n\
         Feedback Details: {feedback_details}"
    )
}

/// Drafts an email answering the customer's feedback.
///
/// Both fields must be non-blank.
pub async fn draft_email(provider: &dyn Provider, request: &EmailDraftRequest) -> Result<EmailDraft> {
    let customer_name = request.customer_name.trim();
    let feedback_details = request.feedback_details.trim();

    if customer_name.is_empty() || feedback_details.is_empty() {
        return Err(AppError::InvalidInput(
            "Please provide both the customer name and feedback details.".to_string(),
        ));
    }

    log::info!("Drafting email for {customer_name} via {}", provider.name());

    let prompt = email_prompt(customer_name, feedback_details);
    let email = provider
        .generate_text(&prompt, &TextGenerationConfig::default())
        .await?;

    Ok(EmailDraft {
        customer_name: customer_name.to_string(),
        email,
    })
}
