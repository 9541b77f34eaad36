use serde::{Deserialize, Serialize};

/// Input of the email generator form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailDraftRequest {
    /// Name of the customer who left the feedback
    pub customer_name: String,
    /// The negative feedback to respond to
    pub feedback_details: String,
}

/// A generated customer-service email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailDraft {
    /// Customer the email is addressed to
    pub customer_name: String,
    /// Generated email text
    pub email: String,
}
