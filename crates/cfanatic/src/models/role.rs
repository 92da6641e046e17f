use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// The author of a message
pub enum Role {
    System,
    User,
    Assistant,
    /// The output of a tool invocation, observed by the assistant
    Tool,
}
