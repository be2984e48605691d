use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A developer's response to a task. At most one exists per (task, developer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Reaction {
    pub id: i32,
    pub title: String,
    pub message: String,
    pub task_id: i32,
    pub developer_id: i32,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /developer/tasks/{id}/react/`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReactionInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reaction_input_validation() {
        let valid = ReactionInput {
            title: "Interested".into(),
            message: "I have done this before.".into(),
        };
        assert!(valid.validate().is_ok());

        let missing_title = ReactionInput {
            title: String::new(),
            message: "hello".into(),
        };
        assert!(missing_title.validate().is_err());
    }

    #[test]
    fn test_message_defaults_to_empty() {
        let input: ReactionInput = serde_json::from_str(r#"{"title": "Interested"}"#).unwrap();
        assert_eq!(input.message, "");
    }
}
