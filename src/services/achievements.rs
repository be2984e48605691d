//! Automatic achievement awarding.
//!
//! Handlers call [`check_and_award`] after anything that can satisfy a rule:
//! creating a reaction, completing a task, assigning a developer to a task.

use crate::db::{Store, StoreError};
use crate::models::AchievementTemplate;

pub const FIRST_REACTION: &str = "First Reaction";
pub const HACKATHON_WINNER: &str = "Hackathon Winner";

/// Awards every achievement whose condition the developer now meets and does
/// not hold yet. Returns the newly awarded templates.
pub async fn check_and_award(
    store: &dyn Store,
    developer_id: i32,
) -> Result<Vec<AchievementTemplate>, StoreError> {
    let mut awarded = Vec::new();

    if !store.developer_reactions(developer_id).await?.is_empty() {
        awarded.extend(award_once(store, developer_id, FIRST_REACTION).await?);
    }

    let completed_assignment = store
        .assigned_tasks(developer_id)
        .await?
        .iter()
        .any(|task| task.completed);
    if completed_assignment {
        awarded.extend(award_once(store, developer_id, HACKATHON_WINNER).await?);
    }

    for achievement in &awarded {
        log::info!(
            "Awarded '{}' to developer {}",
            achievement.title,
            developer_id
        );
    }
    Ok(awarded)
}

async fn award_once(
    store: &dyn Store,
    developer_id: i32,
    title: &str,
) -> Result<Option<AchievementTemplate>, StoreError> {
    let Some(template) = store.find_achievement_by_title(title).await? else {
        log::warn!("Achievement template '{}' is missing", title);
        return Ok(None);
    };

    if store.has_achievement(developer_id, template.id).await? {
        return Ok(None);
    }

    match store.award_achievement(developer_id, template.id).await {
        Ok(()) => Ok(Some(template)),
        // awarded concurrently
        Err(StoreError::Conflict(_)) => Ok(None),
        Err(e) => Err(e),
    }
}
