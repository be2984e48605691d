use crate::db::{Store, StoreError};
use crate::services::achievements::{FIRST_REACTION, HACKATHON_WINNER};

pub const DEFAULT_SKILLS: [&str; 10] = [
    "Rust",
    "Python",
    "JavaScript",
    "TypeScript",
    "Go",
    "Java",
    "SQL",
    "Docker",
    "Kubernetes",
    "Linux",
];

pub const DEFAULT_ACHIEVEMENTS: [(&str, &str); 2] = [
    (FIRST_REACTION, "Reacted to a task for the first time"),
    (HACKATHON_WINNER, "Completed a task you were assigned to"),
];

/// Inserts the default skill and achievement templates. Templates that already
/// exist are left alone, so this runs on every startup.
pub async fn seed_defaults(store: &dyn Store) -> Result<(), StoreError> {
    let mut created = 0;

    for name in DEFAULT_SKILLS {
        match store.create_skill(name).await {
            Ok(_) => created += 1,
            Err(StoreError::Conflict(_)) => {}
            Err(e) => return Err(e),
        }
    }

    for (title, description) in DEFAULT_ACHIEVEMENTS {
        match store.create_achievement(title, description).await {
            Ok(_) => created += 1,
            Err(StoreError::Conflict(_)) => {}
            Err(e) => return Err(e),
        }
    }

    if created > 0 {
        log::info!("Seeded {} catalog templates", created);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::Page;

    #[actix_rt::test]
    async fn test_seeding_is_idempotent() {
        let store = MemoryStore::new();
        seed_defaults(&store).await.unwrap();
        seed_defaults(&store).await.unwrap();

        let skills = store.list_skills(Page::all()).await.unwrap();
        assert_eq!(skills.len(), DEFAULT_SKILLS.len());
        assert_eq!(skills[0].name, "Rust");

        let achievements = store.list_achievements().await.unwrap();
        assert_eq!(achievements.len(), DEFAULT_ACHIEVEMENTS.len());
    }
}
