use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An entry of the skill catalog. Names are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Skill {
    pub id: i32,
    pub name: String,
}

/// Body of `POST /developer/profile/skills/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillAssignment {
    pub skill_id: i32,
}

/// An achievement that can be awarded to developers. Titles are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AchievementTemplate {
    pub id: i32,
    pub title: String,
    pub description: String,
}

/// An achievement held by a developer, with the time it was awarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DeveloperAchievement {
    pub achievement_id: i32,
    pub title: String,
    pub description: String,
    pub awarded_at: DateTime<Utc>,
}
