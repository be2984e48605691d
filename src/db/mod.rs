//! Data access.
//!
//! Every persistence operation goes through the [`Store`] trait. Handlers receive
//! an explicitly constructed `web::Data<dyn Store>`; there is no global pool.
//! Lookups that match nothing return `Ok(None)` (or an empty list), uniqueness
//! violations return [`StoreError::Conflict`], writes pointing at a row that does
//! not exist return [`StoreError::MissingReference`], and every other datastore
//! failure is logged where it happens and returned as [`StoreError::Backend`].

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::fmt;

use crate::models::{
    Account, AchievementTemplate, Assignment, Developer, DeveloperAchievement, DeveloperProfile,
    DeveloperUpdate, Employer, EmployerProfile, EmployerUpdate, NewAccount, Page, Reaction,
    ReactionInput, Skill, Task, TaskFilter, TaskInput, TaskUpdate,
};

pub use memory::MemoryStore;
pub use postgres::{connect, run_migrations, PgStore};

/// Failure reported by the data-access layer.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// A uniqueness rule rejected the write.
    Conflict(String),
    /// The write references a task, account, skill or achievement that does not exist.
    MissingReference(String),
    /// Any other datastore failure. Already logged; any transaction was rolled back.
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StoreError::Conflict(msg) => write!(f, "conflict: {}", msg),
            StoreError::MissingReference(msg) => write!(f, "missing reference: {}", msg),
            StoreError::Backend(msg) => write!(f, "datastore failure: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// The closed set of keys an account can be looked up by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountLookup<'a> {
    Id(i32),
    Username(&'a str),
    Email(&'a str),
}

impl AccountLookup<'_> {
    pub fn column(&self) -> &'static str {
        match self {
            AccountLookup::Id(_) => "id",
            AccountLookup::Username(_) => "username",
            AccountLookup::Email(_) => "email",
        }
    }

    pub fn matches<P>(&self, account: &Account<P>) -> bool {
        match *self {
            AccountLookup::Id(id) => account.id == id,
            AccountLookup::Username(username) => account.username == username,
            AccountLookup::Email(email) => account.email == email,
        }
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    // Accounts
    async fn find_developer(&self, key: AccountLookup<'_>) -> Result<Option<Developer>, StoreError>;
    async fn create_developer(
        &self,
        account: NewAccount<DeveloperProfile>,
    ) -> Result<Developer, StoreError>;
    async fn update_developer(
        &self,
        id: i32,
        update: &DeveloperUpdate,
    ) -> Result<Option<Developer>, StoreError>;
    async fn find_employer(&self, key: AccountLookup<'_>) -> Result<Option<Employer>, StoreError>;
    async fn create_employer(
        &self,
        account: NewAccount<EmployerProfile>,
    ) -> Result<Employer, StoreError>;
    async fn update_employer(
        &self,
        id: i32,
        update: &EmployerUpdate,
    ) -> Result<Option<Employer>, StoreError>;

    // Tasks
    async fn create_task(&self, employer_id: i32, input: &TaskInput) -> Result<Task, StoreError>;
    async fn find_task(&self, id: i32) -> Result<Option<Task>, StoreError>;
    async fn list_tasks(&self, filter: TaskFilter, page: Page) -> Result<Vec<Task>, StoreError>;
    async fn update_task(&self, id: i32, update: &TaskUpdate) -> Result<Option<Task>, StoreError>;
    /// Removes the task with its reactions and assignments. False if it did not exist.
    async fn delete_task(&self, id: i32) -> Result<bool, StoreError>;
    async fn assign_developer(
        &self,
        task_id: i32,
        developer_id: i32,
    ) -> Result<Assignment, StoreError>;
    async fn assigned_tasks(&self, developer_id: i32) -> Result<Vec<Task>, StoreError>;
    async fn assigned_developers(&self, task_id: i32) -> Result<Vec<Developer>, StoreError>;

    // Reactions
    async fn has_reacted(&self, task_id: i32, developer_id: i32) -> Result<bool, StoreError>;
    /// Inserts a reaction, returning `Conflict` if the developer already reacted to the task
    /// and `MissingReference` if the task or developer does not exist.
    async fn create_reaction(
        &self,
        task_id: i32,
        developer_id: i32,
        input: &ReactionInput,
    ) -> Result<Reaction, StoreError>;
    async fn find_reaction(&self, id: i32) -> Result<Option<Reaction>, StoreError>;
    async fn task_reactions(&self, task_id: i32) -> Result<Vec<Reaction>, StoreError>;
    async fn developer_reactions(&self, developer_id: i32) -> Result<Vec<Reaction>, StoreError>;
    async fn delete_reaction(&self, id: i32) -> Result<bool, StoreError>;

    // Skills
    async fn create_skill(&self, name: &str) -> Result<Skill, StoreError>;
    async fn find_skill(&self, id: i32) -> Result<Option<Skill>, StoreError>;
    async fn list_skills(&self, page: Page) -> Result<Vec<Skill>, StoreError>;
    async fn developer_skills(&self, developer_id: i32) -> Result<Vec<Skill>, StoreError>;
    async fn add_developer_skill(&self, developer_id: i32, skill_id: i32) -> Result<(), StoreError>;

    // Achievements
    async fn create_achievement(
        &self,
        title: &str,
        description: &str,
    ) -> Result<AchievementTemplate, StoreError>;
    async fn find_achievement_by_title(
        &self,
        title: &str,
    ) -> Result<Option<AchievementTemplate>, StoreError>;
    async fn list_achievements(&self) -> Result<Vec<AchievementTemplate>, StoreError>;
    async fn has_achievement(
        &self,
        developer_id: i32,
        achievement_id: i32,
    ) -> Result<bool, StoreError>;
    async fn award_achievement(
        &self,
        developer_id: i32,
        achievement_id: i32,
    ) -> Result<(), StoreError>;
    async fn developer_achievements(
        &self,
        developer_id: i32,
    ) -> Result<Vec<DeveloperAchievement>, StoreError>;
}
