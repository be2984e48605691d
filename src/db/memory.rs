//! In-process `Store` for tests and local demos.
//!
//! Holds every table in one mutex-guarded struct and enforces the same
//! uniqueness rules and cascades as the PostgreSQL schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard};

use super::{AccountLookup, Store, StoreError};
use crate::models::{
    Account, AchievementTemplate, Assignment, Developer, DeveloperAchievement, DeveloperProfile,
    DeveloperUpdate, Employer, EmployerProfile, EmployerUpdate, NewAccount, Page, Reaction,
    ReactionInput, Skill, Task, TaskFilter, TaskInput, TaskUpdate,
};

#[derive(Default)]
struct Sequence(i32);

impl Sequence {
    fn next(&mut self) -> i32 {
        self.0 += 1;
        self.0
    }
}

#[derive(Default)]
struct Tables {
    developers: Vec<Developer>,
    employers: Vec<Employer>,
    tasks: Vec<Task>,
    assignments: Vec<Assignment>,
    reactions: Vec<Reaction>,
    skills: Vec<Skill>,
    developer_skills: Vec<(i32, i32)>,
    achievements: Vec<AchievementTemplate>,
    awards: Vec<(i32, i32, DateTime<Utc>)>,

    developer_ids: Sequence,
    employer_ids: Sequence,
    task_ids: Sequence,
    reaction_ids: Sequence,
    skill_ids: Sequence,
    achievement_ids: Sequence,
}

/// Rejects a new account whose username or email is taken within its kind.
fn check_unique_account<P>(
    accounts: &[Account<P>],
    username: &str,
    email: &str,
    exclude: Option<i32>,
) -> Result<(), StoreError> {
    let others = accounts.iter().filter(|a| Some(a.id) != exclude);
    for account in others {
        if account.username == username {
            return Err(StoreError::Conflict(format!(
                "Username '{}' is already registered",
                username
            )));
        }
        if account.email == email {
            return Err(StoreError::Conflict(format!(
                "Email '{}' is already registered",
                email
            )));
        }
    }
    Ok(())
}

/// Mirrors the schema's foreign keys: a write naming a missing row is rejected.
fn require(found: bool, table: &str, id: i32) -> Result<(), StoreError> {
    if found {
        Ok(())
    } else {
        Err(StoreError::MissingReference(format!(
            "{} {} does not exist",
            table, id
        )))
    }
}

impl Tables {
    fn has_developer(&self, id: i32) -> bool {
        self.developers.iter().any(|d| d.id == id)
    }

    fn has_task(&self, id: i32) -> bool {
        self.tasks.iter().any(|t| t.id == id)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables.lock().map_err(|_| {
            log::error!("memory store lock poisoned");
            StoreError::Backend("memory store lock poisoned".into())
        })
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_developer(&self, key: AccountLookup<'_>) -> Result<Option<Developer>, StoreError> {
        let tables = self.tables()?;
        Ok(tables.developers.iter().find(|d| key.matches(*d)).cloned())
    }

    async fn create_developer(
        &self,
        account: NewAccount<DeveloperProfile>,
    ) -> Result<Developer, StoreError> {
        let mut tables = self.tables()?;
        check_unique_account(&tables.developers, &account.username, &account.email, None)?;
        let developer = Account {
            id: tables.developer_ids.next(),
            username: account.username,
            email: account.email,
            password_hash: account.password_hash,
            profile: account.profile,
        };
        tables.developers.push(developer.clone());
        Ok(developer)
    }

    async fn update_developer(
        &self,
        id: i32,
        update: &DeveloperUpdate,
    ) -> Result<Option<Developer>, StoreError> {
        let mut tables = self.tables()?;
        let Some(index) = tables.developers.iter().position(|d| d.id == id) else {
            return Ok(None);
        };
        let mut developer = tables.developers[index].clone();
        update.apply(&mut developer);
        check_unique_account(
            &tables.developers,
            &developer.username,
            &developer.email,
            Some(id),
        )?;
        tables.developers[index] = developer.clone();
        Ok(Some(developer))
    }

    async fn find_employer(&self, key: AccountLookup<'_>) -> Result<Option<Employer>, StoreError> {
        let tables = self.tables()?;
        Ok(tables.employers.iter().find(|e| key.matches(*e)).cloned())
    }

    async fn create_employer(
        &self,
        account: NewAccount<EmployerProfile>,
    ) -> Result<Employer, StoreError> {
        let mut tables = self.tables()?;
        check_unique_account(&tables.employers, &account.username, &account.email, None)?;
        let employer = Account {
            id: tables.employer_ids.next(),
            username: account.username,
            email: account.email,
            password_hash: account.password_hash,
            profile: account.profile,
        };
        tables.employers.push(employer.clone());
        Ok(employer)
    }

    async fn update_employer(
        &self,
        id: i32,
        update: &EmployerUpdate,
    ) -> Result<Option<Employer>, StoreError> {
        let mut tables = self.tables()?;
        let Some(index) = tables.employers.iter().position(|e| e.id == id) else {
            return Ok(None);
        };
        let mut employer = tables.employers[index].clone();
        update.apply(&mut employer);
        check_unique_account(
            &tables.employers,
            &employer.username,
            &employer.email,
            Some(id),
        )?;
        tables.employers[index] = employer.clone();
        Ok(Some(employer))
    }

    async fn create_task(&self, employer_id: i32, input: &TaskInput) -> Result<Task, StoreError> {
        let mut tables = self.tables()?;
        let found = tables.employers.iter().any(|e| e.id == employer_id);
        require(found, "employer", employer_id)?;
        let now = Utc::now();
        let task = Task {
            id: tables.task_ids.next(),
            title: input.title.clone(),
            description: input.description.clone(),
            completed: false,
            completed_at: None,
            created_at: now,
            updated_at: now,
            employer_id,
        };
        tables.tasks.push(task.clone());
        Ok(task)
    }

    async fn find_task(&self, id: i32) -> Result<Option<Task>, StoreError> {
        let tables = self.tables()?;
        Ok(tables.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn list_tasks(&self, filter: TaskFilter, page: Page) -> Result<Vec<Task>, StoreError> {
        let tables = self.tables()?;
        Ok(page.slice(tables.tasks.iter().filter(|t| filter.matches(t)).cloned()))
    }

    async fn update_task(&self, id: i32, update: &TaskUpdate) -> Result<Option<Task>, StoreError> {
        let mut tables = self.tables()?;
        Ok(tables.tasks.iter_mut().find(|t| t.id == id).map(|task| {
            update.apply(task, Utc::now());
            task.clone()
        }))
    }

    async fn delete_task(&self, id: i32) -> Result<bool, StoreError> {
        let mut tables = self.tables()?;
        let before = tables.tasks.len();
        tables.tasks.retain(|t| t.id != id);
        if tables.tasks.len() == before {
            return Ok(false);
        }
        tables.reactions.retain(|r| r.task_id != id);
        tables.assignments.retain(|a| a.task_id != id);
        Ok(true)
    }

    async fn assign_developer(
        &self,
        task_id: i32,
        developer_id: i32,
    ) -> Result<Assignment, StoreError> {
        let mut tables = self.tables()?;
        require(tables.has_task(task_id), "task", task_id)?;
        require(tables.has_developer(developer_id), "developer", developer_id)?;
        let assignment = Assignment {
            task_id,
            developer_id,
        };
        if tables.assignments.contains(&assignment) {
            return Err(StoreError::Conflict(
                "Developer is already assigned to this task".into(),
            ));
        }
        tables.assignments.push(assignment.clone());
        Ok(assignment)
    }

    async fn assigned_tasks(&self, developer_id: i32) -> Result<Vec<Task>, StoreError> {
        let tables = self.tables()?;
        Ok(tables
            .tasks
            .iter()
            .filter(|t| {
                tables
                    .assignments
                    .iter()
                    .any(|a| a.task_id == t.id && a.developer_id == developer_id)
            })
            .cloned()
            .collect())
    }

    async fn assigned_developers(&self, task_id: i32) -> Result<Vec<Developer>, StoreError> {
        let tables = self.tables()?;
        Ok(tables
            .developers
            .iter()
            .filter(|d| {
                tables
                    .assignments
                    .iter()
                    .any(|a| a.task_id == task_id && a.developer_id == d.id)
            })
            .cloned()
            .collect())
    }

    async fn has_reacted(&self, task_id: i32, developer_id: i32) -> Result<bool, StoreError> {
        let tables = self.tables()?;
        Ok(tables
            .reactions
            .iter()
            .any(|r| r.task_id == task_id && r.developer_id == developer_id))
    }

    async fn create_reaction(
        &self,
        task_id: i32,
        developer_id: i32,
        input: &ReactionInput,
    ) -> Result<Reaction, StoreError> {
        // check and insert under one lock
        let mut tables = self.tables()?;
        require(tables.has_task(task_id), "task", task_id)?;
        require(tables.has_developer(developer_id), "developer", developer_id)?;
        if tables
            .reactions
            .iter()
            .any(|r| r.task_id == task_id && r.developer_id == developer_id)
        {
            return Err(StoreError::Conflict("Already reacted to this task".into()));
        }
        let reaction = Reaction {
            id: tables.reaction_ids.next(),
            title: input.title.clone(),
            message: input.message.clone(),
            task_id,
            developer_id,
            created_at: Utc::now(),
        };
        tables.reactions.push(reaction.clone());
        Ok(reaction)
    }

    async fn find_reaction(&self, id: i32) -> Result<Option<Reaction>, StoreError> {
        let tables = self.tables()?;
        Ok(tables.reactions.iter().find(|r| r.id == id).cloned())
    }

    async fn task_reactions(&self, task_id: i32) -> Result<Vec<Reaction>, StoreError> {
        let tables = self.tables()?;
        Ok(tables
            .reactions
            .iter()
            .filter(|r| r.task_id == task_id)
            .cloned()
            .collect())
    }

    async fn developer_reactions(&self, developer_id: i32) -> Result<Vec<Reaction>, StoreError> {
        let tables = self.tables()?;
        Ok(tables
            .reactions
            .iter()
            .filter(|r| r.developer_id == developer_id)
            .cloned()
            .collect())
    }

    async fn delete_reaction(&self, id: i32) -> Result<bool, StoreError> {
        let mut tables = self.tables()?;
        let before = tables.reactions.len();
        tables.reactions.retain(|r| r.id != id);
        Ok(tables.reactions.len() < before)
    }

    async fn create_skill(&self, name: &str) -> Result<Skill, StoreError> {
        let mut tables = self.tables()?;
        if tables.skills.iter().any(|s| s.name == name) {
            return Err(StoreError::Conflict(format!("Skill '{}' already exists", name)));
        }
        let skill = Skill {
            id: tables.skill_ids.next(),
            name: name.to_string(),
        };
        tables.skills.push(skill.clone());
        Ok(skill)
    }

    async fn find_skill(&self, id: i32) -> Result<Option<Skill>, StoreError> {
        let tables = self.tables()?;
        Ok(tables.skills.iter().find(|s| s.id == id).cloned())
    }

    async fn list_skills(&self, page: Page) -> Result<Vec<Skill>, StoreError> {
        let tables = self.tables()?;
        Ok(page.slice(tables.skills.iter().cloned()))
    }

    async fn developer_skills(&self, developer_id: i32) -> Result<Vec<Skill>, StoreError> {
        let tables = self.tables()?;
        Ok(tables
            .skills
            .iter()
            .filter(|s| tables.developer_skills.contains(&(developer_id, s.id)))
            .cloned()
            .collect())
    }

    async fn add_developer_skill(&self, developer_id: i32, skill_id: i32) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        require(tables.has_developer(developer_id), "developer", developer_id)?;
        let found = tables.skills.iter().any(|s| s.id == skill_id);
        require(found, "skill", skill_id)?;
        if tables.developer_skills.contains(&(developer_id, skill_id)) {
            return Err(StoreError::Conflict("Skill already added".into()));
        }
        tables.developer_skills.push((developer_id, skill_id));
        Ok(())
    }

    async fn create_achievement(
        &self,
        title: &str,
        description: &str,
    ) -> Result<AchievementTemplate, StoreError> {
        let mut tables = self.tables()?;
        if tables.achievements.iter().any(|a| a.title == title) {
            return Err(StoreError::Conflict(format!(
                "Achievement '{}' already exists",
                title
            )));
        }
        let achievement = AchievementTemplate {
            id: tables.achievement_ids.next(),
            title: title.to_string(),
            description: description.to_string(),
        };
        tables.achievements.push(achievement.clone());
        Ok(achievement)
    }

    async fn find_achievement_by_title(
        &self,
        title: &str,
    ) -> Result<Option<AchievementTemplate>, StoreError> {
        let tables = self.tables()?;
        Ok(tables.achievements.iter().find(|a| a.title == title).cloned())
    }

    async fn list_achievements(&self) -> Result<Vec<AchievementTemplate>, StoreError> {
        let tables = self.tables()?;
        Ok(tables.achievements.clone())
    }

    async fn has_achievement(
        &self,
        developer_id: i32,
        achievement_id: i32,
    ) -> Result<bool, StoreError> {
        let tables = self.tables()?;
        Ok(tables
            .awards
            .iter()
            .any(|(dev, ach, _)| *dev == developer_id && *ach == achievement_id))
    }

    async fn award_achievement(
        &self,
        developer_id: i32,
        achievement_id: i32,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        require(tables.has_developer(developer_id), "developer", developer_id)?;
        let found = tables.achievements.iter().any(|a| a.id == achievement_id);
        require(found, "achievement", achievement_id)?;
        if tables
            .awards
            .iter()
            .any(|(dev, ach, _)| *dev == developer_id && *ach == achievement_id)
        {
            return Err(StoreError::Conflict("Achievement already awarded".into()));
        }
        tables.awards.push((developer_id, achievement_id, Utc::now()));
        Ok(())
    }

    async fn developer_achievements(
        &self,
        developer_id: i32,
    ) -> Result<Vec<DeveloperAchievement>, StoreError> {
        let tables = self.tables()?;
        Ok(tables
            .awards
            .iter()
            .filter(|(dev, _, _)| *dev == developer_id)
            .filter_map(|(_, achievement_id, awarded_at)| {
                tables
                    .achievements
                    .iter()
                    .find(|a| a.id == *achievement_id)
                    .map(|a| DeveloperAchievement {
                        achievement_id: a.id,
                        title: a.title.clone(),
                        description: a.description.clone(),
                        awarded_at: *awarded_at,
                    })
            })
            .collect())
    }
}
