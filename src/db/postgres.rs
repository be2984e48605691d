use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use std::time::Duration;

use super::{AccountLookup, Store, StoreError};
use crate::config::Config;
use crate::models::{
    Account, AchievementTemplate, Assignment, Developer, DeveloperAchievement, DeveloperProfile,
    DeveloperUpdate, Employer, EmployerProfile, EmployerUpdate, NewAccount, Page, Reaction,
    ReactionInput, Skill, Task, TaskFilter, TaskInput, TaskUpdate,
};

const DEVELOPER_COLUMNS: &str =
    "id, username, email, password_hash, first_name, middle_name, last_name, birth_date, city, phone";
const EMPLOYER_COLUMNS: &str = "id, username, email, password_hash, company_name";
const TASK_COLUMNS: &str =
    "id, title, description, completed, completed_at, created_at, updated_at, employer_id";
const REACTION_COLUMNS: &str = "id, title, message, task_id, developer_id, created_at";

/// Builds the connection pool. Each request borrows a connection for the duration of
/// its store calls and returns it when they finish, whatever the outcome.
pub async fn connect(config: &Config) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database_url)
        .await
}

/// Applies the SQL files under `migrations/`.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    log::info!("Running database migrations");
    match sqlx::migrate!("./migrations").run(pool).await {
        Ok(()) => {
            log::info!("Database schema is up to date");
            Ok(())
        }
        Err(e) => {
            log::error!("Migration failed: {}", e);
            Err(e)
        }
    }
}

/// Uniqueness violations become `Conflict`, foreign key violations become
/// `MissingReference`; anything else is logged and hidden behind `Backend`.
/// Dropping an uncommitted transaction rolls it back.
fn failure(operation: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |error| match error.as_database_error() {
        Some(db) if db.is_unique_violation() => {
            StoreError::Conflict(format!("{}: record already exists", operation))
        }
        Some(db) if db.is_foreign_key_violation() => {
            log::debug!("{} referenced a missing row: {}", operation, db);
            StoreError::MissingReference(format!(
                "{}: referenced record does not exist",
                operation
            ))
        }
        _ => {
            log::error!("{} failed: {}", operation, error);
            StoreError::Backend(format!("{} failed", operation))
        }
    }
}

fn prefixed(columns: &str, alias: &str) -> String {
    columns
        .split(", ")
        .map(|column| format!("{}.{}", alias, column))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(FromRow)]
struct DeveloperRow {
    id: i32,
    username: String,
    email: String,
    password_hash: String,
    first_name: Option<String>,
    middle_name: Option<String>,
    last_name: Option<String>,
    birth_date: Option<NaiveDate>,
    city: Option<String>,
    phone: Option<String>,
}

impl From<DeveloperRow> for Developer {
    fn from(row: DeveloperRow) -> Self {
        Account {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            profile: DeveloperProfile {
                first_name: row.first_name,
                middle_name: row.middle_name,
                last_name: row.last_name,
                birth_date: row.birth_date,
                city: row.city,
                phone: row.phone,
            },
        }
    }
}

#[derive(FromRow)]
struct EmployerRow {
    id: i32,
    username: String,
    email: String,
    password_hash: String,
    company_name: Option<String>,
}

impl From<EmployerRow> for Employer {
    fn from(row: EmployerRow) -> Self {
        Account {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            profile: EmployerProfile {
                company_name: row.company_name,
            },
        }
    }
}

/// `Store` backed by PostgreSQL.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_developer(&self, key: AccountLookup<'_>) -> Result<Option<Developer>, StoreError> {
        let sql = format!(
            "SELECT {} FROM developers WHERE {} = $1",
            DEVELOPER_COLUMNS,
            key.column()
        );
        let query = sqlx::query_as::<_, DeveloperRow>(&sql);
        let query = match key {
            AccountLookup::Id(id) => query.bind(id),
            AccountLookup::Username(value) | AccountLookup::Email(value) => query.bind(value),
        };
        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(failure("find developer"))?;
        Ok(row.map(Developer::from))
    }

    async fn create_developer(
        &self,
        account: NewAccount<DeveloperProfile>,
    ) -> Result<Developer, StoreError> {
        let sql = format!(
            "INSERT INTO developers \
             (username, email, password_hash, first_name, middle_name, last_name, birth_date, city, phone) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
            DEVELOPER_COLUMNS
        );
        let profile = account.profile;
        let row = sqlx::query_as::<_, DeveloperRow>(&sql)
            .bind(account.username)
            .bind(account.email)
            .bind(account.password_hash)
            .bind(profile.first_name)
            .bind(profile.middle_name)
            .bind(profile.last_name)
            .bind(profile.birth_date)
            .bind(profile.city)
            .bind(profile.phone)
            .fetch_one(&self.pool)
            .await
            .map_err(failure("create developer"))?;
        Ok(row.into())
    }

    async fn update_developer(
        &self,
        id: i32,
        update: &DeveloperUpdate,
    ) -> Result<Option<Developer>, StoreError> {
        let sql = format!(
            "UPDATE developers SET \
             email = COALESCE($2, email), \
             first_name = COALESCE($3, first_name), \
             middle_name = COALESCE($4, middle_name), \
             last_name = COALESCE($5, last_name), \
             birth_date = COALESCE($6, birth_date), \
             city = COALESCE($7, city), \
             phone = COALESCE($8, phone) \
             WHERE id = $1 RETURNING {}",
            DEVELOPER_COLUMNS
        );
        let row = sqlx::query_as::<_, DeveloperRow>(&sql)
            .bind(id)
            .bind(&update.email)
            .bind(&update.first_name)
            .bind(&update.middle_name)
            .bind(&update.last_name)
            .bind(update.birth_date)
            .bind(&update.city)
            .bind(&update.phone)
            .fetch_optional(&self.pool)
            .await
            .map_err(failure("update developer"))?;
        Ok(row.map(Developer::from))
    }

    async fn find_employer(&self, key: AccountLookup<'_>) -> Result<Option<Employer>, StoreError> {
        let sql = format!(
            "SELECT {} FROM employers WHERE {} = $1",
            EMPLOYER_COLUMNS,
            key.column()
        );
        let query = sqlx::query_as::<_, EmployerRow>(&sql);
        let query = match key {
            AccountLookup::Id(id) => query.bind(id),
            AccountLookup::Username(value) | AccountLookup::Email(value) => query.bind(value),
        };
        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(failure("find employer"))?;
        Ok(row.map(Employer::from))
    }

    async fn create_employer(
        &self,
        account: NewAccount<EmployerProfile>,
    ) -> Result<Employer, StoreError> {
        let sql = format!(
            "INSERT INTO employers (username, email, password_hash, company_name) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            EMPLOYER_COLUMNS
        );
        let row = sqlx::query_as::<_, EmployerRow>(&sql)
            .bind(account.username)
            .bind(account.email)
            .bind(account.password_hash)
            .bind(account.profile.company_name)
            .fetch_one(&self.pool)
            .await
            .map_err(failure("create employer"))?;
        Ok(row.into())
    }

    async fn update_employer(
        &self,
        id: i32,
        update: &EmployerUpdate,
    ) -> Result<Option<Employer>, StoreError> {
        let sql = format!(
            "UPDATE employers SET \
             email = COALESCE($2, email), \
             company_name = COALESCE($3, company_name) \
             WHERE id = $1 RETURNING {}",
            EMPLOYER_COLUMNS
        );
        let row = sqlx::query_as::<_, EmployerRow>(&sql)
            .bind(id)
            .bind(&update.email)
            .bind(&update.company_name)
            .fetch_optional(&self.pool)
            .await
            .map_err(failure("update employer"))?;
        Ok(row.map(Employer::from))
    }

    async fn create_task(&self, employer_id: i32, input: &TaskInput) -> Result<Task, StoreError> {
        let sql = format!(
            "INSERT INTO tasks (title, description, employer_id) VALUES ($1, $2, $3) RETURNING {}",
            TASK_COLUMNS
        );
        sqlx::query_as::<_, Task>(&sql)
            .bind(&input.title)
            .bind(&input.description)
            .bind(employer_id)
            .fetch_one(&self.pool)
            .await
            .map_err(failure("create task"))
    }

    async fn find_task(&self, id: i32) -> Result<Option<Task>, StoreError> {
        let sql = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);
        sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(failure("find task"))
    }

    async fn list_tasks(&self, filter: TaskFilter, page: Page) -> Result<Vec<Task>, StoreError> {
        // LIMIT NULL is unbounded
        let sql = format!(
            "SELECT {} FROM tasks \
             WHERE ($1::INT4 IS NULL OR employer_id = $1) \
             ORDER BY id OFFSET $2 LIMIT $3",
            TASK_COLUMNS
        );
        sqlx::query_as::<_, Task>(&sql)
            .bind(filter.employer_id)
            .bind(page.skip)
            .bind(page.limit)
            .fetch_all(&self.pool)
            .await
            .map_err(failure("list tasks"))
    }

    async fn update_task(&self, id: i32, update: &TaskUpdate) -> Result<Option<Task>, StoreError> {
        let sql = format!(
            "UPDATE tasks SET \
             title = COALESCE($2, title), \
             description = COALESCE($3, description), \
             completed = COALESCE($4, completed), \
             completed_at = CASE \
                 WHEN $4 IS NULL THEN completed_at \
                 WHEN $4 THEN COALESCE(completed_at, NOW()) \
                 ELSE NULL END, \
             updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            TASK_COLUMNS
        );
        sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(&update.title)
            .bind(&update.description)
            .bind(update.completed)
            .fetch_optional(&self.pool)
            .await
            .map_err(failure("update task"))
    }

    async fn delete_task(&self, id: i32) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(failure("delete task"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn assign_developer(
        &self,
        task_id: i32,
        developer_id: i32,
    ) -> Result<Assignment, StoreError> {
        sqlx::query("INSERT INTO task_assignments (task_id, developer_id) VALUES ($1, $2)")
            .bind(task_id)
            .bind(developer_id)
            .execute(&self.pool)
            .await
            .map_err(failure("assign developer"))?;
        Ok(Assignment {
            task_id,
            developer_id,
        })
    }

    async fn assigned_tasks(&self, developer_id: i32) -> Result<Vec<Task>, StoreError> {
        let sql = format!(
            "SELECT {} FROM tasks t \
             JOIN task_assignments a ON a.task_id = t.id \
             WHERE a.developer_id = $1 ORDER BY t.id",
            prefixed(TASK_COLUMNS, "t")
        );
        sqlx::query_as::<_, Task>(&sql)
            .bind(developer_id)
            .fetch_all(&self.pool)
            .await
            .map_err(failure("list assigned tasks"))
    }

    async fn assigned_developers(&self, task_id: i32) -> Result<Vec<Developer>, StoreError> {
        let sql = format!(
            "SELECT {} FROM developers d \
             JOIN task_assignments a ON a.developer_id = d.id \
             WHERE a.task_id = $1 ORDER BY d.id",
            prefixed(DEVELOPER_COLUMNS, "d")
        );
        let rows = sqlx::query_as::<_, DeveloperRow>(&sql)
            .bind(task_id)
            .fetch_all(&self.pool)
            .await
            .map_err(failure("list assigned developers"))?;
        Ok(rows.into_iter().map(Developer::from).collect())
    }

    async fn has_reacted(&self, task_id: i32, developer_id: i32) -> Result<bool, StoreError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM reactions WHERE task_id = $1 AND developer_id = $2)",
        )
        .bind(task_id)
        .bind(developer_id)
        .fetch_one(&self.pool)
        .await
        .map_err(failure("check reaction"))
    }

    async fn create_reaction(
        &self,
        task_id: i32,
        developer_id: i32,
        input: &ReactionInput,
    ) -> Result<Reaction, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(failure("create reaction"))?;

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM reactions WHERE task_id = $1 AND developer_id = $2)",
        )
        .bind(task_id)
        .bind(developer_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(failure("create reaction"))?;
        if exists {
            return Err(StoreError::Conflict("Already reacted to this task".into()));
        }

        // reactions_task_developer_key catches the concurrent case the check above misses
        let sql = format!(
            "INSERT INTO reactions (title, message, task_id, developer_id) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            REACTION_COLUMNS
        );
        let reaction = sqlx::query_as::<_, Reaction>(&sql)
            .bind(&input.title)
            .bind(&input.message)
            .bind(task_id)
            .bind(developer_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(failure("create reaction"))?;

        tx.commit().await.map_err(failure("create reaction"))?;
        Ok(reaction)
    }

    async fn find_reaction(&self, id: i32) -> Result<Option<Reaction>, StoreError> {
        let sql = format!("SELECT {} FROM reactions WHERE id = $1", REACTION_COLUMNS);
        sqlx::query_as::<_, Reaction>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(failure("find reaction"))
    }

    async fn task_reactions(&self, task_id: i32) -> Result<Vec<Reaction>, StoreError> {
        let sql = format!(
            "SELECT {} FROM reactions WHERE task_id = $1 ORDER BY id",
            REACTION_COLUMNS
        );
        sqlx::query_as::<_, Reaction>(&sql)
            .bind(task_id)
            .fetch_all(&self.pool)
            .await
            .map_err(failure("list task reactions"))
    }

    async fn developer_reactions(&self, developer_id: i32) -> Result<Vec<Reaction>, StoreError> {
        let sql = format!(
            "SELECT {} FROM reactions WHERE developer_id = $1 ORDER BY id",
            REACTION_COLUMNS
        );
        sqlx::query_as::<_, Reaction>(&sql)
            .bind(developer_id)
            .fetch_all(&self.pool)
            .await
            .map_err(failure("list developer reactions"))
    }

    async fn delete_reaction(&self, id: i32) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM reactions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(failure("delete reaction"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_skill(&self, name: &str) -> Result<Skill, StoreError> {
        sqlx::query_as::<_, Skill>("INSERT INTO skills (name) VALUES ($1) RETURNING id, name")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(failure("create skill"))
    }

    async fn find_skill(&self, id: i32) -> Result<Option<Skill>, StoreError> {
        sqlx::query_as::<_, Skill>("SELECT id, name FROM skills WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(failure("find skill"))
    }

    async fn list_skills(&self, page: Page) -> Result<Vec<Skill>, StoreError> {
        sqlx::query_as::<_, Skill>("SELECT id, name FROM skills ORDER BY id OFFSET $1 LIMIT $2")
            .bind(page.skip)
            .bind(page.limit)
            .fetch_all(&self.pool)
            .await
            .map_err(failure("list skills"))
    }

    async fn developer_skills(&self, developer_id: i32) -> Result<Vec<Skill>, StoreError> {
        sqlx::query_as::<_, Skill>(
            "SELECT s.id, s.name FROM skills s \
             JOIN developer_skills ds ON ds.skill_id = s.id \
             WHERE ds.developer_id = $1 ORDER BY s.id",
        )
        .bind(developer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(failure("list developer skills"))
    }

    async fn add_developer_skill(&self, developer_id: i32, skill_id: i32) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO developer_skills (developer_id, skill_id) VALUES ($1, $2)")
            .bind(developer_id)
            .bind(skill_id)
            .execute(&self.pool)
            .await
            .map_err(failure("add developer skill"))?;
        Ok(())
    }

    async fn create_achievement(
        &self,
        title: &str,
        description: &str,
    ) -> Result<AchievementTemplate, StoreError> {
        sqlx::query_as::<_, AchievementTemplate>(
            "INSERT INTO achievements (title, description) VALUES ($1, $2) \
             RETURNING id, title, description",
        )
        .bind(title)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .map_err(failure("create achievement"))
    }

    async fn find_achievement_by_title(
        &self,
        title: &str,
    ) -> Result<Option<AchievementTemplate>, StoreError> {
        sqlx::query_as::<_, AchievementTemplate>(
            "SELECT id, title, description FROM achievements WHERE title = $1",
        )
        .bind(title)
        .fetch_optional(&self.pool)
        .await
        .map_err(failure("find achievement"))
    }

    async fn list_achievements(&self) -> Result<Vec<AchievementTemplate>, StoreError> {
        sqlx::query_as::<_, AchievementTemplate>(
            "SELECT id, title, description FROM achievements ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(failure("list achievements"))
    }

    async fn has_achievement(
        &self,
        developer_id: i32,
        achievement_id: i32,
    ) -> Result<bool, StoreError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM developer_achievements \
             WHERE developer_id = $1 AND achievement_id = $2)",
        )
        .bind(developer_id)
        .bind(achievement_id)
        .fetch_one(&self.pool)
        .await
        .map_err(failure("check achievement"))
    }

    async fn award_achievement(
        &self,
        developer_id: i32,
        achievement_id: i32,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO developer_achievements (developer_id, achievement_id) VALUES ($1, $2)",
        )
        .bind(developer_id)
        .bind(achievement_id)
        .execute(&self.pool)
        .await
        .map_err(failure("award achievement"))?;
        Ok(())
    }

    async fn developer_achievements(
        &self,
        developer_id: i32,
    ) -> Result<Vec<DeveloperAchievement>, StoreError> {
        sqlx::query_as::<_, DeveloperAchievement>(
            "SELECT a.id AS achievement_id, a.title, a.description, da.awarded_at \
             FROM developer_achievements da \
             JOIN achievements a ON a.id = da.achievement_id \
             WHERE da.developer_id = $1 ORDER BY da.awarded_at, a.id",
        )
        .bind(developer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(failure("list developer achievements"))
    }
}
