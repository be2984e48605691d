#![allow(dead_code)]

use actix_http::Request;
use async_trait::async_trait;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use chrono::Duration;
use jsonwebtoken::Algorithm;
use serde_json::{json, Value};
use std::sync::Arc;

use devboard::auth::{AuthSettings, TokenKeys};
use devboard::db::{AccountLookup, MemoryStore, Store, StoreError};
use devboard::models::{
    AchievementTemplate, Assignment, Developer, DeveloperAchievement, DeveloperProfile,
    DeveloperUpdate, Employer, EmployerProfile, EmployerUpdate, NewAccount, Page, Reaction,
    ReactionInput, Skill, Task, TaskFilter, TaskInput, TaskUpdate,
};
use devboard::routes;
use devboard::services::catalog::seed_defaults;

pub const TEST_SECRET: &str = "integration_test_secret";
pub const PASSWORD: &str = "password123";

pub fn test_settings() -> AuthSettings {
    AuthSettings {
        tokens: TokenKeys::new(TEST_SECRET, Algorithm::HS256, Duration::minutes(30)),
        // cheapest cost bcrypt accepts
        bcrypt_cost: 4,
    }
}

/// A seeded in-memory store, shared between the app and the test body.
pub async fn test_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    seed_defaults(store.as_ref())
        .await
        .expect("Failed to seed memory store");
    store
}

pub async fn init_app() -> impl Service<Request, Response = ServiceResponse, Error = actix_web::Error>
{
    init_app_with(test_store().await).await
}

pub async fn init_app_with<T: Store + 'static>(
    store: Arc<T>,
) -> impl Service<Request, Response = ServiceResponse, Error = actix_web::Error> {
    let store: Arc<dyn Store> = store;
    test::init_service(
        App::new()
            .app_data(web::Data::from(store))
            .app_data(web::Data::new(test_settings()))
            .configure(routes::config),
    )
    .await
}

/// What another request does between a handler's checks and its reaction insert.
#[derive(Debug, Clone, Copy)]
pub enum Interleaved {
    /// The same developer reacts to the same task.
    SameReaction,
    /// The employer deletes the task.
    TaskDeleted,
}

/// A `MemoryStore` that runs one [`Interleaved`] write right before every
/// `create_reaction`, as a concurrent request would.
pub struct InterleavedStore {
    pub inner: Arc<MemoryStore>,
    pub before_reaction: Interleaved,
}

#[async_trait]
impl Store for InterleavedStore {
    async fn find_developer(&self, key: AccountLookup<'_>) -> Result<Option<Developer>, StoreError> {
        self.inner.find_developer(key).await
    }
    async fn create_developer(
        &self,
        account: NewAccount<DeveloperProfile>,
    ) -> Result<Developer, StoreError> {
        self.inner.create_developer(account).await
    }
    async fn update_developer(
        &self,
        id: i32,
        update: &DeveloperUpdate,
    ) -> Result<Option<Developer>, StoreError> {
        self.inner.update_developer(id, update).await
    }
    async fn find_employer(&self, key: AccountLookup<'_>) -> Result<Option<Employer>, StoreError> {
        self.inner.find_employer(key).await
    }
    async fn create_employer(
        &self,
        account: NewAccount<EmployerProfile>,
    ) -> Result<Employer, StoreError> {
        self.inner.create_employer(account).await
    }
    async fn update_employer(
        &self,
        id: i32,
        update: &EmployerUpdate,
    ) -> Result<Option<Employer>, StoreError> {
        self.inner.update_employer(id, update).await
    }

    async fn create_task(&self, employer_id: i32, input: &TaskInput) -> Result<Task, StoreError> {
        self.inner.create_task(employer_id, input).await
    }
    async fn find_task(&self, id: i32) -> Result<Option<Task>, StoreError> {
        self.inner.find_task(id).await
    }
    async fn list_tasks(&self, filter: TaskFilter, page: Page) -> Result<Vec<Task>, StoreError> {
        self.inner.list_tasks(filter, page).await
    }
    async fn update_task(&self, id: i32, update: &TaskUpdate) -> Result<Option<Task>, StoreError> {
        self.inner.update_task(id, update).await
    }
    async fn delete_task(&self, id: i32) -> Result<bool, StoreError> {
        self.inner.delete_task(id).await
    }
    async fn assign_developer(
        &self,
        task_id: i32,
        developer_id: i32,
    ) -> Result<Assignment, StoreError> {
        self.inner.assign_developer(task_id, developer_id).await
    }
    async fn assigned_tasks(&self, developer_id: i32) -> Result<Vec<Task>, StoreError> {
        self.inner.assigned_tasks(developer_id).await
    }
    async fn assigned_developers(&self, task_id: i32) -> Result<Vec<Developer>, StoreError> {
        self.inner.assigned_developers(task_id).await
    }

    async fn has_reacted(&self, task_id: i32, developer_id: i32) -> Result<bool, StoreError> {
        self.inner.has_reacted(task_id, developer_id).await
    }
    async fn create_reaction(
        &self,
        task_id: i32,
        developer_id: i32,
        input: &ReactionInput,
    ) -> Result<Reaction, StoreError> {
        match self.before_reaction {
            Interleaved::SameReaction => {
                self.inner
                    .create_reaction(task_id, developer_id, input)
                    .await?;
            }
            Interleaved::TaskDeleted => {
                self.inner.delete_task(task_id).await?;
            }
        }
        self.inner.create_reaction(task_id, developer_id, input).await
    }
    async fn find_reaction(&self, id: i32) -> Result<Option<Reaction>, StoreError> {
        self.inner.find_reaction(id).await
    }
    async fn task_reactions(&self, task_id: i32) -> Result<Vec<Reaction>, StoreError> {
        self.inner.task_reactions(task_id).await
    }
    async fn developer_reactions(&self, developer_id: i32) -> Result<Vec<Reaction>, StoreError> {
        self.inner.developer_reactions(developer_id).await
    }
    async fn delete_reaction(&self, id: i32) -> Result<bool, StoreError> {
        self.inner.delete_reaction(id).await
    }

    async fn create_skill(&self, name: &str) -> Result<Skill, StoreError> {
        self.inner.create_skill(name).await
    }
    async fn find_skill(&self, id: i32) -> Result<Option<Skill>, StoreError> {
        self.inner.find_skill(id).await
    }
    async fn list_skills(&self, page: Page) -> Result<Vec<Skill>, StoreError> {
        self.inner.list_skills(page).await
    }
    async fn developer_skills(&self, developer_id: i32) -> Result<Vec<Skill>, StoreError> {
        self.inner.developer_skills(developer_id).await
    }
    async fn add_developer_skill(&self, developer_id: i32, skill_id: i32) -> Result<(), StoreError> {
        self.inner.add_developer_skill(developer_id, skill_id).await
    }

    async fn create_achievement(
        &self,
        title: &str,
        description: &str,
    ) -> Result<AchievementTemplate, StoreError> {
        self.inner.create_achievement(title, description).await
    }
    async fn find_achievement_by_title(
        &self,
        title: &str,
    ) -> Result<Option<AchievementTemplate>, StoreError> {
        self.inner.find_achievement_by_title(title).await
    }
    async fn list_achievements(&self) -> Result<Vec<AchievementTemplate>, StoreError> {
        self.inner.list_achievements().await
    }
    async fn has_achievement(
        &self,
        developer_id: i32,
        achievement_id: i32,
    ) -> Result<bool, StoreError> {
        self.inner.has_achievement(developer_id, achievement_id).await
    }
    async fn award_achievement(
        &self,
        developer_id: i32,
        achievement_id: i32,
    ) -> Result<(), StoreError> {
        self.inner.award_achievement(developer_id, achievement_id).await
    }
    async fn developer_achievements(
        &self,
        developer_id: i32,
    ) -> Result<Vec<DeveloperAchievement>, StoreError> {
        self.inner.developer_achievements(developer_id).await
    }
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

/// Registers an account of `kind` ("developer" or "employer") and returns its token.
pub async fn register<S>(app: &S, kind: &str, username: &str) -> String
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let mut body = json!({
        "username": username,
        "email": format!("{}@example.com", username),
        "password": PASSWORD,
    });
    if kind == "employer" {
        body["company_name"] = json!(format!("{} Inc", username));
    }

    let req = test::TestRequest::post()
        .uri(&format!("/{}/register/", kind))
        .set_json(&body)
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED, "registering {}", username);

    let json: Value = test::read_body_json(resp).await;
    json["access_token"]
        .as_str()
        .expect("access_token missing")
        .to_string()
}

pub async fn login<S>(app: &S, kind: &str, username: &str, password: &str) -> ServiceResponse
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::post()
        .uri(&format!("/{}/token", kind))
        .set_form([
            ("grant_type", "password"),
            ("username", username),
            ("password", password),
        ])
        .to_request();
    test::call_service(app, req).await
}

pub async fn create_task<S>(app: &S, token: &str, title: &str) -> Value
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::post()
        .uri("/employer/tasks/")
        .insert_header(bearer(token))
        .set_json(json!({ "title": title, "description": format!("About {}", title) }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED, "creating task {}", title);
    test::read_body_json(resp).await
}

pub async fn get<S>(app: &S, uri: &str, token: &str) -> ServiceResponse
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::get()
        .uri(uri)
        .insert_header(bearer(token))
        .to_request();
    test::call_service(app, req).await
}

pub async fn send_json<S>(
    app: &S,
    method: &str,
    uri: &str,
    token: &str,
    body: Value,
) -> ServiceResponse
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = match method {
        "PUT" => test::TestRequest::put(),
        _ => test::TestRequest::post(),
    };
    let req = req
        .uri(uri)
        .insert_header(bearer(token))
        .set_json(body)
        .to_request();
    test::call_service(app, req).await
}

/// Reads an error body and checks its shape.
pub async fn error_message(resp: ServiceResponse, status: StatusCode) -> String {
    assert_eq!(resp.status(), status);
    let json: Value = test::read_body_json(resp).await;
    assert_eq!(json["status"], status.as_u16());
    json["error"].as_str().unwrap_or_default().to_string()
}
