//! Routes of the `/employer` group.
//!
//! Every `/tasks/{id}` route resolves the task through [`owned_task`]: a missing
//! task is `404`, a task created by another employer is `403`.

use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use validator::Validate;

use crate::auth::CurrentEmployer;
use crate::db::{AccountLookup, Store, StoreError};
use crate::error::AppError;
use crate::models::{
    AssignmentInput, EmployerProfile, EmployerUpdate, PageQuery, Task, TaskFilter, TaskInput,
    TaskUpdate,
};
use crate::routes::accounts;
use crate::services::achievements::check_and_award;

pub fn config(cfg: &mut web::ServiceConfig) {
    accounts::config::<EmployerProfile>(cfg);
    cfg.service(create_task)
        .service(list_tasks)
        .service(get_task)
        .service(update_task)
        .service(delete_task)
        .service(task_reactions)
        .service(assign_developer)
        .service(get_profile)
        .service(update_profile);
}

async fn owned_task(
    store: &dyn Store,
    task_id: i32,
    employer: &CurrentEmployer,
) -> Result<Task, AppError> {
    let task = store
        .find_task(task_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Task {} not found", task_id)))?;
    if task.employer_id != employer.id {
        log::debug!(
            "Employer {} denied access to task {} of employer {}",
            employer.id,
            task.id,
            task.employer_id
        );
        return Err(AppError::Forbidden(
            "You do not have access to this task".into(),
        ));
    }
    Ok(task)
}

/// Runs the achievement rules for every developer assigned to `task_id`.
/// Failures are logged and never fail the request.
async fn award_assigned(store: &dyn Store, task_id: i32) {
    let developers = match store.assigned_developers(task_id).await {
        Ok(developers) => developers,
        Err(e) => {
            log::warn!("Could not load developers of task {}: {}", task_id, e);
            return;
        }
    };
    for developer in developers {
        if let Err(e) = check_and_award(store, developer.id).await {
            log::warn!("Achievement check failed for developer {}: {}", developer.id, e);
        }
    }
}

/// Creates a task owned by the caller.
///
/// ## Responses:
/// - `201 Created`: the new task.
/// - `422 Unprocessable Entity`: empty or oversized title, oversized description.
#[post("/tasks/")]
pub async fn create_task(
    store: web::Data<dyn Store>,
    body: web::Json<TaskInput>,
    employer: CurrentEmployer,
) -> Result<impl Responder, AppError> {
    body.validate()?;
    let task = store.create_task(employer.id, &body).await?;
    Ok(HttpResponse::Created().json(task))
}

/// The caller's own tasks, paginated with `skip`, `limit` and `all`.
#[get("/tasks/")]
pub async fn list_tasks(
    store: web::Data<dyn Store>,
    query: web::Query<PageQuery>,
    employer: CurrentEmployer,
) -> Result<impl Responder, AppError> {
    query.validate()?;
    let tasks = store
        .list_tasks(TaskFilter::owned_by(employer.id), query.page())
        .await?;
    Ok(HttpResponse::Ok().json(tasks))
}

#[get("/tasks/{id}")]
pub async fn get_task(
    store: web::Data<dyn Store>,
    path: web::Path<i32>,
    employer: CurrentEmployer,
) -> Result<impl Responder, AppError> {
    let task = owned_task(store.get_ref(), path.into_inner(), &employer).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Partial task update. Completing the task runs the achievement rules for
/// its assigned developers.
#[put("/tasks/{id}")]
pub async fn update_task(
    store: web::Data<dyn Store>,
    path: web::Path<i32>,
    body: web::Json<TaskUpdate>,
    employer: CurrentEmployer,
) -> Result<impl Responder, AppError> {
    body.validate()?;
    let before = owned_task(store.get_ref(), path.into_inner(), &employer).await?;

    let task = store
        .update_task(before.id, &body)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Task {} not found", before.id)))?;

    if body.completes(&before) {
        award_assigned(store.get_ref(), task.id).await;
    }
    Ok(HttpResponse::Ok().json(task))
}

/// Deletes the task together with its reactions and assignments.
#[delete("/tasks/{id}")]
pub async fn delete_task(
    store: web::Data<dyn Store>,
    path: web::Path<i32>,
    employer: CurrentEmployer,
) -> Result<impl Responder, AppError> {
    let task = owned_task(store.get_ref(), path.into_inner(), &employer).await?;
    store.delete_task(task.id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Reactions developers left on one of the caller's tasks.
#[get("/tasks/{id}/reactions/")]
pub async fn task_reactions(
    store: web::Data<dyn Store>,
    path: web::Path<i32>,
    employer: CurrentEmployer,
) -> Result<impl Responder, AppError> {
    let task = owned_task(store.get_ref(), path.into_inner(), &employer).await?;
    let reactions = store.task_reactions(task.id).await?;
    Ok(HttpResponse::Ok().json(reactions))
}

/// Assigns a developer to one of the caller's tasks.
///
/// ## Responses:
/// - `201 Created`: `{"task_id": .., "developer_id": ..}`.
/// - `400 Bad Request`: the developer is already assigned.
/// - `404 Not Found`: unknown task or developer.
#[post("/tasks/{id}/assign/")]
pub async fn assign_developer(
    store: web::Data<dyn Store>,
    path: web::Path<i32>,
    body: web::Json<AssignmentInput>,
    employer: CurrentEmployer,
) -> Result<impl Responder, AppError> {
    let task = owned_task(store.get_ref(), path.into_inner(), &employer).await?;
    let developer = store
        .find_developer(AccountLookup::Id(body.developer_id))
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Developer {} not found", body.developer_id))
        })?;

    let assignment = store
        .assign_developer(task.id, developer.id)
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => AppError::Conflict(format!(
                "Developer '{}' is already assigned to this task",
                developer.username
            )),
            other => other.into(),
        })?;

    if task.completed {
        if let Err(e) = check_and_award(store.get_ref(), developer.id).await {
            log::warn!("Achievement check failed for developer {}: {}", developer.id, e);
        }
    }
    Ok(HttpResponse::Created().json(assignment))
}

#[get("/profile/")]
pub async fn get_profile(employer: CurrentEmployer) -> impl Responder {
    HttpResponse::Ok().json(employer.into_inner())
}

/// Partial profile update. Fields missing from the body are left unchanged.
#[put("/profile/")]
pub async fn update_profile(
    store: web::Data<dyn Store>,
    body: web::Json<EmployerUpdate>,
    employer: CurrentEmployer,
) -> Result<impl Responder, AppError> {
    body.validate()?;

    if let Some(email) = body.email.as_deref().filter(|email| *email != employer.email) {
        if store.find_employer(AccountLookup::Email(email)).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "Email '{}' is already registered",
                email
            )));
        }
    }

    let updated = store
        .update_employer(employer.id, &body)
        .await?
        .ok_or_else(|| AppError::NotFound("Employer not found".into()))?;
    Ok(HttpResponse::Ok().json(updated))
}
