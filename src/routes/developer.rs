//! Routes of the `/developer` group.

use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use validator::Validate;

use crate::auth::CurrentDeveloper;
use crate::db::{AccountLookup, Store, StoreError};
use crate::error::AppError;
use crate::models::{
    DeveloperProfile, DeveloperProfileView, DeveloperUpdate, PageQuery, ReactionInput,
    SkillAssignment, TaskFilter,
};
use crate::routes::accounts;
use crate::services::achievements::check_and_award;

pub fn config(cfg: &mut web::ServiceConfig) {
    accounts::config::<DeveloperProfile>(cfg);
    cfg.service(list_tasks)
        .service(assigned_tasks)
        .service(get_task)
        .service(react)
        .service(list_reactions)
        .service(delete_reaction)
        .service(get_profile)
        .service(update_profile)
        .service(list_profile_skills)
        .service(add_profile_skill)
        .service(list_skills)
        .service(list_achievements);
}

/// Lists every task, paginated with `skip`, `limit` and `all`.
#[get("/tasks/")]
pub async fn list_tasks(
    store: web::Data<dyn Store>,
    query: web::Query<PageQuery>,
    _developer: CurrentDeveloper,
) -> Result<impl Responder, AppError> {
    query.validate()?;
    let tasks = store
        .list_tasks(TaskFilter::default(), query.page())
        .await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Tasks an employer assigned the caller to.
#[get("/tasks/assigned/")]
pub async fn assigned_tasks(
    store: web::Data<dyn Store>,
    developer: CurrentDeveloper,
) -> Result<impl Responder, AppError> {
    let tasks = store.assigned_tasks(developer.id).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

#[get("/tasks/{id}")]
pub async fn get_task(
    store: web::Data<dyn Store>,
    path: web::Path<i32>,
    _developer: CurrentDeveloper,
) -> Result<impl Responder, AppError> {
    let task_id = path.into_inner();
    let task = store
        .find_task(task_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Task {} not found", task_id)))?;
    Ok(HttpResponse::Ok().json(task))
}

/// Reacts to a task. A developer can react to each task once.
///
/// ## Responses:
/// - `201 Created`: the new reaction.
/// - `400 Bad Request`: the caller already reacted to this task.
/// - `404 Not Found`: no task with this id.
#[post("/tasks/{id}/react/")]
pub async fn react(
    store: web::Data<dyn Store>,
    path: web::Path<i32>,
    body: web::Json<ReactionInput>,
    developer: CurrentDeveloper,
) -> Result<impl Responder, AppError> {
    body.validate()?;
    let task_id = path.into_inner();

    let missing_task = || AppError::NotFound(format!("Task {} not found", task_id));
    if store.find_task(task_id).await?.is_none() {
        return Err(missing_task());
    }
    let already_reacted = || AppError::Conflict("You have already reacted to this task".into());
    if store.has_reacted(task_id, developer.id).await? {
        return Err(already_reacted());
    }

    // the task may be deleted, or a duplicate inserted, after the checks above
    let reaction = store
        .create_reaction(task_id, developer.id, &body)
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => already_reacted(),
            StoreError::MissingReference(_) => missing_task(),
            other => other.into(),
        })?;

    if let Err(e) = check_and_award(store.get_ref(), developer.id).await {
        log::warn!("Achievement check failed for developer {}: {}", developer.id, e);
    }
    Ok(HttpResponse::Created().json(reaction))
}

/// The caller's own reactions.
#[get("/reactions/")]
pub async fn list_reactions(
    store: web::Data<dyn Store>,
    developer: CurrentDeveloper,
) -> Result<impl Responder, AppError> {
    let reactions = store.developer_reactions(developer.id).await?;
    Ok(HttpResponse::Ok().json(reactions))
}

/// Withdraws one of the caller's reactions.
#[delete("/reactions/{id}")]
pub async fn delete_reaction(
    store: web::Data<dyn Store>,
    path: web::Path<i32>,
    developer: CurrentDeveloper,
) -> Result<impl Responder, AppError> {
    let reaction_id = path.into_inner();
    let reaction = store
        .find_reaction(reaction_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Reaction {} not found", reaction_id)))?;
    if reaction.developer_id != developer.id {
        return Err(AppError::Forbidden(
            "You can only delete your own reactions".into(),
        ));
    }

    store.delete_reaction(reaction_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// The caller's account with skills and achievements.
#[get("/profile/")]
pub async fn get_profile(
    store: web::Data<dyn Store>,
    developer: CurrentDeveloper,
) -> Result<impl Responder, AppError> {
    let skills = store.developer_skills(developer.id).await?;
    let achievements = store.developer_achievements(developer.id).await?;
    Ok(HttpResponse::Ok().json(DeveloperProfileView {
        account: developer.into_inner(),
        skills,
        achievements,
    }))
}

/// Partial profile update. Fields missing from the body are left unchanged.
#[put("/profile/")]
pub async fn update_profile(
    store: web::Data<dyn Store>,
    body: web::Json<DeveloperUpdate>,
    developer: CurrentDeveloper,
) -> Result<impl Responder, AppError> {
    body.validate()?;

    if let Some(email) = body.email.as_deref().filter(|email| *email != developer.email) {
        if store.find_developer(AccountLookup::Email(email)).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "Email '{}' is already registered",
                email
            )));
        }
    }

    let updated = store
        .update_developer(developer.id, &body)
        .await?
        .ok_or_else(|| AppError::NotFound("Developer not found".into()))?;
    Ok(HttpResponse::Ok().json(updated))
}

#[get("/profile/skills/")]
pub async fn list_profile_skills(
    store: web::Data<dyn Store>,
    developer: CurrentDeveloper,
) -> Result<impl Responder, AppError> {
    let skills = store.developer_skills(developer.id).await?;
    Ok(HttpResponse::Ok().json(skills))
}

/// Adds a catalog skill to the caller's profile.
#[post("/profile/skills/")]
pub async fn add_profile_skill(
    store: web::Data<dyn Store>,
    body: web::Json<SkillAssignment>,
    developer: CurrentDeveloper,
) -> Result<impl Responder, AppError> {
    let skill = store
        .find_skill(body.skill_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Skill {} not found", body.skill_id)))?;

    store
        .add_developer_skill(developer.id, skill.id)
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => {
                AppError::Conflict(format!("Skill '{}' is already on your profile", skill.name))
            }
            other => other.into(),
        })?;
    Ok(HttpResponse::Created().json(skill))
}

/// The skill catalog.
#[get("/skills/")]
pub async fn list_skills(
    store: web::Data<dyn Store>,
    query: web::Query<PageQuery>,
    _developer: CurrentDeveloper,
) -> Result<impl Responder, AppError> {
    query.validate()?;
    let skills = store.list_skills(query.page()).await?;
    Ok(HttpResponse::Ok().json(skills))
}

/// Achievements the caller holds.
#[get("/achievements/")]
pub async fn list_achievements(
    store: web::Data<dyn Store>,
    developer: CurrentDeveloper,
) -> Result<impl Responder, AppError> {
    let achievements = store.developer_achievements(developer.id).await?;
    Ok(HttpResponse::Ok().json(achievements))
}
