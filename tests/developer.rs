mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use common::{bearer, create_task, error_message, get, init_app, register, send_json};

#[actix_rt::test]
async fn test_profile_partial_update() {
    let app = init_app().await;
    let req = test::TestRequest::post()
        .uri("/developer/register/")
        .set_json(json!({
            "username": "ada",
            "email": "ada@example.com",
            "password": common::PASSWORD,
            "first_name": "Ada",
            "last_name": "Lovelace",
            "birth_date": "1815-12-10",
            "city": "London",
            "phone": "+44 20 0000 0000"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let token: Value = test::read_body_json(resp).await;
    let token = token["access_token"].as_str().unwrap().to_string();

    let resp = get(&app, "/developer/profile/", &token).await;
    let before: Value = test::read_body_json(resp).await;
    assert!(before.get("password_hash").is_none());

    let resp = send_json(&app, "PUT", "/developer/profile/", &token, json!({ "city": "Paris" })).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = get(&app, "/developer/profile/", &token).await;
    let after: Value = test::read_body_json(resp).await;
    assert_eq!(after["city"], "Paris");

    let mut expected = before.clone();
    expected["city"] = json!("Paris");
    assert_eq!(after, expected);
}

#[actix_rt::test]
async fn test_profile_email_must_stay_unique() {
    let app = init_app().await;
    register(&app, "developer", "first_dev").await;
    let token = register(&app, "developer", "second_dev").await;

    let resp = send_json(
        &app,
        "PUT",
        "/developer/profile/",
        &token,
        json!({ "email": "first_dev@example.com" }),
    )
    .await;
    error_message(resp, StatusCode::BAD_REQUEST).await;

    // keeping your own address is not a conflict
    let resp = send_json(
        &app,
        "PUT",
        "/developer/profile/",
        &token,
        json!({ "email": "second_dev@example.com", "phone": "555" }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send_json(&app, "PUT", "/developer/profile/", &token, json!({ "email": "nope" })).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_rt::test]
async fn test_skills() {
    let app = init_app().await;
    let token = register(&app, "developer", "skilled").await;

    let resp = get(&app, "/developer/skills/?all=true", &token).await;
    let catalog: Vec<Value> = test::read_body_json(resp).await;
    assert!(!catalog.is_empty());
    let rust = catalog
        .iter()
        .find(|s| s["name"] == "Rust")
        .expect("Rust is in the default catalog")
        .clone();

    let uri = "/developer/profile/skills/";
    let resp = send_json(&app, "POST", uri, &token, json!({ "skill_id": rust["id"] })).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = send_json(&app, "POST", uri, &token, json!({ "skill_id": rust["id"] })).await;
    error_message(resp, StatusCode::BAD_REQUEST).await;

    let resp = send_json(&app, "POST", uri, &token, json!({ "skill_id": 9999 })).await;
    error_message(resp, StatusCode::NOT_FOUND).await;

    let resp = get(&app, uri, &token).await;
    let skills: Vec<Value> = test::read_body_json(resp).await;
    assert_eq!(skills, vec![rust.clone()]);

    let resp = get(&app, "/developer/profile/", &token).await;
    let profile: Value = test::read_body_json(resp).await;
    assert_eq!(profile["skills"], json!([rust]));
}

#[actix_rt::test]
async fn test_first_reaction_achievement() {
    let app = init_app().await;
    let employer = register(&app, "employer", "award_co").await;
    let developer = register(&app, "developer", "achiever").await;

    let resp = get(&app, "/developer/achievements/", &developer).await;
    let achievements: Vec<Value> = test::read_body_json(resp).await;
    assert!(achievements.is_empty());

    for title in ["One", "Two"] {
        let id = create_task(&app, &employer, title).await["id"].as_i64().unwrap();
        let resp = send_json(
            &app,
            "POST",
            &format!("/developer/tasks/{}/react/", id),
            &developer,
            json!({ "title": "Me" }),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let resp = get(&app, "/developer/profile/", &developer).await;
    let profile: Value = test::read_body_json(resp).await;
    let achievements = profile["achievements"].as_array().unwrap();
    assert_eq!(achievements.len(), 1);
    assert_eq!(achievements[0]["title"], "First Reaction");
}

#[actix_rt::test]
async fn test_completing_assigned_task_awards_winner() {
    let app = init_app().await;
    let employer = register(&app, "employer", "hackathon_co").await;
    let developer = register(&app, "developer", "winner").await;
    let id = create_task(&app, &employer, "Hackathon").await["id"]
        .as_i64()
        .unwrap();

    let resp = get(&app, "/developer/profile/", &developer).await;
    let profile: Value = test::read_body_json(resp).await;
    send_json(
        &app,
        "POST",
        &format!("/employer/tasks/{}/assign/", id),
        &employer,
        json!({ "developer_id": profile["id"] }),
    )
    .await;
    send_json(
        &app,
        "PUT",
        &format!("/employer/tasks/{}", id),
        &employer,
        json!({ "completed": true }),
    )
    .await;

    let resp = get(&app, "/developer/achievements/", &developer).await;
    let achievements: Vec<Value> = test::read_body_json(resp).await;
    let titles: Vec<&str> = achievements
        .iter()
        .map(|a| a["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Hackathon Winner"]);
}

#[actix_rt::test]
async fn test_reactions_can_only_be_deleted_by_author() {
    let app = init_app().await;
    let employer = register(&app, "employer", "react_co").await;
    let author = register(&app, "developer", "author").await;
    let other = register(&app, "developer", "other").await;
    let task_id = create_task(&app, &employer, "Contested").await["id"]
        .as_i64()
        .unwrap();

    let resp = send_json(
        &app,
        "POST",
        &format!("/developer/tasks/{}/react/", task_id),
        &author,
        json!({ "title": "Mine" }),
    )
    .await;
    let reaction: Value = test::read_body_json(resp).await;
    let uri = format!("/developer/reactions/{}", reaction["id"]);

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(bearer(&other))
        .to_request();
    let resp = test::call_service(&app, req).await;
    error_message(resp, StatusCode::FORBIDDEN).await;

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(bearer(&author))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = get(&app, "/developer/reactions/", &author).await;
    let reactions: Vec<Value> = test::read_body_json(resp).await;
    assert!(reactions.is_empty());

    let resp = get(&app, &format!("/developer/tasks/{}", task_id), &other).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_employer_profile() {
    let app = init_app().await;
    let token = register(&app, "employer", "profile_co").await;

    let resp = get(&app, "/employer/profile/", &token).await;
    let profile: Value = test::read_body_json(resp).await;
    assert_eq!(profile["company_name"], "profile_co Inc");
    assert_eq!(profile["email"], "profile_co@example.com");

    let resp = send_json(
        &app,
        "PUT",
        "/employer/profile/",
        &token,
        json!({ "company_name": "Renamed Ltd" }),
    )
    .await;
    let updated: Value = test::read_body_json(resp).await;
    assert_eq!(updated["company_name"], "Renamed Ltd");
    assert_eq!(updated["username"], "profile_co");
}
