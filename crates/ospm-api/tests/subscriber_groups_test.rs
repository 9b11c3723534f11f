//! Subscriber group endpoint integration tests.

mod helpers;

use helpers::{api_path, create_organization, setup_test_app};
use serde_json::{json, Value};

async fn create_group(client: &axum_test::TestServer, organization_id: &str, body: Value) -> String {
    let response = client
        .post(&api_path(&format!(
            "/organizations/{}/subscriber-groups",
            organization_id
        )))
        .json(&body)
        .await;
    assert_eq!(response.status_code(), 201, "create subscriber group");
    let created: Value = response.json();
    created["id"].as_str().expect("id in response").to_string()
}

#[tokio::test]
async fn test_create_list_get_update_delete_group() {
    let app = setup_test_app();
    let client = app.client();
    let organization_id = create_organization(client, "acme").await;

    let group_id = create_group(
        client,
        &organization_id,
        json!({
            "name": "gold",
            "description": "Gold subscribers",
            "permissions": [
                { "category": "ACCESS_LEVEL", "name": "CAN_LOGIN", "value": "yes" },
                { "category": "REPORT_LEVEL", "name": "CAN_VIEW_PAYMENT_HISTORY", "value": "no" }
            ]
        }),
    )
    .await;

    let list: Value = client
        .get(&api_path(&format!(
            "/organizations/{}/subscriber-groups",
            organization_id
        )))
        .await
        .json();
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["subscriber_group_id"].as_str(), Some(group_id.as_str()));
    assert_eq!(list[0]["subscriber_group_name"].as_str(), Some("gold"));

    let response = client
        .get(&api_path(&format!("/subscriber-groups/{}", group_id)))
        .await;
    assert_eq!(response.status_code(), 200);
    let detail: Value = response.json();
    assert_eq!(detail["permissions"].as_array().unwrap().len(), 2);
    assert_eq!(
        detail["permission_set"]["access_level"][0]["name"].as_str(),
        Some("CAN_LOGIN")
    );

    let response = client
        .patch(&api_path(&format!("/subscriber-groups/{}", group_id)))
        .json(&json!({
            "name": "platinum",
            "permissions": [
                { "category": "REPORT_LEVEL", "name": "CAN_VIEW_PAYMENT_HISTORY", "value": "yes" },
                { "category": "PAYMENT_LEVEL", "name": "CAN_PAY", "value": "yes" }
            ]
        }))
        .await;
    assert_eq!(response.status_code(), 200);
    let detail: Value = response.json();
    assert_eq!(detail["name"].as_str(), Some("platinum"));
    assert_eq!(detail["description"].as_str(), Some("Gold subscribers"));
    assert_eq!(detail["permissions"].as_array().unwrap().len(), 3);
    assert_eq!(
        detail["permission_set"]["report_level"][0]["value"].as_str(),
        Some("yes")
    );

    let response = client
        .delete(&api_path(&format!("/subscriber-groups/{}", group_id)))
        .await;
    assert_eq!(response.status_code(), 204);

    let response = client
        .get(&api_path(&format!("/subscriber-groups/{}", group_id)))
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_create_group_validation() {
    let app = setup_test_app();
    let client = app.client();
    let organization_id = create_organization(client, "acme").await;
    let path = api_path(&format!(
        "/organizations/{}/subscriber-groups",
        organization_id
    ));

    let response = client.post(&path).json(&json!({ "name": "" })).await;
    assert_eq!(response.status_code(), 400);

    let response = client
        .post(&path)
        .json(&json!({
            "name": "gold",
            "permissions": [
                { "category": "ACCESS_LEVEL", "name": "CAN_LOGIN", "value": "yes" },
                { "category": "ACCESS_LEVEL", "name": "CAN_LOGIN", "value": "no" }
            ]
        }))
        .await;
    assert_eq!(response.status_code(), 400);

    // Malformed body
    let response = client.post(&path).json(&json!({ "name": 42 })).await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_duplicate_group_name_is_409() {
    let app = setup_test_app();
    let client = app.client();
    let organization_id = create_organization(client, "acme").await;
    create_group(client, &organization_id, json!({ "name": "gold" })).await;

    let response = client
        .post(&api_path(&format!(
            "/organizations/{}/subscriber-groups",
            organization_id
        )))
        .json(&json!({ "name": "gold" }))
        .await;
    assert_eq!(response.status_code(), 409);
}

#[tokio::test]
async fn test_group_under_unknown_organization_is_404() {
    let app = setup_test_app();
    let response = app
        .client()
        .post(&api_path(&format!(
            "/organizations/{}/subscriber-groups",
            uuid::Uuid::new_v4()
        )))
        .json(&json!({ "name": "gold" }))
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_malformed_group_id_is_400() {
    let app = setup_test_app();
    let response = app
        .client()
        .get(&api_path("/subscriber-groups/not-a-uuid"))
        .await;
    assert_eq!(response.status_code(), 400);
}
