mod common;

use atelier_types::{
    entity::{HttpMethod, Language},
    methods::{
        endpoint::{CreateEndpointParams, UpdateEndpointParams},
        project::CreateProjectParams,
    },
};
use common::{setup_as, token_for};
use serde_json::json;

async fn create_project(sdk: &atelier_sdk::Client, name: &str) -> atelier_types::entity::Project {
    sdk.projects
        .create(&CreateProjectParams {
            name: name.into(),
            description: None,
        })
        .await
        .unwrap()
}

fn sum_endpoint(project_id: &str) -> CreateEndpointParams {
    CreateEndpointParams {
        path: "/sum".into(),
        code: "function endpoint_function(p){return {s: Number(p.a)+Number(p.b)};}".into(),
        parameters: Some(vec!["a".into(), "b".into()]),
        http_method: Some(HttpMethod::Get),
        language: Some(Language::Javascript),
        project_id: project_id.into(),
    }
}

#[tokio::test]
async fn create_call_delete() {
    let sdk = setup_as("u1").await;
    let project = create_project(&sdk, "Math Utils").await;

    let endpoint = sdk.endpoints.create(&sum_endpoint(&project.id)).await.unwrap();
    assert_eq!(endpoint.path, "/api/math-utils/sum");
    assert_eq!(endpoint.parameters, vec!["a".to_string(), "b".to_string()]);

    let (status, body) = sdk
        .dispatch
        .get("/api/math-utils/sum", &[("a", "2"), ("b", "3")])
        .await
        .unwrap();
    assert_eq!(status, 200);
    assert_eq!(body, json!({"s": 5}));

    sdk.endpoints.remove(&endpoint.id).await.unwrap();
    let (status, body) = sdk
        .dispatch
        .get("/api/math-utils/sum", &[("a", "2"), ("b", "3")])
        .await
        .unwrap();
    assert_eq!(status, 404);
    assert_eq!(body, json!({"error": "Not found"}));
}

#[tokio::test]
async fn identical_paths_conflict_across_owners() {
    let sdk = setup_as("u1").await;
    let first_project = create_project(&sdk, "x").await;
    sdk.endpoints
        .create(&CreateEndpointParams {
            path: "/x/y".into(),
            code: "function endpoint_function(p){return {};}".into(),
            parameters: None,
            http_method: None,
            language: None,
            project_id: first_project.id.clone(),
        })
        .await
        .unwrap();

    // A second owner whose project name slugs to the same prefix.
    sdk.set_token(Some(token_for("u2"))).await;
    let second_project = create_project(&sdk, "X ").await;
    assert_eq!(second_project.name_slug, "x");
    let err = sdk
        .endpoints
        .create(&CreateEndpointParams {
            path: "/x/y".into(),
            code: "function endpoint_function(p){return {};}".into(),
            parameters: None,
            http_method: None,
            language: None,
            project_id: second_project.id.clone(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.status, 409);
}

#[tokio::test]
async fn concurrent_creates_yield_one_conflict() {
    let sdk = setup_as("u1").await;
    let project = create_project(&sdk, "race").await;

    let first_params = CreateEndpointParams {
        path: "/same".into(),
        code: "function endpoint_function(p){return {};}".into(),
        parameters: None,
        http_method: None,
        language: None,
        project_id: project.id.clone(),
    };
    let second_params = CreateEndpointParams {
        path: "/same".into(),
        code: "function endpoint_function(p){return {};}".into(),
        parameters: None,
        http_method: None,
        language: None,
        project_id: project.id.clone(),
    };
    let (first, second) = tokio::join!(
        sdk.endpoints.create(&first_params),
        sdk.endpoints.create(&second_params),
    );

    let mut statuses = vec![
        first.map(|_| 201).unwrap_or_else(|err| err.status),
        second.map(|_| 201).unwrap_or_else(|err| err.status),
    ];
    statuses.sort_unstable();
    assert_eq!(statuses, vec![201, 409]);
}

#[tokio::test]
async fn broken_handler_is_visible_over_http() {
    let sdk = setup_as("u1").await;
    let project = create_project(&sdk, "scratch").await;

    let endpoint = sdk
        .endpoints
        .create(&CreateEndpointParams {
            path: "/broken".into(),
            code: "garbage syntax!".into(),
            parameters: None,
            http_method: Some(HttpMethod::Get),
            language: Some(Language::Javascript),
            project_id: project.id.clone(),
        })
        .await
        .unwrap();
    assert_eq!(endpoint.path, "/api/scratch/broken");

    // The endpoint still shows up in listings.
    assert_eq!(sdk.endpoints.list(None).await.unwrap().len(), 1);

    let (status, body) = sdk.dispatch.get("/api/scratch/broken", &[]).await.unwrap();
    assert_eq!(status, 200);
    assert_eq!(body["error"], "JavaScript compilation error");
    assert!(!body["details"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn path_update_migrates_the_registration() {
    let sdk = setup_as("u1").await;
    let project = create_project(&sdk, "s").await;

    let endpoint = sdk
        .endpoints
        .create(&CreateEndpointParams {
            path: "/a".into(),
            code: "function endpoint_function(p){return {ok: true};}".into(),
            parameters: None,
            http_method: None,
            language: None,
            project_id: project.id.clone(),
        })
        .await
        .unwrap();
    assert_eq!(endpoint.path, "/api/s/a");
    let (status, _) = sdk.dispatch.get("/api/s/a", &[]).await.unwrap();
    assert_eq!(status, 200);

    sdk.endpoints
        .update(
            &endpoint.id,
            &UpdateEndpointParams {
                path: Some("/api/s/b".into()),
                ..UpdateEndpointParams::default()
            },
        )
        .await
        .unwrap();

    let (status, _) = sdk.dispatch.get("/api/s/a", &[]).await.unwrap();
    assert_eq!(status, 404);
    let (status, body) = sdk.dispatch.get("/api/s/b", &[]).await.unwrap();
    assert_eq!(status, 200);
    assert_eq!(body, json!({"ok": true}));
}

#[tokio::test]
async fn code_update_replaces_the_handler() {
    let sdk = setup_as("u1").await;
    let project = create_project(&sdk, "hot").await;

    let endpoint = sdk
        .endpoints
        .create(&CreateEndpointParams {
            path: "/value".into(),
            code: "function endpoint_function(p){return {v: 1};}".into(),
            parameters: None,
            http_method: None,
            language: None,
            project_id: project.id.clone(),
        })
        .await
        .unwrap();
    let (_, body) = sdk.dispatch.get("/api/hot/value", &[]).await.unwrap();
    assert_eq!(body, json!({"v": 1}));

    sdk.endpoints
        .update(
            &endpoint.id,
            &UpdateEndpointParams {
                code: Some("function endpoint_function(p){return {v: 2};}".into()),
                ..UpdateEndpointParams::default()
            },
        )
        .await
        .unwrap();
    let (_, body) = sdk.dispatch.get("/api/hot/value", &[]).await.unwrap();
    assert_eq!(body, json!({"v": 2}));
}

#[tokio::test]
async fn update_with_no_fields_is_rejected() {
    let sdk = setup_as("u1").await;
    let project = create_project(&sdk, "demo").await;
    let endpoint = sdk.endpoints.create(&sum_endpoint(&project.id)).await.unwrap();

    let err = sdk
        .endpoints
        .update(&endpoint.id, &UpdateEndpointParams::default())
        .await
        .unwrap_err();
    assert_eq!(err.status, 400);
}

#[tokio::test]
async fn reserved_namespaces_are_rejected() {
    let sdk = setup_as("u1").await;
    let project = create_project(&sdk, "Debug").await;
    assert_eq!(project.name_slug, "debug");

    let err = sdk
        .endpoints
        .create(&CreateEndpointParams {
            path: "/x".into(),
            code: "function endpoint_function(p){return {};}".into(),
            parameters: None,
            http_method: None,
            language: None,
            project_id: project.id.clone(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.status, 400);
}

#[tokio::test]
async fn get_query_values_stay_strings() {
    let sdk = setup_as("u1").await;
    let project = create_project(&sdk, "echo").await;

    sdk.endpoints
        .create(&CreateEndpointParams {
            path: "/id".into(),
            code: "function endpoint_function(p) { return p; }".into(),
            parameters: Some(vec!["x".into()]),
            http_method: Some(HttpMethod::Get),
            language: Some(Language::Javascript),
            project_id: project.id.clone(),
        })
        .await
        .unwrap();

    let (status, body) = sdk.dispatch.get("/api/echo/id", &[("x", "5")]).await.unwrap();
    assert_eq!(status, 200);
    assert_eq!(body, json!({"x": "5"}));
}

#[tokio::test]
async fn post_body_types_are_preserved() {
    let sdk = setup_as("u1").await;
    let project = create_project(&sdk, "echo").await;

    sdk.endpoints
        .create(&CreateEndpointParams {
            path: "/id".into(),
            code: "function endpoint_function(p) { return p; }".into(),
            parameters: Some(vec!["x".into()]),
            http_method: Some(HttpMethod::Post),
            language: Some(Language::Javascript),
            project_id: project.id.clone(),
        })
        .await
        .unwrap();

    let (status, body) = sdk
        .dispatch
        .post("/api/echo/id", &json!({"x": 5, "y": true}))
        .await
        .unwrap();
    assert_eq!(status, 200);
    assert_eq!(body, json!({"x": 5, "y": true}));
}

#[tokio::test]
async fn python_endpoint_round_trip() {
    let sdk = setup_as("u1").await;
    let project = create_project(&sdk, "py").await;

    sdk.endpoints
        .create(&CreateEndpointParams {
            path: "/add".into(),
            code: "return {'sum': params.get('a', 0) + params.get('b', 0)}".into(),
            parameters: None,
            http_method: Some(HttpMethod::Post),
            language: Some(Language::Python),
            project_id: project.id.clone(),
        })
        .await
        .unwrap();

    let (status, body) = sdk
        .dispatch
        .post("/api/py/add", &json!({"a": 1, "b": 2}))
        .await
        .unwrap();
    assert_eq!(status, 200);
    assert_eq!(body, json!({"sum": 3}));
}

#[tokio::test]
async fn owners_are_isolated_from_each_other() {
    let sdk = setup_as("u1").await;
    let project = create_project(&sdk, "mine").await;
    let endpoint = sdk.endpoints.create(&sum_endpoint(&project.id)).await.unwrap();

    sdk.set_token(Some(token_for("u2"))).await;

    let err = sdk.endpoints.get(&endpoint.id).await.unwrap_err();
    assert_eq!(err.status, 403);

    let err = sdk
        .endpoints
        .update(
            &endpoint.id,
            &UpdateEndpointParams {
                code: Some("function endpoint_function(p){return {};}".into()),
                ..UpdateEndpointParams::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.status, 403);

    let err = sdk.endpoints.remove(&endpoint.id).await.unwrap_err();
    assert_eq!(err.status, 403);

    // Creating under a foreign project is forbidden too.
    let err = sdk.endpoints.create(&sum_endpoint(&project.id)).await.unwrap_err();
    assert_eq!(err.status, 403);

    assert!(sdk.endpoints.list(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn listing_carries_join_fields() {
    let sdk = setup_as("u1").await;
    let project = create_project(&sdk, "joined").await;
    sdk.endpoints.create(&sum_endpoint(&project.id)).await.unwrap();

    let listed = sdk.endpoints.list(Some(&project.id)).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].project_name.as_deref(), Some("joined"));
}

#[tokio::test]
async fn unknown_project_is_not_found() {
    let sdk = setup_as("u1").await;
    let err = sdk.endpoints.create(&sum_endpoint("missing")).await.unwrap_err();
    assert_eq!(err.status, 404);
}
