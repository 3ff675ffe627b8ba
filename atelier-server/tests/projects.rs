mod common;

use atelier_types::methods::project::{CreateProjectParams, UpdateProjectParams};
use common::{setup, setup_as, token_for};

#[tokio::test]
async fn crud() {
    let sdk = setup_as("u1").await;

    let project = sdk
        .projects
        .create(&CreateProjectParams {
            name: "Math Utils".into(),
            description: Some("numeric helpers".into()),
        })
        .await
        .unwrap();
    assert_eq!(project.name, "Math Utils");
    assert_eq!(project.name_slug, "math-utils");
    assert_eq!(project.user_id, "u1");

    let listed = sdk.projects.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, project.id);

    let fetched = sdk.projects.get(&project.id).await.unwrap();
    assert_eq!(fetched, project);

    sdk.projects
        .update(
            &project.id,
            &UpdateProjectParams {
                name: Some("Math Tools".into()),
                description: None,
            },
        )
        .await
        .unwrap();
    let fetched = sdk.projects.get(&project.id).await.unwrap();
    assert_eq!(fetched.name, "Math Tools");
    assert_eq!(fetched.name_slug, "math-tools");
    assert_eq!(fetched.description.as_deref(), Some("numeric helpers"));

    sdk.projects.remove(&project.id).await.unwrap();
    let err = sdk.projects.get(&project.id).await.unwrap_err();
    assert_eq!(err.status, 404);
}

#[tokio::test]
async fn missing_name_is_rejected() {
    let sdk = setup_as("u1").await;

    let err = sdk
        .projects
        .create(&CreateProjectParams {
            name: "   ".into(),
            description: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.status, 400);
}

#[tokio::test]
async fn update_with_no_fields_is_rejected() {
    let sdk = setup_as("u1").await;
    let project = sdk
        .projects
        .create(&CreateProjectParams {
            name: "demo".into(),
            description: None,
        })
        .await
        .unwrap();

    let err = sdk
        .projects
        .update(&project.id, &UpdateProjectParams::default())
        .await
        .unwrap_err();
    assert_eq!(err.status, 400);
}

#[tokio::test]
async fn requires_authentication() {
    let sdk = setup().await;

    let err = sdk.projects.list().await.unwrap_err();
    assert_eq!(err.status, 401);

    let err = sdk
        .projects
        .create(&CreateProjectParams {
            name: "demo".into(),
            description: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.status, 401);
}

#[tokio::test]
async fn owners_are_isolated_from_each_other() {
    let sdk = setup_as("u1").await;
    let project = sdk
        .projects
        .create(&CreateProjectParams {
            name: "private".into(),
            description: None,
        })
        .await
        .unwrap();

    // Same server, different caller.
    sdk.set_token(Some(token_for("u2"))).await;

    assert!(sdk.projects.list().await.unwrap().is_empty());

    let err = sdk.projects.get(&project.id).await.unwrap_err();
    assert_eq!(err.status, 403);

    let err = sdk
        .projects
        .update(
            &project.id,
            &UpdateProjectParams {
                name: Some("stolen".into()),
                description: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.status, 403);

    let err = sdk.projects.remove(&project.id).await.unwrap_err();
    assert_eq!(err.status, 403);

    // The resource is untouched.
    sdk.set_token(Some(token_for("u1"))).await;
    assert_eq!(sdk.projects.get(&project.id).await.unwrap().name, "private");
}
