mod common;

use atelier_types::methods::{
    debug::RouteKind,
    endpoint::CreateEndpointParams,
    page::CreatePageParams,
    project::CreateProjectParams,
};
use common::{admin_token_for, setup_as, token_for};

#[tokio::test]
async fn restricted_to_the_admin_identity() {
    let sdk = setup_as("u1").await;

    let err = sdk.debug.routes().await.unwrap_err();
    assert_eq!(err.status, 403);

    sdk.set_token(None).await;
    let err = sdk.debug.routes().await.unwrap_err();
    assert_eq!(err.status, 401);
}

#[tokio::test]
async fn reports_the_registered_routes() {
    let sdk = setup_as("u1").await;
    let project = sdk
        .projects
        .create(&CreateProjectParams {
            name: "inspect".into(),
            description: None,
        })
        .await
        .unwrap();

    let endpoint = sdk
        .endpoints
        .create(&CreateEndpointParams {
            path: "/ep".into(),
            code: "function endpoint_function(p){return {};}".into(),
            parameters: None,
            http_method: None,
            language: None,
            project_id: project.id.clone(),
        })
        .await
        .unwrap();
    sdk.pages
        .create(&CreatePageParams {
            path: "/pg".into(),
            html_content: "<p>x</p>".into(),
            project_id: project.id.clone(),
        })
        .await
        .unwrap();

    sdk.set_token(Some(admin_token_for("ops"))).await;
    let routes = sdk.debug.routes().await.unwrap();
    assert_eq!(routes.count, 2);
    assert_eq!(routes.routes.len(), 2);
    assert_eq!(routes.routes[0].path, "/api/inspect/ep");
    assert_eq!(routes.routes[0].kind, RouteKind::Endpoint);
    assert_eq!(routes.routes[1].path, "/inspect/pg");
    assert_eq!(routes.routes[1].kind, RouteKind::Page);

    // Registry contents converge with the store after mutations.
    sdk.set_token(Some(token_for("u1"))).await;
    sdk.endpoints.remove(&endpoint.id).await.unwrap();
    sdk.set_token(Some(admin_token_for("ops"))).await;
    let routes = sdk.debug.routes().await.unwrap();
    assert_eq!(routes.count, 1);
    assert_eq!(routes.routes[0].path, "/inspect/pg");
}
