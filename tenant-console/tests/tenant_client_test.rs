mod common;

use axum::http::Method;
use common::{unreachable_base_path, TestApp, MALFORMED_ID};
use serde_json::json;
use std::time::Duration;
use tenant_console::models::{CreateTenantRequest, Helm, Source, UpdateTenantBody};
use tenant_console::services::Transport;
use tenant_console::{ClientError, TenantClient};

fn source(repo_url: &str) -> Source {
    Source {
        repo_url: Some(repo_url.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn create_sends_source_with_empty_fields_and_returns_new_tenant() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let request = CreateTenantRequest::from(Source {
        repo_url: Some("https://example.com/r.git".to_string()),
        path: Some(String::new()),
        target_revision: Some(String::new()),
        helm: Some(Helm {
            values: json!({"replicas": 1}).as_object().cloned(),
        }),
    });

    let response = client.create_tenant(&request).await.unwrap();

    let sent = app.last_request();
    assert_eq!(sent.method, Method::POST);
    assert_eq!(sent.raw_path, "/v1/tenants");
    assert_eq!(
        sent.body,
        Some(json!({
            "source": {
                "repoUrl": "https://example.com/r.git",
                "path": "",
                "targetRevision": "",
                "helm": { "values": { "replicas": 1 } }
            }
        }))
    );

    let tenant = response.tenant.expect("created tenant is echoed");
    assert_eq!(tenant.id.as_deref(), Some("tenant-1"));
    assert_eq!(tenant.source, request.source);

    let fetched = client.get_tenant("tenant-1").await.unwrap();
    assert_eq!(app.last_request().raw_path, "/v1/tenants/tenant-1");
    assert_eq!(fetched.tenant, Some(tenant));
}

#[tokio::test]
async fn list_returns_tenants_in_server_order() {
    let app = TestApp::spawn().await;
    app.seed(json!({"id": "b"}));
    app.seed(json!({"id": "a", "application": {"health": {"status": "Healthy"}}}));

    let response = app.client().list_tenants().await.unwrap();

    let ids: Vec<_> = response.tenants.iter().filter_map(|t| t.id()).collect();
    assert_eq!(ids, vec!["b", "a"]);
    assert_eq!(response.tenants[1].health_status(), Some("Healthy"));
}

#[tokio::test]
async fn empty_list_decodes_to_no_tenants() {
    let app = TestApp::spawn().await;

    let response = app.client().list_tenants().await.unwrap();

    assert!(response.tenants.is_empty());
}

#[tokio::test]
async fn get_update_and_delete_address_the_tenant_path() {
    let app = TestApp::spawn().await;
    app.seed(json!({"id": "t1", "source": {"repoUrl": "https://old.example.com"}}));
    let client = app.client();

    let fetched = client.get_tenant("t1").await.unwrap();
    assert_eq!(fetched.tenant_id(), Some("t1"));

    let updated = client
        .update_tenant("t1", &UpdateTenantBody::from(source("https://new.example.com")))
        .await
        .unwrap();
    let update_request = app.last_request();
    assert_eq!(update_request.method, Method::PUT);
    assert_eq!(update_request.raw_path, "/v1/tenants/t1");
    assert_eq!(
        update_request.body,
        Some(json!({"source": {"repoUrl": "https://new.example.com"}}))
    );
    assert_eq!(
        updated.tenant.and_then(|t| t.source).and_then(|s| s.repo_url),
        Some("https://new.example.com".to_string())
    );

    let deleted = client.delete_tenant("t1").await.unwrap();
    assert_eq!(deleted.tenant_id(), Some("t1"));
    assert_eq!(app.last_request().method, Method::DELETE);

    let err = client.get_tenant("t1").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn body_headers_are_only_sent_with_a_body() {
    let app = TestApp::spawn().await;
    let client = app.client();

    client.list_tenants().await.unwrap();
    let get = app.last_request();
    assert_eq!(get.accept.as_deref(), Some("application/json"));
    assert_eq!(get.content_type, None);
    assert!(get.body.is_none());
    assert!(get.request_id.is_some());

    client
        .create_tenant(&CreateTenantRequest::default())
        .await
        .unwrap();
    let post = app.last_request();
    assert_eq!(post.accept.as_deref(), Some("application/json"));
    assert_eq!(post.content_type.as_deref(), Some("application/json"));
    assert_eq!(post.body, Some(json!({})));
}

#[tokio::test]
async fn each_request_carries_its_own_request_id() {
    let app = TestApp::spawn().await;
    let client = app.client();

    client.list_tenants().await.unwrap();
    client.list_tenants().await.unwrap();

    let ids: Vec<_> = app
        .requests()
        .into_iter()
        .map(|r| r.request_id.expect("request id header"))
        .collect();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
}

#[tokio::test]
async fn path_parameters_are_percent_encoded() {
    let app = TestApp::spawn().await;

    let err = app.client().get_tenant("a b/c").await.unwrap_err();

    assert_eq!(app.last_request().raw_path, "/v1/tenants/a%20b%2Fc");
    match err {
        ClientError::Remote { status, envelope } => {
            assert_eq!(status, 404);
            assert_eq!(envelope.message.as_deref(), Some("tenant a b/c not found"));
        }
        other => panic!("expected a remote error, got {:?}", other),
    }
}

#[tokio::test]
async fn empty_id_fails_before_any_request() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let get = client.get_tenant("").await.unwrap_err();
    let update = client
        .update_tenant("", &UpdateTenantBody::default())
        .await
        .unwrap_err();
    let delete = client.delete_tenant("").await.unwrap_err();

    for err in [&get, &update, &delete] {
        assert!(err.is_parameter(), "unexpected error: {:?}", err);
    }
    assert_eq!(
        get.to_string(),
        "Required parameter \"id\" was missing when calling get_tenant()"
    );
    assert!(app.requests().is_empty());
}

#[tokio::test]
async fn server_error_surfaces_status_and_envelope() {
    let app = TestApp::spawn().await;
    app.seed(json!({"id": "t1"}));
    app.state
        .fail_updates
        .store(true, std::sync::atomic::Ordering::SeqCst);

    let err = app
        .client()
        .update_tenant("t1", &UpdateTenantBody::default())
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(500));
    match err {
        ClientError::Remote { envelope, .. } => {
            assert_eq!(envelope.message.as_deref(), Some("update rejected"));
            assert_eq!(envelope.code_string().as_deref(), Some("13"));
        }
        other => panic!("expected a remote error, got {:?}", other),
    }
}

#[tokio::test]
async fn wrong_shaped_success_body_is_a_decode_error() {
    let app = TestApp::spawn().await;

    let err = app.client().get_tenant(MALFORMED_ID).await.unwrap_err();

    assert!(matches!(err, ClientError::Decode { status: 200, .. }));
}

#[tokio::test]
async fn unreachable_service_is_a_network_error() {
    let transport = Transport::new(&unreachable_base_path().await, Some(Duration::from_secs(2)))
        .unwrap();
    let client = TenantClient::new(transport);

    let err = client.list_tenants().await.unwrap_err();

    assert!(matches!(err, ClientError::Network(_)));
    assert_eq!(err.status(), None);
}
