#![allow(clippy::unwrap_used)]
// Integration tests for `Controller` against a wiremock server.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nmadmin_core::{
    ClientConfigFormat, Command, CommandResult, ControllerConfig, Controller, CoreError,
    EditorView, ExtClientUpdate, Field, GatewayOverview, SubmitError, UpdateSink,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn network_json(mtu: i32) -> serde_json::Value {
    json!({
        "netid": "home",
        "displayname": "home",
        "addressrange": "10.10.10.0/24",
        "addressrange6": "",
        "defaultinterface": "nm-home",
        "defaultlistenport": 51821,
        "defaultkeepalive": 20,
        "defaultmtu": mtu,
        "isipv4": "yes",
        "isipv6": "no",
        "defaultudpholepunch": "yes",
        "networklastmodified": 1_650_000_100
    })
}

async fn mount_initial_load(server: &MockServer, rce: &str) {
    Mock::given(method("GET"))
        .and(path("/api/server/getconfig"))
        .and(header("authorization", "Bearer master"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "RCE": rce })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/networks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([network_json(1280)])))
        .mount(server)
        .await;
}

fn config(server: &MockServer) -> ControllerConfig {
    ControllerConfig::new(
        Url::parse(&server.uri()).unwrap(),
        "master".to_string().into(),
    )
}

async fn connected(server: &MockServer, rce: &str) -> Controller {
    mount_initial_load(server, rce).await;
    let controller = Controller::new(config(server));
    controller.connect().await.unwrap();
    controller
}

// ── Connect ─────────────────────────────────────────────────────────

#[tokio::test]
async fn connect_loads_networks_and_server_flags() {
    let server = MockServer::start().await;
    let controller = connected(&server, "on").await;

    assert!(controller.server_config().rce);
    assert!(controller.store().last_refresh().is_some());
    let net = controller.network("home").unwrap();
    assert_eq!(net.defaultmtu, 1280);
    assert!(net.isipv4);

    controller.disconnect().await;
}

#[tokio::test]
async fn connect_failure_marks_state_failed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/server/getconfig"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/networks"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let controller = Controller::new(config(&server));
    let err = controller.connect().await.unwrap_err();
    assert!(matches!(err, CoreError::AuthenticationFailed { .. }), "{err:?}");
    assert_eq!(
        *controller.connection_state().borrow(),
        nmadmin_core::ConnectionState::Failed
    );
}

#[tokio::test]
async fn dispatch_before_connect_is_rejected() {
    let server = MockServer::start().await;
    let controller = Controller::new(config(&server));
    let mut editor = controller.editor_for("home");
    assert!(matches!(editor.view(), EditorView::NotFound { .. }));

    let res = controller.dispatch(Command::DeleteExtClient {
        netid: "home".into(),
        clientid: "phone".into(),
    });
    assert!(matches!(res, Err(CoreError::ControllerDisconnected)));
    assert!(matches!(editor.submit(&controller), Err(SubmitError::NotFound)));
}

// ── Network updates ─────────────────────────────────────────────────

#[tokio::test]
async fn submitted_update_is_awaitable_and_applied() {
    let server = MockServer::start().await;
    let controller = connected(&server, "off").await;

    Mock::given(method("PUT"))
        .and(path("/api/networks/home"))
        .and(body_partial_json(json!({ "netid": "home", "defaultmtu": 1420, "isipv4": "yes" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(network_json(1420)))
        .expect(1)
        .mount(&server)
        .await;

    let mut editor = controller.editor_for("home");
    assert!(editor.set_field(Field::DefaultPostUp, "echo").is_err());
    editor.set_field(Field::DefaultMtu, "1420").unwrap();

    let result = editor.submit(&controller).unwrap().wait().await.unwrap();
    let CommandResult::Network(updated) = result else {
        panic!("expected network result, got {result:?}");
    };
    assert_eq!(updated.defaultmtu, 1420);
    assert_eq!(controller.network("home").unwrap().defaultmtu, 1420);

    controller.disconnect().await;
}

#[tokio::test]
async fn detached_update_still_reaches_the_store() {
    let server = MockServer::start().await;
    let controller = connected(&server, "off").await;

    Mock::given(method("PUT"))
        .and(path("/api/networks/home"))
        .respond_with(ResponseTemplate::new(200).set_body_json(network_json(1300)))
        .expect(1)
        .mount(&server)
        .await;

    let mut networks = controller.networks();
    let mut editor = controller.editor_for("home");
    editor.set_field(Field::DefaultMtu, "1300").unwrap();
    editor.submit(&controller).unwrap().detach();

    let snap = tokio::time::timeout(Duration::from_secs(5), networks.changed())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snap[0].defaultmtu, 1300);

    controller.disconnect().await;
}

#[tokio::test]
async fn rejected_update_reports_server_message() {
    let server = MockServer::start().await;
    let controller = connected(&server, "off").await;

    Mock::given(method("PUT"))
        .and(path("/api/networks/home"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "Code": 400, "Message": "range overlaps" })),
        )
        .mount(&server)
        .await;

    let mut editor = controller.editor_for("home");
    editor.set_field(Field::AddressRange, "10.20.0.0/16").unwrap();
    let err = editor.submit(&controller).unwrap().wait().await.unwrap_err();

    assert!(
        matches!(err, CoreError::Rejected { ref message } if message == "range overlaps"),
        "{err:?}"
    );
    assert_eq!(controller.network("home").unwrap().addressrange, "10.10.10.0/24");

    controller.disconnect().await;
}

#[tokio::test]
async fn invalid_draft_never_reaches_the_server() {
    let server = MockServer::start().await;
    let controller = connected(&server, "off").await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut editor = controller.editor_for("home");
    editor.set_field(Field::AddressRange, "10.20.0.0").unwrap();
    assert!(matches!(editor.submit(&controller), Err(SubmitError::Invalid(_))));

    controller.disconnect().await;
}

// ── Nodes & external clients ────────────────────────────────────────

#[tokio::test]
async fn refresh_network_feeds_the_gateway_overview() {
    let server = MockServer::start().await;
    let controller = connected(&server, "off").await;

    Mock::given(method("GET"))
        .and(path("/api/nodes/home"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "n1", "name": "gw-b", "network": "home", "isingressgateway": "yes" },
            { "id": "n2", "name": "laptop", "network": "home", "isingressgateway": "no" },
            { "id": "n3", "name": "gw-a", "network": "home", "isingressgateway": "yes" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/extclients/home"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "clientid": "phone", "network": "home", "ingressgatewayid": "n1" }
        ])))
        .mount(&server)
        .await;

    controller.refresh_network("home").await.unwrap();

    let GatewayOverview::Gateways { gateways, clients } =
        GatewayOverview::build(controller.store(), "home")
    else {
        panic!("expected gateways");
    };
    let names: Vec<&str> = gateways.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["gw-a", "gw-b"]);
    assert_eq!(clients.len(), 1);

    assert_eq!(
        GatewayOverview::build(controller.store(), "ghost"),
        GatewayOverview::NetworkNotFound
    );

    controller.disconnect().await;
}

#[tokio::test]
async fn create_and_delete_ext_client() {
    let server = MockServer::start().await;
    let controller = connected(&server, "off").await;

    Mock::given(method("POST"))
        .and(path("/api/extclients/home/n1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/extclients/home"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "clientid": "cool-otter", "network": "home", "ingressgatewayid": "n1" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/extclients/home/cool-otter"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let created = controller
        .execute(Command::CreateExtClient {
            netid: "home".into(),
            gateway_node_id: "n1".into(),
        })
        .await
        .unwrap();
    let CommandResult::ExtClient(client) = created else {
        panic!("expected ext client, got {created:?}");
    };
    assert_eq!(client.clientid, "cool-otter");
    assert!(controller.store().ext_client("home", "cool-otter").is_some());

    controller
        .execute(Command::DeleteExtClient {
            netid: "home".into(),
            clientid: "cool-otter".into(),
        })
        .await
        .unwrap();
    assert!(controller.store().ext_client("home", "cool-otter").is_none());

    controller.disconnect().await;
}

#[tokio::test]
async fn refresh_of_unknown_network_is_not_found() {
    let server = MockServer::start().await;
    let controller = connected(&server, "off").await;

    Mock::given(method("GET"))
        .and(path("/api/nodes/ghost"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let err = controller.refresh_network("ghost").await.unwrap_err();
    assert!(
        matches!(err, CoreError::NetworkNotFound { ref netid } if netid == "ghost"),
        "{err:?}"
    );

    controller.disconnect().await;
}

#[tokio::test]
async fn update_of_vanished_network_is_not_found() {
    let server = MockServer::start().await;
    let controller = connected(&server, "off").await;

    Mock::given(method("PUT"))
        .and(path("/api/networks/home"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut editor = controller.editor_for("home");
    editor.set_field(Field::DefaultMtu, "1400").unwrap();
    let err = editor.submit(&controller).unwrap().wait().await.unwrap_err();
    assert!(matches!(err, CoreError::NetworkNotFound { .. }), "{err:?}");

    controller.disconnect().await;
}

#[tokio::test]
async fn create_on_unknown_gateway_is_refused_once_nodes_are_loaded() {
    let server = MockServer::start().await;
    let controller = connected(&server, "off").await;

    Mock::given(method("GET"))
        .and(path("/api/nodes/home"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "n1", "name": "gw", "network": "home", "isingressgateway": "yes" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/extclients/home"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    controller.refresh_network("home").await.unwrap();
    let err = controller
        .execute(Command::CreateExtClient {
            netid: "home".into(),
            gateway_node_id: "n9".into(),
        })
        .await
        .unwrap_err();
    assert!(
        matches!(err, CoreError::NodeNotFound { ref identifier } if identifier == "n9"),
        "{err:?}"
    );

    controller.disconnect().await;
}

#[tokio::test]
async fn update_ext_client_renames_in_store() {
    let server = MockServer::start().await;
    let controller = connected(&server, "off").await;

    Mock::given(method("GET"))
        .and(path("/api/nodes/home"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/extclients/home"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "clientid": "phone", "network": "home", "ingressgatewayid": "n1" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/extclients/home/phone"))
        .and(body_partial_json(json!({ "clientid": "work-phone", "description": "work" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "clientid": "work-phone",
            "description": "work",
            "network": "home",
            "ingressgatewayid": "n1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    controller.refresh_network("home").await.unwrap();
    let result = controller
        .execute(Command::UpdateExtClient {
            netid: "home".into(),
            clientid: "phone".into(),
            update: ExtClientUpdate {
                rename: Some("work-phone".into()),
                description: Some("work".into()),
                enabled: None,
            },
        })
        .await
        .unwrap();

    let CommandResult::ExtClient(client) = result else {
        panic!("expected ext client, got {result:?}");
    };
    assert_eq!(client.clientid, "work-phone");
    assert!(controller.store().ext_client("home", "phone").is_none());
    assert_eq!(
        controller.store().ext_client("home", "work-phone").unwrap().description,
        "work"
    );

    controller.disconnect().await;
}

#[tokio::test]
async fn empty_ext_client_update_never_reaches_the_server() {
    let server = MockServer::start().await;
    let controller = connected(&server, "off").await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = controller
        .execute(Command::UpdateExtClient {
            netid: "home".into(),
            clientid: "phone".into(),
            update: ExtClientUpdate::default(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ValidationFailed { .. }), "{err:?}");

    controller.disconnect().await;
}

#[tokio::test]
async fn missing_ext_client_is_not_found() {
    let server = MockServer::start().await;
    let controller = connected(&server, "off").await;

    Mock::given(method("DELETE"))
        .and(path("/api/extclients/home/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/extclients/home/ghost/qr"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = controller
        .execute(Command::DeleteExtClient {
            netid: "home".into(),
            clientid: "ghost".into(),
        })
        .await
        .unwrap_err();
    assert!(
        matches!(err, CoreError::ExtClientNotFound { ref identifier } if identifier == "ghost"),
        "{err:?}"
    );

    let err = controller
        .ext_client_config("home", "ghost", ClientConfigFormat::Qr)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ExtClientNotFound { .. }), "{err:?}");

    controller.disconnect().await;
}

#[tokio::test]
async fn ext_client_config_downloads_file() {
    let server = MockServer::start().await;
    let controller = connected(&server, "off").await;

    Mock::given(method("GET"))
        .and(path("/api/extclients/home/phone/file"))
        .and(header("authorization", "Bearer master"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[Interface]\n"))
        .expect(1)
        .mount(&server)
        .await;

    let bytes = controller
        .ext_client_config("home", "phone", ClientConfigFormat::File)
        .await
        .unwrap();
    assert_eq!(bytes, b"[Interface]\n");

    controller.disconnect().await;
}

#[tokio::test]
async fn oneshot_runs_closure_between_connect_and_disconnect() {
    let server = MockServer::start().await;
    mount_initial_load(&server, "off").await;

    let count = Controller::oneshot(config(&server), |ctrl| async move {
        Ok(ctrl.networks_snapshot().len())
    })
    .await
    .unwrap();
    assert_eq!(count, 1);
}
