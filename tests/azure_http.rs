//! Integration tests for the Azure provider using wiremock
//!
//! These tests run the ARM client against mocked endpoints, covering
//! pagination, the instance view, the NIC/public IP chain, power
//! operations and error mapping.

use serde_json::json;
use std::sync::Arc;
use tazvm::azure::auth::AzureCredentials;
use tazvm::azure::client::{API_VERSION_COMPUTE, API_VERSION_NETWORK};
use tazvm::azure::{format_azure_error, AzureClient};
use tazvm::resource::{
    Action, Fleet, FleetConfig, PowerState, Provider, ProviderError, Scope, VmDescriptor,
};
use wiremock::matchers::{bearer_token, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "test-token";
const SUB: &str = "sub-1";
const VM_PATH: &str =
    "/subscriptions/sub-1/resourceGroups/web-rg/providers/Microsoft.Compute/virtualMachines/web-1";
const NIC_ID: &str =
    "/subscriptions/sub-1/resourceGroups/net-rg/providers/Microsoft.Network/networkInterfaces/web-1-nic";
const PIP_ID: &str =
    "/subscriptions/sub-1/resourceGroups/net-rg/providers/Microsoft.Network/publicIPAddresses/web-1-ip";

fn client(server: &MockServer) -> AzureClient {
    AzureClient::with_endpoint(&server.uri(), AzureCredentials::with_static_token(TOKEN))
        .expect("valid endpoint")
}

fn vm_json(name: &str, nic: Option<&str>) -> serde_json::Value {
    let nics: Vec<_> = nic.iter().map(|id| json!({ "id": id })).collect();
    json!({
        "id": format!("/subscriptions/sub-1/resourceGroups/web-rg/providers/Microsoft.Compute/virtualMachines/{}", name),
        "name": name,
        "location": "westeurope",
        "properties": { "networkProfile": { "networkInterfaces": nics } }
    })
}

async fn mount_subscriptions(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/subscriptions"))
        .and(bearer_token(TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                {"subscriptionId": SUB, "displayName": "Production", "state": "Enabled"},
                {"subscriptionId": "sub-old", "displayName": "Legacy", "state": "Disabled"}
            ]
        })))
        .mount(server)
        .await;
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn test_disabled_subscriptions_are_skipped() {
        let server = MockServer::start().await;
        mount_subscriptions(&server).await;

        let subs = client(&server).list_subscriptions().await.unwrap();

        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].id, SUB);
        assert_eq!(subs[0].display_name, "Production");
    }

    #[tokio::test]
    async fn test_vm_listing_follows_next_link() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/subscriptions/sub-1/providers/Microsoft.Compute/virtualMachines"))
            .and(query_param("api-version", API_VERSION_COMPUTE))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [vm_json("web-1", Some(NIC_ID))],
                "nextLink": format!("{}/vm-page-2?api-version={}", server.uri(), API_VERSION_COMPUTE)
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/vm-page-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [vm_json("web-2", None)]
            })))
            .mount(&server)
            .await;

        let vms = client(&server).list_virtual_machines(SUB).await.unwrap();

        assert_eq!(vms.len(), 2);
        assert_eq!(vms[0].name, "web-1");
        assert_eq!(vms[0].network_interface_ids, vec![NIC_ID.to_string()]);
        assert_eq!(vms[1].name, "web-2");
        assert!(vms[1].network_interface_ids.is_empty());
    }
}

mod status {
    use super::*;

    #[tokio::test]
    async fn test_instance_view_returns_codes_in_order() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("{}/instanceView", VM_PATH)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "statuses": [
                    {"code": "ProvisioningState/succeeded"},
                    {"code": "PowerState/deallocated"}
                ]
            })))
            .mount(&server)
            .await;

        let codes = client(&server)
            .instance_view(SUB, "web-rg", "web-1")
            .await
            .unwrap();

        assert_eq!(codes, vec!["ProvisioningState/succeeded", "PowerState/deallocated"]);
        assert_eq!(PowerState::from_status_codes(&codes), PowerState::Stopped);
    }

    #[tokio::test]
    async fn test_public_address_through_nic() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(NIC_ID))
            .and(query_param("api-version", API_VERSION_NETWORK))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "properties": {
                    "ipConfigurations": [
                        {"properties": {"privateIPAddress": "10.0.0.4", "publicIPAddress": {"id": PIP_ID}}}
                    ]
                }
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(PIP_ID))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "properties": {"ipAddress": "20.50.1.2"}
            })))
            .mount(&server)
            .await;

        let vm = VmDescriptor::new(VM_PATH, "web-1").with_network_interface(NIC_ID);
        let address = client(&server)
            .public_address(SUB, "web-rg", &vm)
            .await
            .unwrap();

        assert_eq!(address.as_deref(), Some("20.50.1.2"));
    }

    #[tokio::test]
    async fn test_no_public_ip_is_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(NIC_ID))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "properties": {"ipConfigurations": [{"properties": {"privateIPAddress": "10.0.0.4"}}]}
            })))
            .mount(&server)
            .await;

        let vm = VmDescriptor::new(VM_PATH, "web-1").with_network_interface(NIC_ID);
        let address = client(&server)
            .public_address(SUB, "web-rg", &vm)
            .await
            .unwrap();

        assert!(address.is_none());
    }
}

mod operations {
    use super::*;

    #[tokio::test]
    async fn test_restart_posts_and_accepts_empty_202() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(format!("{}/restart", VM_PATH)))
            .and(bearer_token(TOKEN))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .begin_restart(SUB, "web-rg", "web-1")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_stop_uses_deallocate() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(format!("{}/deallocate", VM_PATH)))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .begin_deallocate(SUB, "web-rg", "web-1")
            .await
            .unwrap();
    }
}

mod errors {
    use super::*;

    #[tokio::test]
    async fn test_401_maps_to_auth() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/subscriptions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"code": "InvalidAuthenticationToken", "message": "secret details"}
            })))
            .mount(&server)
            .await;

        let err = client(&server).list_subscriptions().await.unwrap_err();

        assert!(matches!(err, ProviderError::Auth(ref code) if code == "InvalidAuthenticationToken"));
        assert!(!format_azure_error(&err).contains("secret"));
    }

    #[tokio::test]
    async fn test_conflict_keeps_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(format!("{}/start", VM_PATH)))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "error": {"code": "OperationNotAllowed", "message": "busy"}
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .begin_start(SUB, "web-rg", "web-1")
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(409));
        assert!(format_azure_error(&err).starts_with("Conflict"));
    }

    #[tokio::test]
    async fn test_invalid_json_is_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("{}/instanceView", VM_PATH)))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client(&server)
            .instance_view(SUB, "web-rg", "web-1")
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Decode(_)));
    }
}

mod fleet {
    use super::*;

    #[tokio::test]
    async fn test_fleet_over_azure_client() {
        let server = MockServer::start().await;
        mount_subscriptions(&server).await;

        Mock::given(method("GET"))
            .and(path("/subscriptions/sub-1/providers/Microsoft.Compute/virtualMachines"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [vm_json("web-1", None)]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(format!("{}/instanceView", VM_PATH)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "statuses": [{"code": "PowerState/running"}]
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path(format!("{}/start", VM_PATH)))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let fleet = Fleet::new(Arc::new(client(&server)), FleetConfig::default());

        assert_eq!(fleet.refresh(&Scope::All).await.unwrap(), 1);
        fleet.poll_once().await;
        let summary = fleet.summary().await;
        assert_eq!(summary.running, 1);

        let receipt = fleet.dispatch(Action::Start, VM_PATH).await.unwrap();
        assert_eq!(receipt.resource_name, "web-1");
    }
}
