//! Node directory layout and peer command tests

use peernode::layout::NodeLayout;
use peernode::{EnrollRequest, ErrorKind, NodeError, PeerCommand};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Layout
// ============================================================================

#[test]
fn test_layout_paths() {
    let layout = NodeLayout::for_node(Path::new("/home/u/hlf-easy/peers"), "peer0").unwrap();
    let root = PathBuf::from("/home/u/hlf-easy/peers/peer0");

    assert_eq!(layout.node_id(), "peer0");
    assert_eq!(layout.root(), root);
    assert_eq!(layout.identity_file(), root.join("identity.json"));
    assert_eq!(layout.request_file(), root.join("init.json"));
    assert_eq!(layout.node_ou_file(), root.join("config.yaml"));
    assert_eq!(layout.core_config_file(), root.join("core.yaml"));
    assert_eq!(layout.tls_cert_file(), root.join("tls.crt"));
    assert_eq!(layout.tls_key_file(), root.join("tls.key"));
    assert_eq!(layout.sign_cert_file(), root.join("signcerts/cert.pem"));
    assert_eq!(layout.sign_key_file(), root.join("keystore/key.pem"));
    assert_eq!(layout.ca_cert_file(), root.join("cacerts/cacert.pem"));
    assert_eq!(layout.tls_ca_cert_file(), root.join("tlscacerts/cacert.pem"));
    assert_eq!(layout.data_dir(), root.join("data"));
}

#[test]
fn test_layout_is_deterministic() {
    let peers = Path::new("/peers");
    assert_eq!(
        NodeLayout::for_node(peers, "peer0").unwrap(),
        NodeLayout::for_node(peers, "peer0").unwrap()
    );
    assert_ne!(
        NodeLayout::for_node(peers, "peer0").unwrap().root(),
        NodeLayout::for_node(peers, "peer1").unwrap().root()
    );
}

#[test]
fn test_invalid_node_ids_rejected() {
    for id in ["", ".", "..", "a/b", "/abs", "a\\b", "nul\0"] {
        let err = NodeLayout::for_node(Path::new("/peers"), id).unwrap_err();
        assert!(matches!(err, NodeError::InvalidNodeId(_)), "id {:?}", id);
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}

// ============================================================================
// Peer command
// ============================================================================

fn env_map(command: &PeerCommand) -> HashMap<String, String> {
    command.env().into_iter().collect()
}

#[test]
fn test_peer_command_environment() {
    let layout = NodeLayout::for_node(Path::new("/peers"), "peer0").unwrap();
    let request = EnrollRequest::new("peer0", "Org1MSP", "org1");
    let command = PeerCommand::new("/opt/bin/peer", layout, request);

    let env = env_map(&command);
    assert_eq!(env["FABRIC_CFG_PATH"], "/peers/peer0");
    assert_eq!(env["CORE_PEER_ID"], "peer0");
    assert_eq!(env["CORE_PEER_LOCALMSPID"], "Org1MSP");
    assert_eq!(env["CORE_PEER_MSPCONFIGPATH"], "/peers/peer0");
    assert_eq!(env["CORE_PEER_FILESYSTEMPATH"], "/peers/peer0/data");
    assert_eq!(env["CORE_PEER_TLS_ENABLED"], "true");
    assert_eq!(env["CORE_PEER_TLS_CERT_FILE"], "/peers/peer0/tls.crt");
    assert_eq!(env["CORE_PEER_TLS_KEY_FILE"], "/peers/peer0/tls.key");
    assert_eq!(
        env["CORE_PEER_TLS_ROOTCERT_FILE"],
        "/peers/peer0/tlscacerts/cacert.pem"
    );
    assert_eq!(env["CORE_PEER_LISTENADDRESS"], "0.0.0.0:7051");
    assert_eq!(env["CORE_PEER_CHAINCODELISTENADDRESS"], "0.0.0.0:7052");
    assert_eq!(env["CORE_OPERATIONS_LISTENADDRESS"], "127.0.0.1:9443");
    assert!(!env.contains_key("CORE_PEER_ADDRESS"));
}

#[test]
fn test_peer_command_external_endpoint() {
    let layout = NodeLayout::for_node(Path::new("/peers"), "peer0").unwrap();
    let mut request = EnrollRequest::new("peer0", "Org1MSP", "org1");
    request.external_endpoint = Some("peer0.org1.example.com:7051".to_string());

    let env = env_map(&PeerCommand::new("peer", layout, request));
    assert_eq!(env["CORE_PEER_ADDRESS"], "peer0.org1.example.com:7051");
    assert_eq!(
        env["CORE_PEER_GOSSIP_EXTERNALENDPOINT"],
        "peer0.org1.example.com:7051"
    );
}

#[test]
fn test_peer_command_line() {
    let layout = NodeLayout::for_node(Path::new("/peers"), "peer0").unwrap();
    let request = EnrollRequest::new("peer0", "Org1MSP", "org1");
    let command = PeerCommand::new("/opt/bin/peer", layout, request).build();

    assert_eq!(command.get_program(), "/opt/bin/peer");
    let args: Vec<_> = command.get_args().collect();
    assert_eq!(args, ["node", "start"]);
    assert_eq!(command.get_current_dir(), Some(Path::new("/peers/peer0")));
}

#[test]
fn test_factory_requires_recorded_request() {
    let temp = TempDir::new().unwrap();
    let layout = NodeLayout::for_node(temp.path(), "peer0").unwrap();
    let factory = PeerCommand::factory(PathBuf::from("peer"), layout.clone());

    let err = factory().unwrap_err();
    assert!(matches!(err, NodeError::NotProvisioned { .. }));

    std::fs::create_dir_all(layout.root()).unwrap();
    let request = EnrollRequest::new("peer0", "Org1MSP", "org1");
    std::fs::write(
        layout.request_file(),
        serde_json::to_string(&request).unwrap(),
    )
    .unwrap();

    let command = factory().unwrap();
    let env: HashMap<_, _> = command
        .get_envs()
        .filter_map(|(k, v)| Some((k.to_str()?.to_string(), v?.to_str()?.to_string())))
        .collect();
    assert_eq!(env["CORE_PEER_LOCALMSPID"], "Org1MSP");
}

#[test]
fn test_enroll_request_defaults_when_fields_missing() {
    let request: EnrollRequest =
        serde_json::from_str(r#"{"id":"peer0","msp_id":"Org1MSP","ca_name":"org1"}"#).unwrap();
    assert_eq!(request, EnrollRequest::new("peer0", "Org1MSP", "org1"));
    assert!(request.local);
}
