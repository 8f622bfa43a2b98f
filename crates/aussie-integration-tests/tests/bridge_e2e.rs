//! The bridge protocol end to end: wire JSON in, wire JSON out.

mod common;

use aussie_kernel::{BRIDGE_SOURCE, Bridge, CapabilityPolicy, FsAccess, KERNEL_SOURCE};
use aussie_scheduler::{ExecError, ExecOutput};
use aussie_test::{RecordingExecutor, TestCore};
use common::{ORIGIN, kernel_for};
use serde_json::{Value, json};

async fn send(bridge: &Bridge, id: u64, action: &str, payload: Value) -> Value {
    let response = bridge
        .handle(
            ORIGIN,
            &json!({ "source": BRIDGE_SOURCE, "id": id, "action": action, "payload": payload }),
        )
        .await
        .unwrap();
    serde_json::to_value(response).unwrap()
}

#[tokio::test]
async fn test_desktop_session_over_the_bridge() {
    let core = TestCore::new().await;
    let bridge = Bridge::new(kernel_for(&core, CapabilityPolicy::default()), ORIGIN);

    let res = send(&bridge, 1, "fs.mkdir", json!({ "path": "/a" })).await;
    assert_eq!(res, json!({ "source": KERNEL_SOURCE, "id": 1, "ok": true }));

    send(
        &bridge,
        2,
        "fs.write",
        json!({ "path": "/a/b.txt", "content": "hi" }),
    )
    .await;
    let listing = send(&bridge, 3, "fs.list", json!({ "path": "/a" })).await;
    assert_eq!(listing["result"][0]["name"], "b.txt");
    assert_eq!(listing["result"][0]["size"], 2);

    let moved = send(
        &bridge,
        4,
        "fs.move",
        json!({ "oldPath": "/a/b.txt", "newPath": "/a/c.txt" }),
    )
    .await;
    assert_eq!(moved["ok"], true);
    let read = send(&bridge, 5, "fs.read", json!({ "path": "/a/c.txt" })).await;
    assert_eq!(read["result"], "hi");

    let opened = send(
        &bridge,
        6,
        "windows.open",
        json!({ "appId": "files", "title": "Files" }),
    )
    .await;
    let window_id = opened["result"]["id"].as_str().unwrap().to_owned();
    let listed = send(&bridge, 7, "windows.list", Value::Null).await;
    assert_eq!(listed["result"].as_array().unwrap().len(), 1);

    let closed = send(&bridge, 8, "windows.close", json!({ "id": window_id })).await;
    assert_eq!(closed["ok"], true);
    assert!(core.windows.list_windows().is_empty());
}

#[tokio::test]
async fn test_denials_are_responses_not_protocol_failures() {
    let core = TestCore::new().await;
    let bridge = Bridge::new(
        kernel_for(
            &core,
            CapabilityPolicy {
                fs: FsAccess::Read,
                ..CapabilityPolicy::default()
            },
        ),
        ORIGIN,
    );

    let res = send(&bridge, 9, "fs.write", json!({ "path": "/x", "content": "" })).await;
    assert_eq!(res["id"], 9);
    assert_eq!(res["ok"], false);
    assert!(
        res["error"]
            .as_str()
            .unwrap()
            .starts_with("Permission denied")
    );
    assert!(!core.fs.exists("/x"));
}

#[tokio::test]
async fn test_shell_exec_returns_captured_output() {
    let executor = RecordingExecutor::new()
        .with_output("uptime", ExecOutput::ok("up 3 days"))
        .with_error("crash", ExecError::Failed("segfault".into()));
    let core = TestCore::with_executor(executor).await;
    let bridge = Bridge::new(kernel_for(&core, CapabilityPolicy::default()), ORIGIN);

    let ok = send(&bridge, 1, "shell.exec", json!({ "command": "uptime" })).await;
    assert_eq!(ok["result"]["stdout"], "up 3 days");
    assert_eq!(ok["result"]["exitCode"], 0);

    let failed = send(&bridge, 2, "shell.exec", json!({ "command": "crash" })).await;
    assert_eq!(failed["ok"], false);
    assert!(failed["error"].as_str().unwrap().contains("segfault"));
}

#[tokio::test]
async fn test_permissions_round_trip_and_sandbox() {
    let core = TestCore::new().await;
    let kernel = kernel_for(&core, CapabilityPolicy::default());
    let bridge = Bridge::new(kernel.clone(), ORIGIN);

    let got = send(&bridge, 1, "permissions.get", Value::Null).await;
    assert_eq!(got["result"]["fs"], "readwrite");

    let set = send(
        &bridge,
        2,
        "permissions.set",
        json!({ "network": "deny", "sandboxed": true }),
    )
    .await;
    assert_eq!(set["result"]["network"], "deny");
    assert!(!kernel.facade().network_allowed());

    // Once sandboxed, the page can no longer lift its own restrictions.
    let escape = send(&bridge, 3, "permissions.set", json!({ "sandboxed": false })).await;
    assert_eq!(escape["ok"], false);
    assert!(kernel.permissions().sandboxed);
}

#[tokio::test]
async fn test_bad_requests_are_answered() {
    let core = TestCore::new().await;
    let bridge = Bridge::new(kernel_for(&core, CapabilityPolicy::default()), ORIGIN);

    let unknown = send(&bridge, 1, "fs.format", json!({})).await;
    assert_eq!(unknown["error"], "Unknown action: fs.format");

    let missing = send(&bridge, 2, "fs.read", json!({})).await;
    assert_eq!(missing["ok"], false);
    assert!(missing["error"].as_str().unwrap().contains("fs.read"));

    assert!(
        bridge
            .handle(
                "https://elsewhere.example",
                &json!({ "source": BRIDGE_SOURCE, "id": 3, "action": "windows.list" }),
            )
            .await
            .is_none()
    );
}
