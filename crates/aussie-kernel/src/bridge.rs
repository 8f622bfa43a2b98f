//! Cross-context request/response protocol.
//!
//! Requests arrive as JSON over whatever message channel connects the
//! other context:
//!
//! ```json
//! { "source": "web-os", "id": 7, "action": "fs.read", "payload": { "path": "/a.txt" } }
//! ```
//!
//! and are answered with
//!
//! ```json
//! { "source": "aussie-kernel", "id": 7, "ok": true, "result": "hi" }
//! ```
//!
//! Guard failures are ordinary `ok: false` responses, not protocol errors.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::error::{KernelError, KernelResult};
use crate::kernel::Kernel;
use crate::policy::PolicyPatch;

/// `source` tag carried by requests.
pub const BRIDGE_SOURCE: &str = "web-os";

/// `source` tag carried by responses.
pub const KERNEL_SOURCE: &str = "aussie-kernel";

/// The request envelope, before the action is resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeRequest {
    /// Must be [`BRIDGE_SOURCE`].
    pub source: String,
    /// Caller-chosen correlation id, echoed back verbatim.
    #[serde(default)]
    pub id: Value,
    /// Action name, e.g. `fs.read`.
    pub action: String,
    /// Action arguments.
    #[serde(default)]
    pub payload: Value,
}

impl BridgeRequest {
    /// Resolve the action name and payload into a typed action.
    ///
    /// A missing or `null` payload is treated as `{}`.
    ///
    /// # Errors
    ///
    /// [`KernelError::InvalidRequest`] for unknown actions or payloads that
    /// do not fit the action.
    pub fn action(&self) -> KernelResult<BridgeAction> {
        if !BridgeAction::NAMES.contains(&self.action.as_str()) {
            return Err(KernelError::InvalidRequest(format!(
                "Unknown action: {}",
                self.action
            )));
        }
        let payload = match &self.payload {
            Value::Null => Value::Object(serde_json::Map::new()),
            other => other.clone(),
        };
        serde_json::from_value(serde_json::json!({
            "action": self.action,
            "payload": payload,
        }))
        .map_err(|e| {
            KernelError::InvalidRequest(format!(
                "Invalid request for action '{}': {e}",
                self.action
            ))
        })
    }
}

/// Every action the bridge understands, one per façade operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload")]
pub enum BridgeAction {
    /// Read a file.
    #[serde(rename = "fs.read")]
    FsRead {
        /// File path.
        path: String,
    },
    /// Write or append to a file.
    #[serde(rename = "fs.write")]
    FsWrite {
        /// File path.
        path: String,
        /// Content to write.
        content: String,
        /// Append instead of replacing.
        #[serde(default)]
        append: bool,
    },
    /// List a directory.
    #[serde(rename = "fs.list")]
    FsList {
        /// Directory path.
        path: String,
    },
    /// Create a directory chain.
    #[serde(rename = "fs.mkdir")]
    FsMkdir {
        /// Directory path.
        path: String,
    },
    /// Delete a node.
    #[serde(rename = "fs.delete")]
    FsDelete {
        /// Node path.
        path: String,
    },
    /// Move a node.
    #[serde(rename = "fs.move")]
    FsMove {
        /// Source path.
        #[serde(rename = "oldPath", alias = "from")]
        old_path: String,
        /// Destination path.
        #[serde(rename = "newPath", alias = "to")]
        new_path: String,
    },
    /// Open or focus an app window.
    #[serde(rename = "windows.open")]
    WindowsOpen {
        /// App id.
        #[serde(rename = "appId")]
        app_id: String,
        /// Window title.
        title: String,
        /// App-specific properties.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        props: Option<Value>,
    },
    /// Close a window.
    #[serde(rename = "windows.close")]
    WindowsClose {
        /// Window id.
        id: String,
    },
    /// Focus a window.
    #[serde(rename = "windows.focus")]
    WindowsFocus {
        /// Window id.
        id: String,
    },
    /// List windows.
    #[serde(rename = "windows.list")]
    WindowsList {},
    /// Run a shell command.
    #[serde(rename = "shell.exec")]
    ShellExec {
        /// Command line.
        command: String,
    },
    /// Read the active policy.
    #[serde(rename = "permissions.get")]
    PermissionsGet {},
    /// Merge a partial policy.
    #[serde(rename = "permissions.set")]
    PermissionsSet(PolicyPatch),
}

impl BridgeAction {
    /// Wire names of every action, checked against [`BridgeAction::name`]
    /// by the tests.
    pub const NAMES: [&'static str; 13] = [
        "fs.read",
        "fs.write",
        "fs.list",
        "fs.mkdir",
        "fs.delete",
        "fs.move",
        "windows.open",
        "windows.close",
        "windows.focus",
        "windows.list",
        "shell.exec",
        "permissions.get",
        "permissions.set",
    ];

    /// This action's wire name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::FsRead { .. } => "fs.read",
            Self::FsWrite { .. } => "fs.write",
            Self::FsList { .. } => "fs.list",
            Self::FsMkdir { .. } => "fs.mkdir",
            Self::FsDelete { .. } => "fs.delete",
            Self::FsMove { .. } => "fs.move",
            Self::WindowsOpen { .. } => "windows.open",
            Self::WindowsClose { .. } => "windows.close",
            Self::WindowsFocus { .. } => "windows.focus",
            Self::WindowsList {} => "windows.list",
            Self::ShellExec { .. } => "shell.exec",
            Self::PermissionsGet {} => "permissions.get",
            Self::PermissionsSet(_) => "permissions.set",
        }
    }
}

/// The response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeResponse {
    /// Always [`KERNEL_SOURCE`].
    pub source: String,
    /// The request's id.
    pub id: Value,
    /// Whether the action succeeded.
    pub ok: bool,
    /// Action result, omitted for actions that return nothing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BridgeResponse {
    /// A successful response. A `null` result is omitted.
    #[must_use]
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            source: KERNEL_SOURCE.to_string(),
            id,
            ok: true,
            result: (!result.is_null()).then_some(result),
            error: None,
        }
    }

    /// A failed response.
    #[must_use]
    pub fn failure(id: Value, error: impl std::fmt::Display) -> Self {
        Self {
            source: KERNEL_SOURCE.to_string(),
            id,
            ok: false,
            result: None,
            error: Some(error.to_string()),
        }
    }
}

/// Answers bridge requests against a kernel's current façade.
#[derive(Debug, Clone)]
pub struct Bridge {
    kernel: Arc<Kernel>,
    origin: String,
}

impl Bridge {
    /// Create a bridge that only answers messages from `origin`.
    #[must_use]
    pub fn new(kernel: Arc<Kernel>, origin: impl Into<String>) -> Self {
        Self {
            kernel,
            origin: origin.into(),
        }
    }

    /// The origin this bridge accepts.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Handle one incoming message.
    ///
    /// Returns `None` when the message is not addressed to this bridge
    /// (foreign origin, or a `source` other than [`BRIDGE_SOURCE`]).
    /// Every other message gets a response, including malformed ones.
    pub async fn handle(&self, origin: &str, message: &Value) -> Option<BridgeResponse> {
        if origin != self.origin {
            debug!(origin, expected = %self.origin, "Ignoring message from foreign origin");
            return None;
        }
        if message.get("source").and_then(Value::as_str) != Some(BRIDGE_SOURCE) {
            return None;
        }

        let id = message.get("id").cloned().unwrap_or(Value::Null);
        let result = match BridgeRequest::deserialize(message) {
            Ok(request) => match request.action() {
                Ok(action) => self.dispatch(action).await,
                Err(e) => Err(e),
            },
            Err(e) => Err(KernelError::InvalidRequest(format!("Malformed request: {e}"))),
        };

        Some(match result {
            Ok(value) => BridgeResponse::success(id, value),
            Err(e) => {
                if e.kind() == aussie_core::ErrorKind::PermissionDenied {
                    warn!(error = %e, "Bridge request denied");
                } else {
                    debug!(error = %e, "Bridge request failed");
                }
                BridgeResponse::failure(id, e)
            },
        })
    }

    async fn dispatch(&self, action: BridgeAction) -> KernelResult<Value> {
        trace!(action = action.name(), "Dispatching bridge action");
        let facade = self.kernel.facade();
        match action {
            BridgeAction::FsRead { path } => facade.read_file(&path).map(Value::String),
            BridgeAction::FsWrite {
                path,
                content,
                append,
            } => facade
                .write_file(&path, &content, append)
                .map(|()| Value::Null),
            BridgeAction::FsList { path } => encode(&facade.read_dir(&path)?),
            BridgeAction::FsMkdir { path } => facade.mkdir(&path).map(|()| Value::Null),
            BridgeAction::FsDelete { path } => facade.delete(&path).map(|()| Value::Null),
            BridgeAction::FsMove { old_path, new_path } => facade
                .move_path(&old_path, &new_path)
                .map(|()| Value::Null),
            BridgeAction::WindowsOpen {
                app_id,
                title,
                props,
            } => encode(&facade.open_window(&app_id, &title, props)),
            BridgeAction::WindowsClose { id } => facade.close_window(&id).map(|()| Value::Null),
            BridgeAction::WindowsFocus { id } => facade.focus_window(&id).map(|()| Value::Null),
            BridgeAction::WindowsList {} => encode(&facade.list_windows()),
            BridgeAction::ShellExec { command } => encode(&facade.exec_shell(&command).await?),
            BridgeAction::PermissionsGet {} => encode(facade.policy()),
            BridgeAction::PermissionsSet(patch) => {
                if facade.policy().sandboxed {
                    return Err(KernelError::denied("permissions.set", "sandboxed=false"));
                }
                encode(&self.kernel.set_permissions(&patch))
            },
        }
    }
}

fn encode<T: Serialize + ?Sized>(value: &T) -> KernelResult<Value> {
    serde_json::to_value(value).map_err(|e| KernelError::Encode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use aussie_test::{RecordingExecutor, TestCore};
    use serde_json::json;

    use super::*;
    use crate::facade::tests::services_from;
    use crate::policy::CapabilityPolicy;

    const ORIGIN: &str = "https://os.local";

    fn bridge_with(core: &TestCore, policy: CapabilityPolicy) -> Bridge {
        Bridge::new(Arc::new(Kernel::new(services_from(core), policy)), ORIGIN)
    }

    async fn call(bridge: &Bridge, id: u64, action: &str, payload: Value) -> BridgeResponse {
        bridge
            .handle(
                ORIGIN,
                &json!({ "source": BRIDGE_SOURCE, "id": id, "action": action, "payload": payload }),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_foreign_messages_are_ignored() {
        let core = TestCore::new().await;
        let bridge = bridge_with(&core, CapabilityPolicy::default());
        let msg = json!({ "source": BRIDGE_SOURCE, "id": 1, "action": "windows.list" });

        assert!(bridge.handle("https://evil.example", &msg).await.is_none());
        let other_source = json!({ "source": "devtools", "id": 1, "action": "windows.list" });
        assert!(bridge.handle(ORIGIN, &other_source).await.is_none());
        assert!(bridge.handle(ORIGIN, &json!("ping")).await.is_none());
    }

    #[tokio::test]
    async fn test_fs_round_trip() {
        let core = TestCore::new().await;
        let bridge = bridge_with(&core, CapabilityPolicy::default());

        let res = call(&bridge, 1, "fs.write", json!({"path": "/a/b.txt", "content": "hi"})).await;
        assert!(res.ok);
        assert_eq!(res.result, None);

        let res = call(&bridge, 2, "fs.read", json!({"path": "/a/b.txt"})).await;
        assert_eq!(res.result, Some(json!("hi")));
        assert_eq!(res.id, json!(2));

        let res = call(&bridge, 3, "fs.list", json!({"path": "/a"})).await;
        let entries = res.result.unwrap();
        assert_eq!(entries[0]["name"], "b.txt");
        assert_eq!(entries[0]["size"], 2);
        assert_eq!(entries[0]["kind"], "file");
    }

    #[tokio::test]
    async fn test_fs_move_accepts_both_field_spellings() {
        let core = TestCore::new().await;
        let bridge = bridge_with(&core, CapabilityPolicy::default());
        core.fs.write_file("/one.txt", "1", false).unwrap();

        let res = call(&bridge, 1, "fs.move", json!({"oldPath": "/one.txt", "newPath": "/two.txt"})).await;
        assert!(res.ok, "{res:?}");
        let res = call(&bridge, 2, "fs.move", json!({"from": "/two.txt", "to": "/three.txt"})).await;
        assert!(res.ok, "{res:?}");
        assert_eq!(core.fs.read_file("/three.txt").unwrap(), "1");
    }

    #[tokio::test]
    async fn test_fs_errors_are_responses() {
        let core = TestCore::new().await;
        let bridge = bridge_with(&core, CapabilityPolicy::default());
        let res = call(&bridge, 9, "fs.read", json!({"path": "/nope"})).await;
        assert!(!res.ok);
        assert_eq!(res.id, json!(9));
        assert_eq!(res.error.as_deref(), Some("No such file or directory: /nope"));
    }

    #[tokio::test]
    async fn test_windows_single_instance() {
        let core = TestCore::new().await;
        let bridge = bridge_with(&core, CapabilityPolicy::default());

        let first = call(&bridge, 1, "windows.open", json!({"appId": "chat", "title": "Chat"})).await;
        let second = call(&bridge, 2, "windows.open", json!({"appId": "chat", "title": "Chat"})).await;
        let first = first.result.unwrap();
        let second = second.result.unwrap();
        assert_eq!(first["id"], second["id"]);
        assert!(second["zIndex"].as_u64() > first["zIndex"].as_u64());

        let list = call(&bridge, 3, "windows.list", Value::Null).await;
        assert_eq!(list.result.unwrap().as_array().unwrap().len(), 1);

        let id = first["id"].as_str().unwrap();
        assert!(call(&bridge, 4, "windows.focus", json!({"id": id})).await.ok);
        assert!(call(&bridge, 5, "windows.close", json!({"id": id})).await.ok);
        assert!(core.windows.list_windows().is_empty());
    }

    #[tokio::test]
    async fn test_permission_change_over_bridge() {
        let core = TestCore::new().await;
        let bridge = bridge_with(&core, CapabilityPolicy::default());

        let res = call(&bridge, 1, "permissions.set", json!({"fs": "read"})).await;
        assert_eq!(res.result.unwrap()["fs"], "read");

        let res = call(&bridge, 2, "fs.write", json!({"path": "/x", "content": "y"})).await;
        assert!(!res.ok);
        assert_eq!(
            res.error.as_deref(),
            Some("Permission denied: fs.write requires fs=readwrite")
        );

        let res = call(&bridge, 3, "permissions.get", json!({})).await;
        assert_eq!(res.result.unwrap()["fs"], "read");
    }

    #[tokio::test]
    async fn test_sandboxed_policy_is_frozen_for_bridge() {
        let core = TestCore::new().await;
        let bridge = bridge_with(&core, CapabilityPolicy::default());

        assert!(call(&bridge, 1, "permissions.set", json!({"sandboxed": true})).await.ok);
        let res = call(&bridge, 2, "permissions.set", json!({"sandboxed": false})).await;
        assert!(!res.ok);
        assert!(res.error.unwrap().contains("permissions.set"));
        assert!(call(&bridge, 3, "permissions.get", Value::Null).await.ok);
    }

    #[tokio::test]
    async fn test_shell_exec_result_shape() {
        let core = TestCore::with_executor(RecordingExecutor::new().with_exit("false", 1, "no")).await;
        let bridge = bridge_with(&core, CapabilityPolicy::default());

        let res = call(&bridge, 1, "shell.exec", json!({"command": "echo hi"})).await;
        assert_eq!(
            res.result,
            Some(json!({"stdout": "echo hi", "stderr": "", "exitCode": 0}))
        );
        let res = call(&bridge, 2, "shell.exec", json!({"command": "false"})).await;
        assert!(res.ok);
        assert_eq!(res.result.unwrap()["exitCode"], 1);
    }

    #[tokio::test]
    async fn test_bad_requests_keep_id() {
        let core = TestCore::new().await;
        let bridge = bridge_with(&core, CapabilityPolicy::default());

        let res = call(&bridge, 7, "fs.format", json!({})).await;
        assert!(!res.ok);
        assert_eq!(res.error.as_deref(), Some("Unknown action: fs.format"));

        let res = call(&bridge, 8, "fs.read", json!({"file": "/a"})).await;
        assert_eq!(res.id, json!(8));
        assert!(res.error.unwrap().starts_with("Invalid request for action 'fs.read'"));

        let res = bridge
            .handle(ORIGIN, &json!({"source": BRIDGE_SOURCE, "id": "abc"}))
            .await
            .unwrap();
        assert_eq!(res.id, json!("abc"));
        assert!(res.error.unwrap().starts_with("Malformed request"));
    }

    #[test]
    fn test_every_action_name_resolves() {
        let payloads = [
            json!({"path": "/a"}),
            json!({"path": "/a", "content": "x"}),
            json!({"path": "/"}),
            json!({"path": "/a"}),
            json!({"path": "/a"}),
            json!({"oldPath": "/a", "newPath": "/b"}),
            json!({"appId": "x", "title": "X"}),
            json!({"id": "w"}),
            json!({"id": "w"}),
            Value::Null,
            json!({"command": "ls"}),
            Value::Null,
            json!({"fs": "none"}),
        ];
        for (name, payload) in BridgeAction::NAMES.iter().zip(payloads) {
            let request = BridgeRequest {
                source: BRIDGE_SOURCE.into(),
                id: json!(1),
                action: (*name).to_string(),
                payload,
            };
            let action = request.action().unwrap();
            assert_eq!(action.name(), *name);
            assert_eq!(serde_json::to_value(&action).unwrap()["action"], *name);
        }
        let unique: std::collections::HashSet<_> = BridgeAction::NAMES.iter().collect();
        assert_eq!(unique.len(), BridgeAction::NAMES.len());
    }

    #[test]
    fn test_response_wire_format() {
        let ok = serde_json::to_value(BridgeResponse::success(json!(1), Value::Null)).unwrap();
        assert_eq!(ok, json!({"source": "aussie-kernel", "id": 1, "ok": true}));

        let err = serde_json::to_value(BridgeResponse::failure(json!(2), "nope")).unwrap();
        assert_eq!(
            err,
            json!({"source": "aussie-kernel", "id": 2, "ok": false, "error": "nope"})
        );
    }
}
