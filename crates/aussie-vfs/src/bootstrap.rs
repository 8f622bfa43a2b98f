//! The default tree for a fresh store.
//!
//! ```text
//! /
//! ├── home/<user>/Desktop/
//! │   ├── Chat.shortcut
//! │   ├── Files.shortcut
//! │   └── Terminal.shortcut
//! └── workspace/
//! ```

use aussie_core::Millis;

use crate::node::FsNode;

/// Apps pinned to the desktop as `(file stem, app id)`.
const DESKTOP_SHORTCUTS: &[(&str, &str)] = &[
    ("Terminal", "terminal"),
    ("Files", "files"),
    ("Chat", "chat"),
];

/// Body of a `.shortcut` file: the app it launches and its window title.
#[must_use]
pub fn shortcut_content(app_id: &str, title: &str) -> String {
    serde_json::json!({ "appId": app_id, "title": title }).to_string()
}

/// Build the bootstrap tree for `user`.
///
/// `user` is used as a single path segment; callers are expected to have
/// validated it.
#[must_use]
pub fn default_tree(user: &str, now: Millis) -> FsNode {
    let mut desktop = FsNode::directory("Desktop", now);
    for (stem, app_id) in DESKTOP_SHORTCUTS {
        let file = FsNode::file(
            format!("{stem}.shortcut"),
            shortcut_content(app_id, stem),
            now,
        );
        // `desktop` is a directory, insert cannot fail.
        let _ = desktop.insert_child(file);
    }

    let mut home_dir = FsNode::directory(user, now);
    let _ = home_dir.insert_child(desktop);

    let mut home = FsNode::directory("home", now);
    let _ = home.insert_child(home_dir);

    let mut root = FsNode::directory("", now);
    let _ = root.insert_child(home);
    let _ = root.insert_child(FsNode::directory("workspace", now));
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;

    #[test]
    fn test_default_tree_layout() {
        let root = default_tree("guest", 7);
        let children = root.children().unwrap();
        assert_eq!(
            children.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["home", "workspace"]
        );

        let desktop = &children["home"].children().unwrap()["guest"]
            .children()
            .unwrap()["Desktop"];
        assert_eq!(desktop.kind(), NodeKind::Directory);
        assert_eq!(desktop.children().unwrap().len(), 3);

        let terminal = &desktop.children().unwrap()["Terminal.shortcut"];
        let body: serde_json::Value = serde_json::from_str(terminal.content().unwrap()).unwrap();
        assert_eq!(body["appId"], "terminal");
        assert_eq!(body["title"], "Terminal");
        assert_eq!(terminal.last_modified(), 7);
    }
}
