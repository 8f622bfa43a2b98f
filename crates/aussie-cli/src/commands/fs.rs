//! `aussie fs` - file commands against the persisted tree.
//!
//! Everything goes through the kernel so the configured policy applies.

use anyhow::Result;
use aussie_core::Millis;
use aussie_vfs::{DirEntry, NodeKind};
use chrono::DateTime;

use crate::boot::Runtime;

/// A file operation requested on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FsCommand {
    Ls { path: String },
    Cat { path: String },
    Write { path: String, content: String, append: bool },
    Mkdir { path: String },
    Rm { path: String },
    Mv { from: String, to: String },
}

/// Run `command`, returning what to print (possibly empty).
///
/// # Errors
///
/// Propagates permission and file system errors.
pub(crate) fn run_fs(rt: &Runtime, command: FsCommand) -> Result<String> {
    let facade = rt.kernel.facade();
    let out = match command {
        FsCommand::Ls { path } => render_listing(&facade.read_dir(&path)?),
        FsCommand::Cat { path } => facade.read_file(&path)?,
        FsCommand::Write {
            path,
            content,
            append,
        } => {
            facade.write_file(&path, &content, append)?;
            String::new()
        },
        FsCommand::Mkdir { path } => {
            facade.mkdir(&path)?;
            String::new()
        },
        FsCommand::Rm { path } => {
            facade.delete(&path)?;
            String::new()
        },
        FsCommand::Mv { from, to } => {
            facade.move_path(&from, &to)?;
            String::new()
        },
    };
    Ok(out)
}

fn render_listing(entries: &[DirEntry]) -> String {
    entries
        .iter()
        .map(|entry| {
            let marker = match entry.kind {
                NodeKind::Directory => 'd',
                NodeKind::File => '-',
            };
            let name = match entry.kind {
                NodeKind::Directory => format!("{}/", entry.name),
                NodeKind::File => entry.name.clone(),
            };
            format!(
                "{marker} {:>8} {} {name}",
                entry.size,
                format_time(entry.last_modified)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn format_time(ms: Millis) -> String {
    DateTime::from_timestamp_millis(ms).map_or_else(
        || ms.to_string(),
        |t| t.format("%Y-%m-%d %H:%M").to_string(),
    )
}

#[cfg(test)]
mod tests {
    use aussie_config::Config;

    use super::*;
    use crate::boot::boot;

    async fn runtime(fs_access: &str) -> Runtime {
        let mut cfg = Config::default();
        cfg.storage.backend = "memory".to_owned();
        cfg.kernel.fs = fs_access.to_owned();
        boot(&cfg).await.unwrap()
    }

    #[tokio::test]
    async fn test_write_then_cat() {
        let rt = runtime("readwrite").await;
        run_fs(
            &rt,
            FsCommand::Write {
                path: "/tmp/a.txt".into(),
                content: "one".into(),
                append: false,
            },
        )
        .unwrap();
        run_fs(
            &rt,
            FsCommand::Write {
                path: "/tmp/a.txt".into(),
                content: "two".into(),
                append: true,
            },
        )
        .unwrap();
        let out = run_fs(&rt, FsCommand::Cat { path: "/tmp/a.txt".into() }).unwrap();
        assert_eq!(out, "onetwo");
    }

    #[tokio::test]
    async fn test_ls_marks_directories() {
        let rt = runtime("readwrite").await;
        let out = run_fs(&rt, FsCommand::Ls { path: "/".into() }).unwrap();
        assert!(out.lines().any(|l| l.starts_with('d') && l.ends_with("home/")));
    }

    #[tokio::test]
    async fn test_read_only_policy_blocks_writes() {
        let rt = runtime("read").await;
        let err = run_fs(&rt, FsCommand::Mkdir { path: "/x".into() }).unwrap_err();
        assert!(err.to_string().contains("Permission denied"));
        assert!(!rt.fs.exists("/x"));
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "1970-01-01 00:00");
    }
}
