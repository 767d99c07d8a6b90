// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use anyhow::Result;
use kcidb_orm::*;
use serde_json::json;

fn checkout(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "git_commit_hash": "c763deac7ff932e2d61add",
        "patchset_hash": "",
        "origin": "redhat",
        "git_repository_url": "https://git.kernel.org/pub/scm/linux/kernel/git/torvalds/linux.git",
        "git_repository_branch": "master",
        "tree_name": "mainline",
        "message_id": null,
        "start_time": "2021-01-01T00:00:00Z",
        "log_url": null,
        "log_excerpt": null,
        "comment": null,
        "valid": true,
        "misc": {"pipeline_id": 1}
    })
}

#[test]
fn validate_checkouts() -> Result<()> {
    let schema = Schema::kcidb()?;
    let data = json!({"checkout": [checkout("redhat:1"), checkout("redhat:2")]});
    schema.validate(&data)?;

    let checkout_type = schema.get_type("checkout").expect("checkout type");
    assert_eq!(
        checkout_type.get_id(&checkout("redhat:1"))?,
        vec![Some("redhat:1".to_string())]
    );

    let mut invalid = checkout("redhat:3");
    invalid["origin"] = json!(null);
    assert!(!checkout_type.is_valid(&invalid));
    assert!(!schema.is_valid(&json!({"checkout": [invalid]})));
    assert!(!schema.is_valid(&json!({"checkouts": []})));
    Ok(())
}

#[cfg(feature = "arc")]
#[test]
fn shared_schema() {
    fn assert_send_sync<T: Send + Sync>(_: &T) {}
    assert_send_sync(&*SCHEMA);

    let handle = std::thread::spawn(|| {
        Pattern::parse(">*#", None, &SCHEMA)
            .map(|l| l.len())
            .unwrap_or_default()
    });
    assert_eq!(handle.join().ok(), Some(4));
}

#[test]
fn dot() -> Result<()> {
    let dot = Schema::kcidb()?.format_dot();
    assert!(dot.starts_with("digraph {\n"));
    assert!(dot.contains("checkout -> build\n"));
    assert!(dot.ends_with("}\n"));
    Ok(())
}
