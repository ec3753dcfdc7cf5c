use pilotdiff::presentation::writers::{all_writers, write_to_file};
use pilotdiff::{bookmark_name, AppConfig, RowState};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

fn snapshot(roles: Value, grants: Value) -> Value {
    json!({
        "tables": [
            {
                "name": "roles",
                "columns": [{"name": "role", "type": "text"}, {"name": "description", "type": "text"}],
                "primary_key": ["role"],
                "rows": roles
            },
            {
                "name": "grants",
                "columns": [
                    {"name": "role", "type": "text"},
                    {"name": "permission", "type": "text"},
                    {"name": "level", "type": "integer"}
                ],
                "primary_key": ["role", "permission"],
                "rows": grants
            }
        ],
        "print_spec": [
            {"table": 0, "column": 0, "sort_order": 0, "bookmark": 0},
            {"table": 1, "column": 0, "hidden": true, "sort_order": 0},
            {"table": 1, "column": 1, "sort_order": 1}
        ]
    })
}

fn write_fixture(dir: &Path) -> String {
    let pilot = snapshot(
        json!([["dev", "Developers (new desc)"], ["admin", "Administrators"]]),
        json!([["admin", "read", 1], ["dev", "read", 1], ["admin", "write", 2]]),
    );
    let production = snapshot(
        json!([["admin", "Administrators"], ["dev", "Developers"], ["ops", "Operators"]]),
        json!([
            ["admin", "read", 1],
            ["admin", "write", 1],
            ["ops", "read", 1],
            {"values": ["zz", "none", 0], "vanity": true}
        ]),
    );

    fs::create_dir_all(dir.join("snapshots")).unwrap();
    fs::write(dir.join("snapshots/pilot.json"), pilot.to_string()).unwrap();
    fs::write(dir.join("snapshots/production.json"), production.to_string()).unwrap();

    let config = dir.join("pilotdiff.toml");
    fs::write(
        &config,
        format!(
            r#"
[report]
title = "Access control"

[output]
dir = "{}"

[[sections]]
id = "access"
title = "Roles and grants"
pilot = "snapshots/pilot.json"
production = "snapshots/production.json"
"#,
            dir.join("out").display()
        ),
    )
    .unwrap();
    config.display().to_string()
}

#[test]
fn diff_classifies_and_sorts_every_level() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = AppConfig::load(&write_fixture(dir.path())).unwrap();
    let report = pilotdiff::run(&cfg).unwrap();

    let diffgram = &report.sections[0].diffgram;
    let roles: Vec<(Value, RowState)> = diffgram.tables[0]
        .rows
        .iter()
        .map(|r| (r.value(0).clone(), r.state))
        .collect();
    assert_eq!(
        roles,
        vec![
            (json!("admin"), RowState::Unchanged),
            (json!("dev"), RowState::Modified),
            (json!("ops"), RowState::Deleted),
        ]
    );

    let grants: Vec<(Value, Value, RowState)> = diffgram.tables[1]
        .rows
        .iter()
        .map(|r| (r.value(0).clone(), r.value(1).clone(), r.state))
        .collect();
    assert_eq!(
        grants,
        vec![
            (json!("admin"), json!("read"), RowState::Unchanged),
            (json!("admin"), json!("write"), RowState::Modified),
            (json!("dev"), json!("read"), RowState::Added),
            (json!("ops"), json!("read"), RowState::Deleted),
        ]
    );

    let s = &report.summary;
    assert_eq!(
        (s.total_added, s.total_modified, s.total_deleted, s.total_unchanged),
        (1, 2, 2, 2)
    );
    assert_eq!(s.tables_affected, 2);
}

#[test]
fn html_report_flattens_hierarchy() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = AppConfig::load(&write_fixture(dir.path())).unwrap();
    let report = pilotdiff::run(&cfg).unwrap();

    let out_dir = Path::new(&cfg.output.dir);
    let mut written = Vec::new();
    for writer in all_writers(&cfg.report.render_options()) {
        written.push(write_to_file(&*writer, &report, out_dir).unwrap());
    }
    assert_eq!(written.len(), 2);

    let html = fs::read_to_string(out_dir.join(format!("{}.html", report.report_id))).unwrap();

    let admin = bookmark_name("access", "admin");
    assert!(html.contains(&format!(
        r#"<tr class="Unchanged"><td class="Unchanged" rowspan="2"><a id="{admin}">admin</a></td>"#
    )));
    assert!(html.contains(
        r#"<td class="Modified"><span class="Deleted">Developers</span><span class="Modified">Developers (new desc)</span></td>"#
    ));
    assert!(html.contains(
        r#"<td class="Modified"><span class="Deleted">1</span><span class="Modified">2</span></td>"#
    ));
    assert!(html.contains(r#"<td class="Deleted"><span class="Deleted">Operators</span></td>"#));
    assert!(!html.contains(">none<"), "vanity row must not be rendered");
    assert_eq!(html.matches("<tr class=").count(), 4);

    let json: Value = serde_json::from_str(
        &fs::read_to_string(out_dir.join(format!("{}.json", report.report_id))).unwrap(),
    )
    .unwrap();
    assert_eq!(json["sections"][0]["id"], "access");
    assert_eq!(json["summary"]["total_changes"], 5);
}
