use std::fs;

use relist::classifier::format_line;
use relist::{
    reconcile, Adapter, AdapterRegistry, ColumnValue, Diff, EntryId, EntryMeta, EntryType,
    LocalAdapter, NameCase, ParseErrorKind, ReconcileBuilder, Snapshot, SnapshotCache,
};

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

const URL: &str = "file:///project/";

fn meta(mode: u32, size: u64) -> EntryMeta {
    EntryMeta::default()
        .with_attribute("permissions", ColumnValue::Mode(mode))
        .with_attribute("size", ColumnValue::Size(size))
        .with_attribute("mtime", ColumnValue::Timestamp(1_700_000_040))
}

/// Snapshot of:
/// ```
/// project/
///   .env
///   README.md
///   agent.sock      (socket)
///   latest -> releases/v2
///   src/
/// ```
struct Fixture {
    snapshot: Snapshot,
    readme:   EntryId,
    src:      EntryId,
    latest:   EntryId,
    sock:     EntryId,
    env:      EntryId,
}

fn fixture() -> Fixture {
    let mut snapshot = Snapshot::new();
    let readme = snapshot.store_entry(URL, "README.md", EntryType::File, Some(meta(0o644, 1_234)));
    let src = snapshot.store_entry(URL, "src", EntryType::Directory, Some(meta(0o755, 4_096)));
    let latest = snapshot.store_entry(
        URL,
        "latest",
        EntryType::Link,
        Some(meta(0o777, 11).with_link("releases/v2")),
    );
    let sock = snapshot.store_entry(
        URL,
        "agent.sock",
        EntryType::Other("socket".into()),
        Some(meta(0o600, 0)),
    );
    let env = snapshot.store_entry(URL, ".env", EntryType::File, Some(meta(0o600, 42)));
    Fixture { snapshot, readme, src, latest, sock, env }
}

/// Render the visible children of `url` the way an editor would show them.
fn render(snapshot: &Snapshot, url: &str) -> Vec<String> {
    let columns = LocalAdapter.supported_columns();
    snapshot
        .list_children(url)
        .into_iter()
        .filter(|e| !e.name.starts_with('.'))
        .map(|e| format_line(e, &columns))
        .collect()
}

fn engine() -> ReconcileBuilder {
    reconcile().name_case(NameCase::Sensitive)
}

fn line_for(lines: &[String], id: EntryId) -> usize {
    let marker = format!("/{id} ");
    lines
        .iter()
        .position(|l| l.starts_with(&marker))
        .expect("rendered line for id")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn unmodified_listing_is_clean() {
    let fx = fixture();
    let lines = render(&fx.snapshot, URL);
    assert_eq!(lines.len(), 4, "dotfile is not rendered");

    let result = engine().run(&fx.snapshot, URL, &lines);

    assert!(result.is_clean(), "diffs: {:?}, errors: {:?}", result.diffs, result.errors);
    assert_eq!(result.stats.lines, 4);
}

#[test]
fn removed_lines_become_deletes() {
    let fx = fixture();
    let mut lines = render(&fx.snapshot, URL);
    lines.remove(line_for(&lines, fx.src));

    let result = engine().run(&fx.snapshot, URL, &lines);

    assert!(result.errors.is_empty());
    assert_eq!(result.diffs, vec![Diff::Delete { name: "src".into(), id: fx.src }]);
}

#[test]
fn rename_places_same_identity_and_deletes_old_name() {
    let fx = fixture();
    let mut lines = render(&fx.snapshot, URL);
    let i = line_for(&lines, fx.readme);
    lines[i] = lines[i].replace("README.md", "README.txt");

    let result = engine().run(&fx.snapshot, URL, &lines);

    assert!(result.errors.is_empty());
    assert_eq!(
        result.diffs,
        vec![
            Diff::Create {
                name: "README.txt".into(),
                entry_type: EntryType::File,
                id: Some(fx.readme),
                link_target: None,
            },
            Diff::Delete { name: "README.md".into(), id: fx.readme },
        ]
    );
}

#[test]
fn duplicated_line_is_a_copy_and_flagged() {
    let fx = fixture();
    let mut lines = render(&fx.snapshot, URL);
    let i = line_for(&lines, fx.readme);
    lines.push(lines[i].clone());

    let result = engine().run(&fx.snapshot, URL, &lines);

    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].kind, ParseErrorKind::DuplicateFilename);
    assert_eq!(result.errors[0].lnum, lines.len() - 1);
    assert_eq!(result.errors[0].col, 0);
    // The second line still produces its diff; refusing to apply is the caller's call.
    assert_eq!(
        result.diffs,
        vec![Diff::Create {
            name: "README.md".into(),
            entry_type: EntryType::File,
            id: Some(fx.readme),
            link_target: None,
        }]
    );
}

#[test]
fn duplicate_between_new_and_existing_lines() {
    let fx = fixture();
    let mut lines = render(&fx.snapshot, URL);
    lines.insert(0, "src/".to_string());

    let result = engine().run(&fx.snapshot, URL, &lines);

    let dupes: Vec<usize> = result
        .errors
        .iter()
        .filter(|e| e.kind == ParseErrorKind::DuplicateFilename)
        .map(|e| e.lnum)
        .collect();
    assert_eq!(dupes, vec![line_for(&lines, fx.src)]);
}

#[test]
fn duplicates_fold_case_when_insensitive() {
    let snapshot = Snapshot::new();
    let lines = ["Notes.md", "notes.MD"];

    let sensitive = reconcile().name_case(NameCase::Sensitive).run(&snapshot, URL, lines);
    assert!(sensitive.errors.is_empty());

    let insensitive = reconcile().name_case(NameCase::Insensitive).run(&snapshot, URL, lines);
    assert_eq!(insensitive.errors.len(), 1);
    assert_eq!(insensitive.errors[0].lnum, 1);
    assert_eq!(insensitive.diffs.len(), 2);
}

#[test]
fn link_target_change_recreates_link_in_place() {
    let fx = fixture();
    let mut lines = render(&fx.snapshot, URL);
    let i = line_for(&lines, fx.latest);
    lines[i] = lines[i].replace("releases/v2", "releases/v3");

    let result = engine().run(&fx.snapshot, URL, &lines);

    assert!(result.errors.is_empty());
    assert_eq!(
        result.diffs,
        vec![Diff::Create {
            name: "latest".into(),
            entry_type: EntryType::Link,
            id: Some(fx.latest),
            link_target: Some("releases/v3".into()),
        }]
    );
}

#[test]
fn link_line_without_arrow_has_no_filename() {
    let fx = fixture();
    let mut lines = render(&fx.snapshot, URL);
    let i = line_for(&lines, fx.latest);
    lines[i] = lines[i].replace(" -> releases/v2", "");

    let result = engine().run(&fx.snapshot, URL, &lines);

    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].kind, ParseErrorKind::MissingFilename);
    assert_eq!(result.errors[0].lnum, i);
    // Unclaimed, so the link is scheduled for deletion.
    assert_eq!(result.diffs, vec![Diff::Delete { name: "latest".into(), id: fx.latest }]);
}

#[test]
fn malformed_identifier_is_one_error_and_no_diffs() {
    let fx = fixture();
    let mut lines = render(&fx.snapshot, URL);
    lines.push("/abc some text".to_string());

    let result = engine().run(&fx.snapshot, URL, &lines);

    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].kind, ParseErrorKind::MalformedIdentifier);
    assert_eq!(result.errors[0].message(), "Malformed ID at start of line");
    assert!(result.diffs.is_empty());
}

#[test]
fn permission_edit_is_a_single_change() {
    let fx = fixture();
    let mut lines = render(&fx.snapshot, URL);
    let i = line_for(&lines, fx.readme);
    assert!(lines[i].contains("rw-r--r--"));
    lines[i] = lines[i].replace("rw-r--r--", "rwxr-xr-x");

    let result = engine().run(&fx.snapshot, URL, &lines);

    assert!(result.errors.is_empty());
    assert_eq!(
        result.diffs,
        vec![Diff::Change {
            name: "README.md".into(),
            entry_type: EntryType::File,
            column: "permissions".into(),
            value: ColumnValue::Mode(0o755),
        }]
    );
    assert_eq!(result.stats.changes, 1);
}

#[test]
fn read_only_column_edits_are_ignored() {
    let fx = fixture();
    let mut lines = render(&fx.snapshot, URL);
    let i = line_for(&lines, fx.readme);
    lines[i] = lines[i].replace("1.2K", "9.9G");

    let result = engine().run(&fx.snapshot, URL, &lines);

    assert!(result.is_clean());
}

#[test]
fn broken_column_names_the_column() {
    let fx = fixture();
    let lines = vec![format!("/{} rwx README.md", fx.readme)];

    let result = engine().run(&fx.snapshot, URL, &lines);

    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].message(), "Parsing permissions failed");
    // The failed line claims nothing.
    assert_eq!(result.stats.deletes, 4);
    assert_eq!(result.stats.creates, 0);
}

#[test]
fn whitespace_lines_are_noops() {
    let fx = fixture();
    let mut lines = render(&fx.snapshot, URL);
    lines.insert(1, String::new());
    lines.insert(2, "   \t ".to_string());

    let result = engine().run(&fx.snapshot, URL, &lines);

    assert!(result.is_clean(), "diffs: {:?}, errors: {:?}", result.diffs, result.errors);
}

#[test]
fn indented_bare_separator_is_rejected() {
    let snapshot = Snapshot::new();

    let result = engine().run(&snapshot, URL, ["  /", "\t//", " / "]);

    let kinds: Vec<(usize, ParseErrorKind)> =
        result.errors.iter().map(|e| (e.lnum, e.kind.clone())).collect();
    assert_eq!(
        kinds,
        vec![
            (0, ParseErrorKind::LeadingSeparatorInPath),
            (1, ParseErrorKind::LeadingSeparatorInPath),
            (2, ParseErrorKind::LeadingSeparatorInPath),
        ]
    );
    assert!(result.diffs.is_empty());
}

#[test]
fn new_lines_create_files_directories_and_links() {
    let snapshot = Snapshot::new();
    let lines = ["main.rs", "  assets/ ", "current -> builds/42", "nested/dir/file.txt"];

    let result = engine().run(&snapshot, URL, lines);

    assert!(result.errors.is_empty());
    assert_eq!(
        result.diffs,
        vec![
            Diff::Create { name: "main.rs".into(), entry_type: EntryType::File, id: None, link_target: None },
            Diff::Create { name: "assets".into(), entry_type: EntryType::Directory, id: None, link_target: None },
            Diff::Create {
                name: "current".into(),
                entry_type: EntryType::Link,
                id: None,
                link_target: Some("builds/42".into()),
            },
            Diff::Create {
                name: "nested/dir/file.txt".into(),
                entry_type: EntryType::File,
                id: None,
                link_target: None,
            },
        ]
    );
}

#[test]
fn line_errors_do_not_stop_the_pass() {
    let fx = fixture();
    let mut lines = render(&fx.snapshot, URL);
    let readme = line_for(&lines, fx.readme);
    lines[readme] = lines[readme].replace("README.md", "docs/README.md");
    lines.push("/999 --------- - - ghost".to_string());
    lines.push("   /etc/passwd".to_string());
    lines.push("CHANGELOG.md".to_string());

    let result = engine().run(&fx.snapshot, URL, &lines);

    let kinds: Vec<(usize, ParseErrorKind)> =
        result.errors.iter().map(|e| (e.lnum, e.kind.clone())).collect();
    assert_eq!(
        kinds,
        vec![
            (readme, ParseErrorKind::FilenameContainsSeparator),
            (lines.len() - 3, ParseErrorKind::UnknownIdentifier),
            (lines.len() - 2, ParseErrorKind::LeadingSeparatorInPath),
        ]
    );
    assert_eq!(
        result.diffs,
        vec![
            Diff::Create { name: "CHANGELOG.md".into(), entry_type: EntryType::File, id: None, link_target: None },
            Diff::Delete { name: "README.md".into(), id: fx.readme },
        ]
    );
}

#[test]
fn trailing_separator_on_a_kept_name_changes_nothing() {
    let fx = fixture();
    let mut lines = render(&fx.snapshot, URL);
    let i = line_for(&lines, fx.readme);
    lines[i].push('/');

    let result = engine().run(&fx.snapshot, URL, &lines);

    assert!(result.is_clean(), "diffs: {:?}, errors: {:?}", result.diffs, result.errors);
}

#[test]
fn opaque_type_survives_a_rename() {
    let fx = fixture();
    let mut lines = render(&fx.snapshot, URL);
    let i = line_for(&lines, fx.sock);
    lines[i] = lines[i].replace("agent.sock", "ssh-agent.sock");

    let result = engine().run(&fx.snapshot, URL, &lines);

    assert_eq!(
        result.diffs[0],
        Diff::Create {
            name: "ssh-agent.sock".into(),
            entry_type: EntryType::Other("socket".into()),
            id: Some(fx.sock),
            link_target: None,
        }
    );
}

#[test]
fn rename_onto_deleted_name_orders_create_before_delete() {
    let fx = fixture();
    let mut lines = render(&fx.snapshot, URL);
    let src = line_for(&lines, fx.src);
    lines.remove(src);
    let readme = line_for(&lines, fx.readme);
    lines[readme] = lines[readme].replace("README.md", "src");

    let result = engine().run(&fx.snapshot, URL, &lines);

    assert!(result.errors.is_empty());
    assert_eq!(
        result.diffs,
        vec![
            Diff::Create { name: "src".into(), entry_type: EntryType::File, id: Some(fx.readme), link_target: None },
            Diff::Delete { name: "README.md".into(), id: fx.readme },
            Diff::Delete { name: "src".into(), id: fx.src },
        ]
    );
}

#[test]
fn hidden_entries_are_only_deleted_when_shown() {
    let fx = fixture();
    let lines = render(&fx.snapshot, URL);

    let hidden = engine().run(&fx.snapshot, URL, &lines);
    assert!(hidden.is_clean());

    let shown = engine().show_hidden(true).run(&fx.snapshot, URL, &lines);
    assert_eq!(shown.diffs, vec![Diff::Delete { name: ".env".into(), id: fx.env }]);
}

#[test]
fn missing_adapter_is_fatal() {
    let fx = fixture();
    let lines = render(&fx.snapshot, URL);

    let result = reconcile()
        .registry(AdapterRegistry::new())
        .run(&fx.snapshot, URL, &lines);

    assert!(result.diffs.is_empty());
    assert_eq!(result.errors.len(), 1);
    assert!(result.has_fatal());
    assert_eq!(result.errors[0].message(), format!("Cannot parse buffer '{URL}': No adapter"));
}

#[test]
fn diffs_serialize_for_an_apply_stage() {
    let diff = Diff::Create {
        name: "latest".into(),
        entry_type: EntryType::Link,
        id: Some(7),
        link_target: Some("v3".into()),
    };

    assert_eq!(diff.name(), "latest");
    assert_eq!(diff.id(), Some(7));

    let json = serde_json::to_value(&diff).unwrap();
    assert_eq!(json["type"], "new");
    assert_eq!(json["entry_type"], "link");
    assert_eq!(json["id"], 7);

    let back: Diff = serde_json::from_value(json).unwrap();
    assert_eq!(back, diff);
}

// ---------------------------------------------------------------------------
// Local disk
// ---------------------------------------------------------------------------

/// Create a temporary directory tree for testing.
///
/// Structure:
/// ```
/// tmp/
///   a.txt
///   b.txt
///   sub/
/// ```
fn setup_test_dir() -> (tempfile::TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    fs::write(root.join("a.txt"), "alpha").unwrap();
    fs::write(root.join("b.txt"), "bravo").unwrap();
    fs::create_dir(root.join("sub")).unwrap();

    let url = format!("file://{}/", root.display());
    (dir, url)
}

#[test]
fn local_listing_round_trips_clean() {
    let (_dir, url) = setup_test_dir();
    let registry = AdapterRegistry::with_local();
    let mut snapshot = Snapshot::new();

    assert_eq!(registry.refresh(&mut snapshot, &url).unwrap(), 3);
    let lines = render(&snapshot, &url);

    let result = engine().run(&snapshot, &url, &lines);
    assert!(result.is_clean(), "diffs: {:?}, errors: {:?}", result.diffs, result.errors);
}

#[test]
fn local_edits_produce_expected_diffs() {
    let (_dir, url) = setup_test_dir();
    let mut snapshot = Snapshot::new();
    AdapterRegistry::with_local().refresh(&mut snapshot, &url).unwrap();

    let a = snapshot.entry_by_name(&url, "a.txt").unwrap().id;
    let b = snapshot.entry_by_name(&url, "b.txt").unwrap().id;

    let mut lines: Vec<String> = render(&snapshot, &url)
        .into_iter()
        .filter(|l| !l.ends_with("b.txt"))
        .map(|l| l.replace("a.txt", "c.txt"))
        .collect();
    lines.push("new/".to_string());

    let result = engine().run(&snapshot, &url, &lines);

    assert!(result.errors.is_empty());
    assert_eq!(
        result.diffs,
        vec![
            Diff::Create { name: "c.txt".into(), entry_type: EntryType::File, id: Some(a), link_target: None },
            Diff::Create { name: "new".into(), entry_type: EntryType::Directory, id: None, link_target: None },
            Diff::Delete { name: "a.txt".into(), id: a },
            Diff::Delete { name: "b.txt".into(), id: b },
        ]
    );
}

#[test]
fn refresh_keeps_ids_for_surviving_files() {
    let (dir, url) = setup_test_dir();
    let registry = AdapterRegistry::with_local();
    let mut snapshot = Snapshot::new();
    registry.refresh(&mut snapshot, &url).unwrap();
    let a = snapshot.entry_by_name(&url, "a.txt").unwrap().id;

    fs::remove_file(dir.path().join("b.txt")).unwrap();
    assert_eq!(registry.refresh(&mut snapshot, &url).unwrap(), 2);

    assert_eq!(snapshot.entry_by_name(&url, "a.txt").unwrap().id, a);
    assert!(snapshot.entry_by_name(&url, "b.txt").is_none());
}

#[test]
fn listing_a_missing_directory_fails() {
    let (dir, _url) = setup_test_dir();
    let missing = dir.path().join("nope");

    let err = LocalAdapter.list(&missing.to_string_lossy()).unwrap_err();
    assert!(matches!(err, relist::RelistError::NotFound(_)));
    assert!(!err.is_recoverable());
}

#[cfg(unix)]
#[test]
fn local_symlinks_and_modes() {
    use std::os::unix::fs::PermissionsExt;

    let (dir, url) = setup_test_dir();
    let root = dir.path();
    std::os::unix::fs::symlink("a.txt", root.join("ln")).unwrap();
    fs::set_permissions(root.join("a.txt"), fs::Permissions::from_mode(0o640)).unwrap();

    let mut snapshot = Snapshot::new();
    AdapterRegistry::with_local().refresh(&mut snapshot, &url).unwrap();
    let ln = snapshot.entry_by_name(&url, "ln").unwrap();
    assert_eq!(ln.entry_type, EntryType::Link);
    assert_eq!(ln.link_target(), Some("a.txt"));
    let ln = ln.id;

    let lines = render(&snapshot, &url);
    assert!(lines.iter().any(|l| l.ends_with("ln -> a.txt")));
    assert!(lines.iter().any(|l| l.contains("rw-r----- ") && l.ends_with("a.txt")));
    assert!(engine().run(&snapshot, &url, &lines).is_clean());

    let edited: Vec<String> = lines
        .iter()
        .map(|l| l.replace("ln -> a.txt", "ln -> b.txt").replace("rw-r----- ", "rw------- "))
        .collect();
    let result = engine().run(&snapshot, &url, &edited);

    assert!(result.errors.is_empty());
    assert!(result.diffs.contains(&Diff::Create {
        name: "ln".into(),
        entry_type: EntryType::Link,
        id: Some(ln),
        link_target: Some("b.txt".into()),
    }));
    assert!(result.diffs.contains(&Diff::Change {
        name: "a.txt".into(),
        entry_type: EntryType::File,
        column: "permissions".into(),
        value: ColumnValue::Mode(0o600),
    }));
    assert_eq!(result.stats.deletes, 0);
}
