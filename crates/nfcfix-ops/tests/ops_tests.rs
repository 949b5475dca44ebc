use nfcfix_core::{ItemKind, NormalizeConfig, RunStats};
use nfcfix_ops::{
    ExecuteOptions, ExecutionReport, LedgerDocument, OutcomeStatus, RenameExecutor, hash_file,
};
use nfcfix_scan::{Collection, Collector};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const CAFE_NFC: &str = "caf\u{e9}.txt";
const CAFE_NFD: &str = "cafe\u{301}.txt";

fn collect(root: &Path) -> Collection {
    Collector::new().collect(&NormalizeConfig::new(root)).unwrap()
}

fn run(root: &Path, options: ExecuteOptions) -> (Collection, ExecutionReport) {
    let collection = collect(root);
    let report = RenameExecutor::new(options).execute(&collection.plan);
    (collection, report)
}

fn names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn create_conflict(root: &Path) {
    fs::write(root.join(CAFE_NFC), "composed").unwrap();
    fs::write(root.join(CAFE_NFD), "decomposed").unwrap();
}

#[test]
fn test_conflict_is_disambiguated() {
    let temp = TempDir::new().unwrap();
    create_conflict(temp.path());

    let (collection, report) = run(temp.path(), ExecuteOptions::default());

    assert_eq!(collection.plan.len(), 1);
    assert!(report.is_success());
    assert_eq!(report.stats.renamed_success, 1);
    assert_eq!(report.stats.skipped_exists, 1);
    assert!(report.outcomes[0].disambiguated);

    let root = &collection.root;
    assert_eq!(names(root), vec![CAFE_NFC.to_string(), "caf\u{e9}_nfc1.txt".to_string()]);
    assert_eq!(fs::read_to_string(root.join(CAFE_NFC)).unwrap(), "composed");
    assert_eq!(
        fs::read_to_string(root.join("caf\u{e9}_nfc1.txt")).unwrap(),
        "decomposed"
    );
}

#[test]
fn test_force_overwrites_existing_target() {
    let temp = TempDir::new().unwrap();
    create_conflict(temp.path());

    let options = ExecuteOptions {
        force: true,
        ..Default::default()
    };
    let (collection, report) = run(temp.path(), options);

    assert!(report.is_success());
    assert_eq!(report.stats.skipped_exists, 0);
    assert!(!report.outcomes[0].disambiguated);
    assert_eq!(names(&collection.root), vec![CAFE_NFC.to_string()]);
    assert_eq!(fs::read_to_string(collection.root.join(CAFE_NFC)).unwrap(), "decomposed");
}

#[cfg(unix)]
fn create_hard_linked_pair(root: &Path) {
    fs::write(root.join(CAFE_NFC), "shared").unwrap();
    fs::hard_link(root.join(CAFE_NFC), root.join(CAFE_NFD)).unwrap();
}

#[cfg(unix)]
#[test]
fn test_hard_linked_target_is_a_conflict() {
    let temp = TempDir::new().unwrap();
    create_hard_linked_pair(temp.path());

    let options = ExecuteOptions {
        backup: true,
        ..Default::default()
    };
    let (collection, report) = run(temp.path(), options);
    let root = &collection.root;

    assert!(report.is_success());
    assert_eq!(report.stats.renamed_success, 1);
    assert_eq!(report.stats.skipped_exists, 1);
    assert!(report.outcomes[0].disambiguated);
    assert!(!root.join(CAFE_NFD).exists());
    assert_eq!(names(root), vec![CAFE_NFC.to_string(), "caf\u{e9}_nfc1.txt".to_string()]);

    assert_eq!(report.ledger.len(), 1);
    assert_eq!(report.ledger.entries()[0].new_path, root.join("caf\u{e9}_nfc1.txt"));
}

#[cfg(unix)]
#[test]
fn test_force_over_hard_linked_target_drops_decomposed_name() {
    let temp = TempDir::new().unwrap();
    create_hard_linked_pair(temp.path());

    let options = ExecuteOptions {
        force: true,
        ..Default::default()
    };
    let (collection, report) = run(temp.path(), options);

    assert!(report.is_success());
    assert_eq!(report.stats.renamed_success, 1);
    assert_eq!(names(&collection.root), vec![CAFE_NFC.to_string()]);
    assert_eq!(fs::read_to_string(collection.root.join(CAFE_NFC)).unwrap(), "shared");
}

#[test]
fn test_nested_directories_are_renamed_bottom_up() {
    let temp = TempDir::new().unwrap();
    let deep = temp.path().join("a\u{301}").join("o\u{308}");
    fs::create_dir_all(&deep).unwrap();
    fs::write(deep.join("u\u{308}.txt"), "deep").unwrap();

    let (collection, report) = run(temp.path(), ExecuteOptions::default());

    assert!(report.is_success());
    assert_eq!(report.stats.renamed_success, 3);

    let renamed = collection.root.join("\u{e1}").join("\u{f6}").join("\u{fc}.txt");
    assert_eq!(fs::read_to_string(renamed).unwrap(), "deep");

    // Descendants come before their ancestors.
    let kinds: Vec<ItemKind> = report.outcomes.iter().map(|o| o.kind).collect();
    assert_eq!(
        kinds,
        vec![ItemKind::File, ItemKind::Directory, ItemKind::Directory]
    );
    assert!(report.outcomes[1].source.starts_with(&report.outcomes[2].source));

    // A second pass finds nothing left to do.
    assert!(collect(temp.path()).plan.is_empty());
}

#[test]
fn test_dry_run_mutates_nothing() {
    let temp = TempDir::new().unwrap();
    create_conflict(temp.path());
    let dir = temp.path().join("\u{110b}\u{1161}");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("n\u{303}.txt"), "").unwrap();

    let before = names(temp.path());
    let options = ExecuteOptions {
        dry_run: true,
        backup: true,
        ..Default::default()
    };
    let (collection, report) = run(temp.path(), options);

    assert_eq!(names(temp.path()), before);
    assert_eq!(names(&dir), vec!["n\u{303}.txt".to_string()]);

    assert!(report.is_success());
    assert!(report.ledger.is_empty());
    assert_eq!(report.stats.renamed_success, 0);
    assert_eq!(report.stats.renamed_failed, 0);
    assert_eq!(report.stats.skipped_exists, 1);
    assert_eq!(
        report.with_status(OutcomeStatus::Planned).count(),
        collection.plan.len()
    );

    // Scanning again yields the same statistics.
    assert_eq!(collect(temp.path()).stats, collection.stats);
}

#[test]
fn test_backup_ledger_matches_renamed_files() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(CAFE_NFD), "latte").unwrap();
    fs::write(temp.path().join("\u{1112}\u{1161}\u{11ab}.md"), "hangul").unwrap();
    fs::create_dir(temp.path().join("o\u{308}")).unwrap();

    let options = ExecuteOptions {
        backup: true,
        ..Default::default()
    };
    let (collection, report) = run(temp.path(), options);
    assert!(report.is_success());
    assert_eq!(report.ledger.len(), 3);

    let mut stats = RunStats::new();
    stats.merge(&collection.stats);
    stats.merge(&report.stats);

    let ledger_path = report
        .ledger
        .finalize(&collection.root, &stats)
        .unwrap()
        .unwrap();
    assert!(ledger_path.starts_with(&collection.root));

    let document = LedgerDocument::load(&ledger_path).unwrap();
    assert_eq!(document.mappings.len(), 3);
    assert_eq!(document.stats.renamed_success, 3);
    assert_eq!(document.stats.needs_normalization, 3);

    for entry in &document.mappings {
        assert!(!entry.original_path.exists());
        if entry.new_path.is_dir() {
            assert!(entry.file_hash.is_none());
        } else {
            let hash = hash_file(&entry.new_path).unwrap().to_hex();
            assert_eq!(entry.file_hash.as_deref(), Some(hash.as_str()));
        }
    }
}

#[test]
fn test_failed_rename_does_not_stop_run() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(CAFE_NFD), "").unwrap();
    fs::write(temp.path().join("n\u{303}.txt"), "").unwrap();

    let collection = collect(temp.path());
    assert_eq!(collection.plan.len(), 2);

    // The entry disappears between collection and execution.
    fs::remove_file(collection.root.join(CAFE_NFD)).unwrap();

    let report = RenameExecutor::new(ExecuteOptions::default()).execute(&collection.plan);

    assert!(!report.is_success());
    assert_eq!(report.stats.renamed_success, 1);
    assert_eq!(report.stats.renamed_failed, 1);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].path.ends_with(CAFE_NFD));
    assert!(collection.root.join("\u{f1}.txt").exists());
}
