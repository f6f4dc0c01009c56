//! 批处理集成测试：临时目录中构造日志，检查产物与报告

use logreader_core::{run_batch, FileSelection, KeywordSpec, ScanConfiguration, ScanError, ScanOptions, ScanOutcome};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn options(src: &Path, dest: &Path, names: &[&str]) -> ScanOptions {
    ScanOptions {
        source_dir: src.to_path_buf(),
        selection: FileSelection::Names(names.iter().map(|s| s.to_string()).collect()),
        keywords: KeywordSpec::Default,
        destination: dest.to_path_buf(),
        ..ScanOptions::default()
    }
}

fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn e2e_auth_log_failed_password() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("var");
    fs::create_dir(&src).unwrap();
    let content = "Jan 1 00:00:01 host sshd: Failed password for root\n\
                   Jan 1 00:00:02 host sshd: Accepted password for root\n";
    fs::write(src.join("auth.log"), content).unwrap();
    let dest = tmp.path().join("logs");

    let opts = ScanOptions { keyword_report: true, ..options(&src, &dest, &["auth.log"]) };
    let cfg = ScanConfiguration::build(opts).unwrap();
    let report = run_batch(&cfg).unwrap();

    assert!(!report.destination_removed);
    let outcome = report.outcomes[0].result.as_ref().unwrap();
    let ScanOutcome::Flagged { artifacts, distinct_issues, occurrences, lines } = outcome else {
        panic!("auth.log should be flagged: {outcome:?}");
    };
    assert_eq!((*lines, *distinct_issues, *occurrences), (2, 1, 1));

    assert_eq!(fs::read_to_string(&artifacts.copy).unwrap(), content);
    assert_eq!(fs::read_to_string(&artifacts.issues).unwrap(), "1\nFailed password for root\n\n");
    let kw = fs::read_to_string(artifacts.keywords.as_ref().unwrap()).unwrap();
    assert_eq!(kw, "1\nFailed\n\n");
    assert_eq!(dir_entries(&dest).len(), 3);

    let copy_name = artifacts.copy.file_name().unwrap().to_str().unwrap();
    assert!(copy_name.starts_with("auth_") && copy_name.ends_with(".log"));
    assert!(!copy_name.contains(':'));
}

#[test]
fn clean_run_creates_nothing_and_removes_destination() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("daemon.log"), "started\nlistening on 0.0.0.0:80\n").unwrap();
    fs::write(tmp.path().join("kern.log"), "eth0: link up\n").unwrap();
    let dest = tmp.path().join("logs");

    let cfg = ScanConfiguration::build(options(tmp.path(), &dest, &["daemon.log", "kern.log"])).unwrap();
    let report = run_batch(&cfg).unwrap();

    assert!(report.outcomes.iter().all(|o| matches!(o.result, Ok(ScanOutcome::Clean { .. }))));
    assert!(report.destination_removed);
    assert!(!dest.exists());
}

#[test]
fn leftover_empty_subdirs_are_removed_on_clean_run() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("boot.log"), "ok\n").unwrap();
    let dest = tmp.path().join("logs");
    fs::create_dir_all(dest.join("2023/old")).unwrap();

    let cfg = ScanConfiguration::build(options(tmp.path(), &dest, &["boot.log"])).unwrap();
    assert!(run_batch(&cfg).unwrap().destination_removed);
    assert!(!dest.exists());
}

#[test]
fn counts_are_exact() {
    let tmp = TempDir::new().unwrap();
    let lines = [
        "kernel: disk error on sda1",
        "kernel:   disk error on sda1  ",
        "kernel: DISK ERROR ON SDA1",
        "kernel: disk error on sda1: retrying",
        "kernel: link ok",
    ];
    fs::write(tmp.path().join("kern.log"), lines.join("\n")).unwrap();
    let dest = tmp.path().join("logs");

    let cfg = ScanConfiguration::build(options(tmp.path(), &dest, &["kern.log"])).unwrap();
    let report = run_batch(&cfg).unwrap();
    let set = report.outcomes[0].result.as_ref().unwrap().artifacts().unwrap().clone();

    assert_eq!(
        fs::read_to_string(set.issues).unwrap(),
        "3\ndisk error on sda1\n\n1\nDISK ERROR ON SDA1\n\n"
    );
}

#[test]
fn ties_keep_first_seen_order() {
    let tmp = TempDir::new().unwrap();
    let body = "\
x: A error
x: B error
x: C error
x: B error
x: A error
x: B error
x: B error
x: C error
x: B error
";
    fs::write(tmp.path().join("app.log"), body).unwrap();
    let dest = tmp.path().join("logs");

    let cfg = ScanConfiguration::build(options(tmp.path(), &dest, &["app.log"])).unwrap();
    let report = run_batch(&cfg).unwrap();
    let set = report.outcomes[0].result.as_ref().unwrap().artifacts().unwrap().clone();

    assert_eq!(
        fs::read_to_string(set.issues).unwrap(),
        "5\nB error\n\n2\nA error\n\n2\nC error\n\n"
    );
}

#[test]
fn uppercase_match_keeps_original_case() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("messages.log"), "ERROR: disk full\n").unwrap();
    let dest = tmp.path().join("logs");

    let cfg = ScanConfiguration::build(options(tmp.path(), &dest, &["messages.log"])).unwrap();
    let report = run_batch(&cfg).unwrap();
    let set = report.outcomes[0].result.as_ref().unwrap().artifacts().unwrap().clone();
    assert_eq!(fs::read_to_string(set.issues).unwrap(), "1\nERROR\n\n");
}

#[test]
fn rerun_produces_distinct_sets_with_identical_reports() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("auth.log"), "a: failed login\nb: warning low disk\na: failed login\n").unwrap();
    let dest = tmp.path().join("logs");
    let cfg = ScanConfiguration::build(options(tmp.path(), &dest, &["auth.log"])).unwrap();

    let first = run_batch(&cfg).unwrap();
    let second = run_batch(&cfg).unwrap();
    let a = first.outcomes[0].result.as_ref().unwrap().artifacts().unwrap().clone();
    let b = second.outcomes[0].result.as_ref().unwrap().artifacts().unwrap().clone();

    assert_ne!(a.copy, b.copy);
    assert_ne!(a.issues, b.issues);
    assert_eq!(fs::read_to_string(&a.issues).unwrap(), fs::read_to_string(&b.issues).unwrap());
    assert_eq!(fs::read_to_string(&a.issues).unwrap(), "2\nfailed login\n\n1\nwarning low disk\n\n");
    assert_eq!(dir_entries(&dest).len(), 4);
}

#[test]
fn vanished_file_does_not_stop_the_batch() {
    let tmp = TempDir::new().unwrap();
    for name in ["one.log", "two.log", "three.log"] {
        fs::write(tmp.path().join(name), format!("{name}: error here\n")).unwrap();
    }
    let dest = tmp.path().join("logs");
    let cfg = ScanConfiguration::build(options(tmp.path(), &dest, &["one.log", "two.log", "three.log"])).unwrap();
    assert_eq!(cfg.files().files.len(), 3);

    // 解析之后删除第二个文件，模拟竞争
    fs::remove_file(tmp.path().join("two.log")).unwrap();
    let report = run_batch(&cfg).unwrap();

    assert!(report.outcomes[0].result.as_ref().unwrap().is_flagged());
    assert!(matches!(report.outcomes[1].result, Err(ScanError::Disappeared { .. })));
    assert!(report.outcomes[2].result.as_ref().unwrap().is_flagged());
    assert_eq!(report.stats().files_failed, 1);
    assert_eq!(dir_entries(&dest).len(), 4);
}

#[cfg(unix)]
#[test]
fn unreadable_file_is_isolated() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = TempDir::new().unwrap();
    for name in ["a.log", "b.log", "c.log"] {
        fs::write(tmp.path().join(name), "svc: failed to start\n").unwrap();
    }
    let locked = tmp.path().join("b.log");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::File::open(&locked).is_ok() {
        // 以 root 运行时权限位不生效；replaced_file_is_isolated 覆盖同一路径
        eprintln!("skipping unreadable_file_is_isolated: permission bits are not enforced for this user");
        return;
    }

    let dest = tmp.path().join("logs");
    let cfg = ScanConfiguration::build(options(tmp.path(), &dest, &["a.log", "b.log", "c.log"])).unwrap();
    let report = run_batch(&cfg).unwrap();

    assert!(report.outcomes[0].result.as_ref().unwrap().is_flagged());
    match &report.outcomes[1].result {
        Err(ScanError::PermissionDenied { path, .. }) => assert!(path.ends_with("b.log")),
        other => panic!("expected permission error, got {other:?}"),
    }
    assert!(report.outcomes[2].result.as_ref().unwrap().is_flagged());
    let names = dir_entries(&dest);
    assert_eq!(names.len(), 4);
    assert!(names.iter().all(|n| !n.starts_with("b_")));
}

#[test]
fn replaced_file_is_isolated() {
    let tmp = TempDir::new().unwrap();
    for name in ["a.log", "b.log", "c.log"] {
        fs::write(tmp.path().join(name), "svc: failed to start\n").unwrap();
    }
    let dest = tmp.path().join("logs");
    let cfg = ScanConfiguration::build(options(tmp.path(), &dest, &["a.log", "b.log", "c.log"])).unwrap();

    // 解析之后 b.log 被同名目录替换，不再是普通文件
    fs::remove_file(tmp.path().join("b.log")).unwrap();
    fs::create_dir(tmp.path().join("b.log")).unwrap();
    let report = run_batch(&cfg).unwrap();

    assert!(report.outcomes[0].result.as_ref().unwrap().is_flagged());
    match &report.outcomes[1].result {
        Err(ScanError::Disappeared { path }) => assert!(path.ends_with("b.log")),
        other => panic!("expected disappeared error, got {other:?}"),
    }
    assert!(report.outcomes[2].result.as_ref().unwrap().is_flagged());
    let failed: Vec<_> = report.failures().map(|(p, e)| (p.to_path_buf(), e.kind())).collect();
    assert_eq!(failed, vec![(tmp.path().join("b.log"), "disappeared")]);
    let names = dir_entries(&dest);
    assert_eq!(names.len(), 4);
    assert!(names.iter().all(|n| !n.starts_with("b_")));
}

#[test]
fn parallel_scan_matches_sequential_order() {
    let tmp = TempDir::new().unwrap();
    let names: Vec<String> = (0..8).map(|i| format!("svc{i}.log")).collect();
    for (i, name) in names.iter().enumerate() {
        let body = if i % 2 == 0 { "job: warning slow\n" } else { "job: done\n" };
        fs::write(tmp.path().join(name), body).unwrap();
    }
    let dest = tmp.path().join("logs");
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let cfg = ScanConfiguration::build(ScanOptions { threads: Some(4), ..options(tmp.path(), &dest, &refs) }).unwrap();

    let report = run_batch(&cfg).unwrap();
    let order: Vec<PathBuf> = report.outcomes.iter().map(|o| o.path.clone()).collect();
    assert_eq!(order, cfg.files().files);
    let flagged: Vec<bool> = report.outcomes.iter().map(|o| o.result.as_ref().unwrap().is_flagged()).collect();
    assert_eq!(flagged, vec![true, false, true, false, true, false, true, false]);
    assert_eq!(dir_entries(&dest).len(), 8);
}

#[test]
fn suffix_enumeration_with_custom_keywords() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("app.log"), "worker: panic in thread main\n").unwrap();
    fs::write(tmp.path().join("notes.txt"), "todo: nothing bad\n").unwrap();
    fs::write(tmp.path().join("dump.bin"), "x: panic\n").unwrap();
    let dest = tmp.path().join("out");

    let cfg = ScanConfiguration::build(ScanOptions {
        selection: FileSelection::Suffixes(vec![".log".into(), ".txt".into()]),
        keywords: KeywordSpec::List("panic, oom".into()),
        ..options(tmp.path(), &dest, &[])
    })
    .unwrap();
    let report = run_batch(&cfg).unwrap();

    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.stats().files_flagged, 1);
    let names = dir_entries(&dest);
    assert_eq!(names.len(), 2);
    assert!(names.iter().all(|n| n.starts_with("app_")));
}

#[test]
fn empty_resolution_is_not_an_error() {
    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("logs");
    let cfg = ScanConfiguration::build(options(tmp.path(), &dest, &["missing.log"])).unwrap();
    let report = run_batch(&cfg).unwrap();
    assert!(report.outcomes.is_empty());
    assert_eq!(report.misses.len(), 1);
    assert!(!dest.exists());
}

#[cfg(unix)]
#[test]
fn symlinked_log_artifacts_use_link_name() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("app-2024.log.1"), "db: error connecting\n").unwrap();
    std::os::unix::fs::symlink("app-2024.log.1", tmp.path().join("current.log")).unwrap();
    let dest = tmp.path().join("logs");

    let cfg = ScanConfiguration::build(options(tmp.path(), &dest, &["current.log"])).unwrap();
    let report = run_batch(&cfg).unwrap();

    assert_eq!(report.outcomes[0].path, tmp.path().join("current.log"));
    let set = report.outcomes[0].result.as_ref().unwrap().artifacts().unwrap().clone();
    let copy_name = set.copy.file_name().unwrap().to_str().unwrap().to_string();
    assert!(copy_name.starts_with("current_") && copy_name.ends_with(".log"), "{copy_name}");
    assert_eq!(fs::read_to_string(&set.copy).unwrap(), "db: error connecting\n");
}
