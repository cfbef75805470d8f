//! 外部耦合度分析程序集成测试 (用 shell 脚本模拟分析程序)

#![cfg(unix)]

use metrics::{analyze, ClassPath, CommandEngine, CouplingEngine, MetricsError, MetricsOutcome};
use model::{HiddenRules, ModelSnapshot, ModelView, TypeDoc, TypeKind};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::tempdir;

fn write_script(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-engine");
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("Failed to write script");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("Failed to chmod");
    path
}

const REPORT: &str = r#"{"packages":[
  {"name":"app","classes":["app.Service","app.Service$Inner"],"afferent":0,"efferent":1},
  {"name":"util","classes":["util.Helper"],"afferent":1,"efferent":0},
  {"name":"java.lang","classes":["java.lang.Object"],"afferent":2,"efferent":0}
]}"#;

#[tokio::test]
async fn test_command_receives_packages_and_directories() {
    let dir = tempdir().unwrap();
    let args_file = dir.path().join("args.txt");
    let script = write_script(
        dir.path(),
        &format!("echo \"$@\" > {}\ncat <<'EOF'\n{}\nEOF", args_file.display(), REPORT),
    );
    let classes = dir.path().join("classes");
    fs::create_dir(&classes).unwrap();

    let engine = CommandEngine::new(script).with_args(vec!["--json".to_string()]);
    let report = engine
        .analyze(&[classes.clone()], &["app".to_string(), "util".to_string()])
        .await
        .unwrap();

    let args = fs::read_to_string(&args_file).unwrap();
    assert_eq!(
        args.trim(),
        format!("--json --packages app,util {}", classes.display())
    );

    // 只保留请求的包
    assert_eq!(report.packages.len(), 2);
    assert_eq!(report.class_count(), 3);
    assert!(report.package("java.lang").is_none());
}

#[tokio::test]
async fn test_command_failure_reports_stderr() {
    let dir = tempdir().unwrap();
    let script = write_script(dir.path(), "echo 'no class files' >&2\nexit 2");

    let err = CommandEngine::new(script)
        .analyze(&[], &["app".to_string()])
        .await
        .unwrap_err();

    match err {
        MetricsError::Exit { stderr, .. } => assert_eq!(stderr, "no class files"),
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_command_invalid_output() {
    let dir = tempdir().unwrap();
    let script = write_script(dir.path(), "echo 'not json'");

    let err = CommandEngine::new(script).analyze(&[], &[]).await.unwrap_err();
    assert!(matches!(err, MetricsError::Json(_)));
}

#[tokio::test]
async fn test_command_timeout() {
    let dir = tempdir().unwrap();
    let script = write_script(dir.path(), "sleep 30");

    let err = CommandEngine::new(script)
        .with_timeout(Duration::from_millis(200))
        .analyze(&[], &[])
        .await
        .unwrap_err();
    assert!(matches!(err, MetricsError::Timeout(_)));
}

#[tokio::test]
async fn test_analyze_with_command_engine() {
    let dir = tempdir().unwrap();
    let script = write_script(dir.path(), &format!("cat <<'EOF'\n{}\nEOF", REPORT));
    let engine = CommandEngine::new(script);

    let model = ModelSnapshot::new(
        vec![
            TypeDoc::new(Some("app"), "Service", TypeKind::Class),
            TypeDoc::new(Some("app"), "Service.Inner", TypeKind::Class),
            TypeDoc::new(Some("util"), "Helper", TypeKind::Class),
        ],
        vec![],
    )
    .unwrap();
    let rules = HiddenRules::default();
    let view = ModelView::new(&model, &rules);
    let class_path = ClassPath::resolve(&[dir.path().to_path_buf()], &[]);

    let outcome = analyze(Some(&engine as &dyn CouplingEngine), &view, &class_path).await;
    match outcome {
        MetricsOutcome::Available(metrics) => {
            assert!(metrics.get("app").is_some());
            assert!(metrics.get("missing").is_none());
            let util = metrics.get("util").unwrap();
            assert_eq!((util.afferent, util.efferent), (1, 0));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}
