use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::{Duration, Instant};

use signalrc::config::Settings;
use signalrc::fork::Detached;
use signalrc::journal::StartupLog;
use signalrc::launcher::{self, ALL_STARTED};
use signalrc::procs::{Credentials, Maintenance};

const SETTLE: Duration = Duration::from_millis(50);

/// Every component becomes a short shell script that writes to both streams and fails
fn shell_settings(base: &Path) -> Settings {
    let mut settings = Settings::defaults(base);
    for spec in &mut settings.components {
        spec.program = "sh".to_string();
        spec.args = vec![
            "-c".to_string(),
            format!("echo {} started; echo {} complains >&2; exit 3", spec.name, spec.name),
        ];
        if !spec.settle.is_zero() {
            spec.settle = SETTLE;
        }
    }
    settings
}

/// Children are never awaited by the launcher, so poll for their output
fn wait_for_contents(path: &Path, needle: &str) -> String {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let contents = fs::read_to_string(path).unwrap_or_default();
        if contents.contains(needle) || Instant::now() > deadline {
            return contents;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}

async fn start(settings: &Settings) -> launcher::LaunchReport {
    let log = StartupLog::open(&settings.startup_log)
        .expect("open failed")
        .quiet();

    launcher::start_with_log(settings, Detached::new(&settings.base_dir), log)
        .await
        .expect("start failed")
}

#[tokio::test]
async fn test_launch_writes_per_program_logs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = shell_settings(dir.path());

    // stale output from an earlier run has to disappear
    fs::create_dir_all(&settings.log_dir).expect("mkdir failed");
    for spec in &settings.components {
        fs::write(&spec.log_file, "stale output\n").expect("write failed");
    }

    let report = start(&settings).await;
    // every child exits with 3, which the launcher never looks at
    assert_eq!(report.spawned(), 5);

    for spec in &settings.components {
        let contents = wait_for_contents(&spec.log_file, "complains");
        assert!(!contents.contains("stale output"), "{}", contents);
        assert!(contents.contains(&format!("{} started", spec.name)), "{}", contents);
        assert!(contents.contains(&format!("{} complains", spec.name)), "{}", contents);
    }

    let names: Vec<String> = fs::read_dir(&settings.log_dir)
        .expect("read_dir failed")
        .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 5);

    let startup = fs::read_to_string(&settings.startup_log).expect("read failed");
    let lines: Vec<&str> = startup.lines().collect();
    assert_eq!(lines.len(), 6);
    assert!(lines[0].ends_with("Starte Data Collector..."));
    assert!(lines[4].ends_with("Starte System-Monitor..."));
    assert!(lines[5].ends_with(ALL_STARTED));
}

#[tokio::test]
async fn test_runs_append_to_startup_log() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = shell_settings(dir.path());

    start(&settings).await;
    start(&settings).await;

    let startup = fs::read_to_string(&settings.startup_log).expect("read failed");
    assert_eq!(startup.lines().count(), 12);
    assert_eq!(startup.matches(ALL_STARTED).count(), 2);
}

#[tokio::test]
async fn test_missing_program_does_not_stop_the_rest() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut settings = shell_settings(dir.path());
    settings.components[1].program = "signalrc-no-such-program".to_string();

    let started = Instant::now();
    let report = start(&settings).await;

    assert_eq!(report.spawned(), 4);
    assert!(report.records[1].outcome.is_err());
    assert!(started.elapsed() >= SETTLE * 4);

    let last = &settings.components[4];
    let contents = wait_for_contents(&last.log_file, "maintenance started");
    assert!(contents.contains("maintenance started"), "{}", contents);
}

#[tokio::test]
async fn test_activated_environment_resolves_bare_programs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut settings = shell_settings(dir.path());

    let bin = dir.path().join("trading_env").join("bin");
    fs::create_dir_all(&bin).expect("mkdir failed");
    fs::write(bin.join("activate"), "# virtualenv activation\n").expect("write failed");

    let tool = bin.join("collector-tool");
    fs::write(&tool, "#!/bin/sh\necho \"env=$VIRTUAL_ENV\"\n").expect("write failed");
    fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).expect("chmod failed");

    settings.components[0].program = "collector-tool".to_string();
    settings.components[0].args.clear();

    let report = start(&settings).await;
    assert!(report.records[0].outcome.is_ok(), "{:?}", report.records[0]);

    let root = dir.path().join("trading_env");
    let expected = format!("env={}", root.display());
    let contents = wait_for_contents(&settings.components[0].log_file, &expected);
    assert!(contents.contains(&expected), "{}", contents);
}

#[tokio::test]
async fn test_credentials_reach_maintenance_through_env() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut settings = shell_settings(dir.path());

    let maintenance = settings.maintenance_mut().expect("maintenance component");
    maintenance.args = vec![
        "-c".to_string(),
        "echo \"user=$PCLOUD_EMAIL args=$#\"".to_string(),
    ];
    Maintenance::attach_credentials(
        maintenance,
        &Credentials {
            email: "ops@example.com".to_string(),
            password: "hunter2".to_string(),
        },
    );

    start(&settings).await;

    let log_file = &settings.components[4].log_file;
    let contents = wait_for_contents(log_file, "user=");
    assert!(contents.contains("user=ops@example.com args=0"), "{}", contents);

    let startup = fs::read_to_string(&settings.startup_log).expect("read failed");
    assert!(!startup.contains("hunter2"));
}

#[tokio::test]
async fn test_credentials_stay_out_of_other_components() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut settings = shell_settings(dir.path());
    settings.credentials.email_var = "SIGNALRC_TEST_BACKUP_USER".to_string();
    settings.credentials.password_var = "SIGNALRC_TEST_BACKUP_PASS".to_string();

    std::env::set_var("SIGNALRC_TEST_BACKUP_USER", "ops@example.com");
    std::env::set_var("SIGNALRC_TEST_BACKUP_PASS", "hunter2");

    for spec in &mut settings.components {
        spec.args = vec![
            "-c".to_string(),
            "echo \"pw=$SIGNALRC_TEST_BACKUP_PASS$PCLOUD_PASSWORD mail=$PCLOUD_EMAIL end\"".to_string(),
        ];
    }
    assert!(settings.attach_credentials(|k| std::env::var(k).ok()));

    start(&settings).await;

    let collector = wait_for_contents(&settings.components[0].log_file, "end");
    assert_eq!(collector, "pw= mail= end\n");

    let maintenance = wait_for_contents(&settings.components[4].log_file, "end");
    assert_eq!(maintenance, "pw=hunter2 mail=ops@example.com end\n");
}
