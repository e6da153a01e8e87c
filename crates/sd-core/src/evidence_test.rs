use super::*;
use crate::plan::plan;
use tempfile::tempdir;

fn read_summary(path: &Path) -> serde_json::Value {
    let content = fs::read_to_string(path).unwrap();
    serde_json::from_str(&content).unwrap()
}

#[test]
fn test_start_creates_run_directory() {
    let dir = tempdir().unwrap();
    let recorder = EvidenceRecorder::start(dir.path()).unwrap();
    assert!(recorder.run_dir().is_dir());
    assert!(recorder.run_id().starts_with("run-"));
    assert_eq!(recorder.run_dir(), dir.path().join(recorder.run_id()));
}

#[test]
fn test_run_ids_are_unique_within_a_second() {
    let now = Utc::now();
    assert_ne!(generate_run_id(&now), generate_run_id(&now));
}

#[test]
fn test_stub_summary_written_when_nothing_ran() {
    let dir = tempdir().unwrap();
    let mut recorder = EvidenceRecorder::start(dir.path()).unwrap();
    recorder.record_error("[P001] Path not found: nowhere");

    let (evidence, path) = recorder.finalize(false).unwrap();
    assert!(!evidence.ok);
    assert!(path.ends_with(SUMMARY_FILE));

    let json = read_summary(&path);
    assert_eq!(json["ok"], false);
    assert_eq!(json["results"].as_array().unwrap().len(), 0);
    assert_eq!(json["summary"]["files_planned"], 0);
    assert_eq!(json["summary"]["statements_total"], 0);
    assert_eq!(json["error"], "[P001] Path not found: nowhere");
    assert!(json.get("mode").is_none());
    assert!(json["finished_at"].is_string());
}

#[test]
fn test_first_error_wins() {
    let dir = tempdir().unwrap();
    let mut recorder = EvidenceRecorder::start(dir.path()).unwrap();
    recorder.record_error("first");
    recorder.record_error("second");
    let (evidence, _) = recorder.finalize(false).unwrap();
    assert_eq!(evidence.error.as_deref(), Some("first"));
}

#[test]
fn test_results_are_appended_in_order_with_logs() {
    let dir = tempdir().unwrap();
    let sql_dir = tempdir().unwrap();
    fs::write(sql_dir.path().join("1_a.sql"), "SELECT 1;").unwrap();
    fs::write(sql_dir.path().join("2_b.sql"), "SELECT 2;").unwrap();
    let plan = plan(sql_dir.path().to_str().unwrap(), None).unwrap();

    let mut recorder = EvidenceRecorder::start(dir.path()).unwrap();
    recorder.set_plan(&plan);
    recorder
        .record(ScriptResult::success("1_a.sql", 3, 10, 5))
        .unwrap();
    recorder
        .record(ScriptResult::failed("2_b.sql", "boom"))
        .unwrap();
    let run_dir = recorder.run_dir().to_path_buf();

    let (_, path) = recorder.finalize(false).unwrap();
    let json = read_summary(&path);

    assert_eq!(json["mode"], "auto_folder_order");
    assert_eq!(json["files"].as_array().unwrap().len(), 2);
    let results = json["results"].as_array().unwrap();
    assert_eq!(results[0]["file"], "1_a.sql");
    assert_eq!(results[0]["status"], "success");
    assert_eq!(results[0]["message"], "OK (3 statements)");
    assert_eq!(results[1]["status"], "failed");
    assert_eq!(json["summary"]["succeeded"], 1);
    assert_eq!(json["summary"]["failed"], 1);
    assert_eq!(json["summary"]["rows_affected_total"], 10);

    let log: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(run_dir.join("2_b.sql.log")).unwrap()).unwrap();
    assert_eq!(log["message"], "boom");
}

#[test]
fn test_summary_has_no_leftover_temp_file() {
    let dir = tempdir().unwrap();
    let recorder = EvidenceRecorder::start(dir.path()).unwrap();
    let run_dir = recorder.run_dir().to_path_buf();
    recorder.finalize(true).unwrap();
    assert!(run_dir.join(SUMMARY_FILE).exists());
    assert!(!run_dir.join("summary.json.tmp").exists());
}

#[test]
fn test_log_file_name_flattens_separators() {
    assert_eq!(log_file_name("a/b\\c.sql"), "a_b_c.sql.log");
    assert_eq!(log_file_name("plain.sql"), "plain.sql.log");
}

#[test]
fn test_timestamps_have_second_precision() {
    let ts = DateTime::parse_from_rfc3339("2024-01-15T10:30:00.123456Z")
        .unwrap()
        .with_timezone(&Utc);
    assert_eq!(format_timestamp(&ts), "2024-01-15T10:30:00Z");
}

#[test]
fn test_skipped_result_has_zero_counts() {
    let result = ScriptResult::skipped("empty.sql");
    assert_eq!(result.status, ScriptStatus::Skipped);
    assert_eq!(result.statement_count, 0);
    assert_eq!(result.rows_affected_total, 0);
    assert_eq!(result.elapsed_ms, 0);
}

#[test]
fn test_env_summary_is_serialized() {
    let dir = tempdir().unwrap();
    let mut recorder = EvidenceRecorder::start(dir.path()).unwrap();
    let mut env = BTreeMap::new();
    env.insert("ENVIRONMENT".to_string(), "dev".to_string());
    recorder.set_env_summary(env);
    let (_, path) = recorder.finalize(true).unwrap();
    let json = read_summary(&path);
    assert_eq!(json["env_summary"]["ENVIRONMENT"], "dev");
    assert_eq!(json["ok"], true);
}
