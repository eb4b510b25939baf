//! CLI integration tests for catalog-cql binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("catalog-cql"))
}

// Helper to create a temp document file
fn write_temp_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

const FULL_CAPABILITIES: &str = r#"{
    "comparisonOperators": ["EqualTo", "NotEqualTo", "Like", "IsNull", "Between"],
    "spatialOperators": ["Intersects", "DWithin", "Overlaps"],
    "logicalOperators": true
}"#;

const TITLE_QUERY: &str = r#"{
    "op": "compare", "operator": "EqualTo", "property": "title",
    "value": { "type": "int", "value": 1 }
}"#;

mod render_command {
    use super::*;

    #[test]
    fn renders_standard_cql() {
        let dir = TempDir::new().unwrap();
        let caps = write_temp_file(&dir, "caps.json", FULL_CAPABILITIES);
        let query = write_temp_file(&dir, "query.json", TITLE_QUERY);

        cmd()
            .args([
                "render",
                query.to_str().unwrap(),
                "--capabilities",
                caps.to_str().unwrap(),
            ])
            .assert()
            .success()
            .stdout("title = '1'\n");
    }

    #[test]
    fn dialect_override() {
        let dir = TempDir::new().unwrap();
        let caps = write_temp_file(&dir, "caps.json", FULL_CAPABILITIES);
        let query = write_temp_file(&dir, "query.json", TITLE_QUERY);

        cmd()
            .args([
                "render",
                query.to_str().unwrap(),
                "-c",
                caps.to_str().unwrap(),
                "--dialect",
                "legacy",
            ])
            .assert()
            .success()
            .stdout("\"title\" = 1\n");
    }

    #[test]
    fn config_controls_axis_order_and_dialect() {
        let dir = TempDir::new().unwrap();
        let caps = write_temp_file(&dir, "caps.json", FULL_CAPABILITIES);
        let config = write_temp_file(
            &dir,
            "source.json",
            r#"{ "axisOrder": "LON_LAT", "dialect": "legacy", "mapping": { "geometryField": "footprint" } }"#,
        );
        let query = write_temp_file(
            &dir,
            "query.json",
            r#"{ "op": "spatial", "operator": "Overlaps", "property": "anyGeo", "wkt": "POINT (10 20)" }"#,
        );

        cmd()
            .args([
                "render",
                query.to_str().unwrap(),
                "-c",
                caps.to_str().unwrap(),
                "--config",
                config.to_str().unwrap(),
            ])
            .assert()
            .success()
            .stdout("OVERLAP(\"footprint\", SRID=4326;POINT (20 10))\n");
    }

    #[test]
    fn relative_window_with_fixed_now() {
        let dir = TempDir::new().unwrap();
        let caps = write_temp_file(&dir, "caps.json", FULL_CAPABILITIES);
        let query = write_temp_file(
            &dir,
            "query.json",
            r#"{ "op": "relative", "property": "modified", "durationMillis": 3600000 }"#,
        );

        cmd()
            .args([
                "render",
                query.to_str().unwrap(),
                "-c",
                caps.to_str().unwrap(),
                "--now",
                "2020-01-02T00:00:00Z",
            ])
            .assert()
            .success()
            .stdout(
                "modified BETWEEN '2020-01-01T23:00:00.000Z' AND '2020-01-02T00:00:00.000Z'\n",
            );
    }

    #[test]
    fn unknown_dialect() {
        let dir = TempDir::new().unwrap();
        let caps = write_temp_file(&dir, "caps.json", FULL_CAPABILITIES);
        let query = write_temp_file(&dir, "query.json", TITLE_QUERY);

        cmd()
            .args([
                "render",
                query.to_str().unwrap(),
                "-c",
                caps.to_str().unwrap(),
                "--dialect",
                "ecql",
            ])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("unknown dialect"));
    }
}

mod check_command {
    use super::*;

    #[test]
    fn accepted_query() {
        let dir = TempDir::new().unwrap();
        let caps = write_temp_file(&dir, "caps.json", FULL_CAPABILITIES);
        let query = write_temp_file(&dir, "query.json", TITLE_QUERY);

        cmd()
            .args(["check", query.to_str().unwrap(), "-c", caps.to_str().unwrap()])
            .assert()
            .success()
            .stdout("OK\n");
    }

    #[test]
    fn unsupported_operator_is_rejected() {
        let dir = TempDir::new().unwrap();
        let caps = write_temp_file(&dir, "caps.json", FULL_CAPABILITIES);
        let query = write_temp_file(
            &dir,
            "query.json",
            r#"{ "op": "spatial", "operator": "Within", "property": "anyGeo", "wkt": "POINT (1 2)" }"#,
        );

        cmd()
            .args(["check", query.to_str().unwrap(), "-c", caps.to_str().unwrap()])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Query rejected"))
            .stderr(predicate::str::contains("Within"));
    }

    #[test]
    fn logical_operators_disabled() {
        let dir = TempDir::new().unwrap();
        let caps = write_temp_file(
            &dir,
            "caps.json",
            r#"{ "comparisonOperators": ["EqualTo"], "spatialOperators": [], "logicalOperators": false }"#,
        );
        let query = write_temp_file(
            &dir,
            "query.json",
            &format!(r#"{{ "op": "not", "child": {TITLE_QUERY} }}"#),
        );

        cmd()
            .args(["check", query.to_str().unwrap(), "-c", caps.to_str().unwrap()])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("logical operators"));
    }
}

mod capabilities_command {
    use super::*;

    #[test]
    fn text_summary() {
        let dir = TempDir::new().unwrap();
        let caps = write_temp_file(
            &dir,
            "caps.json",
            r#"{
                "comparisonOperators": ["PropertyIsLike", "PropertyIsEqualTo"],
                "spatialOperators": [],
                "geometryOperands": ["gml:Point"],
                "logicalOperators": false
            }"#,
        );

        cmd()
            .args(["capabilities", caps.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("comparison: EqualTo, Like"))
            .stdout(predicate::str::contains("spatial:    (none)"))
            .stdout(predicate::str::contains("geometry:   Point"))
            .stdout(predicate::str::contains("logical:    no"));
    }

    #[test]
    fn json_output() {
        let dir = TempDir::new().unwrap();
        let caps = write_temp_file(&dir, "caps.json", FULL_CAPABILITIES);

        let output = cmd()
            .args(["capabilities", caps.to_str().unwrap(), "--json"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(
            json["spatialOperators"],
            serde_json::json!(["Intersects", "DWithin", "Overlaps"])
        );
        assert_eq!(json["geometryOperands"].as_array().unwrap().len(), 6);
        assert_eq!(json["logicalOperators"], true);
    }
}

mod error_handling {
    use super::*;

    #[test]
    fn capabilities_file_not_found() {
        let dir = TempDir::new().unwrap();
        let query = write_temp_file(&dir, "query.json", TITLE_QUERY);

        cmd()
            .args([
                "render",
                query.to_str().unwrap(),
                "-c",
                "/nonexistent/caps.json",
            ])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("file not found"));
    }

    #[test]
    fn missing_spatial_operators() {
        let dir = TempDir::new().unwrap();
        let caps = write_temp_file(&dir, "caps.json", r#"{ "comparisonOperators": [] }"#);

        cmd()
            .args(["capabilities", caps.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("spatial operators"));
    }

    #[test]
    fn invalid_query_json() {
        let dir = TempDir::new().unwrap();
        let caps = write_temp_file(&dir, "caps.json", FULL_CAPABILITIES);
        let query = write_temp_file(&dir, "query.json", "{ not json");

        cmd()
            .args(["check", query.to_str().unwrap(), "-c", caps.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("invalid JSON"));
    }

    #[test]
    fn unknown_query_op() {
        let dir = TempDir::new().unwrap();
        let caps = write_temp_file(&dir, "caps.json", FULL_CAPABILITIES);
        let query = write_temp_file(&dir, "query.json", r#"{ "op": "xor" }"#);

        cmd()
            .args(["check", query.to_str().unwrap(), "-c", caps.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("invalid query"));
    }

    #[test]
    fn invalid_config() {
        let dir = TempDir::new().unwrap();
        let caps = write_temp_file(&dir, "caps.json", FULL_CAPABILITIES);
        let query = write_temp_file(&dir, "query.json", TITLE_QUERY);
        let config = write_temp_file(&dir, "source.json", r#"{ "dialect": "ecql" }"#);

        cmd()
            .args([
                "render",
                query.to_str().unwrap(),
                "-c",
                caps.to_str().unwrap(),
                "--config",
                config.to_str().unwrap(),
            ])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("invalid source configuration"));
    }
}

mod required_args {
    use super::*;

    #[test]
    fn missing_capabilities_flag() {
        cmd()
            .args(["render", "query.json"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("--capabilities"));
    }
}

mod help_and_version {
    use super::*;

    #[test]
    fn help_flag() {
        cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("render"))
            .stdout(predicate::str::contains("capabilities"));
    }

    #[test]
    fn version_flag() {
        cmd()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("catalog-cql"));
    }
}
