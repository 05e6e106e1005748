//! CLI integration tests for esq commands.
//!
//! These tests focus on exit codes, compiled documents, and basic behavioral
//! verification, not on exact formatting of human-oriented output.

// Integration tests live outside cfg(test)
#![allow(clippy::tests_outside_test_module)]

use std::{fs, path::Path};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};

/// Helper to create a temp directory for tests.
fn temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().unwrap()
}

/// Helper to get an esq command.
fn esq() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("esq").unwrap()
}

/// Helper to run `esq` inside `dir` with HOME isolated to it.
fn esq_in(dir: &Path) -> Command {
    let mut cmd = esq();
    cmd.env("HOME", dir).env_remove("ESQ_LOG").current_dir(dir);
    cmd
}

/// Writes a root config declaring the assignments relation.
fn write_assignments_config(dir: &Path) {
    fs::write(
        dir.join(".esq.toml"),
        r#"
root = true

[relation.assignments]
path = "assignments_nested"
"#,
    )
    .unwrap();
}

/// Runs `esq compile --compact` and parses each output line as JSON.
fn compile_json(dir: &Path, queries: &[&str]) -> Vec<Value> {
    let output = esq_in(dir)
        .arg("compile")
        .arg("--compact")
        .args(queries)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

mod compile {
    use super::*;

    #[test]
    fn flat_query_without_config() {
        let dir = temp_dir();
        let docs = compile_json(dir.path(), &["owner:me AND NOT status:closed"]);
        assert_eq!(
            docs,
            vec![json!({"bool": {
                "must": [{"term": {"owner": "me"}}],
                "must_not": [{"term": {"status": "closed"}}]
            }})]
        );
    }

    #[test]
    fn nested_query_uses_configured_relation() {
        let dir = temp_dir();
        write_assignments_config(dir.path());

        let docs = compile_json(
            dir.path(),
            &["assignments.assignee_id:someuser AND assignments.is_completed:true"],
        );
        assert_eq!(
            docs,
            vec![json!({"bool": {"must": [{"nested": {
                "path": "assignments_nested",
                "query": {"bool": {"must": [
                    {"term": {"assignments_nested.assignee_id": "someuser"}},
                    {"term": {"assignments_nested.is_completed": "true"}}
                ]}}
            }}]}})]
        );
    }

    #[test]
    fn several_queries_print_one_document_each() {
        let dir = temp_dir();
        let docs = compile_json(dir.path(), &["a:1", "a:1 OR b:2"]);
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0], json!({"bool": {"must": [{"term": {"a": "1"}}]}}));
        assert_eq!(
            docs[1],
            json!({"bool": {"should": [{"term": {"a": "1"}}, {"term": {"b": "2"}}]}})
        );
    }

    #[test]
    fn pretty_by_default() {
        let dir = temp_dir();
        esq_in(dir.path())
            .args(["compile", "a:1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("{\n  \"bool\""));
    }

    #[test]
    fn pretty_can_be_disabled_in_config() {
        let dir = temp_dir();
        fs::write(
            dir.path().join(".esq.toml"),
            "root = true\n[settings]\npretty = false\n",
        )
        .unwrap();

        esq_in(dir.path())
            .args(["compile", "a:1"])
            .assert()
            .success()
            .stdout("{\"bool\":{\"must\":[{\"term\":{\"a\":\"1\"}}]}}\n");
    }

    #[test]
    fn syntax_error_shows_caret_and_fails() {
        let dir = temp_dir();
        esq_in(dir.path())
            .args(["compile", "name:\"unterminated"])
            .assert()
            .failure()
            .stdout(predicate::str::is_empty())
            .stderr(predicate::str::contains("unterminated quote"))
            .stderr(predicate::str::contains("^"))
            .stderr(predicate::str::contains("hint:"));
    }

    #[test]
    fn unbalanced_parens_fail() {
        let dir = temp_dir();
        esq_in(dir.path())
            .args(["compile", "(a:1 OR b:2"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("unclosed group"));
    }

    #[test]
    fn one_bad_query_still_prints_the_good_ones() {
        let dir = temp_dir();
        esq_in(dir.path())
            .args(["compile", "--compact", "a:1", "a:1 AND", "b:2"])
            .assert()
            .failure()
            .stdout(predicate::str::contains("\"a\":\"1\""))
            .stdout(predicate::str::contains("\"b\":\"2\""));
    }

    #[test]
    fn depth_limit_from_config() {
        let dir = temp_dir();
        fs::write(
            dir.path().join(".esq.toml"),
            "root = true\n[settings]\nmax_depth = 1\n",
        )
        .unwrap();

        esq_in(dir.path())
            .args(["compile", "(a:1)"])
            .assert()
            .success();
        esq_in(dir.path())
            .args(["compile", "((a:1))"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("maximum of 1"));
    }

    #[test]
    fn explicit_config_skips_discovery() {
        let dir = temp_dir();
        write_assignments_config(dir.path());
        let other = dir.path().join("other.toml");
        fs::write(&other, "[relation.tasks]\npath = \"tasks_nested\"\n").unwrap();

        let output = esq_in(dir.path())
            .args(["--config", "other.toml", "compile", "--compact"])
            .arg("assignments.x:1 AND assignments.y:2")
            .output()
            .unwrap();
        assert!(output.status.success());
        let doc: Value = serde_json::from_slice(&output.stdout).unwrap();
        // assignments is not a relation in other.toml, so nothing is nested
        assert_eq!(doc["bool"]["must"][0], json!({"term": {"assignments.x": "1"}}));
    }

    #[test]
    fn invalid_config_fails() {
        let dir = temp_dir();
        fs::write(dir.path().join(".esq.toml"), "root = true\n[relation.a]\n").unwrap();

        esq_in(dir.path())
            .args(["compile", "a:1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("failed to load configuration"));
    }
}

mod inspect {
    use super::*;

    #[test]
    fn tokens_json() {
        let dir = temp_dir();
        let output = esq_in(dir.path())
            .args(["tokens", "--json", "(a:1 OR b:\"x y\") AND NOT c:3"])
            .output()
            .unwrap();
        assert!(output.status.success());
        let tokens: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(
            tokens,
            vec!["(", "a:1", "OR", "b:\"x y\"", ")", "AND NOT", "c:3"]
        );
    }

    #[test]
    fn tokens_text() {
        let dir = temp_dir();
        esq_in(dir.path())
            .args(["tokens", "owner:me OR NOT x:1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("TERM   owner = me"))
            .stdout(predicate::str::contains("OP     OR NOT"));
    }

    #[test]
    fn tokens_error() {
        let dir = temp_dir();
        esq_in(dir.path())
            .args(["tokens", "a:1 NOT b:2"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("NOT must follow AND or OR"));
    }

    #[test]
    fn tree_shows_groups() {
        let dir = temp_dir();
        esq_in(dir.path())
            .args(["tree", "(a:1 OR b:2) AND c:3"])
            .assert()
            .success()
            .stdout("Group\n  Term(a:1)\n  OR\n  Term(b:2)\nAND\nTerm(c:3)\n");
    }

    #[test]
    fn tree_reports_stray_paren() {
        let dir = temp_dir();
        esq_in(dir.path())
            .args(["tree", "a:1)"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("unexpected closing parenthesis"));
    }

    #[test]
    fn tree_rejects_deep_nesting() {
        let dir = temp_dir();
        // A single argv string is capped at 128 KiB on Linux
        let depth = 50_000;
        let query = format!("a:1 {}a:1{}", "(".repeat(depth), ")".repeat(depth));
        esq_in(dir.path())
            .args(["tree", &query])
            .assert()
            .failure()
            .stderr(predicate::str::contains("deeper than the maximum of 32"));
    }

    #[test]
    fn normalize_uses_configured_depth() {
        let dir = temp_dir();
        fs::write(
            dir.path().join(".esq.toml"),
            "root = true\n[settings]\nmax_depth = 1\n",
        )
        .unwrap();

        esq_in(dir.path())
            .args(["normalize", "((a:1))"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("maximum of 1 levels"));
    }

    #[test]
    fn normalize_collapses_whitespace() {
        let dir = temp_dir();
        esq_in(dir.path())
            .args(["normalize", "  ( a:1   OR b:2 )  AND   c:\"two words\" "])
            .assert()
            .success()
            .stdout("(a:1 OR b:2) AND c:\"two words\"\n");
    }
}

mod relations {
    use super::*;

    #[test]
    fn lists_prefixes() {
        let dir = temp_dir();
        write_assignments_config(dir.path());

        esq_in(dir.path())
            .arg("relations")
            .assert()
            .success()
            .stdout(predicate::str::contains("assignments.*"))
            .stdout(predicate::str::contains("assignments_nested"))
            .stdout(predicate::str::contains("local"));
    }

    #[test]
    fn shows_defining_file() {
        let dir = temp_dir();
        fs::write(
            dir.path().join("shared.toml"),
            "[relation.tasks]\npath = \"tasks_nested\"\n",
        )
        .unwrap();

        esq_in(dir.path())
            .args(["--config", "shared.toml", "relations"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Defined in"))
            .stdout(predicate::str::contains("shared.toml"));
    }

    #[test]
    fn empty_registry() {
        let dir = temp_dir();
        esq_in(dir.path())
            .arg("relations")
            .assert()
            .success()
            .stdout(predicate::str::contains("No relations defined."));
    }
}

mod init {
    use super::*;

    #[test]
    fn creates_config_file() {
        let dir = temp_dir();
        let project = dir.path().join("project");
        fs::create_dir(&project).unwrap();

        esq()
            .env("HOME", dir.path())
            .current_dir(&project)
            .arg("init")
            .assert()
            .success();

        let contents = fs::read_to_string(project.join(".esq.toml")).unwrap();
        assert!(contents.contains("# [relation."));
    }

    #[test]
    fn fails_if_config_exists() {
        let dir = temp_dir();
        fs::write(dir.path().join(".esq.toml"), "existing").unwrap();

        esq_in(dir.path()).args(["init", "--global"]).assert().failure();
    }

    #[test]
    fn force_overwrites_existing_even_if_invalid() {
        let dir = temp_dir();
        fs::write(dir.path().join(".esq.toml"), "not [valid toml").unwrap();

        esq_in(dir.path())
            .args(["init", "--force"])
            .assert()
            .success();

        let contents = fs::read_to_string(dir.path().join(".esq.toml")).unwrap();
        assert!(contents.contains("# [relation."));
    }

    #[test]
    fn global_writes_to_home() {
        let home = temp_dir();
        let work = temp_dir();

        esq()
            .env("HOME", home.path())
            .current_dir(work.path())
            .args(["init", "--global"])
            .assert()
            .success();

        assert!(home.path().join(".esq.toml").exists());
        assert!(!work.path().join(".esq.toml").exists());
    }

    #[test]
    fn home_directory_gets_global_template() {
        let home = temp_dir();

        esq_in(home.path())
            .arg("init")
            .assert()
            .success()
            .stdout(predicate::str::contains("Created"));

        let contents = fs::read_to_string(home.path().join(".esq.toml")).unwrap();
        assert!(contents.contains("global configuration"));
    }

    #[test]
    fn existing_file_names_force_flag() {
        let dir = temp_dir();
        let project = dir.path().join("project");
        fs::create_dir(&project).unwrap();
        fs::write(project.join(".esq.toml"), "existing").unwrap();

        esq()
            .env("HOME", dir.path())
            .current_dir(&project)
            .arg("init")
            .assert()
            .failure()
            .stderr(predicate::str::contains("already exists (use --force to overwrite)"));
        assert_eq!(fs::read_to_string(project.join(".esq.toml")).unwrap(), "existing");
    }
}

mod check {
    use super::*;

    #[test]
    fn no_config_is_ok() {
        let dir = temp_dir();
        esq_in(dir.path())
            .arg("check")
            .assert()
            .success()
            .stdout(predicate::str::contains("No configuration files found."));
    }

    #[test]
    fn clean_config_passes() {
        let dir = temp_dir();
        write_assignments_config(dir.path());

        esq_in(dir.path())
            .arg("check")
            .assert()
            .success()
            .stdout(predicate::str::contains("No issues found."));
    }

    #[test]
    fn shows_relation_source() {
        let dir = temp_dir();
        fs::write(
            dir.path().join("shared.toml"),
            "[relation.tasks]\npath = \"tasks_nested\"\n",
        )
        .unwrap();

        esq_in(dir.path())
            .args(["--config", "shared.toml", "check"])
            .assert()
            .success()
            .stdout(predicate::str::contains("from shared.toml"));
    }

    #[test]
    fn excessive_depth_is_an_error() {
        let dir = temp_dir();
        fs::write(
            dir.path().join(".esq.toml"),
            "root = true\n[settings]\nmax_depth = 1000000\n",
        )
        .unwrap();

        esq_in(dir.path())
            .arg("check")
            .assert()
            .failure()
            .stderr(predicate::str::contains("exceeds the limit of 256"));
    }

    #[test]
    fn warnings_fail() {
        let dir = temp_dir();
        fs::write(
            dir.path().join(".esq.toml"),
            "root = true\n[relation.tags]\npath = \"tags\"\n",
        )
        .unwrap();

        esq_in(dir.path())
            .arg("check")
            .assert()
            .failure()
            .stdout(predicate::str::contains("Warnings (1):"))
            .stdout(predicate::str::contains("both prefix and nested path"));
    }

    #[test]
    fn duplicate_prefix_is_an_error() {
        let dir = temp_dir();
        fs::write(
            dir.path().join(".esq.toml"),
            r#"
root = true

[relation.a]
path = "a_nested"
prefix = "x"

[relation.b]
path = "b_nested"
prefix = "x"
"#,
        )
        .unwrap();

        esq_in(dir.path())
            .arg("check")
            .assert()
            .failure()
            .stderr(predicate::str::contains("claimed by both"));
    }
}

mod config {
    use super::*;

    #[test]
    fn prints_effective_settings() {
        let dir = temp_dir();
        fs::write(
            dir.path().join(".esq.toml"),
            "root = true\n[settings]\nmax_depth = 7\n",
        )
        .unwrap();

        esq_in(dir.path())
            .arg("config")
            .assert()
            .success()
            .stdout(predicate::str::contains("max_depth = 7"))
            .stdout(predicate::str::contains("pretty = true"));
    }
}

mod logging {
    use super::*;

    #[test]
    fn verbose_logs_to_stderr() {
        let dir = temp_dir();
        esq_in(dir.path())
            .args(["-v", "compile", "a:1"])
            .assert()
            .success()
            .stderr(predicate::str::contains("compiling query"));
    }

    #[test]
    fn quiet_by_default() {
        let dir = temp_dir();
        esq_in(dir.path())
            .args(["compile", "a:1"])
            .assert()
            .success()
            .stderr(predicate::str::is_empty());
    }
}
