//! Golden tests for rgview
//!
//! These tests run the binary against a fixed fixture tree and check the
//! exact rendered output. They ensure:
//! - Output format stability across versions
//! - Consistent grouping and line-number alignment
//! - No unexpected regressions in output structure
//!
//! Search tests need ripgrep on PATH; run them with `cargo test -- --ignored`.

use assert_cmd::Command;
use serde_json::Value;
use std::path::PathBuf;

/// Get the path to the fixtures directory
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Get the path to the sample project
fn sample_project() -> PathBuf {
    fixtures_dir().join("sample_project")
}

/// Create a command for running the rgview binary against the sample project
fn rgview_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("rgview"));
    cmd.env_remove("RGVIEW_ALLOWED_ACTORS")
        .env_remove("RGVIEW_RG")
        .env_remove("RGVIEW_MAX_RESULTS")
        .arg("--root")
        .arg(sample_project())
        .arg("--time-limit")
        .arg("10");
    cmd
}

/// Parse JSONL output into a vector of JSON values
fn parse_jsonl(output: &str) -> Vec<Value> {
    output
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|l| serde_json::from_str::<Value>(l).ok())
        .collect()
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().expect("failed to execute");
    assert!(
        output.status.success(),
        "rgview failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("utf-8 output")
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== View Tests ====================

    #[test]
    fn golden_view_markdown() {
        let stdout = stdout_of(rgview_cmd().args(["--format", "md", "view", "README.md"]));

        assert_eq!(
            stdout,
            "## `README.md`\n\n```\n\
             1 │ # Sample Project\n\
             2 │ \n\
             3 │ Fixture tree for rgview golden tests.\n\
             ```\n"
        );
    }

    #[test]
    fn golden_view_jsonl() {
        let stdout = stdout_of(rgview_cmd().args(["view", "src/config.rs"]));
        let items = parse_jsonl(&stdout);

        assert_eq!(items.len(), 2);
        assert_eq!(
            items[0],
            serde_json::json!({
                "path": "src/config.rs",
                "line_number": 1,
                "text": "/// Base value added by the helper",
            })
        );
        assert_eq!(items[1]["text"], "pub const BASE: i32 = 40;");
    }

    #[test]
    fn golden_view_normalizes_dot_prefix() {
        let stdout = stdout_of(rgview_cmd().args(["view", "./docs/guide.md"]));
        let items = parse_jsonl(&stdout);
        assert!(items.iter().all(|i| i["path"] == "docs/guide.md"));
    }

    // ==================== Search Tests ====================

    #[test]
    #[ignore = "requires rg on PATH"]
    fn golden_search_markdown_single_file() {
        let stdout = stdout_of(rgview_cmd().args([
            "--format",
            "md",
            "search",
            "-g",
            "main.rs",
            "helper_function",
        ]));

        assert_eq!(
            stdout,
            "## `src/main.rs`\n\n```\n\
             > 4 │     let answer = helper_function();\n\
             > 8 │ fn helper_function() -> i32 {\n\
             ```\n\n"
        );
    }

    #[test]
    #[ignore = "requires rg on PATH"]
    fn golden_search_markdown_with_context() {
        let stdout = stdout_of(rgview_cmd().args([
            "--format",
            "md",
            "search",
            "-g",
            "main.rs",
            "-C",
            "1",
            "helper_function",
        ]));

        assert_eq!(
            stdout,
            "## `src/main.rs`\n\n```\n  \
             3 │ fn main() {\n\
             > 4 │     let answer = helper_function();\n  \
             5 │     println!(\"answer: {}\", answer);\n  \
             7 │ \n\
             > 8 │ fn helper_function() -> i32 {\n  \
             9 │     config::BASE + 2\n\
             ```\n\n"
        );
    }

    #[test]
    #[ignore = "requires rg on PATH"]
    fn golden_search_jsonl_structure() {
        let stdout = stdout_of(rgview_cmd().args(["search", "helper_function"]));
        let items = parse_jsonl(&stdout);

        let (summary, groups) = items.split_last().expect("summary line");
        let summary = &summary["summary"];
        assert_eq!(summary["pattern"], "helper_function");
        assert_eq!(summary["match_count"], 3);
        assert_eq!(summary["files"], 2);
        assert_eq!(summary["line_number_width"], 1);
        assert_eq!(summary["truncated_by_count"], false);
        assert_eq!(summary["truncated_by_time"], false);

        let mut paths: Vec<&str> = groups
            .iter()
            .map(|g| g["path"].as_str().expect("path"))
            .collect();
        paths.sort();
        assert_eq!(paths, vec!["docs/guide.md", "src/main.rs"]);

        // Every group line carries the same fields
        for group in groups {
            for line in group["lines"].as_array().expect("lines array") {
                assert!(line["line_number"].is_u64());
                assert!(line["text"].is_string());
                assert_eq!(line["is_match"], true);
                assert!(line["spans"].is_array());
            }
        }
    }

    #[test]
    #[ignore = "requires rg on PATH"]
    fn golden_search_glob_exclude() {
        let stdout = stdout_of(rgview_cmd().args(["search", "-g", "!docs/**", "BASE"]));
        let items = parse_jsonl(&stdout);
        let (_, groups) = items.split_last().expect("summary line");

        let mut paths: Vec<&str> = groups
            .iter()
            .map(|g| g["path"].as_str().expect("path"))
            .collect();
        paths.sort();
        assert_eq!(paths, vec!["src/config.rs", "src/main.rs"]);
    }

    #[test]
    #[ignore = "requires rg on PATH"]
    fn golden_search_cap_of_one() {
        let stdout = stdout_of(rgview_cmd().args([
            "--max-results",
            "1",
            "search",
            "-g",
            "main.rs",
            "helper_function",
        ]));
        let items = parse_jsonl(&stdout);
        let summary = &items.last().expect("summary line")["summary"];

        assert_eq!(summary["match_count"], 1);
        assert_eq!(summary["truncated_by_count"], true);
        assert_eq!(items[0]["lines"][0]["line_number"], 4);
    }

    #[test]
    #[ignore = "requires rg on PATH"]
    fn golden_search_no_matches() {
        let stdout = stdout_of(rgview_cmd().args(["--format", "md", "search", "zzz_not_here"]));
        assert_eq!(stdout, "_No matches for `zzz_not_here`._\n");
    }
}
