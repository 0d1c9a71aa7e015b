//! CLI integration tests for askyourdocs commands.
//!
//! Every test runs against its own temporary home with the offline `hash`
//! embedder, so nothing touches the network or the user's real collection.

// Integration tests are not inside a cfg(test) module
#![allow(clippy::tests_outside_test_module)]

use std::{fs, path::PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

/// Project configuration used by every test workspace.
const PROJECT_CONFIG: &str = "\
embedding:
  provider: hash
model:
  base_url: http://127.0.0.1:9
  timeout: 2
storage:
  path: store
";

/// An isolated home directory with a project workspace inside it.
struct Workspace {
    /// Owns every file the test creates.
    dir: TempDir,
}

impl Workspace {
    /// Creates a workspace with the offline project configuration.
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let work = dir.path().join("work");
        fs::create_dir_all(&work).unwrap();
        fs::write(work.join(".askyourdocs.yaml"), PROJECT_CONFIG).unwrap();
        Self { dir }
    }

    /// Creates a workspace with a small corpus under `docs/`.
    fn with_docs() -> Self {
        let ws = Self::new();
        ws.write(
            "docs/ownership.md",
            "# Ownership\n\nEvery value in Rust has a single owner. When the owner goes out \
             of scope the value is dropped. Ownership can be moved to another binding.\n",
        );
        ws.write(
            "docs/borrowing.txt",
            "References let you borrow a value without taking ownership. A mutable borrow \
             is exclusive, while shared borrows can coexist.\n",
        );
        ws.write(
            "docs/cooking.md",
            "# Pasta\n\nBoil salted water, add the pasta and cook until al dente. Drain and \
             toss with sauce.\n",
        );
        ws
    }

    /// Project directory the commands run in.
    fn work(&self) -> PathBuf {
        self.dir.path().join("work")
    }

    /// Writes a file relative to the project directory.
    fn write(&self, rel: &str, content: &str) {
        let path = self.work().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// An `askyourdocs` command with HOME and the XDG directories isolated.
    fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("askyourdocs").unwrap();
        let home = self.dir.path();
        cmd.current_dir(self.work())
            .env("HOME", home)
            .env("XDG_CONFIG_HOME", home.join("config"))
            .env("XDG_DATA_HOME", home.join("data"))
            .env("XDG_CACHE_HOME", home.join("cache"))
            .env("NO_COLOR", "1")
            .env_remove("ASKYOURDOCS_CONFIG")
            .env_remove("RUST_LOG")
            .env_remove("OPENAI_API_KEY")
            .env_remove("ANTHROPIC_API_KEY");
        cmd
    }

    /// Ingests `docs/` and asserts that it worked.
    fn ingest(&self) {
        self.cmd()
            .args(["ingest", "docs"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Ingestion complete."));
    }

    /// Runs a command expected to succeed and parses its stdout as JSON.
    fn json(&self, args: &[&str]) -> Value {
        let output = self.cmd().args(args).output().unwrap();
        assert!(
            output.status.success(),
            "command failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }
}

mod general {
    use super::*;

    #[test]
    fn version_names_the_tool() {
        Workspace::new()
            .cmd()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::starts_with("AskYourDocs v"));
    }

    #[test]
    fn help_lists_commands() {
        Workspace::new()
            .cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Privacy-first"))
            .stdout(predicate::str::contains("ingest"))
            .stdout(predicate::str::contains("ask"));
    }

    #[test]
    fn unknown_command_fails() {
        Workspace::new().cmd().arg("frobnicate").assert().failure();
    }

    #[test]
    fn verbose_enables_debug_logs() {
        Workspace::new()
            .cmd()
            .args(["-vv", "status"])
            .assert()
            .success()
            .stderr(predicate::str::contains("merging project config"));
    }

    #[test]
    fn quiet_by_default() {
        Workspace::new()
            .cmd()
            .arg("status")
            .assert()
            .success()
            .stderr(predicate::str::contains("merging project config").not());
    }
}

mod status {
    use super::*;

    #[test]
    fn empty_collection() {
        Workspace::new()
            .cmd()
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("AskYourDocs Status"))
            .stdout(predicate::str::contains("No documents ingested yet"))
            .stdout(predicate::str::contains(".askyourdocs.yaml"));
    }

    #[test]
    fn after_ingest() {
        let ws = Workspace::with_docs();
        ws.ingest();
        ws.cmd()
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("No documents ingested yet").not())
            .stdout(predicate::str::contains("current"));
    }

    #[test]
    fn reports_changed_settings() {
        let ws = Workspace::with_docs();
        ws.ingest();
        ws.write(".askyourdocs.yaml", &format!("{PROJECT_CONFIG}chunking:\n  chunk_size: 300\n"));
        ws.cmd()
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("refresh --full"));
    }
}

mod config {
    use super::*;

    #[test]
    fn show_prints_effective_yaml() {
        Workspace::new()
            .cmd()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("embedding:"))
            .stdout(predicate::str::contains("provider: hash"));
    }

    #[test]
    fn get_reads_merged_value() {
        Workspace::new()
            .cmd()
            .args(["config", "get", "embedding.provider"])
            .assert()
            .success()
            .stdout(predicate::str::contains("hash"));
    }

    #[test]
    fn get_unknown_key_fails() {
        Workspace::new()
            .cmd()
            .args(["config", "get", "model.nonexistent"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("error:"));
    }

    #[test]
    fn set_writes_global_file() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["config", "set", "retrieval.top_k", "7"])
            .assert()
            .success()
            .stdout(predicate::str::contains("retrieval.top_k = 7"));
        ws.cmd()
            .args(["config", "get", "retrieval.top_k"])
            .assert()
            .success()
            .stdout(predicate::str::contains("7"));
    }

    #[test]
    fn set_rejects_invalid_value() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["config", "set", "retrieval.similarity_threshold", "1.5"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("similarity_threshold"));
        ws.cmd()
            .args(["config", "get", "retrieval.similarity_threshold"])
            .assert()
            .success()
            .stdout(predicate::str::contains("1.5").not());
    }

    #[test]
    fn set_local_writes_project_file() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["config", "set", "--local", "model.temperature", "0.3"])
            .assert()
            .success();
        let content = fs::read_to_string(ws.work().join(".askyourdocs.yaml")).unwrap();
        assert!(content.contains("temperature: 0.3"));
        assert!(content.contains("provider: hash"));
    }

    #[test]
    fn path_lists_locations() {
        Workspace::new()
            .cmd()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Config file:"))
            .stdout(predicate::str::contains("config.yaml"))
            .stdout(predicate::str::contains("Data dir:"));
    }

    #[test]
    fn validate_accepts_defaults() {
        Workspace::new()
            .cmd()
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration is valid."));
    }

    #[test]
    fn invalid_project_file_fails_with_hint() {
        let ws = Workspace::new();
        ws.write(".askyourdocs.yaml", "retrieval:\n  retrieval_mode: sideways\n");
        ws.cmd()
            .arg("status")
            .assert()
            .failure()
            .stderr(predicate::str::contains("hint:"));
    }

    #[test]
    fn reset_without_confirmation_aborts() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["config", "set", "retrieval.top_k", "9"])
            .assert()
            .success();
        ws.cmd()
            .args(["config", "reset"])
            .write_stdin("n\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("Aborted."));
        ws.cmd()
            .args(["config", "get", "retrieval.top_k"])
            .assert()
            .stdout(predicate::str::contains("9"));
    }

    #[test]
    fn reset_restores_defaults() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["config", "set", "retrieval.top_k", "9"])
            .assert()
            .success();
        ws.cmd().args(["config", "reset", "--yes"]).assert().success();
        ws.cmd()
            .args(["config", "get", "retrieval.top_k"])
            .assert()
            .stdout(predicate::str::contains("5"));
    }
}

mod ingest {
    use super::*;

    #[test]
    fn second_run_is_up_to_date() {
        let ws = Workspace::with_docs();
        ws.ingest();
        ws.cmd()
            .args(["ingest", "docs"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Collection is up to date."));
    }

    #[test]
    fn missing_path_fails() {
        Workspace::new()
            .cmd()
            .args(["ingest", "nowhere"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("path does not exist"));
    }

    #[test]
    fn empty_directory_finds_nothing() {
        let ws = Workspace::new();
        fs::create_dir_all(ws.work().join("empty")).unwrap();
        ws.cmd()
            .args(["ingest", "empty"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No supported documents found."));
    }

    #[test]
    fn exclude_pattern_skips_files() {
        let ws = Workspace::with_docs();
        ws.cmd()
            .args(["ingest", "docs", "--exclude", "*.txt"])
            .assert()
            .success();
        let out = ws.json(&["search", "mutable borrow", "--json"]);
        let results = out["results"].as_array().unwrap();
        assert!(
            results
                .iter()
                .all(|r| !r["file"].as_str().unwrap().ends_with("borrowing.txt"))
        );
    }
}

mod search {
    use super::*;

    #[test]
    fn finds_matching_document() {
        let ws = Workspace::with_docs();
        ws.ingest();
        let out = ws.json(&["search", "pasta", "--json"]);
        assert_eq!(out["query"], "pasta");
        let results = out["results"].as_array().unwrap();
        assert!(!results.is_empty());
        assert!(results[0]["file"].as_str().unwrap().ends_with("cooking.md"));
    }

    #[test]
    fn table_output() {
        let ws = Workspace::with_docs();
        ws.ingest();
        ws.cmd()
            .args(["search", "ownership"])
            .assert()
            .success()
            .stdout(predicate::str::contains("ownership.md"));
    }

    #[test]
    fn empty_collection_hints_ingest() {
        Workspace::new()
            .cmd()
            .args(["search", "anything"])
            .assert()
            .success()
            .stdout(predicate::str::contains("askyourdocs ingest"));
    }
}

mod similar {
    use super::*;

    #[test]
    fn lists_documents() {
        let ws = Workspace::with_docs();
        ws.ingest();
        let out = ws.json(&["similar", "mutable borrow of a value", "--json"]);
        let results = out["results"].as_array().unwrap();
        assert!(!results.is_empty());
        let mut files: Vec<&str> = results
            .iter()
            .map(|r| r["file_path"].as_str().unwrap())
            .collect();
        let total = files.len();
        files.dedup();
        assert_eq!(files.len(), total);
    }

    #[test]
    fn requires_ingested_documents() {
        Workspace::new()
            .cmd()
            .args(["similar", "anything"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("askyourdocs ingest"));
    }
}

mod ask {
    use super::*;

    #[test]
    fn requires_ingested_documents() {
        Workspace::new()
            .cmd()
            .args(["ask", "what is ownership?"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("askyourdocs ingest"));
    }

    #[test]
    fn rejects_blank_question() {
        Workspace::new()
            .cmd()
            .args(["ask", "   "])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Question cannot be empty"));
    }

    #[test]
    fn rejects_bad_top_k() {
        Workspace::new()
            .cmd()
            .args(["ask", "what is ownership?", "-k", "0"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("top_k"));
    }

    #[test]
    fn unreachable_model_reports_connection() {
        let ws = Workspace::with_docs();
        ws.ingest();
        ws.cmd()
            .args(["ask", "who owns a value?", "-m", "keyword", "--no-stream"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("cannot connect to ollama"));
    }
}

mod interactive {
    use super::*;

    #[test]
    fn exits_on_exit_word() {
        let ws = Workspace::with_docs();
        ws.ingest();
        ws.cmd()
            .arg("interactive")
            .write_stdin("\nexit\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("interactive mode"))
            .stdout(predicate::str::contains("Goodbye."));
    }

    #[test]
    fn exits_on_end_of_input() {
        let ws = Workspace::with_docs();
        ws.ingest();
        ws.cmd()
            .arg("interactive")
            .write_stdin("")
            .assert()
            .success()
            .stdout(predicate::str::contains("Goodbye."));
    }

    #[test]
    fn requires_ingested_documents() {
        Workspace::new()
            .cmd()
            .arg("interactive")
            .write_stdin("exit\n")
            .assert()
            .failure();
    }
}

mod refresh {
    use super::*;

    #[test]
    fn nothing_ingested() {
        Workspace::new()
            .cmd()
            .arg("refresh")
            .assert()
            .success()
            .stdout(predicate::str::contains("Nothing to refresh"));
    }

    #[test]
    fn picks_up_changes() {
        let ws = Workspace::with_docs();
        ws.ingest();
        ws.write("docs/new.md", "# Lifetimes\n\nLifetimes name the scope a reference is valid for.\n");
        ws.cmd()
            .arg("refresh")
            .assert()
            .success()
            .stdout(predicate::str::contains("Refresh complete."));
        let out = ws.json(&["search", "lifetimes", "--json"]);
        assert!(!out["results"].as_array().unwrap().is_empty());
    }

    #[test]
    fn unchanged_is_up_to_date() {
        let ws = Workspace::with_docs();
        ws.ingest();
        ws.cmd()
            .arg("refresh")
            .assert()
            .success()
            .stdout(predicate::str::contains("Collection is up to date."));
    }

    #[test]
    fn full_rebuilds() {
        let ws = Workspace::with_docs();
        ws.ingest();
        ws.cmd()
            .args(["refresh", "--full"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Rebuilding collection"))
            .stdout(predicate::str::contains("Refresh complete."));
    }
}

mod reset {
    use super::*;

    #[test]
    fn deletes_collection() {
        let ws = Workspace::with_docs();
        ws.ingest();
        ws.cmd()
            .args(["reset", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Deleted collection"));
        ws.cmd()
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("No documents ingested yet"));
    }

    #[test]
    fn declined_prompt_keeps_collection() {
        let ws = Workspace::with_docs();
        ws.ingest();
        ws.cmd()
            .arg("reset")
            .write_stdin("no\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("Aborted."));
        let out = ws.json(&["search", "pasta", "--json"]);
        assert!(!out["results"].as_array().unwrap().is_empty());
    }

    #[test]
    fn empty_collection_is_fine() {
        Workspace::new().cmd().args(["reset", "-y"]).assert().success();
    }
}

#[cfg(unix)]
mod watch {
    use std::{
        io::{BufRead, BufReader},
        process::{self, Child, ExitStatus, Stdio},
        sync::mpsc,
        thread,
        time::{Duration, Instant},
    };

    use assert_cmd::cargo::CommandCargoExt;

    use super::*;

    /// Starts `askyourdocs` in the background with the same isolation as
    /// [`Workspace::cmd`] and stdout piped.
    fn spawn(ws: &Workspace, args: &[&str]) -> Child {
        #[allow(deprecated)]
        let mut cmd = process::Command::cargo_bin("askyourdocs").unwrap();
        let home = ws.dir.path();
        cmd.args(args)
            .current_dir(ws.work())
            .env("HOME", home)
            .env("XDG_CONFIG_HOME", home.join("config"))
            .env("XDG_DATA_HOME", home.join("data"))
            .env("XDG_CACHE_HOME", home.join("cache"))
            .env("NO_COLOR", "1")
            .env_remove("ASKYOURDOCS_CONFIG")
            .env_remove("RUST_LOG")
            .env_remove("OPENAI_API_KEY")
            .env_remove("ANTHROPIC_API_KEY")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        cmd.spawn().unwrap()
    }

    /// Waits up to ten seconds for the child to exit, killing it otherwise.
    fn wait_for_exit(child: &mut Child) -> Option<ExitStatus> {
        let deadline = Instant::now() + Duration::from_secs(10);
        while Instant::now() < deadline {
            if let Some(status) = child.try_wait().unwrap() {
                return Some(status);
            }
            thread::sleep(Duration::from_millis(50));
        }
        child.kill().unwrap();
        None
    }

    #[test]
    fn interrupt_stops_watching_and_releases_collection() {
        let ws = Workspace::with_docs();
        let mut child = spawn(&ws, &["ingest", "docs", "--watch"]);

        let stdout = child.stdout.take().unwrap();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for line in BufReader::new(stdout).lines().map_while(Result::ok) {
                if line.contains("Watching for changes") {
                    tx.send(()).ok();
                }
            }
        });
        if rx.recv_timeout(Duration::from_secs(20)).is_err() {
            child.kill().unwrap();
            panic!("watch mode never started");
        }
        thread::sleep(Duration::from_millis(500));

        let signalled = process::Command::new("kill")
            .args(["-INT", &child.id().to_string()])
            .status()
            .unwrap();
        assert!(signalled.success());
        let status = wait_for_exit(&mut child).expect("watch did not stop after Ctrl-C");
        assert!(status.success(), "exited with {status:?}");

        ws.cmd()
            .args(["reset", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Deleted collection"));
    }
}
