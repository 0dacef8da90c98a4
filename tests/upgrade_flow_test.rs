//! End-to-end upgrade runs against scripted interpreters.

use std::fs;
use std::path::{Path, PathBuf};

use kamek::download::{DownloadResolver, ReleaseCycle, StaticFetcher, StaticMetadata};
use kamek::error::ErrorKind;
use kamek::shell::{HostPlatform, ScriptedRunner, StaticEnv};
use kamek::toolchain::{ToolchainDetector, VersionTuple};
use kamek::ui::MockUI;
use kamek::upgrade::{
    SessionStatus, UpgradeOrchestrator, UpgradeReport, UpgradeSettings,
    CONTINUE_WITHOUT_MIGRATION_KEY, NEW_INTERPRETER_PATH_KEY,
};
use tempfile::TempDir;

const FREEZE: &str = "PyYAML==6.0.1\npyelftools==0.31\n# editable install skipped\n";

struct Fixture {
    temp: TempDir,
    old: PathBuf,
    new: PathBuf,
    metadata: StaticMetadata,
    fetcher: StaticFetcher,
}

impl Fixture {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let old = touch(temp.path(), "old/bin/python3");
        let new = touch(temp.path(), "new/bin/python3");
        Self {
            temp,
            old,
            new,
            metadata: StaticMetadata::new(vec![
                ReleaseCycle::new(VersionTuple::new(3, 11, 9), false),
                ReleaseCycle::new(VersionTuple::new(3, 12, 4), false),
            ]),
            fetcher: StaticFetcher::serving(b"installer bytes"),
        }
    }

    fn old_str(&self) -> String {
        self.old.to_string_lossy().into_owned()
    }

    fn new_str(&self) -> String {
        self.new.to_string_lossy().into_owned()
    }

    fn download_dir(&self) -> PathBuf {
        self.temp.path().join("downloads")
    }

    /// Old interpreter at `old_version` with a working `pip freeze`; new one at 3.12.4.
    fn runner(&self, old_version: &str) -> ScriptedRunner {
        let old = self.old_str();
        let new = self.new_str();
        ScriptedRunner::new()
            .respond(&[&old, "--version"], 0, &format!("Python {}\n", old_version))
            .respond(&[&old, "-m", "pip", "freeze"], 0, FREEZE)
            .respond(&[&new, "--version"], 0, "Python 3.12.4\n")
            .respond(&[&new, "-m", "pip", "install", "--upgrade", "pip"], 0, "")
            .respond(&[&new, "-m", "pip", "install", "-r"], 0, "Successfully installed\n")
    }

    fn run(&self, runner: &ScriptedRunner, ui: &mut MockUI) -> UpgradeReport {
        let env = StaticEnv::new();
        let detector = ToolchainDetector::new(runner, &env, HostPlatform::Unix);
        let resolver = DownloadResolver::new(&self.metadata);
        let settings = UpgradeSettings {
            min_version: VersionTuple::new(3, 8, 0),
            version_token: "latest".to_string(),
            os_filter: "windows".to_string(),
            download_dir: self.download_dir(),
            max_path_attempts: 3,
        };
        let orchestrator =
            UpgradeOrchestrator::new(runner, &detector, &resolver, &self.fetcher, settings);
        orchestrator.run(ui, Some(&self.old), None)
    }

    fn leftover_manifests(&self) -> Vec<PathBuf> {
        match fs::read_dir(self.download_dir()) {
            Ok(entries) => entries
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| p.to_string_lossy().contains("kamek-migration"))
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

fn touch(root: &Path, rel: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "").unwrap();
    path
}

#[test]
fn full_upgrade_migrates_packages() {
    let fx = Fixture::new();
    let runner = fx.runner("3.8.10");
    let mut ui = MockUI::new();
    ui.set_prompt_response(NEW_INTERPRETER_PATH_KEY, &fx.new_str());

    let report = fx.run(&runner, &mut ui);

    assert_eq!(report.status, SessionStatus::Completed);
    assert!(report.is_success());
    assert_eq!(report.migrated_packages, 2);
    assert_eq!(
        report.old_runtime.as_ref().unwrap().version,
        VersionTuple::new(3, 8, 10)
    );
    assert_eq!(
        report.new_runtime.as_ref().unwrap().version,
        VersionTuple::new(3, 12, 4)
    );
    assert!(report.failures.is_empty());
    assert!(report.next_action.is_some());

    let download = report.download.as_ref().unwrap();
    assert!(download.resolved_url.ends_with("python-3.12.4-amd64.exe"));
    assert!(!download.is_fallback);
    let installer = report.installer.as_ref().unwrap();
    assert!(installer.path.starts_with(fx.download_dir()));
    assert_eq!(installer.sha256.len(), 64);
    assert_eq!(fx.fetcher.requested(), vec![download.resolved_url.clone()]);

    assert!(ui.has_success("Migrated 2 packages"));
    assert_eq!(ui.prompt_count(NEW_INTERPRETER_PATH_KEY), 1);
}

#[test]
fn migration_upgrades_pip_before_reinstalling() {
    let fx = Fixture::new();
    let runner = fx.runner("3.8.10");
    let mut ui = MockUI::new();
    ui.set_prompt_response(NEW_INTERPRETER_PATH_KEY, &fx.new_str());

    fx.run(&runner, &mut ui);

    let new = fx.new_str();
    let calls = runner.calls();
    let upgrade_pip = calls
        .iter()
        .position(|c| c.ends_with(&["--upgrade".to_string(), "pip".to_string()]))
        .unwrap();
    let reinstall = calls
        .iter()
        .position(|c| c.len() > 5 && c[0] == new && c[4] == "-r")
        .unwrap();
    assert!(upgrade_pip < reinstall);
}

#[test]
fn manifest_is_removed_after_migration() {
    let fx = Fixture::new();
    let runner = fx.runner("3.8.10");
    let mut ui = MockUI::new();
    ui.set_prompt_response(NEW_INTERPRETER_PATH_KEY, &fx.new_str());

    let report = fx.run(&runner, &mut ui);

    assert_eq!(report.status, SessionStatus::Completed);
    assert!(fx.leftover_manifests().is_empty());
}

#[test]
fn reinstall_failure_is_partial_failure() {
    let fx = Fixture::new();
    let old = fx.old_str();
    let new = fx.new_str();
    let runner = ScriptedRunner::new()
        .respond(&[&old, "--version"], 0, "Python 3.9.2\n")
        .respond(&[&old, "-m", "pip", "freeze"], 0, FREEZE)
        .respond(&[&new, "--version"], 0, "Python 3.12.4\n")
        .respond(&[&new, "-m", "pip", "install", "--upgrade", "pip"], 0, "")
        .respond_full(
            &[&new, "-m", "pip", "install", "-r"],
            1,
            "",
            "ERROR: No matching distribution found for pyelftools==0.31\n",
        );
    let mut ui = MockUI::new();
    ui.set_prompt_response(NEW_INTERPRETER_PATH_KEY, &new);

    let report = fx.run(&runner, &mut ui);

    assert_eq!(report.status, SessionStatus::PartialFailure);
    assert!(!report.is_success());
    assert_eq!(report.migrated_packages, 0);
    let failure = report
        .failures
        .iter()
        .find(|f| f.step == "reinstall_packages")
        .unwrap();
    assert!(failure.message.contains("No matching distribution"));
    assert!(fx.leftover_manifests().is_empty());
    assert!(report.next_action.unwrap().contains("pip install"));
}

#[test]
fn pip_self_upgrade_failure_does_not_stop_migration() {
    let fx = Fixture::new();
    let old = fx.old_str();
    let new = fx.new_str();
    let runner = ScriptedRunner::new()
        .respond(&[&old, "--version"], 0, "Python 3.10.1\n")
        .respond(&[&old, "-m", "pip", "freeze"], 0, FREEZE)
        .respond(&[&new, "--version"], 0, "Python 3.12.4\n")
        .respond_full(
            &[&new, "-m", "pip", "install", "--upgrade", "pip"],
            1,
            "",
            "network unreachable",
        )
        .respond(&[&new, "-m", "pip", "install", "-r"], 0, "");
    let mut ui = MockUI::new();
    ui.set_prompt_response(NEW_INTERPRETER_PATH_KEY, &new);

    let report = fx.run(&runner, &mut ui);

    assert_eq!(report.status, SessionStatus::Completed);
    assert_eq!(report.migrated_packages, 2);
    assert!(report.failures.iter().any(|f| f.step == "upgrade_pip"));
    assert!(report
        .advisories
        .iter()
        .any(|a| a.code == "package_manager_upgrade_failed"));
}

#[test]
fn old_path_is_rejected_then_new_path_accepted() {
    let fx = Fixture::new();
    let runner = fx.runner("3.8.10");
    let mut ui = MockUI::new();
    ui.queue_prompt_responses(
        NEW_INTERPRETER_PATH_KEY,
        vec![fx.old_str().as_str(), fx.new_str().as_str()],
    );

    let report = fx.run(&runner, &mut ui);

    assert_eq!(report.status, SessionStatus::Completed);
    assert_eq!(ui.prompt_count(NEW_INTERPRETER_PATH_KEY), 2);
    assert!(ui.has_warning("is the interpreter being replaced"));
    assert_eq!(report.new_runtime.unwrap().executable_path, fx.new);
}

#[test]
fn nonexistent_path_is_retried() {
    let fx = Fixture::new();
    let runner = fx.runner("3.8.10");
    let missing = fx.temp.path().join("nowhere/python3");
    let missing = missing.to_string_lossy().into_owned();
    let mut ui = MockUI::new();
    ui.queue_prompt_responses(
        NEW_INTERPRETER_PATH_KEY,
        vec![missing.as_str(), fx.new_str().as_str()],
    );

    let report = fx.run(&runner, &mut ui);

    assert_eq!(report.status, SessionStatus::Completed);
    assert_eq!(ui.prompt_count(NEW_INTERPRETER_PATH_KEY), 2);
}

#[test]
fn too_old_new_interpreter_is_retried() {
    let fx = Fixture::new();
    let old = fx.old_str();
    let new = fx.new_str();
    let older = touch(fx.temp.path(), "older/bin/python3");
    let older_str = older.to_string_lossy().into_owned();
    let runner = ScriptedRunner::new()
        .respond(&[&old, "--version"], 0, "Python 3.9.0\n")
        .respond(&[&old, "-m", "pip", "freeze"], 0, FREEZE)
        .respond(&[&older_str, "--version"], 0, "Python 3.7.9\n")
        .respond(&[&new, "--version"], 0, "Python 3.12.4\n")
        .respond(&[&new, "-m", "pip", "install"], 0, "");
    let mut ui = MockUI::new();
    ui.queue_prompt_responses(NEW_INTERPRETER_PATH_KEY, vec![older_str.as_str(), new.as_str()]);

    let report = fx.run(&runner, &mut ui);

    assert_eq!(report.status, SessionStatus::Completed);
    assert!(ui.has_warning("was not accepted"));
}

#[test]
fn exhausting_path_attempts_aborts() {
    let fx = Fixture::new();
    let runner = fx.runner("3.8.10");
    let mut ui = MockUI::new();
    ui.set_prompt_response(NEW_INTERPRETER_PATH_KEY, &fx.old_str());

    let report = fx.run(&runner, &mut ui);

    assert_eq!(report.status, SessionStatus::Aborted);
    assert_eq!(ui.prompt_count(NEW_INTERPRETER_PATH_KEY), 3);
    let abort = report.abort_reason.unwrap();
    assert_eq!(abort.step, "confirm_new_path");
    assert_eq!(abort.kind, ErrorKind::UserAborted);
    assert!(!runner.was_called_with(&[&fx.new_str(), "-m", "pip"]));
}

#[test]
fn skip_completes_without_migration() {
    let fx = Fixture::new();
    let runner = fx.runner("3.8.10");
    let mut ui = MockUI::new();
    ui.set_prompt_response(NEW_INTERPRETER_PATH_KEY, "SKIP");

    let report = fx.run(&runner, &mut ui);

    assert_eq!(report.status, SessionStatus::Completed);
    assert_eq!(report.migrated_packages, 0);
    assert!(report.new_runtime.is_none());
    assert!(report.advisories.iter().any(|a| a.code == "migration_skipped"));
    assert!(!runner.was_called_with(&[&fx.new_str()]));
    assert!(report.next_action.unwrap().contains("kamek packages"));
}

#[test]
fn snapshot_failure_declined_aborts_before_download() {
    let fx = Fixture::new();
    let old = fx.old_str();
    let runner = ScriptedRunner::new()
        .respond(&[&old, "--version"], 0, "Python 3.8.10\n")
        .respond_full(&[&old, "-m", "pip", "freeze"], 1, "", "No module named pip\n");
    let mut ui = MockUI::new();
    ui.set_prompt_response(CONTINUE_WITHOUT_MIGRATION_KEY, "n");

    let report = fx.run(&runner, &mut ui);

    assert_eq!(report.status, SessionStatus::Aborted);
    assert!(fx.fetcher.requested().is_empty());
    assert!(report.failures.iter().any(|f| f.step == "snapshot"));
    assert_eq!(report.abort_reason.unwrap().kind, ErrorKind::UserAborted);
    assert!(ui.has_warning("No module named pip"));
}

#[test]
fn snapshot_failure_accepted_continues_without_migration() {
    let fx = Fixture::new();
    let old = fx.old_str();
    let new = fx.new_str();
    let runner = ScriptedRunner::new()
        .respond(&[&old, "--version"], 0, "Python 3.8.10\n")
        .missing(&[&old, "-m", "pip"])
        .respond(&[&new, "--version"], 0, "Python 3.12.4\n");
    let mut ui = MockUI::new();
    ui.set_prompt_response(CONTINUE_WITHOUT_MIGRATION_KEY, "yes");
    ui.set_prompt_response(NEW_INTERPRETER_PATH_KEY, &new);

    let report = fx.run(&runner, &mut ui);

    assert_eq!(report.status, SessionStatus::Completed);
    assert_eq!(report.migrated_packages, 0);
    let codes: Vec<_> = report.advisories.iter().map(|a| a.code.as_str()).collect();
    assert!(codes.contains(&"no_snapshot"));
    assert!(codes.contains(&"no_migration"));
    assert!(!runner.was_called_with(&[&new, "-m", "pip"]));
}

#[test]
fn unanswered_snapshot_prompt_aborts() {
    let fx = Fixture::new();
    let old = fx.old_str();
    let runner = ScriptedRunner::new()
        .respond(&[&old, "--version"], 0, "Python 3.8.10\n")
        .respond(&[&old, "-m", "pip", "freeze"], 2, "");
    let mut ui = MockUI::new();

    let report = fx.run(&runner, &mut ui);

    assert_eq!(report.status, SessionStatus::Aborted);
    assert!(fx.fetcher.requested().is_empty());
}

#[test]
fn download_failure_aborts() {
    let mut fx = Fixture::new();
    fx.fetcher = StaticFetcher::failing();
    let runner = fx.runner("3.8.10");
    let mut ui = MockUI::new();
    ui.set_prompt_response(NEW_INTERPRETER_PATH_KEY, &fx.new_str());

    let report = fx.run(&runner, &mut ui);

    assert_eq!(report.status, SessionStatus::Aborted);
    let abort = report.abort_reason.unwrap();
    assert_eq!(abort.step, "download");
    assert_eq!(abort.kind, ErrorKind::ExternalFailure);
    assert_eq!(ui.prompt_count(NEW_INTERPRETER_PATH_KEY), 0);
    assert!(report.installer.is_none());
}

#[test]
fn unreachable_metadata_downloads_fallback_installer() {
    let mut fx = Fixture::new();
    fx.metadata = StaticMetadata::unreachable();
    let runner = fx.runner("3.8.10");
    let mut ui = MockUI::new();
    ui.set_prompt_response(NEW_INTERPRETER_PATH_KEY, "skip");

    let report = fx.run(&runner, &mut ui);

    assert_eq!(report.status, SessionStatus::Completed);
    assert!(report.download.unwrap().is_fallback);
    assert!(ui.has_warning("fallback installer"));
    assert!(ui.advisory_codes().contains(&"metadata_unavailable"));
}

#[test]
fn python2_interpreter_aborts_at_detection() {
    let fx = Fixture::new();
    let old = fx.old_str();
    // Python 2 prints its version banner on stderr.
    let runner = ScriptedRunner::new().respond_full(&[&old, "--version"], 0, "", "Python 2.7.18\n");
    let mut ui = MockUI::new();

    let report = fx.run(&runner, &mut ui);

    assert_eq!(report.status, SessionStatus::Aborted);
    let abort = report.abort_reason.unwrap();
    assert_eq!(abort.step, "detect");
    assert_eq!(abort.kind, ErrorKind::IncompatibleMajorVersion);
    assert!(report.next_action.unwrap().contains("Python 3"));
    assert!(fx.fetcher.requested().is_empty());
    assert!(!runner.was_called_with(&[&old, "-m", "pip", "freeze"]));
}

#[test]
fn too_old_interpreter_aborts_at_detection() {
    let fx = Fixture::new();
    let old = fx.old_str();
    let runner = ScriptedRunner::new().respond(&[&old, "--version"], 0, "Python 3.6.15\n");
    let mut ui = MockUI::new();

    let report = fx.run(&runner, &mut ui);

    assert_eq!(report.status, SessionStatus::Aborted);
    assert_eq!(report.abort_reason.unwrap().kind, ErrorKind::VersionTooOld);
}
