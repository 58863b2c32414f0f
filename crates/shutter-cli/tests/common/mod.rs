use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;
use url::Url;

/// An isolated HOME plus an empty file store.
pub struct Sandbox {
    _dir: TempDir,
    home: PathBuf,
    store_url: String,
}

impl Sandbox {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("home");
        let store = dir.path().join("store");
        std::fs::create_dir_all(&home).unwrap();
        std::fs::create_dir_all(&store).unwrap();

        let store_url = Url::from_directory_path(&store)
            .expect("Failed to convert path to file URL")
            .to_string();

        Self {
            _dir: dir,
            home,
            store_url,
        }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn store_url(&self) -> &str {
        &self.store_url
    }

    /// Run the CLI with the sandbox's HOME and store.
    pub fn run(&self, args: &[&str]) -> Output {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_shutter"));
        cmd.args(args);
        cmd.env("HOME", &self.home);
        cmd.env("XDG_DATA_HOME", self.home.join("data"));
        cmd.env("NO_COLOR", "1");
        cmd.env_remove("SHUTTER_USER");
        cmd.env_remove("SHUTTER_TOKEN");
        if !args.contains(&"--store") {
            cmd.env("SHUTTER_STORE", &self.store_url);
        }
        cmd.output().expect("Failed to execute CLI")
    }

    /// Run the CLI and expect success.
    pub fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    /// Run the CLI with `--json` and parse each output line.
    pub fn run_json(&self, args: &[&str]) -> Vec<serde_json::Value> {
        let mut args = args.to_vec();
        args.push("--json");
        self.run_success(&args)
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).expect("invalid JSON line"))
            .collect()
    }
}
