//! Shared helpers for CLI integration tests

#![allow(dead_code)]

use anyhow::Result;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

pub const BLOG_TEMPLATE: &str = r#"
captainVersion: 4
services:
  $$cap_appname:
    image: wordpress:$$cap_wp_version
    depends_on:
      - $$cap_appname-db
    ports:
      - "8080:80"
    environment:
      WORDPRESS_DB_PASSWORD: $$cap_db_pass
  $$cap_appname-db:
    image: mysql:8.0
    volumes:
      - $$cap_appname-db-data:/var/lib/mysql
    environment:
      MYSQL_ROOT_PASSWORD: $$cap_db_pass
caproverOneClickApp:
  displayName: Blog
  description: A blog with its database
  instructions:
    start: Deploying a blog named $$cap_appname.
    end: Visit http://$$cap_appname.$$cap_root_domain
  variables:
    - id: $$cap_wp_version
      label: WordPress version
      defaultValue: latest
      validRegex: /^([^\s^\/])+$/
    - id: $$cap_db_pass
      label: Database password
      defaultValue: $$cap_gen_random_hex(16)
      validRegex: /.{8,}/
"#;

/// Temporary directory holding templates and config files
pub struct CliTestContext {
    dir: TempDir,
}

impl CliTestContext {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn create_file(&self, filename: &str, content: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(filename);
        std::fs::write(&path, content)?;
        Ok(path)
    }

    pub fn run_cli_command(&self, args: &[&str]) -> Result<CliOutput> {
        let output = Command::new(env!("CARGO_BIN_EXE_oneclick"))
            .args(args)
            .current_dir(self.dir.path())
            .env_remove("CAPTAIN_URL")
            .env_remove("CAPTAIN_PASSWORD")
            .output()?;

        Ok(CliOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            exit_code: output.status.code(),
        })
    }
}

pub struct CliOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub exit_code: Option<i32>,
}

impl CliOutput {
    pub fn assert_success(&self) -> &Self {
        if !self.success {
            panic!(
                "Command failed with exit code {:?}\nSTDOUT:\n{}\nSTDERR:\n{}",
                self.exit_code, self.stdout, self.stderr
            );
        }
        self
    }

    pub fn assert_failure(&self) -> &Self {
        if self.success {
            panic!(
                "Command succeeded but was expected to fail\nSTDOUT:\n{}\nSTDERR:\n{}",
                self.stdout, self.stderr
            );
        }
        self
    }

    pub fn assert_contains(&self, text: &str) -> &Self {
        if !self.stdout.contains(text) && !self.stderr.contains(text) {
            panic!(
                "Output does not contain '{}'\nSTDOUT:\n{}\nSTDERR:\n{}",
                text, self.stdout, self.stderr
            );
        }
        self
    }

    pub fn assert_not_contains(&self, text: &str) -> &Self {
        if self.stdout.contains(text) || self.stderr.contains(text) {
            panic!(
                "Output contains '{}' but should not\nSTDOUT:\n{}\nSTDERR:\n{}",
                text, self.stdout, self.stderr
            );
        }
        self
    }
}
