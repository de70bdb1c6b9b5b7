use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::RawConfig;
use crate::engine::TriggerEngine;
use crate::github::DiffClient;
use crate::jenkins::{Dispatcher, JenkinsClient};
use crate::model::CompiledConfig;
use crate::output::{self, DispatchProgress};
use crate::secrets::Secrets;
use crate::server::{self, AppState};

#[derive(Parser)]
#[command(name = "github2jenkins")]
#[command(author, version, about = "Trigger Jenkins jobs from GitHub push hooks", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (YAML, JSON or TOML)
    #[arg(short, long, global = true, env = "G2J_CONFIG")]
    config: Option<PathBuf>,

    /// Secrets file (JSON, YAML or TOML map of key to secret)
    #[arg(short, long, global = true, env = "G2J_SECRETS")]
    secrets: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Listen for GitHub hooks and trigger matching jobs
    Serve {
        /// Overrides `server.listen` from the configuration
        #[arg(short, long)]
        listen: Option<SocketAddr>,
    },

    /// Validate the configuration and list every job
    Check,

    /// Show which jobs a push would trigger, without triggering them
    Plan {
        #[arg(short, long)]
        repo: String,

        #[arg(short = 'b', long = "ref")]
        ref_: String,

        /// Changed file paths, relative to the repository root
        files: Vec<String>,
    },

    /// Trigger the jobs matching a push by hand
    Trigger {
        #[arg(short, long)]
        repo: String,

        #[arg(short = 'b', long = "ref")]
        ref_: String,

        #[arg(long, default_value = "Triggered manually")]
        cause: String,

        /// Changed file paths, relative to the repository root
        files: Vec<String>,
    },
}

impl Cli {
    /// Loads and compiles the configuration, failing fast on any invalid job.
    fn load_config(&self) -> Result<CompiledConfig> {
        let raw = RawConfig::load(self.config.as_deref())?;
        let secrets = match &self.secrets {
            Some(path) => Secrets::load(path)?,
            None => Secrets::default(),
        };

        let config = CompiledConfig::compile(&raw, &secrets)?;
        info!(
            "Loaded {} repositories with {} jobs",
            config.repositories.len(),
            config.job_count()
        );
        Ok(config)
    }

    fn build_engine(config: CompiledConfig) -> Result<TriggerEngine> {
        let jenkins = JenkinsClient::from_settings(&config.jenkins)?;
        Ok(TriggerEngine::new(
            Arc::new(config),
            Dispatcher::new(jenkins),
        ))
    }

    async fn execute_serve(&self, listen: Option<SocketAddr>) -> Result<()> {
        let config = self.load_config()?;
        let listen = listen.unwrap_or(config.listen);
        let diff = DiffClient::from_settings(&config.github)?;
        let engine = Self::build_engine(config)?;

        server::serve(listen, Arc::new(AppState { engine, diff })).await
    }

    fn execute_check(&self) -> Result<()> {
        let config = self.load_config()?;
        output::print_config(&config);
        Ok(())
    }

    fn execute_plan(&self, repo: &str, ref_: &str, files: &[String]) -> Result<()> {
        let engine = Self::build_engine(self.load_config()?)?;
        let jobs = engine.plan(repo, ref_, files)?;
        output::print_plan(repo, ref_, &jobs);
        Ok(())
    }

    async fn execute_trigger(
        &self,
        repo: &str,
        ref_: &str,
        cause: &str,
        files: &[String],
    ) -> Result<()> {
        let engine = Self::build_engine(self.load_config()?)?;
        let planned = engine.plan(repo, ref_, files)?.len();

        let progress = DispatchProgress::start(planned);
        let report = engine.trigger(repo, ref_, files, cause).await?;
        progress.finish(report.failures());

        output::print_report(&report);

        if !report.all_succeeded() {
            bail!("{} jobs failed to trigger", report.failures());
        }
        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Serve { listen } => self.execute_serve(*listen).await,
            Commands::Check => self.execute_check(),
            Commands::Plan { repo, ref_, files } => self.execute_plan(repo, ref_, files),
            Commands::Trigger {
                repo,
                ref_,
                cause,
                files,
            } => self.execute_trigger(repo, ref_, cause, files).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_plan_command() {
        let cli = Cli::try_parse_from([
            "github2jenkins",
            "--config",
            "conf.yaml",
            "plan",
            "--repo",
            "my-repo",
            "--ref",
            "master",
            "a/b.rs",
            "c.md",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("conf.yaml")));
        match cli.command {
            Commands::Plan { repo, ref_, files } => {
                assert_eq!(repo, "my-repo");
                assert_eq!(ref_, "master");
                assert_eq!(files, vec!["a/b.rs", "c.md"]);
            }
            _ => panic!("expected plan command"),
        }
    }

    #[test]
    fn test_parse_serve_listen() {
        let cli = Cli::try_parse_from(["github2jenkins", "serve", "--listen", "127.0.0.1:9090"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Serve { listen: Some(addr) } if addr.port() == 9090
        ));
    }

    #[test]
    fn test_load_config_fails_on_missing_secret() {
        let mut config_file = NamedTempFile::with_suffix(".yaml").unwrap();
        write!(
            config_file,
            r#"
jenkins:
  url: http://jenkins
repositories:
  - name: repo
    projects:
      - jobs:
          - name: build
            token-key: MISSING
            branch-matcher: master
            diff-matcher: .*
"#
        )
        .unwrap();
        let mut secrets_file = NamedTempFile::with_suffix(".json").unwrap();
        write!(secrets_file, r#"{{ "OTHER": "x" }}"#).unwrap();

        let cli = Cli::try_parse_from([
            OsStr::new("github2jenkins"),
            OsStr::new("--config"),
            config_file.path().as_os_str(),
            OsStr::new("--secrets"),
            secrets_file.path().as_os_str(),
            OsStr::new("check"),
        ])
        .unwrap();

        let err = cli.load_config().unwrap_err();
        assert!(err.to_string().contains("MISSING"));
    }
}
