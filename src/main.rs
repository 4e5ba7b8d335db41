// agb-rs: Active Git Backup
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Entry point.
//!
//! ```text
//! cli::parse() --> GitRepo::discover(-C) --> Config --> Logging
//!   --> Command Dispatch
//!         version | options | inis         (no repository needed)
//!         everything else  --> Session on a blocking thread,
//!                              Ctrl+C cancels its token
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use agb_rs::backup::Session;
use agb_rs::cli::global::GlobalOptions;
use agb_rs::cli::{self, Command};
use agb_rs::cmd::backup::run_backup_command;
use agb_rs::cmd::config::{run_inis_command, run_options_command};
use agb_rs::config::loader::ConfigLoader;
use agb_rs::config::{CONFIG_FILE_NAME, Config};
use agb_rs::error::Result;
use agb_rs::git::GitRepo;
use agb_rs::logging::{LogConfig, init_logging};
use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::parse();

    let Some(command) = cli.command else {
        eprintln!("No command specified. Use --help for usage information.");
        return ExitCode::FAILURE;
    };
    if matches!(command, Command::Version) {
        handle_version_command();
        return ExitCode::SUCCESS;
    }

    let repo = discover_repo(&cli.global);
    let loader = match build_config_loader(&cli.global, repo.as_ref().ok().map(GitRepo::root)) {
        Ok(loader) => loader,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    if matches!(command, Command::Inis) {
        run_inis_command(&loader.format_loaded_files());
        return ExitCode::SUCCESS;
    }
    let config = match loader.build() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = match init_logging(&build_log_config(&config)) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match command {
        Command::Options => {
            run_options_command(&config);
            Ok(())
        }
        command => match repo {
            Ok(repo) => dispatch_command(command, repo, config).await,
            Err(e) => Err(e),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn build_log_config(config: &Config) -> LogConfig {
    LogConfig::builder()
        .with_console_level(config.global.output_log_level)
        .with_file_level(config.global.file_log_level)
        .maybe_with_log_file(config.global.log_file.clone())
        .build()
}

async fn dispatch_command(command: Command, repo: GitRepo, config: Config) -> Result<()> {
    let cancel = CancellationToken::new();
    let session = Session::open(repo, config).with_cancel_token(cancel.clone());

    let ctrl_c = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, stopping after the current step");
                cancel.cancel();
            }
        }
    });

    let result = tokio::task::spawn_blocking(move || run_backup_command(&command, &session))
        .await
        .context("command thread panicked");
    ctrl_c.abort();
    result?
}

fn handle_version_command() {
    println!("{}", env!("CARGO_PKG_VERSION"));
}

fn start_dir(global: &GlobalOptions) -> Result<PathBuf> {
    match &global.repo {
        Some(dir) => std::path::absolute(dir)
            .with_context(|| format!("invalid repository path {}", dir.display())),
        None => std::env::current_dir().context("cannot read the current directory"),
    }
}

fn discover_repo(global: &GlobalOptions) -> Result<GitRepo> {
    let start = start_dir(global)?;
    let repo = GitRepo::discover(&start)
        .with_context(|| format!("{} is not inside a git work tree", start.display()))?;
    debug!(root = %repo.root().display(), "Repository found");
    Ok(repo)
}

fn build_config_loader(global: &GlobalOptions, root: Option<&Path>) -> Result<ConfigLoader> {
    let mut loader = ConfigLoader::new();
    if let Some(root) = root {
        loader = loader.add_toml_file_optional(root.join(CONFIG_FILE_NAME));
    }
    for ini_path in &global.inis {
        loader = loader.add_toml_file(ini_path);
    }
    loader = loader.with_env_prefix("AGB");
    for option in global.to_config_overrides() {
        loader = loader.set_option(&option)?;
    }
    Ok(loader)
}
