//! `roomcat config` command - Configuration management
//!
//! Provides commands to view and modify roomcat configuration.

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::helpers::{open_project, open_store};
use crate::cli::GlobalOpts;
use crate::core::config::{self, Config, KEYS};

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration values
    Show(ShowArgs),

    /// Set a configuration value
    Set(SetArgs),

    /// Unset (remove) a configuration value
    Unset(UnsetArgs),

    /// Show paths to configuration files
    Path,

    /// List all available configuration keys
    Keys,

    /// Connect to the remote spreadsheet and report on the worksheet
    Check,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Show only this key's value
    pub key: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Configuration key (e.g., worksheet, remote.sheet_id)
    pub key: String,

    /// Value to set
    pub value: String,

    /// Set in global (user) config instead of project config
    #[arg(long, short = 'g')]
    pub global: bool,
}

#[derive(clap::Args, Debug)]
pub struct UnsetArgs {
    /// Configuration key to remove
    pub key: String,

    /// Remove from global (user) config instead of project config
    #[arg(long, short = 'g')]
    pub global: bool,
}

/// Run a config subcommand
pub fn run(cmd: ConfigCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => run_show(args, global),
        ConfigCommands::Set(args) => run_set(args, global),
        ConfigCommands::Unset(args) => run_unset(args, global),
        ConfigCommands::Path => run_path(global),
        ConfigCommands::Keys => run_keys(),
        ConfigCommands::Check => run_check(global),
    }
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load_for(project.root());

    if let Some(key) = &args.key {
        if !KEYS.iter().any(|(k, _)| k == key) {
            return Err(miette::miette!("{}", config::ConfigError::UnknownKey(key.clone())));
        }
        return match config.get(key) {
            Some(v) => {
                println!("{}", v);
                Ok(())
            }
            None => Err(miette::miette!("Key '{}' is not set", key)),
        };
    }

    if global.format == crate::cli::OutputFormat::Json {
        let json = serde_json::to_string_pretty(&config).into_diagnostic()?;
        println!("{}", json);
        return Ok(());
    }

    println!("{}", style("Effective Configuration").bold().underlined());
    println!();
    for (key, _) in KEYS {
        print_config_value(key, config.get(key).as_deref());
    }

    println!();
    println!("{}", style("In effect:").dim());
    println!("  data file       {}", config.data_path(project.root()).display());
    println!("  worksheet       {}", config.worksheet());
    println!("  cache ttl       {}s", config.cache_ttl().as_secs());
    println!(
        "  storage         {}",
        if config.remote.is_configured() {
            "remote spreadsheet, local file as fallback"
        } else {
            "local file"
        }
    );

    println!();
    println!("{}", style("Config Sources (in priority order):").dim());
    println!("  1. Environment variables (ROOMCAT_DATA_FILE, ROOMCAT_WORKSHEET, ROOMCAT_CREDENTIALS,");
    println!("     ROOMCAT_SHEET_ID, ROOMCAT_SHEET_URL, ROOMCAT_CACHE_TTL)");
    println!("  2. Project config (.roomcat/config.yaml)");
    println!("  3. Global config (~/.config/roomcat/config.yaml)");

    Ok(())
}

fn config_path(is_global: bool, global: &GlobalOpts) -> Result<PathBuf> {
    if is_global {
        Config::global_config_path()
            .ok_or_else(|| miette::miette!("Could not determine global config directory"))
    } else {
        let project = open_project(global)?;
        Ok(Config::project_config_path(project.root()))
    }
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    let path = config_path(args.global, global)?;
    config::set_value(&path, &args.key, &args.value).map_err(|e| miette::miette!("{}", e))?;

    if !global.quiet {
        let scope = if args.global { "global" } else { "project" };
        println!(
            "{} Set {} {} {} in {} config",
            style("✓").green(),
            style(&args.key).cyan(),
            style("→").dim(),
            style(&args.value).yellow(),
            scope
        );
    }
    Ok(())
}

fn run_unset(args: UnsetArgs, global: &GlobalOpts) -> Result<()> {
    let path = config_path(args.global, global)?;
    if !path.exists() {
        return Err(miette::miette!(
            "Config file does not exist: {}",
            path.display()
        ));
    }
    config::unset_value(&path, &args.key).map_err(|e| miette::miette!("{}", e))?;

    if !global.quiet {
        let scope = if args.global { "global" } else { "project" };
        println!(
            "{} Removed {} from {} config",
            style("✓").green(),
            style(&args.key).cyan(),
            scope
        );
    }
    Ok(())
}

fn run_path(global: &GlobalOpts) -> Result<()> {
    println!("{}", style("Configuration file paths:").bold());
    println!();

    match Config::global_config_path() {
        Some(path) => print_path("Global:", &path),
        None => println!("  {} {}", style("Global:").cyan(), style("(unavailable)").dim()),
    }

    match open_project(global) {
        Ok(project) => {
            println!();
            print_path("Project:", &Config::project_config_path(project.root()));
        }
        Err(_) => {
            println!();
            println!(
                "  {} {}",
                style("Project:").cyan(),
                style("(not in a roomcat project)").dim()
            );
        }
    }
    Ok(())
}

fn print_path(label: &str, path: &std::path::Path) {
    println!("  {} {}", style(label).cyan(), path.display());
    let state = if path.exists() {
        style("(exists)").green()
    } else {
        style("(not created)").dim()
    };
    println!("          {}", state);
}

fn run_keys() -> Result<()> {
    println!("{}", style("Available configuration keys:").bold());
    println!();

    for (key, description) in KEYS {
        println!("  {:<22} {}", style(key).cyan(), style(description).dim());
    }

    println!();
    println!(
        "{}",
        style("Use 'roomcat config set <key> <value>' to set a value.").dim()
    );
    Ok(())
}

fn print_config_value(key: &str, value: Option<&str>) {
    if let Some(v) = value {
        println!("  {}: {}", style(key).cyan(), style(v).yellow());
    } else {
        println!("  {}: {}", style(key).cyan(), style("(not set)").dim());
    }
}

fn run_check(global: &GlobalOpts) -> Result<()> {
    let (_project, mut store) = open_store(global)?;
    let status = store.check_remote().map_err(|e| {
        miette::miette!(
            help = "check remote.credentials, remote.sheet_id and the sharing settings of the sheet",
            "{}",
            e
        )
    })?;

    let locator = store
        .config()
        .get("remote.sheet_id")
        .or_else(|| store.config().get("remote.sheet_url"))
        .unwrap_or_default();
    println!(
        "{} Connected to spreadsheet {}",
        style("✓").green(),
        style(locator).cyan()
    );
    if status.exists {
        println!(
            "  Worksheet '{}' holds {} row(s)",
            status.worksheet, status.rows
        );
    } else {
        println!(
            "  Worksheet '{}' does not exist yet; it is created on first use",
            status.worksheet
        );
    }
    if store.has_unsynced_changes() {
        println!(
            "  {} the local data file has changes the spreadsheet is missing; the next save sends them",
            style("!").yellow()
        );
    }
    Ok(())
}
