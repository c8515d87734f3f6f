//! `roomcat init` command - Initialize a new catalog project

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::GlobalOpts;
use crate::core::config::Config;
use crate::core::project::{Project, ProjectError};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Rewrite the default config even if .roomcat/ already exists
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs, global: &GlobalOpts) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    match Project::init(&path, args.force) {
        Ok(project) => {
            if global.quiet {
                return Ok(());
            }
            let config = Config::load_for(project.root());
            println!(
                "{} Initialized room catalog at {}",
                style("✓").green(),
                style(project.root().display()).cyan()
            );
            println!();
            println!("  {} {}", style("Config:").dim(), Config::project_config_path(project.root()).display());
            println!("  {} {}", style("Data:").dim(), config.data_path(project.root()).display());
            println!();
            println!("Next steps:");
            println!(
                "  {} Add a room",
                style("roomcat add --district Q1 --street 'Lê Lợi' --house-number 12 --room P1:4500000").yellow()
            );
            println!(
                "  {} Use a remote spreadsheet",
                style("roomcat config set remote.sheet_id <ID>").yellow()
            );
            Ok(())
        }
        Err(ProjectError::AlreadyExists(path)) => {
            println!(
                "{} Room catalog already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!("Use {} to reinitialize", style("roomcat init --force").yellow());
            Ok(())
        }
        Err(e) => Err(miette::miette!("{}", e)),
    }
}
