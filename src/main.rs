use clap::Parser;
use miette::Result;
use roomcat::cli::commands;
use roomcat::cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter directive
const LOG_ENV: &str = "ROOMCAT_LOG";

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    let default_level = if global.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Init(args) => commands::init::run(args, &global),
        Commands::Add(args) => commands::add::run(args, &global),
        Commands::List(args) => commands::list::run(args, &global),
        Commands::Search(args) => commands::search::run(args, &global),
        Commands::Delete(args) => commands::delete::run(args, &global),
        Commands::Attach(args) => commands::attach::run(args, &global),
        Commands::Edit(args) => commands::edit::run(args, &global),
        Commands::Export(args) => commands::export::run(args, &global),
        Commands::Import(args) => commands::import::run(args, &global),
        Commands::Values(args) => commands::values::run(args, &global),
        Commands::Config(cmd) => commands::config::run(cmd, &global),
        Commands::Completions(args) => commands::completions::run(args),
    }
}
