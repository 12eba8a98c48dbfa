//! ansible-shim - launch ansible-playbook from a YAML configuration
//!
//! This is the main entry point for the ansible-shim CLI.

mod cli;

use ansible_shim::logging::init_logging;
use anyhow::Result;
use cli::commands::generate::GenerateCommand;
use cli::commands::lint::LintCommand;
use cli::commands::run::RunCommand;
use cli::commands::{CommandContext, Runnable};
use cli::{Action, Cli};
use tracing::error;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    init_logging(cli.verbosity());

    let action = cli.action();
    if action == Action::Version {
        println!("{}", ansible_shim::version_string());
        std::process::exit(0);
    }

    let mut ctx = CommandContext::new(&cli);

    let command: Box<dyn Runnable + Send + Sync> = match action {
        Action::Generate => Box::new(GenerateCommand),
        Action::Lint(target) => Box::new(LintCommand::new(target)),
        #[cfg(feature = "api")]
        Action::Serve(addr) => Box::new(cli::commands::serve::ServeCommand::new(addr)),
        Action::Run | Action::Version => Box::new(RunCommand),
    };

    // Exit code is the child's; anything that stops us before that is 1.
    let exit_code = match command.run(&mut ctx).await {
        Ok(code) => code,
        Err(e) => {
            error!("Exiting due to error: {:#}", e);
            e.downcast_ref::<ansible_shim::error::Error>()
                .map_or(1, |e| e.exit_code())
        }
    };

    std::process::exit(exit_code);
}
