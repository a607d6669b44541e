mod commands;
mod terminal;

use std::process::ExitCode;

use commands::{CommandLine, Commands, list, render, run, show};
use terminal::{logging, print};
use tracing::error;

const EXIT_FAILED: u8 = 1;
const EXIT_ERROR: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.verbose);
    print::banner(commands.quiet);

    match try_main(commands).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

async fn try_main(commands: CommandLine) -> anyhow::Result<ExitCode> {
    let quiet = commands.quiet;

    match commands.command {
        Commands::Run(args) => {
            print::header("running scenarios", quiet);
            let passed = run::run(&args, quiet).await?;
            print::rule();
            Ok(if passed {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(EXIT_FAILED)
            })
        }
        Commands::Render { sources, selection } => {
            render::render(&sources, &selection)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::List => {
            list::list(quiet);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Show { sources } => {
            show::show(&sources, quiet)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
