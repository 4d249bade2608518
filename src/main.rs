use std::process::ExitCode;

use clap::Parser;
use whey::cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.run() {
        Ok(artifacts) => {
            for artifact in artifacts {
                println!("{}", artifact.display());
            }
            ExitCode::SUCCESS
        }
        Err(error) => {
            cli.report_error(&error);
            ExitCode::FAILURE
        }
    }
}
