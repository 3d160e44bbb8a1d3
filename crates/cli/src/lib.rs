pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "launchdesk",
    about = "Launchdesk operator CLI",
    long_about = "Prepare the launch candidate database, inspect configuration, and ingest shortlist workbooks.",
    after_help = "Examples:\n  launchdesk migrate\n  launchdesk headers shortlist.xlsx\n  launchdesk ingest shortlist.xlsx --default-market Nepal"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Insert the default settings, channels, cost-to-serve rows, and markets")]
    Seed,
    #[command(about = "List the column labels of a workbook's candidate sheet")]
    Headers {
        #[arg(help = "Path to an .xlsx or .xls workbook")]
        file: PathBuf,
    },
    #[command(about = "Replace all candidates with the rows of a workbook and score them")]
    Ingest {
        #[arg(help = "Path to an .xlsx or .xls workbook")]
        file: PathBuf,
        #[arg(long, help = "JSON object mapping canonical labels to workbook column labels")]
        mapping: Option<String>,
        #[arg(long, help = "Market applied to every row, overriding the sheet's market column")]
        default_market: Option<String>,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Headers { file } => commands::headers::run(&file),
        Command::Ingest { file, mapping, default_market } => {
            commands::ingest::run(&file, mapping.as_deref(), default_market)
        }
        Command::Config => commands::config::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
