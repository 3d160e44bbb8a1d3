use launchdesk_db::{DefaultConfigSeeder, SeedReport};

use crate::commands::{
    build_runtime, load_config, open_database, CommandResult, Failure, EXIT_DATABASE,
};

pub fn run() -> CommandResult {
    let config = match load_config("seed") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match build_runtime("seed") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = open_database(&config).await?;
        let report = DefaultConfigSeeder::seed(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), EXIT_DATABASE));
        pool.close().await;
        Ok::<SeedReport, Failure>(report?)
    });

    match result {
        Ok(report) => CommandResult::success("seed", describe(&report)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn describe(report: &SeedReport) -> String {
    if report.total() == 0 {
        return "default configuration already present; nothing inserted".to_string();
    }
    format!(
        "inserted {} settings, {} channels, {} cost-to-serve rows, {} markets",
        report.settings, report.channels, report.cts_rows, report.markets
    )
}
