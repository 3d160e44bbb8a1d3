use std::process::ExitCode;

fn main() -> ExitCode {
    launchdesk_cli::run()
}
