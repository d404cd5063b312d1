use std::process::ExitCode;

fn main() -> ExitCode {
    claimcheck_cli::run()
}
