use std::process::ExitCode;

fn main() -> ExitCode {
    roombot_cli::run()
}
