use std::process::ExitCode;

fn main() -> ExitCode {
    prospector_cli::run()
}
