use std::process::ExitCode;

fn main() -> ExitCode {
    querylane_cli::run()
}
