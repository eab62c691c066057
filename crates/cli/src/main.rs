use std::process::ExitCode;

fn main() -> ExitCode {
    demogenie_cli::run()
}
