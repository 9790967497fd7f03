use std::process::ExitCode;

fn main() -> ExitCode {
    rfv_cli::run()
}
