use std::process::ExitCode;

fn main() -> ExitCode {
    valprop_cli::run()
}
