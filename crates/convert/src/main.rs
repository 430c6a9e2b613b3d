use std::process::ExitCode;

fn main() -> ExitCode {
    pointclouds_convert::cli::run()
}
