use std::process::ExitCode;

fn main() -> ExitCode {
    match lingo::cli::main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ Error: {e}");
            ExitCode::FAILURE
        }
    }
}
