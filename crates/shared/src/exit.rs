//! Process exit handling shared by the binaries: `0` on success, `1` on any
//! error with the error chain printed to stderr.

use std::process;

/// Parses the command line. Help and version output exit with `0`, usage
/// errors with `1`.
pub fn parse_arguments<A: clap::Parser>() -> A {
    match A::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let code = exit_code(&err);
            // Printing only fails if stderr is gone, nothing left to report to.
            let _ = err.print();
            process::exit(code)
        }
    }
}

fn exit_code(err: &clap::Error) -> i32 {
    if err.use_stderr() { 1 } else { 0 }
}

/// Terminates the process with the outcome of a command.
pub fn exit(result: anyhow::Result<()>) -> ! {
    match result {
        Ok(()) => process::exit(0),
        Err(err) => {
            tracing::debug!(?err, "command failed");
            eprintln!("Error: {err:#}");
            process::exit(1)
        }
    }
}
