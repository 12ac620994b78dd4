use std::process;

fn main() {
    if let Err(err) = dedupe_functions::cli::run_dedupe_cli(std::env::args().skip(1)) {
        eprintln!("{}: {err}", env!("CARGO_PKG_NAME"));
        process::exit(1);
    }
}
