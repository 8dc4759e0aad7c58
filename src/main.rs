use std::process;

fn main() {
    if let Err(err) = cedarc::cli::run_cli() {
        eprintln!("{}", err);
        process::exit(1);
    }
}
