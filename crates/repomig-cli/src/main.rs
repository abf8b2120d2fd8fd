fn main() {
    env_logger::init();

    if let Err(error) = repomig_cli::run() {
        eprintln!("Error: {error:#}");
        std::process::exit(1);
    }
}
