use clap::Parser;

mod cli;
pub mod exit_codes;
mod logging;

use cli::args::Cli;

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let code = match cli::run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            exit_codes::SETUP_ERROR
        }
    };
    std::process::exit(code);
}
