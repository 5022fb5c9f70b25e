mod cli;
mod commands;
mod env_loader;
mod error;
mod logging;
mod store;

fn main() {
    env_loader::load_dotenv();
    logging::init();

    match cli::run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(error::exit_code_for(&err));
        }
    }
}
