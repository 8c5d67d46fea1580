//! Main binary entry point for content-sync.

use content_sync::args::get_args;
use std::process::ExitCode;

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = match get_args() {
        Ok(args) => args,
        Err(err) => err.exit(),
    };
    match content_sync::run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::from(content_sync::exit_code(&err))
        }
    }
}
