use structure_editor::logger::{log, LogSeverity::*};
use structure_editor::session::{Session, SessionConfig};
use tokio::io::BufReader;

#[tokio::main]
async fn main() {
    log("Structure editor init".to_owned(), Info);
    let config = match SessionConfig::load().await {
        Ok(config) => config,
        Err(config_error) => {
            log(format!("Failed to load configuration: {}", config_error), Fatal);
            std::process::exit(1);
        }
    };

    let mut session = Session::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout(), config);
    if let Err(session_error) = session.run().await {
        log(format!("Session ended with an error: {}", session_error), Fatal);
        std::process::exit(1);
    }
}
