use std::io::{self, BufRead, Write};

use grabber_engine::LoginPrompt;
use grabber_logging::grab_warn;

/// Pauses the run until the user presses ENTER in the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinPrompt;

#[async_trait::async_trait]
impl LoginPrompt for StdinPrompt {
    async fn wait_for_manual_login(&self, page_url: &str) -> bool {
        let page_url = page_url.to_string();
        let answer = tokio::task::spawn_blocking(move || -> io::Result<bool> {
            println!();
            println!("The page at {page_url} needs a login.");
            print!("Log in inside the browser window, then press ENTER to continue... ");
            io::stdout().flush()?;
            let mut line = String::new();
            Ok(io::stdin().lock().read_line(&mut line)? > 0)
        })
        .await;

        match answer {
            Ok(Ok(confirmed)) => confirmed,
            Ok(Err(err)) => {
                grab_warn!("Could not read login confirmation: {}", err);
                false
            }
            Err(err) => {
                grab_warn!("Login prompt task failed: {}", err);
                false
            }
        }
    }
}
