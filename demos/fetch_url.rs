//! Fetches a URL given on the command line and prints the response body.
//!
//! Supports `http://`, `https://`, `gemini://`, and `spartan://`.
//!
//! ```text
//! cargo run --bin fetch_url -- https://example.com/
//! ```

use netfetch::{Client, FetchRequest, Observer, ObserverEvent, ParsedUrl};
use std::io::Write;

struct StdoutObserver {
    saw_error: bool,
}

impl Observer for StdoutObserver {
    fn update(&mut self, event: ObserverEvent) {
        match event {
            ObserverEvent::Data(bytes) => {
                let _ = std::io::stdout().write_all(&bytes);
            }
            ObserverEvent::Error(message) => {
                self.saw_error = true;
                eprintln!("error: {message}");
            }
            ObserverEvent::MovedTo(location) | ObserverEvent::TempMovedTo(location) => {
                eprintln!("redirected to {location}");
            }
            _ => {}
        }
    }
}

#[tokio::main]
async fn main() {
    let url = match std::env::args().nth(1) {
        Some(url) => url,
        None => {
            eprintln!("usage: fetch_url <url>");
            std::process::exit(2);
        }
    };

    let parsed = match ParsedUrl::parse(&url) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("invalid url: {e}");
            std::process::exit(2);
        }
    };

    let client = Client::builder().build();
    let mut observer = StdoutObserver { saw_error: false };

    let result = if parsed.scheme == "gemini" || parsed.scheme == "spartan" {
        client.fetch_gemini(parsed, &mut observer).await
    } else {
        client.fetch(FetchRequest::get(parsed), &mut observer).await
    };

    if let Err(e) = result {
        eprintln!("fetch failed: {e}");
        std::process::exit(1);
    }
    if observer.saw_error {
        std::process::exit(1);
    }
}
