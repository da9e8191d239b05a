use crate::core::config::data::Config;

fn or_default(value: Option<&str>, fallback: &str) -> String {
    match value {
        Some(value) => value.to_string(),
        None => format!("{fallback} (default)"),
    }
}

impl Config {
    pub fn print_all(&self) {
        println!("Current configuration:");
        println!("  model: {}", or_default(self.model.as_deref(), self.model()));
        println!(
            "  base-url: {}",
            or_default(self.base_url.as_deref(), self.base_url())
        );
        println!("  title: {}", or_default(self.title.as_deref(), self.title()));
        println!(
            "  referer: {}",
            or_default(self.referer.as_deref(), self.referer())
        );
        match &self.persona {
            Some(_) => println!("  persona: (custom)"),
            None => println!("  persona: (default)"),
        }
        match self.history_window {
            Some(window) => println!("  history-window: last {window} messages"),
            None => println!("  history-window: full history"),
        }
        match self.request_timeout() {
            Some(timeout) => println!("  request-timeout: {}s", timeout.as_secs()),
            None => println!("  request-timeout: none"),
        }
        match self.use_keyring() {
            true => println!("  use-keyring: on"),
            false => println!("  use-keyring: off"),
        }
    }
}
