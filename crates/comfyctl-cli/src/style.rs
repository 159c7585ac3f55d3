use std::env;

use color_eyre::owo_colors::OwoColorize;
use comfyctl_core::CommandStatus;

pub struct Style {
    enabled: bool,
}

impl Style {
    pub fn new(force_no_color: bool, is_tty: bool) -> Self {
        let env_no_color = env::var_os("NO_COLOR").is_some();
        Self {
            enabled: !(force_no_color || env_no_color) && is_tty,
        }
    }

    pub fn status(&self, status: CommandStatus, text: &str) -> String {
        let line = match status {
            CommandStatus::Ok => format!("✔ {text}"),
            CommandStatus::Failure => format!("✖ {text}"),
        };
        if !self.enabled {
            return line;
        }
        match status {
            CommandStatus::Ok => line.green().bold().to_string(),
            CommandStatus::Failure => line.red().bold().to_string(),
        }
    }

    pub fn step(&self, index: usize, text: &str) -> String {
        let number = format!("{index:>3}.");
        if !self.enabled {
            return format!("{number} {text}");
        }
        format!("{} {text}", number.dimmed())
    }

    pub fn info(&self, text: &str) -> String {
        if !self.enabled {
            return text.to_string();
        }
        text.cyan().to_string()
    }
}
