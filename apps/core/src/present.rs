use std::io::Write;

use colored::Colorize;

use crate::model::QueryResult;

const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

/// Human readable size using binary (1024) steps, one decimal place.
pub fn format_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = "bytes";
    for next in UNITS {
        if value / 1024.0 < 1.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{value:.1} {unit}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// `name\tsize\tdirectory` lines under a one-line summary.
pub fn render_text(result: &QueryResult, color: bool) -> String {
    let mut lines = String::new();
    for entry in &result.entries {
        lines.push_str(&entry.file_name);
        lines.push('\t');
        lines.push_str(&format_size(entry.file_size));
        lines.push('\t');
        lines.push_str(&entry.directory);
        lines.push('\n');
    }

    if !color {
        return format!(
            "Found {} for \"{}\" in {}\n{}",
            result.count, result.original_token, result.catalog_name, lines
        );
    }

    let count = if result.found() {
        result.count.to_string().green()
    } else {
        result.count.to_string().red()
    };
    let lines = if result.found() {
        lines.green()
    } else {
        lines.normal()
    };
    format!(
        "Found {} for \"{}\" in {}\n{}",
        count,
        result.original_token.bold(),
        result.catalog_name.bold(),
        lines
    )
}

pub fn render_json(result: &QueryResult) -> String {
    serde_json::to_string(result).expect("query result should serialize")
}

/// Writes each round's results to stdout.
pub struct TerminalPresenter {
    format: OutputFormat,
    color: bool,
}

impl TerminalPresenter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            color: colored::control::SHOULD_COLORIZE.should_colorize(),
        }
    }

    pub fn present(&self, result: &QueryResult) {
        let rendered = match self.format {
            OutputFormat::Text => render_text(result, self.color),
            OutputFormat::Json => render_json(result),
        };
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{rendered}");
    }

    pub fn message(&self, message: &str) {
        if self.format == OutputFormat::Text {
            println!("{message}");
        }
    }

    pub fn failure(&self, message: &str) {
        if self.color {
            eprintln!("{}", message.red());
        } else {
            eprintln!("{message}");
        }
    }
}
