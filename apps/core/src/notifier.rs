use std::process::{Command, Stdio};
use std::time::Duration;

use crate::config::{Config, APP_NAME};
use crate::model::QueryResult;
use crate::present::format_size;

pub const FOUND_CATEGORY: &str = "clipfind_found";
pub const NOT_FOUND_CATEGORY: &str = "clipfind_notfound";
pub const RESULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Desktop notification backend.
pub trait Notifier {
    fn simple_notify(&mut self, message: &str, timeout: Duration);
    fn deliver(&mut self, result: &QueryResult);
}

#[derive(Debug, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn simple_notify(&mut self, _message: &str, _timeout: Duration) {}
    fn deliver(&mut self, _result: &QueryResult) {}
}

/// Sends notifications through an external program (`notify-send` style CLI).
#[derive(Debug)]
pub struct CommandNotifier {
    program: String,
    unavailable: bool,
}

impl CommandNotifier {
    pub fn new(program: &str) -> Self {
        let program = program.trim().to_string();
        let unavailable = program.is_empty();
        if unavailable {
            tracing::error!("notification provider is empty; notifications disabled");
        } else {
            tracing::info!(program = %program, "using subprocess for desktop notifications");
        }
        Self {
            program,
            unavailable,
        }
    }

    pub fn is_available(&self) -> bool {
        !self.unavailable
    }

    fn call(&mut self, args: &[String]) {
        if self.unavailable {
            return;
        }
        let status = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .status();
        match status {
            Ok(status) if !status.success() => {
                tracing::warn!(program = %self.program, %status, "notification process failed");
            }
            Ok(_) => {}
            Err(error) => {
                tracing::error!(program = %self.program, %error, "notification process unavailable");
                self.unavailable = true;
            }
        }
    }
}

impl Notifier for CommandNotifier {
    fn simple_notify(&mut self, message: &str, timeout: Duration) {
        let args = message_args(message, timeout);
        self.call(&args);
    }

    fn deliver(&mut self, result: &QueryResult) {
        let args = result_args(result);
        self.call(&args);
    }
}

pub fn message_args(message: &str, timeout: Duration) -> Vec<String> {
    vec![
        "-t".to_string(),
        timeout.as_millis().to_string(),
        message.to_string(),
    ]
}

fn result_category(result: &QueryResult) -> &'static str {
    if result.found() {
        FOUND_CATEGORY
    } else {
        NOT_FOUND_CATEGORY
    }
}

pub fn result_summary(result: &QueryResult) -> String {
    format!(
        "Found: {} for {} in {}",
        result.count, result.original_token, result.catalog_name
    )
}

/// One `name size directory` line per entry.
pub fn result_body(result: &QueryResult) -> String {
    result
        .entries
        .iter()
        .map(|entry| {
            format!(
                "{} {} {}\n",
                entry.file_name,
                format_size(entry.file_size),
                entry.directory
            )
        })
        .collect()
}

/// Arguments for one result: category hint, summary line and one body line per entry.
pub fn result_args(result: &QueryResult) -> Vec<String> {
    vec![
        "-t".to_string(),
        RESULT_TIMEOUT.as_millis().to_string(),
        "-c".to_string(),
        result_category(result).to_string(),
        result_summary(result),
        result_body(result),
    ]
}

/// Talks to the desktop notification service directly (D-Bus on Linux).
#[derive(Debug)]
pub struct NativeNotifier {
    unavailable: bool,
}

impl NativeNotifier {
    pub fn new() -> Self {
        tracing::info!("using native desktop notifications");
        Self { unavailable: false }
    }

    pub fn is_available(&self) -> bool {
        !self.unavailable
    }

    fn show(&mut self, summary: &str, body: &str, category: Option<&str>, timeout: Duration) {
        if self.unavailable {
            return;
        }

        let mut notification = notify_rust::Notification::new();
        notification
            .appname(APP_NAME)
            .summary(summary)
            .body(body)
            .timeout(notify_rust::Timeout::Milliseconds(
                u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX),
            ));
        add_category_hint(&mut notification, category);

        if let Err(error) = notification.show() {
            tracing::error!(%error, "native notification failed; notifications disabled");
            self.unavailable = true;
        }
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
fn add_category_hint(notification: &mut notify_rust::Notification, category: Option<&str>) {
    if let Some(category) = category {
        notification.hint(notify_rust::Hint::Category(category.to_string()));
    }
}

#[cfg(not(all(unix, not(target_os = "macos"))))]
fn add_category_hint(_notification: &mut notify_rust::Notification, _category: Option<&str>) {}

impl Default for NativeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for NativeNotifier {
    fn simple_notify(&mut self, message: &str, timeout: Duration) {
        self.show(message, "", None, timeout);
    }

    fn deliver(&mut self, result: &QueryResult) {
        self.show(
            &result_summary(result),
            &result_body(result),
            Some(result_category(result)),
            RESULT_TIMEOUT,
        );
    }
}

/// Which notification implementation a provider name selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationBackend {
    Native,
    Command(String),
}

impl NotificationBackend {
    pub fn from_provider(provider: &str) -> Self {
        let provider = provider.trim();
        if provider.eq_ignore_ascii_case("native") {
            Self::Native
        } else {
            Self::Command(provider.to_string())
        }
    }
}

pub fn from_config(cfg: &Config) -> Box<dyn Notifier> {
    if !cfg.notifications {
        return Box::new(SilentNotifier);
    }

    match NotificationBackend::from_provider(&cfg.notification_provider) {
        NotificationBackend::Native => Box::new(NativeNotifier::new()),
        NotificationBackend::Command(program) => Box::new(CommandNotifier::new(&program)),
    }
}
