use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(#[from] arboard::Error),
}

/// Something that can hand out the current clipboard text.
pub trait ClipboardSource {
    fn read_text(&mut self) -> Result<Option<String>, ClipboardError>;
}

pub struct SystemClipboard {
    clipboard: arboard::Clipboard,
}

impl SystemClipboard {
    pub fn open() -> Result<Self, ClipboardError> {
        Ok(Self {
            clipboard: arboard::Clipboard::new()?,
        })
    }
}

impl ClipboardSource for SystemClipboard {
    fn read_text(&mut self) -> Result<Option<String>, ClipboardError> {
        match self.clipboard.get_text() {
            Ok(text) => Ok(Some(text)),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(error) => Err(error.into()),
        }
    }
}

/// Reports clipboard text only when it differs from what was last seen.
pub struct ClipboardWatcher<S> {
    source: S,
    last_seen: Option<String>,
}

impl<S: ClipboardSource> ClipboardWatcher<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            last_seen: None,
        }
    }

    /// Records the current content without reporting it.
    pub fn prime(&mut self) {
        let _ = self.poll();
    }

    pub fn poll(&mut self) -> Option<String> {
        let raw = match self.source.read_text() {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(error) => {
                tracing::debug!(%error, "clipboard read failed");
                return None;
            }
        };

        let text = normalize_clipboard_text(&raw);
        if text.is_empty() || self.last_seen.as_deref() == Some(text.as_str()) {
            return None;
        }
        self.last_seen = Some(text.clone());
        Some(text)
    }
}

fn normalize_clipboard_text(input: &str) -> String {
    input.replace('\u{0000}', "")
}
