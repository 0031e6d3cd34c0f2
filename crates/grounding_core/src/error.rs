use std::fmt;

/// Which user-facing operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Load,
    Upload,
    Search,
    Chat,
    Extract,
    Save,
    Delete,
}

/// A failure turned into view state. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiError {
    pub kind: ErrorKind,
    pub message: String,
}

impl UiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::Load => "load failed",
            ErrorKind::Upload => "upload failed",
            ErrorKind::Search => "search failed",
            ErrorKind::Chat => "chat failed",
            ErrorKind::Extract => "extraction failed",
            ErrorKind::Save => "save failed",
            ErrorKind::Delete => "delete failed",
        };
        f.write_str(label)
    }
}

impl fmt::Display for UiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}
