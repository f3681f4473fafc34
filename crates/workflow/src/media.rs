use std::fmt;

/// Opaque reference to media already stored by the messaging platform
/// (a Telegram `file_id`). Re-sending by reference avoids re-uploading.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaRef(String);

impl MediaRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for MediaRef {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for MediaRef {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}
