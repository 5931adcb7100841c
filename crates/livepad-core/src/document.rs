//! Shared document state

/// The single piece of shared text
///
/// Overwritten wholesale on every change. There is no diffing and no
/// merge: the last content processed wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedDocument {
    content: String,
}

impl SharedDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole content
    pub fn replace(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    /// Get the current content
    pub fn as_str(&self) -> &str {
        &self.content
    }

    /// Content length in bytes
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Check if the document is empty
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_overwrites() {
        let mut doc = SharedDocument::new();
        assert!(doc.is_empty());

        doc.replace("hello world");
        doc.replace("hi");
        assert_eq!(doc.as_str(), "hi");
        assert_eq!(doc.len(), 2);

        doc.replace("");
        assert!(doc.is_empty());
    }
}
