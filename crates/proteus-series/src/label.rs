use std::fmt;

/// A class label. Wraps a zero-based class index.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ClassLabel(usize);

impl ClassLabel {
    /// Create a new class label from a zero-based index.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based class index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for ClassLabel {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::ClassLabel;

    #[test]
    fn roundtrip() {
        let label = ClassLabel::new(7);
        assert_eq!(label.index(), 7);
    }

    #[test]
    fn display() {
        let label = ClassLabel::from(3);
        assert_eq!(format!("{label}"), "3");
    }

    #[test]
    fn ordering_follows_index() {
        assert!(ClassLabel::new(0) < ClassLabel::new(1));
    }
}
