//! The (distance, class) list a candidate's quality is computed from.

/// One series' distance to a candidate, tagged with its (mapped) class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderLineEntry {
    /// Distance from the candidate to the series.
    pub distance: f64,
    /// Class index after class-value mapping.
    pub class: usize,
}

/// Distances from one candidate to every series of the dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderLine {
    entries: Vec<OrderLineEntry>,
}

impl OrderLine {
    /// Create an empty order line with room for `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Append an entry.
    pub fn push(&mut self, distance: f64, class: usize) {
        self.entries.push(OrderLineEntry { distance, class });
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return true if no entries have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[OrderLineEntry] {
        &self.entries
    }

    /// Entries sorted by distance ascending, insertion order kept among equal
    /// distances.
    #[must_use]
    pub fn sorted(&self) -> Vec<OrderLineEntry> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        sorted
    }
}

impl FromIterator<(f64, usize)> for OrderLine {
    fn from_iter<I: IntoIterator<Item = (f64, usize)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(distance, class)| OrderLineEntry { distance, class })
                .collect(),
        }
    }
}
