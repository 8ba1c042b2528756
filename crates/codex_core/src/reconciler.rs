/// Detects one ordered edge in a sequence of observed statuses.
///
/// Holds the previously observed value across ticks; `observe` reports
/// whether the configured `from -> to` pair was just crossed. The held value
/// is updated on every observation regardless of whether the edge fired, so
/// a repeated `to` observation never fires twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeDetector<S> {
    from: S,
    to: S,
    previous: Option<S>,
}

impl<S: PartialEq + Clone> EdgeDetector<S> {
    pub fn new(from: S, to: S) -> Self {
        Self {
            from,
            to,
            previous: None,
        }
    }

    /// Feeds the next observed status. Returns true exactly when the previous
    /// observation equalled `from` and this one equals `to`.
    pub fn observe(&mut self, new: S) -> bool {
        let crossed = self.previous.as_ref() == Some(&self.from) && new == self.to;
        self.previous = Some(new);
        crossed
    }

    pub fn previous(&self) -> Option<&S> {
        self.previous.as_ref()
    }
}
