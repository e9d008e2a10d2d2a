use log::{trace, warn};

/// Replaces byte ranges of a source text without touching anything else.
#[derive(Debug)]
pub struct Splicer<'a> {
    source: &'a str,
    edits: Vec<(u32, u32, String)>,
}

impl<'a> Splicer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, edits: Vec::new() }
    }

    /// Schedules `start..end` to be replaced by `replacement`.
    ///
    /// Returns `false` (and schedules nothing) when the range is out of
    /// bounds or overlaps a range that was already scheduled.
    pub fn overwrite(&mut self, start: u32, end: u32, replacement: impl Into<String>) -> bool {
        if start > end
            || end as usize > self.source.len()
            || !self.source.is_char_boundary(start as usize)
            || !self.source.is_char_boundary(end as usize)
        {
            warn!("Ignoring edit {}..{} outside of the source text", start, end);
            return false;
        }
        if self.edits.iter().any(|(s, e, _)| start < *e && *s < end) {
            warn!("Ignoring edit {}..{} overlapping an earlier edit", start, end);
            return false;
        }
        trace!("Scheduling edit {}..{}", start, end);
        self.edits.push((start, end, replacement.into()));
        true
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn finish(mut self) -> String {
        // Apply back to front so earlier offsets stay valid
        self.edits.sort_by(|a, b| b.0.cmp(&a.0));
        let mut code = self.source.to_string();
        for (start, end, replacement) in self.edits {
            code.replace_range(start as usize..end as usize, &replacement);
        }
        code
    }
}
