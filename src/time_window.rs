//! Half-open activity windows: a record is active at `reference` when
//! `start <= reference` and `end` is absent or strictly after `reference`.

/// Pure activity check. Callers pass values of the granularity the record is stored
/// at: `NaiveDate` for assignments, `DateTime<Utc>` for roles, ACLs and groups.
pub fn is_active<T: PartialOrd>(start: &T, end: Option<&T>, reference: &T) -> bool {
    start <= reference && end.map_or(true, |e| e > reference)
}

/// Records carrying a validity window.
pub trait Windowed {
    type Instant: PartialOrd;

    fn window_start(&self) -> &Self::Instant;
    fn window_end(&self) -> Option<&Self::Instant>;

    fn is_active_at(&self, reference: &Self::Instant) -> bool {
        is_active(self.window_start(), self.window_end(), reference)
    }
}

/// Keep only the rows active at `reference`.
pub fn active_at<'a, W: Windowed + 'a>(
    rows: impl IntoIterator<Item = &'a W>,
    reference: &'a W::Instant,
) -> impl Iterator<Item = &'a W> {
    rows.into_iter().filter(move |r| r.is_active_at(reference))
}
