// src/common/time_range.rs

use chrono::{DateTime, Duration, Utc};

/// Intervalo semiaberto `[start, end)` em UTC.
///
/// Dois intervalos que apenas se tocam (`a.end == b.start`) NÃO se sobrepõem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn starting_at(start: DateTime<Utc>, minutes: i32) -> Self {
        Self::new(start, start + Duration::minutes(i64::from(minutes)))
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Teste de exclusão: os dois intervalos compartilham algum instante?
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Teste de inclusão: `other` cabe inteiro dentro deste intervalo?
    pub fn contains(&self, other: &TimeRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 5, 14, hour, minute, 0).unwrap()
    }

    fn range(from: (u32, u32), to: (u32, u32)) -> TimeRange {
        TimeRange::new(at(from.0, from.1), at(to.0, to.1))
    }

    #[test]
    fn touching_ranges_do_not_overlap() {
        let a = range((14, 0), (14, 30));
        let b = range((14, 30), (15, 0));
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn partial_and_nested_ranges_overlap() {
        let a = range((14, 0), (14, 30));
        assert!(a.overlaps(&range((14, 15), (14, 45))));
        assert!(a.overlaps(&range((13, 0), (16, 0))));
        assert!(a.overlaps(&range((14, 10), (14, 20))));
    }

    #[test]
    fn containment_is_stricter_than_overlap() {
        let shift = range((9, 0), (17, 0));
        assert!(shift.contains(&range((10, 0), (10, 30))));
        assert!(shift.contains(&range((16, 30), (17, 0))));

        let straddling = range((16, 45), (17, 15));
        assert!(shift.overlaps(&straddling));
        assert!(!shift.contains(&straddling));
        assert!(!shift.contains(&range((8, 0), (8, 30))));
    }

    #[test]
    fn starting_at_adds_duration() {
        let r = TimeRange::starting_at(at(10, 0), 45);
        assert_eq!(r.end, at(10, 45));
        assert!(!r.is_empty());
        assert!(TimeRange::new(at(10, 0), at(10, 0)).is_empty());
    }
}
