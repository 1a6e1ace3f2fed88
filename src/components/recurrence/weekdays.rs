use chrono::Weekday;
use std::fmt;

const FULL_NAMES: [(&str, Weekday); 7] = [
    ("monday", Weekday::Mon),
    ("tuesday", Weekday::Tue),
    ("wednesday", Weekday::Wed),
    ("thursday", Weekday::Thu),
    ("friday", Weekday::Fri),
    ("saturday", Weekday::Sat),
    ("sunday", Weekday::Sun),
];

/// Parse a weekday code: any case-insensitive prefix of the English name
/// that is at least three letters long ("Mon", "tues", "Wednesday")
pub fn parse_weekday(code: &str) -> Option<Weekday> {
    let code = code.trim().to_ascii_lowercase();
    if code.len() < 3 {
        return None;
    }
    FULL_NAMES
        .iter()
        .find(|(name, _)| name.starts_with(&code))
        .map(|(_, day)| *day)
}

/// Unordered set of weekdays stored as a bitmask
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const fn empty() -> Self {
        Self(0)
    }

    fn bit(day: Weekday) -> u8 {
        1 << day.num_days_from_monday()
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= Self::bit(day);
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & Self::bit(day) != 0
    }

    pub fn len(&self) -> u32 {
        self.0.count_ones()
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Members in Monday-first order
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        FULL_NAMES
            .iter()
            .map(|(_, day)| *day)
            .filter(move |day| self.contains(*day))
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = Self::empty();
        for day in iter {
            set.insert(day);
        }
        set
    }
}

impl fmt::Debug for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_weekday() {
        assert_eq!(parse_weekday("Mon"), Some(Weekday::Mon));
        assert_eq!(parse_weekday(" wed "), Some(Weekday::Wed));
        assert_eq!(parse_weekday("Thurs"), Some(Weekday::Thu));
        assert_eq!(parse_weekday("SUNDAY"), Some(Weekday::Sun));

        assert_eq!(parse_weekday("Mo"), None); // Too short
        assert_eq!(parse_weekday("Mondays"), None);
        assert_eq!(parse_weekday("Moon"), None);
        assert_eq!(parse_weekday(""), None);
    }

    #[test]
    fn test_set_ignores_order_and_duplicates() {
        let a: WeekdaySet = [Weekday::Wed, Weekday::Mon, Weekday::Wed].into_iter().collect();
        let b: WeekdaySet = [Weekday::Mon, Weekday::Wed].into_iter().collect();

        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
        assert!(a.contains(Weekday::Mon));
        assert!(!a.contains(Weekday::Tue));
        assert_eq!(a.iter().collect::<Vec<_>>(), vec![Weekday::Mon, Weekday::Wed]);
        assert!(WeekdaySet::empty().is_empty());
    }
}
