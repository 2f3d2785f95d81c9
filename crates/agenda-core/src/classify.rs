//! Keyword-based event categorization.
//!
//! Deterministic, case-insensitive substring match over the title.
//! First matching category wins, in a fixed priority order.

use crate::event::EventCategory;

const SPORTS: &[&str] = &["soccer", "practice", "game", "match"];
const APPOINTMENT: &[&str] = &["doctor", "dentist", "appointment"];
const SCHOOL: &[&str] = &["school", "pta", "parent-teacher"];
const WORK: &[&str] = &["meeting", "work", "call"];
const SOCIAL: &[&str] = &["party", "dinner", "get-together"];

/// Categorize an event by its title.
///
/// Priority order: sports, appointment, school, work, social. Titles
/// matching none of the keyword sets stay uncategorized.
pub fn categorize(title: &str) -> EventCategory {
    let title = title.to_lowercase();
    let matches = |keywords: &[&str]| keywords.iter().any(|k| title.contains(k));

    if matches(SPORTS) {
        EventCategory::Sports
    } else if matches(APPOINTMENT) {
        EventCategory::Appointment
    } else if matches(SCHOOL) {
        EventCategory::School
    } else if matches(WORK) {
        EventCategory::Work
    } else if matches(SOCIAL) {
        EventCategory::Social
    } else {
        EventCategory::Uncategorized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categorizes_by_keyword() {
        assert_eq!(categorize("Chuck's soccer game"), EventCategory::Sports);
        assert_eq!(categorize("Dentist appointment"), EventCategory::Appointment);
        assert_eq!(categorize("PTA night"), EventCategory::School);
        assert_eq!(categorize("Budget meeting"), EventCategory::Work);
        assert_eq!(categorize("Birthday party"), EventCategory::Social);
        assert_eq!(categorize("Grocery run"), EventCategory::Uncategorized);
    }

    #[test]
    fn match_is_case_insensitive() {
        assert_eq!(categorize("SOCCER GAME"), EventCategory::Sports);
    }

    #[test]
    fn priority_order_breaks_ties() {
        // "game" (sports) beats "dinner" (social) by priority.
        assert_eq!(categorize("game night dinner"), EventCategory::Sports);
        // "call" (work) beats "party" (social).
        assert_eq!(categorize("call about the party"), EventCategory::Work);
    }
}
