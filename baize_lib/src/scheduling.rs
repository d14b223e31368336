use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{levels::Level, matches::Match, rounds::RoundLabel};

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
/// How the organizer would like rounds spread across the week
pub enum SchedulingPreference {
    #[default]
    Weekend,
    FullWeek,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// The advisory scheduling annotation attached to every generated match.
/// Nothing in the progression core reads these back.
pub struct SchedulingInfo {
    pub suggested_day: String,
    pub days_from_now: u32,
    pub matches_in_round: usize,
    pub scheduling_preference: SchedulingPreference,
    pub level: Level,
}

/// Relative date offset per round: the opener a week out, the second round a
/// fortnight, positioning phases three weeks, deeper elimination four.
fn days_from_now(label: RoundLabel) -> u32 {
    use RoundLabel::*;
    match label {
        Round(1) => 7,
        Round(2) => 14,
        Round(_) => 28,
        _ => 21,
    }
}

/// Day suggestion by round size: big rounds need the venue on a Saturday,
/// medium rounds follow the preference, a handful of matches fits any day.
fn suggested_day(matches_in_round: usize, pref: SchedulingPreference) -> &'static str {
    if matches_in_round > 8 {
        "Saturday"
    } else if matches_in_round >= 3 {
        match pref {
            SchedulingPreference::Weekend => "Saturday",
            SchedulingPreference::FullWeek => "Wednesday",
        }
    } else {
        "Any"
    }
}

/// Decorates freshly generated matches with their scheduling suggestion.
/// A generation step can span two labels (the winners and losers finals),
/// so matches are grouped by their round label first.
pub fn annotate_matches(matches: &mut [Match], pref: SchedulingPreference) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for m in matches.iter() {
        *counts.entry(m.round_number.clone()).or_default() += 1;
    }
    for m in matches.iter_mut() {
        let Some(label) = RoundLabel::parse(&m.round_number) else {
            continue;
        };
        let count = counts[&m.round_number];
        let day = suggested_day(count, pref);
        m.scheduled_date = Some(day.to_string());
        m.scheduling = Some(SchedulingInfo {
            suggested_day: day.to_string(),
            days_from_now: days_from_now(label),
            matches_in_round: count,
            scheduling_preference: pref,
            level: m.tournament_level,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_follow_the_rule_of_thumb() {
        assert_eq!(days_from_now(RoundLabel::Round(1)), 7);
        assert_eq!(days_from_now(RoundLabel::Round(2)), 14);
        assert_eq!(days_from_now(RoundLabel::Round(3)), 28);
        assert_eq!(days_from_now(RoundLabel::SemiFinal), 21);
        assert_eq!(days_from_now(RoundLabel::Final), 21);
    }

    #[test]
    fn day_scales_with_round_size() {
        assert_eq!(suggested_day(12, SchedulingPreference::FullWeek), "Saturday");
        assert_eq!(suggested_day(5, SchedulingPreference::Weekend), "Saturday");
        assert_eq!(suggested_day(5, SchedulingPreference::FullWeek), "Wednesday");
        assert_eq!(suggested_day(2, SchedulingPreference::Weekend), "Any");
    }
}
