//! Pure scoring and validation helpers shared by the controller and the
//! lifeline engine. No state, no I/O.

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::dao::models::{OptionLabel, PrizeLadderEntity, QuestionEntity};

/// Normalize a host-typed answer for comparison: trimmed, lowercased, inner
/// whitespace collapsed to single spaces.
pub fn normalize_answer(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Parse a host-typed option selection ("B", " b ") into a label.
pub fn parse_option_label(input: &str) -> Option<OptionLabel> {
    match normalize_answer(input).as_str() {
        "a" => Some(OptionLabel::A),
        "b" => Some(OptionLabel::B),
        "c" => Some(OptionLabel::C),
        "d" => Some(OptionLabel::D),
        _ => None,
    }
}

/// Whether the selected option matches the correct one.
pub fn answers_match(selected: OptionLabel, correct: OptionLabel) -> bool {
    selected == correct
}

/// Prize amount for correctly answering question `number` (1-based).
/// `None` when the number falls outside the ladder.
pub fn prize_for_question(ladder: &PrizeLadderEntity, number: u32) -> Option<u64> {
    if number == 0 {
        return None;
    }
    ladder.amounts.get(number as usize - 1).copied()
}

/// Pick the two options that survive a 50/50: the correct option plus one
/// randomly chosen incorrect option, returned in display order.
pub fn fifty_fifty_survivors<R: Rng + ?Sized>(
    question: &QuestionEntity,
    rng: &mut R,
) -> Vec<OptionLabel> {
    let wrong: Vec<OptionLabel> = question
        .options
        .iter()
        .map(|option| option.label)
        .filter(|label| *label != question.correct_option)
        .collect();

    let mut survivors = vec![question.correct_option];
    if let Some(kept_wrong) = wrong.choose(rng) {
        survivors.push(*kept_wrong);
    }
    survivors.sort_by_key(|label| OptionLabel::ALL.iter().position(|l| l == label));
    survivors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::QuestionOptionEntity;

    fn question(correct: OptionLabel) -> QuestionEntity {
        QuestionEntity {
            text: "Which planet is known as the red planet?".into(),
            options: OptionLabel::ALL
                .iter()
                .map(|label| QuestionOptionEntity {
                    label: *label,
                    text: format!("option {label}"),
                })
                .collect(),
            correct_option: correct,
        }
    }

    #[test]
    fn normalization_collapses_whitespace_and_case() {
        assert_eq!(normalize_answer("  B  "), "b");
        assert_eq!(normalize_answer("Mixed   Case\tText"), "mixed case text");
    }

    #[test]
    fn option_labels_parse_case_insensitively() {
        assert_eq!(parse_option_label("a"), Some(OptionLabel::A));
        assert_eq!(parse_option_label(" D "), Some(OptionLabel::D));
        assert_eq!(parse_option_label("e"), None);
        assert_eq!(parse_option_label(""), None);
    }

    #[test]
    fn prize_lookup_is_one_based_and_bounds_checked() {
        let ladder = PrizeLadderEntity {
            amounts: vec![100, 200, 500],
        };
        assert_eq!(prize_for_question(&ladder, 0), None);
        assert_eq!(prize_for_question(&ladder, 1), Some(100));
        assert_eq!(prize_for_question(&ladder, 3), Some(500));
        assert_eq!(prize_for_question(&ladder, 4), None);
    }

    #[test]
    fn fifty_fifty_always_keeps_correct_and_exactly_one_wrong() {
        let mut rng = rand::rng();
        for correct in OptionLabel::ALL {
            let question = question(correct);
            for _ in 0..50 {
                let survivors = fifty_fifty_survivors(&question, &mut rng);
                assert_eq!(survivors.len(), 2);
                assert!(survivors.contains(&correct));
                let wrong_kept: Vec<_> = survivors
                    .iter()
                    .filter(|label| **label != correct)
                    .collect();
                assert_eq!(wrong_kept.len(), 1);
            }
        }
    }

    #[test]
    fn fifty_fifty_result_is_in_display_order() {
        let mut rng = rand::rng();
        let survivors = fifty_fifty_survivors(&question(OptionLabel::C), &mut rng);
        let positions: Vec<_> = survivors
            .iter()
            .map(|label| OptionLabel::ALL.iter().position(|l| l == label).unwrap())
            .collect();
        assert!(positions[0] < positions[1]);
    }
}
