//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::{
    dao::models::{OptionLabel, QuestionOptionEntity},
    rules,
};

/// Validates that a host-typed selection parses to an option letter.
///
/// # Examples
///
/// ```ignore
/// validate_option_choice("B")   // Ok
/// validate_option_choice(" c ") // Ok - normalized
/// validate_option_choice("E")   // Err - no such option
/// ```
pub fn validate_option_choice(selected: &str) -> Result<(), ValidationError> {
    if rules::parse_option_label(selected).is_none() {
        let mut err = ValidationError::new("option_choice");
        err.message = Some(
            format!("Selection `{selected}` is not one of the option letters A-D").into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Validates one question's options: all four labels present exactly once,
/// and the correct label among them.
pub fn validate_question_options(
    options: &[QuestionOptionEntity],
    correct: OptionLabel,
) -> Result<(), ValidationError> {
    if options.len() != OptionLabel::ALL.len() {
        let mut err = ValidationError::new("option_count");
        err.message = Some(
            format!(
                "A question must have exactly {} options (got {})",
                OptionLabel::ALL.len(),
                options.len()
            )
            .into(),
        );
        return Err(err);
    }

    for label in OptionLabel::ALL {
        let count = options.iter().filter(|option| option.label == label).count();
        if count != 1 {
            let mut err = ValidationError::new("option_labels");
            err.message =
                Some(format!("Option label {label} must appear exactly once (got {count})").into());
            return Err(err);
        }
    }

    if !options.iter().any(|option| option.label == correct) {
        let mut err = ValidationError::new("correct_option");
        err.message = Some(format!("Correct option {correct} is not among the options").into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<QuestionOptionEntity> {
        OptionLabel::ALL
            .iter()
            .map(|label| QuestionOptionEntity {
                label: *label,
                text: format!("answer {label}"),
            })
            .collect()
    }

    #[test]
    fn test_validate_option_choice_valid() {
        assert!(validate_option_choice("A").is_ok());
        assert!(validate_option_choice("b").is_ok());
        assert!(validate_option_choice(" D ").is_ok());
    }

    #[test]
    fn test_validate_option_choice_invalid() {
        assert!(validate_option_choice("E").is_err());
        assert!(validate_option_choice("AB").is_err());
        assert!(validate_option_choice("").is_err());
    }

    #[test]
    fn test_validate_question_options_valid() {
        assert!(validate_question_options(&options(), OptionLabel::C).is_ok());
    }

    #[test]
    fn test_validate_question_options_wrong_count() {
        let mut three = options();
        three.pop();
        assert!(validate_question_options(&three, OptionLabel::A).is_err());
    }

    #[test]
    fn test_validate_question_options_duplicate_label() {
        let mut duplicated = options();
        duplicated[3].label = OptionLabel::A;
        assert!(validate_question_options(&duplicated, OptionLabel::A).is_err());
    }
}
