#[cfg(test)]
mod tests {
    use crate::review::{validate_form_answers, validate_text_answer, word_count};
    use common::models::FormQuestion;
    use common::Error;
    use std::collections::HashMap;

    #[test]
    fn words_split_on_any_whitespace() {
        assert_eq!(word_count("the dry forest blooms"), 4);
        assert_eq!(word_count("  spaced\tout\nwords  "), 3);
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   "), 0);
    }

    #[test]
    fn short_answer_names_the_required_minimum() {
        let thirty = ["word"; 30].join(" ");
        let err = validate_text_answer(&thirty, 50, 200).unwrap_err();
        match err {
            Error::Validation(msg) => {
                assert!(msg.contains("50"), "message must carry the minimum: {}", msg);
                assert!(msg.contains("30"), "message must carry the actual count: {}", msg);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn long_answer_names_the_maximum() {
        let many = ["word"; 210].join(" ");
        let err = validate_text_answer(&many, 50, 200).unwrap_err();
        match err {
            Error::Validation(msg) => assert!(msg.contains("200")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn bounds_are_inclusive() {
        let fifty = ["word"; 50].join(" ");
        assert!(validate_text_answer(&fifty, 50, 200).is_ok());
        let two_hundred = ["word"; 200].join(" ");
        assert!(validate_text_answer(&two_hundred, 50, 200).is_ok());
    }

    fn questions() -> Vec<FormQuestion> {
        vec![
            FormQuestion {
                id: "q1".into(),
                label: "What did you observe?".into(),
                required: true,
            },
            FormQuestion {
                id: "q2".into(),
                label: "Anything else?".into(),
                required: false,
            },
        ]
    }

    #[test]
    fn missing_required_answer_is_rejected_by_label() {
        let answers = HashMap::new();
        let err = validate_form_answers(&questions(), &answers).unwrap_err();
        match err {
            Error::Validation(msg) => assert!(msg.contains("What did you observe?")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn blank_required_answer_is_rejected() {
        let mut answers = HashMap::new();
        answers.insert("q1".to_string(), "   ".to_string());
        assert!(validate_form_answers(&questions(), &answers).is_err());
    }

    #[test]
    fn optional_questions_may_stay_empty() {
        let mut answers = HashMap::new();
        answers.insert("q1".to_string(), "A flowering mandacaru".to_string());
        assert!(validate_form_answers(&questions(), &answers).is_ok());
    }
}
