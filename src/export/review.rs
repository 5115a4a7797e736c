//! Markdown review of the collected answers

use crate::collector::Session;

/// Summary of everything answered so far, charter first then SIPOC
pub fn review_markdown(session: &Session, separator: &str) -> String {
    let mut out = String::from("## Project Charter\n\n");
    for (key, answer) in session.charter().iter() {
        out.push_str(&format!("**{}:** {}\n", key, answer.display(separator)));
    }

    out.push_str("\n## SIPOC\n\n");
    for (key, answer) in session.sipoc().iter() {
        out.push_str(&format!("**{}:** {}\n", key, answer.display(separator)));
    }

    let pending = session.total_questions() - session.answered();
    if pending > 0 {
        out.push_str(&format!("\n_{} question(s) still open._\n", pending));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questions::{CharterPreset, sipoc_questions};

    #[test]
    fn test_partial_review_lists_answers_and_pending() {
        let mut session = Session::new(CharterPreset::Define.questions(), sipoc_questions());
        session.submit_answer("Slow bags").unwrap();

        let review = review_markdown(&session, ", ");
        assert!(review.contains("**Problem Statement:** Slow bags\n"));
        assert!(review.contains("_8 question(s) still open._"));
    }
}
