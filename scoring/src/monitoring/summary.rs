use std::fmt::Write as _;

use crate::model::{DispatchMode, ScoreRequest};

/// Upper bound (in characters) of the argument text written to entry logs.
pub const MAX_ARGUMENT_LOG_LENGTH: usize = 500;

pub const TRUNCATION_MARKER: &str = "... (truncated)";

/// Explicit, loggable rendering of an operation's arguments.
pub trait ArgSummary {
    fn write_summary(&self, out: &mut String);
}

/// Renders `args` as `[a, b, ...]`, bounded to [`MAX_ARGUMENT_LOG_LENGTH`].
pub fn summarize(args: &dyn ArgSummary) -> String {
    let mut out = String::from("[");
    args.write_summary(&mut out);
    out.push(']');
    bound(out)
}

/// Cuts `text` after [`MAX_ARGUMENT_LOG_LENGTH`] characters and appends
/// [`TRUNCATION_MARKER`]. Control characters are escaped so the result is
/// always printable on one line.
pub fn bound(text: String) -> String {
    let needs_escape = text.chars().any(char::is_control);
    if !needs_escape && text.chars().count() <= MAX_ARGUMENT_LOG_LENGTH {
        return text;
    }

    let mut out = String::with_capacity(MAX_ARGUMENT_LOG_LENGTH + TRUNCATION_MARKER.len());
    let mut written = 0;
    for c in text.chars() {
        let escaped: Vec<char> = if c.is_control() {
            c.escape_default().collect()
        } else {
            vec![c]
        };
        for e in escaped {
            if written == MAX_ARGUMENT_LOG_LENGTH {
                out.push_str(TRUNCATION_MARKER);
                return out;
            }
            out.push(e);
            written += 1;
        }
    }
    out
}

impl ArgSummary for () {
    fn write_summary(&self, _out: &mut String) {}
}

impl<T: ArgSummary + ?Sized> ArgSummary for &T {
    fn write_summary(&self, out: &mut String) {
        (**self).write_summary(out);
    }
}

impl<A: ArgSummary, B: ArgSummary> ArgSummary for (A, B) {
    fn write_summary(&self, out: &mut String) {
        self.0.write_summary(out);
        out.push_str(", ");
        self.1.write_summary(out);
    }
}

impl ArgSummary for str {
    fn write_summary(&self, out: &mut String) {
        let _ = write!(out, "{self:?}");
    }
}

impl ArgSummary for ScoreRequest {
    fn write_summary(&self, out: &mut String) {
        let _ = write!(out, "ScoreRequest{{candidateId={:?}, totalQuestions=", self.candidate_id);
        write_count(out, self.total_questions);
        out.push_str(", correctAnswers=");
        write_count(out, self.correct_answers);
        out.push('}');
    }
}

impl ArgSummary for DispatchMode {
    fn write_summary(&self, out: &mut String) {
        let _ = write!(out, "{self}");
    }
}

fn write_count(out: &mut String, v: Option<i32>) {
    match v {
        Some(n) => {
            let _ = write!(out, "{n}");
        }
        None => out.push_str("null"),
    }
}
