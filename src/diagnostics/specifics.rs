use super::ReportLevel as RL;
use crate::{diagnostics::Report, document::ObligationKind, span::Span, strings};
use ustr::Ustr;

macro_rules! uformat {
    ($($t:tt)*) => {
        ustr::Ustr::from(&format!($($t)*))
    };
}

fn render_obligation_kind(kind: ObligationKind) -> &'static str {
    match kind {
        ObligationKind::Lemma => "lemma",
        ObligationKind::Theorem => "theorem",
        ObligationKind::Corollary => "corollary",
    }
}

pub fn unterminated_obligation(span: Span, kind: ObligationKind, name: Ustr) -> Report {
    Report::new(
        RL::Warning,
        uformat!(
            "{} `{name}` is never closed and was skipped",
            render_obligation_kind(kind)
        ),
    )
    .with_info(span, uformat!("opened here"))
    .with_note(
        span,
        uformat!(
            "expected `{}.`, `{}.`, `{}.` or `{}.` before the end of the file",
            *strings::QED,
            *strings::DEFINED,
            *strings::ADMITTED,
            *strings::ABORT
        ),
    )
}

pub fn duplicate_obligation(span: Span, kind: ObligationKind, name: Ustr, previous: Span) -> Report {
    Report::new(
        RL::Error,
        uformat!(
            "redeclaration of {} `{name}`",
            render_obligation_kind(kind)
        ),
    )
    .with_info(span, uformat!("declared again here"))
    .with_info(previous, uformat!("previous declaration"))
}
