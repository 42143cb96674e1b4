use crate::{
    diagnostics::{AnnotationTy, Report, ReportLevel},
    span::SourceCache,
};
use annotate_snippets::{self as snip, Snippet};

fn snip_an_level(ty: AnnotationTy) -> snip::Level {
    match ty {
        AnnotationTy::Note => snip::Level::Note,
        AnnotationTy::Info => snip::Level::Info,
    }
}

pub fn render(report: &Report, sources: &SourceCache) {
    let snip_level = match report.level() {
        ReportLevel::Error => snip::Level::Error,
        ReportLevel::Warning => snip::Level::Warning,
    };

    let mut snip_msg = snip_level.title(report.msg().as_str());

    for annotations in report
        .annotations
        .chunk_by(|a, b| a.span.source() == b.span.source())
    {
        let filename = annotations[0].span.source().as_str();
        let source = sources.get_text(annotations[0].span.source());

        let snippet = Snippet::source(source)
            .origin(filename)
            .fold(true)
            .annotations(
                annotations
                    .iter()
                    .map(|a| snip_an_level(a.ty).span(a.span.bytes()).label(&a.msg)),
            );
        snip_msg = snip_msg.snippet(snippet);
    }

    let renderer = snip::Renderer::styled();
    eprintln!("{}", renderer.render(snip_msg));
}
