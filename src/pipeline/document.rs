//! Document wrapper: embed a LaTeX fragment in a minimal compilable document.
//!
//! `\thispagestyle{empty}` suppresses the page number, which would otherwise
//! survive cropping as a stray digit at the bottom of the image.

/// Wrap `snippet` in the fixed document template.
///
/// `preamble`, when given, goes on its own line directly after the document
/// class. The caller guarantees `snippet` is non-empty.
pub fn wrap_document(snippet: &str, preamble: Option<&str>) -> String {
    let mut doc = String::with_capacity(snippet.len() + 96);
    doc.push_str("\\documentclass{article}\n");
    if let Some(extra) = preamble.filter(|p| !p.trim().is_empty()) {
        doc.push_str(extra.trim_end_matches('\n'));
        doc.push('\n');
    }
    doc.push_str("\\thispagestyle{empty}\n");
    doc.push_str("\\begin{document}\n");
    doc.push_str(snippet);
    doc.push_str("\n\\end{document}");
    doc
}
