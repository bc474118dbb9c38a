pub mod dom;
pub mod rules;

use std::sync::LazyLock;

use scraper::Selector;
use thiserror::Error;

use dom::Document;

static EMBEDDABLE_ROOT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("#spectaql").unwrap());

#[derive(Debug, Error)]
pub enum AugmentError {
    #[error("generated HTML has no #spectaql root")]
    MissingRoot,
}

/// Rewrite raw generator output into an anchored, embeddable fragment:
/// parse → ordered rewrite rules → inner markup of `#spectaql`.
pub fn augment(html: &str) -> Result<String, AugmentError> {
    let mut doc = Document::parse(html);
    rules::apply_all(&mut doc);
    let root = doc
        .select_first(&EMBEDDABLE_ROOT)
        .ok_or(AugmentError::MissingRoot)?;
    Ok(doc.inner_html(root))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_yields_inner_markup_without_page_shell() {
        let raw = std::fs::read_to_string("tests/fixtures/spectaql.html").unwrap();
        let fragment = augment(&raw).unwrap();

        assert!(fragment.trim_start().starts_with(r#"<div id="sidebar">"#));
        assert!(fragment.trim_end().ends_with("</div>"));
        for shell in ["<html", "<head", "<title", "<body", "<meta", r#"<div id="spectaql">"#] {
            assert!(!fragment.contains(shell), "fragment still contains {}", shell);
        }
        assert!(fragment.contains(
            r##"<h1 class="doc-heading" id="doc-heading-id"><a class="anchor" href="#doc-heading-id"></a>Bookstore API</h1>"##
        ));
        assert!(fragment.contains(r#"id="allBooks-query-0""#));
    }

    #[test]
    fn missing_root_is_an_error() {
        let err = augment(r#"<html><body><div id="docs"><h1 class="doc-heading">API</h1></div></body></html>"#)
            .unwrap_err();
        assert!(matches!(err, AugmentError::MissingRoot));
        assert_eq!(err.to_string(), "generated HTML has no #spectaql root");
    }

    #[test]
    fn keeps_foreign_content_attributes() {
        let fragment = augment(
            r##"<div id="spectaql"><svg><use xlink:href="#icon"></use></svg><h1 class="doc-heading">API</h1></div>"##,
        )
        .unwrap();
        assert!(fragment.starts_with(r##"<svg><use xlink:href="#icon"></use></svg>"##));
    }

    #[test]
    fn augmenting_output_again_is_stable() {
        let raw = std::fs::read_to_string("tests/fixtures/spectaql.html").unwrap();
        let once = augment(&raw).unwrap();
        let twice = augment(&format!(r#"<div id="spectaql">{}</div>"#, once)).unwrap();
        assert_eq!(twice, once);
    }
}
