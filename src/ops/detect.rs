use crate::model::page::Page;
use crate::ops::rules::Rules;

/// Decide whether a task description marks its task as secret.
///
/// A description is secret when its trimmed text starts with the marker
/// glyph, or when the first image inside it is the marker image. Missing
/// text or images simply mean "not secret".
pub fn is_secret<P: Page>(page: &P, description: &P::Node, rules: &Rules) -> bool {
    let text = page.visible_text(description);
    if text.trim().starts_with(rules.marker.glyph.as_str()) {
        return true;
    }

    // Only the first embedded emoji counts
    page.query_first_within(description, &rules.icons)
        .and_then(|img| page.attribute(&img, "src"))
        .is_some_and(|src| src.ends_with(&rules.marker.image_suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::dom::Document;
    use crate::model::NodeId;

    fn description(inner: &str) -> (Document, NodeId) {
        let mut doc = Document::new();
        let body = doc.body_id();
        let p = doc.append_html(body, &format!("<p>{inner}</p>"))[0];
        (doc, p)
    }

    #[test]
    fn test_glyph_prefix_is_secret() {
        let rules = Rules::habitica().unwrap();
        let (doc, p) = description("㊙ hidden");
        assert!(is_secret(&doc, &p, &rules));
    }

    #[test]
    fn test_glyph_after_whitespace_is_secret() {
        let rules = Rules::habitica().unwrap();
        let (doc, p) = description("  \n ㊙️ spaced");
        assert!(is_secret(&doc, &p, &rules));
    }

    #[test]
    fn test_glyph_not_at_start_is_not_secret() {
        let rules = Rules::habitica().unwrap();
        let (doc, p) = description("shh ㊙");
        assert!(!is_secret(&doc, &p, &rules));
    }

    #[test]
    fn test_secret_image_is_secret() {
        let rules = Rules::habitica().unwrap();
        let (doc, p) =
            description(r#"<img src="https://habitica.com/static/emoji/secret.png"> walk the dog"#);
        assert!(is_secret(&doc, &p, &rules));
    }

    #[test]
    fn test_other_image_and_plain_text_is_not_secret() {
        let rules = Rules::habitica().unwrap();
        let (doc, p) =
            description(r#"<img src="https://habitica.com/static/emoji/other.png"> plain text"#);
        assert!(!is_secret(&doc, &p, &rules));
    }

    #[test]
    fn test_only_first_image_counts() {
        let rules = Rules::habitica().unwrap();
        let (doc, p) = description(r#"<img src="/emoji/other.png"><img src="/emoji/secret.png">"#);
        assert!(!is_secret(&doc, &p, &rules));
    }

    #[test]
    fn test_image_without_src_is_not_secret() {
        let rules = Rules::habitica().unwrap();
        let (doc, p) = description("<img>");
        assert!(!is_secret(&doc, &p, &rules));
    }

    #[test]
    fn test_empty_description_is_not_secret() {
        let rules = Rules::habitica().unwrap();
        let (doc, p) = description("");
        assert!(!is_secret(&doc, &p, &rules));
    }
}
