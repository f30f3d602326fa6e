use std::fmt;

use scraper::ElementRef;

/// A selector string that could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("{0}")]
    Syntax(String),
}

/// A parsed CSS selector group that keeps its source text.
///
/// The in-memory document matches with the compiled form; the browser host
/// hands [`as_str`](Selector::as_str) straight to `querySelectorAll`.
#[derive(Clone)]
pub struct Selector {
    source: String,
    compiled: scraper::Selector,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(SelectorError::Empty);
        }
        let compiled = scraper::Selector::parse(source)
            .map_err(|e| SelectorError::Syntax(e.to_string()))?;
        Ok(Selector {
            source: source.to_string(),
            compiled,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, element: &ElementRef<'_>) -> bool {
        self.compiled.matches(element)
    }
}

impl std::str::FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Selector::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Selector").field(&self.source).finish()
    }
}

impl PartialEq for Selector {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Selector {}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    const MARKUP: &str = r#"
        <div class="habit">
          <div class="sortable-tasks">
            <div class="task-wrapper" id="first">
              <div class="task type_habit"><p class="секрет">one</p></div>
            </div>
          </div>
          <img src="/static/emoji/secret.png">
          <img src="/static/emoji/other.png">
        </div>"#;

    /// Text of every element in `markup` matched by `selector`, in document order
    fn matched(selector: &str) -> Vec<String> {
        let html = Html::parse_fragment(MARKUP);
        let selector = Selector::parse(selector).unwrap();
        html.root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| selector.matches(el))
            .map(|el| match el.value().attr("src") {
                Some(src) => src.to_string(),
                None => el.text().collect::<String>().trim().to_string(),
            })
            .collect()
    }

    #[test]
    fn test_combinators_and_groups() {
        assert_eq!(matched(".habit .sortable-tasks > .task-wrapper > .type_habit p"), vec!["one"]);
        assert!(matched(".habit > .task-wrapper").is_empty());
        assert_eq!(matched("#first p, img").len(), 3);
    }

    #[test]
    fn test_attribute_selectors() {
        assert_eq!(matched(r#"img[src$="secret.png"]"#), vec!["/static/emoji/secret.png"]);
        assert_eq!(matched("img:not([src*=secret])"), vec!["/static/emoji/other.png"]);
    }

    #[test]
    fn test_non_ascii_class() {
        assert_eq!(matched(".секрет"), vec!["one"]);
    }

    #[test]
    fn test_source_text_is_kept() {
        let sel: Selector = "  .daily .sortable-tasks ".parse().unwrap();
        assert_eq!(sel.as_str(), ".daily .sortable-tasks");
        assert_eq!(sel.to_string(), ".daily .sortable-tasks");
        assert_eq!(sel, Selector::parse(".daily .sortable-tasks").unwrap());
    }

    #[test]
    fn test_errors() {
        assert_eq!(Selector::parse("   "), Err(SelectorError::Empty));
        assert!(matches!(Selector::parse("h3 >"), Err(SelectorError::Syntax(_))));
        assert!(matches!(Selector::parse("div["), Err(SelectorError::Syntax(_))));
    }
}
