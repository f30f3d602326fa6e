use crate::model::page::Page;
use crate::model::style::{BACKGROUND, BACKGROUND_COLOR, COLOR, OPACITY, TaskLook};
use crate::ops::rules::Rules;

/// The styled pieces of one task node
#[derive(Debug, Clone)]
pub struct TaskParts<N> {
    pub title: Option<N>,
    pub description: Option<N>,
    pub icons: Vec<N>,
    pub counters: Vec<N>,
    pub vector_icons: Vec<N>,
}

pub fn task_parts<P: Page>(page: &P, task: &P::Node, rules: &Rules) -> TaskParts<P::Node> {
    TaskParts {
        title: page.query_first_within(task, &rules.title),
        description: page.query_first_within(task, &rules.description),
        icons: page.query_within(task, &rules.icons),
        counters: page.query_within(task, &rules.counters),
        vector_icons: page.query_within(task, &rules.vector_icons),
    }
}

/// Hide a task's content behind the censored look. Returns the number of
/// style properties that actually changed.
pub fn censor<P: Page>(page: &mut P, task: &P::Node, rules: &Rules) -> usize {
    apply_look(page, task, &rules.palette.censored, rules)
}

/// Put a task back to the standard look. This resets to fixed values, not
/// to whatever the task showed before it was censored.
pub fn restore<P: Page>(page: &mut P, task: &P::Node, rules: &Rules) -> usize {
    apply_look(page, task, &rules.palette.standard, rules)
}

/// Write every property of `look` onto the task and its parts. Censor and
/// restore go through here so they always touch the same property set.
fn apply_look<P: Page>(page: &mut P, task: &P::Node, look: &TaskLook, rules: &Rules) -> usize {
    let parts = task_parts(page, task, rules);
    let mut writes = 0;

    writes += write(page, task, BACKGROUND, &look.background);
    writes += write(page, task, BACKGROUND_COLOR, &look.background_color);

    if let Some(title) = &parts.title {
        writes += write(page, title, COLOR, &look.title_color);
    }
    if let Some(description) = &parts.description {
        writes += write(page, description, COLOR, &look.description_color);
    }
    for icon in &parts.icons {
        writes += write(page, icon, OPACITY, &look.icon_opacity);
    }
    for counter in &parts.counters {
        writes += write(page, counter, COLOR, &look.counter_color);
    }
    for svg in &parts.vector_icons {
        writes += write(page, svg, COLOR, &look.vector_icon_color);
    }

    writes
}

/// Set one property unless it already holds `value`
fn write<P: Page>(page: &mut P, node: &P::Node, property: &str, value: &str) -> usize {
    if page.style_property(node, property).as_deref() == Some(value) {
        return 0;
    }
    page.set_style_property(node, property, value);
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::dom::Document;
    use crate::model::NodeId;
    use pretty_assertions::assert_eq;

    const FULL_TASK: &str = concat!(
        r#"<div class="task-content">"#,
        r#"<div class="task-clickable-area">"#,
        r#"<h3 class="task-title"><p>Call mom <img src="/emoji/phone.png"></p></h3>"#,
        r#"<div class="task-notes"><p>㊙ birthday surprise</p></div>"#,
        r#"</div>"#,
        r#"<div class="icons"><span>3</span><svg></svg></div>"#,
        r#"</div>"#,
    );

    fn load(html: &str) -> (Document, NodeId) {
        let mut doc = Document::new();
        let body = doc.body_id();
        let task = doc.append_html(body, html)[0];
        (doc, task)
    }

    #[test]
    fn test_censor_hides_every_layer() {
        let rules = Rules::habitica().unwrap();
        let (mut doc, task) = load(FULL_TASK);
        let writes = censor(&mut doc, &task, &rules);
        // background x2, title, description, 1 icon, 1 span, 1 svg
        assert_eq!(writes, 7);
        insta::assert_snapshot!(doc.style_outline(task), @r"
        div.task-content [background: repeating-linear-gradient( 45deg, #fd3030, #fd3030 5px, #e5e5f7 5px, #e5e5f7 25px ); background-color: #d5c8ff]
          div.task-clickable-area
            h3.task-title
              p [color: transparent]
                img [opacity: 0]
            div.task-notes
              p [color: transparent]
          div.icons
            span [color: transparent]
            svg [color: transparent]
        ");
    }

    #[test]
    fn test_restore_after_censor_equals_restore_alone() {
        let rules = Rules::habitica().unwrap();

        let (mut censored_first, task) = load(FULL_TASK);
        censor(&mut censored_first, &task, &rules);
        restore(&mut censored_first, &task, &rules);

        let (mut plain, task2) = load(FULL_TASK);
        restore(&mut plain, &task2, &rules);

        assert_eq!(censored_first.style_outline(task), plain.style_outline(task2));
    }

    #[test]
    fn test_restore_after_censor_is_standard_palette() {
        let rules = Rules::habitica().unwrap();
        let (mut doc, task) = load(FULL_TASK);
        censor(&mut doc, &task, &rules);
        restore(&mut doc, &task, &rules);

        let standard = &rules.palette.standard;
        let parts = task_parts(&doc, &task, &rules);
        let style = |n: &NodeId, p: &str| doc.style_property(n, p);

        assert_eq!(style(&task, BACKGROUND), Some(standard.background.clone()));
        assert_eq!(style(&task, BACKGROUND_COLOR), Some(standard.background_color.clone()));
        assert_eq!(style(&parts.title.unwrap(), COLOR), Some(standard.title_color.clone()));
        assert_eq!(
            style(&parts.description.unwrap(), COLOR),
            Some(standard.description_color.clone())
        );
        assert_eq!(style(&parts.icons[0], OPACITY), Some("1".to_string()));
        assert_eq!(style(&parts.counters[0], COLOR), Some(standard.counter_color.clone()));
        assert_eq!(
            style(&parts.vector_icons[0], COLOR),
            Some(standard.vector_icon_color.clone())
        );
    }

    #[test]
    fn test_censor_twice_is_censor_once() {
        let rules = Rules::habitica().unwrap();
        let (mut doc, task) = load(FULL_TASK);
        censor(&mut doc, &task, &rules);
        let once = doc.style_outline(task);
        assert_eq!(censor(&mut doc, &task, &rules), 0);
        assert_eq!(doc.style_outline(task), once);
    }

    #[test]
    fn test_bare_task_only_gets_background() {
        let rules = Rules::habitica().unwrap();
        let (mut doc, task) = load(r#"<div class="task-content"></div>"#);
        assert_eq!(censor(&mut doc, &task, &rules), 2);
        assert_eq!(restore(&mut doc, &task, &rules), 2);
        assert_eq!(
            doc.style_property(&task, BACKGROUND).as_deref(),
            Some("#fff")
        );
    }

    #[test]
    fn test_parts_found_by_selector() {
        let rules = Rules::habitica().unwrap();
        let (doc, task) = load(FULL_TASK);
        let parts = task_parts(&doc, &task, &rules);
        assert_eq!(doc.text_content(parts.title.unwrap()), "Call mom ");
        assert_eq!(doc.text_content(parts.description.unwrap()), "㊙ birthday surprise");
        assert_eq!(parts.icons.len(), 1);
        assert_eq!(parts.counters.len(), 1);
        assert_eq!(parts.vector_icons.len(), 1);
    }
}
