use crate::model::page::Page;
use crate::ops::censor::{censor, restore};
use crate::ops::detect::is_secret;
use crate::ops::rules::Rules;

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Task nodes found on the page
    pub tasks: usize,
    pub censored: usize,
    pub restored: usize,
    /// Style properties that actually changed. Zero means the page had already converged.
    pub style_writes: usize,
}

/// Bring every rendered task to the look its current description calls for.
///
/// Secrecy is recomputed from scratch on every call, so this is safe to run
/// as often as the page changes.
pub fn reconcile_all<P: Page>(page: &mut P, rules: &Rules) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    let tasks = page.query_all(&rules.tasks);
    if tasks.is_empty() {
        tracing::info!("no task nodes rendered yet");
        return report;
    }

    for task in &tasks {
        let secret = page
            .query_first_within(task, &rules.description)
            .is_some_and(|description| is_secret(page, &description, rules));

        if secret {
            report.style_writes += censor(page, task, rules);
            report.censored += 1;
        } else {
            report.style_writes += restore(page, task, rules);
            report.restored += 1;
        }
    }
    report.tasks = tasks.len();

    tracing::debug!(
        tasks = report.tasks,
        censored = report.censored,
        style_writes = report.style_writes,
        "reconciled task list"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::dom::Document;
    use crate::model::style::{BACKGROUND, COLOR};
    use pretty_assertions::assert_eq;

    /// `.task-wrapper > .task.type_{kind} > .task-content > .clickable > (h3 > p, div > p)`
    fn task(kind: &str, title: &str, notes: Option<&str>) -> String {
        let notes = notes
            .map(|n| format!(r#"<div class="task-notes"><p>{n}</p></div>"#))
            .unwrap_or_default();
        format!(
            r#"<div class="task-wrapper"><div class="task type_{kind}"><div class="task-content">
                 <div class="task-clickable-area"><h3 class="task-title"><p>{title}</p></h3>{notes}</div>
                 <span>+1</span>
               </div></div></div>"#
        )
    }

    fn page(tasks: &[String]) -> Document {
        Document::parse(&tasks.concat())
    }

    #[test]
    fn test_empty_page_is_noop() {
        let rules = Rules::habitica().unwrap();
        let mut doc = Document::new();
        assert_eq!(reconcile_all(&mut doc, &rules), ReconcileReport::default());
    }

    #[test]
    fn test_mixed_tasks_converge() {
        let rules = Rules::habitica().unwrap();
        let mut doc = page(&[
            task("habit", "Secret habit", Some("㊙ shh")),
            task("habit", "Open habit", Some("nothing to hide")),
            task("daily", "No notes", None),
            task("daily", "Emoji secret", Some(r#"<img src="/e/secret.png">"#)),
            // Todos are not part of the task selector
            task("todo", "Ignored", Some("㊙ todo")),
        ]);

        let report = reconcile_all(&mut doc, &rules);
        assert_eq!(report.tasks, 4);
        assert_eq!(report.censored, 2);
        assert_eq!(report.restored, 2);

        let contents = doc.query_all(&rules.tasks);
        let backgrounds: Vec<Option<String>> = contents
            .iter()
            .map(|t| doc.style_property(t, BACKGROUND))
            .collect();
        let censored = Some(rules.palette.censored.background.clone());
        let standard = Some(rules.palette.standard.background.clone());
        assert_eq!(
            backgrounds,
            vec![censored.clone(), standard.clone(), standard, censored]
        );

        let todo = doc.query_all(&"div.type_todo .task-content".parse().unwrap());
        assert_eq!(doc.style_property(&todo[0], BACKGROUND), None);
    }

    #[test]
    fn test_converges_regardless_of_prior_style() {
        let rules = Rules::habitica().unwrap();
        let tasks = [
            task("habit", "a", Some("plain")),
            task("habit", "b", Some("㊙ hidden")),
        ];
        let mut doc = page(&tasks);
        let contents = doc.query_all(&rules.tasks);
        // Wrong way round to begin with
        censor(&mut doc, &contents[0], &rules);
        restore(&mut doc, &contents[1], &rules);

        reconcile_all(&mut doc, &rules);

        let mut fresh = page(&tasks);
        reconcile_all(&mut fresh, &rules);
        assert_eq!(
            doc.style_outline(doc.body_id()),
            fresh.style_outline(fresh.body_id())
        );
    }

    #[test]
    fn test_second_pass_writes_nothing() {
        let rules = Rules::habitica().unwrap();
        let mut doc = page(&[task("habit", "a", Some("㊙ x")), task("daily", "b", None)]);
        let first = reconcile_all(&mut doc, &rules);
        assert!(first.style_writes > 0);
        let before = doc.style_outline(doc.body_id());

        let second = reconcile_all(&mut doc, &rules);
        assert_eq!(second.style_writes, 0);
        assert_eq!(second.tasks, 2);
        assert_eq!(doc.style_outline(doc.body_id()), before);
    }

    #[test]
    fn test_description_edit_flips_look() {
        let rules = Rules::habitica().unwrap();
        let mut doc = page(&[task("habit", "a", Some("㊙ x"))]);
        reconcile_all(&mut doc, &rules);

        let p = doc.query_all(&"div > p".parse().unwrap())[0];
        assert_eq!(
            doc.style_property(&p, COLOR).as_deref(),
            Some("transparent")
        );

        doc.set_text_content(p, "not secret any more");
        let report = reconcile_all(&mut doc, &rules);
        assert_eq!(report.restored, 1);
        assert_eq!(
            doc.style_property(&p, COLOR),
            Some(rules.palette.standard.description_color.clone())
        );
    }
}
