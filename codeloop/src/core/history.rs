//! Deterministic rendering of prior attempts for re-prompting.

use minijinja::{Environment, context};
use serde::Serialize;

use crate::core::types::AttemptSnapshot;

const HISTORY_TEMPLATE: &str = include_str!("templates/history.md");

/// Per-attempt context for template rendering.
#[derive(Debug, Clone, Serialize)]
struct AttemptContext<'a> {
    plan: &'a str,
    code: &'a str,
    success: bool,
    stderr: &'a str,
    error: Option<&'a str>,
    summary: Option<&'a str>,
}

impl<'a> AttemptContext<'a> {
    fn from_snapshot(snapshot: &'a AttemptSnapshot) -> Self {
        Self {
            plan: &snapshot.plan,
            code: &snapshot.code,
            success: snapshot.execution.success,
            stderr: &snapshot.execution.stderr,
            error: snapshot.execution.error.as_deref(),
            summary: snapshot.summary.as_deref(),
        }
    }
}

/// Render prior attempts into one text block, oldest first.
///
/// Identical input always yields byte-identical output; an empty history
/// renders the empty string.
pub fn render_history(attempts: &[AttemptSnapshot]) -> String {
    if attempts.is_empty() {
        return String::new();
    }

    let mut env = Environment::new();
    env.add_template("history", HISTORY_TEMPLATE)
        .expect("history template should be valid");
    let template = env
        .get_template("history")
        .expect("history template should be registered");

    let contexts: Vec<AttemptContext<'_>> =
        attempts.iter().map(AttemptContext::from_snapshot).collect();
    template
        .render(context! { attempts => contexts })
        .expect("history template should render")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ExecutionRecord;

    fn attempt(plan: &str, code: &str, execution: ExecutionRecord) -> AttemptSnapshot {
        AttemptSnapshot {
            plan: plan.to_string(),
            code: code.to_string(),
            execution,
            summary: Some(format!("summary for {plan}")),
        }
    }

    #[test]
    fn empty_history_renders_empty_string() {
        assert_eq!(render_history(&[]), "");
    }

    #[test]
    fn attempts_render_in_chronological_order() {
        let attempts = vec![
            attempt(
                "first plan",
                "print(1)",
                ExecutionRecord::runtime_failure(1, String::new(), "oops".to_string()),
            ),
            attempt(
                "second plan",
                "print(2)",
                ExecutionRecord::succeeded("2".to_string(), String::new()),
            ),
        ];

        let rendered = render_history(&attempts);
        let first = rendered.find("first plan").expect("first plan present");
        let second = rendered.find("second plan").expect("second plan present");
        assert!(first < second);
        assert!(rendered.contains("print(1)"));
        assert!(rendered.contains("summary for second plan"));
    }

    #[test]
    fn stderr_rendered_only_for_failures() {
        let failed = attempt(
            "p",
            "c",
            ExecutionRecord::runtime_failure(2, String::new(), "trace-line".to_string()),
        );
        let ok = attempt(
            "p",
            "c",
            ExecutionRecord::succeeded("fine".to_string(), "warning-noise".to_string()),
        );

        assert!(render_history(std::slice::from_ref(&failed)).contains("trace-line"));
        assert!(!render_history(std::slice::from_ref(&ok)).contains("warning-noise"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let attempts = vec![attempt(
            "p",
            "c",
            ExecutionRecord::timed_out(std::time::Duration::from_secs(5)),
        )];
        assert_eq!(render_history(&attempts), render_history(&attempts));
    }
}
