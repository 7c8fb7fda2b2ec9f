//! Canonical markdown-fence cleanup for model-generated code.
//!
//! One policy, applied everywhere: if the text contains a complete fenced
//! block, extract the first block's contents; otherwise strip a single
//! leading fence line (triple-backtick with an optional language tag) and a
//! single trailing triple-backtick line. Fence-free input passes through
//! unchanged, so the function is idempotent on its own output.

use std::sync::OnceLock;

use regex::Regex;

static FENCED_BLOCK: OnceLock<Regex> = OnceLock::new();

fn fenced_block_re() -> &'static Regex {
    FENCED_BLOCK.get_or_init(|| {
        Regex::new(r"(?ms)^```[A-Za-z0-9_+.\-]*[ \t]*\r?\n(.*?)^```[ \t]*$")
            .expect("fence regex should be valid")
    })
}

/// Remove fence delimiter lines from `raw`, leaving the code itself intact.
pub fn sanitize_code(raw: &str) -> String {
    if let Some(block) = extract_first_fenced_block(raw) {
        return block;
    }

    let mut code = raw;
    if let Some(rest) = strip_leading_fence(code) {
        code = rest;
    }
    if let Some(rest) = strip_trailing_fence(code) {
        code = rest;
    }
    code.to_string()
}

/// Contents of the first complete fenced block, if any.
fn extract_first_fenced_block(raw: &str) -> Option<String> {
    let caps = fenced_block_re().captures(raw)?;
    let body = caps.get(1).map_or("", |m| m.as_str());
    Some(chomp(body).to_string())
}

/// Drop one trailing line terminator.
fn chomp(s: &str) -> &str {
    let s = s.strip_suffix('\n').unwrap_or(s);
    s.strip_suffix('\r').unwrap_or(s)
}

fn is_opening_fence(line: &str) -> bool {
    line.trim().strip_prefix("```").is_some_and(|tag| {
        tag.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '-' | '.'))
    })
}

fn strip_leading_fence(s: &str) -> Option<&str> {
    match s.find('\n') {
        Some(pos) => is_opening_fence(&s[..pos]).then(|| &s[pos + 1..]),
        None => is_opening_fence(s).then_some(""),
    }
}

fn strip_trailing_fence(s: &str) -> Option<&str> {
    let body = chomp(s);
    let (head, last) = match body.rfind('\n') {
        Some(pos) => (&body[..pos + 1], &body[pos + 1..]),
        None => ("", body),
    };
    (last.trim() == "```").then_some(head)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fence_free_code_passes_through_unchanged() {
        let code = "def f():\n    return 1 + 1\n";
        assert_eq!(sanitize_code(code), code);
    }

    #[test]
    fn sanitize_is_idempotent() {
        let wrapped = "```python\nprint(1 + 1)\n```";
        let once = sanitize_code(wrapped);
        assert_eq!(sanitize_code(&once), once);
    }

    #[test]
    fn extracts_exact_block_contents() {
        assert_eq!(sanitize_code("```python\nprint(1 + 1)\n```"), "print(1 + 1)");
    }

    #[test]
    fn extracts_first_block_from_prose() {
        let raw = "Here is the solution:\n```python\nx = 2\nprint(x)\n```\nHope that helps!";
        assert_eq!(sanitize_code(raw), "x = 2\nprint(x)");
    }

    #[test]
    fn extracts_first_of_multiple_blocks() {
        let raw = "```\nfirst\n```\ntext\n```\nsecond\n```";
        assert_eq!(sanitize_code(raw), "first");
    }

    #[test]
    fn strips_unpaired_leading_fence() {
        assert_eq!(sanitize_code("```python\nprint(1)\n"), "print(1)\n");
    }

    #[test]
    fn strips_unpaired_trailing_fence() {
        assert_eq!(sanitize_code("print(1)\n```"), "print(1)\n");
        assert_eq!(sanitize_code("print(1)\n```\n"), "print(1)\n");
    }

    #[test]
    fn keeps_interior_lines_intact() {
        let raw = "```\na = '```'\nprint(a)\n```";
        // The quoted backticks are mid-line, not a delimiter line, so they
        // survive extraction.
        assert_eq!(sanitize_code(raw), "a = '```'\nprint(a)");
    }

    #[test]
    fn lone_fence_line_becomes_empty() {
        assert_eq!(sanitize_code("```"), "");
        assert_eq!(sanitize_code("```python"), "");
    }

    #[test]
    fn language_tag_with_punctuation_is_recognized() {
        assert_eq!(sanitize_code("```c++\nint x;\n```"), "int x;");
    }
}
