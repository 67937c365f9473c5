//! `bitwarden` directives embedded in markdown
//!
//! Two spellings are recognised:
//!
//! ````markdown
//! ```bitwarden
//! login 0f2a6b4e-1d3c-4e5f-8a9b-c0d1e2f3a4b5
//! ```
//!
//! Inline: `bitwarden login 0f2a6b4e-1d3c-4e5f-8a9b-c0d1e2f3a4b5`
//! ````
//!
//! Each directive becomes a "Show <Type>" button in the host.

use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag, TagEnd};

use crate::api::ItemKind;

/// Where a directive was written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveSource {
    /// A fenced code block with the `bitwarden` info string
    Block,
    /// An inline code span starting with `bitwarden`
    Inline,
}

/// A reveal directive found in a note
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Item type as written, e.g. `login`
    pub kind: String,
    pub item_id: String,
    /// 1-based line of the directive (the opening fence for blocks)
    pub line: usize,
    pub source: DirectiveSource,
}

impl Directive {
    /// Parsed item kind, if it is one the host can reveal
    pub fn supported_kind(&self) -> Option<ItemKind> {
        self.kind
            .parse::<ItemKind>()
            .ok()
            .filter(ItemKind::is_supported)
    }

    /// Button label for the directive, e.g. "Show Login"
    pub fn button_label(&self) -> String {
        let mut chars = self.kind.chars();
        let kind: String = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
        format!("Show {kind}")
    }
}

/// Parse directive text such as `login <id>` or `bitwarden login <id>`
///
/// Returns `(kind, item_id)`; `None` when either part is missing.
pub fn parse_directive(text: &str) -> Option<(String, String)> {
    let text = text.trim();
    let text = match text.strip_prefix("bitwarden") {
        Some(rest) if rest.starts_with(char::is_whitespace) => rest,
        Some(_) => return None,
        None => text,
    };

    let mut parts = text.split_whitespace();
    let kind = parts.next()?;
    let item_id = parts.next()?;
    Some((kind.to_string(), item_id.to_string()))
}

/// Find every directive in a markdown document, in document order
pub fn scan(markdown: &str) -> Vec<Directive> {
    let mut directives = Vec::new();
    // Opening line and body of the `bitwarden` block being read
    let mut block: Option<(usize, String)> = None;

    for (event, range) in Parser::new(markdown).into_offset_iter() {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                if info.split_whitespace().next() == Some("bitwarden") {
                    block = Some((line_at(markdown, range.start), String::new()));
                }
            }
            Event::Text(text) => {
                if let Some((_, body)) = block.as_mut() {
                    body.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                let Some((line, body)) = block.take() else {
                    continue;
                };
                match parse_directive(&body) {
                    Some((kind, item_id)) => directives.push(Directive {
                        kind,
                        item_id,
                        line,
                        source: DirectiveSource::Block,
                    }),
                    None => tracing::debug!(line, "Ignoring malformed bitwarden block"),
                }
            }
            Event::Code(span) => {
                if !span.trim_start().starts_with("bitwarden") {
                    continue;
                }
                let line = line_at(markdown, range.start);
                match parse_directive(&span) {
                    Some((kind, item_id)) => directives.push(Directive {
                        kind,
                        item_id,
                        line,
                        source: DirectiveSource::Inline,
                    }),
                    None => tracing::debug!(line, span = &*span, "Ignoring malformed inline directive"),
                }
            }
            _ => {}
        }
    }

    directives
}

/// 1-based line number of a byte offset
fn line_at(markdown: &str, offset: usize) -> usize {
    markdown[..offset].matches('\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "0f2a6b4e-1d3c-4e5f-8a9b-c0d1e2f3a4b5";

    #[test]
    fn test_parse_block_body() {
        assert_eq!(
            parse_directive(&format!("login {ID}\n")),
            Some(("login".to_string(), ID.to_string()))
        );
    }

    #[test]
    fn test_parse_inline_text() {
        assert_eq!(
            parse_directive(&format!("bitwarden login {ID}")),
            Some(("login".to_string(), ID.to_string()))
        );
        assert_eq!(parse_directive("bitwarden login"), None);
        assert_eq!(parse_directive("bitwardenlogin abc"), None);
    }

    #[test]
    fn test_scan_fenced_block() {
        let md = format!("# Servers\n\n```bitwarden\nlogin {ID}\n```\n");
        let found = scan(&md);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, "login");
        assert_eq!(found[0].item_id, ID);
        assert_eq!(found[0].line, 3);
        assert_eq!(found[0].source, DirectiveSource::Block);
        assert_eq!(found[0].button_label(), "Show Login");
    }

    #[test]
    fn test_scan_inline_spans() {
        let md = format!("Prod db: `bitwarden login {ID}` and `ls -la`.\nCard: `bitwarden card abc`");
        let found = scan(&md);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].source, DirectiveSource::Inline);
        assert_eq!(found[0].line, 1);
        assert!(found[0].supported_kind().is_some());
        assert_eq!(found[1].kind, "card");
        assert_eq!(found[1].line, 2);
        assert!(found[1].supported_kind().is_none());
        assert_eq!(found[1].button_label(), "Show Card");
    }

    #[test]
    fn test_other_code_blocks_are_ignored() {
        let md = "```rust\nlet s = \"`bitwarden login abc`\";\n```\n~~~\nbitwarden login abc\n~~~\n";
        assert!(scan(md).is_empty());
    }

    #[test]
    fn test_longer_fence_needs_matching_close() {
        let md = "````bitwarden\nlogin abc\n```\n````\n";
        let found = scan(md);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].item_id, "abc");
    }

    #[test]
    fn test_unterminated_block() {
        let found = scan("```bitwarden\nlogin abc");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].item_id, "abc");
    }

    #[test]
    fn test_empty_block_is_skipped() {
        assert!(scan("```bitwarden\n```\n").is_empty());
    }

    #[test]
    fn test_triple_backtick_span_is_inline() {
        let md = "```bitwarden login abc``` is prod\n\nAnd `bitwarden login def` too\n";
        let found = scan(md);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].item_id, "abc");
        assert_eq!(found[0].line, 1);
        assert_eq!(found[0].source, DirectiveSource::Inline);
        assert_eq!(found[1].item_id, "def");
        assert_eq!(found[1].line, 3);
        assert_eq!(found[1].source, DirectiveSource::Inline);
    }

    #[test]
    fn test_double_backtick_span() {
        let found = scan("Creds: ``bitwarden login abc``\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, "login");
        assert_eq!(found[0].item_id, "abc");
        assert_eq!(found[0].source, DirectiveSource::Inline);
    }

    #[test]
    fn test_indented_code_is_not_a_fence() {
        let md = "Example:\n\n    ```bitwarden\n    login abc\n    ```\n\n```bitwarden\nlogin real\n```\n";
        let found = scan(md);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].item_id, "real");
        assert_eq!(found[0].line, 7);
        assert_eq!(found[0].source, DirectiveSource::Block);
    }

    #[test]
    fn test_block_inside_list_item() {
        let md = "- GitHub:\n\n  ```bitwarden\n  login abc\n  ```\n";
        let found = scan(md);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].item_id, "abc");
        assert_eq!(found[0].line, 3);
    }
}
