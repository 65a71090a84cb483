//! Treeviz formatter for AST nodes
//!
//! One line per node, nesting encoded by box drawing connectors. Argument lists get their
//! own line so positional and named content can be told apart:
//!
//!   ⧉ toplevel
//!   └─ ≡ content
//!      ├─ § h #intro
//!      │  ├─ ≡ level
//!      │  │  └─ ◦ "1"
//!      │  └─ ≡ title
//!      │     └─ ◦ "Intro"
//!      └─ ¶ p
//!         └─ ≡ content
//!            └─ ◦ "Hello"
//!
//! Unsupplied arguments are left out unless they contain something other than the empty
//! default, so the dump stays close to what the author wrote.

use super::node::{Ast, NodeId, NodeKind};

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let mut truncated = s.chars().take(max_chars).collect::<String>();
        truncated.push_str("...");
        truncated
    } else {
        s.to_string()
    }
}

fn get_icon(macro_name: &str) -> &'static str {
    match macro_name {
        "toplevel" => "⧉",
        "h" => "§",
        "p" => "¶",
        "Ul" | "Ol" => "☰",
        "L" => "•",
        "x" => "⊕",
        "C" | "c" => "ƒ",
        "Table" => "▦",
        "Image" => "▣",
        _ => "○",
    }
}

fn label(ast: &Ast, node: NodeId, show_linum: bool) -> String {
    let n = ast.get(node);
    let body = match &n.kind {
        NodeKind::Macro(m) => {
            let mut s = format!("{} {}", get_icon(&m.name), m.name);
            if let Some(id) = &m.id {
                s.push_str(&format!(" #{}", id));
            }
            if let Some(count) = m.count {
                s.push_str(&format!(" ({})", count));
            }
            s
        }
        NodeKind::Plaintext { text } => format!("◦ {:?}", truncate(text, 30)),
        NodeKind::ParagraphBreak => "↵ paragraph break".to_string(),
        NodeKind::Error { message } => format!("✗ {}", message),
    };
    if show_linum {
        format!("{:02}:{:02} {}", n.position.line, n.position.column, body)
    } else {
        body
    }
}

enum Line {
    Node(NodeId),
    Arg(NodeId, usize),
}

/// Render the tree under the root
pub fn to_treeviz_str(ast: &Ast) -> String {
    format_tree(ast, ast.root(), false)
}

/// Render the tree with `line:column` prefixes
pub fn to_treeviz_str_with_positions(ast: &Ast) -> String {
    format_tree(ast, ast.root(), true)
}

fn visible_args(ast: &Ast, node: NodeId) -> Vec<usize> {
    let Some(m) = ast.macro_node(node) else {
        return Vec::new();
    };
    m.args
        .iter()
        .enumerate()
        .filter(|(_, arg)| {
            arg.supplied
                || arg
                    .children
                    .iter()
                    .any(|c| ast.get(*c).as_plaintext() != Some(""))
        })
        .map(|(i, _)| i)
        .collect()
}

fn format_tree(ast: &Ast, root: NodeId, show_linum: bool) -> String {
    if ast.is_empty() {
        return String::new();
    }
    let mut output = format!("{}\n", label(ast, root, show_linum));
    // (line, prefix, is_last); explicit stack keeps long flat lists off the call stack
    let mut stack: Vec<(Line, String, bool)> = Vec::new();
    let push_args = |stack: &mut Vec<(Line, String, bool)>, node: NodeId, prefix: &str| {
        let args = visible_args(ast, node);
        let count = args.len();
        for (i, arg) in args.into_iter().enumerate().rev() {
            stack.push((Line::Arg(node, arg), prefix.to_string(), i + 1 == count));
        }
    };
    push_args(&mut stack, root, "");

    while let Some((line, prefix, is_last)) = stack.pop() {
        let connector = if is_last { "└─" } else { "├─" };
        let child_prefix = format!("{}{}", prefix, if is_last { "   " } else { "│  " });
        match line {
            Line::Arg(node, index) => {
                let Some(m) = ast.macro_node(node) else {
                    continue;
                };
                let arg = &m.args[index];
                output.push_str(&format!("{}{} ≡ {}\n", prefix, connector, arg.name));
                let count = arg.children.len();
                for (i, child) in arg.children.iter().enumerate().rev() {
                    stack.push((Line::Node(*child), child_prefix.clone(), i + 1 == count));
                }
            }
            Line::Node(node) => {
                output.push_str(&format!(
                    "{}{} {}\n",
                    prefix,
                    connector,
                    label(ast, node, show_linum)
                ));
                push_args(&mut stack, node, &child_prefix);
            }
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sigil::ast::{Argument, MacroNode, Position};

    #[test]
    fn test_treeviz_layout() {
        let mut ast = Ast::new();
        let mut root = MacroNode::new("toplevel");
        root.args.push(Argument::new("content", Position::default(), true));
        let root_id = ast.push(NodeKind::Macro(root), Position::default());
        ast.set_root(root_id);
        let mut b = MacroNode::new("b");
        b.args.push(Argument::new("content", Position::new(1, 3), true));
        let b_id = ast.push(NodeKind::Macro(b), Position::new(1, 1));
        let text = ast.push_plaintext("hi", Position::new(1, 4));
        ast.set_children(b_id, "content", vec![text]);
        let tail = ast.push_plaintext(" there", Position::new(1, 6));
        ast.set_children(root_id, "content", vec![b_id, tail]);

        let expected = "⧉ toplevel\n\
                        └─ ≡ content\n   \
                        ├─ ○ b\n   \
                        │  └─ ≡ content\n   \
                        │     └─ ◦ \"hi\"\n   \
                        └─ ◦ \" there\"\n";
        assert_eq!(to_treeviz_str(&ast), expected);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("abc", 3), "abc");
    }
}
