//! Implicit containers
//!
//! Macros with an auto-parent (list items, table rows and cells) may be written without
//! their container. A run of two or more of them is wrapped in a synthetic container:
//!
//! ```text
//! \L[a]\L[b]      ->   \Ul[\L[a]\L[b]]
//! \Td[1]\Th[2]    ->   \Tr[\Td[1]\Th[2]]
//! ```
//!
//! Whitespace-only plaintext between members keeps the run going and is dropped from the
//! wrapper. Nothing is wrapped when the owner of the list already is the container or one
//! of the containers listed in the member's skip set. Explicit containers lose their
//! whitespace-only plaintext too, so `\Ul[\L[a]\n\L[b]]` and `\L[a]\n\L[b]` assemble
//! to the same tree.

use super::synthetic_macro;
use crate::sigil::ast::{Ast, NodeId};
use crate::sigil::registry::MacroRegistry;

fn auto_parent_of<'r>(
    ast: &Ast,
    registry: &'r MacroRegistry,
    container: &str,
    node: NodeId,
) -> Option<&'r str> {
    let name = ast.macro_name(node)?;
    let def = registry.get(name)?;
    let target = def.auto_parent.as_deref()?;
    if target == container || def.auto_parent_skip.contains(container) {
        None
    } else {
        Some(target)
    }
}

fn is_blank(ast: &Ast, node: NodeId) -> bool {
    ast.get(node)
        .as_plaintext()
        .map(|text| text.trim().is_empty())
        .unwrap_or(false)
}

/// Wrap runs of auto-parented siblings owned by `container`
pub fn group_auto_parent(
    ast: &mut Ast,
    registry: &MacroRegistry,
    container: &str,
    children: Vec<NodeId>,
) -> Vec<NodeId> {
    let children = if registry.is_container(container) {
        children
            .into_iter()
            .filter(|c| !is_blank(ast, *c))
            .collect()
    } else {
        children
    };
    let mut out = Vec::with_capacity(children.len());
    let mut i = 0;
    while i < children.len() {
        let child = children[i];
        let Some(target) = auto_parent_of(ast, registry, container, child) else {
            out.push(child);
            i += 1;
            continue;
        };

        let mut members = vec![child];
        let mut end = i;
        let mut j = i + 1;
        while j < children.len() {
            let next = children[j];
            if auto_parent_of(ast, registry, container, next) == Some(target) {
                members.push(next);
                end = j;
            } else if !is_blank(ast, next) {
                break;
            }
            j += 1;
        }

        if members.len() < 2 {
            out.push(child);
            i += 1;
            continue;
        }

        let position = ast.get(child).position;
        match synthetic_macro(ast, registry, target, members, position) {
            Some(wrapper) => out.push(wrapper),
            None => out.extend_from_slice(&children[i..=end]),
        }
        i = end + 1;
    }
    out
}
