//! Render behavior of the built-in macros

use super::{error_marker, escape_attr, escape_text, MacroRender, RenderContext, TextContext};
use crate::sigil::assembling::headers::parse_level;
use crate::sigil::assembling::is_truthy;
use crate::sigil::ast::{NodeId, Position};
use crate::sigil::resolving::xref::{link_text, parse_style, XrefError};
use crate::sigil::resolving::Resolution;
use crate::sigil::toc::{build_toc, render_toc};

fn arg_position(ctx: &RenderContext<'_>, node: NodeId, arg: &str) -> Position {
    ctx.ast
        .macro_node(node)
        .and_then(|m| m.arg(arg))
        .map(|a| a.position)
        .unwrap_or_else(|| ctx.ast.get(node).position)
}

fn is_supplied(ctx: &RenderContext<'_>, node: NodeId, arg: &str) -> bool {
    ctx.ast
        .macro_node(node)
        .map(|m| m.is_supplied(arg))
        .unwrap_or(false)
}

/// `Code 2. Title` for numbered, identified nodes
fn caption(ctx: &mut RenderContext<'_>, node: NodeId) -> Option<String> {
    let id = ctx.ast.macro_node(node)?.id.clone()?;
    let record = ctx.index.record(&id)?.clone();
    let title = ctx.render_arg(node, "title");
    let mut out = match record.count {
        Some(count) if !record.caption_prefix.is_empty() => {
            format!("{} {}", escape_text(&record.caption_prefix), count)
        }
        _ => String::new(),
    };
    if !title.trim().is_empty() {
        if !out.is_empty() {
            out.push_str(". ");
        }
        out.push_str(title.trim());
    }
    (!out.is_empty()).then_some(out)
}

/// The document itself
pub struct ToplevelRender;

impl MacroRender for ToplevelRender {
    fn render(&self, node: NodeId, ctx: &mut RenderContext<'_>) -> String {
        ctx.render_arg(node, "content")
    }
}

pub struct HeaderRender;

impl MacroRender for HeaderRender {
    fn render(&self, node: NodeId, ctx: &mut RenderContext<'_>) -> String {
        if is_truthy(&ctx.arg_text(node, "synonym")) {
            return String::new();
        }
        let level = parse_level(&ctx.arg_text(node, "level")).unwrap_or(1).min(6);
        let outer = ctx.in_header_title;
        ctx.in_header_title = true;
        let title = ctx.render_arg(node, "title");
        ctx.in_header_title = outer;
        format!("<h{}{}>{}</h{}>\n", level, ctx.id_attr(node), title, level)
    }

    fn render_text(&self, node: NodeId, text: &TextContext<'_>) -> String {
        text.arg_text(node, "title")
    }
}

/// Plain element around the `content` argument
pub struct TagRender {
    tag: &'static str,
    block: bool,
}

impl TagRender {
    pub fn block(tag: &'static str) -> Self {
        Self { tag, block: true }
    }

    pub fn inline(tag: &'static str) -> Self {
        Self { tag, block: false }
    }
}

impl MacroRender for TagRender {
    fn render(&self, node: NodeId, ctx: &mut RenderContext<'_>) -> String {
        let content = ctx.render_arg(node, "content");
        if self.block {
            format!(
                "<{}{}>{}</{}>\n",
                self.tag,
                ctx.id_attr(node),
                content,
                self.tag
            )
        } else {
            format!("<{}>{}</{}>", self.tag, content, self.tag)
        }
    }
}

pub struct BreakRender;

impl MacroRender for BreakRender {
    fn render(&self, _node: NodeId, _ctx: &mut RenderContext<'_>) -> String {
        "<br>".to_string()
    }

    fn render_text(&self, _node: NodeId, _text: &TextContext<'_>) -> String {
        "\n".to_string()
    }
}

/// External link; the target doubles as the text when no content is given
pub struct LinkRender;

impl MacroRender for LinkRender {
    fn render(&self, node: NodeId, ctx: &mut RenderContext<'_>) -> String {
        let href = ctx.arg_text(node, "href");
        let mut content = ctx.render_arg(node, "content");
        if content.is_empty() {
            content = escape_text(&href);
        }
        format!("<a href=\"{}\">{}</a>", escape_attr(&href), content)
    }

    fn render_text(&self, node: NodeId, text: &TextContext<'_>) -> String {
        let content = text.arg_text(node, "content");
        if content.is_empty() {
            text.arg_text(node, "href")
        } else {
            content
        }
    }
}

/// Cross reference to an identified node, here or in another document
pub struct XrefRender;

impl XrefRender {
    fn target(&self, node: NodeId, ctx: &RenderContext<'_>) -> Result<String, XrefError> {
        match ctx.resolution(node) {
            Some(Resolution::Target(id)) => Ok(id.clone()),
            Some(Resolution::Unknown(id)) => Err(XrefError::UnknownTarget(id.clone())),
            None => Ok(ctx.arg_text(node, "href")),
        }
    }
}

impl MacroRender for XrefRender {
    fn render(&self, node: NodeId, ctx: &mut RenderContext<'_>) -> String {
        let at = arg_position(ctx, node, "href");
        let style = match parse_style(&ctx.arg_text(node, "style")) {
            Ok(style) => style,
            Err(e) => {
                let style_at = arg_position(ctx, node, "style");
                return ctx.error(style_at, e.to_string());
            }
        };
        let target = match self.target(node, ctx) {
            Ok(target) => target,
            // already reported when the candidates were reduced
            Err(e) => return error_marker(&e.to_string()),
        };
        let Some(record) = ctx.record(&target) else {
            return ctx.error(at, XrefError::UnknownTarget(target).to_string());
        };
        if ctx.in_header_title && !record.is_header {
            return ctx.error(at, XrefError::TitleTargetNotHeader(target).to_string());
        }

        let mut text_record = record.clone();
        let link_record = match record.synonym_of.as_deref().and_then(|t| ctx.record(t)) {
            Some(named) => {
                text_record.count = named.count;
                text_record.caption_prefix = named.caption_prefix.clone();
                text_record.xref_style = named.xref_style;
                named
            }
            None => record,
        };

        let content = if is_supplied(ctx, node, "content") {
            ctx.render_arg(node, "content")
        } else {
            String::new()
        };
        let body = if content.is_empty() {
            match link_text(&text_record, style.unwrap_or(text_record.xref_style)) {
                Ok(text) => escape_text(&text),
                Err(e) => return ctx.error(at, e.to_string()),
            }
        } else {
            content
        };
        format!("<a href=\"{}\">{}</a>", ctx.href_for(&link_record), body)
    }

    fn render_text(&self, node: NodeId, text: &TextContext<'_>) -> String {
        let content = text.arg_text(node, "content");
        if content.is_empty() {
            text.arg_text(node, "href")
        } else {
            content
        }
    }
}

pub struct CodeBlockRender;

impl MacroRender for CodeBlockRender {
    fn render(&self, node: NodeId, ctx: &mut RenderContext<'_>) -> String {
        let code = ctx.render_arg(node, "content");
        let id = ctx.id_attr(node);
        match caption(ctx, node) {
            Some(caption) => format!(
                "<figure{} class=\"code\"><figcaption>{}</figcaption><pre><code>{}</code></pre></figure>\n",
                id, caption, code
            ),
            None => format!("<pre{}><code>{}</code></pre>\n", id, code),
        }
    }
}

pub struct TableRender;

impl MacroRender for TableRender {
    fn render(&self, node: NodeId, ctx: &mut RenderContext<'_>) -> String {
        let id = ctx.id_attr(node);
        let caption = caption(ctx, node)
            .map(|c| format!("<caption>{}</caption>", c))
            .unwrap_or_default();
        let rows = ctx.render_arg(node, "content");
        format!("<table{}>{}{}</table>\n", id, caption, rows)
    }
}

pub struct ImageRender;

impl MacroRender for ImageRender {
    fn render(&self, node: NodeId, ctx: &mut RenderContext<'_>) -> String {
        let id = ctx.id_attr(node);
        let img = format!(
            "<img src=\"{}\" alt=\"{}\">",
            ctx.arg_attr(node, "src"),
            ctx.arg_attr(node, "title")
        );
        let caption = caption(ctx, node)
            .map(|c| format!("<figcaption>{}</figcaption>", c))
            .unwrap_or_default();
        format!("<figure{}>{}{}</figure>\n", id, img, caption)
    }

    fn render_text(&self, node: NodeId, text: &TextContext<'_>) -> String {
        text.arg_text(node, "title")
    }
}

pub struct TocRender;

impl MacroRender for TocRender {
    fn render(&self, _node: NodeId, ctx: &mut RenderContext<'_>) -> String {
        render_toc(&build_toc(ctx.ast, ctx.registry, ctx.headers))
    }

    fn render_text(&self, _node: NodeId, _text: &TextContext<'_>) -> String {
        String::new()
    }
}

/// Link to another document of the project
pub struct IncludeRender;

impl MacroRender for IncludeRender {
    fn render(&self, node: NodeId, ctx: &mut RenderContext<'_>) -> String {
        let target = ctx.arg_text(node, "href").trim().to_string();
        match ctx.record(&target).filter(|r| r.is_document()) {
            Some(record) => {
                let title = if record.title.is_empty() {
                    record.document.clone()
                } else {
                    record.title.clone()
                };
                format!(
                    "<p class=\"include\"><a href=\"{}\">{}</a></p>\n",
                    ctx.href_for(&record),
                    escape_text(&title)
                )
            }
            None => error_marker(&format!("included document not found: \"{}\"", target)),
        }
    }

    fn render_text(&self, _node: NodeId, _text: &TextContext<'_>) -> String {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::sigil::pipeline::{compile, CompileOptions};
    use crate::sigil::registry::MacroRegistry;

    fn body(source: &str) -> String {
        let registry = MacroRegistry::with_defaults();
        let options = CompileOptions {
            body_only: true,
            ..CompileOptions::default()
        };
        compile(source, &options, Some(&registry), None)
            .expect("compile")
            .output
    }

    #[test]
    fn test_inline_tags() {
        assert_eq!(
            body("a \\b[b] \\i[i] \\c[x<y]"),
            "<p>a <b>b</b> <i>i</i> <code>x&lt;y</code></p>\n"
        );
    }

    #[test]
    fn test_header() {
        assert_eq!(body("\\h[2][Intro]"), "<h2 id=\"intro\">Intro</h2>\n");
    }

    #[test]
    fn test_link_escapes_attribute() {
        assert_eq!(
            body("\\a[http://x.com/?a=1&b=\"2\"]"),
            "<p><a href=\"http://x.com/?a=1&amp;b=&quot;2&quot;\">http://x.com/?a=1&amp;b=\"2\"</a></p>\n"
        );
    }

    #[test]
    fn test_code_block_with_caption() {
        assert_eq!(
            body("\\C[[a < b]]{title=Cmp}"),
            "<figure id=\"code-cmp\" class=\"code\"><figcaption>Code 1. Cmp</figcaption><pre><code>a &lt; b</code></pre></figure>\n"
        );
    }

    #[test]
    fn test_code_block_without_id() {
        assert_eq!(body("\\C[[x]]"), "<pre><code>x</code></pre>\n");
    }

    #[test]
    fn test_list() {
        assert_eq!(
            body("\\L[a]\\L[b]"),
            "<ul><li>a</li>\n<li>b</li>\n</ul>\n"
        );
    }

    #[test]
    fn test_image() {
        assert_eq!(
            body("\\Image[cat.png]{title=A cat}"),
            "<figure id=\"image-a-cat\"><img src=\"cat.png\" alt=\"A cat\"><figcaption>Figure 1. A cat</figcaption></figure>\n"
        );
    }

    #[test]
    fn test_break() {
        assert_eq!(body("a\\br b"), "<p>a<br> b</p>\n");
    }
}
