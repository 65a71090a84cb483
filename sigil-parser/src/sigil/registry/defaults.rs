//! The built-in macro set

use super::{MacroDef, MacroRegistry, XrefStyle, PARAGRAPH_MACRO};
use crate::sigil::lexing::TOPLEVEL_MACRO;
use crate::sigil::render::macros::{
    BreakRender, CodeBlockRender, HeaderRender, ImageRender, IncludeRender, LinkRender,
    TableRender, TagRender, TocRender, ToplevelRender, XrefRender,
};
use std::sync::Arc;

pub const HEADER_MACRO: &str = "h";
pub const XREF_MACRO: &str = "x";
pub const INCLUDE_MACRO: &str = "Include";

pub fn register_defaults(registry: &mut MacroRegistry) {
    registry.register(
        MacroDef::new(TOPLEVEL_MACRO, Arc::new(ToplevelRender))
            .positional(["content"])
            .named(["title"]),
    );
    registry.register(
        MacroDef::new(HEADER_MACRO, Arc::new(HeaderRender))
            .positional(["level", "title"])
            .named(["id", "scope", "synonym"])
            .caption_prefix("Section"),
    );
    registry.register(
        MacroDef::new(PARAGRAPH_MACRO, Arc::new(TagRender::block("p")))
            .positional(["content"])
            .named(["id"]),
    );

    for (name, tag) in [("b", "b"), ("i", "i"), ("c", "code")] {
        registry.register(
            MacroDef::new(name, Arc::new(TagRender::inline(tag)))
                .positional(["content"])
                .phrasing(),
        );
    }
    registry.register(MacroDef::new("br", Arc::new(BreakRender)).phrasing());
    registry.register(
        MacroDef::new("a", Arc::new(LinkRender))
            .positional(["href", "content"])
            .phrasing(),
    );
    registry.register(
        MacroDef::new(XREF_MACRO, Arc::new(XrefRender))
            .positional(["href", "content"])
            .named(["style", "magic"])
            .phrasing(),
    );

    registry.register(
        MacroDef::new("C", Arc::new(CodeBlockRender))
            .positional(["content"])
            .named(["id", "title"])
            .id_prefix("code")
            .caption_prefix("Code")
            .xref_style(XrefStyle::Full),
    );
    registry.register(
        MacroDef::new("Q", Arc::new(TagRender::block("blockquote")))
            .positional(["content"])
            .named(["id"]),
    );

    for (name, tag) in [("Ul", "ul"), ("Ol", "ol")] {
        registry.register(
            MacroDef::new(name, Arc::new(TagRender::block(tag)))
                .positional(["content"])
                .named(["id"]),
        );
    }
    registry.register(
        MacroDef::new("L", Arc::new(TagRender::block("li")))
            .positional(["content"])
            .named(["id"])
            .auto_parent("Ul", ["Ul", "Ol"]),
    );

    registry.register(
        MacroDef::new("Table", Arc::new(TableRender))
            .positional(["content"])
            .named(["id", "title"])
            .id_prefix("table")
            .caption_prefix("Table")
            .xref_style(XrefStyle::Full),
    );
    registry.register(
        MacroDef::new("Tr", Arc::new(TagRender::block("tr")))
            .positional(["content"])
            .auto_parent("Table", ["Table"]),
    );
    for (name, tag) in [("Th", "th"), ("Td", "td")] {
        registry.register(
            MacroDef::new(name, Arc::new(TagRender::block(tag)))
                .positional(["content"])
                .auto_parent("Tr", ["Tr"]),
        );
    }

    registry.register(
        MacroDef::new("Image", Arc::new(ImageRender))
            .positional(["src"])
            .named(["id", "title"])
            .id_prefix("image")
            .caption_prefix("Figure")
            .xref_style(XrefStyle::Full),
    );
    registry.register(MacroDef::new("Toc", Arc::new(TocRender)));
    registry.register(MacroDef::new(INCLUDE_MACRO, Arc::new(IncludeRender)).positional(["href"]));
}
