//! Macro registry
//!
//!     The registry is the static table of macro definitions the parser validates against
//!     and the renderer dispatches through. It is built once at startup, wrapped in an `Arc`
//!     if it needs to be shared, and never mutated while documents compile.
//!
//!     Each [`MacroDef`] carries its argument schema, its structural properties and its render
//!     behavior as a [`MacroRender`] trait object, so neither the parser nor the
//!     post-processor needs to know anything about specific macros.
//!
//! # Examples
//!
//! ```ignore
//! let mut registry = MacroRegistry::with_defaults();
//! registry.register(MacroDef::new("kbd", Arc::new(MyKbd)).positional(["content"]).phrasing());
//! ```

pub mod defaults;

use crate::sigil::render::MacroRender;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Name of the synthetic paragraph macro
pub const PARAGRAPH_MACRO: &str = "p";

/// Default cross reference text style of a macro
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum XrefStyle {
    /// Caption prefix and number, then the quoted title
    Full,
    /// Title only
    Short,
}

impl FromStr for XrefStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(XrefStyle::Full),
            "short" => Ok(XrefStyle::Short),
            other => Err(format!("unknown cross reference style: \"{}\"", other)),
        }
    }
}

impl fmt::Display for XrefStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XrefStyle::Full => write!(f, "full"),
            XrefStyle::Short => write!(f, "short"),
        }
    }
}

/// Argument schema, properties and render behavior of one macro
#[derive(Clone)]
pub struct MacroDef {
    pub name: String,
    pub positional: Vec<String>,
    pub named: BTreeSet<String>,
    pub render: Arc<dyn MacroRender>,
    /// May appear inside a paragraph
    pub phrasing: bool,
    /// Container consecutive siblings of this macro get wrapped in
    pub auto_parent: Option<String>,
    /// Containers under which auto-parenting does not happen
    pub auto_parent_skip: BTreeSet<String>,
    pub id_prefix: String,
    pub caption_prefix: String,
    pub xref_style: XrefStyle,
}

impl MacroDef {
    pub fn new(name: impl Into<String>, render: Arc<dyn MacroRender>) -> Self {
        Self {
            name: name.into(),
            positional: Vec::new(),
            named: BTreeSet::new(),
            render,
            phrasing: false,
            auto_parent: None,
            auto_parent_skip: BTreeSet::new(),
            id_prefix: String::new(),
            caption_prefix: String::new(),
            xref_style: XrefStyle::Short,
        }
    }

    pub fn positional<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.positional = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn named<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.named = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn phrasing(mut self) -> Self {
        self.phrasing = true;
        self
    }

    pub fn auto_parent<I, S>(mut self, parent: impl Into<String>, skip: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.auto_parent = Some(parent.into());
        self.auto_parent_skip = skip.into_iter().map(Into::into).collect();
        self
    }

    pub fn id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = prefix.into();
        self
    }

    pub fn caption_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.caption_prefix = prefix.into();
        self
    }

    pub fn xref_style(mut self, style: XrefStyle) -> Self {
        self.xref_style = style;
        self
    }

    /// Declared arguments, positional first
    pub fn argument_names(&self) -> impl Iterator<Item = &str> {
        self.positional
            .iter()
            .chain(self.named.iter())
            .map(String::as_str)
    }

    pub fn declares(&self, arg: &str) -> bool {
        self.positional.iter().any(|p| p == arg) || self.named.contains(arg)
    }
}

impl fmt::Debug for MacroDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MacroDef")
            .field("name", &self.name)
            .field("positional", &self.positional)
            .field("named", &self.named)
            .field("phrasing", &self.phrasing)
            .field("auto_parent", &self.auto_parent)
            .field("id_prefix", &self.id_prefix)
            .field("caption_prefix", &self.caption_prefix)
            .field("xref_style", &self.xref_style)
            .finish()
    }
}

/// Registry of macro definitions, looked up by name
#[derive(Debug, Clone, Default)]
pub struct MacroRegistry {
    macros: HashMap<String, MacroDef>,
}

impl MacroRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a macro
    ///
    /// If a macro with the same name already exists, it will be replaced.
    pub fn register(&mut self, def: MacroDef) {
        self.macros.insert(def.name.clone(), def);
    }

    pub fn get(&self, name: &str) -> Option<&MacroDef> {
        self.macros.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    /// Phrasing macros and plaintext may sit inside paragraphs
    pub fn is_phrasing(&self, name: &str) -> bool {
        self.get(name).map(|d| d.phrasing).unwrap_or(false)
    }

    /// Macros that auto-parented macros group under, such as `Ul` or `Tr`
    pub fn is_container(&self, name: &str) -> bool {
        self.macros.values().any(|d| {
            d.auto_parent.as_deref() == Some(name) || d.auto_parent_skip.contains(name)
        })
    }

    /// List all macro names (sorted)
    pub fn list_macros(&self) -> Vec<String> {
        let mut names: Vec<_> = self.macros.keys().cloned().collect();
        names.sort();
        names
    }

    /// Create a registry with the built-in macro set
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        defaults::register_defaults(&mut registry);
        registry
    }
}
