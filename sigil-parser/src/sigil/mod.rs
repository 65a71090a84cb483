//! Main module for sigil library functionality

pub mod assembling;
pub mod ast;
pub mod index;
pub mod lexing;
pub mod parsing;
pub mod pipeline;
pub mod project;
pub mod registry;
pub mod render;
pub mod resolving;
pub mod store;
pub mod testing;
pub mod toc;
pub mod token;
