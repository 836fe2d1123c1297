//! Markup document layer: model, parser and writer

mod cursor;
pub mod model;
pub mod parser;
pub mod writer;

pub use model::{local_name, Attributes, Content, Document, Element, Route, ANDROID_NAMESPACE};
pub use parser::{Parser, ParserConfig};
