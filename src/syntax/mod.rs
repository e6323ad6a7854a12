//! Syntax layer: the AST produced by the parser.
//!
//! - [`ast`]: arena-allocated nodes, feature values and references
//! - [`locator`]: structural node paths
//! - [`naming`]: name and qualified-name policies

pub mod ast;
pub mod locator;
pub mod naming;

pub use ast::{AstNode, AstTree, ContainerLink, NodeId, Reference, ReferenceId, Value};
pub use locator::{node_at_path, node_path};
pub use naming::{DefaultNameProvider, NameProvider, qualified_name, qualifier_depth};
