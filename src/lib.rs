// Author: Dustin Pilgrim
// License: MIT

//! Compiler core for an indentation-sensitive pair notation.
//!
//! Sources are read through a [`stream::CharStream`], parsed into the arena
//! of a [`ast::CompileUnit`] by [`parser::parse_module`], then resolved as a
//! whole by [`resolver::resolve`]. [`compiler::Compiler`] runs both stages
//! over files or in-memory sources; [`expand`] and [`export`] turn the
//! resolved unit into plain trees and JSON for inspection.

pub mod ast;
pub mod compiler;
pub mod diagnostics;
pub mod error;
pub mod expand;
pub mod export;
pub mod options;
pub mod parser;
pub mod resolver;
pub mod stream;
pub mod utils;

pub use ast::{CompileUnit, NodeId, Pair, PairKind, PairTree, TargetFormat};
pub use compiler::{CompileOutput, Compiler, SourceFile};
pub use diagnostics::{Diagnostic, ErrorCode, ErrorCollection, ErrorListener};
pub use error::{PaircError, StructuralFault};
pub use options::CompilerOptions;
