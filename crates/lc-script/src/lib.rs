pub mod ast;
pub mod bytecode;
pub mod error;
pub mod funcmap;
pub mod lexer;
pub mod linker;
pub mod parser;
pub mod strings;
pub mod value;
pub mod vm;

pub use ast::{BinOp, Expr, FuncDecl, Stmt, UnOp};
pub use bytecode::{compile, Chunk, CompileError, Op};
pub use error::AulError;
pub use funcmap::{Access, AddHint, AulFunc, FuncBody, FuncId, FuncMap};
pub use lexer::{lex, LexError, Token};
pub use linker::{LinkReport, Linker, Script, ScriptId};
pub use parser::{parse, ParseError};
pub use strings::StringTable;
pub use value::{ArrayData, ArrayRef, CompareMode, MapData, MapRef, ObjectHandle, RefTarget, Value, ValueType};
pub use vm::{Host, Vm};
