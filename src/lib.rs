pub mod ast;
pub mod interpreter;
pub mod parser;
pub mod persistence;
pub mod span;
pub mod tokenizer;
pub mod vector;
