pub mod cli;
pub mod navigate;
pub mod tree;
