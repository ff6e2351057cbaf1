//! LALR(1) look-ahead and layout set construction for composable grammars.

pub mod first_sets;
pub mod grammar;
pub mod lalr;
pub mod lr0;
pub mod types;
pub mod util;

pub use crate::{
    first_sets::ContextSets,
    grammar::Grammar,
    lalr::{build, LookaheadAndLayoutSets},
    lr0::{lr0, LR0Automaton},
};
