//! Grammar specification consumed by the look-ahead builder.
//!
//! Besides the usual terminals, nonterminals and productions, every production
//! carries the set of layout tokens (whitespace, comments and the like) that
//! may be skipped between its symbols. Productions coming from different
//! sub-grammars of a composed grammar can therefore carry different layout.

use crate::{
    types::Map,
    util::{display_fn, display_set},
};
use std::{fmt, marker::PhantomData};

// ==== Symbol identifiers ====

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TerminalID(u16);
impl TerminalID {
    /// Reserved symbol used as a terminal symbol that means the end of input.
    pub const EOI: Self = Self(0);
    const OFFSET: u16 = 1;
}
impl fmt::Debug for TerminalID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            &Self::EOI => write!(f, "T#End"),
            _ => write!(f, "T#{:03}", self.0),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayoutID(u16);
impl fmt::Debug for LayoutID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L#{:03}", self.0)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonterminalID(u16);
impl NonterminalID {
    /// The augmented start symbol.
    pub const START: Self = Self(0);
    const OFFSET: u16 = 1;
}
impl fmt::Debug for NonterminalID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            &Self::START => write!(f, "N#Start"),
            _ => write!(f, "N#{:03}", self.0),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub enum SymbolID {
    T(TerminalID),
    N(NonterminalID),
}
impl fmt::Debug for SymbolID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::T(t) => write!(f, "{:?}", t),
            Self::N(n) => write!(f, "{:?}", n),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductionID(u16);
impl ProductionID {
    /// The augmented production `#Start -> S #EOI`.
    pub const ACCEPT: Self = Self(u16::MAX);
}
impl fmt::Debug for ProductionID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            &Self::ACCEPT => write!(f, "P#Accept"),
            _ => write!(f, "P#{:03}", self.0),
        }
    }
}

// ==== Bit-sets over the symbol index spaces ====

/// Identifiers that can be stored in an [`IdSet`].
pub trait SetIndex: Copy {
    fn into_index(self) -> usize;
    fn from_index(index: usize) -> Self;
}

impl SetIndex for TerminalID {
    fn into_index(self) -> usize {
        self.0.into()
    }
    fn from_index(index: usize) -> Self {
        Self(index.try_into().expect("terminal index overflow"))
    }
}

impl SetIndex for LayoutID {
    fn into_index(self) -> usize {
        self.0.into()
    }
    fn from_index(index: usize) -> Self {
        Self(index.try_into().expect("layout index overflow"))
    }
}

/// A word-packed set of identifiers.
pub struct IdSet<T> {
    inner: bit_set::BitSet,
    _marker: PhantomData<fn() -> T>,
}

pub type TerminalSet = IdSet<TerminalID>;
pub type LayoutSet = IdSet<LayoutID>;

impl<T> Default for IdSet<T> {
    fn default() -> Self {
        Self {
            inner: bit_set::BitSet::new(),
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for IdSet<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> PartialEq for IdSet<T> {
    fn eq(&self, other: &Self) -> bool {
        // Sets of different capacity still compare equal when they hold the same elements.
        self.inner.iter().eq(other.inner.iter())
    }
}
impl<T> Eq for IdSet<T> {}

impl<T> fmt::Debug for IdSet<T>
where
    T: SetIndex + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: SetIndex> IdSet<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: bit_set::BitSet::with_capacity(capacity),
            _marker: PhantomData,
        }
    }

    pub fn contains(&self, id: T) -> bool {
        self.inner.contains(id.into_index())
    }

    pub fn insert(&mut self, id: T) -> bool {
        self.inner.insert(id.into_index())
    }

    /// Add all elements of `other` into this set, and return whether this set has grown.
    pub fn union_with(&mut self, other: &Self) -> bool {
        if other.inner.is_subset(&self.inner) {
            return false;
        }
        self.inner.union_with(&other.inner);
        true
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        self.inner.is_subset(&other.inner)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&mut self) {
        self.inner.clear()
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + Clone + '_ {
        self.inner.iter().map(T::from_index)
    }
}

impl<T: SetIndex> FromIterator<T> for IdSet<T> {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        Self {
            inner: iter.into_iter().map(T::into_index).collect(),
            _marker: PhantomData,
        }
    }
}

// ==== Context-Free Grammars with layout ====

#[derive(Debug)]
pub struct Production {
    pub left: NonterminalID,
    pub right: Vec<SymbolID>,
    /// Layout tokens admissible between the symbols of this production.
    pub layout: LayoutSet,
}
impl Production {
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(|f| {
            write!(f, "{} -> ", g.nonterminals[&self.left])?;
            if self.right.is_empty() {
                f.write_str("ε")?;
            } else {
                for (i, r) in self.right.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    f.write_str(g.symbol_name(*r))?;
                }
            }
            Ok(())
        })
    }
}

/// The grammar definition used to derive the look-ahead and layout sets.
#[derive(Debug)]
#[non_exhaustive]
pub struct Grammar {
    pub terminals: Map<TerminalID, String>,
    pub layouts: Map<LayoutID, String>,
    pub nonterminals: Map<NonterminalID, String>,
    pub productions: Map<ProductionID, Production>,
    pub start_symbol: NonterminalID,
    /// Layout admissible around the whole input.
    pub start_layout: LayoutSet,
}

impl Grammar {
    /// Define a grammar using the specified function.
    pub fn define<F>(f: F) -> Result<Self, GrammarDefError>
    where
        F: FnOnce(&mut GrammarDef) -> Result<(), GrammarDefError>,
    {
        let mut def = GrammarDef {
            terminals: Map::default(),
            layouts: Map::default(),
            nonterminals: Map::default(),
            productions: Map::default(),
            start_symbol: None,
            start_layout: LayoutSet::default(),
            next_terminal: TerminalID::OFFSET,
            next_layout: 0,
            next_nonterminal: NonterminalID::OFFSET,
            next_production: 0,
        };

        def.terminals.insert(TerminalID::EOI, "#EOI".into());
        def.nonterminals.insert(NonterminalID::START, "#Start".into());

        f(&mut def)?;

        def.end()
    }

    pub fn production(&self, id: ProductionID) -> &Production {
        &self.productions[&id]
    }

    pub fn symbol_name(&self, symbol: SymbolID) -> &str {
        match symbol {
            SymbolID::T(t) => &self.terminals[&t],
            SymbolID::N(n) => &self.nonterminals[&n],
        }
    }

    pub fn terminal_name(&self, t: TerminalID) -> &str {
        &self.terminals[&t]
    }

    pub fn layout_name(&self, l: LayoutID) -> &str {
        &self.layouts[&l]
    }

    /// Look up a terminal symbol by its name.
    pub fn terminal_by_name(&self, name: &str) -> Option<TerminalID> {
        self.terminals
            .iter()
            .find_map(|(id, n)| (n == name).then_some(*id))
    }

    /// Look up a layout token by its name.
    pub fn layout_by_name(&self, name: &str) -> Option<LayoutID> {
        self.layouts
            .iter()
            .find_map(|(id, n)| (n == name).then_some(*id))
    }

    /// Look up a nonterminal symbol by its name.
    pub fn nonterminal_by_name(&self, name: &str) -> Option<NonterminalID> {
        self.nonterminals
            .iter()
            .find_map(|(id, n)| (n == name).then_some(*id))
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#### terminals: ")?;
        for (i, t) in self.terminals.values().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", t)?;
        }
        write!(f, "\n#### layouts: ")?;
        for (i, l) in self.layouts.values().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", l)?;
        }
        write!(f, "\n#### nonterminals: ")?;
        for (i, n) in self.nonterminals.values().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", n)?;
        }
        writeln!(f, "\n#### productions:")?;
        for p in self.productions.values() {
            write!(f, "- {}", p.display(self))?;
            if !p.layout.is_empty() {
                write!(
                    f,
                    " (layout: {})",
                    display_set(p.layout.iter().map(|l| self.layout_name(l)))
                )?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// The contextual values for building a `Grammar`.
#[derive(Debug)]
pub struct GrammarDef {
    terminals: Map<TerminalID, String>,
    layouts: Map<LayoutID, String>,
    nonterminals: Map<NonterminalID, String>,
    productions: Map<ProductionID, Production>,
    start_symbol: Option<NonterminalID>,
    start_layout: LayoutSet,
    next_terminal: u16,
    next_layout: u16,
    next_nonterminal: u16,
    next_production: u16,
}

impl GrammarDef {
    /// Declare a terminal symbol used in this grammar.
    pub fn terminal(&mut self, name: &str) -> Result<TerminalID, GrammarDefError> {
        check_unique(self.terminals.values(), name)?;
        let terminal = TerminalID(self.next_terminal);
        self.terminals.insert(terminal, name.into());
        self.next_terminal = bump(self.next_terminal)?;
        Ok(terminal)
    }

    /// Declare a layout token used in this grammar.
    pub fn layout(&mut self, name: &str) -> Result<LayoutID, GrammarDefError> {
        check_unique(self.layouts.values(), name)?;
        let layout = LayoutID(self.next_layout);
        self.layouts.insert(layout, name.into());
        self.next_layout = bump(self.next_layout)?;
        Ok(layout)
    }

    /// Declare a nonterminal symbol used in this grammar.
    pub fn nonterminal(&mut self, name: &str) -> Result<NonterminalID, GrammarDefError> {
        check_unique(self.nonterminals.values(), name)?;
        let nonterminal = NonterminalID(self.next_nonterminal);
        self.nonterminals.insert(nonterminal, name.into());
        self.next_nonterminal = bump(self.next_nonterminal)?;
        Ok(nonterminal)
    }

    /// Specify a production rule, together with the layout admissible between its symbols.
    pub fn production<L, R>(
        &mut self,
        layout: L,
        left: NonterminalID,
        right: R,
    ) -> Result<ProductionID, GrammarDefError>
    where
        L: IntoIterator<Item = LayoutID>,
        R: IntoIterator<Item = SymbolID>,
    {
        if left == NonterminalID::START || !self.nonterminals.contains_key(&left) {
            return Err(GrammarDefError::UndefinedSymbol {
                symbol: format!("{:?}", left),
            });
        }
        let right: Vec<_> = right.into_iter().collect();
        for symbol in &right {
            let defined = match symbol {
                SymbolID::T(t) => *t != TerminalID::EOI && self.terminals.contains_key(t),
                SymbolID::N(n) => *n != NonterminalID::START && self.nonterminals.contains_key(n),
            };
            if !defined {
                return Err(GrammarDefError::UndefinedSymbol {
                    symbol: format!("{:?}", symbol),
                });
            }
        }
        let layout: LayoutSet = layout.into_iter().collect();
        if let Some(l) = layout.iter().find(|l| !self.layouts.contains_key(l)) {
            return Err(GrammarDefError::UndefinedSymbol {
                symbol: format!("{:?}", l),
            });
        }

        if self
            .productions
            .values()
            .any(|p| p.left == left && p.right == right)
        {
            return Err(GrammarDefError::DuplicateProduction {
                left: self.nonterminals[&left].clone(),
            });
        }

        let id = ProductionID(self.next_production);
        self.productions.insert(
            id,
            Production {
                left,
                right,
                layout,
            },
        );
        self.next_production = bump(self.next_production)?;
        if self.next_production == ProductionID::ACCEPT.0 {
            return Err(GrammarDefError::TooManySymbols);
        }
        Ok(id)
    }

    /// Specify the start symbol for this grammar.
    pub fn start_symbol(&mut self, start: NonterminalID) -> Result<(), GrammarDefError> {
        if start == NonterminalID::START || !self.nonterminals.contains_key(&start) {
            return Err(GrammarDefError::UndefinedSymbol {
                symbol: format!("{:?}", start),
            });
        }
        self.start_symbol.replace(start);
        Ok(())
    }

    /// Specify the layout admissible at the beginning and end of the input.
    pub fn start_layout<L>(&mut self, layout: L) -> Result<(), GrammarDefError>
    where
        L: IntoIterator<Item = LayoutID>,
    {
        for l in layout {
            if !self.layouts.contains_key(&l) {
                return Err(GrammarDefError::UndefinedSymbol {
                    symbol: format!("{:?}", l),
                });
            }
            self.start_layout.insert(l);
        }
        Ok(())
    }

    fn end(mut self) -> Result<Grammar, GrammarDefError> {
        // The first declared nonterminal is used when the start symbol is not specified.
        let start_symbol = match self.start_symbol {
            Some(start) => start,
            None => self
                .nonterminals
                .keys()
                .find(|id| **id != NonterminalID::START)
                .copied()
                .ok_or(GrammarDefError::EmptyNonterminals)?,
        };

        self.productions.insert(
            ProductionID::ACCEPT,
            Production {
                left: NonterminalID::START,
                right: vec![SymbolID::N(start_symbol), SymbolID::T(TerminalID::EOI)],
                layout: self.start_layout.clone(),
            },
        );

        Ok(Grammar {
            terminals: self.terminals,
            layouts: self.layouts,
            nonterminals: self.nonterminals,
            productions: self.productions,
            start_symbol,
            start_layout: self.start_layout,
        })
    }
}

fn check_unique<'a>(
    mut names: impl Iterator<Item = &'a String>,
    name: &str,
) -> Result<(), GrammarDefError> {
    if names.any(|n| n == name) {
        return Err(GrammarDefError::DuplicateSymbol { name: name.into() });
    }
    Ok(())
}

fn bump(next: u16) -> Result<u16, GrammarDefError> {
    next.checked_add(1).ok_or(GrammarDefError::TooManySymbols)
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarDefError {
    #[error("the symbol `{name}' has already been declared")]
    DuplicateSymbol { name: String },

    #[error("duplicate production rule for `{left}'")]
    DuplicateProduction { left: String },

    #[error("undefined symbol: {symbol}")]
    UndefinedSymbol { symbol: String },

    #[error("empty nonterminal symbols")]
    EmptyNonterminals,

    #[error("too many symbols or productions")]
    TooManySymbols,
}

/// Grammars used by the tests, the benchmarks and the command line tool.
pub mod examples {
    use super::*;
    use SymbolID::*;

    pub type Example = fn(&mut GrammarDef) -> Result<(), GrammarDefError>;

    /// All reference grammars, keyed by name.
    pub const ALL: &[(&str, Example)] = &[
        ("expression", expression),
        ("arithmetic", arithmetic),
        ("with_nullable", with_nullable),
        ("nullable_tail", nullable_tail),
        ("composed", composed),
        ("fig1", fig1),
        ("fig5", fig5),
        ("fig6", fig6),
    ];

    /// `S -> E`, `E -> E + T | T`, `T -> id`, with `WS` allowed everywhere.
    pub fn expression(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
        let ws = g.layout("WS")?;

        let plus = g.terminal("`+`")?;
        let id = g.terminal("ID")?;

        let s = g.nonterminal("S")?;
        let e = g.nonterminal("E")?;
        let t = g.nonterminal("T")?;

        g.start_symbol(s)?;
        g.start_layout([ws])?;

        g.production([ws], s, [N(e)])?;
        g.production([ws], e, [N(e), T(plus), N(t)])?;
        g.production([ws], e, [N(t)])?;
        g.production([ws], t, [T(id)])?;
        Ok(())
    }

    pub fn arithmetic(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
        let ws = g.layout("WS")?;
        let comment = g.layout("COMMENT")?;
        let layout = [ws, comment];

        let lparen = g.terminal("`(`")?;
        let rparen = g.terminal("`)`")?;
        let plus = g.terminal("`+`")?;
        let minus = g.terminal("`-`")?;
        let star = g.terminal("`*`")?;
        let slash = g.terminal("`/`")?;
        let num = g.terminal("NUM")?;

        let expr = g.nonterminal("expr")?;
        let term = g.nonterminal("term")?;
        let factor = g.nonterminal("factor")?;
        let atom = g.nonterminal("atom")?;

        g.start_symbol(expr)?;
        g.start_layout(layout)?;

        g.production(layout, expr, [N(expr), T(plus), N(term)])?;
        g.production(layout, expr, [N(expr), T(minus), N(term)])?;
        g.production(layout, expr, [N(term)])?;

        g.production(layout, term, [N(term), T(star), N(factor)])?;
        g.production(layout, term, [N(term), T(slash), N(factor)])?;
        g.production(layout, term, [N(factor)])?;

        g.production(layout, factor, [T(minus), N(factor)])?;
        g.production(layout, factor, [N(atom)])?;

        g.production(layout, atom, [T(num)])?;
        g.production(layout, atom, [T(lparen), N(expr), T(rparen)])?;
        Ok(())
    }

    pub fn with_nullable(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
        // E → E + T n | T
        // T → a | ( E n ) | n a
        // n → ϵ | num
        let ws = g.layout("WS")?;

        let lparen = g.terminal("`(`")?;
        let rparen = g.terminal("`)`")?;
        let plus = g.terminal("`+`")?;
        let a = g.terminal("`a`")?;
        let num = g.terminal("NUM")?;

        let expr = g.nonterminal("expr")?;
        let term = g.nonterminal("term")?;
        let nullable = g.nonterminal("nullable")?;

        g.start_layout([ws])?;

        g.production([ws], expr, [N(expr), T(plus), N(term), N(nullable)])?;
        g.production([ws], expr, [N(term)])?;

        g.production([ws], term, [T(a)])?;
        g.production([ws], term, [T(lparen), N(expr), N(nullable), T(rparen)])?;
        g.production([ws], term, [N(nullable), T(a)])?;

        g.production([ws], nullable, [])?;
        g.production([ws], nullable, [T(num)])?;
        Ok(())
    }

    /// `S -> A d`, `A -> b C`, `C -> ε | c`.
    #[allow(nonstandard_style)]
    pub fn nullable_tail(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
        let b = g.terminal("b")?;
        let c = g.terminal("c")?;
        let d = g.terminal("d")?;

        let S = g.nonterminal("S")?;
        let A = g.nonterminal("A")?;
        let C = g.nonterminal("C")?;

        g.start_symbol(S)?;

        g.production([], S, [N(A), T(d)])?;
        g.production([], A, [T(b), N(C)])?;
        g.production([], C, [])?;
        g.production([], C, [T(c)])?;
        Ok(())
    }

    /// A host language with whitespace layout embedding a query sub-language
    /// whose productions only admit comments between their tokens.
    pub fn composed(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
        let ws = g.layout("WS")?;
        let comment = g.layout("COMMENT")?;

        let r#let = g.terminal("`let`")?;
        let ident = g.terminal("IDENT")?;
        let equal = g.terminal("`=`")?;
        let semicolon = g.terminal("`;`")?;
        let select = g.terminal("`select`")?;
        let comma = g.terminal("`,`")?;

        let stmts = g.nonterminal("stmts")?;
        let stmt = g.nonterminal("stmt")?;
        let expr = g.nonterminal("expr")?;
        let query = g.nonterminal("query")?;
        let columns = g.nonterminal("columns")?;

        g.start_symbol(stmts)?;
        g.start_layout([ws])?;

        // host grammar
        g.production([ws], stmts, [N(stmts), N(stmt)])?;
        g.production([ws], stmts, [])?;
        g.production(
            [ws],
            stmt,
            [T(r#let), T(ident), T(equal), N(expr), T(semicolon)],
        )?;
        g.production([ws], expr, [T(ident)])?;
        g.production([ws], expr, [N(query)])?;

        // embedded query grammar
        g.production([comment], query, [T(select), N(columns)])?;
        g.production([comment], columns, [N(columns), T(comma), T(ident)])?;
        g.production([comment], columns, [T(ident)])?;
        Ok(())
    }

    // test grammars described in the IELR(1) paper.

    #[allow(nonstandard_style)]
    pub fn fig1(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
        // Note: this grammar is unambiguous, but the generated LALR(1) automaton has S/R conflict.
        let a = g.terminal("a")?;
        let b = g.terminal("b")?;
        let S = g.nonterminal("S")?;
        let A = g.nonterminal("A")?;

        g.start_symbol(S)?;

        g.production([], S, [T(a), N(A), T(a)])?;
        g.production([], S, [T(b), N(A), T(b)])?;
        g.production([], A, [T(a)])?;
        g.production([], A, [T(a), T(a)])?;
        Ok(())
    }

    #[allow(nonstandard_style)]
    pub fn fig5(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
        let a = g.terminal("a")?;
        let b = g.terminal("b")?;
        let c = g.terminal("c")?;

        let S = g.nonterminal("S")?;
        let A = g.nonterminal("A")?;
        let B = g.nonterminal("B")?;
        let C = g.nonterminal("C")?;
        let D = g.nonterminal("D")?;
        let E = g.nonterminal("E")?;

        g.start_symbol(S)?;

        g.production([], S, [T(a), N(A), N(B), T(a)])?;
        g.production([], S, [T(b), N(A), N(B), T(b)])?;
        g.production([], A, [T(a), N(C), N(D), N(E)])?;
        g.production([], B, [T(c)])?;
        g.production([], B, [])?;
        g.production([], C, [N(D)])?;
        g.production([], D, [T(a)])?;
        g.production([], E, [T(a)])?;
        g.production([], E, [])?;
        Ok(())
    }

    #[allow(nonstandard_style)]
    pub fn fig6(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
        let a = g.terminal("a")?;
        let b = g.terminal("b")?;
        let S = g.nonterminal("S")?;
        let A = g.nonterminal("A")?;
        let B = g.nonterminal("B")?;
        let C = g.nonterminal("C")?;
        let D = g.nonterminal("D")?;

        g.start_symbol(S)?;

        g.production([], S, [T(a), N(A), T(a)])?;
        g.production([], S, [T(a), T(a), T(b)])?;
        g.production([], S, [T(b), N(A), T(b)])?;
        g.production([], A, [N(B), N(C)])?;
        g.production([], B, [T(a)])?;
        g.production([], C, [N(D)])?;
        g.production([], D, [])?;
        Ok(())
    }
}
