//! Calculation of first sets and nullability of grammar symbols.

use crate::{
    grammar::{Grammar, NonterminalID, SymbolID, TerminalID, TerminalSet},
    types::{Map, Set},
};

/// The per-symbol context sets: `First(X)` and whether `X =>* ε`.
#[derive(Debug)]
pub struct ContextSets {
    nulls: Set<NonterminalID>,
    terminal_firsts: Map<TerminalID, TerminalSet>,
    nonterminal_firsts: Map<NonterminalID, TerminalSet>,
}

impl ContextSets {
    pub fn new(g: &Grammar) -> Self {
        let nulls = nulls_set(g);
        let nonterminal_firsts = first_sets(g, &nulls);
        let terminal_firsts = g
            .terminals
            .keys()
            .map(|&t| (t, Some(t).into_iter().collect()))
            .collect();
        Self {
            nulls,
            terminal_firsts,
            nonterminal_firsts,
        }
    }

    /// `First(X)`
    pub fn first(&self, symbol: SymbolID) -> &TerminalSet {
        match symbol {
            SymbolID::T(t) => self.terminal_firsts.get(&t),
            SymbolID::N(n) => self.nonterminal_firsts.get(&n),
        }
        .unwrap_or_else(|| panic!("unexpected symbol: {:?}", symbol))
    }

    pub fn is_nullable(&self, symbol: SymbolID) -> bool {
        match symbol {
            SymbolID::T(t) => {
                assert!(
                    self.terminal_firsts.contains_key(&t),
                    "unexpected symbol: {:?}",
                    symbol
                );
                false
            }
            SymbolID::N(n) => {
                assert!(
                    self.nonterminal_firsts.contains_key(&n),
                    "unexpected symbol: {:?}",
                    symbol
                );
                self.nulls.contains(&n)
            }
        }
    }
}

/// Calculate the set of nullable symbols in this grammar.
fn nulls_set(g: &Grammar) -> Set<NonterminalID> {
    let mut nulls = Set::default();
    loop {
        let mut changed = false;
        for p in g.productions.values() {
            if p.right
                .iter()
                .all(|s| matches!(s, SymbolID::N(n) if nulls.contains(n)))
            {
                changed |= nulls.insert(p.left);
            }
        }
        if !changed {
            break;
        }
    }
    nulls
}

fn first_sets(g: &Grammar, nulls: &Set<NonterminalID>) -> Map<NonterminalID, TerminalSet> {
    let mut map: Map<NonterminalID, TerminalSet> = g
        .nonterminals
        .keys()
        .map(|&n| (n, TerminalSet::default()))
        .collect();

    // For each production X -> Y1 Y2 ... Yn, let Yk be the first non-nullable symbol.
    // Then First(X) must contain First(Yi) for each i <= k.
    struct Constraint {
        sup: NonterminalID,
        sub: SymbolID,
    }
    let mut constraints = vec![];
    for p in g.productions.values() {
        for &symbol in &p.right {
            if symbol != SymbolID::N(p.left) {
                constraints.push(Constraint { sup: p.left, sub: symbol });
            }
            match symbol {
                SymbolID::N(n) if nulls.contains(&n) => continue,
                _ => break,
            }
        }
    }

    let mut changed = true;
    while changed {
        changed = false;
        for Constraint { sup, sub } in &constraints {
            let added: TerminalSet = match sub {
                SymbolID::T(t) => Some(*t).into_iter().collect(),
                SymbolID::N(n) => map[n].clone(),
            };
            changed |= map[sup].union_with(&added);
        }
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::examples;

    fn terminals(g: &Grammar, names: &[&str]) -> TerminalSet {
        names
            .iter()
            .map(|name| g.terminal_by_name(name).unwrap())
            .collect()
    }

    #[test]
    fn first_of_expression_grammar() {
        let g = Grammar::define(examples::expression).unwrap();
        let ctx = ContextSets::new(&g);

        for name in ["S", "E", "T"] {
            let n = g.nonterminal_by_name(name).unwrap();
            assert_eq!(*ctx.first(SymbolID::N(n)), terminals(&g, &["ID"]));
            assert!(!ctx.is_nullable(SymbolID::N(n)));
        }

        let plus = g.terminal_by_name("`+`").unwrap();
        assert_eq!(*ctx.first(SymbolID::T(plus)), terminals(&g, &["`+`"]));
        assert!(!ctx.is_nullable(SymbolID::T(plus)));
    }

    #[test]
    fn first_through_nullable_prefix() {
        let g = Grammar::define(examples::with_nullable).unwrap();
        let ctx = ContextSets::new(&g);

        let nullable = g.nonterminal_by_name("nullable").unwrap();
        assert!(ctx.is_nullable(SymbolID::N(nullable)));
        assert_eq!(*ctx.first(SymbolID::N(nullable)), terminals(&g, &["NUM"]));

        // term -> n a, where n is nullable.
        let term = g.nonterminal_by_name("term").unwrap();
        assert!(!ctx.is_nullable(SymbolID::N(term)));
        assert_eq!(
            *ctx.first(SymbolID::N(term)),
            terminals(&g, &["`(`", "`a`", "NUM"])
        );
    }

    #[test]
    fn nullable_chain() {
        let g = Grammar::define(examples::fig6).unwrap();
        let ctx = ContextSets::new(&g);

        let c = g.nonterminal_by_name("C").unwrap();
        let d = g.nonterminal_by_name("D").unwrap();
        let a = g.nonterminal_by_name("A").unwrap();
        assert!(ctx.is_nullable(SymbolID::N(c)));
        assert!(ctx.is_nullable(SymbolID::N(d)));
        assert!(!ctx.is_nullable(SymbolID::N(a)));
        assert!(ctx.first(SymbolID::N(d)).is_empty());
        assert_eq!(*ctx.first(SymbolID::N(a)), terminals(&g, &["a"]));
    }

    #[test]
    #[should_panic(expected = "unexpected symbol")]
    fn unknown_symbol_fails_fast() {
        let g = Grammar::define(examples::fig1).unwrap();
        let ctx = ContextSets::new(&g);
        let other = Grammar::define(examples::arithmetic).unwrap();
        let num = other.terminal_by_name("NUM").unwrap();
        ctx.first(SymbolID::T(num));
    }
}
