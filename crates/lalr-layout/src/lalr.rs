//! LALR(1) look-ahead sets and valid layout sets.
//!
//! Look-aheads are generated by the classical closure/propagation method:
//! within a state, an item `A -> α . C β` spontaneously gives `First(β)` to
//! every item `C -> . γ`, and passes its own look-ahead on when `β =>* ε`;
//! across states, the sets of an item flow along the goto transitions to
//! the advanced item.
//!
//! The layout tokens admissible in each state are computed by the same
//! traversal. Two auxiliary sets are tracked per item:
//!
//! * the *beginning layout*, admissible before the symbols the item has
//!   already consumed, and
//! * the *look-ahead layout*, admissible between the end of the item and
//!   its look-ahead.

use crate::{
    first_sets::ContextSets,
    grammar::{Grammar, LayoutSet, Production, ProductionID, SymbolID, TerminalID, TerminalSet},
    lr0::{LR0Automaton, StateID},
    types::Set,
    util::{display_fn, display_set},
};
use bit_set::BitSet;
use std::{fmt, mem, time::Instant};

/// LALR(1) look-ahead sets for every item, and layout sets for every state.
#[derive(Debug, Clone)]
pub struct LookaheadAndLayoutSets {
    lookaheads: Vec<Vec<TerminalSet>>,
    layouts: Vec<LayoutSet>,
    max_item_count: usize,
}

impl LookaheadAndLayoutSets {
    fn new(g: &Grammar, lr0: &LR0Automaton) -> Self {
        let num_terminals = g.terminals.len();
        let num_layouts = g.layouts.len();
        Self {
            lookaheads: lr0
                .states()
                .map(|(_, state)| vec![TerminalSet::with_capacity(num_terminals); state.items.len()])
                .collect(),
            layouts: vec![LayoutSet::with_capacity(num_layouts); lr0.len()],
            max_item_count: lr0.max_item_count(),
        }
    }

    /// The terminals that may follow a reduction by the `item`-th item of `state`.
    pub fn lookahead(&self, state: StateID, item: usize) -> &TerminalSet {
        &self.lookaheads[state.index()][item]
    }

    /// The layout tokens that may be skipped while the parser is in `state`.
    pub fn layout(&self, state: StateID) -> &LayoutSet {
        &self.layouts[state.index()]
    }

    pub fn max_item_count(&self) -> usize {
        self.max_item_count
    }

    pub fn display<'a>(&'a self, g: &'a Grammar, lr0: &'a LR0Automaton) -> impl fmt::Display + 'a {
        display_fn(move |f| {
            for (id, state) in lr0.states() {
                writeln!(f, "#### {:?}", id)?;
                writeln!(
                    f,
                    "## layout: {}",
                    display_set(self.layout(id).iter().map(|l| g.layout_name(l)))
                )?;
                writeln!(f, "## items:")?;
                for (i, item) in state.items.iter().enumerate() {
                    writeln!(
                        f,
                        "- {}, {}",
                        item.display(g),
                        display_set(self.lookahead(id, i).iter().map(|t| g.terminal_name(t)))
                    )?;
                }
            }
            Ok(())
        })
    }
}

/// Compute the look-ahead and layout sets of the specified LR(0) automaton.
#[tracing::instrument(skip_all)]
pub fn build(g: &Grammar, ctx: &ContextSets, lr0: &LR0Automaton) -> LookaheadAndLayoutSets {
    let s = Instant::now();
    let mut builder = Builder::new(g, ctx, lr0);
    let mut sweeps = 1;
    while builder.sweep() {
        sweeps += 1;
    }
    tracing::debug!(
        "look-ahead sets converged after {} sweeps ({:?} elapsed)",
        sweeps,
        s.elapsed()
    );
    builder.finish()
}

/// States and items whose sets have changed since they were last visited.
#[derive(Debug)]
struct Fringe {
    states: BitSet,
    items: Vec<BitSet>,
}

impl Fringe {
    fn new(num_states: usize) -> Self {
        Self {
            states: BitSet::with_capacity(num_states),
            items: vec![BitSet::new(); num_states],
        }
    }

    fn mark(&mut self, state: StateID, item: usize) {
        self.states.insert(state.index());
        self.items[state.index()].insert(item);
    }

    fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

pub(crate) struct Builder<'g> {
    g: &'g Grammar,
    ctx: &'g ContextSets,
    lr0: &'g LR0Automaton,
    pub(crate) table: LookaheadAndLayoutSets,
    pub(crate) beginning_layouts: Vec<Vec<LayoutSet>>,
    pub(crate) lookahead_layouts: Vec<Vec<LayoutSet>>,
    last: Fringe,
    current: Fringe,
    // scratch buffers reused by the closure.
    combined_first: TerminalSet,
    lookahead_layout_buffer: LayoutSet,
}

impl<'g> Builder<'g> {
    pub(crate) fn new(g: &'g Grammar, ctx: &'g ContextSets, lr0: &'g LR0Automaton) -> Self {
        let start = lr0.item_set(StateID::START);
        assert!(
            matches!(start.first(), Some(item) if item.production == ProductionID::ACCEPT && item.position == 0),
            "the start state must begin with the item `#Start -> . S #EOI`"
        );

        let table = LookaheadAndLayoutSets::new(g, lr0);
        let layout_sets = || -> Vec<Vec<LayoutSet>> {
            lr0.states()
                .map(|(_, state)| vec![LayoutSet::with_capacity(g.layouts.len()); state.items.len()])
                .collect()
        };
        let mut builder = Self {
            g,
            ctx,
            lr0,
            table,
            beginning_layouts: layout_sets(),
            lookahead_layouts: layout_sets(),
            last: Fringe::new(lr0.len()),
            current: Fringe::new(lr0.len()),
            combined_first: TerminalSet::with_capacity(g.terminals.len()),
            lookahead_layout_buffer: LayoutSet::with_capacity(g.layouts.len()),
        };

        // Start with the initial item `#Start -> . S #EOI`, which may be surrounded by the start layout.
        builder.beginning_layouts[StateID::START.index()][0].union_with(&g.start_layout);
        builder.last.mark(StateID::START, 0);

        builder
    }

    /// Run one propagation step over the states changed by the previous step,
    /// and return whether another step is required.
    pub(crate) fn sweep(&mut self) -> bool {
        let lr0 = self.lr0;
        let g = self.g;

        tracing::trace!("sweep over {} states", self.last.states.len());

        let mut active_transitions = Set::<SymbolID>::default();
        let mut fringe_states = mem::take(&mut self.last.states);
        for state in fringe_states.iter() {
            let state = StateID::from_raw(state as u16);
            let seed = mem::take(&mut self.last.items[state.index()]);
            let touched = self.lookahead_closure(state, &seed);

            // Symbols on which one of the touched items can be shifted.
            let items = lr0.item_set(state);
            active_transitions.clear();
            for item in touched.iter() {
                let item = &items[item];
                match g.production(item.production).right.get(usize::from(item.position)) {
                    Some(SymbolID::T(TerminalID::EOI)) | None => (),
                    Some(symbol) => {
                        active_transitions.insert(*symbol);
                    }
                }
            }

            for &symbol in &active_transitions {
                let next = lr0.transition(state, symbol);
                let next_items = lr0.item_set(next);
                for &(source, dest) in lr0.goto_items(state, symbol) {
                    if !touched.contains(source) {
                        continue;
                    }

                    let from = (state.index(), source);
                    let to = (next.index(), dest);
                    let mut changed = false;
                    let (src, dst) = source_and_dest(&mut self.table.lookaheads, from, to);
                    changed |= dst.union_with(src);
                    let (src, dst) = source_and_dest(&mut self.beginning_layouts, from, to);
                    changed |= dst.union_with(src);
                    let (src, dst) = source_and_dest(&mut self.lookahead_layouts, from, to);
                    changed |= dst.union_with(src);

                    let dest_item = &next_items[dest];
                    let production = g.production(dest_item.production);
                    if usize::from(dest_item.position) < production.right.len() {
                        self.table.layouts[next.index()].union_with(&production.layout);
                    }

                    if changed {
                        self.current.mark(next, dest);
                    }
                }
            }
        }
        fringe_states.clear();
        self.last.states = fringe_states;

        mem::swap(&mut self.last, &mut self.current);
        !self.last.is_empty()
    }

    /// Hand out the converged sets.
    pub(crate) fn finish(self) -> LookaheadAndLayoutSets {
        debug_assert!(self.last.is_empty(), "the look-ahead sets have not converged");
        self.table
    }

    /// Apply the rule `A -> α . C β, a  ==>  C -> . γ, First(β a)` within `state`,
    /// starting from the `seed` items, until no set changes.
    ///
    /// Returns every item visited, i.e. the seed and the items whose sets have grown.
    fn lookahead_closure(&mut self, state: StateID, seed: &BitSet) -> BitSet {
        let g = self.g;
        let ctx = self.ctx;
        let lr0 = self.lr0;
        let items = lr0.item_set(state);
        let s = state.index();

        let mut touched = seed.clone();
        let mut fringe = seed.clone();
        let mut next_fringe = BitSet::new();
        while !fringe.is_empty() {
            for k in fringe.iter() {
                let item = &items[k];
                let production = g.production(item.production);
                let position = usize::from(item.position);

                let use_lookahead = self.combined_first(production, position);

                if position == 0 {
                    self.table.layouts[s].union_with(&self.beginning_layouts[s][k]);
                } else if position < production.right.len() {
                    self.lookahead_layout_buffer.union_with(&production.layout);
                }

                if use_lookahead {
                    if position == production.right.len()
                        || ctx.is_nullable(production.right[position])
                    {
                        self.table.layouts[s].union_with(&self.lookahead_layouts[s][k]);
                    }
                    self.lookahead_layout_buffer.union_with(&self.lookahead_layouts[s][k]);
                }

                let Some(&callee) = production.right.get(position) else {
                    continue;
                };

                for (i, entry) in items.iter().enumerate() {
                    let entry_production = g.production(entry.production);
                    if entry.position != 0 || SymbolID::N(entry_production.left) != callee {
                        continue;
                    }

                    let mut changed = false;
                    changed |= self.table.lookaheads[s][i].union_with(&self.combined_first);

                    let beginning_layout = if position == 0 {
                        self.beginning_layouts[s][k].clone()
                    } else {
                        production.layout.clone()
                    };
                    changed |= self.beginning_layouts[s][i].union_with(&beginning_layout);

                    if matches!(entry_production.right.first(), Some(SymbolID::T(_))) {
                        self.table.layouts[s].union_with(&self.beginning_layouts[s][i]);
                    }

                    changed |=
                        self.lookahead_layouts[s][i].union_with(&self.lookahead_layout_buffer);

                    if use_lookahead {
                        let lookahead = self.table.lookaheads[s][k].clone();
                        changed |= self.table.lookaheads[s][i].union_with(&lookahead);
                    }

                    if changed {
                        next_fringe.insert(i);
                    }
                }
            }
            touched.union_with(&next_fringe);
            fringe = mem::take(&mut next_fringe);
        }

        touched
    }

    /// Compute `First(β)` for the item `A -> α . C β` into `self.combined_first`,
    /// and return whether `β =>* ε`, in which case the look-ahead of the item
    /// itself also belongs to the combined first set.
    ///
    /// The layout of the production is recorded into the look-ahead layout buffer
    /// as soon as `β` contributes a terminal.
    fn combined_first(&mut self, production: &Production, position: usize) -> bool {
        let ctx = self.ctx;
        self.combined_first.clear();
        self.lookahead_layout_buffer.clear();

        let mut still_nullable = true;
        for &symbol in production.right.iter().skip(position + 1) {
            let first = ctx.first(symbol);
            self.combined_first.union_with(first);
            if self.lookahead_layout_buffer.is_empty() && !first.is_empty() {
                self.lookahead_layout_buffer.union_with(&production.layout);
            }
            if !ctx.is_nullable(symbol) {
                still_nullable = false;
                break;
            }
        }
        still_nullable
    }
}

/// Borrow the set of the `source` item and the set of the `dest` item at once.
///
/// Both are `(state, item)` indices, and must not denote the same item.
fn source_and_dest<T>(
    rows: &mut [Vec<T>],
    (s, i): (usize, usize),
    (d, j): (usize, usize),
) -> (&T, &mut T) {
    if s == d {
        assert_ne!(i, j, "an item cannot be advanced into itself");
        let row = &mut rows[s];
        if i < j {
            let (head, tail) = row.split_at_mut(j);
            (&head[i], &mut tail[0])
        } else {
            let (head, tail) = row.split_at_mut(i);
            (&tail[0], &mut head[j])
        }
    } else if s < d {
        let (head, tail) = rows.split_at_mut(d);
        (&head[s][i], &mut tail[0][j])
    } else {
        let (head, tail) = rows.split_at_mut(s);
        (&tail[0][i], &mut head[d][j])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        grammar::examples,
        lr0::{lr0, LR0Item},
    };
    use SymbolID::*;

    fn compute(g: &Grammar) -> (LR0Automaton, LookaheadAndLayoutSets) {
        let ctx = ContextSets::new(g);
        let lr0 = lr0(g);
        let sets = build(g, &ctx, &lr0);
        eprintln!("{}", sets.display(g, &lr0));
        (lr0, sets)
    }

    fn terminals(g: &Grammar, names: &[&str]) -> TerminalSet {
        names
            .iter()
            .map(|name| match *name {
                "#EOI" => TerminalID::EOI,
                name => g.terminal_by_name(name).unwrap(),
            })
            .collect()
    }

    fn layouts(g: &Grammar, names: &[&str]) -> LayoutSet {
        names
            .iter()
            .map(|name| g.layout_by_name(name).unwrap())
            .collect()
    }

    /// Find the index of the item `left -> right[..position] . right[position..]`.
    fn find_item(
        g: &Grammar,
        lr0: &LR0Automaton,
        state: StateID,
        left: &str,
        right: &[SymbolID],
        position: u16,
    ) -> usize {
        lr0.item_set(state)
            .iter()
            .position(|LR0Item { production, position: p }| {
                let production = g.production(*production);
                *p == position
                    && g.nonterminals[&production.left] == left
                    && production.right == right
            })
            .unwrap_or_else(|| panic!("missing item in {:?}", state))
    }

    #[test]
    fn lookaheads_of_expression_grammar() {
        let g = Grammar::define(examples::expression).unwrap();
        let (lr0, sets) = compute(&g);

        let s = g.nonterminal_by_name("S").unwrap();
        let e = g.nonterminal_by_name("E").unwrap();
        let t = g.nonterminal_by_name("T").unwrap();
        let plus = g.terminal_by_name("`+`").unwrap();
        let id = g.terminal_by_name("ID").unwrap();

        let start = StateID::START;
        assert!(sets.lookahead(start, 0).is_empty());

        let i = find_item(&g, &lr0, start, "S", &[N(e)], 0);
        assert_eq!(*sets.lookahead(start, i), terminals(&g, &["#EOI"]));

        let follow_t = terminals(&g, &["`+`", "#EOI"]);
        let i = find_item(&g, &lr0, start, "T", &[T(id)], 0);
        assert_eq!(*sets.lookahead(start, i), follow_t);
        let i = find_item(&g, &lr0, start, "E", &[N(t)], 0);
        assert_eq!(*sets.lookahead(start, i), follow_t);
        let i = find_item(&g, &lr0, start, "E", &[N(e), T(plus), N(t)], 0);
        assert_eq!(*sets.lookahead(start, i), follow_t);

        // T -> [ ID . ] is reached from both the start state and E -> [ E + . T ].
        let reduce = lr0.transition(start, T(id));
        assert_eq!(*sets.lookahead(reduce, 0), follow_t);

        let accepted = lr0.transition(start, N(s));
        assert!(sets.lookahead(accepted, 0).is_empty());
        assert_eq!(sets.max_item_count(), lr0.max_item_count());
    }

    #[test]
    fn lookaheads_are_merged_between_isocores() {
        let g = Grammar::define(examples::fig1).unwrap();
        let (lr0, sets) = compute(&g);

        let a = g.terminal_by_name("a").unwrap();
        let b = g.terminal_by_name("b").unwrap();

        let after_aa = lr0.transition(lr0.transition(StateID::START, T(a)), T(a));
        let after_ba = lr0.transition(lr0.transition(StateID::START, T(b)), T(a));
        assert_eq!(after_aa, after_ba);

        let i = find_item(&g, &lr0, after_aa, "A", &[T(a)], 1);
        assert_eq!(*sets.lookahead(after_aa, i), terminals(&g, &["a", "b"]));
    }

    #[test]
    fn lookahead_is_forwarded_through_nullable_tail() {
        let g = Grammar::define(examples::nullable_tail).unwrap();
        let (lr0, sets) = compute(&g);

        let b = g.terminal_by_name("b").unwrap();
        let c = g.terminal_by_name("c").unwrap();
        let cn = g.nonterminal_by_name("C").unwrap();

        let state = lr0.transition(StateID::START, T(b));
        let caller = find_item(&g, &lr0, state, "A", &[T(b), N(cn)], 1);
        assert_eq!(*sets.lookahead(state, caller), terminals(&g, &["d"]));

        for right in [&[][..], &[T(c)][..]] {
            let entry = find_item(&g, &lr0, state, "C", right, 0);
            assert!(sets
                .lookahead(state, caller)
                .is_subset(sets.lookahead(state, entry)));
        }
    }

    #[test]
    fn start_layout_reaches_every_state() {
        let g = Grammar::define(|g| {
            let ws = g.layout("WS")?;
            let id = g.terminal("ID")?;
            let s = g.nonterminal("S")?;
            let e = g.nonterminal("E")?;
            let t = g.nonterminal("T")?;
            g.start_layout([ws])?;
            g.production([], s, [N(e)])?;
            g.production([], e, [N(t)])?;
            g.production([], t, [T(id)])?;
            Ok(())
        })
        .unwrap();
        let ws = layouts(&g, &["WS"]);

        let ctx = ContextSets::new(&g);
        let lr0 = lr0(&g);
        let mut builder = Builder::new(&g, &ctx, &lr0);
        builder.sweep();
        assert_eq!(*builder.table.layout(StateID::START), ws);

        while builder.sweep() {}
        let sets = builder.finish();
        for (id, _) in lr0.states() {
            assert_eq!(*sets.layout(id), ws, "layout of {:?}", id);
        }
    }

    #[test]
    fn no_layout_without_declarations() {
        let g = Grammar::define(examples::nullable_tail).unwrap();
        let (lr0, sets) = compute(&g);
        for (id, _) in lr0.states() {
            assert!(sets.layout(id).is_empty());
        }
    }

    #[test]
    fn embedded_grammar_keeps_its_own_layout() {
        let g = Grammar::define(examples::composed).unwrap();
        let (lr0, sets) = compute(&g);

        let r#let = g.terminal_by_name("`let`").unwrap();
        let ident = g.terminal_by_name("IDENT").unwrap();
        let equal = g.terminal_by_name("`=`").unwrap();
        let select = g.terminal_by_name("`select`").unwrap();

        let mut state = StateID::START;
        assert_eq!(*sets.layout(state), layouts(&g, &["WS"]));

        let stmts = g.nonterminal_by_name("stmts").unwrap();
        state = lr0.transition(state, N(stmts));
        for symbol in [T(r#let), T(ident), T(equal)] {
            state = lr0.transition(state, symbol);
            assert_eq!(*sets.layout(state), layouts(&g, &["WS"]));
        }

        // Only comments may appear between the tokens of a query.
        let in_query = lr0.transition(state, T(select));
        assert_eq!(*sets.layout(in_query), layouts(&g, &["COMMENT"]));

        // The query may end after a column, and then the host layout applies.
        let after_column = lr0.transition(in_query, T(ident));
        assert_eq!(*sets.layout(after_column), layouts(&g, &["COMMENT", "WS"]));
    }

    #[test]
    fn sets_grow_monotonically() {
        for (name, example) in examples::ALL {
            let g = Grammar::define(*example).unwrap();
            let ctx = ContextSets::new(&g);
            let lr0 = lr0(&g);
            let mut builder = Builder::new(&g, &ctx, &lr0);

            let snapshot = |builder: &Builder<'_>| {
                (
                    builder.table.clone(),
                    builder.beginning_layouts.clone(),
                    builder.lookahead_layouts.clone(),
                )
            };
            // Every sweep but the last one grows at least one set.
            let max_sweeps = 1 + lr0.len()
                * lr0.max_item_count()
                * (g.terminals.len() + 2 * g.layouts.len());
            let mut last = snapshot(&builder);
            let mut sweeps = 0;
            loop {
                let more = builder.sweep();
                sweeps += 1;
                let current = snapshot(&builder);
                for (id, state) in lr0.states() {
                    let s = id.index();
                    assert!(last.0.layout(id).is_subset(current.0.layout(id)), "{}", name);
                    for i in 0..state.items.len() {
                        assert!(
                            last.0.lookahead(id, i).is_subset(current.0.lookahead(id, i)),
                            "{}",
                            name
                        );
                        assert!(last.1[s][i].is_subset(&current.1[s][i]), "{}", name);
                        assert!(last.2[s][i].is_subset(&current.2[s][i]), "{}", name);
                    }
                }
                last = current;
                if !more {
                    break;
                }
                assert!(sweeps <= max_sweeps, "{}", name);
            }
        }
    }

    #[test]
    fn source_and_dest_borrow_disjoint_items() {
        let mut rows = vec![vec![0, 1, 2], vec![10, 11]];

        let (src, dst) = source_and_dest(&mut rows, (0, 2), (0, 0));
        *dst += *src;
        let (src, dst) = source_and_dest(&mut rows, (0, 0), (0, 1));
        *dst += *src;
        let (src, dst) = source_and_dest(&mut rows, (1, 1), (0, 2));
        *dst += *src;
        let (src, dst) = source_and_dest(&mut rows, (0, 1), (1, 0));
        *dst += *src;

        assert_eq!(rows, vec![vec![2, 3, 13], vec![13, 11]]);
    }

    #[test]
    #[should_panic(expected = "cannot be advanced into itself")]
    fn source_and_dest_rejects_same_item() {
        let mut rows = vec![vec![0, 1]];
        source_and_dest(&mut rows, (0, 1), (0, 1));
    }

    #[test]
    fn lookaheads_flow_along_self_loops() {
        let g = Grammar::define(examples::arithmetic).unwrap();
        let (lr0, sets) = compute(&g);

        // The state after `(` shifts `(` into itself.
        let lparen = g.terminal_by_name("`(`").unwrap();
        let nested = lr0.transition(StateID::START, T(lparen));
        assert_eq!(lr0.transition(nested, T(lparen)), nested);

        for &(source, dest) in lr0.goto_items(nested, T(lparen)) {
            assert!(sets
                .lookahead(nested, source)
                .is_subset(sets.lookahead(nested, dest)));
        }
        let rparen = terminals(&g, &["`)`"]);
        assert!(lr0
            .item_set(nested)
            .iter()
            .enumerate()
            .filter(|(_, item)| item.position == 1)
            .all(|(i, _)| rparen.is_subset(sets.lookahead(nested, i))));
    }

    #[test]
    fn finished_sets_are_stable() {
        let g = Grammar::define(examples::arithmetic).unwrap();
        let ctx = ContextSets::new(&g);
        let lr0 = lr0(&g);
        let sets = build(&g, &ctx, &lr0);

        // Revisiting every item of every state changes nothing.
        let mut builder = Builder::new(&g, &ctx, &lr0);
        while builder.sweep() {}
        for (id, state) in lr0.states() {
            for i in 0..state.items.len() {
                builder.last.mark(id, i);
            }
        }
        assert!(!builder.sweep());
        let revisited = builder.finish();
        for (id, state) in lr0.states() {
            assert_eq!(sets.layout(id), revisited.layout(id));
            for i in 0..state.items.len() {
                assert_eq!(sets.lookahead(id, i), revisited.lookahead(id, i));
            }
        }
    }

    #[test]
    #[should_panic(expected = "the start state must begin with")]
    fn foreign_automaton_fails_fast() {
        let g = Grammar::define(examples::expression).unwrap();
        let ctx = ContextSets::new(&g);
        let mut lr0 = lr0(&g);
        lr0.states_mut()[0].items.swap(0, 1);
        build(&g, &ctx, &lr0);
    }
}
