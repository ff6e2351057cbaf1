//! LR(0) automaton whose states are annotated by the look-ahead builder.

use crate::{
    grammar::{Grammar, NonterminalID, ProductionID, SymbolID, TerminalID},
    types::{Map, Set},
    util::display_fn,
};
use std::{collections::VecDeque, fmt};

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateID(u16);
impl fmt::Debug for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S#{:03}", self.0)
    }
}
impl StateID {
    pub const START: Self = Self(0);

    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub fn index(self) -> usize {
        self.0.into()
    }
}

/// The LR(0) item, a.k.a. LR item core.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LR0Item {
    pub production: ProductionID,
    /// The position of the dot in the right-hand side of the production.
    pub position: u16,
}
impl LR0Item {
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(|f| {
            let production = g.production(self.production);
            write!(f, "{} -> [", g.nonterminals[&production.left])?;
            for (i, r) in production.right.iter().enumerate() {
                if i == self.position as usize {
                    f.write_str(" .")?;
                }
                write!(f, " {}", g.symbol_name(*r))?;
            }
            if production.right.len() == self.position as usize {
                f.write_str(" .")?;
            }
            f.write_str(" ]")
        })
    }
}

#[derive(Debug, Clone)]
pub struct LR0State {
    /// The kernel items in sorted order, followed by the closure items.
    pub items: Vec<LR0Item>,
    pub kernel_len: usize,
    pub transitions: Map<SymbolID, StateID>,
    /// Pairs of `(source item, destination item)` advanced by each transition.
    pub goto_items: Map<SymbolID, Vec<(usize, usize)>>,
}

impl LR0State {
    pub fn kernels(&self) -> &[LR0Item] {
        &self.items[..self.kernel_len]
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(|f| {
            writeln!(f, "## items:")?;
            for (i, item) in self.items.iter().enumerate() {
                let mark = if i < self.kernel_len { "*" } else { "-" };
                writeln!(f, "{} [{}] {}", mark, i, item.display(g))?;
            }
            if !self.transitions.is_empty() {
                writeln!(f, "## transitions:")?;
                for (symbol, to) in &self.transitions {
                    writeln!(f, "- {} => {:?}", g.symbol_name(*symbol), to)?;
                }
            }
            Ok(())
        })
    }
}

#[derive(Debug)]
pub struct LR0Automaton {
    states: Vec<LR0State>,
}

impl LR0Automaton {
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn states(&self) -> impl Iterator<Item = (StateID, &LR0State)> + '_ {
        self.states
            .iter()
            .enumerate()
            .map(|(i, state)| (StateID(i as u16), state))
    }

    #[cfg(test)]
    pub(crate) fn states_mut(&mut self) -> &mut [LR0State] {
        &mut self.states
    }

    pub fn state(&self, id: StateID) -> &LR0State {
        &self.states[id.index()]
    }

    pub fn item_set(&self, id: StateID) -> &[LR0Item] {
        &self.state(id).items
    }

    /// The destination of the transition from `id` on `symbol`.
    pub fn transition(&self, id: StateID, symbol: SymbolID) -> StateID {
        match self.state(id).transitions.get(&symbol) {
            Some(to) => *to,
            None => panic!("missing transition: {:?} --({:?})-->", id, symbol),
        }
    }

    pub fn goto_items(&self, id: StateID, symbol: SymbolID) -> &[(usize, usize)] {
        match self.state(id).goto_items.get(&symbol) {
            Some(pairs) => pairs,
            None => panic!("missing transition: {:?} --({:?})-->", id, symbol),
        }
    }

    /// The largest number of items held by a single state.
    pub fn max_item_count(&self) -> usize {
        self.states
            .iter()
            .map(|state| state.items.len())
            .max()
            .unwrap_or(0)
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(|f| {
            for (id, state) in self.states() {
                writeln!(f, "#### {:?}", id)?;
                write!(f, "{}", state.display(g))?;
            }
            Ok(())
        })
    }
}

/// Calculate the LR(0) automaton based on the specified grammar.
#[tracing::instrument(skip_all)]
pub fn lr0(g: &Grammar) -> LR0Automaton {
    let nonkernels = nonkernels(g);

    let mut states = Vec::<LR0State>::new();
    let mut state_id = {
        let mut next_state_id: u16 = 0;
        move || {
            let id = StateID(next_state_id);
            next_state_id = next_state_id
                .checked_add(1)
                .expect("too many LR(0) states");
            id
        }
    };

    let start_kernel = vec![LR0Item {
        production: ProductionID::ACCEPT,
        position: 0,
    }];
    let mut isocores = Map::<Vec<LR0Item>, StateID>::default();
    let mut pending_states = VecDeque::<(StateID, Vec<LR0Item>)>::new();
    let start = state_id();
    isocores.insert(start_kernel.clone(), start);
    pending_states.push_back((start, start_kernel));

    let mut new_kernels = Map::<SymbolID, Vec<(usize, LR0Item)>>::default();
    while let Some((current, kernels)) = pending_states.pop_front() {
        debug_assert_eq!(current.index(), states.len());

        let mut items: Set<LR0Item> = kernels.iter().copied().collect();
        for kernel in &kernels {
            let production = g.production(kernel.production);
            if let Some(SymbolID::N(n)) = production.right.get(usize::from(kernel.position)) {
                items.extend(nonkernels[n].iter().copied());
            }
        }
        let items: Vec<LR0Item> = items.into_iter().collect();

        new_kernels.clear();
        for (i, item) in items.iter().enumerate() {
            let production = g.production(item.production);
            match production.right.get(usize::from(item.position)) {
                // The input is accepted on the end of input; no state follows.
                Some(SymbolID::T(TerminalID::EOI)) | None => (),
                Some(symbol) => {
                    new_kernels.entry(*symbol).or_default().push((
                        i,
                        LR0Item {
                            position: item.position + 1,
                            ..*item
                        },
                    ));
                }
            }
        }

        let mut transitions = Map::default();
        let mut goto_items = Map::default();
        for (symbol, mut advanced) in new_kernels.drain(..) {
            advanced.sort_by_key(|(_, item)| *item);
            let new_kernel: Vec<_> = advanced.iter().map(|(_, item)| *item).collect();
            let next = match isocores.get(&new_kernel) {
                Some(id) => *id,
                None => {
                    let id = state_id();
                    isocores.insert(new_kernel.clone(), id);
                    pending_states.push_back((id, new_kernel));
                    id
                }
            };
            // Kernel items are placed first in the destination state.
            let pairs = advanced
                .iter()
                .enumerate()
                .map(|(dest, (source, _))| (*source, dest))
                .collect();
            transitions.insert(symbol, next);
            goto_items.insert(symbol, pairs);
        }

        states.push(LR0State {
            kernel_len: kernels.len(),
            items,
            transitions,
            goto_items,
        });
    }

    tracing::trace!("number of LR(0) states = {}", states.len());
    LR0Automaton { states }
}

/// The closure items reachable from `N -> . ...` for each nonterminal `N`.
fn nonkernels(g: &Grammar) -> Map<NonterminalID, Set<LR0Item>> {
    let entries = |n: NonterminalID| {
        g.productions
            .iter()
            .filter(move |(_, p)| p.left == n)
            .map(|(id, _)| LR0Item {
                production: *id,
                position: 0,
            })
    };

    let mut nonkernels: Map<NonterminalID, Set<LR0Item>> = Map::default();
    for &n in g.nonterminals.keys() {
        let mut items: Set<LR0Item> = entries(n).collect();
        let mut i = 0;
        while i < items.len() {
            let production = g.production(items[i].production);
            if let Some(SymbolID::N(m)) = production.right.first() {
                let added: Vec<_> = entries(*m).collect();
                items.extend(added);
            }
            i += 1;
        }
        nonkernels.insert(n, items);
    }
    nonkernels
}
