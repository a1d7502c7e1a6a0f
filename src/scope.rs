use crate::namespace::NamespaceId;
use crate::prefix::PrefixId;
use crate::xmlvalue::Prefixes;

/// Prefix bindings in scope while building a tree.
///
/// One frame per open element; lookups walk from the innermost frame
/// outward so the nearest declaration wins.
#[derive(Debug)]
pub(crate) struct ScopeStack {
    frames: Vec<Prefixes>,
}

impl ScopeStack {
    pub(crate) fn new(base: Prefixes) -> Self {
        ScopeStack { frames: vec![base] }
    }

    pub(crate) fn push(&mut self, prefixes: Prefixes) {
        self.frames.push(prefixes);
    }

    pub(crate) fn pop(&mut self) {
        // the base frame always stays
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    pub(crate) fn resolve(&self, prefix_id: PrefixId) -> Option<NamespaceId> {
        self.frames.iter().rev().find_map(|frame| {
            frame
                .iter()
                .rev()
                .find(|(declared, _)| *declared == prefix_id)
                .map(|(_, namespace_id)| *namespace_id)
        })
    }
}
