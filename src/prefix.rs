use crate::idmap::{IdIndex, IdMap};

/// Id uniquely identifying a prefix within a document.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Ord, PartialOrd)]
pub struct PrefixId(u32);

impl IdIndex<PrefixId> for PrefixId {
    fn to_id(index: usize) -> PrefixId {
        PrefixId(index as u32)
    }

    fn from_id(id: PrefixId) -> usize {
        id.0 as usize
    }
}

pub(crate) type PrefixLookup = IdMap<PrefixId, String>;
