use crate::idmap::{IdIndex, IdMap};

/// Id uniquely identifying a namespace URI within a document.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct NamespaceId(u32);

impl IdIndex<NamespaceId> for NamespaceId {
    fn to_id(index: usize) -> NamespaceId {
        NamespaceId(index as u32)
    }

    fn from_id(id: NamespaceId) -> usize {
        id.0 as usize
    }
}

pub(crate) type NamespaceLookup = IdMap<NamespaceId, String>;

pub(crate) const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
