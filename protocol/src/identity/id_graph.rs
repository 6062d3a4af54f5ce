//! # ID Graph
//!
//! The set of identities linked to a primary identity, as the enclave stores
//! it. Entries are ordered by `link_block`; the graph hash is blake2-256 over
//! the encoded, ordered list.
//!
//! Mutation results only carry the entries that changed. To check a shipped
//! graph hash against a delta, [`IdGraph::merge`] the delta into the graph the
//! caller already knows and hash the result.

use parity_scale_codec::{Decode, Encode};

use crate::crypto::{blake2_256, to_prefixed_hex};
use crate::identity::types::{Identity, Web3Network};
use crate::H256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Encode, Decode)]
pub enum IdentityStatus {
    #[default]
    #[codec(index = 0)]
    Active,
    #[codec(index = 1)]
    Inactive,
}

/// Per-identity state inside a graph.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct IdentityContext {
    /// Sidechain block at which the identity was linked.
    pub link_block: u32,
    /// Networks the identity is active on. Empty for web2 identities.
    pub web3networks: Vec<Web3Network>,
    pub status: IdentityStatus,
}

impl IdentityContext {
    pub fn new(link_block: u32, web3networks: Vec<Web3Network>) -> Self {
        Self {
            link_block,
            web3networks,
            status: IdentityStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == IdentityStatus::Active
    }
}

/// Ordered `(Identity, IdentityContext)` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Encode, Decode)]
pub struct IdGraph(pub Vec<(Identity, IdentityContext)>);

impl IdGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Identity, IdentityContext)> {
        self.0.iter()
    }

    pub fn identities(&self) -> impl Iterator<Item = &Identity> {
        self.0.iter().map(|(id, _)| id)
    }

    pub fn get(&self, identity: &Identity) -> Option<&IdentityContext> {
        self.0.iter().find(|(id, _)| id == identity).map(|(_, ctx)| ctx)
    }

    pub fn get_mut(&mut self, identity: &Identity) -> Option<&mut IdentityContext> {
        self.0
            .iter_mut()
            .find(|(id, _)| id == identity)
            .map(|(_, ctx)| ctx)
    }

    pub fn contains(&self, identity: &Identity) -> bool {
        self.get(identity).is_some()
    }

    /// Insert or replace an entry, keeping the graph ordered.
    pub fn upsert(&mut self, identity: Identity, context: IdentityContext) {
        match self.get_mut(&identity) {
            Some(existing) => *existing = context,
            None => self.0.push((identity, context)),
        }
        self.sort();
    }

    /// Stable sort by `link_block`. Entries linked in the same block keep
    /// their relative order.
    pub fn sort(&mut self) {
        self.0.sort_by_key(|(_, ctx)| ctx.link_block);
    }

    /// Apply a mutation delta: every entry in `delta` replaces the entry for
    /// the same identity, or is appended if new.
    pub fn merge(&mut self, delta: &IdGraph) {
        for (identity, context) in delta.iter() {
            match self.get_mut(identity) {
                Some(existing) => *existing = context.clone(),
                None => self.0.push((identity.clone(), context.clone())),
            }
        }
        self.sort();
    }

    /// blake2-256 over the encoded graph.
    pub fn hash(&self) -> H256 {
        self.using_encoded(blake2_256)
    }

    /// [`IdGraph::hash`] as `0x` hex.
    pub fn hash_hex(&self) -> String {
        to_prefixed_hex(&self.hash())
    }
}

impl FromIterator<(Identity, IdentityContext)> for IdGraph {
    fn from_iter<T: IntoIterator<Item = (Identity, IdentityContext)>>(iter: T) -> Self {
        let mut graph = IdGraph(iter.into_iter().collect());
        graph.sort();
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::types::IdentityString;

    fn alice() -> Identity {
        Identity::Substrate([1; 32])
    }

    fn bob_evm() -> Identity {
        Identity::Evm([2; 20])
    }

    fn twitter() -> Identity {
        Identity::Twitter(IdentityString::new(b"mock_user".to_vec()).unwrap())
    }

    fn sample() -> IdGraph {
        [
            (alice(), IdentityContext::new(1, vec![Web3Network::Litentry])),
            (twitter(), IdentityContext::new(5, vec![])),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_status_indices() {
        assert_eq!(IdentityStatus::Active.encode(), vec![0]);
        assert_eq!(IdentityStatus::Inactive.encode(), vec![1]);
    }

    #[test]
    fn test_graph_encodes_like_a_vec_of_pairs() {
        let graph = sample();
        assert_eq!(graph.encode(), graph.0.encode());
        assert_eq!(graph.hash(), blake2_256(&graph.0.encode()));
    }

    #[test]
    fn test_from_iter_sorts_by_link_block() {
        let graph: IdGraph = [
            (twitter(), IdentityContext::new(9, vec![])),
            (alice(), IdentityContext::new(1, vec![Web3Network::Polkadot])),
        ]
        .into_iter()
        .collect();
        assert_eq!(graph.identities().next(), Some(&alice()));
    }

    #[test]
    fn test_merge_appends_and_replaces() {
        let mut graph = sample();
        let mut delta = IdGraph::new();
        delta.0.push((bob_evm(), IdentityContext::new(7, vec![Web3Network::Ethereum])));
        let mut deactivated = IdentityContext::new(5, vec![]);
        deactivated.status = IdentityStatus::Inactive;
        delta.0.push((twitter(), deactivated));

        graph.merge(&delta);

        assert_eq!(graph.len(), 3);
        assert!(!graph.get(&twitter()).unwrap().is_active());
        assert_eq!(graph.0.last().unwrap().0, bob_evm());
    }

    #[test]
    fn test_hash_changes_with_status() {
        let mut graph = sample();
        let before = graph.hash();
        graph.get_mut(&twitter()).unwrap().status = IdentityStatus::Inactive;
        assert_ne!(before, graph.hash());
    }

    #[test]
    fn test_upsert_keeps_order() {
        let mut graph = sample();
        graph.upsert(bob_evm(), IdentityContext::new(3, vec![Web3Network::Bsc]));
        let order: Vec<_> = graph.identities().cloned().collect();
        assert_eq!(order, vec![alice(), bob_evm(), twitter()]);
    }
}
