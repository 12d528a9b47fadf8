//! The consensus block: an immutable, content-addressed record of ordered
//! commands, justified by a quorum certificate over its ancestry.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use weft_crypto::{blake2b_256_multi, merkle_root, public_from_private, sign_message, verify_signature};
use weft_types::{
    Amount, BlockId, Epoch, Network, NodeHeight, PrivateKey, PublicKey, QuorumCertificate, Shard,
    Signature, Timestamp, TransactionId,
};

const BLOCK_ID_DOMAIN: &[u8] = b"weft.block.v1";
const BLOCK_SIG_DOMAIN: &[u8] = b"weft.block.sig.v1";

/// An opaque ordered instruction carried by a block. Execution semantics are
/// a collaborator concern; consensus only orders and commits them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub transaction_id: TransactionId,
    pub payload: Vec<u8>,
}

impl Command {
    pub fn new(transaction_id: TransactionId, payload: Vec<u8>) -> Self {
        Self {
            transaction_id,
            payload,
        }
    }

    fn leaf_hash(&self) -> [u8; 32] {
        blake2b_256_multi(&[b"weft.command.v1", self.transaction_id.as_bytes(), &self.payload])
    }
}

/// Leader signature over a block id. Ed25519: the first 32 signature bytes
/// are the public nonce, the rest the response scalar.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSignature {
    pub signer: PublicKey,
    pub signature: Signature,
}

/// A block in the shard's chain.
///
/// Identity (the id hash) covers every field except the three post-creation
/// mutables: `is_processed`, `is_committed`, and `stored_at`. Those flags
/// are only ever mutated through the owning [`BlockStore`](crate::BlockStore).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    id: BlockId,
    network: Network,
    parent: BlockId,
    justify: QuorumCertificate,
    height: NodeHeight,
    epoch: Epoch,
    shard: Shard,
    proposed_by: PublicKey,
    total_leader_fee: Amount,
    merkle_root: [u8; 32],
    commands: Vec<Command>,
    is_dummy: bool,
    is_processed: bool,
    is_committed: bool,
    foreign_indexes: BTreeMap<Shard, u64>,
    stored_at: Option<Timestamp>,
    signature: Option<BlockSignature>,
}

impl Block {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        network: Network,
        parent: BlockId,
        justify: QuorumCertificate,
        height: NodeHeight,
        epoch: Epoch,
        shard: Shard,
        proposed_by: PublicKey,
        commands: Vec<Command>,
        foreign_indexes: BTreeMap<Shard, u64>,
        total_leader_fee: Amount,
    ) -> Self {
        let mut block = Self {
            id: BlockId::ZERO,
            network,
            parent,
            justify,
            height,
            epoch,
            shard,
            proposed_by,
            total_leader_fee,
            merkle_root: merkle_root(&commands.iter().map(Command::leaf_hash).collect::<Vec<_>>()),
            commands,
            is_dummy: false,
            is_processed: false,
            is_committed: false,
            foreign_indexes,
            stored_at: None,
            signature: None,
        };
        block.id = block.calculate_id();
        block
    }

    /// The root block of a shard's chain: height 0, self-justified,
    /// committed from the start.
    pub fn genesis(network: Network, epoch: Epoch, shard: Shard) -> Self {
        let mut block = Self {
            id: BlockId::ZERO,
            network,
            parent: BlockId::ZERO,
            justify: QuorumCertificate::genesis(epoch, shard),
            height: NodeHeight::ZERO,
            epoch,
            shard,
            proposed_by: PublicKey::ZERO,
            total_leader_fee: Amount::ZERO,
            merkle_root: [0u8; 32],
            commands: Vec::new(),
            is_dummy: false,
            is_processed: true,
            is_committed: true,
            foreign_indexes: BTreeMap::new(),
            stored_at: None,
            signature: None,
        };
        block.id = block.calculate_id();
        block
    }

    /// A placeholder filling a height no leader proposed at. Carries no
    /// commands, earns no fee, and is never signed; it still requires
    /// justification like any other block.
    pub fn dummy(parent: &Block, justify: QuorumCertificate, proposed_by: PublicKey) -> Self {
        let mut block = Self {
            id: BlockId::ZERO,
            network: parent.network,
            parent: parent.id,
            justify,
            height: parent.height.next(),
            epoch: parent.epoch,
            shard: parent.shard,
            proposed_by,
            total_leader_fee: Amount::ZERO,
            merkle_root: [0u8; 32],
            commands: Vec::new(),
            is_dummy: true,
            is_processed: false,
            is_committed: false,
            foreign_indexes: BTreeMap::new(),
            stored_at: None,
            signature: None,
        };
        block.id = block.calculate_id();
        block
    }

    /// Content-derived identifier over the block's canonical encoding.
    fn calculate_id(&self) -> BlockId {
        let mut justify_bytes = Vec::with_capacity(64 + self.justify.signatures().len() * 96);
        justify_bytes.extend_from_slice(self.justify.block_id().as_bytes());
        justify_bytes.extend_from_slice(&self.justify.block_height().as_u64().to_le_bytes());
        justify_bytes.extend_from_slice(&self.justify.epoch().as_u64().to_le_bytes());
        justify_bytes.extend_from_slice(&self.justify.shard().as_u32().to_le_bytes());
        for sig in self.justify.signatures() {
            justify_bytes.extend_from_slice(sig.public_key.as_bytes());
            justify_bytes.extend_from_slice(sig.signature.as_bytes());
        }

        let mut foreign_bytes = Vec::with_capacity(self.foreign_indexes.len() * 12);
        for (shard, index) in &self.foreign_indexes {
            foreign_bytes.extend_from_slice(&shard.as_u32().to_le_bytes());
            foreign_bytes.extend_from_slice(&index.to_le_bytes());
        }

        BlockId::new(blake2b_256_multi(&[
            BLOCK_ID_DOMAIN,
            &[self.network.as_byte()],
            self.parent.as_bytes(),
            &justify_bytes,
            &self.height.as_u64().to_le_bytes(),
            &self.epoch.as_u64().to_le_bytes(),
            &self.shard.as_u32().to_le_bytes(),
            self.proposed_by.as_bytes(),
            &self.total_leader_fee.raw().to_le_bytes(),
            &self.merkle_root,
            &[u8::from(self.is_dummy)],
            &foreign_bytes,
        ]))
    }

    /// Attach the leader's signature over this block's id.
    pub fn sign(&mut self, private_key: &PrivateKey) {
        let signer = public_from_private(private_key);
        let message = blake2b_256_multi(&[BLOCK_SIG_DOMAIN, self.id.as_bytes()]);
        self.signature = Some(BlockSignature {
            signer,
            signature: sign_message(&message, private_key),
        });
    }

    /// Whether the attached signature is present, from the proposer, and
    /// valid over this block's id.
    pub fn verify_leader_signature(&self) -> bool {
        let Some(sig) = &self.signature else {
            return false;
        };
        if sig.signer != self.proposed_by {
            return false;
        }
        let message = blake2b_256_multi(&[BLOCK_SIG_DOMAIN, self.id.as_bytes()]);
        verify_signature(&message, &sig.signature, &sig.signer)
    }

    pub fn id(&self) -> &BlockId {
        &self.id
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn parent(&self) -> &BlockId {
        &self.parent
    }

    pub fn justify(&self) -> &QuorumCertificate {
        &self.justify
    }

    pub fn height(&self) -> NodeHeight {
        self.height
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn shard(&self) -> Shard {
        self.shard
    }

    pub fn proposed_by(&self) -> &PublicKey {
        &self.proposed_by
    }

    pub fn total_leader_fee(&self) -> Amount {
        self.total_leader_fee
    }

    pub fn merkle_root(&self) -> &[u8; 32] {
        &self.merkle_root
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn transaction_ids(&self) -> impl Iterator<Item = &TransactionId> {
        self.commands.iter().map(|c| &c.transaction_id)
    }

    pub fn is_dummy(&self) -> bool {
        self.is_dummy
    }

    pub fn is_processed(&self) -> bool {
        self.is_processed
    }

    pub fn is_committed(&self) -> bool {
        self.is_committed
    }

    pub fn is_genesis(&self) -> bool {
        self.height.is_zero()
    }

    pub fn foreign_indexes(&self) -> &BTreeMap<Shard, u64> {
        &self.foreign_indexes
    }

    pub fn stored_at(&self) -> Option<Timestamp> {
        self.stored_at
    }

    pub fn signature(&self) -> Option<&BlockSignature> {
        self.signature.as_ref()
    }

    pub(crate) fn set_processed(&mut self) {
        self.is_processed = true;
    }

    pub(crate) fn set_committed(&mut self) {
        self.is_committed = true;
    }

    pub(crate) fn set_stored_at(&mut self, timestamp: Timestamp) {
        self.stored_at = Some(timestamp);
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {} command(s){}, {}]",
            self.height,
            self.epoch,
            self.shard,
            self.commands.len(),
            if self.is_dummy { ", dummy" } else { "" },
            self.id,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_crypto::keypair_from_seed;

    fn cmd(byte: u8) -> Command {
        Command::new(TransactionId::new([byte; 32]), vec![byte])
    }

    fn genesis() -> Block {
        Block::genesis(Network::Local, Epoch::new(1), Shard::new(0))
    }

    fn child_of(parent: &Block, commands: Vec<Command>) -> Block {
        Block::new(
            parent.network(),
            *parent.id(),
            QuorumCertificate::genesis(parent.epoch(), parent.shard()),
            parent.height().next(),
            parent.epoch(),
            parent.shard(),
            PublicKey([7; 32]),
            commands,
            BTreeMap::new(),
            Amount::new(10),
        )
    }

    #[test]
    fn id_is_deterministic() {
        let g = genesis();
        let a = child_of(&g, vec![cmd(1), cmd(2)]);
        let b = child_of(&g, vec![cmd(1), cmd(2)]);
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn command_order_changes_id() {
        let g = genesis();
        let a = child_of(&g, vec![cmd(1), cmd(2)]);
        let b = child_of(&g, vec![cmd(2), cmd(1)]);
        assert_ne!(a.merkle_root(), b.merkle_root());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn flags_do_not_affect_id() {
        let g = genesis();
        let mut a = child_of(&g, vec![cmd(1)]);
        let id = *a.id();
        a.set_processed();
        a.set_committed();
        a.set_stored_at(Timestamp::new(42));
        assert_eq!(a.id(), &id);
    }

    #[test]
    fn genesis_is_committed_and_processed() {
        let g = genesis();
        assert!(g.is_genesis());
        assert!(g.is_processed());
        assert!(g.is_committed());
        assert!(g.justify().is_genesis());
        assert!(g.parent().is_zero());
        assert_eq!(g.total_leader_fee(), Amount::ZERO);
    }

    #[test]
    fn dummy_sits_directly_above_parent() {
        let g = genesis();
        let d = Block::dummy(
            &g,
            QuorumCertificate::genesis(g.epoch(), g.shard()),
            PublicKey([3; 32]),
        );
        assert!(d.is_dummy());
        assert_eq!(d.height(), g.height().next());
        assert_eq!(d.parent(), g.id());
        assert!(d.commands().is_empty());
        assert_eq!(d.total_leader_fee(), Amount::ZERO);
        assert!(d.signature().is_none());
    }

    #[test]
    fn sign_and_verify_leader_signature() {
        let kp = keypair_from_seed(&[5; 32]);
        let g = genesis();
        let mut block = Block::new(
            g.network(),
            *g.id(),
            QuorumCertificate::genesis(g.epoch(), g.shard()),
            g.height().next(),
            g.epoch(),
            g.shard(),
            kp.public,
            vec![cmd(1)],
            BTreeMap::new(),
            Amount::ZERO,
        );
        assert!(!block.verify_leader_signature());
        block.sign(&kp.private);
        assert!(block.verify_leader_signature());
    }

    #[test]
    fn signature_from_non_proposer_rejected() {
        let proposer = keypair_from_seed(&[5; 32]);
        let imposter = keypair_from_seed(&[6; 32]);
        let g = genesis();
        let mut block = Block::new(
            g.network(),
            *g.id(),
            QuorumCertificate::genesis(g.epoch(), g.shard()),
            g.height().next(),
            g.epoch(),
            g.shard(),
            proposer.public,
            vec![cmd(1)],
            BTreeMap::new(),
            Amount::ZERO,
        );
        block.sign(&imposter.private);
        assert!(!block.verify_leader_signature());
    }

    #[test]
    fn foreign_indexes_change_id() {
        let g = genesis();
        let plain = child_of(&g, vec![cmd(1)]);

        let mut indexes = BTreeMap::new();
        indexes.insert(Shard::new(2), 5u64);
        let with_foreign = Block::new(
            g.network(),
            *g.id(),
            QuorumCertificate::genesis(g.epoch(), g.shard()),
            g.height().next(),
            g.epoch(),
            g.shard(),
            PublicKey([7; 32]),
            vec![cmd(1)],
            indexes,
            Amount::new(10),
        );
        assert_ne!(plain.id(), with_foreign.id());
    }
}
