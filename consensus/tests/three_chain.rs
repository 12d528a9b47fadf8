//! End-to-end commit pipeline: genesis at height 0, three real blocks, and
//! the depth-2 three-chain rule firing on the third justification.

use std::collections::BTreeMap;
use std::sync::Arc;

use weft_committee::{sign_vote, Committee, LeaderStrategy, RoundRobinLeaderStrategy};
use weft_consensus::{BlockPhase, ConsensusConfig, ConsensusEngine, ConsensusEvent};
use weft_crypto::keypair_from_seed;
use weft_fees::FeeLedger;
use weft_store::{Block, Command};
use weft_types::{
    Amount, Epoch, KeyPair, Network, NodeHeight, QuorumCertificate, Shard, TransactionId,
};

const EPOCH: Epoch = Epoch::new(1);
const SHARD: Shard = Shard::new(0);

struct TestNet {
    engine: ConsensusEngine<RoundRobinLeaderStrategy>,
    fees: Arc<FeeLedger>,
    keys: Vec<KeyPair>,
    committee: Committee,
}

async fn testnet() -> TestNet {
    let keys: Vec<KeyPair> = (1..=4u8).map(|b| keypair_from_seed(&[b; 32])).collect();
    let committee = Committee::from_public_keys(keys.iter().map(|kp| kp.public));
    let fees = Arc::new(FeeLedger::new());
    let engine = ConsensusEngine::new(
        ConsensusConfig::default(),
        Network::Local,
        RoundRobinLeaderStrategy,
        Arc::clone(&fees),
    );
    engine.register_committee(EPOCH, SHARD, committee.clone()).await;
    TestNet {
        engine,
        fees,
        keys,
        committee,
    }
}

impl TestNet {
    fn leader_for(&self, height: NodeHeight) -> &KeyPair {
        let leader = RoundRobinLeaderStrategy
            .leader(&self.committee, height)
            .public_key;
        self.keys.iter().find(|kp| kp.public == leader).unwrap()
    }

    /// QC with 3 of 4 committee signatures — exactly quorum.
    fn qc_for(&self, block: &Block) -> QuorumCertificate {
        let signatures = self.keys[..3]
            .iter()
            .map(|kp| {
                sign_vote(
                    &kp.private,
                    kp.public,
                    block.id(),
                    block.height(),
                    EPOCH,
                    SHARD,
                )
            })
            .collect();
        QuorumCertificate::new(*block.id(), block.height(), EPOCH, SHARD, signatures)
    }

    async fn submit(
        &self,
        parent: &Block,
        justify: QuorumCertificate,
        commands: Vec<Command>,
        fee: Amount,
    ) -> Block {
        let leader = self.leader_for(parent.height().next());
        let mut block = self
            .engine
            .propose(
                &leader.public,
                parent.id(),
                justify,
                EPOCH,
                commands,
                BTreeMap::new(),
                fee,
            )
            .await
            .unwrap();
        block.sign(&leader.private);
        self.engine.receive_block(block.clone()).await.unwrap();
        block
    }
}

#[tokio::test]
async fn three_chain_commits_block_a_with_leader_fee() {
    let net = testnet().await;
    let mut events = net.engine.subscribe();

    // Genesis: height 0, committed at startup.
    let genesis_id = net.engine.init_genesis(EPOCH, SHARD).await.unwrap();
    let genesis = net.engine.get_block(&genesis_id).await.unwrap();
    assert!(genesis.is_committed());
    assert_eq!(genesis.height(), NodeHeight::new(0));

    // Block A: height 1, one command, leader fee 10.
    let tx = TransactionId::new([1; 32]);
    let a = net
        .submit(
            &genesis,
            QuorumCertificate::genesis(EPOCH, SHARD),
            vec![Command::new(tx, b"transfer".to_vec())],
            Amount::new(10),
        )
        .await;
    let qc_a = net.qc_for(&a);
    assert!(net.engine.justify(a.id(), qc_a.clone()).await.unwrap().is_empty());
    net.engine.process(a.id()).await.unwrap();

    // Block B at height 2, justified the same way.
    let b = net.submit(&a, qc_a, Vec::new(), Amount::ZERO).await;
    let qc_b = net.qc_for(&b);
    assert!(net.engine.justify(b.id(), qc_b.clone()).await.unwrap().is_empty());

    // Block C at height 3: its justification is the second hop above A,
    // so A commits now — and only A.
    let c = net.submit(&b, qc_b, Vec::new(), Amount::ZERO).await;
    let committed = net.engine.justify(c.id(), net.qc_for(&c)).await.unwrap();
    assert_eq!(committed, vec![*a.id()]);

    // A's leader earned the fee; B and C stay justified.
    assert_eq!(net.fees.leader_total(a.proposed_by()), Amount::new(10));
    assert_eq!(net.engine.phase(b.id()).await, Some(BlockPhase::Justified));
    assert_eq!(net.engine.phase(c.id()).await, Some(BlockPhase::Justified));

    // Round trip: the stored block matches what was inserted, plus flags.
    let stored = net.engine.get_block(a.id()).await.unwrap();
    assert_eq!(stored.commands(), a.commands());
    assert_eq!(stored.merkle_root(), a.merkle_root());
    assert!(stored.is_processed());
    assert!(stored.is_committed());
    assert!(!stored.is_dummy());
    assert!(stored.stored_at().is_some());

    // The commit event carries the transaction ids and the leader fee.
    match events.recv().await.unwrap() {
        ConsensusEvent::BlockCommitted {
            block_id,
            height,
            transaction_ids,
            total_leader_fee,
            ..
        } => {
            assert_eq!(block_id, *a.id());
            assert_eq!(height, NodeHeight::new(1));
            assert_eq!(transaction_ids, vec![tx]);
            assert_eq!(total_leader_fee, Amount::new(10));
        }
        other => panic!("expected BlockCommitted, got {other:?}"),
    }
}

#[tokio::test]
async fn heights_increase_by_one_including_dummies() {
    let net = testnet().await;
    let genesis_id = net.engine.init_genesis(EPOCH, SHARD).await.unwrap();
    let genesis = net.engine.get_block(&genesis_id).await.unwrap();

    let a = net
        .submit(
            &genesis,
            QuorumCertificate::genesis(EPOCH, SHARD),
            Vec::new(),
            Amount::ZERO,
        )
        .await;
    let qc_a = net.qc_for(&a);
    net.engine.justify(a.id(), qc_a.clone()).await.unwrap();

    let dummy = net.engine.synthesize_dummy(a.id(), qc_a).await.unwrap();
    let b = net.submit(&dummy, net.qc_for(&dummy), Vec::new(), Amount::ZERO).await;

    let mut heights = Vec::new();
    let mut current = net.engine.get_block(b.id()).await.unwrap();
    loop {
        heights.push(current.height().as_u64());
        if current.is_genesis() {
            break;
        }
        current = net.engine.get_block(current.parent()).await.unwrap();
    }
    assert_eq!(heights, vec![3, 2, 1, 0]);
}
