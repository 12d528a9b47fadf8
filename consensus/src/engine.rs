//! The consensus state machine.
//!
//! One engine instance drives the local shard replica. All state mutation
//! funnels through a single writer lock; reads of committed history share
//! it. Suspension points (pledge waits, view waits) hold no locks, so a
//! stalled block never delays unrelated blocks or shards.

use crate::pledge::MonotonicWatch;
use crate::{BlockPhase, ConsensusConfig, ConsensusEvent, EngineError};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};
use weft_committee::{validate_qc, Committee, EpochCommitteeRegistry, LeaderStrategy};
use weft_fees::FeeLedger;
use weft_store::{Block, BlockStore, Command};
use weft_types::{
    Amount, BlockId, Epoch, Network, NodeHeight, PublicKey, QuorumCertificate, Shard, Timestamp,
};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// The block commitment engine for one validator.
///
/// Generic over the leader-selection capability; committees are resolved
/// through the epoch registry populated via [`register_committee`].
///
/// [`register_committee`]: ConsensusEngine::register_committee
pub struct ConsensusEngine<L> {
    config: ConsensusConfig,
    network: Network,
    leader_strategy: L,
    fees: Arc<FeeLedger>,
    state: RwLock<EngineState>,
    registry: RwLock<EpochCommitteeRegistry>,
    pledges: MonotonicWatch,
    tips: MonotonicWatch,
    events: broadcast::Sender<ConsensusEvent>,
}

struct EngineState {
    store: BlockStore,
    phases: HashMap<BlockId, BlockPhase>,
}

impl EngineState {
    fn phase(&self, id: &BlockId) -> BlockPhase {
        self.phases.get(id).copied().unwrap_or(BlockPhase::Proposed)
    }
}

impl<L: LeaderStrategy> ConsensusEngine<L> {
    pub fn new(
        config: ConsensusConfig,
        network: Network,
        leader_strategy: L,
        fees: Arc<FeeLedger>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let registry = EpochCommitteeRegistry::new(config.committee_retention_epochs);
        Self {
            state: RwLock::new(EngineState {
                store: BlockStore::new(network, config.max_traversal_depth),
                phases: HashMap::new(),
            }),
            registry: RwLock::new(registry),
            pledges: MonotonicWatch::new(),
            tips: MonotonicWatch::new(),
            events,
            config,
            network,
            leader_strategy,
            fees,
        }
    }

    /// Subscribe to commit and abandon events.
    pub fn subscribe(&self) -> broadcast::Receiver<ConsensusEvent> {
        self.events.subscribe()
    }

    /// Register the committee for an (epoch, shard). Old epochs outside the
    /// retention window are discarded.
    pub async fn register_committee(&self, epoch: Epoch, shard: Shard, committee: Committee) {
        self.registry.write().await.register(epoch, shard, committee);
    }

    /// Insert and commit the shard's genesis block. Called once at startup
    /// per shard.
    pub async fn init_genesis(&self, epoch: Epoch, shard: Shard) -> Result<BlockId, EngineError> {
        let block = Block::genesis(self.network, epoch, shard);
        let mut state = self.state.write().await;
        let id = state.store.insert(block)?;
        state.phases.insert(id, BlockPhase::Committed);
        state.store.set_stored_at(&id, Timestamp::now())?;
        info!(%epoch, %shard, block = %id, "genesis block committed at startup");
        Ok(id)
    }

    /// Build an unsigned block extending `parent_id`.
    ///
    /// Only the designated leader for the target height may propose; anyone
    /// else fails `NotLeader`. The caller signs the returned block and
    /// submits it (its own copy via [`receive_block`], the rest of the
    /// committee via gossip).
    ///
    /// [`receive_block`]: ConsensusEngine::receive_block
    #[allow(clippy::too_many_arguments)]
    pub async fn propose(
        &self,
        proposer: &PublicKey,
        parent_id: &BlockId,
        justify: QuorumCertificate,
        epoch: Epoch,
        commands: Vec<Command>,
        foreign_indexes: BTreeMap<Shard, u64>,
        total_leader_fee: Amount,
    ) -> Result<Block, EngineError> {
        let (parent_height, shard) = {
            let state = self.state.read().await;
            let parent = state.store.get(parent_id)?;
            (parent.height(), parent.shard())
        };
        let height = parent_height.next();

        {
            let registry = self.registry.read().await;
            let committee = registry
                .get(epoch, shard)
                .ok_or(EngineError::UnknownCommittee { epoch, shard })?;
            if !self.leader_strategy.is_leader(committee, height, proposer) {
                return Err(EngineError::NotLeader {
                    proposed_by: proposer.to_string(),
                    height,
                    epoch,
                });
            }
        }

        Ok(Block::new(
            self.network,
            *parent_id,
            justify,
            height,
            epoch,
            shard,
            *proposer,
            commands,
            foreign_indexes,
            total_leader_fee,
        ))
    }

    /// Accept a validated, already-deserialized proposal.
    ///
    /// Protocol violations (bad signature, wrong leader, height gaps,
    /// duplicates) come back as typed errors; callers log and drop the
    /// message — they never stop the engine.
    pub async fn receive_block(&self, block: Block) -> Result<BlockId, EngineError> {
        if !block.is_dummy() && !block.is_genesis() && !block.verify_leader_signature() {
            return Err(EngineError::InvalidBlockSignature(*block.id()));
        }

        {
            let registry = self.registry.read().await;
            let committee =
                registry
                    .get(block.epoch(), block.shard())
                    .ok_or(EngineError::UnknownCommittee {
                        epoch: block.epoch(),
                        shard: block.shard(),
                    })?;
            if !self
                .leader_strategy
                .is_leader(committee, block.height(), block.proposed_by())
            {
                return Err(EngineError::NotLeader {
                    proposed_by: block.proposed_by().to_string(),
                    height: block.height(),
                    epoch: block.epoch(),
                });
            }
        }

        let shard = block.shard();
        let height = block.height();
        let mut state = self.state.write().await;
        let id = state.store.insert(block)?;
        state.phases.insert(id, BlockPhase::Proposed);
        state.store.set_stored_at(&id, Timestamp::now())?;
        drop(state);

        self.tips.advance(shard, height.as_u64());
        debug!(block = %id, %height, %shard, "proposal accepted");
        Ok(id)
    }

    /// Accept a quorum certificate for a block: `Proposed → Justified`.
    ///
    /// The QC must certify exactly this block (`QcMismatch` otherwise) and
    /// validate against the committee for its epoch. Justification then
    /// runs the commit rule; the ids of any newly committed blocks are
    /// returned in commit (ancestor-first) order.
    pub async fn justify(
        &self,
        block_id: &BlockId,
        qc: QuorumCertificate,
    ) -> Result<Vec<BlockId>, EngineError> {
        {
            let registry = self.registry.read().await;
            validate_qc(&qc, &registry)?;
        }

        let mut state = self.state.write().await;
        let height = state.store.get(block_id)?.height();
        if qc.block_id() != block_id || qc.block_height() != height {
            return Err(EngineError::QcMismatch {
                block_id: *block_id,
                height,
                qc_block_id: *qc.block_id(),
                qc_height: qc.block_height(),
            });
        }

        let phase = state.phase(block_id);
        match phase {
            BlockPhase::Proposed => {
                state.phases.insert(*block_id, BlockPhase::Justified);
                debug!(block = %block_id, "block justified");
            }
            // A second certificate adds nothing.
            BlockPhase::Justified | BlockPhase::Processed | BlockPhase::Committed => {
                return Ok(Vec::new());
            }
            BlockPhase::Abandoned => {
                return Err(EngineError::InvalidPhaseTransition {
                    block: *block_id,
                    phase,
                    target: BlockPhase::Justified,
                });
            }
        }

        let events = self.run_commit_rule(&mut state, block_id)?;
        drop(state);

        let mut committed = Vec::new();
        for event in events {
            if let ConsensusEvent::BlockCommitted { block_id, .. } = &event {
                committed.push(*block_id);
            }
            let _ = self.events.send(event);
        }
        Ok(committed)
    }

    /// Apply a justified block's commands: `Justified → Processed`.
    ///
    /// Blocks (suspends) until every cross-shard pledge the block
    /// incorporates has been observed locally, up to the configured bound;
    /// past it the call fails `MissingForeignPledge` and the block stays
    /// `Justified` — a later retry after the pledge arrives succeeds.
    pub async fn process(&self, block_id: &BlockId) -> Result<(), EngineError> {
        let (foreign_indexes, phase) = {
            let state = self.state.read().await;
            let block = state.store.get(block_id)?;
            (block.foreign_indexes().clone(), state.phase(block_id))
        };
        match phase {
            BlockPhase::Justified => {}
            BlockPhase::Processed | BlockPhase::Committed => return Ok(()),
            BlockPhase::Proposed | BlockPhase::Abandoned => {
                return Err(EngineError::InvalidPhaseTransition {
                    block: *block_id,
                    phase,
                    target: BlockPhase::Processed,
                });
            }
        }

        // Suspend without holding the store lock; unrelated blocks proceed.
        for (shard, required) in &foreign_indexes {
            if !self
                .pledges
                .wait_for(*shard, *required, self.config.pledge_wait())
                .await
            {
                let observed = self.pledges.current(*shard);
                warn!(
                    block = %block_id, %shard, required, observed,
                    "pledge wait exceeded bound"
                );
                return Err(EngineError::MissingForeignPledge {
                    block: *block_id,
                    shard: *shard,
                    required: *required,
                    observed,
                });
            }
        }

        let mut state = self.state.write().await;
        // Re-check: the branch may have been pruned while suspended.
        match state.phase(block_id) {
            BlockPhase::Justified => {
                state.store.mark_processed(block_id)?;
                state.phases.insert(*block_id, BlockPhase::Processed);
                debug!(block = %block_id, "block processed");
                Ok(())
            }
            BlockPhase::Processed | BlockPhase::Committed => Ok(()),
            phase => Err(EngineError::InvalidPhaseTransition {
                block: *block_id,
                phase,
                target: BlockPhase::Processed,
            }),
        }
    }

    /// Record a cross-shard pledge observation. The per-shard high-water
    /// mark never regresses; waiters whose requirement is now met wake.
    pub fn observe_pledge(&self, shard: Shard, index: u64) {
        self.pledges.advance(shard, index);
    }

    /// The highest pledge index observed from `shard`.
    pub fn pledge_high_water(&self, shard: Shard) -> u64 {
        self.pledges.current(shard)
    }

    /// Wait up to the view timeout for a proposal at or above `height` on
    /// `shard`. Returns `false` when the view timed out — the caller then
    /// synthesizes a dummy block to keep the chain advancing.
    pub async fn wait_for_proposal(&self, shard: Shard, height: NodeHeight) -> bool {
        self.tips
            .wait_for(shard, height.as_u64(), self.config.view_timeout())
            .await
    }

    /// Locally fill a missed height with a dummy block.
    ///
    /// The dummy carries no commands, earns no fee, and is attributed to
    /// the leader who failed to propose. It still requires justification
    /// like any other block.
    pub async fn synthesize_dummy(
        &self,
        parent_id: &BlockId,
        justify: QuorumCertificate,
    ) -> Result<Block, EngineError> {
        let parent = {
            let state = self.state.read().await;
            state.store.get(parent_id)?.clone()
        };
        let height = parent.height().next();

        let leader = {
            let registry = self.registry.read().await;
            let committee = registry.get(parent.epoch(), parent.shard()).ok_or(
                EngineError::UnknownCommittee {
                    epoch: parent.epoch(),
                    shard: parent.shard(),
                },
            )?;
            self.leader_strategy.leader(committee, height).public_key
        };

        let block = Block::dummy(&parent, justify, leader);
        let mut state = self.state.write().await;
        let id = state.store.insert(block.clone())?;
        state.phases.insert(id, BlockPhase::Proposed);
        state.store.set_stored_at(&id, Timestamp::now())?;
        drop(state);

        self.tips.advance(parent.shard(), height.as_u64());
        info!(%height, shard = %parent.shard(), "synthesized dummy block for missed height");
        Ok(block)
    }

    /// Fetch a block by id (full shape, including flags and foreign
    /// indexes).
    pub async fn get_block(&self, id: &BlockId) -> Result<Block, EngineError> {
        let state = self.state.read().await;
        Ok(state.store.get(id)?.clone())
    }

    /// The engine-side phase of a block, if known.
    pub async fn phase(&self, id: &BlockId) -> Option<BlockPhase> {
        let state = self.state.read().await;
        state.phases.get(id).copied()
    }

    /// The highest committed block for a shard.
    pub async fn highest_committed(&self, shard: Shard) -> Option<Block> {
        let state = self.state.read().await;
        state.store.highest_committed(shard).cloned()
    }

    /// The highest committed block for a shard at or below `epoch`.
    pub async fn highest_committed_in_epoch(
        &self,
        shard: Shard,
        epoch: Epoch,
    ) -> Result<Option<Block>, EngineError> {
        let state = self.state.read().await;
        Ok(state
            .store
            .highest_committed_in_epoch(shard, epoch)?
            .cloned())
    }

    /// The depth-2 three-chain commit rule.
    ///
    /// `justified` is C. With B = parent(C) and A = parent(B) both
    /// justified, A commits — along with every uncommitted ancestor between
    /// the last committed block and A, oldest first, atomically: the whole
    /// walk is validated before any flag is touched.
    fn run_commit_rule(
        &self,
        state: &mut EngineState,
        justified: &BlockId,
    ) -> Result<Vec<ConsensusEvent>, EngineError> {
        let c = state.store.get(justified)?;
        if c.is_genesis() {
            return Ok(Vec::new());
        }
        let b_id = *c.parent();
        let b = state.store.get(&b_id)?;
        if b.is_genesis() || !state.phase(&b_id).is_justified() {
            return Ok(Vec::new());
        }
        let a_id = *b.parent();
        let a = state.store.get(&a_id)?;
        if a.is_committed() || !state.phase(&a_id).is_justified() {
            return Ok(Vec::new());
        }

        let chain = state.store.uncommitted_chain(&a_id)?;
        for id in &chain {
            let block = state.store.get(id)?;
            if !block.is_dummy() && !block.is_processed() {
                return Err(EngineError::InvalidPhaseTransition {
                    block: *id,
                    phase: state.phase(id),
                    target: BlockPhase::Committed,
                });
            }
        }

        let mut events = Vec::new();
        for id in &chain {
            let (is_dummy, parent_id, height, epoch, shard, fee, proposer, transaction_ids) = {
                let block = state.store.get(id)?;
                (
                    block.is_dummy(),
                    *block.parent(),
                    block.height(),
                    block.epoch(),
                    block.shard(),
                    block.total_leader_fee(),
                    *block.proposed_by(),
                    block.transaction_ids().copied().collect::<Vec<_>>(),
                )
            };

            // Dummy blocks carry nothing to apply; they process on the fly.
            if is_dummy {
                state.store.mark_processed(id)?;
            }
            state.store.mark_committed(id)?;
            state.phases.insert(*id, BlockPhase::Committed);

            if !is_dummy && !fee.is_zero() {
                self.fees.credit_leader(&proposer, fee)?;
            }

            info!(block = %id, %height, %shard, "block committed");
            events.push(ConsensusEvent::BlockCommitted {
                block_id: *id,
                height,
                epoch,
                shard,
                transaction_ids,
                total_leader_fee: fee,
            });

            let siblings: Vec<BlockId> = state
                .store
                .children(&parent_id)
                .iter()
                .filter(|sibling| *sibling != id)
                .copied()
                .collect();
            for sibling in siblings {
                self.abandon_branch(state, &sibling, &mut events);
            }
        }
        Ok(events)
    }

    /// Prune a branch superseded by a committed sibling: every
    /// `Proposed`/`Justified` block in it becomes `Abandoned`.
    fn abandon_branch(
        &self,
        state: &mut EngineState,
        root: &BlockId,
        events: &mut Vec<ConsensusEvent>,
    ) {
        let mut stack = vec![*root];
        while let Some(id) = stack.pop() {
            let phase = state.phase(&id);
            if !matches!(phase, BlockPhase::Proposed | BlockPhase::Justified) {
                continue;
            }
            state.phases.insert(id, BlockPhase::Abandoned);
            if let Ok(block) = state.store.get(&id) {
                warn!(block = %id, "branch abandoned by committed sibling");
                events.push(ConsensusEvent::BranchAbandoned {
                    block_id: id,
                    height: block.height(),
                    shard: block.shard(),
                });
            }
            stack.extend_from_slice(state.store.children(&id));
        }
    }
}
