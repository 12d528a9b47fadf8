use proptest::prelude::*;

use weft_types::{Amount, BlockId, Epoch, NodeHeight, Timestamp, TransactionId};

proptest! {
    /// BlockId roundtrip: new -> as_bytes -> new produces identical id.
    #[test]
    fn block_id_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let id = BlockId::new(bytes);
        prop_assert_eq!(id.as_bytes(), &bytes);
    }

    /// TransactionId roundtrip: new -> as_bytes -> new produces identical id.
    #[test]
    fn transaction_id_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let id = TransactionId::new(bytes);
        prop_assert_eq!(id.as_bytes(), &bytes);
    }

    /// BlockId::is_zero is true only for all-zero bytes.
    #[test]
    fn block_id_is_zero_correct(bytes in prop::array::uniform32(0u8..)) {
        let id = BlockId::new(bytes);
        prop_assert_eq!(id.is_zero(), bytes == [0u8; 32]);
    }

    /// BlockId bincode serialization roundtrip.
    #[test]
    fn block_id_bincode_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let id = BlockId::new(bytes);
        let encoded = bincode::serialize(&id).unwrap();
        let decoded: BlockId = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded.as_bytes(), id.as_bytes());
    }

    /// Amount checked_add never wraps: it is None exactly when u64 overflows.
    #[test]
    fn amount_checked_add_matches_u64(a in any::<u64>(), b in any::<u64>()) {
        let sum = Amount::new(a).checked_add(Amount::new(b));
        prop_assert_eq!(sum.map(|s| s.raw()), a.checked_add(b));
    }

    /// Amount ordering matches raw ordering.
    #[test]
    fn amount_ordering(a in any::<u64>(), b in any::<u64>()) {
        prop_assert_eq!(Amount::new(a) <= Amount::new(b), a <= b);
    }

    /// NodeHeight::next always increases by exactly 1.
    #[test]
    fn height_next_increments(h in 0u64..u64::MAX) {
        let height = NodeHeight::new(h);
        prop_assert_eq!(height.next().as_u64(), h + 1);
    }

    /// Epoch ordering matches raw ordering.
    #[test]
    fn epoch_ordering(a in any::<u64>(), b in any::<u64>()) {
        prop_assert_eq!(Epoch::new(a) <= Epoch::new(b), a <= b);
    }

    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in any::<u64>(), b in any::<u64>()) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta == tb, a == b);
    }

    /// elapsed_since saturates instead of underflowing.
    #[test]
    fn timestamp_elapsed_saturates(a in any::<u64>(), b in any::<u64>()) {
        let elapsed = Timestamp::new(a).elapsed_since(Timestamp::new(b));
        prop_assert_eq!(elapsed, b.saturating_sub(a));
    }
}

#[test]
fn genesis_qc_is_genesis() {
    use weft_types::{QuorumCertificate, Shard};

    let qc = QuorumCertificate::genesis(Epoch::new(0), Shard::new(0));
    assert!(qc.is_genesis());
    assert!(qc.block_id().is_zero());
    assert!(qc.signatures().is_empty());
}

#[test]
fn signature_serde_roundtrip() {
    use weft_types::Signature;

    let sig = Signature([7u8; 64]);
    let encoded = bincode::serialize(&sig).unwrap();
    let decoded: Signature = bincode::deserialize(&encoded).unwrap();
    assert_eq!(decoded, sig);

    let json = serde_json::to_string(&sig).unwrap();
    let decoded: Signature = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, sig);
}
