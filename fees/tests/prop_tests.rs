use proptest::prelude::*;

use weft_fees::{FeeBreakdown, FeeLedger, FeeSource};
use weft_types::{Amount, TransactionId};

fn arb_breakdown() -> impl Strategy<Value = FeeBreakdown> {
    // Bounded amounts so four sources can never overflow u64.
    (
        0u64..1 << 60,
        0u64..1 << 60,
        0u64..1 << 60,
        0u64..1 << 60,
    )
        .prop_map(|(storage, compute, proof, network)| {
            [
                (FeeSource::Storage, storage),
                (FeeSource::Compute, compute),
                (FeeSource::ProofVerification, proof),
                (FeeSource::Network, network),
            ]
            .into_iter()
            .collect()
        })
}

proptest! {
    /// The settled total always equals the breakdown's sum.
    #[test]
    fn charge_total_equals_breakdown_sum(bytes in prop::array::uniform32(0u8..), breakdown in arb_breakdown()) {
        let ledger = FeeLedger::new();
        let id = TransactionId::new(bytes);
        let expected = breakdown.total().unwrap();
        let charged = ledger.charge(id, breakdown).unwrap();
        prop_assert_eq!(charged, expected);
        prop_assert_eq!(ledger.total_for(&id), expected);
    }

    /// Charging twice with an identical breakdown never double-counts.
    #[test]
    fn identical_charge_is_idempotent(bytes in prop::array::uniform32(0u8..), breakdown in arb_breakdown()) {
        let ledger = FeeLedger::new();
        let id = TransactionId::new(bytes);
        let first = ledger.charge(id, breakdown.clone()).unwrap();
        let second = ledger.charge(id, breakdown).unwrap();
        prop_assert_eq!(first, second);
        prop_assert_eq!(ledger.total_for(&id), first);
    }

    /// An unsettled transaction always reads as zero.
    #[test]
    fn unsettled_reads_zero(bytes in prop::array::uniform32(0u8..)) {
        let ledger = FeeLedger::new();
        prop_assert_eq!(ledger.total_for(&TransactionId::new(bytes)), Amount::ZERO);
    }
}
