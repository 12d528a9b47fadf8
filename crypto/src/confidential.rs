//! Confidential value transfer: Pedersen commitments, range proofs, and
//! withdraw-proof verification.
//!
//! A withdraw proof spends a set of input commitments into a fresh output
//! commitment (plus optional change), revealing only the fee. Verification
//! checks three things, in order:
//!
//! 1. every input commitment is a canonical, non-identity Ristretto point;
//! 2. each output carries a valid 64-bit Bulletproof range proof;
//! 3. the balance proof — a Schnorr signature over the commitment excess
//!    `Σinputs − Σoutputs − fee·B` with the blinding generator as base —
//!    attests that committed inputs equal committed outputs plus the fee.
//!
//! Verification is a pure function of the proof. Comparisons on
//! secret-dependent values are constant-time.

use bulletproofs::{BulletproofGens, PedersenGens, RangeProof};
use curve25519_dalek_ng::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek_ng::scalar::Scalar;
use curve25519_dalek_ng::traits::{Identity, IsIdentity};
use merlin::Transcript;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use subtle::ConstantTimeEq;
use weft_types::Amount;

use crate::error::ProofError;

/// Committed values are range-proven to fit in 64 bits.
const RANGE_PROOF_BITS: usize = 64;

const RANGE_TRANSCRIPT_LABEL: &[u8] = b"weft.confidential.range.v1";
const BALANCE_TRANSCRIPT_LABEL: &[u8] = b"weft.confidential.balance.v1";

fn bp_gens() -> &'static BulletproofGens {
    static GENS: OnceLock<BulletproofGens> = OnceLock::new();
    GENS.get_or_init(|| BulletproofGens::new(RANGE_PROOF_BITS, 1))
}

fn range_transcript() -> Transcript {
    Transcript::new(RANGE_TRANSCRIPT_LABEL)
}

fn random_scalar() -> Scalar {
    let mut buf = [0u8; 64];
    OsRng.fill_bytes(&mut buf);
    Scalar::from_bytes_mod_order_wide(&buf)
}

/// A compressed Pedersen commitment `v·B + k·B_blinding`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PedersenCommitment([u8; 32]);

impl PedersenCommitment {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    fn from_point(point: &RistrettoPoint) -> Self {
        Self(point.compress().to_bytes())
    }

    /// Decompress into the Ristretto group, rejecting non-canonical
    /// encodings and the identity point.
    fn decompress(&self) -> Result<RistrettoPoint, ProofError> {
        let point = CompressedRistretto(self.0)
            .decompress()
            .ok_or_else(|| ProofError::MalformedCommitment(format!("{:02x?}", &self.0[..4])))?;
        if point.is_identity() {
            return Err(ProofError::MalformedCommitment("identity point".to_string()));
        }
        Ok(point)
    }
}

/// The secret blinding factor of a commitment. Held by the owning wallet;
/// never transmitted.
#[derive(Clone)]
pub struct ConfidentialMask {
    secret: Scalar,
}

impl ConfidentialMask {
    pub fn random() -> Self {
        Self {
            secret: random_scalar(),
        }
    }

    /// Commit to `value` under this mask.
    pub fn commit(&self, value: u64) -> PedersenCommitment {
        let point = PedersenGens::default().commit(Scalar::from(value), self.secret);
        PedersenCommitment::from_point(&point)
    }
}

/// A fresh commitment together with its range proof.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidentialOutput {
    pub commitment: PedersenCommitment,
    /// Serialized Bulletproof; parsed at verification time.
    pub range_proof: Vec<u8>,
}

/// Schnorr signature over the commitment excess, proving the value balance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceProof {
    /// Compressed public nonce `R = r·B_blinding`.
    pub public_nonce: [u8; 32],
    /// Response scalar `s = r + e·k`.
    pub signature: [u8; 32],
}

/// Spends input commitments into an output (plus optional change),
/// revealing only the fee.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawProof {
    /// Ordered input commitments being spent.
    pub inputs: Vec<PedersenCommitment>,
    /// The new output commitment and its range proof.
    pub output: ConfidentialOutput,
    /// Change returned to the spender, if any.
    pub change: Option<ConfidentialOutput>,
    /// The fee revealed in the clear, settled by the fee ledger on commit.
    pub revealed_fee: Amount,
    pub balance_proof: BalanceProof,
}

/// A generated proof together with the masks of its outputs, so the caller
/// can spend them in a later proof.
pub struct WithdrawProofBundle {
    pub proof: WithdrawProof,
    pub output_mask: ConfidentialMask,
    pub change_mask: Option<ConfidentialMask>,
}

fn prove_output(value: u64, mask: &ConfidentialMask) -> Result<ConfidentialOutput, ProofError> {
    let (proof, commitment) = RangeProof::prove_single(
        bp_gens(),
        &PedersenGens::default(),
        &mut range_transcript(),
        value,
        &mask.secret,
        RANGE_PROOF_BITS,
    )
    .map_err(|e| ProofError::MalformedProof(e.to_string()))?;

    Ok(ConfidentialOutput {
        commitment: PedersenCommitment(commitment.to_bytes()),
        range_proof: proof.to_bytes(),
    })
}

fn verify_output(output: &ConfidentialOutput) -> Result<RistrettoPoint, ProofError> {
    let point = output.commitment.decompress()?;
    let proof = RangeProof::from_bytes(&output.range_proof)
        .map_err(|e| ProofError::MalformedProof(e.to_string()))?;
    proof
        .verify_single(
            bp_gens(),
            &PedersenGens::default(),
            &mut range_transcript(),
            &CompressedRistretto(output.commitment.0),
            RANGE_PROOF_BITS,
        )
        .map_err(|_| ProofError::RangeProofFailed)?;
    Ok(point)
}

fn balance_challenge(
    excess: &CompressedRistretto,
    nonce: &CompressedRistretto,
    fee: Amount,
) -> Scalar {
    let mut transcript = Transcript::new(BALANCE_TRANSCRIPT_LABEL);
    transcript.append_message(b"excess", excess.as_bytes());
    transcript.append_message(b"nonce", nonce.as_bytes());
    transcript.append_message(b"fee", &fee.raw().to_le_bytes());
    let mut buf = [0u8; 64];
    transcript.challenge_bytes(b"e", &mut buf);
    Scalar::from_bytes_mod_order_wide(&buf)
}

/// Build a withdraw proof spending `inputs` (mask + value pairs) into
/// `output_value` plus optional change, revealing `fee`.
///
/// The balance signature is honest over the masks the caller supplies: if
/// the claimed values do not balance, the resulting proof will fail
/// verification with `BalanceMismatch`.
pub fn generate_withdraw_proof(
    inputs: &[(ConfidentialMask, u64)],
    output_value: u64,
    change_value: Option<u64>,
    fee: Amount,
) -> Result<WithdrawProofBundle, ProofError> {
    let pc = PedersenGens::default();

    let output_mask = ConfidentialMask::random();
    let output = prove_output(output_value, &output_mask)?;

    let change_mask = change_value.map(|_| ConfidentialMask::random());
    let change = match (change_value, &change_mask) {
        (Some(value), Some(mask)) => Some(prove_output(value, mask)?),
        _ => None,
    };

    // Blinding excess: the scalar the balance signature proves knowledge of.
    let mut k = Scalar::zero();
    for (mask, _) in inputs {
        k += mask.secret;
    }
    k -= output_mask.secret;
    if let Some(mask) = &change_mask {
        k -= mask.secret;
    }

    let mut excess = RistrettoPoint::identity();
    for (mask, value) in inputs {
        excess += pc.commit(Scalar::from(*value), mask.secret);
    }
    excess -= pc.commit(Scalar::from(output_value), output_mask.secret);
    if let (Some(value), Some(mask)) = (change_value, &change_mask) {
        excess -= pc.commit(Scalar::from(value), mask.secret);
    }
    excess -= pc.commit(Scalar::from(fee.raw()), Scalar::zero());

    let r = random_scalar();
    let nonce = r * pc.B_blinding;
    let nonce_compressed = nonce.compress();
    let e = balance_challenge(&excess.compress(), &nonce_compressed, fee);
    let s = r + e * k;

    let proof = WithdrawProof {
        inputs: inputs.iter().map(|(mask, value)| {
            let point = pc.commit(Scalar::from(*value), mask.secret);
            PedersenCommitment::from_point(&point)
        }).collect(),
        output,
        change,
        revealed_fee: fee,
        balance_proof: BalanceProof {
            public_nonce: nonce_compressed.to_bytes(),
            signature: s.to_bytes(),
        },
    };

    Ok(WithdrawProofBundle {
        proof,
        output_mask,
        change_mask,
    })
}

/// Verify a withdraw proof, returning the revealed fee on success.
///
/// Deterministic: the same proof always yields the same verdict and fee.
pub fn verify_withdraw_proof(proof: &WithdrawProof) -> Result<Amount, ProofError> {
    let pc = PedersenGens::default();

    let mut input_points = Vec::with_capacity(proof.inputs.len());
    for input in &proof.inputs {
        input_points.push(input.decompress()?);
    }

    let output_point = verify_output(&proof.output)?;
    let change_point = proof.change.as_ref().map(verify_output).transpose()?;

    let mut excess = input_points
        .into_iter()
        .fold(RistrettoPoint::identity(), |acc, p| acc + p);
    excess -= output_point;
    if let Some(change) = change_point {
        excess -= change;
    }
    excess -= pc.commit(Scalar::from(proof.revealed_fee.raw()), Scalar::zero());

    let s = Scalar::from_canonical_bytes(proof.balance_proof.signature)
        .ok_or_else(|| ProofError::MalformedProof("non-canonical balance scalar".to_string()))?;
    let nonce_compressed = CompressedRistretto(proof.balance_proof.public_nonce);
    let nonce = nonce_compressed
        .decompress()
        .ok_or_else(|| ProofError::MalformedProof("invalid balance nonce".to_string()))?;

    let e = balance_challenge(&excess.compress(), &nonce_compressed, proof.revealed_fee);
    let lhs = s * pc.B_blinding;
    let rhs = nonce + e * excess;

    if bool::from(lhs.compress().as_bytes().ct_eq(rhs.compress().as_bytes())) {
        Ok(proof.revealed_fee)
    } else {
        Err(ProofError::BalanceMismatch)
    }
}
