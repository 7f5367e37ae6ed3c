//! Client-side half of the simulator: encrypted input construction and
//! decryption on behalf of the key holder.
//!
//! A real deployment splits these across a wallet SDK (encryption, proof) and a
//! threshold decryption service (which must first check the on-chain ACL).

use alloc::vec::Vec;
use confidential_assets_primitives::{FheError, Handle, InputBinding, InputProof};
use parity_scale_codec::Encode;

use crate::{ser, Kind, SimulatedProof};

/// Ciphertext handle plus the proof binding it to a contract and submitter.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct EncryptedInput {
    pub handle: Handle,
    pub proof: Vec<u8>,
}

impl EncryptedInput {
    /// Proof as the bounded blob dispatchables accept.
    pub fn bounded_proof(&self) -> InputProof {
        InputProof::truncate_from(self.proof.clone())
    }
}

/// Smallest bit width `value` fits in.
pub fn bit_width(value: u64) -> u8 {
    (64 - value.leading_zeros()) as u8
}

/// Encrypt `value` for `contract`, submitted by `submitter` (both SCALE-encoded).
///
/// `seed` stands in for the client's encryption randomness; distinct seeds yield
/// distinct handles for the same value.
pub fn encrypt_input(value: u64, contract: &[u8], submitter: &[u8], seed: u64) -> EncryptedInput {
    let nonce = ser::nonce(
        b"input",
        &[&seed.to_le_bytes(), contract, submitter],
    );
    let handle = ser::seal(Kind::Uint64, value, nonce);
    let bits = bit_width(value);
    let binding = InputBinding {
        contract,
        submitter,
        max_bits: bits,
    };
    let tag = ser::input_tag(&handle, &binding, bits);
    EncryptedInput {
        handle,
        proof: SimulatedProof { bits, tag }.encode(),
    }
}

/// [`encrypt_input`] for typed addresses.
pub fn encrypt_for<A: Encode>(
    value: u64,
    contract: &A,
    submitter: &A,
    seed: u64,
) -> EncryptedInput {
    encrypt_input(value, &contract.encode(), &submitter.encode(), seed)
}

/// Recover the plaintext behind an amount handle.
pub fn decrypt(handle: &Handle) -> Result<u64, FheError> {
    ser::open_uint(handle)
}

/// Recover the plaintext behind a condition handle.
pub fn decrypt_bool(handle: &Handle) -> Result<bool, FheError> {
    ser::open_bool(handle)
}
