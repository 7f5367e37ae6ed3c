//! Admission and public-constant scaling of encrypted amounts.

use core::marker::PhantomData;

use parity_scale_codec::Encode;

use crate::{EncryptedAmount, EncryptedArithmetic, FheError, Handle, InputBinding, SwapDirection};

/// Thin layer over an [`EncryptedArithmetic`] scheme.
///
/// `ingest` is the only path by which an externally supplied ciphertext becomes a
/// trusted operand. Handles returned by `scale_up`/`scale_down` derive from trusted
/// operands and need no further proof.
pub struct EncryptedAmountCodec<F>(PhantomData<F>);

impl<F: EncryptedArithmetic> EncryptedAmountCodec<F> {
    /// Accept `ciphertext` only if `proof` binds it to `submitter` and `target` and
    /// proves the plaintext fits in `max_bits`.
    pub fn ingest<AccountId: Encode>(
        ciphertext: &Handle,
        proof: &[u8],
        submitter: &AccountId,
        target: &AccountId,
        max_bits: u8,
    ) -> Result<EncryptedAmount, FheError> {
        let submitter = submitter.encode();
        let contract = target.encode();
        F::verify_input(
            ciphertext,
            proof,
            InputBinding {
                contract: &contract,
                submitter: &submitter,
                max_bits,
            },
        )
    }

    /// `amount * rate`, exact as long as the admitted range keeps the product in 64 bits.
    pub fn scale_up(amount: &EncryptedAmount, rate: u64) -> Result<EncryptedAmount, FheError> {
        F::scale_mul(amount, rate)
    }

    /// `amount / rate`; the remainder is dropped.
    pub fn scale_down(amount: &EncryptedAmount, rate: u64) -> Result<EncryptedAmount, FheError> {
        F::scale_div(amount, rate)
    }

    pub fn convert(
        direction: SwapDirection,
        amount: &EncryptedAmount,
        rate: u64,
    ) -> Result<EncryptedAmount, FheError> {
        match direction {
            SwapDirection::EthToUsdt => Self::scale_up(amount, rate),
            SwapDirection::UsdtToEth => Self::scale_down(amount, rate),
        }
    }
}
