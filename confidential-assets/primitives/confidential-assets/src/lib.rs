//! Types and traits shared by the confidential assets pallets.
//!
//! Amounts never appear in plaintext here: every value is a 32-byte [`Handle`]
//! naming a ciphertext held by the encrypted-computation scheme. The scheme itself
//! is abstracted behind [`EncryptedArithmetic`] so the ledger and swap logic do not
//! depend on a concrete FHE backend.
#![cfg_attr(not(feature = "std"), no_std)]

mod codec;
pub use codec::EncryptedAmountCodec;

use frame_support::{pallet_prelude::*, BoundedVec};
use parity_scale_codec::{Decode, Encode, MaxEncodedLen};
use scale_info::TypeInfo;
use sp_runtime::RuntimeDebug;

/// Opaque reference to a ciphertext (analogous to a `euint64`/`ebool` handle).
#[derive(
    Encode,
    Decode,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Default,
    TypeInfo,
    MaxEncodedLen,
    RuntimeDebug,
)]
pub struct Handle(pub [u8; 32]);

impl Handle {
    /// Handle reported for accounts that never held a balance.
    /// Schemes must treat it as an encryption of zero.
    pub const ZERO: Handle = Handle([0u8; 32]);

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for Handle {
    fn from(bytes: [u8; 32]) -> Self {
        Handle(bytes)
    }
}

/// Encrypted non-negative integer in the asset base unit.
pub type EncryptedAmount = Handle;
/// Encrypted condition bit produced by comparisons.
pub type EncryptedBool = Handle;

/// Correctness proof accompanying a caller-supplied ciphertext.
pub type MaxProofLen = ConstU32<8192>;
pub type InputProof = BoundedVec<u8, MaxProofLen>;

/// Failures raised by the encrypted-computation scheme.
#[derive(Encode, Decode, Clone, Copy, PartialEq, Eq, TypeInfo, MaxEncodedLen, RuntimeDebug)]
pub enum FheError {
    /// Handle is not a ciphertext this scheme produced.
    MalformedCiphertext,
    /// Handle encodes a different plaintext type than the operation expects.
    TypeMismatch,
    /// Proof does not bind the ciphertext to the submitter and contract.
    InvalidProof,
    /// Proven plaintext does not fit in the permitted bit width.
    OutOfRange,
    DivisionByZero,
}

/// Who a caller-supplied ciphertext must be bound to.
#[derive(Clone, Copy, PartialEq, Eq, RuntimeDebug)]
pub struct InputBinding<'a> {
    /// SCALE-encoded address of the contract (pallet account) receiving the input.
    pub contract: &'a [u8],
    /// SCALE-encoded address of the account submitting the input.
    pub submitter: &'a [u8],
    /// Upper bound on the plaintext bit width the proof must establish.
    pub max_bits: u8,
}

/// Homomorphic operations supplied by the encrypted-computation scheme.
///
/// Implementations are pure functions over handles: either a software simulation
/// (tests) or a host interface delegating to a threshold FHE coprocessor.
pub trait EncryptedArithmetic {
    /// Trivial encryption of a public constant.
    fn as_encrypted(value: u64) -> EncryptedAmount;

    /// `a + b`, wrapping like the underlying integer type.
    fn add(a: &EncryptedAmount, b: &EncryptedAmount) -> Result<EncryptedAmount, FheError>;

    /// `a - b`, wrapping like the underlying integer type.
    fn sub(a: &EncryptedAmount, b: &EncryptedAmount) -> Result<EncryptedAmount, FheError>;

    /// Checked decrease. Returns `(x >= d, if x >= d { x - d } else { x })`.
    fn try_decrease(
        x: &EncryptedAmount,
        d: &EncryptedAmount,
    ) -> Result<(EncryptedBool, EncryptedAmount), FheError>;

    /// Checked increase. Returns `(x + d fits, if it fits { x + d } else { x })`.
    fn try_increase(
        x: &EncryptedAmount,
        d: &EncryptedAmount,
    ) -> Result<(EncryptedBool, EncryptedAmount), FheError>;

    /// `if cond { x } else { y }`
    fn select(
        cond: &EncryptedBool,
        x: &EncryptedAmount,
        y: &EncryptedAmount,
    ) -> Result<EncryptedAmount, FheError>;

    /// Multiplication by a public constant.
    fn scale_mul(a: &EncryptedAmount, k: u64) -> Result<EncryptedAmount, FheError>;

    /// Integer division by a public constant, truncating toward zero.
    fn scale_div(a: &EncryptedAmount, k: u64) -> Result<EncryptedAmount, FheError>;

    /// Verify the correctness proof of an external ciphertext and admit it.
    fn verify_input(
        ciphertext: &Handle,
        proof: &[u8],
        binding: InputBinding<'_>,
    ) -> Result<EncryptedAmount, FheError>;

    /// Public decryption of a condition bit.
    fn reveal_condition(cond: &EncryptedBool) -> Result<bool, FheError>;
}

/// What the ledger does when a debit exceeds the (unknown) encrypted balance, or a
/// credit would push a balance or the total supply past `u64::MAX`.
#[derive(Encode, Decode, Clone, Copy, PartialEq, Eq, TypeInfo, MaxEncodedLen, RuntimeDebug)]
pub enum ShortfallPolicy {
    /// Reveal only the success bit and fail the operation.
    Reject,
    /// Move an encrypted zero instead; the balance is left unchanged.
    TransferZero,
}

pub trait OperatorRegistry<AccountId, AssetId, Moment> {
    /// Return true if `operator` is currently authorized to operate for (`holder`, `asset`)
    /// at `now`.
    fn is_operator(holder: &AccountId, asset: &AssetId, operator: &AccountId, now: Moment) -> bool;
}

impl<AccountId, AssetId, Moment> OperatorRegistry<AccountId, AssetId, Moment> for () {
    fn is_operator(
        _holder: &AccountId,
        _asset: &AssetId,
        _operator: &AccountId,
        _now: Moment,
    ) -> bool {
        false
    }
}

/// Outcome of an operator-gated debit.
#[derive(Clone, Copy, PartialEq, Eq, RuntimeDebug)]
pub struct Debit {
    /// Amount actually removed from the holder. Equal to the request unless the
    /// ledger runs [`ShortfallPolicy::TransferZero`] and the balance fell short.
    pub transferred: EncryptedAmount,
    /// Holder balance after the debit.
    pub new_balance: EncryptedAmount,
}

/// Per-asset confidential balances.
pub trait ConfidentialLedger<AccountId, AssetId> {
    fn balance_of(asset: AssetId, who: &AccountId) -> EncryptedAmount;

    /// Debit `owner` on behalf of `spender`, who must be an unexpired operator.
    fn debit_from(
        asset: AssetId,
        owner: &AccountId,
        spender: &AccountId,
        amount: &EncryptedAmount,
    ) -> Result<Debit, DispatchError>;

    /// Credit `who`; returns the new balance.
    fn credit(
        asset: AssetId,
        who: &AccountId,
        amount: &EncryptedAmount,
    ) -> Result<EncryptedAmount, DispatchError>;
}

/// Decryption authority over ciphertext handles.
pub trait DecryptionAcl<AccountId> {
    fn allow(handle: &Handle, who: &AccountId);
    fn is_allowed(handle: &Handle, who: &AccountId) -> bool;
}

impl<AccountId> DecryptionAcl<AccountId> for () {
    fn allow(_handle: &Handle, _who: &AccountId) {}
    fn is_allowed(_handle: &Handle, _who: &AccountId) -> bool {
        false
    }
}

/// Which way a fixed-rate swap converts.
#[derive(Encode, Decode, Clone, Copy, PartialEq, Eq, TypeInfo, MaxEncodedLen, RuntimeDebug)]
pub enum SwapDirection {
    /// Debit the ETH asset, credit `amount * rate` of the USDT asset.
    #[codec(index = 0)]
    EthToUsdt,
    /// Debit the USDT asset, credit `amount / rate` of the ETH asset.
    #[codec(index = 1)]
    UsdtToEth,
}

/// Direction code outside the defined variants.
#[derive(Clone, Copy, PartialEq, Eq, RuntimeDebug)]
pub struct MalformedDirection(pub u8);

impl TryFrom<u8> for SwapDirection {
    type Error = MalformedDirection;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(SwapDirection::EthToUsdt),
            1 => Ok(SwapDirection::UsdtToEth),
            other => Err(MalformedDirection(other)),
        }
    }
}

impl From<SwapDirection> for u8 {
    fn from(direction: SwapDirection) -> u8 {
        match direction {
            SwapDirection::EthToUsdt => 0,
            SwapDirection::UsdtToEth => 1,
        }
    }
}

/// Public trace of one executed swap. Amounts are handles only.
#[derive(Encode, Decode, Clone, PartialEq, Eq, TypeInfo, MaxEncodedLen, RuntimeDebug)]
pub struct SwapRecord<AccountId> {
    pub who: AccountId,
    pub direction: SwapDirection,
    pub encrypted_amount_in: EncryptedAmount,
    pub encrypted_amount_out: EncryptedAmount,
}
