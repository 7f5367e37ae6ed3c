//! Confidential swaps pallet
//!
//! Fixed-rate conversion between two confidential assets. The caller submits an
//! encrypted amount bound to this pallet's account, the engine debits it through
//! an operator grant the caller gave beforehand, scales it by the public rate and
//! credits the other asset. Nothing about the amounts is revealed; each executed
//! swap leaves a [`SwapRecord`] of handles.
//!
//! ETH -> USDT multiplies by `Rate`, USDT -> ETH divides by it and the remainder
//! is burned.
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;

#[cfg(test)]
mod mock;

use alloc::vec::Vec;
use confidential_assets_primitives::{
    ConfidentialLedger, DecryptionAcl, EncryptedAmount, EncryptedAmountCodec, EncryptedArithmetic,
    InputProof, SwapDirection, SwapRecord,
};
use frame_support::{pallet_prelude::*, storage::with_storage_layer, PalletId};
use frame_system::pallet_prelude::*;
use sp_runtime::traits::AccountIdConversion;

const LOG_TARGET: &str = "runtime::confidential-swaps";

#[frame_support::pallet]
pub mod pallet {
    use super::*;

    #[pallet::config]
    pub trait Config: frame_system::Config {
        type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;

        type AssetId: Parameter + Member + Copy + MaxEncodedLen;

        type Fhe: EncryptedArithmetic;

        type Ledger: ConfidentialLedger<Self::AccountId, Self::AssetId>;

        type Acl: DecryptionAcl<Self::AccountId>;

        /// Derives the engine account: the proof target and the operator holders must authorize.
        #[pallet::constant]
        type PalletId: Get<PalletId>;

        /// Base units of USDT per base unit of ETH.
        #[pallet::constant]
        type Rate: Get<u64>;

        /// Bit width every submitted amount must be proven to fit in.
        /// Must keep `amount * Rate` below 2^64.
        #[pallet::constant]
        type MaxInputBits: Get<u8>;

        #[pallet::constant]
        type EthAsset: Get<Self::AssetId>;

        #[pallet::constant]
        type UsdtAsset: Get<Self::AssetId>;

        type WeightInfo: WeightInfo;
    }

    pub trait WeightInfo {
        fn swap() -> Weight;
    }

    impl WeightInfo for () {
        fn swap() -> Weight {
            Weight::from_parts(50_000, 0)
        }
    }

    #[pallet::pallet]
    pub struct Pallet<T>(_);

    #[pallet::hooks]
    impl<T: Config> Hooks<BlockNumberFor<T>> for Pallet<T> {
        fn integrity_test() {
            let rate = T::Rate::get();
            assert!(rate > 0, "Rate must be non-zero");
            assert!(Self::rate_fits(rate), "Rate * 2^MaxInputBits must fit in 64 bits");
        }
    }

    // ---- Storage ----
    #[pallet::storage]
    pub type NextSwapId<T> = StorageValue<_, u64, ValueQuery>;

    /// Append-only swap history keyed by id.
    #[pallet::storage]
    pub type SwapRecords<T: Config> =
        StorageMap<_, Blake2_128Concat, u64, SwapRecord<T::AccountId>, OptionQuery>;

    // ---- Events / Errors ----
    #[pallet::event]
    #[pallet::generate_deposit(pub(super) fn deposit_event)]
    pub enum Event<T: Config> {
        SwapExecuted {
            id: u64,
            who: T::AccountId,
            direction: SwapDirection,
            encrypted_amount_in: EncryptedAmount,
            encrypted_amount_out: EncryptedAmount,
        },
    }

    #[pallet::error]
    pub enum Error<T> {
        /// Proof does not bind the ciphertext to the caller and this engine, or the
        /// amount is outside the admitted range.
        InvalidProof,
        /// Configured rate is zero.
        ZeroRate,
        /// `Rate * 2^MaxInputBits` does not fit in 64 bits, so scaling up could wrap.
        RateTooLarge,
        /// The encrypted-computation scheme rejected an operand.
        ArithmeticFailed,
    }

    // ---- Calls ----
    #[pallet::call]
    impl<T: Config> Pallet<T> {
        /// Convert `amount_in` of the source asset of `direction` at the fixed rate.
        ///
        /// The caller must have made the engine account an operator on the source
        /// asset. Fails without any state change on a bad proof, a missing or
        /// expired grant, or (under the rejecting shortfall policy) a short balance.
        #[pallet::call_index(0)]
        #[pallet::weight(T::WeightInfo::swap())]
        pub fn swap(
            origin: OriginFor<T>,
            direction: SwapDirection,
            amount_in: EncryptedAmount,
            proof: InputProof,
        ) -> DispatchResult {
            let who = ensure_signed(origin)?;
            with_storage_layer(|| Self::do_swap(who, direction, amount_in, proof))
        }

        #[pallet::call_index(1)]
        #[pallet::weight(T::WeightInfo::swap())]
        pub fn swap_eth_to_usdt(
            origin: OriginFor<T>,
            amount_in: EncryptedAmount,
            proof: InputProof,
        ) -> DispatchResult {
            Self::swap(origin, SwapDirection::EthToUsdt, amount_in, proof)
        }

        #[pallet::call_index(2)]
        #[pallet::weight(T::WeightInfo::swap())]
        pub fn swap_usdt_to_eth(
            origin: OriginFor<T>,
            amount_in: EncryptedAmount,
            proof: InputProof,
        ) -> DispatchResult {
            Self::swap(origin, SwapDirection::UsdtToEth, amount_in, proof)
        }
    }

    impl<T: Config> Pallet<T> {
        /// Engine account.
        pub fn account_id() -> T::AccountId {
            T::PalletId::get().into_account_truncating()
        }

        /// Whether every admitted input times `rate` stays within 64 bits.
        pub fn rate_fits(rate: u64) -> bool {
            let max_input = u64::MAX.checked_shr(T::MaxInputBits::get().into()).unwrap_or(0);
            rate <= max_input
        }

        /// (debited, credited) assets for `direction`.
        pub fn assets(direction: SwapDirection) -> (T::AssetId, T::AssetId) {
            match direction {
                SwapDirection::EthToUsdt => (T::EthAsset::get(), T::UsdtAsset::get()),
                SwapDirection::UsdtToEth => (T::UsdtAsset::get(), T::EthAsset::get()),
            }
        }

        /// Up to `limit` records with id >= `from`, in execution order.
        pub fn records(from: u64, limit: u32) -> Vec<(u64, SwapRecord<T::AccountId>)> {
            let end = NextSwapId::<T>::get();
            (from..end)
                .filter_map(|id| SwapRecords::<T>::get(id).map(|r| (id, r)))
                .take(limit as usize)
                .collect()
        }

        fn do_swap(
            who: T::AccountId,
            direction: SwapDirection,
            amount_in: EncryptedAmount,
            proof: InputProof,
        ) -> DispatchResult {
            let rate = T::Rate::get();
            ensure!(rate > 0, Error::<T>::ZeroRate);
            ensure!(Self::rate_fits(rate), Error::<T>::RateTooLarge);

            let engine = Self::account_id();
            let amount = EncryptedAmountCodec::<T::Fhe>::ingest(
                &amount_in,
                &proof,
                &who,
                &engine,
                T::MaxInputBits::get(),
            )
            .map_err(|e| {
                log::debug!(
                    target: LOG_TARGET,
                    "rejected input from {:?}: {:?}",
                    who,
                    e
                );
                Error::<T>::InvalidProof
            })?;

            let (from_asset, to_asset) = Self::assets(direction);
            let debit = T::Ledger::debit_from(from_asset, &who, &engine, &amount)?;
            let amount_out =
                EncryptedAmountCodec::<T::Fhe>::convert(direction, &debit.transferred, rate)
                    .map_err(|e| {
                        log::warn!(target: LOG_TARGET, "conversion failed: {:?}", e);
                        Error::<T>::ArithmeticFailed
                    })?;
            T::Ledger::credit(to_asset, &who, &amount_out)?;

            for handle in [&debit.transferred, &amount_out] {
                T::Acl::allow(handle, &who);
                T::Acl::allow(handle, &engine);
            }

            let id = NextSwapId::<T>::mutate(|n| {
                let cur = *n;
                *n = n.saturating_add(1);
                cur
            });
            SwapRecords::<T>::insert(
                id,
                SwapRecord {
                    who: who.clone(),
                    direction,
                    encrypted_amount_in: debit.transferred,
                    encrypted_amount_out: amount_out,
                },
            );
            log::debug!(
                target: LOG_TARGET,
                "swap {} executed for {:?} ({:?})",
                id,
                who,
                direction
            );

            Self::deposit_event(Event::SwapExecuted {
                id,
                who,
                direction,
                encrypted_amount_in: debit.transferred,
                encrypted_amount_out: amount_out,
            });
            Ok(())
        }
    }
}
