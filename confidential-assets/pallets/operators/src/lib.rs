//! Operators pallet
//!
//! Time-bounded delegation: a holder lets an operator debit their confidential
//! balance of one asset until an expiry instant (unix seconds). Grants are never
//! deleted; they go inert once `now >= expiry` and are checked lazily by the
//! consuming ledger.
#![cfg_attr(not(feature = "std"), no_std)]

pub use pallet::*;

#[cfg(test)]
mod mock;

use confidential_assets_primitives::OperatorRegistry;
use frame_support::{pallet_prelude::*, Blake2_128Concat};
use frame_system::pallet_prelude::*;

const LOG_TARGET: &str = "runtime::operators";

/// Unix timestamp in seconds.
pub type Moment = u64;

#[frame_support::pallet]
pub mod pallet {
    use super::*;

    #[pallet::config]
    pub trait Config: frame_system::Config {
        type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;

        /// Asset identifier used by the consuming pallets.
        type AssetId: Parameter + Member + Copy + Ord + MaxEncodedLen;

        /// Weight info (placeholder).
        type WeightInfo: WeightData;
    }

    pub trait WeightData {
        fn set_operator() -> Weight;
        fn revoke_operator() -> Weight;
    }
    impl WeightData for () {
        fn set_operator() -> Weight {
            Weight::from_parts(10_000, 0)
        }
        fn revoke_operator() -> Weight {
            Weight::from_parts(10_000, 0)
        }
    }

    /// (holder, asset, operator) -> expiry (unix seconds, exclusive)
    #[pallet::storage]
    pub type Operators<T: Config> = StorageNMap<
        _,
        (
            NMapKey<Blake2_128Concat, T::AccountId>,
            NMapKey<Blake2_128Concat, T::AssetId>,
            NMapKey<Blake2_128Concat, T::AccountId>,
        ),
        Moment,
        OptionQuery,
    >;

    #[pallet::event]
    #[pallet::generate_deposit(pub(super) fn deposit_event)]
    pub enum Event<T: Config> {
        OperatorSet {
            asset: T::AssetId,
            holder: T::AccountId,
            operator: T::AccountId,
            until: Moment,
        },
        OperatorRevoked {
            asset: T::AssetId,
            holder: T::AccountId,
            operator: T::AccountId,
        },
    }

    #[pallet::error]
    pub enum Error<T> {
        NoSuchOperator,
    }

    #[pallet::pallet]
    pub struct Pallet<T>(_);

    impl<T: Config> Pallet<T> {
        /// Public helper for other pallets.
        pub fn is_operator(
            holder: &T::AccountId,
            asset: &T::AssetId,
            operator: &T::AccountId,
            now: Moment,
        ) -> bool {
            match Operators::<T>::get((holder, asset, operator)) {
                Some(until) => now < until,
                None => false,
            }
        }

        pub fn operator_expiry(
            holder: &T::AccountId,
            asset: &T::AssetId,
            operator: &T::AccountId,
        ) -> Option<Moment> {
            Operators::<T>::get((holder, asset, operator))
        }
    }

    #[pallet::call]
    impl<T: Config> Pallet<T> {
        /// Holder grants, extends or shortens an operator for `asset` until `until`.
        ///
        /// An `until` already in the past is accepted and yields an inert grant.
        #[pallet::call_index(0)]
        #[pallet::weight(T::WeightInfo::set_operator())]
        pub fn set_operator(
            origin: OriginFor<T>,
            asset: T::AssetId,
            operator: T::AccountId,
            until: Moment,
        ) -> DispatchResult {
            let holder = ensure_signed(origin)?;
            Operators::<T>::insert((holder.clone(), asset, operator.clone()), until);
            log::debug!(
                target: LOG_TARGET,
                "operator {:?} set for {:?} until {}",
                operator,
                holder,
                until
            );
            Self::deposit_event(Event::OperatorSet {
                asset,
                holder,
                operator,
                until,
            });
            Ok(())
        }

        /// Holder expires an existing grant immediately. The entry stays, inert.
        #[pallet::call_index(1)]
        #[pallet::weight(T::WeightInfo::revoke_operator())]
        pub fn revoke_operator(
            origin: OriginFor<T>,
            asset: T::AssetId,
            operator: T::AccountId,
        ) -> DispatchResult {
            let holder = ensure_signed(origin)?;
            Operators::<T>::try_mutate((holder.clone(), asset, operator.clone()), |until| {
                let until = until.as_mut().ok_or(Error::<T>::NoSuchOperator)?;
                *until = 0;
                Ok::<_, DispatchError>(())
            })?;
            Self::deposit_event(Event::OperatorRevoked {
                asset,
                holder,
                operator,
            });
            Ok(())
        }
    }
}

/// Implement the trait so other pallets can depend only on `OperatorRegistry`.
impl<T: pallet::Config> OperatorRegistry<T::AccountId, T::AssetId, Moment> for pallet::Pallet<T> {
    fn is_operator(
        holder: &T::AccountId,
        asset: &T::AssetId,
        operator: &T::AccountId,
        now: Moment,
    ) -> bool {
        <pallet::Pallet<T>>::is_operator(holder, asset, operator, now)
    }
}
