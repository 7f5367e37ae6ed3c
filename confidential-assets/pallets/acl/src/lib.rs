//! ACL Pallet
//!
//! Decryption authority over ciphertext handles. The ledger and swap pallets
//! register owners as they produce handles; the off-chain decryption service
//! checks [`Allowed`] before answering a user decryption request.
#![cfg_attr(not(feature = "std"), no_std)]

pub use pallet::*;

#[cfg(test)]
mod mock;

use confidential_assets_primitives::{DecryptionAcl, Handle};
use frame_support::{pallet_prelude::*, Blake2_128Concat};
use frame_system::pallet_prelude::*;

const LOG_TARGET: &str = "runtime::acl";

#[frame_support::pallet]
pub mod pallet {
    use super::*;

    #[pallet::config]
    pub trait Config: frame_system::Config {
        type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;
        type WeightInfo: WeightData;
    }

    pub trait WeightData {
        fn delegate() -> Weight;
    }
    impl WeightData for () {
        fn delegate() -> Weight {
            Weight::from_parts(10_000, 0)
        }
    }

    /// handle -> account -> ()
    #[pallet::storage]
    pub type Allowed<T: Config> = StorageDoubleMap<
        _,
        Blake2_128Concat,
        Handle,
        Blake2_128Concat,
        T::AccountId,
        (),
        OptionQuery,
    >;

    #[pallet::event]
    #[pallet::generate_deposit(pub(super) fn deposit_event)]
    pub enum Event<T: Config> {
        DecryptionDelegated {
            handle: Handle,
            from: T::AccountId,
            to: T::AccountId,
        },
    }

    #[pallet::error]
    pub enum Error<T> {
        /// Caller holds no decryption authority over the handle.
        NotAllowed,
    }

    #[pallet::pallet]
    pub struct Pallet<T>(_);

    #[pallet::call]
    impl<T: Config> Pallet<T> {
        /// Share decryption authority over `handle` with `delegate`.
        #[pallet::call_index(0)]
        #[pallet::weight(T::WeightInfo::delegate())]
        pub fn delegate(
            origin: OriginFor<T>,
            handle: Handle,
            delegate: T::AccountId,
        ) -> DispatchResult {
            let who = ensure_signed(origin)?;
            ensure!(Allowed::<T>::contains_key(handle, &who), Error::<T>::NotAllowed);
            Allowed::<T>::insert(handle, &delegate, ());
            log::debug!(
                target: LOG_TARGET,
                "{:?} delegated {:?} to {:?}",
                who,
                handle,
                delegate
            );
            Self::deposit_event(Event::DecryptionDelegated {
                handle,
                from: who,
                to: delegate,
            });
            Ok(())
        }
    }
}

impl<T: pallet::Config> DecryptionAcl<T::AccountId> for pallet::Pallet<T> {
    fn allow(handle: &Handle, who: &T::AccountId) {
        pallet::Allowed::<T>::insert(handle, who, ());
    }

    fn is_allowed(handle: &Handle, who: &T::AccountId) -> bool {
        pallet::Allowed::<T>::contains_key(handle, who)
    }
}
