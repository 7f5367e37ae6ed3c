//! Confidential ledger pallet
//!
//! Per-asset balances held as ciphertext handles. Amounts are only ever combined
//! through [`EncryptedArithmetic`]; the ledger never learns a plaintext except the
//! single sufficiency bit revealed under [`ShortfallPolicy::Reject`].
//!
//! Other pallets move funds through the [`ConfidentialLedger`] implementation:
//! `debit_from` is gated on the spender being the owner or one of the owner's
//! unexpired operators, `credit` is unconditional.
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;

#[cfg(test)]
mod mock;

use confidential_assets_primitives::{
    ConfidentialLedger, Debit, DecryptionAcl, EncryptedAmount, EncryptedArithmetic, FheError,
    OperatorRegistry, ShortfallPolicy,
};
use frame_support::{
    pallet_prelude::*,
    traits::{BuildGenesisConfig, UnixTime},
};
use frame_system::pallet_prelude::*;
use sp_runtime::traits::MaybeSerializeDeserialize;

const LOG_TARGET: &str = "runtime::confidential-assets";

#[frame_support::pallet]
pub mod pallet {
    use super::*;
    use alloc::vec::Vec;

    #[pallet::config]
    pub trait Config: frame_system::Config {
        type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;

        type AssetId: Parameter + Member + Copy + Ord + MaxEncodedLen + MaybeSerializeDeserialize;

        /// Encrypted-computation scheme backing every balance.
        type Fhe: EncryptedArithmetic;

        /// Operator layer. Defaults to always returning false when assigned ().
        type Operators: OperatorRegistry<Self::AccountId, Self::AssetId, u64>;

        /// Where produced handles are registered for user decryption.
        type Acl: DecryptionAcl<Self::AccountId>;

        /// Clock for operator expiry.
        type Time: UnixTime;

        /// Behaviour of a debit larger than the encrypted balance.
        type ShortfallPolicy: Get<ShortfallPolicy>;

        /// Origin allowed to mint from the public faucet.
        type MintOrigin: EnsureOrigin<Self::RuntimeOrigin>;

        /// Decimal places of the base unit, for display only.
        #[pallet::constant]
        type Decimals: Get<u8>;

        type WeightInfo: WeightData;
    }

    pub trait WeightData {
        fn mint() -> Weight;
    }
    impl WeightData for () {
        fn mint() -> Weight {
            Weight::from_parts(20_000, 0)
        }
    }

    /// (asset, account) -> encrypted balance. Absent reads as [`Handle::ZERO`].
    #[pallet::storage]
    pub type Balances<T: Config> = StorageDoubleMap<
        _,
        Blake2_128Concat,
        T::AssetId,
        Blake2_128Concat,
        T::AccountId,
        EncryptedAmount,
        ValueQuery,
    >;

    #[pallet::storage]
    pub type TotalSupply<T: Config> =
        StorageMap<_, Blake2_128Concat, T::AssetId, EncryptedAmount, ValueQuery>;

    #[pallet::genesis_config]
    #[derive(frame_support::DefaultNoBound)]
    pub struct GenesisConfig<T: Config> {
        /// (asset, account, plaintext amount in base units)
        pub balances: Vec<(T::AssetId, T::AccountId, u64)>,
    }

    #[pallet::genesis_build]
    impl<T: Config> BuildGenesisConfig for GenesisConfig<T> {
        fn build(&self) {
            for (asset, who, amount) in &self.balances {
                let encrypted = T::Fhe::as_encrypted(*amount);
                Pallet::<T>::do_credit(*asset, who, &encrypted)
                    .expect("genesis balances must not overflow the total supply");
            }
        }
    }

    #[pallet::event]
    #[pallet::generate_deposit(pub(super) fn deposit_event)]
    pub enum Event<T: Config> {
        Minted {
            asset: T::AssetId,
            to: T::AccountId,
            encrypted_amount: EncryptedAmount,
        },
        Debited {
            asset: T::AssetId,
            owner: T::AccountId,
            spender: T::AccountId,
            encrypted_amount: EncryptedAmount,
        },
        Credited {
            asset: T::AssetId,
            who: T::AccountId,
            encrypted_amount: EncryptedAmount,
        },
    }

    #[pallet::error]
    pub enum Error<T> {
        /// Spender is neither the owner nor an unexpired operator of the owner.
        UnauthorizedSpender,
        /// Encrypted balance is below the requested debit.
        InsufficientBalance,
        /// Credit would push the balance or the total supply past `u64::MAX`.
        BalanceOverflow,
        /// The encrypted-computation scheme rejected an operand.
        ArithmeticFailed,
    }

    #[pallet::pallet]
    pub struct Pallet<T>(_);

    // ---------- Read helpers ----------
    impl<T: Config> Pallet<T> {
        pub fn confidential_balance_of(asset: T::AssetId, who: &T::AccountId) -> EncryptedAmount {
            Balances::<T>::get(asset, who)
        }

        pub fn confidential_total_supply(asset: T::AssetId) -> EncryptedAmount {
            TotalSupply::<T>::get(asset)
        }

        pub fn decimals() -> u8 {
            T::Decimals::get()
        }
    }

    #[pallet::call]
    impl<T: Config> Pallet<T> {
        /// Faucet: credit a public `amount` to `to` as a fresh ciphertext.
        #[pallet::call_index(0)]
        #[pallet::weight(T::WeightInfo::mint())]
        pub fn mint(
            origin: OriginFor<T>,
            asset: T::AssetId,
            to: T::AccountId,
            amount: u64,
        ) -> DispatchResult {
            T::MintOrigin::ensure_origin(origin)?;
            let (encrypted_amount, _) =
                Self::do_credit(asset, &to, &T::Fhe::as_encrypted(amount))?;
            Self::deposit_event(Event::Minted {
                asset,
                to,
                encrypted_amount,
            });
            Ok(())
        }
    }

    impl<T: Config> Pallet<T> {
        #[inline]
        fn ensure_is_self_or_operator(
            holder: &T::AccountId,
            asset: &T::AssetId,
            caller: &T::AccountId,
        ) -> Result<(), Error<T>> {
            if caller == holder {
                return Ok(());
            }
            let now = T::Time::now().as_secs();
            if T::Operators::is_operator(holder, asset, caller, now) {
                Ok(())
            } else {
                Err(Error::<T>::UnauthorizedSpender)
            }
        }

        fn fhe_error(e: FheError) -> Error<T> {
            log::warn!(target: LOG_TARGET, "encrypted operation failed: {:?}", e);
            Error::<T>::ArithmeticFailed
        }

        /// `x + d` under the configured policy. Returns the amount actually added
        /// (`d`, or an encrypted zero under `TransferZero`) and the new value of `x`.
        fn guarded_increase(
            x: &EncryptedAmount,
            d: &EncryptedAmount,
        ) -> Result<(EncryptedAmount, EncryptedAmount), Error<T>> {
            let (ok, sum) = T::Fhe::try_increase(x, d).map_err(Self::fhe_error)?;
            match T::ShortfallPolicy::get() {
                ShortfallPolicy::Reject => {
                    let fits = T::Fhe::reveal_condition(&ok).map_err(Self::fhe_error)?;
                    ensure!(fits, Error::<T>::BalanceOverflow);
                    Ok((*d, sum))
                },
                ShortfallPolicy::TransferZero => {
                    let zero = T::Fhe::as_encrypted(0);
                    let added = T::Fhe::select(&ok, d, &zero).map_err(Self::fhe_error)?;
                    Ok((added, sum))
                },
            }
        }

        /// Returns `(credited, new_balance)`.
        pub(crate) fn do_credit(
            asset: T::AssetId,
            who: &T::AccountId,
            amount: &EncryptedAmount,
        ) -> Result<(EncryptedAmount, EncryptedAmount), Error<T>> {
            // Supply first: a balance never exceeds the supply, so once the supply
            // absorbs `credited` the balance does too.
            let (credited, supply) =
                Self::guarded_increase(&TotalSupply::<T>::get(asset), amount)?;
            let (credited, new_balance) =
                Self::guarded_increase(&Balances::<T>::get(asset, who), &credited)?;

            Balances::<T>::insert(asset, who, new_balance);
            TotalSupply::<T>::insert(asset, supply);
            T::Acl::allow(&new_balance, who);
            T::Acl::allow(&credited, who);
            Ok((credited, new_balance))
        }

        pub(crate) fn do_debit(
            asset: T::AssetId,
            owner: &T::AccountId,
            spender: &T::AccountId,
            amount: &EncryptedAmount,
        ) -> Result<Debit, Error<T>> {
            Self::ensure_is_self_or_operator(owner, &asset, spender)?;

            let balance = Balances::<T>::get(asset, owner);
            let (ok, new_balance) =
                T::Fhe::try_decrease(&balance, amount).map_err(Self::fhe_error)?;
            let transferred = match T::ShortfallPolicy::get() {
                ShortfallPolicy::Reject => {
                    let sufficient = T::Fhe::reveal_condition(&ok).map_err(Self::fhe_error)?;
                    ensure!(sufficient, Error::<T>::InsufficientBalance);
                    *amount
                },
                ShortfallPolicy::TransferZero => {
                    let zero = T::Fhe::as_encrypted(0);
                    T::Fhe::select(&ok, amount, &zero).map_err(Self::fhe_error)?
                },
            };
            let supply = T::Fhe::sub(&TotalSupply::<T>::get(asset), &transferred)
                .map_err(Self::fhe_error)?;

            Balances::<T>::insert(asset, owner, new_balance);
            TotalSupply::<T>::insert(asset, supply);
            T::Acl::allow(&new_balance, owner);
            T::Acl::allow(&transferred, owner);
            T::Acl::allow(&transferred, spender);
            Ok(Debit {
                transferred,
                new_balance,
            })
        }
    }
}

impl<T: Config> ConfidentialLedger<T::AccountId, T::AssetId> for Pallet<T> {
    fn balance_of(asset: T::AssetId, who: &T::AccountId) -> EncryptedAmount {
        Pallet::<T>::confidential_balance_of(asset, who)
    }

    fn debit_from(
        asset: T::AssetId,
        owner: &T::AccountId,
        spender: &T::AccountId,
        amount: &EncryptedAmount,
    ) -> Result<Debit, DispatchError> {
        let debit = Pallet::<T>::do_debit(asset, owner, spender, amount)?;
        log::debug!(
            target: LOG_TARGET,
            "debited {:?} from {:?} by {:?}",
            debit.transferred,
            owner,
            spender
        );
        Pallet::<T>::deposit_event(Event::Debited {
            asset,
            owner: owner.clone(),
            spender: spender.clone(),
            encrypted_amount: debit.transferred,
        });
        Ok(debit)
    }

    fn credit(
        asset: T::AssetId,
        who: &T::AccountId,
        amount: &EncryptedAmount,
    ) -> Result<EncryptedAmount, DispatchError> {
        let (credited, new_balance) = Pallet::<T>::do_credit(asset, who, amount)?;
        Pallet::<T>::deposit_event(Event::Credited {
            asset,
            who: who.clone(),
            encrypted_amount: credited,
        });
        Ok(new_balance)
    }
}
