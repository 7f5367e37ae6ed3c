use crate as pallet_confidential_swaps;
use confidential_assets_primitives::{DecryptionAcl, Handle, ShortfallPolicy};
use fhe_simulator::{
    client::{self, EncryptedInput},
    Simulator,
};
use frame_support::{
    derive_impl, parameter_types,
    traits::{ConstU32, ConstU64, ConstU8},
    PalletId,
};
use frame_system::EnsureRoot;
use sp_runtime::BuildStorage;

type Block = frame_system::mocking::MockBlock<Test>;

frame_support::construct_runtime!(
    pub enum Test {
        System: frame_system,
        Timestamp: pallet_timestamp,
        Operators: pallet_operators,
        Acl: pallet_acl,
        Ledger: pallet_confidential_assets,
        Swaps: pallet_confidential_swaps,
    }
);

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Test {
    type Block = Block;
}

impl pallet_timestamp::Config for Test {
    type Moment = u64;
    type OnTimestampSet = ();
    type MinimumPeriod = ConstU64<1>;
    type WeightInfo = ();
}

impl pallet_operators::Config for Test {
    type RuntimeEvent = RuntimeEvent;
    type AssetId = u32;
    type WeightInfo = ();
}

impl pallet_acl::Config for Test {
    type RuntimeEvent = RuntimeEvent;
    type WeightInfo = ();
}

parameter_types! {
    pub static Policy: ShortfallPolicy = ShortfallPolicy::Reject;
    pub static Rate: u64 = 3_300;
    pub const SwapPalletId: PalletId = PalletId(*b"py/cswap");
}

impl pallet_confidential_assets::Config for Test {
    type RuntimeEvent = RuntimeEvent;
    type AssetId = u32;
    type Fhe = Simulator;
    type Operators = Operators;
    type Acl = Acl;
    type Time = Timestamp;
    type ShortfallPolicy = Policy;
    type MintOrigin = EnsureRoot<u64>;
    type Decimals = ConstU8<6>;
    type WeightInfo = ();
}

impl pallet_confidential_swaps::Config for Test {
    type RuntimeEvent = RuntimeEvent;
    type AssetId = u32;
    type Fhe = Simulator;
    type Ledger = Ledger;
    type Acl = Acl;
    type PalletId = SwapPalletId;
    type Rate = Rate;
    type MaxInputBits = ConstU8<48>;
    type EthAsset = ConstU32<ETH>;
    type UsdtAsset = ConstU32<USDT>;
    type WeightInfo = ();
}

pub const ALICE: u64 = 1;
pub const BOB: u64 = 2;
pub const ETH: u32 = 0;
pub const USDT: u32 = 1;
pub const UNIT: u64 = 1_000_000;
pub const NOW: u64 = 1_700_000_000;

#[derive(Default)]
pub struct ExtBuilder {
    balances: Vec<(u32, u64, u64)>,
}

impl ExtBuilder {
    pub fn balance(mut self, asset: u32, who: u64, amount: u64) -> Self {
        self.balances.push((asset, who, amount));
        self
    }

    pub fn build(self) -> sp_io::TestExternalities {
        Policy::set(ShortfallPolicy::Reject);
        Rate::set(3_300);
        let mut storage = frame_system::GenesisConfig::<Test>::default()
            .build_storage()
            .expect("valid default genesis storage");
        pallet_confidential_assets::GenesisConfig::<Test> {
            balances: self.balances,
        }
        .assimilate_storage(&mut storage)
        .expect("valid ledger genesis storage");
        let mut ext = sp_io::TestExternalities::new(storage);
        ext.execute_with(|| {
            System::set_block_number(1);
            Timestamp::set_timestamp(NOW * 1_000);
        });
        ext
    }
}

pub fn engine() -> u64 {
    Swaps::account_id()
}

/// Let the engine debit `who`'s `asset` for the next hour.
pub fn authorize(who: u64, asset: u32) {
    Operators::set_operator(RuntimeOrigin::signed(who), asset, engine(), NOW + 3_600)
        .expect("signed origin may set an operator");
}

/// Client side: encrypt `value` as `who` for the engine.
pub fn input(who: u64, value: u64, seed: u64) -> EncryptedInput {
    client::encrypt_for(value, &engine(), &who, seed)
}

pub fn plain_balance(asset: u32, who: u64) -> u64 {
    client::decrypt(&Ledger::confidential_balance_of(asset, &who)).expect("ledger handles decrypt")
}

pub fn plain_supply(asset: u32) -> u64 {
    client::decrypt(&Ledger::confidential_total_supply(asset)).expect("ledger handles decrypt")
}

/// Decryption service: answers only accounts the ACL allows on `handle`.
pub fn user_decrypt(who: u64, handle: &Handle) -> Option<u64> {
    if !<Acl as DecryptionAcl<u64>>::is_allowed(handle, &who) {
        return None;
    }
    client::decrypt(handle).ok()
}
