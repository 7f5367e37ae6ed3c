use crate as pallet_confidential_assets;
use confidential_assets_primitives::{Handle, ShortfallPolicy};
use fhe_simulator::{client, Simulator};
use frame_support::{derive_impl, parameter_types, traits::ConstU64};
use frame_system::EnsureRoot;
use sp_runtime::BuildStorage;

type Block = frame_system::mocking::MockBlock<Test>;

frame_support::construct_runtime!(
    pub enum Test {
        System: frame_system,
        Timestamp: pallet_timestamp,
        Operators: pallet_operators,
        Acl: pallet_acl,
        ConfidentialAssets: pallet_confidential_assets,
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
    pub const Decimals: u8 = 6;
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
    type Decimals = Decimals;
    type WeightInfo = ();
}

pub const ALICE: u64 = 1;
pub const BOB: u64 = 2;
pub const ETH: u32 = 0;
pub const USDT: u32 = 1;
pub const UNIT: u64 = 1_000_000;
/// Unix seconds at the start of every test.
pub const NOW: u64 = 1_700_000_000;

pub fn new_test_ext() -> sp_io::TestExternalities {
    ExtBuilder::default().build()
}

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

/// Plaintext balance as the key holder would see it.
pub fn plain_balance(asset: u32, who: u64) -> u64 {
    client::decrypt(&ConfidentialAssets::confidential_balance_of(asset, &who))
        .expect("ledger handles decrypt")
}

pub fn plain(handle: &Handle) -> u64 {
    client::decrypt(handle).expect("ledger handles decrypt")
}
