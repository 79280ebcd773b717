pub mod address;
pub mod amount;
pub mod lifecycle;

pub use address::AccountAddress;
pub use amount::{TokenAmount, TOKEN_BASE_UNIT, TOKEN_DECIMALS};
pub use lifecycle::LifecycleState;
