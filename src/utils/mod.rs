pub mod erc4337;
pub mod erc7677;
pub mod relay;
pub mod serialize;
pub mod smart_account;
