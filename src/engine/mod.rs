pub mod pnl;
pub mod selector;
pub mod verification;
