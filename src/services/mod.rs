pub mod daily_highlight;
pub mod position_refresher;
pub mod verification_runner;
