pub mod display;
pub mod token_count;
pub mod turn;
