pub mod candles;
pub mod sync_checkpoints;
