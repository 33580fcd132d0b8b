pub mod nba_stats;
pub mod openai;
