pub mod accounts;
pub mod cli;
pub mod config;
pub mod state;
pub mod storage;

#[cfg(test)]
mod testing;
