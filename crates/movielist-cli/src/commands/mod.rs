pub mod clear;
pub mod config;
pub mod list;
pub mod login;
pub mod mutate;
pub mod prompts;
pub mod search;
