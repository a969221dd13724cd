pub mod config;
pub mod crud;
pub mod shared;
pub mod storage;
pub mod urls;
