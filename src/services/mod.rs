pub mod activities;
pub mod api;
pub mod mock;
pub mod storage;
pub mod trips;
