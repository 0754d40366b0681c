pub mod activity;
pub mod notification;
pub mod remote;
pub mod trip;
