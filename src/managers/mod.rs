// Managers module - focused helpers owned by the transport controller

pub mod broadcast_manager;

pub use broadcast_manager::BroadcastChannelManager;
