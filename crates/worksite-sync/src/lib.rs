mod controller;

pub use controller::{LiveSyncController, OverrideKey, SyncConfig};
