mod media;
mod roster;
mod service;

pub use service::SiteMutationService;
