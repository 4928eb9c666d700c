//! HTTP handlers, one module per feature area.

pub mod comments;
pub mod dashboard;
pub mod health;
pub mod likes;
pub mod playlists;
pub mod subscriptions;
pub mod users;
pub mod videos;
