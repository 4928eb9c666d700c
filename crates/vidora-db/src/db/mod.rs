pub mod comments;
pub mod likes;
pub mod playlists;
pub mod subscriptions;
pub mod traits;
pub mod users;
pub mod videos;
