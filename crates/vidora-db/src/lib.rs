//! Database layer: sqlx/PostgreSQL repositories, one per aggregate, plus the
//! abstract store traits consumed by the auth and asset services.

mod db;

pub use db::comments::CommentRepository;
pub use db::likes::LikeRepository;
pub use db::playlists::PlaylistRepository;
pub use db::subscriptions::SubscriptionRepository;
pub use db::traits::{PrincipalStore, VideoStore};
pub use db::users::UserRepository;
pub use db::videos::{VideoFilter, VideoRepository};
