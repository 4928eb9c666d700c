//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use vidora_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vidora API",
        version = "0.1.0",
        description = "Social video-sharing API: channels, videos, comments, likes, subscriptions and playlists. All endpoints are versioned under /api/v1/."
    ),
    paths(
        // Health
        handlers::health::healthz,
        // Users & sessions
        handlers::users::register,
        handlers::users::login,
        handlers::users::logout,
        handlers::users::refresh,
        handlers::users::me,
        handlers::users::update_me,
        handlers::users::change_password,
        handlers::users::update_avatar,
        handlers::users::update_cover,
        handlers::users::channel_profile,
        // Videos
        handlers::videos::create_video,
        handlers::videos::list_videos,
        handlers::videos::get_video,
        handlers::videos::update_video,
        handlers::videos::replace_thumbnail,
        handlers::videos::toggle_publish,
        handlers::videos::delete_video,
        // Comments
        handlers::comments::list_comments,
        handlers::comments::create_comment,
        handlers::comments::update_comment,
        handlers::comments::delete_comment,
        // Likes
        handlers::likes::toggle_video_like,
        handlers::likes::toggle_comment_like,
        handlers::likes::liked_videos,
        // Subscriptions
        handlers::subscriptions::toggle_subscription,
        handlers::subscriptions::list_subscribers,
        handlers::subscriptions::my_subscriptions,
        // Playlists
        handlers::playlists::create_playlist,
        handlers::playlists::get_playlist,
        handlers::playlists::playlist_videos,
        handlers::playlists::channel_playlists,
        handlers::playlists::update_playlist,
        handlers::playlists::delete_playlist,
        handlers::playlists::add_video,
        handlers::playlists::remove_video,
        // Dashboard
        handlers::dashboard::stats,
        handlers::dashboard::my_videos,
    ),
    components(schemas(
        error::ErrorResponse,
        models::UserResponse,
        models::ChannelProfile,
        models::ChannelSummary,
        models::ChannelStats,
        models::TokenPair,
        models::VideoResponse,
        models::CommentResponse,
        models::PlaylistResponse,
        handlers::health::HealthResponse,
        handlers::users::RegisterRequest,
        handlers::users::LoginRequest,
        handlers::users::LoginResponse,
        handlers::users::RefreshRequest,
        handlers::users::UpdateProfileRequest,
        handlers::users::ChangePasswordRequest,
        handlers::users::AssetUrlResponse,
        handlers::videos::UpdateVideoRequest,
        handlers::videos::PublishResponse,
        handlers::videos::ThumbnailResponse,
        handlers::comments::CommentRequest,
        handlers::likes::LikeResponse,
        handlers::subscriptions::SubscribeResponse,
        handlers::playlists::CreatePlaylistRequest,
        handlers::playlists::UpdatePlaylistRequest,
    )),
    tags(
        (name = "health", description = "Service health"),
        (name = "users", description = "Accounts and sessions"),
        (name = "channels", description = "Public channel profiles"),
        (name = "videos", description = "Video upload and management"),
        (name = "comments", description = "Video comments"),
        (name = "likes", description = "Likes on videos and comments"),
        (name = "subscriptions", description = "Channel subscriptions"),
        (name = "playlists", description = "Playlists"),
        (name = "dashboard", description = "Channel-owner dashboard")
    )
)]
pub struct ApiDoc;
