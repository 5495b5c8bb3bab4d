pub(crate) mod admin;
pub(crate) mod assignments;
pub(crate) mod auth;
pub(crate) mod chats;
pub(crate) mod errors;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod live_sessions;
pub(crate) mod progress;
pub(crate) mod router;
pub(crate) mod submissions;
pub(crate) mod validation;
pub(crate) mod videos;
pub(crate) mod webhooks;
