pub(crate) mod admin_emails;
pub(crate) mod assignments;
pub(crate) mod chats;
pub(crate) mod health;
pub(crate) mod live_sessions;
pub(crate) mod profiles;
pub(crate) mod progress;
pub(crate) mod submissions;
pub(crate) mod users;
pub(crate) mod videos;
