pub(crate) mod ai_feedback;
pub(crate) mod anthropic;
pub(crate) mod badges;
pub(crate) mod gamification;
pub(crate) mod storage;
pub(crate) mod tutor;
pub(crate) mod youtube;
