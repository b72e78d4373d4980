// Worker-facing profile settings that feed recommendations, plus public profiles.

pub mod handlers;
