// Reviews between users who worked together, and the rating aggregate they feed.

pub mod handlers;
pub mod rating;
