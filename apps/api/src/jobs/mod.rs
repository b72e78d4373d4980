// Job postings: creation, the owner's list, deletion and radius search.

pub mod handlers;
pub mod validation;
