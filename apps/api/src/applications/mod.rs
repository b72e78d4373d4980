// Worker applications to job postings. `hasApplied` in recommendations is read from here,
// and a finished application is what lets two users review each other.

pub mod handlers;
pub mod transitions;
