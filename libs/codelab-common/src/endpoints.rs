/// Judge endpoint semantics - defines only path segments, not transport logic.
/// Keeps the client and any stub judge in agreement on where requests go.
/// Segments are raw; whoever builds the URL escapes them.

pub const SUBMIT_SEGMENT: &str = "submit";
pub const STATUS_SEGMENT: &str = "status";

/// Path segments of the submit endpoint, relative to the judge base URL
pub fn submit_path() -> [&'static str; 1] {
    [SUBMIT_SEGMENT]
}

/// Path segments of the status endpoint for one submission
pub fn status_path(submission_id: &str) -> [&str; 2] {
    [STATUS_SEGMENT, submission_id]
}
