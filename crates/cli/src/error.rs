use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Every candidate endpoint failed; carries the last cause.
    #[error("could not reach the lead sync API after {attempts} attempt(s): {last}")]
    Connectivity { attempts: usize, last: String },

    /// A 2xx response whose body is markup, typically a web app's HTML page.
    #[error("expected JSON but the server returned markup: {snippet}")]
    UnexpectedContentType { snippet: String },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("{message}")]
    ApplicationError { message: String },

    #[error(
        "sync status not terminal after {polls} checks; the job may still be running on the server"
    )]
    Timeout { polls: u32 },

    /// The tracked job finished but its final status was replaced before it
    /// could be read.
    #[error("sync job {job_id} is no longer the current job; check the lead list for its results")]
    Superseded { job_id: String },

    #[error("{0}")]
    Validation(String),

    #[error("cancelled")]
    Cancelled,
}
