use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("report line is missing `{0}`")]
    MissingField(&'static str),

    #[error("report field `{field}` is not a count: `{value}`")]
    InvalidCount { field: &'static str, value: String },

    #[error("unexpected token `{0}` in report line")]
    UnexpectedToken(String),
}
