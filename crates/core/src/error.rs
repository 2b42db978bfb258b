use miette::Diagnostic;
use thiserror::Error;

use crate::config::ConfigError;
use crate::curve::CurveError;
use crate::deserialize::DeserializeError;
use crate::interpret::WalkError;
use crate::processor::ProcessorError;
use crate::tags::TagError;

pub type DsResult<T> = Result<T, DsError>;

/// Every failure the dialogue runtime can report, grouped by the stage that produced it.
#[derive(Debug, Error, Diagnostic)]
pub enum DsError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Tag(#[from] TagError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Curve(#[from] CurveError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Deserialize(#[from] DeserializeError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Processor(#[from] ProcessorError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Walk(#[from] WalkError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}
