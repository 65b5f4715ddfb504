use gf_core::TruckCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FleetError {
    #[error("route for truck {0} has no nodes")]
    EmptyRoute(TruckCode),

    #[error("route for truck {truck} has {nodes} nodes but {tags} tags")]
    TagLengthMismatch {
        truck: TruckCode,
        nodes: usize,
        tags:  usize,
    },

    #[error("unknown vehicle class {0:?}")]
    UnknownClass(String),

    #[error("unknown truck status {0:?}")]
    UnknownStatus(String),
}

pub type FleetResult<T> = Result<T, FleetError>;
