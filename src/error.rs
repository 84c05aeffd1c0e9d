use crate::{catalog::DataError, catalog::InputError, writer::OutputError};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to load the input data")]
    Input(#[from] InputError),
    #[error("failed to write the point cloud")]
    Output(#[from] OutputError),
    #[error("invalid catalog data")]
    Data(#[from] DataError),
}
pub type Result<T> = std::result::Result<T, Error>;
