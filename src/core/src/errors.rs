use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnipeError {
    /// Raised for internal errors in the libraries.  Should not happen.
    #[error("internal error: {message:?}")]
    Internal { message: String },

    #[error("Please select files before starting sketching.")]
    NoFilesSelected,

    #[error("unknown sketch option: {name:?}")]
    UnknownOption { name: String },

    #[error("invalid value {value:?} for option {name}")]
    InvalidOptionValue { name: String, value: String },

    #[error("no signature computed yet for {filename:?}")]
    MissingSignature { filename: String },

    #[error("sketch worker unavailable: {message}")]
    WorkerUnavailable { message: String },

    #[error(transparent)]
    SerdeError(#[from] serde_json::error::Error),

    #[error(transparent)]
    ZipError(#[from] zip::result::ZipError),

    #[error(transparent)]
    IOError(#[from] std::io::Error),
}

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnipeErrorCode {
    // no error
    NoError = 0,
    // internals
    Internal = 2,
    // user input errors
    NoFilesSelected = 1_01,
    UnknownOption = 1_02,
    InvalidOptionValue = 1_03,
    MissingSignature = 1_04,
    // worker errors
    WorkerUnavailable = 2_01,
    // external errors
    Io = 100_001,
    SerdeError = 100_004,
    ZipError = 100_006,
}

impl SnipeErrorCode {
    pub fn from_error(error: &SnipeError) -> SnipeErrorCode {
        match error {
            SnipeError::Internal { .. } => SnipeErrorCode::Internal,
            SnipeError::NoFilesSelected => SnipeErrorCode::NoFilesSelected,
            SnipeError::UnknownOption { .. } => SnipeErrorCode::UnknownOption,
            SnipeError::InvalidOptionValue { .. } => SnipeErrorCode::InvalidOptionValue,
            SnipeError::MissingSignature { .. } => SnipeErrorCode::MissingSignature,
            SnipeError::WorkerUnavailable { .. } => SnipeErrorCode::WorkerUnavailable,
            SnipeError::SerdeError { .. } => SnipeErrorCode::SerdeError,
            SnipeError::ZipError { .. } => SnipeErrorCode::ZipError,
            SnipeError::IOError { .. } => SnipeErrorCode::Io,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn codes_follow_variants() {
        let err = SnipeError::MissingSignature {
            filename: "a.fa".into(),
        };
        assert_eq!(
            SnipeErrorCode::from_error(&err),
            SnipeErrorCode::MissingSignature
        );
        assert_eq!(SnipeErrorCode::from_error(&err) as u32, 104);
        assert_eq!(
            SnipeErrorCode::from_error(&SnipeError::NoFilesSelected),
            SnipeErrorCode::NoFilesSelected
        );
    }

    #[test]
    fn no_files_message_is_user_facing() {
        assert_eq!(
            SnipeError::NoFilesSelected.to_string(),
            "Please select files before starting sketching."
        );
    }
}
