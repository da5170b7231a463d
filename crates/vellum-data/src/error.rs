use vellum_core::ResourceError;

/// Errors raised while reading, writing or describing datasheets.
#[derive(Debug, thiserror::Error)]
pub enum DatasheetError {
    /// The document is not well-formed XML.
    #[error("parse error in {file}: {detail}")]
    Parse { file: String, detail: String },

    /// The root element is not `<Datasheet>`.
    #[error("{file}: expected a <Datasheet> root element, found <{found}>")]
    UnexpectedRoot { file: String, found: String },

    /// The document could not be serialized.
    #[error("failed to write {file}: {detail}")]
    Write { file: String, detail: String },

    #[error("datasheet object type '{0}' is already registered")]
    DuplicateObjectType(String),

    #[error("datasheet enum '{0}' is already registered")]
    DuplicateEnum(String),

    #[error("unknown datasheet object type '{0}'")]
    UnknownObjectType(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DatasheetError {
    /// Attach the failing resource id for the manager's error taxonomy.
    pub fn into_load_error(self, id: &str) -> ResourceError {
        ResourceError::Load {
            id: id.to_string(),
            detail: self.to_string(),
        }
    }

    pub fn into_save_error(self, id: &str) -> ResourceError {
        ResourceError::Save {
            id: id.to_string(),
            detail: self.to_string(),
        }
    }
}

impl From<DatasheetError> for ResourceError {
    fn from(error: DatasheetError) -> Self {
        match error {
            DatasheetError::Io(e) => ResourceError::Io(e),
            DatasheetError::Parse { ref file, .. }
            | DatasheetError::UnexpectedRoot { ref file, .. } => ResourceError::Load {
                id: file.clone(),
                detail: error.to_string(),
            },
            DatasheetError::Write { ref file, .. } => ResourceError::Save {
                id: file.clone(),
                detail: error.to_string(),
            },
            DatasheetError::UnknownObjectType(ref name) => ResourceError::UnresolvedType {
                id: name.clone(),
            },
            DatasheetError::DuplicateObjectType(ref name) | DatasheetError::DuplicateEnum(ref name) => {
                ResourceError::DuplicateId {
                    id: name.clone(),
                    registered_path: String::new(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_keep_the_detail() {
        let err: ResourceError = DatasheetError::UnexpectedRoot {
            file: "orc.unit".into(),
            found: "Unit".into(),
        }
        .into();
        match err {
            ResourceError::Load { id, detail } => {
                assert_eq!(id, "orc.unit");
                assert!(detail.contains("<Unit>"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = DatasheetError::Parse {
            file: "a.unit".into(),
            detail: "eof".into(),
        }
        .into_load_error("a.unit");
        assert!(matches!(err, ResourceError::Load { .. }));
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ResourceError = DatasheetError::from(io).into();
        assert!(matches!(err, ResourceError::Io(_)));
    }
}
