use thiserror::Error;

#[derive(Error, Debug)]
pub enum HearthError {
    #[error("Error loading and preprocessing data: {0}")]
    Load(String),

    #[error("Error calculating financial scores: {0}")]
    Score(String),

    #[error("Error generating visualizations: {0}")]
    Aggregate(String),

    #[error("Upload rejected: {0}")]
    Upload(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, HearthError>;

/// A column the current stage needs is absent from the table.
#[derive(Error, Debug)]
#[error("column not found: {0}")]
pub struct MissingColumn(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_errors_carry_stage_prefix() {
        let e = HearthError::Load("column not found: Transaction Date".into());
        assert_eq!(
            e.to_string(),
            "Error loading and preprocessing data: column not found: Transaction Date"
        );
        let e = HearthError::Score("column not found: Income".into());
        assert!(e.to_string().starts_with("Error calculating financial scores"));
        let e = HearthError::Aggregate("column not found: Category".into());
        assert!(e.to_string().starts_with("Error generating visualizations"));
    }
}
