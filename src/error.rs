use thiserror::Error;

/// Conditions reported back to the user instead of rendering a view.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DashboardError {
    /// Upload or export extension the crate cannot handle.
    #[error("unsupported file format '{extension}'")]
    UnsupportedFormat { extension: String },

    #[error("the dataset must contain a 'Date' column")]
    MissingDateColumn,

    /// Every row was dropped while normalizing dates, or a filter left nothing.
    #[error("the dataset has no rows with a valid 'Date'")]
    EmptyDataset,

    #[error("the dataset has no numeric columns to use as KPIs")]
    NoNumericColumns,

    #[error("column '{name}' not found")]
    UnknownColumn { name: String },

    #[error("column '{name}' is not numeric and cannot be used as a KPI")]
    NotNumeric { name: String },

    #[error("column '{name}' appears more than once in the header")]
    DuplicateColumn { name: String },

    #[error("unknown interval '{value}'; expected one of 1W, 1M, 3M, 6M, 1Y, 3Y")]
    InvalidInterval { value: String },

    #[error("invalid financial year '{value}'; expected a label such as FY2022-23")]
    InvalidFinancialYear { value: String },

    #[error("invalid date range '{value}'; expected START:END as YYYY-MM-DD")]
    InvalidRange { value: String },

    #[error("range index {index} out of bounds for {len} comparison range(s)")]
    RangeIndex { index: usize, len: usize },
}
