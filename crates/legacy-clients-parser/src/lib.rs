pub mod errors;
pub mod model;
pub mod normalize;
pub mod reader;
pub mod schema;

pub use errors::{ParserError, RejectReason, RowRejection};
pub use model::{FieldValue, LegacyClientRecord};
pub use normalize::{
    clean_text, normalize_row, parse_flag, parse_identifier, parse_integer, FlagTokens, RawRow,
};
pub use reader::{resolve_inputs, ClientCsvReader, ClientInputs, ReaderOptions, RowOutcome};
pub use schema::{
    target_columns, ClientField, ColumnKind, ColumnSpec, CLIENT_COLUMNS, COLUMN_COUNT,
    IDENTIFIER_COLUMN, IDENTIFIER_TARGET,
};
