/// A database entity with a table name, id column, and column list.
///
/// Implemented manually for each of the canonical schema's tables
/// (`Provider`, `Source`, `Author`, `Post`, `Media`, `Cursor`, `FetchJob`).
pub trait Entity: Send + Sync + Unpin + 'static {
    type Id: Send + Sync + ToString + 'static;

    fn table_name() -> &'static str;
    fn id_column() -> &'static str;
    fn columns() -> &'static [&'static str];
    fn id(&self) -> &Self::Id;
}
