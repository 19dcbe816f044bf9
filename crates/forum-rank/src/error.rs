#[derive(Debug, thiserror::Error)]
pub enum Error<S, C>
where
    S: std::error::Error + 'static,
    C: std::error::Error + 'static,
{
    #[error("data source error: {0}")]
    DataSource(#[source] S),
    #[error("cache error: {0}")]
    Cache(#[source] C),
}
