use crate::{
    error::{AppError, AppResult},
    models::Recommendation,
    services::providers::CatalogProvider,
};

/// Searches both catalogs for a title
///
/// Books come first, then movies and TV. A catalog that fails contributes
/// nothing; an error is only returned when every catalog failed.
pub async fn search_titles(
    books: &dyn CatalogProvider,
    screen: &dyn CatalogProvider,
    query: &str,
) -> AppResult<Vec<Recommendation>> {
    let query = query.trim();
    if query.is_empty() {
        return Err(AppError::InvalidInput(
            "Search query cannot be empty".to_string(),
        ));
    }

    let (book_results, screen_results) = tokio::join!(books.search(query), screen.search(query));

    let mut titles = Vec::new();
    let mut errors = Vec::new();

    for (provider, outcome) in [
        (books.name(), book_results),
        (screen.name(), screen_results),
    ] {
        match outcome {
            Ok(found) => titles.extend(found),
            Err(e) => {
                tracing::warn!(error = %e, provider, query = %query, "Title search failed");
                errors.push(e);
            }
        }
    }

    if errors.len() == 2 {
        return Err(AppError::ExternalApi(
            "All catalogs failed to answer the search".to_string(),
        ));
    }

    Ok(titles)
}
