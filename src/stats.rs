//! Per-category job counts for the category tabs

use crate::core::error::FetchError;
use crate::core::provider::CollectionProvider;
use crate::core::query::RemoteQuery;
use crate::entities::Job;
use futures::future::join_all;
use indexmap::IndexMap;

/// Count jobs per category, one provider query per category, all in flight
/// at once
///
/// The result keeps the order of `categories`. Any failed query fails the
/// whole count.
pub async fn category_counts(
    provider: &dyn CollectionProvider<Job>,
    categories: &[String],
) -> Result<IndexMap<String, usize>, FetchError> {
    let queries = categories.iter().map(|category| async move {
        let query = RemoteQuery::new().where_eq("category", category.clone());
        let jobs = provider.query(&query).await?;
        Ok::<_, FetchError>((category.clone(), jobs.len()))
    });

    let counts = join_all(queries)
        .await
        .into_iter()
        .collect::<Result<IndexMap<_, _>, _>>()?;

    tracing::debug!(categories = counts.len(), "category counts computed");
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryCollection;

    fn job(id: &str, category: &str) -> Job {
        Job {
            id: id.to_string(),
            title: format!("Job {}", id),
            category: category.to_string(),
            location: "Nairobi".to_string(),
            pay: Some(1000),
            pay_period: None,
            requirements: vec![],
            description: None,
            employer_id: None,
            status: None,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_counts_in_category_order() {
        let store = InMemoryCollection::with_documents(vec![
            job("1", "Farming"),
            job("2", "Cleaning"),
            job("3", "Farming"),
        ]);
        let categories = vec![
            "Construction".to_string(),
            "Farming".to_string(),
            "Cleaning".to_string(),
        ];

        let counts = category_counts(&store, &categories).await.unwrap();
        let pairs: Vec<(&str, usize)> = counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        assert_eq!(pairs, vec![("Construction", 0), ("Farming", 2), ("Cleaning", 1)]);
    }
}
