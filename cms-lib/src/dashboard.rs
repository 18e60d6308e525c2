//! Admin dashboard: record counts per entity.

use std::sync::Arc;

use crate::api::ModelApi;
use crate::model::EntityKind;

/// Entities shown on the dashboard, in display order.
pub const DASHBOARD_ENTITIES: [EntityKind; 5] = [
    EntityKind::User,
    EntityKind::Post,
    EntityKind::Category,
    EntityKind::Tag,
    EntityKind::Todo,
];

/// Record count for one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityStat {
    pub entity: EntityKind,
    /// `None` when listing the entity failed.
    pub count: Option<usize>,
}

impl EntityStat {
    /// Count as shown on a card; failures show as `-`.
    pub fn display_count(&self) -> String {
        match self.count {
            Some(count) => count.to_string(),
            None => crate::table::PLACEHOLDER.to_string(),
        }
    }
}

/// Counts the records of each entity.
///
/// A failed list is logged and reported as a missing count; the other
/// entities are still counted.
pub async fn entity_stats<F>(entities: &[EntityKind], model: F) -> Vec<EntityStat>
where
    F: Fn(EntityKind) -> Arc<dyn ModelApi>,
{
    let mut stats = Vec::with_capacity(entities.len());

    for &entity in entities {
        let count = match model(entity).list().await {
            Ok(records) => Some(records.len()),
            Err(e) => {
                log::error!("Error loading {} stats: {}", entity, e);
                None
            }
        };
        stats.push(EntityStat { entity, count });
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryBackend;
    use crate::model::Record;

    #[tokio::test]
    async fn test_counts_per_entity() {
        let backend = MemoryBackend::new();
        let tags = backend.model(EntityKind::Tag);
        for name in ["Rock", "Jazz"] {
            tags.create(Record::new().set("name", name).set("slug", name.to_lowercase()))
                .await
                .unwrap();
        }
        backend
            .model(EntityKind::Todo)
            .create(Record::new().set("content", "Write docs"))
            .await
            .unwrap();

        let model = |e: EntityKind| -> Arc<dyn ModelApi> { Arc::new(backend.model(e)) };
        let stats = entity_stats(&DASHBOARD_ENTITIES, model).await;

        let counts: Vec<(EntityKind, Option<usize>)> = stats.iter().map(|s| (s.entity, s.count)).collect();
        assert_eq!(
            counts,
            vec![
                (EntityKind::User, Some(0)),
                (EntityKind::Post, Some(0)),
                (EntityKind::Category, Some(0)),
                (EntityKind::Tag, Some(2)),
                (EntityKind::Todo, Some(1)),
            ]
        );
        assert_eq!(stats[3].display_count(), "2");
    }

    #[test]
    fn test_failed_count_display() {
        let stat = EntityStat {
            entity: EntityKind::Post,
            count: None,
        };
        assert_eq!(stat.display_count(), "-");
    }
}
