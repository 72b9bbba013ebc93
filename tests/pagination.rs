#[cfg(test)]
mod tests {
    use futures::stream;
    use std::sync::Arc;
    use stitch::{Entity, MapperOptions, RowLabeled, Value, map};
    use uuid::Uuid;

    #[derive(Entity, Default, Clone, Debug)]
    #[entity(table = "widgets")]
    struct Widget {
        #[entity(kind = "uuid", pk)]
        id: Uuid,
        #[entity(kind = "string")]
        name: String,
    }

    fn row(id: Uuid, name: &str, paginate_total: i64) -> RowLabeled {
        let labels: Arc<[String]> = ["widgets.id", "widgets.name", "paginate_total"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let values: Box<[Value]> = vec![Value::Uuid(id), Value::Str(name.into()), Value::Int64(paginate_total)]
            .into_boxed_slice();
        RowLabeled::new(labels, values)
    }

    #[tokio::test]
    async fn last_row_wins_the_pagination_total() {
        let rows: Vec<RowLabeled> = (0..10)
            .map(|i| row(Uuid::new_v4(), &format!("widget-{i}"), 42))
            .collect();
        let result = map::<Widget>(
            stream::iter(rows.into_iter().map(Ok::<_, stitch::Error>)),
            MapperOptions::new(),
        )
        .await
        .expect("mapping should succeed");

        assert_eq!(result.row_count, 10);
        assert_eq!(result.paginate_total, 42);
        assert_eq!(result.data.len(), 10);
    }

    #[tokio::test]
    async fn idempotence_of_empty_result() {
        let rows: Vec<RowLabeled> = Vec::new();
        let result = map::<Widget>(
            stream::iter(rows.into_iter().map(Ok::<_, stitch::Error>)),
            MapperOptions::new(),
        )
        .await
        .expect("mapping an empty stream should not error");

        assert_eq!(result.row_count, 0);
        assert_eq!(result.paginate_total, 0);
        assert!(result.data.is_empty());
        assert!(result.columns.is_empty());
    }
}
