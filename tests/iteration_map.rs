#[cfg(test)]
mod tests {
    use futures::stream;
    use std::sync::Arc;
    use stitch::{Entity, IterationCapture, IterationMode, MapperOptions, RowLabeled, Value, map};
    use uuid::Uuid;

    #[derive(Entity, Default, Clone, Debug)]
    #[entity(table = "widgets")]
    struct Widget {
        #[entity(kind = "uuid", pk)]
        id: Uuid,
        #[entity(kind = "string")]
        name: String,
    }

    fn row(id: Uuid, name: &str) -> RowLabeled {
        let labels: Arc<[String]> = ["widgets.id", "widgets.name"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let values: Box<[Value]> = vec![Value::Uuid(id), Value::Str(name.into())].into_boxed_slice();
        RowLabeled::new(labels, values)
    }

    #[tokio::test]
    async fn map_mode_keys_by_column_and_keeps_the_last_row_for_duplicates() {
        let key = Uuid::new_v4();
        let rows = vec![row(key, "first"), row(key, "second")];
        let mut options = MapperOptions::new();
        options.iteration = IterationMode::Map {
            pk_columns: vec!["widgets.id"],
            store_columns: None,
        };
        let result = map::<Widget>(
            stream::iter(rows.into_iter().map(Ok::<_, stitch::Error>)),
            options,
        )
        .await
        .expect("mapping should succeed");

        let IterationCapture::Map(captured) = result.iteration else {
            panic!("expected map-mode iteration capture");
        };
        assert_eq!(captured.len(), 1);
        let entry = captured.get(&key.to_string()).expect("key should be present");
        assert_eq!(
            entry.get("widgets.name"),
            Some(&Value::Str("second".into())),
            "later rows overwrite earlier ones"
        );
    }

    #[tokio::test]
    async fn map_mode_store_columns_restricts_the_captured_row() {
        let key = Uuid::new_v4();
        let rows = vec![row(key, "first")];
        let mut options = MapperOptions::new();
        options.iteration = IterationMode::Map {
            pk_columns: vec!["widgets.id"],
            store_columns: Some(vec!["widgets.name"]),
        };
        let result = map::<Widget>(
            stream::iter(rows.into_iter().map(Ok::<_, stitch::Error>)),
            options,
        )
        .await
        .expect("mapping should succeed");

        let IterationCapture::Map(captured) = result.iteration else {
            panic!("expected map-mode iteration capture");
        };
        let entry = captured.get(&key.to_string()).expect("key should be present");
        assert_eq!(entry.len(), 1, "only the requested column is captured");
        assert!(!entry.contains_key("widgets.id"));
    }

    #[tokio::test]
    async fn map_mode_skips_rows_whose_key_columns_are_canonical_zero() {
        let rows = vec![row(Uuid::nil(), "ghost")];
        let mut options = MapperOptions::new();
        options.iteration = IterationMode::Map {
            pk_columns: vec!["widgets.id"],
            store_columns: None,
        };
        let result = map::<Widget>(
            stream::iter(rows.into_iter().map(Ok::<_, stitch::Error>)),
            options,
        )
        .await
        .expect("mapping should succeed");

        let IterationCapture::Map(captured) = result.iteration else {
            panic!("expected map-mode iteration capture");
        };
        assert!(captured.is_empty(), "a nil-uuid key row contributes no entry");
    }

    #[tokio::test]
    async fn list_mode_keeps_one_entry_per_row_before_dedup() {
        let key = Uuid::new_v4();
        let rows = vec![row(key, "first"), row(key, "first")];
        let mut options = MapperOptions::new();
        options.iteration = IterationMode::List;
        let result = map::<Widget>(
            stream::iter(rows.into_iter().map(Ok::<_, stitch::Error>)),
            options,
        )
        .await
        .expect("mapping should succeed");

        let IterationCapture::List(captured) = result.iteration else {
            panic!("expected list-mode iteration capture");
        };
        assert_eq!(captured.len(), 2, "iteration capture predates dedup");
        assert_eq!(result.data.len(), 1, "but the entity graph itself dedupes");
    }

    #[tokio::test]
    async fn missing_iteration_column_is_an_error() {
        let rows = vec![row(Uuid::new_v4(), "first")];
        let mut options = MapperOptions::new();
        options.iteration = IterationMode::Map {
            pk_columns: vec!["widgets.does_not_exist"],
            store_columns: None,
        };
        let result = map::<Widget>(
            stream::iter(rows.into_iter().map(Ok::<_, stitch::Error>)),
            options,
        )
        .await;

        assert!(result.is_err());
    }
}
