#[cfg(test)]
mod tests {
    use futures::stream;
    use std::sync::Arc;
    use stitch::{Entity, MapperOptions, RowLabeled, Value, map};
    use uuid::Uuid;

    #[derive(Entity, Default, Clone, Debug)]
    #[entity(table = "orders")]
    struct Order {
        #[entity(kind = "uuid", pk)]
        id: Uuid,
        #[entity(fk = "id:order_id")]
        items: Vec<Arc<LineItem>>,
    }

    #[derive(Entity, Default, Clone, Debug)]
    #[entity(table = "line_items")]
    struct LineItem {
        #[entity(kind = "uuid", pk)]
        id: Uuid,
        #[entity(kind = "uuid")]
        order_id: Uuid,
        #[entity(kind = "string")]
        sku: String,
    }

    fn row(order_id: Uuid, item_id: Uuid, sku: &str) -> RowLabeled {
        let labels: Arc<[String]> = ["orders.id", "line_items.id", "line_items.order_id", "line_items.sku"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let values: Box<[Value]> = vec![
            Value::Uuid(order_id),
            Value::Uuid(item_id),
            Value::Uuid(order_id),
            Value::Str(sku.into()),
        ]
        .into_boxed_slice();
        RowLabeled::new(labels, values)
    }

    #[tokio::test]
    async fn repeated_rows_collapse_to_one_entity_per_distinct_pk() {
        let order_id = Uuid::new_v4();
        let item_a = Uuid::new_v4();
        let item_b = Uuid::new_v4();
        // A join against a second dimension (e.g. a shipment table) would
        // repeat `line_items` row `item_a` across multiple result rows even
        // though it is a single line item; the mapper must still produce
        // exactly one `LineItem` for it.
        let rows = vec![
            row(order_id, item_a, "mug"),
            row(order_id, item_a, "mug"),
            row(order_id, item_b, "hoodie"),
        ];
        let result = map::<Order>(
            stream::iter(rows.into_iter().map(Ok::<_, stitch::Error>)),
            MapperOptions::new(),
        )
        .await
        .expect("mapping should succeed");

        assert_eq!(result.row_count, 3);
        assert_eq!(result.data.len(), 1);
        assert_eq!(result.data[0].items.len(), 2);
    }

    #[tokio::test]
    async fn repeated_root_rows_collapse_too() {
        let order_id = Uuid::new_v4();
        let rows = vec![
            row(order_id, Uuid::new_v4(), "mug"),
            row(order_id, Uuid::new_v4(), "mug"),
        ];
        let result = map::<Order>(
            stream::iter(rows.into_iter().map(Ok::<_, stitch::Error>)),
            MapperOptions::new(),
        )
        .await
        .expect("mapping should succeed");

        assert_eq!(result.data.len(), 1, "same order id must yield one Order");
    }
}
