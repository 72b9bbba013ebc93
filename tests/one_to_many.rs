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
        #[entity(kind = "string")]
        code: String,
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
        let labels: Arc<[String]> = [
            "orders.id",
            "orders.code",
            "line_items.id",
            "line_items.order_id",
            "line_items.sku",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let values: Box<[Value]> = vec![
            Value::Uuid(order_id),
            Value::Str("A-1".into()),
            Value::Uuid(item_id),
            Value::Uuid(order_id),
            Value::Str(sku.into()),
        ]
        .into_boxed_slice();
        RowLabeled::new(labels, values)
    }

    #[tokio::test]
    async fn one_order_fans_out_to_every_line_item() {
        let order_id = Uuid::new_v4();
        let rows = vec![
            row(order_id, Uuid::new_v4(), "mug"),
            row(order_id, Uuid::new_v4(), "hoodie"),
            row(order_id, Uuid::new_v4(), "sticker"),
        ];
        let result = map::<Order>(
            stream::iter(rows.into_iter().map(Ok::<_, stitch::Error>)),
            MapperOptions::new(),
        )
        .await
        .expect("mapping should succeed");

        assert_eq!(result.row_count, 3);
        assert_eq!(result.data.len(), 1);
        let order = &result.data[0];
        assert_eq!(order.id, order_id);
        let mut skus: Vec<&str> = order.items.iter().map(|i| i.sku.as_str()).collect();
        skus.sort_unstable();
        assert_eq!(skus, vec!["hoodie", "mug", "sticker"]);
    }
}
