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
        #[entity(kind = "zerouuid")]
        customer_id: Uuid,
        #[entity(fk = "customer_id:id")]
        customer: Option<Arc<Customer>>,
    }

    #[derive(Entity, Default, Clone, Debug)]
    #[entity(table = "customers")]
    struct Customer {
        #[entity(kind = "zerouuid", pk)]
        id: Uuid,
        #[entity(kind = "string")]
        name: String,
    }

    fn row(order_id: Uuid, customer_id: Uuid, customer_name: &str) -> RowLabeled {
        let labels: Arc<[String]> = [
            "orders.id",
            "orders.customer_id",
            "customers.id",
            "customers.name",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let values: Box<[Value]> = vec![
            Value::Uuid(order_id),
            Value::Uuid(customer_id),
            Value::Uuid(customer_id),
            Value::Str(customer_name.into()),
        ]
        .into_boxed_slice();
        RowLabeled::new(labels, values)
    }

    #[tokio::test]
    async fn nil_foreign_key_leaves_the_reference_unset() {
        // A LEFT JOIN that did not match reports the customer's columns as
        // their type's zero value (the nil UUID here), not SQL NULL.
        let rows = vec![row(Uuid::new_v4(), Uuid::nil(), "")];
        let result = map::<Order>(
            stream::iter(rows.into_iter().map(Ok::<_, stitch::Error>)),
            MapperOptions::new(),
        )
        .await
        .expect("mapping should succeed");

        assert_eq!(result.data.len(), 1);
        assert!(result.data[0].customer.is_none());
    }

    #[tokio::test]
    async fn real_foreign_key_wires_the_reference() {
        let customer_id = Uuid::new_v4();
        let rows = vec![row(Uuid::new_v4(), customer_id, "Ada Lovelace")];
        let result = map::<Order>(
            stream::iter(rows.into_iter().map(Ok::<_, stitch::Error>)),
            MapperOptions::new(),
        )
        .await
        .expect("mapping should succeed");

        let customer = result.data[0]
            .customer
            .as_ref()
            .expect("customer should be wired");
        assert_eq!(customer.id, customer_id);
        assert_eq!(customer.name, "Ada Lovelace");
    }
}
