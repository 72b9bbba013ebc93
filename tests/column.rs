#[cfg(test)]
mod tests {
    use stitch::{Entity, MappedEntity, select_columns};

    #[derive(Entity, Default, Clone)]
    #[entity(table = "my_table")]
    struct Row {
        #[entity(column = "solo_column", pk)]
        col: i32,
        #[entity(kind = "string")]
        label: String,
    }

    #[test]
    fn test_column_descriptor() {
        let columns = Row::descriptor().columns;
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].column, "solo_column");
        assert!(columns[0].is_pk);
        assert_eq!(columns[1].column, "label");
        assert_eq!(columns[1].kind, Some("string"));
        assert!(!columns[1].is_pk);
    }

    #[test]
    fn test_select_columns_is_table_qualified_and_aliased() {
        let select = select_columns::<Row>();
        assert_eq!(
            select,
            r#"my_table.solo_column AS "my_table.solo_column", my_table.label AS "my_table.label""#
        );
    }

    #[test]
    fn test_pk_columns_filters_only_declared_pk() {
        let pk: Vec<_> = Row::descriptor().pk_columns().map(|c| c.column).collect();
        assert_eq!(pk, vec!["solo_column"]);
    }
}
