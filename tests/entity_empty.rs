#[cfg(test)]
mod tests {
    use stitch::{Cardinality, Entity, MappedEntity};

    #[derive(Entity, Default, Clone)]
    #[entity(table = "empty_entity")]
    struct SomeEmptyEntity {}

    #[test]
    fn test_empty_entity_descriptor() {
        let descriptor = SomeEmptyEntity::descriptor();
        assert_eq!(descriptor.table, "empty_entity");
        assert_eq!(descriptor.columns.len(), 0);
        assert_eq!(descriptor.references.len(), 0);
        assert_eq!(descriptor.pk_columns().count(), 0);
    }

    #[test]
    fn test_empty_entity_has_no_declared_pk() {
        let entity = SomeEmptyEntity::default();
        assert_eq!(entity.pk_key(), stitch::PkKey::Undeclared);
    }

    #[derive(Entity, Default, Clone)]
    struct DefaultTableName {
        id: i32,
    }

    #[test]
    fn test_table_name_defaults_to_snake_case_struct_name() {
        assert_eq!(DefaultTableName::descriptor().table, "default_table_name");
    }

    #[test]
    fn unused_cardinality_import_sanity() {
        // Cardinality has no public constructor; this just anchors the import
        // above to both variants so the re-export is exercised by a test.
        assert_ne!(Cardinality::One, Cardinality::Many);
    }
}
