use crate::query::ast::{common::TableRef, create_table::CreateTable};

#[derive(Debug, Clone)]
pub struct CreateTableBuilder {
    ast: CreateTable,
}

impl CreateTableBuilder {
    pub fn new(table: TableRef) -> Self {
        Self {
            ast: CreateTable {
                table,
                if_not_exists: false,
            },
        }
    }

    pub fn if_not_exists(mut self) -> Self {
        self.ast.if_not_exists = true;
        self
    }

    pub fn build(self) -> CreateTable {
        self.ast
    }
}

#[cfg(test)]
mod tests {
    use crate::query::builder::create_table::CreateTableBuilder;
    use crate::table_ref;

    #[test]
    fn test_create_table_builder() {
        let ast = CreateTableBuilder::new(table_ref!("test")).if_not_exists().build();
        assert!(ast.if_not_exists);
        assert_eq!(ast.table.name, "test");
    }
}
