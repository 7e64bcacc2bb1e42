use crate::query::{
    ast::{
        alter_table::{AlterAction, AlterTable, ForeignKey},
        common::{Literal, TableRef},
    },
    renderer::{Render, Renderer},
};

impl Render for AlterTable {
    fn render(&self, r: &mut Renderer) {
        for (i, action) in self.actions.iter().enumerate() {
            if i > 0 {
                r.sql.push('\n');
            }
            render_action(r, &self.table, action);
            r.sql.push(';');
        }
    }
}

fn render_action(r: &mut Renderer, table: &TableRef, action: &AlterAction) {
    match action {
        AlterAction::CreateIndex { name, column } => {
            r.sql.push_str("CREATE INDEX ");
            r.push_ident(name);
            r.sql.push_str(" ON ");
            r.render_table_ref(table);
            r.sql.push_str(" (");
            r.push_ident(column);
            r.sql.push(')');
        }
        AlterAction::Comment { column, text } => {
            r.sql.push_str("COMMENT ON COLUMN ");
            r.render_table_ref(table);
            r.sql.push('.');
            r.push_ident(column);
            r.sql.push_str(" IS ");
            let literal = r.dialect.quote_literal(text);
            r.sql.push_str(&literal);
        }
        _ => {
            r.sql.push_str("ALTER TABLE ");
            r.render_table_ref(table);
            r.sql.push(' ');
            render_clause(r, action);
        }
    }
}

fn render_clause(r: &mut Renderer, action: &AlterAction) {
    match action {
        AlterAction::AddColumn(spec) => {
            r.sql.push_str("ADD COLUMN ");
            r.push_ident(&spec.name);
            r.sql.push(' ');
            let type_name = r.dialect.render_column_type(&spec.column_type);
            r.sql.push_str(&type_name);
        }
        AlterAction::SetNotNull { column } => {
            r.sql.push_str("ALTER COLUMN ");
            r.push_ident(column);
            r.sql.push_str(" SET NOT NULL");
        }
        AlterAction::DropNotNull { column } => {
            r.sql.push_str("ALTER COLUMN ");
            r.push_ident(column);
            r.sql.push_str(" DROP NOT NULL");
        }
        AlterAction::AddPrimaryKey { constraint, column } => {
            r.sql.push_str("ADD CONSTRAINT ");
            r.push_ident(constraint);
            r.sql.push_str(" PRIMARY KEY (");
            r.push_ident(column);
            r.sql.push(')');
        }
        AlterAction::AddUnique { constraint, column } => {
            r.sql.push_str("ADD CONSTRAINT ");
            r.push_ident(constraint);
            r.sql.push_str(" UNIQUE (");
            r.push_ident(column);
            r.sql.push(')');
        }
        AlterAction::AddForeignKey(fk) => render_foreign_key(r, fk),
        AlterAction::SetDefault { column, value } => {
            r.sql.push_str("ALTER COLUMN ");
            r.push_ident(column);
            r.sql.push_str(" SET DEFAULT ");
            render_literal(r, value);
        }
        AlterAction::CreateIndex { .. } | AlterAction::Comment { .. } => {
            unreachable!("rendered as standalone statements")
        }
    }
}

/// The constraint name is written bare so that it folds to lower case the
/// same way on every run. It must be a plain identifier; `TableDefinition`
/// rejects references that would produce anything else.
fn render_foreign_key(r: &mut Renderer, fk: &ForeignKey) {
    r.sql.push_str("ADD CONSTRAINT ");
    r.sql.push_str(&fk.name);
    r.sql.push_str(" FOREIGN KEY (");
    r.push_ident(&fk.column);
    r.sql.push_str(") REFERENCES ");
    r.render_table_ref(&fk.referenced_table);
    r.sql.push_str(" (");
    r.push_ident(&fk.referenced_column);
    r.sql.push(')');

    if let Some(action) = fk.on_delete {
        r.sql.push_str(" ON DELETE ");
        r.sql.push_str(action.as_sql());
    }
    if let Some(action) = fk.on_update {
        r.sql.push_str(" ON UPDATE ");
        r.sql.push_str(action.as_sql());
    }
}

fn render_literal(r: &mut Renderer, value: &Literal) {
    match value {
        Literal::Null => r.sql.push_str("NULL"),
        Literal::Boolean(true) => r.sql.push_str("TRUE"),
        Literal::Boolean(false) => r.sql.push_str("FALSE"),
        Literal::Number(n) => r.sql.push_str(n),
        Literal::Text(text) => {
            let quoted = r.dialect.quote_literal(text);
            r.sql.push_str(&quoted);
        }
    }
}
