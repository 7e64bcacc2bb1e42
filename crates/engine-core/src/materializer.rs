use crate::{error::ConvergeError, queue::TaskQueue, waiter::DependencyWaiter};
use connectors::sql::base::adapter::SchemaAdapter;
use model::definition::{BuilderMethod, ColumnDefinition, ColumnOption};
use planner::{
    query::{
        ast::{
            alter_table::{AlterAction, AlterTable},
            common::Literal,
        },
        builder::alter_table::AlterTableBuilder,
    },
    table_ref,
};
use tracing::{debug, warn};

/// Foreign key targets of one column are awaited one at a time.
const DEPENDENCY_CONCURRENCY: usize = 1;

/// Brings a single column to its declared shape: waits for the columns it
/// references, creates it when absent, then applies its options one by one.
///
/// Every alteration tolerates "already exists", so materializing the same
/// column again, or concurrently with another run, converges instead of
/// failing.
#[derive(Clone)]
pub struct ColumnMaterializer {
    waiter: DependencyWaiter,
}

impl ColumnMaterializer {
    pub fn new(waiter: DependencyWaiter) -> Self {
        Self { waiter }
    }

    fn adapter(&self) -> &dyn SchemaAdapter {
        self.waiter.probe().adapter().as_ref()
    }

    pub async fn materialize(
        &self,
        table: &str,
        column: &ColumnDefinition,
    ) -> Result<(), ConvergeError> {
        self.resolve_dependencies(column).await?;

        let exists = self.waiter.probe().has_column(table, column.name()).await?;
        if !exists {
            self.create_column(table, column).await?;
        }

        if column.is_raw_type() {
            if !column.options().is_empty() {
                debug!(
                    table,
                    column = column.name(),
                    "Raw-typed column, options are not applied"
                );
            }
            return Ok(());
        }

        for option in column.options() {
            self.apply_option(table, column, option).await?;
        }
        Ok(())
    }

    async fn resolve_dependencies(&self, column: &ColumnDefinition) -> Result<(), ConvergeError> {
        let mut queue = TaskQueue::new(DEPENDENCY_CONCURRENCY);
        for target in column.references() {
            queue.add(
                self.waiter
                    .wait_for_table_column(&target.table, &target.column),
            );
        }
        queue.on_idle().await
    }

    async fn create_column(&self, table: &str, column: &ColumnDefinition) -> Result<(), ConvergeError> {
        let stmt = AlterTableBuilder::new(table_ref!(table))
            .add_column(column.name(), column.column_type().clone())
            .build();

        match self.adapter().alter_table(&stmt).await {
            Ok(()) => {
                debug!(table, column = column.name(), "Created column");
                Ok(())
            }
            Err(err) if err.is_already_exists() => {
                debug!(table, column = column.name(), "Column created concurrently");
                Ok(())
            }
            Err(source) => Err(ConvergeError::CreateColumn {
                table: table.to_string(),
                column: column.name().to_string(),
                source,
            }),
        }
    }

    async fn apply_option(
        &self,
        table: &str,
        column: &ColumnDefinition,
        option: &ColumnOption,
    ) -> Result<(), ConvergeError> {
        let name = column.name();
        let builder = AlterTableBuilder::new(table_ref!(table));

        let stmt = match option {
            ColumnOption::NotNullable => builder.set_not_null(name),
            ColumnOption::Nullable => builder.drop_not_null(name),
            ColumnOption::Primary => builder.primary(name),
            ColumnOption::Unique => builder.unique(name),
            ColumnOption::References(target) => {
                let stmt = builder
                    .foreign_key(name, target, column.on_delete(), column.on_update())
                    .build();
                return self.add_foreign_key(table, name, &stmt).await;
            }
            ColumnOption::OnDelete(_) | ColumnOption::OnUpdate(_) => {
                if column.references().next().is_none() {
                    debug!(table, column = name, option = %option, "No reference to modify, ignoring");
                }
                return Ok(());
            }
            ColumnOption::Other { name: method, argument } => {
                match builder_method(builder, name, method, argument.as_deref()) {
                    Some(builder) => builder,
                    None => return Ok(()),
                }
            }
        }
        .build();

        match self.adapter().alter_table(&stmt).await {
            Ok(()) => {
                debug!(table, column = name, option = %option, "Applied option");
                Ok(())
            }
            Err(err) if err.is_already_exists() => {
                debug!(table, column = name, option = %option, "Option already applied");
                Ok(())
            }
            Err(source) => Err(ConvergeError::Alteration {
                table: table.to_string(),
                column: name.to_string(),
                option: option.to_string(),
                source,
            }),
        }
    }

    async fn add_foreign_key(
        &self,
        table: &str,
        column: &str,
        stmt: &AlterTable,
    ) -> Result<(), ConvergeError> {
        let constraint = constraint_name(stmt);
        match self.adapter().alter_table(stmt).await {
            Ok(()) => {
                debug!(table, column, %constraint, "Added foreign key");
                Ok(())
            }
            Err(err) if err.is_already_exists() => {
                debug!(table, column, %constraint, "Foreign key already present");
                Ok(())
            }
            Err(source) => Err(ConvergeError::Constraint {
                table: table.to_string(),
                column: column.to_string(),
                constraint,
                source,
            }),
        }
    }
}

/// Resolves an option outside the known kinds to a builder method of the
/// same name. Unknown names and missing arguments leave the column alone.
fn builder_method(
    builder: AlterTableBuilder,
    column: &str,
    method: &str,
    argument: Option<&str>,
) -> Option<AlterTableBuilder> {
    let Some(resolved) = BuilderMethod::from_name(method) else {
        warn!(column, method, "No builder method for option, skipping");
        return None;
    };

    if resolved.requires_argument() && argument.is_none() {
        warn!(column, method, "Builder method needs an argument, skipping");
        return None;
    }

    let argument = argument.unwrap_or_default();
    let builder = match resolved {
        BuilderMethod::DefaultTo => builder.default_to(column, Literal::infer(argument)),
        BuilderMethod::Comment => builder.comment(column, argument),
        BuilderMethod::Index => builder.index(column),
    };
    Some(builder)
}

fn constraint_name(stmt: &AlterTable) -> String {
    stmt.actions
        .iter()
        .find_map(|action| match action {
            AlterAction::AddForeignKey(fk) => Some(fk.name.clone()),
            _ => None,
        })
        .unwrap_or_default()
}
