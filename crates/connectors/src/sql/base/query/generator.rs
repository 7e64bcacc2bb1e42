use planner::query::{
    ast::{alter_table::AlterTable, create_table::CreateTable},
    dialect::Dialect,
    renderer::{Render, Renderer},
};

pub struct QueryGenerator<'a> {
    dialect: &'a dyn Dialect,
}

impl<'a> QueryGenerator<'a> {
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Self { dialect }
    }

    pub fn create_table(&self, stmt: &CreateTable) -> String {
        self.render_ast(stmt)
    }

    /// Renders every action of the alteration, one statement per line.
    pub fn alter_table(&self, stmt: &AlterTable) -> String {
        self.render_ast(stmt)
    }

    /// Renders each action of the alteration as a standalone statement.
    pub fn alter_statements(&self, stmt: &AlterTable) -> Vec<String> {
        stmt.actions
            .iter()
            .map(|action| {
                self.render_ast(&AlterTable {
                    table: stmt.table.clone(),
                    actions: vec![action.clone()],
                })
            })
            .collect()
    }

    fn render_ast(&self, ast: &impl Render) -> String {
        let mut renderer = Renderer::new(self.dialect);
        ast.render(&mut renderer);
        renderer.finish()
    }
}
