#[cfg(test)]
mod tests {
    use crate::{
        pg_client, reset_postgres_schema,
        utils::{
            DEPENDENT_TABLE, TAGGED_TABLE, TEST_TABLE, assert_column_exists,
            assert_table_exists, config, converge, execute, get_column_names,
            get_constraint_names, get_delete_rule, is_not_null,
        },
    };
    use tracing_test::traced_test;

    // Scenario: A single table with five columns and no dependencies.
    // Expected Outcome: The table exists with all five columns, the non-nullable ones are NOT NULL.
    #[traced_test]
    #[tokio::test]
    #[ignore = "requires a live Postgres at TEST_PG_URL"]
    async fn tc01() {
        reset_postgres_schema().await;

        let report = converge(&config(&[TEST_TABLE])).await;

        assert!(report.is_success(), "{report}");
        assert_table_exists("test", true).await;
        let mut columns = get_column_names("test").await;
        columns.sort();
        assert_eq!(columns, vec!["id", "name", "schema_type", "shared", "status"]);
        assert!(is_not_null("test", "shared").await);
    }

    // Scenario: `dependent` references `test.id` and is listed before it.
    // Expected Outcome: Both tables converge and the foreign key cascades on delete.
    #[traced_test]
    #[tokio::test]
    #[ignore = "requires a live Postgres at TEST_PG_URL"]
    async fn tc02() {
        reset_postgres_schema().await;

        let report = converge(&config(&[DEPENDENT_TABLE, TEST_TABLE])).await;

        assert!(report.is_success(), "{report}");
        assert_table_exists("dependent", true).await;
        assert_column_exists("dependent", "test_id", true).await;
        assert_eq!(
            get_delete_rule("dependent_test_id_fkey").await.as_deref(),
            Some("CASCADE")
        );
    }

    // Scenario: A `text[]` column created through its raw type.
    // Expected Outcome: An inserted array is read back as a list of strings.
    #[traced_test]
    #[tokio::test]
    #[ignore = "requires a live Postgres at TEST_PG_URL"]
    async fn tc03() {
        reset_postgres_schema().await;

        let report = converge(&config(&[TAGGED_TABLE])).await;
        assert!(report.is_success(), "{report}");
        // Options are never applied to raw types.
        assert!(!is_not_null("tagged", "tags").await);

        let client = pg_client().await;
        let tags = vec!["red".to_string(), "green".to_string()];
        client
            .execute(
                "INSERT INTO tagged (name, tags) VALUES ($1, $2)",
                &[&"name", &tags],
            )
            .await
            .unwrap();

        let row = client
            .query_one("SELECT tags FROM tagged", &[])
            .await
            .unwrap();
        let read: Vec<String> = row.get("tags");
        assert_eq!(read, tags);
    }

    // Scenario: Converging the same definitions twice.
    // Expected Outcome: The second run succeeds and adds no columns or constraints.
    #[traced_test]
    #[tokio::test]
    #[ignore = "requires a live Postgres at TEST_PG_URL"]
    async fn tc04() {
        reset_postgres_schema().await;
        let document = config(&[TEST_TABLE, DEPENDENT_TABLE]);

        assert!(converge(&document).await.is_success());
        let columns = get_column_names("dependent").await;
        let constraints = get_constraint_names("dependent").await;

        let report = converge(&document).await;

        assert!(report.is_success(), "{report}");
        assert_eq!(get_column_names("dependent").await, columns);
        assert_eq!(get_constraint_names("dependent").await, constraints);
        assert_eq!(
            constraints,
            vec!["dependent_pkey", "dependent_test_id_fkey"]
        );
    }

    // Scenario: Part of the `test` table is created out-of-band before convergence.
    // Expected Outcome: Existing objects are tolerated and the missing columns are added.
    #[traced_test]
    #[tokio::test]
    #[ignore = "requires a live Postgres at TEST_PG_URL"]
    async fn tc05() {
        reset_postgres_schema().await;
        execute(r#"CREATE TABLE test (id SERIAL PRIMARY KEY, name TEXT NOT NULL);"#).await;

        let report = converge(&config(&[TEST_TABLE])).await;

        assert!(report.is_success(), "{report}");
        let mut columns = get_column_names("test").await;
        columns.sort();
        assert_eq!(columns, vec!["id", "name", "schema_type", "shared", "status"]);
        assert_eq!(get_constraint_names("test").await, vec!["test_pkey"]);
    }
}
