//! SQL implementation of the cart storage executor.

#[cfg(feature = "mysql")]
use sea_query::MysqlQueryBuilder;
#[cfg(feature = "postgres")]
use sea_query::PostgresQueryBuilder;
#[cfg(feature = "sqlite")]
use sea_query::SqliteQueryBuilder;
use sea_query::{
    Alias, Asterisk, Cond, Expr, Func, Iden, IntoColumnRef, OnConflict, Order, Query,
    SelectStatement, SimpleExpr, Table, TableDropStatement,
};
use sea_query_binder::{SqlxBinder, SqlxValues};
use sqlx::{Database, Pool};

use cartbounty_core::{
    CartFilter, CartQuery, ConflictPolicy, Executor, NewCart, SortColumn, WriteError,
};

/// Column identifiers for the `cartbounty` table.
///
/// # Columns
///
/// - `Id` - Cart identifier, carried over from the legacy table on transfer
/// - `Name` / `Surname` / `Email` / `Phone` - Customer contact details
/// - `Location` - Structured or flat `"country, city"` location
/// - `CartContents` - JSON list of line items
/// - `CartTotal` - DECIMAL(10,2) cart value
/// - `Time` - Last update of the cart
/// - `MailSent`, `WpUnsubscribed`, `WpStepsCompleted`, `WpComplete` - Recovery flags
/// - `Type` - 0 abandoned, 1 recovered, 2 excluded
#[derive(Iden, Clone, Copy)]
pub enum Cart {
    /// The table name: `cartbounty`
    #[iden = "cartbounty"]
    Table,
    Id,
    Name,
    Surname,
    Email,
    Phone,
    Location,
    CartContents,
    CartTotal,
    Currency,
    Time,
    SessionId,
    MailSent,
    OtherFields,
    WpUnsubscribed,
    WpStepsCompleted,
    WpComplete,
    Type,
}

/// Column identifiers for the legacy `captured_wc_fields` table.
///
/// The table is only read and dropped, never created.
#[derive(Iden, Clone, Copy)]
pub enum LegacyCart {
    /// The table name: `captured_wc_fields`
    #[iden = "captured_wc_fields"]
    Table,
    Id,
    Name,
    Surname,
    Email,
    Phone,
    Location,
    CartContents,
    CartTotal,
    Currency,
    Time,
    SessionId,
    MailSent,
    OtherFields,
}

/// Column identifiers for the `cartbounty_options` key-value table.
#[derive(Iden, Clone, Copy)]
pub enum CartOption {
    /// The table name: `cartbounty_options`
    #[iden = "cartbounty_options"]
    Table,
    OptionName,
    OptionValue,
}

/// Type alias for MySQL executor.
#[cfg(feature = "mysql")]
pub type MySql = Sql<sqlx::MySql>;

/// Type alias for PostgreSQL executor.
#[cfg(feature = "postgres")]
pub type Postgres = Sql<sqlx::Postgres>;

/// Type alias for SQLite executor.
#[cfg(feature = "sqlite")]
pub type Sqlite = Sql<sqlx::Sqlite>;

/// Number of rows touched by a statement.
///
/// sqlx exposes `rows_affected` on each backend result type but not on
/// [`Database::QueryResult`].
pub trait RowsAffected {
    fn rows_affected(&self) -> u64;
}

#[cfg(feature = "sqlite")]
impl RowsAffected for sqlx::sqlite::SqliteQueryResult {
    fn rows_affected(&self) -> u64 {
        self.rows_affected()
    }
}

#[cfg(feature = "mysql")]
impl RowsAffected for sqlx::mysql::MySqlQueryResult {
    fn rows_affected(&self) -> u64 {
        self.rows_affected()
    }
}

#[cfg(feature = "postgres")]
impl RowsAffected for sqlx::postgres::PgQueryResult {
    fn rows_affected(&self) -> u64 {
        self.rows_affected()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    Sqlite,
    MySql,
    Postgres,
}

#[derive(Debug, Clone, Copy)]
enum Cast {
    Integer,
    Double,
    Text,
}

impl Dialect {
    // Columns are cast on read so that every backend decodes the same Rust
    // types, whatever the column types of the installation are.
    fn cast_type(&self, cast: Cast) -> &'static str {
        match (self, cast) {
            (Self::Sqlite, Cast::Integer) => "INTEGER",
            (Self::Sqlite, Cast::Double) => "REAL",
            (Self::Sqlite, Cast::Text) => "TEXT",
            (Self::MySql, Cast::Integer) => "SIGNED",
            (Self::MySql, Cast::Double) => "DOUBLE",
            (Self::MySql, Cast::Text) => "CHAR",
            (Self::Postgres, Cast::Integer) => "BIGINT",
            (Self::Postgres, Cast::Double) => "DOUBLE PRECISION",
            (Self::Postgres, Cast::Text) => "TEXT",
        }
    }

    fn cast(&self, column: impl IntoColumnRef, cast: Cast) -> SimpleExpr {
        Expr::col(column).cast_as(Alias::new(self.cast_type(cast)))
    }

    fn current_schema(&self) -> &'static str {
        match self {
            Self::Sqlite => "main",
            Self::MySql => "DATABASE()",
            Self::Postgres => "current_schema()",
        }
    }
}

/// SQL database executor for cart storage.
///
/// A generic wrapper around a SQLx connection pool that implements the
/// [`Executor`](cartbounty_core::Executor) trait.
///
/// # Example
///
/// ```rust,ignore
/// use cartbounty_sql::Sql;
/// use sqlx::sqlite::SqlitePoolOptions;
///
/// let pool = SqlitePoolOptions::new()
///     .connect(":memory:")
///     .await?;
///
/// let executor: Sql<sqlx::Sqlite> = pool.into();
/// ```
///
/// The `cartbounty` and `cartbounty_options` tables must exist, see
/// `cartbounty-sql-migrator`.
pub struct Sql<DB: Database>(Pool<DB>);

impl<DB: Database> Sql<DB> {
    fn dialect() -> Dialect {
        match DB::NAME {
            #[cfg(feature = "sqlite")]
            "SQLite" => Dialect::Sqlite,
            #[cfg(feature = "mysql")]
            "MySQL" => Dialect::MySql,
            #[cfg(feature = "postgres")]
            "PostgreSQL" => Dialect::Postgres,
            name => panic!("'{name}' not supported, consider using SQLite, PostgreSQL or MySQL"),
        }
    }

    fn build_sqlx<S: SqlxBinder>(statement: S) -> (String, SqlxValues) {
        match Self::dialect() {
            #[cfg(feature = "sqlite")]
            Dialect::Sqlite => statement.build_sqlx(SqliteQueryBuilder),
            #[cfg(feature = "mysql")]
            Dialect::MySql => statement.build_sqlx(MysqlQueryBuilder),
            #[cfg(feature = "postgres")]
            Dialect::Postgres => statement.build_sqlx(PostgresQueryBuilder),
            #[allow(unreachable_patterns)]
            dialect => unreachable!("{dialect:?} disabled"),
        }
    }

    fn build_drop(statement: TableDropStatement) -> String {
        match Self::dialect() {
            #[cfg(feature = "sqlite")]
            Dialect::Sqlite => statement.to_string(SqliteQueryBuilder),
            #[cfg(feature = "mysql")]
            Dialect::MySql => statement.to_string(MysqlQueryBuilder),
            #[cfg(feature = "postgres")]
            Dialect::Postgres => statement.to_string(PostgresQueryBuilder),
            #[allow(unreachable_patterns)]
            dialect => unreachable!("{dialect:?} disabled"),
        }
    }

    fn insert_statement(
        carts: &[NewCart],
        conflict: ConflictPolicy,
    ) -> sea_query::InsertStatement {
        let mut statement = Query::insert()
            .into_table(Cart::Table)
            .columns([
                Cart::Id,
                Cart::Name,
                Cart::Surname,
                Cart::Email,
                Cart::Phone,
                Cart::Location,
                Cart::CartContents,
                Cart::CartTotal,
                Cart::Currency,
                Cart::Time,
                Cart::SessionId,
                Cart::MailSent,
                Cart::OtherFields,
            ])
            .to_owned();

        for cart in carts {
            statement.values_panic([
                cart.id.into(),
                cart.name.as_str().into(),
                cart.surname.as_str().into(),
                cart.email.as_str().into(),
                cart.phone.as_str().into(),
                cart.location.as_str().into(),
                cart.cart_contents.as_str().into(),
                cart.cart_total.into(),
                cart.currency.as_str().into(),
                cart.time.into(),
                cart.session_id.as_str().into(),
                cart.mail_sent.into(),
                cart.other_fields.as_str().into(),
            ]);
        }

        if conflict == ConflictPolicy::Skip {
            statement.on_conflict(
                OnConflict::column(Cart::Id)
                    .do_nothing_on([Cart::Id])
                    .to_owned(),
            );
        }

        statement
    }

    fn select_carts() -> SelectStatement {
        let dialect = Self::dialect();
        let mut statement = Query::select();

        statement
            .expr_as(dialect.cast((Cart::Table, Cart::Id), Cast::Integer), Cart::Id)
            .columns([
                (Cart::Table, Cart::Name),
                (Cart::Table, Cart::Surname),
                (Cart::Table, Cart::Email),
                (Cart::Table, Cart::Phone),
                (Cart::Table, Cart::Location),
                (Cart::Table, Cart::CartContents),
            ])
            .expr_as(
                dialect.cast((Cart::Table, Cart::CartTotal), Cast::Double),
                Cart::CartTotal,
            )
            .column((Cart::Table, Cart::Currency))
            .expr_as(dialect.cast((Cart::Table, Cart::Time), Cast::Text), Cart::Time)
            .columns([
                (Cart::Table, Cart::SessionId),
                (Cart::Table, Cart::OtherFields),
            ]);

        for flag in [
            Cart::MailSent,
            Cart::WpUnsubscribed,
            Cart::WpStepsCompleted,
            Cart::WpComplete,
            Cart::Type,
        ] {
            statement.expr_as(dialect.cast((Cart::Table, flag), Cast::Integer), flag);
        }

        statement.from(Cart::Table).to_owned()
    }

    fn filter_condition(filter: CartFilter) -> Cond {
        let listed = Cond::all()
            .add(Expr::col((Cart::Table, Cart::CartContents)).ne(""))
            .add(Expr::col((Cart::Table, Cart::Type)).ne(2));

        match filter {
            CartFilter::All => listed,
            CartFilter::Recoverable => listed
                .add(Expr::col((Cart::Table, Cart::Type)).ne(1))
                .add(
                    Cond::any()
                        .add(Expr::col((Cart::Table, Cart::Email)).ne(""))
                        .add(Expr::col((Cart::Table, Cart::Phone)).ne("")),
                ),
            CartFilter::Recovered => listed.add(Expr::col((Cart::Table, Cart::Type)).eq(1)),
        }
    }

    fn sort_column(sort: SortColumn) -> Cart {
        match sort {
            SortColumn::Id => Cart::Id,
            SortColumn::Name => Cart::Name,
            SortColumn::Email => Cart::Email,
            SortColumn::Phone => Cart::Phone,
            SortColumn::CartTotal => Cart::CartTotal,
            SortColumn::Time => Cart::Time,
        }
    }

    fn map_write_error(err: sqlx::Error) -> WriteError {
        match err {
            sqlx::Error::Database(err) if err.is_unique_violation() => WriteError::DuplicateCart,
            err => WriteError::Unknown(err.into()),
        }
    }
}

#[async_trait::async_trait]
impl<DB> Executor for Sql<DB>
where
    DB: Database,
    for<'c> &'c mut DB::Connection: sqlx::Executor<'c, Database = DB>,
    SqlxValues: for<'q> sqlx::IntoArguments<'q, DB>,
    for<'q> <DB as Database>::Arguments<'q>: sqlx::IntoArguments<'q, DB>,
    DB::QueryResult: RowsAffected,
    i64: for<'r> sqlx::Decode<'r, DB> + sqlx::Type<DB>,
    String: for<'r> sqlx::Decode<'r, DB> + sqlx::Type<DB>,
    usize: sqlx::ColumnIndex<DB::Row>,
    cartbounty_core::LegacyCart: for<'r> sqlx::FromRow<'r, DB::Row>,
    cartbounty_core::Cart: for<'r> sqlx::FromRow<'r, DB::Row>,
{
    async fn legacy_table_exists(&self) -> anyhow::Result<bool> {
        let dialect = Self::dialect();
        let table = LegacyCart::Table.to_string();

        let statement = match dialect {
            Dialect::Sqlite => Query::select()
                .expr(Func::count(Expr::col(Asterisk)))
                .from(Alias::new("sqlite_master"))
                .and_where(Expr::col(Alias::new("type")).eq("table"))
                .and_where(Expr::col(Alias::new("name")).eq(table))
                .to_owned(),
            Dialect::MySql | Dialect::Postgres => Query::select()
                .expr(Func::count(Expr::col(Asterisk)))
                .from((Alias::new("information_schema"), Alias::new("tables")))
                .and_where(Expr::col(Alias::new("table_name")).eq(table))
                .and_where(
                    Expr::col(Alias::new("table_schema")).eq(Expr::cust(dialect.current_schema())),
                )
                .to_owned(),
        };

        let (sql, values) = Self::build_sqlx(statement);

        let (count,) = sqlx::query_as_with::<DB, (i64,), _>(&sql, values)
            .fetch_one(&self.0)
            .await?;

        Ok(count > 0)
    }

    async fn read_legacy_carts(&self) -> anyhow::Result<Vec<cartbounty_core::LegacyCart>> {
        let dialect = Self::dialect();

        let statement = Query::select()
            .expr_as(dialect.cast(LegacyCart::Id, Cast::Integer), LegacyCart::Id)
            .columns([
                LegacyCart::Name,
                LegacyCart::Surname,
                LegacyCart::Email,
                LegacyCart::Phone,
                LegacyCart::Location,
                LegacyCart::CartContents,
            ])
            .expr_as(
                dialect.cast(LegacyCart::CartTotal, Cast::Double),
                LegacyCart::CartTotal,
            )
            .column(LegacyCart::Currency)
            .expr_as(dialect.cast(LegacyCart::Time, Cast::Text), LegacyCart::Time)
            .column(LegacyCart::SessionId)
            .expr_as(
                dialect.cast(LegacyCart::MailSent, Cast::Integer),
                LegacyCart::MailSent,
            )
            .column(LegacyCart::OtherFields)
            .from(LegacyCart::Table)
            .and_where(Expr::col(LegacyCart::CartContents).ne(""))
            .to_owned();

        let (sql, values) = Self::build_sqlx(statement);

        Ok(
            sqlx::query_as_with::<DB, cartbounty_core::LegacyCart, _>(&sql, values)
                .fetch_all(&self.0)
                .await?,
        )
    }

    async fn drop_legacy_table(&self) -> anyhow::Result<()> {
        let statement = Table::drop()
            .table(LegacyCart::Table)
            .if_exists()
            .to_owned();

        let sql = Self::build_drop(statement);

        sqlx::query::<DB>(&sql).execute(&self.0).await?;

        Ok(())
    }

    async fn insert_carts(
        &self,
        carts: &[NewCart],
        conflict: ConflictPolicy,
    ) -> Result<u64, WriteError> {
        if carts.is_empty() {
            return Ok(0);
        }

        let (sql, values) = Self::build_sqlx(Self::insert_statement(carts, conflict));

        let result = sqlx::query_with::<DB, _>(&sql, values)
            .execute(&self.0)
            .await
            .map_err(Self::map_write_error)?;

        Ok(result.rows_affected())
    }

    async fn insert_carts_atomic(
        &self,
        batches: &[&[NewCart]],
        conflict: ConflictPolicy,
    ) -> Result<u64, WriteError> {
        let mut tx = self.0.begin().await.map_err(Self::map_write_error)?;
        let mut rows = 0;

        for batch in batches.iter().filter(|batch| !batch.is_empty()) {
            let (sql, values) = Self::build_sqlx(Self::insert_statement(batch, conflict));

            let result = sqlx::query_with::<DB, _>(&sql, values)
                .execute(&mut *tx)
                .await
                .map_err(Self::map_write_error)?;

            rows += result.rows_affected();
        }

        tx.commit().await.map_err(Self::map_write_error)?;
        tracing::debug!(batches = batches.len(), rows, "cart batches committed");

        Ok(rows)
    }

    async fn get_option(&self, name: &str) -> anyhow::Result<Option<String>> {
        let statement = Query::select()
            .column(CartOption::OptionValue)
            .from(CartOption::Table)
            .and_where(Expr::col(CartOption::OptionName).eq(name))
            .limit(1)
            .to_owned();

        let (sql, values) = Self::build_sqlx(statement);

        let Some((value,)) = sqlx::query_as_with::<DB, (Option<String>,), _>(&sql, values)
            .fetch_optional(&self.0)
            .await?
        else {
            return Ok(None);
        };

        Ok(Some(value.unwrap_or_default()))
    }

    async fn update_option(&self, name: &str, value: &str) -> anyhow::Result<()> {
        let statement = Query::insert()
            .into_table(CartOption::Table)
            .columns([CartOption::OptionName, CartOption::OptionValue])
            .values_panic([name.into(), value.into()])
            .on_conflict(
                OnConflict::column(CartOption::OptionName)
                    .update_column(CartOption::OptionValue)
                    .to_owned(),
            )
            .to_owned();

        let (sql, values) = Self::build_sqlx(statement);

        sqlx::query_with::<DB, _>(&sql, values)
            .execute(&self.0)
            .await?;

        Ok(())
    }

    async fn add_option(&self, name: &str, value: &str) -> anyhow::Result<bool> {
        let statement = Query::insert()
            .into_table(CartOption::Table)
            .columns([CartOption::OptionName, CartOption::OptionValue])
            .values_panic([name.into(), value.into()])
            .on_conflict(
                OnConflict::column(CartOption::OptionName)
                    .do_nothing_on([CartOption::OptionName])
                    .to_owned(),
            )
            .to_owned();

        let (sql, values) = Self::build_sqlx(statement);

        let result = sqlx::query_with::<DB, _>(&sql, values)
            .execute(&self.0)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_option(&self, name: &str) -> anyhow::Result<()> {
        let statement = Query::delete()
            .from_table(CartOption::Table)
            .and_where(Expr::col(CartOption::OptionName).eq(name))
            .to_owned();

        let (sql, values) = Self::build_sqlx(statement);

        sqlx::query_with::<DB, _>(&sql, values)
            .execute(&self.0)
            .await?;

        Ok(())
    }

    async fn read_carts(&self, query: &CartQuery) -> anyhow::Result<Vec<cartbounty_core::Cart>> {
        let order = match query.order {
            cartbounty_core::Order::Asc => Order::Asc,
            cartbounty_core::Order::Desc => Order::Desc,
        };

        let statement = Self::select_carts()
            .cond_where(Self::filter_condition(query.filter))
            .order_by((Cart::Table, Self::sort_column(query.sort)), order.clone())
            .order_by((Cart::Table, Cart::Id), order)
            .limit(u64::from(query.per_page))
            .offset(query.offset())
            .to_owned();

        let (sql, values) = Self::build_sqlx(statement);

        Ok(
            sqlx::query_as_with::<DB, cartbounty_core::Cart, _>(&sql, values)
                .fetch_all(&self.0)
                .await?,
        )
    }

    async fn count_carts(&self, filter: CartFilter) -> anyhow::Result<u64> {
        let statement = Query::select()
            .expr(Func::count(Expr::col(Asterisk)))
            .from(Cart::Table)
            .cond_where(Self::filter_condition(filter))
            .to_owned();

        let (sql, values) = Self::build_sqlx(statement);

        let (count,) = sqlx::query_as_with::<DB, (i64,), _>(&sql, values)
            .fetch_one(&self.0)
            .await?;

        Ok(u64::try_from(count)?)
    }

    async fn delete_carts(&self, ids: &[i64]) -> anyhow::Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let statement = Query::delete()
            .from_table(Cart::Table)
            .and_where(Expr::col(Cart::Id).is_in(ids.iter().copied()))
            .to_owned();

        let (sql, values) = Self::build_sqlx(statement);

        let result = sqlx::query_with::<DB, _>(&sql, values)
            .execute(&self.0)
            .await?;

        Ok(result.rows_affected())
    }
}

impl<D: Database> Clone for Sql<D> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<D: Database> From<Pool<D>> for Sql<D> {
    fn from(value: Pool<D>) -> Self {
        Self(value)
    }
}
