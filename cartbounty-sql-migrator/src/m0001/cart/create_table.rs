use sea_query::{ColumnDef, Table, TableCreateStatement, TableDropStatement};

use cartbounty_sql::Cart;

pub struct Operation;

// SQLite only accepts AUTOINCREMENT on an INTEGER primary key, which is
// already 64-bit there.
fn up_statement(big_id: bool) -> TableCreateStatement {
    let flag = |column: Cart| ColumnDef::new(column).integer().not_null().default(0).to_owned();

    let mut id = ColumnDef::new(Cart::Id);
    if big_id {
        id.big_integer();
    } else {
        id.integer();
    }

    Table::create()
        .table(Cart::Table)
        .if_not_exists()
        .col(id.not_null().auto_increment().primary_key())
        .col(ColumnDef::new(Cart::Name).string_len(60))
        .col(ColumnDef::new(Cart::Surname).string_len(60))
        .col(ColumnDef::new(Cart::Email).string_len(100))
        .col(ColumnDef::new(Cart::Phone).string_len(20))
        .col(ColumnDef::new(Cart::Location).string_len(100))
        .col(ColumnDef::new(Cart::CartContents).text())
        .col(ColumnDef::new(Cart::CartTotal).decimal_len(10, 2))
        .col(ColumnDef::new(Cart::Currency).string_len(10))
        .col(ColumnDef::new(Cart::Time).date_time().null())
        .col(ColumnDef::new(Cart::SessionId).string_len(60))
        .col(flag(Cart::MailSent))
        .col(ColumnDef::new(Cart::OtherFields).text())
        .col(flag(Cart::WpUnsubscribed))
        .col(flag(Cart::WpStepsCompleted))
        .col(flag(Cart::WpComplete))
        .col(flag(Cart::Type))
        .to_owned()
}

fn down_statement() -> TableDropStatement {
    Table::drop().table(Cart::Table).to_owned()
}

#[cfg(feature = "sqlite")]
#[async_trait::async_trait]
impl sqlx_migrator::Operation<sqlx::Sqlite> for Operation {
    async fn up(
        &self,
        connection: &mut sqlx::SqliteConnection,
    ) -> Result<(), sqlx_migrator::Error> {
        let statement = up_statement(false).to_string(sea_query::SqliteQueryBuilder);
        sqlx::query(&statement).execute(connection).await?;

        Ok(())
    }

    async fn down(
        &self,
        connection: &mut sqlx::SqliteConnection,
    ) -> Result<(), sqlx_migrator::Error> {
        let statement = down_statement().to_string(sea_query::SqliteQueryBuilder);
        sqlx::query(&statement).execute(connection).await?;

        Ok(())
    }
}

#[cfg(feature = "mysql")]
#[async_trait::async_trait]
impl sqlx_migrator::Operation<sqlx::MySql> for Operation {
    async fn up(&self, connection: &mut sqlx::MySqlConnection) -> Result<(), sqlx_migrator::Error> {
        let statement = up_statement(true).to_string(sea_query::MysqlQueryBuilder);
        sqlx::query(&statement).execute(connection).await?;

        Ok(())
    }

    async fn down(
        &self,
        connection: &mut sqlx::MySqlConnection,
    ) -> Result<(), sqlx_migrator::Error> {
        let statement = down_statement().to_string(sea_query::MysqlQueryBuilder);
        sqlx::query(&statement).execute(connection).await?;

        Ok(())
    }
}

#[cfg(feature = "postgres")]
#[async_trait::async_trait]
impl sqlx_migrator::Operation<sqlx::Postgres> for Operation {
    async fn up(&self, connection: &mut sqlx::PgConnection) -> Result<(), sqlx_migrator::Error> {
        let statement = up_statement(true).to_string(sea_query::PostgresQueryBuilder);
        sqlx::query(&statement).execute(connection).await?;

        Ok(())
    }

    async fn down(&self, connection: &mut sqlx::PgConnection) -> Result<(), sqlx_migrator::Error> {
        let statement = down_statement().to_string(sea_query::PostgresQueryBuilder);
        sqlx::query(&statement).execute(connection).await?;

        Ok(())
    }
}
