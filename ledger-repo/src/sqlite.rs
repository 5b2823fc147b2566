//! SQLite storage adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool, Transaction};
use std::str::FromStr;
use std::time::Duration;

use ledger_types::{
    Account, AccountDirectory, AtomicStore, BalanceChange, DomainError, Finalization, GroupId,
    Money, OwnerId, PageRequest, ProductCatalog, RepoError, Role, ServiceType, ThresholdLimits,
    ThresholdProfile, ThresholdProfileId, ThresholdRepository, TransferFilter, TransferId,
    TransferLedger, TransferLineItem, TransferRecord, TransferScope, Wallet, WalletId, WalletKind,
    WalletStore, WindowUsage,
};

use crate::types::{
    DbAccount, DbLimits, DbLineItem, DbProfile, DbTransfer, DbUsage, DbWallet, LINE_ITEM_COLUMNS,
    TRANSFER_COLUMNS, WALLET_COLUMNS, fmt_ts,
};

const SCHEMA: &str = include_str!("../migrations/0001_create_tables.sql");

// SQLite result codes reported by sqlx as strings.
const SQLITE_BUSY: &str = "5";
const SQLITE_LOCKED: &str = "6";
const SQLITE_BUSY_SNAPSHOT: &str = "517";

/// Maps a sqlx error onto the repository taxonomy.
///
/// Busy or locked databases surface as [`RepoError::Conflict`] so callers
/// retry them; unique-key violations become [`RepoError::Duplicate`].
fn map_db_err(e: sqlx::Error) -> RepoError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return RepoError::Duplicate(db.message().to_string());
        }
        if let Some(code) = db.code() {
            if matches!(
                code.as_ref(),
                SQLITE_BUSY | SQLITE_LOCKED | SQLITE_BUSY_SNAPSHOT
            ) {
                return RepoError::Conflict(db.message().to_string());
            }
        }
    }
    if matches!(e, sqlx::Error::PoolTimedOut) {
        return RepoError::Conflict(e.to_string());
    }
    RepoError::Database(e.to_string())
}

fn map_tx_err(e: sqlx::Error) -> RepoError {
    match map_db_err(e) {
        RepoError::Database(msg) => RepoError::Transaction(msg),
        other => other,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Repository
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite repository implementation.
#[derive(Clone)]
pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    /// Connects and applies the schema.
    ///
    /// In-memory databases get a single-connection pool, since every
    /// connection would otherwise see its own empty database.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");

        // Ensure on-disk SQLite target directory exists.
        if !in_memory {
            if let Some(path) = database_url.strip_prefix("sqlite://") {
                let path = path.split('?').next().unwrap_or(path);
                if let Some(parent) = std::path::Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let mut options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));
        if !in_memory {
            // Readers never block the writer, and writers queue on busy_timeout.
            options = options.journal_mode(SqliteJournalMode::Wal);
        }
        let pool = if in_memory {
            // The database lives as long as its one connection.
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(8)
        }
        .connect_with(options)
        .await?;

        let repo = Self { pool };
        repo.create_schema().await?;
        tracing::info!(in_memory, "SQLite ledger schema ready");
        Ok(repo)
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Applies the schema. Idempotent.
    pub async fn create_schema(&self) -> Result<(), RepoError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }
}

fn status_str(active: bool) -> &'static str {
    if active { "ACTIVE" } else { "INACTIVE" }
}

// ─────────────────────────────────────────────────────────────────────────────
// Connection-level helpers shared by the pool and scopes
// ─────────────────────────────────────────────────────────────────────────────

async fn fetch_wallet(
    conn: &mut SqliteConnection,
    id: &WalletId,
) -> Result<Option<Wallet>, RepoError> {
    let sql = format!("SELECT {} FROM wallets WHERE id = ?", WALLET_COLUMNS);
    let row: Option<DbWallet> = sqlx::query_as(&sql)
        .bind(id.as_str())
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_db_err)?;

    row.map(DbWallet::into_domain).transpose()
}

/// Writes a mutated wallet if its row still carries `expected_version`.
async fn store_wallet(
    conn: &mut SqliteConnection,
    wallet: &Wallet,
    expected_version: i64,
) -> Result<(), RepoError> {
    let result = sqlx::query(
        r#"UPDATE wallets
           SET balance = ?, previous_balance = ?, net_credit = ?, net_debit = ?,
               last_transfer_id = ?, last_direction = ?, last_transfer_at = ?, version = ?
           WHERE id = ? AND version = ?"#,
    )
    .bind(wallet.balance.minor())
    .bind(wallet.previous_balance.minor())
    .bind(wallet.net_credit.minor())
    .bind(wallet.net_debit.minor())
    .bind(wallet.last_transfer_id.as_ref().map(|t| t.as_str()))
    .bind(wallet.last_direction.map(|d| d.as_str()))
    .bind(wallet.last_transfer_at.as_ref().map(fmt_ts))
    .bind(wallet.version)
    .bind(wallet.id.as_str())
    .bind(expected_version)
    .execute(&mut *conn)
    .await
    .map_err(map_db_err)?;

    if result.rows_affected() == 0 {
        tracing::debug!(wallet_id = %wallet.id, expected_version, "wallet version check failed");
        return Err(RepoError::Conflict(format!(
            "wallet {} changed concurrently",
            wallet.id
        )));
    }
    Ok(())
}

async fn fetch_transfer(
    conn: &mut SqliteConnection,
    id: &TransferId,
) -> Result<Option<TransferRecord>, RepoError> {
    let sql = format!("SELECT {} FROM transfers WHERE id = ?", TRANSFER_COLUMNS);
    let row: Option<DbTransfer> = sqlx::query_as(&sql)
        .bind(id.as_str())
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_db_err)?;

    row.map(DbTransfer::into_domain).transpose()
}

/// Moves a PENDING header to its terminal state; never touches a finalized one.
async fn finalize_transfer(
    conn: &mut SqliteConnection,
    id: &TransferId,
    fin: &Finalization,
) -> Result<TransferRecord, RepoError> {
    let mut record = fetch_transfer(conn, id).await?.ok_or(RepoError::NotFound)?;
    record.finalize(fin.clone(), Utc::now())?;

    let result = sqlx::query(
        r#"UPDATE transfers
           SET status = ?, error_code = ?, remarks = ?, modified_at = ?
           WHERE id = ? AND status = 'PENDING'"#,
    )
    .bind(record.status.as_str())
    .bind(record.error_code.map(|c| c.as_str()))
    .bind(&record.remarks)
    .bind(fmt_ts(&record.modified_at))
    .bind(id.as_str())
    .execute(&mut *conn)
    .await
    .map_err(map_db_err)?;

    if result.rows_affected() == 0 {
        return Err(RepoError::Domain(DomainError::AlreadyFinalized(id.clone())));
    }
    Ok(record)
}

async fn insert_item(conn: &mut SqliteConnection, item: &TransferLineItem) -> Result<(), RepoError> {
    sqlx::query(
        r#"INSERT INTO transfer_items
               (transfer_id, party_id, counterparty_id, wallet_id, direction, amount,
                previous_balance, post_balance, party_type, service_type, product_type, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(item.transfer_id.as_str())
    .bind(item.party_id.as_str())
    .bind(item.counterparty_id.as_str())
    .bind(item.wallet_id.as_str())
    .bind(item.direction.as_str())
    .bind(item.amount.minor())
    .bind(item.previous_balance.minor())
    .bind(item.post_balance.minor())
    .bind(item.party_type.as_str())
    .bind(item.service_type.as_str())
    .bind(item.product_type.as_str())
    .bind(fmt_ts(&item.created_at))
    .execute(&mut *conn)
    .await
    .map_err(map_db_err)?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Atomic scope
// ─────────────────────────────────────────────────────────────────────────────

/// A database transaction. Dropping it without commit rolls back.
struct SqliteScope {
    tx: Transaction<'static, Sqlite>,
}

impl SqliteScope {
    async fn mutate<F>(
        &mut self,
        id: &WalletId,
        apply: F,
    ) -> Result<BalanceChange, RepoError>
    where
        F: FnOnce(&mut Wallet) -> Result<BalanceChange, DomainError> + Send,
    {
        let mut wallet = fetch_wallet(&mut self.tx, id)
            .await?
            .ok_or(RepoError::NotFound)?;
        let expected = wallet.version;
        let change = apply(&mut wallet)?;
        store_wallet(&mut self.tx, &wallet, expected).await?;
        Ok(change)
    }
}

#[async_trait]
impl TransferScope for SqliteScope {
    async fn debit(
        &mut self,
        wallet: &WalletId,
        amount: Money,
        reference: &TransferId,
    ) -> Result<BalanceChange, RepoError> {
        self.mutate(wallet, |w| w.debit(amount, reference, Utc::now()))
            .await
    }

    async fn credit(
        &mut self,
        wallet: &WalletId,
        amount: Money,
        reference: &TransferId,
    ) -> Result<BalanceChange, RepoError> {
        self.mutate(wallet, |w| w.credit(amount, reference, Utc::now()))
            .await
    }

    async fn append_items(
        &mut self,
        debit: &TransferLineItem,
        credit: &TransferLineItem,
    ) -> Result<(), RepoError> {
        insert_item(&mut self.tx, debit).await?;
        insert_item(&mut self.tx, credit).await
    }

    async fn finalize(
        &mut self,
        id: &TransferId,
        fin: &Finalization,
    ) -> Result<TransferRecord, RepoError> {
        finalize_transfer(&mut self.tx, id, fin).await
    }

    async fn commit(self: Box<Self>) -> Result<(), RepoError> {
        self.tx.commit().await.map_err(map_tx_err)
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepoError> {
        self.tx.rollback().await.map_err(map_tx_err)
    }
}

#[async_trait]
impl AtomicStore for SqliteRepo {
    async fn begin(&self) -> Result<Box<dyn TransferScope>, RepoError> {
        // Take the write lock up front; a deferred read lock upgraded later
        // fails with BUSY without waiting.
        let tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(map_tx_err)?;
        Ok(Box::new(SqliteScope { tx }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wallets
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl WalletStore for SqliteRepo {
    async fn insert_wallet(&self, wallet: &Wallet) -> Result<(), RepoError> {
        sqlx::query(
            r#"INSERT INTO wallets
                   (id, owner_id, owner_type, kind, balance, previous_balance, net_credit,
                    net_debit, status, ceiling, version, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(wallet.id.as_str())
        .bind(wallet.owner_id.as_str())
        .bind(wallet.owner_type.as_str())
        .bind(wallet.kind.as_str())
        .bind(wallet.balance.minor())
        .bind(wallet.previous_balance.minor())
        .bind(wallet.net_credit.minor())
        .bind(wallet.net_debit.minor())
        .bind(wallet.status.as_str())
        .bind(wallet.ceiling.minor())
        .bind(wallet.version)
        .bind(fmt_ts(&wallet.created_at))
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    async fn get_wallet(
        &self,
        owner: &OwnerId,
        kind: WalletKind,
    ) -> Result<Option<Wallet>, RepoError> {
        let sql = format!(
            "SELECT {} FROM wallets WHERE owner_id = ? AND kind = ?",
            WALLET_COLUMNS
        );
        let row: Option<DbWallet> = sqlx::query_as(&sql)
            .bind(owner.as_str())
            .bind(kind.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?;

        row.map(DbWallet::into_domain).transpose()
    }

    async fn get_wallet_by_id(&self, id: &WalletId) -> Result<Option<Wallet>, RepoError> {
        let mut conn = self.pool.acquire().await.map_err(map_db_err)?;
        fetch_wallet(&mut conn, id).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transfer ledger
// ─────────────────────────────────────────────────────────────────────────────

/// Appends the party and filter predicates shared by the page and count queries.
fn push_party_filter(qb: &mut QueryBuilder<'_, Sqlite>, owner: &OwnerId, filter: &TransferFilter) {
    qb.push(" WHERE (payer_id = ")
        .push_bind(owner.as_str().to_string())
        .push(" OR payee_id = ")
        .push_bind(owner.as_str().to_string())
        .push(")");

    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(from) = &filter.from {
        qb.push(" AND created_at >= ").push_bind(fmt_ts(from));
    }
    if let Some(to) = &filter.to {
        qb.push(" AND created_at < ").push_bind(fmt_ts(to));
    }
}

#[async_trait]
impl TransferLedger for SqliteRepo {
    async fn append_header(&self, record: &TransferRecord) -> Result<(), RepoError> {
        sqlx::query(
            r#"INSERT INTO transfers
                   (id, payer_id, payee_id, amount, status, service_type, product_type,
                    product_id, error_code, remarks, idempotency_key, created_by, created_at,
                    modified_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(record.id.as_str())
        .bind(record.payer_id.as_str())
        .bind(record.payee_id.as_str())
        .bind(record.amount.minor())
        .bind(record.status.as_str())
        .bind(record.service_type.as_str())
        .bind(record.product_type.as_str())
        .bind(&record.product_id)
        .bind(record.error_code.map(|c| c.as_str()))
        .bind(&record.remarks)
        .bind(&record.idempotency_key)
        .bind(record.created_by.as_str())
        .bind(fmt_ts(&record.created_at))
        .bind(fmt_ts(&record.modified_at))
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    async fn finalize(
        &self,
        id: &TransferId,
        fin: &Finalization,
    ) -> Result<TransferRecord, RepoError> {
        let mut conn = self.pool.acquire().await.map_err(map_db_err)?;
        finalize_transfer(&mut conn, id, fin).await
    }

    async fn get_transfer(&self, id: &TransferId) -> Result<Option<TransferRecord>, RepoError> {
        let mut conn = self.pool.acquire().await.map_err(map_db_err)?;
        fetch_transfer(&mut conn, id).await
    }

    async fn transfer_items(&self, id: &TransferId) -> Result<Vec<TransferLineItem>, RepoError> {
        let sql = format!(
            "SELECT {} FROM transfer_items WHERE transfer_id = ? ORDER BY direction DESC",
            LINE_ITEM_COLUMNS
        );
        let rows: Vec<DbLineItem> = sqlx::query_as(&sql)
            .bind(id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?;

        rows.into_iter().map(DbLineItem::into_domain).collect()
    }

    async fn find_by_idempotency_key(
        &self,
        key: &str,
    ) -> Result<Option<TransferRecord>, RepoError> {
        let sql = format!(
            "SELECT {} FROM transfers WHERE idempotency_key = ?",
            TRANSFER_COLUMNS
        );
        let row: Option<DbTransfer> = sqlx::query_as(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?;

        row.map(DbTransfer::into_domain).transpose()
    }

    async fn list_by_party(
        &self,
        owner: &OwnerId,
        filter: &TransferFilter,
        page: PageRequest,
    ) -> Result<(Vec<TransferRecord>, u64), RepoError> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM transfers");
        push_party_filter(&mut count, owner, filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_err)?;

        let mut select =
            QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM transfers", TRANSFER_COLUMNS));
        push_party_filter(&mut select, owner, filter);
        select
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(i64::from(page.limit))
            .push(" OFFSET ")
            .push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));

        let rows: Vec<DbTransfer> = select
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?;

        let records = rows
            .into_iter()
            .map(DbTransfer::into_domain)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((records, u64::try_from(total).unwrap_or_default()))
    }

    async fn usage(
        &self,
        owner: &OwnerId,
        role: Role,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<WindowUsage, RepoError> {
        let sql = match role {
            Role::Payer => {
                r#"SELECT COUNT(*) AS count, COALESCE(SUM(amount), 0) AS amount FROM transfers
                   WHERE payer_id = ? AND status = 'SUCCESS' AND created_at >= ? AND created_at < ?"#
            }
            Role::Payee => {
                r#"SELECT COUNT(*) AS count, COALESCE(SUM(amount), 0) AS amount FROM transfers
                   WHERE payee_id = ? AND status = 'SUCCESS' AND created_at >= ? AND created_at < ?"#
            }
        };

        let row: DbUsage = sqlx::query_as(sql)
            .bind(owner.as_str())
            .bind(fmt_ts(&start))
            .bind(fmt_ts(&end))
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_err)?;

        row.into_domain()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Thresholds
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl ThresholdRepository for SqliteRepo {
    async fn insert_profile(&self, profile: &ThresholdProfile) -> Result<(), RepoError> {
        sqlx::query(
            r#"INSERT INTO threshold_profiles (id, name, owner_type, status, created_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(profile.id.as_str())
        .bind(&profile.name)
        .bind(profile.owner_type.as_str())
        .bind(profile.status.as_str())
        .bind(fmt_ts(&profile.created_at))
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    async fn get_profile(
        &self,
        id: &ThresholdProfileId,
    ) -> Result<Option<ThresholdProfile>, RepoError> {
        let row: Option<DbProfile> = sqlx::query_as(
            r#"SELECT id, name, owner_type, status, created_at FROM threshold_profiles WHERE id = ?"#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?;

        row.map(DbProfile::into_domain).transpose()
    }

    async fn upsert_limits(&self, limits: &ThresholdLimits) -> Result<(), RepoError> {
        let result = sqlx::query(
            r#"INSERT INTO threshold_limits
                   (profile_id, group_id, payer_count, payer_amount, payee_count, payee_amount)
               SELECT ?, ?, ?, ?, ?, ?
               WHERE EXISTS (SELECT 1 FROM threshold_profiles WHERE id = ?)
               ON CONFLICT(profile_id, group_id) DO UPDATE SET
                   payer_count = excluded.payer_count,
                   payer_amount = excluded.payer_amount,
                   payee_count = excluded.payee_count,
                   payee_amount = excluded.payee_amount"#,
        )
        .bind(limits.profile_id.as_str())
        .bind(limits.group_id.as_str())
        .bind(limits.payer_count)
        .bind(limits.payer_amount.minor())
        .bind(limits.payee_count)
        .bind(limits.payee_amount.minor())
        .bind(limits.profile_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn get_limits(
        &self,
        profile: &ThresholdProfileId,
        group: &GroupId,
    ) -> Result<Option<ThresholdLimits>, RepoError> {
        let row: Option<DbLimits> = sqlx::query_as(
            r#"SELECT profile_id, group_id, payer_count, payer_amount, payee_count, payee_amount
               FROM threshold_limits WHERE profile_id = ? AND group_id = ?"#,
        )
        .bind(profile.as_str())
        .bind(group.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?;

        row.map(DbLimits::into_domain).transpose()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Directory and catalog
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl AccountDirectory for SqliteRepo {
    async fn get_account(&self, owner: &OwnerId) -> Result<Option<Account>, RepoError> {
        let row: Option<DbAccount> = sqlx::query_as(
            r#"SELECT id, account_type, status, credential_hash, threshold_profile_id, created_at
               FROM accounts WHERE id = ?"#,
        )
        .bind(owner.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?;

        row.map(DbAccount::into_domain).transpose()
    }

    async fn register_account(&self, account: &Account) -> Result<(), RepoError> {
        sqlx::query(
            r#"INSERT INTO accounts (id, account_type, status, credential_hash, threshold_profile_id, created_at)
               VALUES (?, ?, ?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                   account_type = excluded.account_type,
                   status = excluded.status,
                   credential_hash = excluded.credential_hash,
                   threshold_profile_id = excluded.threshold_profile_id"#,
        )
        .bind(account.id.as_str())
        .bind(account.account_type.as_str())
        .bind(account.status.as_str())
        .bind(&account.credential_hash)
        .bind(account.threshold_profile_id.as_ref().map(|p| p.as_str()))
        .bind(fmt_ts(&account.created_at))
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }
}

#[async_trait]
impl ProductCatalog for SqliteRepo {
    async fn is_active(&self, product_id: &str) -> Result<bool, RepoError> {
        let status: Option<String> =
            sqlx::query_scalar(r#"SELECT status FROM products WHERE id = ?"#)
                .bind(product_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_db_err)?;

        Ok(status.as_deref() == Some("ACTIVE"))
    }

    async fn is_active_service(&self, service: ServiceType) -> Result<bool, RepoError> {
        let status: Option<String> =
            sqlx::query_scalar(r#"SELECT status FROM service_types WHERE service_type = ?"#)
                .bind(service.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_db_err)?;

        Ok(status.as_deref() == Some("ACTIVE"))
    }

    async fn set_product_active(&self, product_id: &str, active: bool) -> Result<(), RepoError> {
        sqlx::query(
            r#"INSERT INTO products (id, status) VALUES (?, ?)
               ON CONFLICT(id) DO UPDATE SET status = excluded.status"#,
        )
        .bind(product_id)
        .bind(status_str(active))
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    async fn set_service_active(
        &self,
        service: ServiceType,
        active: bool,
    ) -> Result<(), RepoError> {
        sqlx::query(
            r#"INSERT INTO service_types (service_type, status) VALUES (?, ?)
               ON CONFLICT(service_type) DO UPDATE SET status = excluded.status"#,
        )
        .bind(service.as_str())
        .bind(status_str(active))
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }
}
