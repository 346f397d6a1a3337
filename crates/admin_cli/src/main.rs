use std::error::Error;

use clap::{Args, Parser, Subcommand};
use engine::{Account, Currency, Engine, NewAccount, Page, TransferCmd};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "bank_admin")]
#[command(about = "Admin utilities for the bank ledger (accounts, transfers, audit)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./bank.db?mode=rwc")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Account(AccountArgs),
    /// Move money between two accounts.
    Transfer(TransferArgs),
    /// Check that every transfer is backed by balanced entries.
    Audit,
    Migrate(MigrateArgs),
}

#[derive(Args, Debug)]
struct AccountArgs {
    #[command(subcommand)]
    command: AccountCommand,
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    Create(AccountCreateArgs),
    Show {
        id: i64,
    },
    List {
        #[arg(long)]
        owner: i64,
        #[arg(long, default_value_t = 1)]
        page: u64,
        #[arg(long, default_value_t = engine::DEFAULT_PAGE_LIMIT)]
        limit: u64,
    },
}

#[derive(Args, Debug)]
struct AccountCreateArgs {
    #[arg(long)]
    owner: i64,
    #[arg(long, default_value = "USD", value_parser = parse_currency)]
    currency: Currency,
    /// Opening balance in minor units.
    #[arg(long, default_value_t = 0)]
    balance: i64,
}

#[derive(Args, Debug)]
struct TransferArgs {
    #[arg(long)]
    from: i64,
    #[arg(long)]
    to: i64,
    /// Amount in minor units.
    #[arg(long)]
    amount: i64,
    /// Currency both accounts must hold.
    #[arg(long, value_parser = parse_currency)]
    currency: Currency,
}

#[derive(Args, Debug)]
struct MigrateArgs {
    #[command(subcommand)]
    command: MigrateCommand,
}

#[derive(Subcommand, Debug)]
enum MigrateCommand {
    /// Apply all pending migrations.
    Up,
    /// Roll back the last applied migration.
    Down,
    /// Drop every table and reapply all migrations.
    Fresh,
    Status,
}

fn parse_currency(raw: &str) -> Result<Currency, String> {
    Currency::try_from(raw).map_err(|err| err.to_string())
}

fn print_account(account: &Account) {
    println!(
        "account {}: owner {} balance {} {}",
        account.id, account.owner, account.balance, account.currency
    );
}

async fn connect_db(database_url: &str) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    Ok(db)
}

/// Connects, applies pending migrations and builds the engine.
async fn ledger(db: DatabaseConnection) -> Result<Engine, Box<dyn Error + Send + Sync>> {
    migration::Migrator::up(&db, None).await?;
    Ok(Engine::builder().database(db).build())
}

async fn migrate(
    db: &DatabaseConnection,
    command: MigrateCommand,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    match command {
        MigrateCommand::Up => migration::Migrator::up(db, None).await?,
        MigrateCommand::Down => migration::Migrator::down(db, Some(1)).await?,
        MigrateCommand::Fresh => migration::Migrator::fresh(db).await?,
        MigrateCommand::Status => migration::Migrator::status(db).await?,
    }
    Ok(())
}

async fn account(engine: &Engine, command: AccountCommand) -> Result<(), Box<dyn Error + Send + Sync>> {
    match command {
        AccountCommand::Create(args) => {
            let account = engine
                .create_account(NewAccount::new(args.owner, args.currency).with_balance(args.balance))
                .await?;
            print_account(&account);
        }
        AccountCommand::Show { id } => {
            print_account(&engine.account(id).await?);
        }
        AccountCommand::List { owner, page, limit } => {
            let accounts = engine.accounts(owner, Page::new(page, limit)?).await?;
            if accounts.is_empty() {
                println!("no accounts for owner {owner}");
            }
            for account in &accounts {
                print_account(account);
            }
        }
    }
    Ok(())
}

async fn transfer(engine: &Engine, args: TransferArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    engine.check_account(args.from, args.currency).await?;
    engine.check_account(args.to, args.currency).await?;

    let result = engine
        .transfer_funds(TransferCmd::new(args.from, args.to, args.amount))
        .await?;
    println!(
        "transfer {}: {} {} from {} to {}",
        result.transfer.id, result.transfer.amount, args.currency, args.from, args.to
    );
    print_account(&result.from_account);
    print_account(&result.to_account);
    Ok(())
}

async fn audit(engine: &Engine) -> Result<(), Box<dyn Error + Send + Sync>> {
    let audit = engine.audit().await?;
    println!(
        "checked {} transfers, entry total {}",
        audit.transfers_checked, audit.entry_total
    );
    if !audit.is_balanced() {
        return Err(format!("unbalanced transfers: {:?}", audit.unbalanced_transfers).into());
    }
    println!("ledger balanced");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;

    match cli.command {
        Command::Migrate(MigrateArgs { command }) => migrate(&db, command).await,
        Command::Account(AccountArgs { command }) => account(&ledger(db).await?, command).await,
        Command::Transfer(args) => transfer(&ledger(db).await?, args).await,
        Command::Audit => audit(&ledger(db).await?).await,
    }
}
