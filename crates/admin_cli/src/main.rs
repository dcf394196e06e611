use std::error::Error;

use chrono::NaiveDate;
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand};
use engine::{AccountKind, AccountScope, CategoryKind, Engine, MoneyCents, NewAccountCmd};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use serde::Serialize;
use uuid::Uuid;

use crate::settings::Settings;

mod settings;

type ResultCli<T> = Result<T, Box<dyn Error + Send + Sync>>;

#[derive(Parser, Debug)]
#[command(name = "household_admin")]
#[command(about = "Admin utilities for the household finance engine")]
struct Cli {
    /// Database connection string. Overrides the configured one.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// IANA timezone used to compute "today". Overrides the configured one.
    #[arg(long)]
    timezone: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending migrations and exit.
    Migrate,
    Family(Family),
    Account(Account),
    Category(Category),
    /// Recompute the cached balance of an account.
    Recalculate(RecalculateArgs),
    /// Rebuild the pending instances of a recurring template.
    Regenerate(RegenerateArgs),
    /// Print the overview of a month.
    Summary(SummaryArgs),
}

#[derive(Args, Debug)]
struct Family {
    #[command(subcommand)]
    command: FamilyCommand,
}

#[derive(Subcommand, Debug)]
enum FamilyCommand {
    /// Create a family and its first admin.
    Register(FamilyRegisterArgs),
}

#[derive(Args, Debug)]
struct FamilyRegisterArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    name: String,
}

#[derive(Args, Debug)]
struct Account {
    #[command(subcommand)]
    command: AccountCommand,
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    Create(AccountCreateArgs),
    List(AccountListArgs),
    Archive(AccountIdArgs),
    Unarchive(AccountIdArgs),
}

#[derive(Args, Debug)]
struct AccountCreateArgs {
    #[arg(long)]
    family: Uuid,
    #[arg(long)]
    name: String,
    #[arg(long = "type", default_value = "checking", value_parser = parse_account_kind)]
    kind: AccountKind,
    /// Decimal amount, `.` or `,` as separator.
    #[arg(long, default_value = "0")]
    initial_balance: MoneyCents,
    #[arg(long)]
    icon: Option<String>,
    #[arg(long)]
    color: Option<String>,
}

#[derive(Args, Debug)]
struct AccountListArgs {
    #[arg(long)]
    family: Uuid,
    #[arg(long, default_value = "active", value_parser = parse_account_scope)]
    scope: AccountScope,
}

#[derive(Args, Debug)]
struct AccountIdArgs {
    #[arg(long)]
    family: Uuid,
    #[arg(long)]
    id: Uuid,
}

#[derive(Args, Debug)]
struct Category {
    #[command(subcommand)]
    command: CategoryCommand,
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    Create(CategoryCreateArgs),
    List(CategoryListArgs),
}

#[derive(Args, Debug)]
struct CategoryCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long, value_parser = parse_category_kind)]
    kind: CategoryKind,
}

#[derive(Args, Debug)]
struct CategoryListArgs {
    /// Include archived categories.
    #[arg(long)]
    all: bool,
}

#[derive(Args, Debug)]
struct RecalculateArgs {
    #[arg(long)]
    family: Uuid,
    #[arg(long)]
    account: Uuid,
}

#[derive(Args, Debug)]
struct RegenerateArgs {
    #[arg(long)]
    family: Uuid,
    #[arg(long)]
    template: Uuid,
}

#[derive(Args, Debug)]
struct SummaryArgs {
    #[arg(long)]
    family: Uuid,
    /// Any day of the month, `YYYY-MM-DD`. Defaults to today.
    #[arg(long)]
    month: Option<NaiveDate>,
}

fn parse_account_kind(raw: &str) -> Result<AccountKind, String> {
    AccountKind::try_from(raw.to_ascii_lowercase().as_str()).map_err(|err| err.to_string())
}

fn parse_category_kind(raw: &str) -> Result<CategoryKind, String> {
    match raw.to_ascii_lowercase().as_str() {
        "income" => Ok(CategoryKind::Income),
        "expense" => Ok(CategoryKind::Expense),
        other => Err(format!("unsupported category kind: {other}")),
    }
}

fn parse_account_scope(raw: &str) -> Result<AccountScope, String> {
    match raw.to_ascii_lowercase().as_str() {
        "active" => Ok(AccountScope::Active),
        "archived" => Ok(AccountScope::Archived),
        "all" => Ok(AccountScope::All),
        other => Err(format!("unsupported scope: {other}")),
    }
}

fn print_json(value: &impl Serialize) -> ResultCli<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn connect_db(database_url: &str) -> ResultCli<DatabaseConnection> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> ResultCli<()> {
    let cli = Cli::parse();
    let settings = Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "household_admin={level},engine={level},migration={level}",
            level = settings.app.level
        ))
        .init();

    let database_url = cli.database_url.unwrap_or(settings.database.url);
    let timezone_name = cli.timezone.unwrap_or(settings.app.timezone);
    let timezone = timezone_name
        .parse::<Tz>()
        .map_err(|err| format!("invalid timezone {timezone_name}: {err}"))?;

    let db = connect_db(&database_url).await?;
    if matches!(cli.command, Command::Migrate) {
        tracing::info!("migrations applied");
        return Ok(());
    }

    let engine = Engine::builder()
        .database(db)
        .timezone(timezone)
        .build()
        .await?;

    match cli.command {
        Command::Migrate => {}
        Command::Family(Family {
            command: FamilyCommand::Register(args),
        }) => {
            let admin = engine.register_family(&args.email, &args.name).await?;
            print_json(&admin)?;
        }
        Command::Account(Account { command }) => match command {
            AccountCommand::Create(args) => {
                let mut cmd = NewAccountCmd::new(args.family, args.name, args.kind)
                    .initial_balance(args.initial_balance);
                if let Some(icon) = args.icon {
                    cmd = cmd.icon(icon);
                }
                if let Some(color) = args.color {
                    cmd = cmd.color(color);
                }
                print_json(&engine.new_account(cmd).await?)?;
            }
            AccountCommand::List(args) => {
                print_json(&engine.accounts(args.family, args.scope).await?)?;
            }
            AccountCommand::Archive(args) => {
                print_json(&engine.archive_account(args.family, args.id).await?)?;
            }
            AccountCommand::Unarchive(args) => {
                print_json(&engine.unarchive_account(args.family, args.id).await?)?;
            }
        },
        Command::Category(Category { command }) => match command {
            CategoryCommand::Create(args) => {
                print_json(&engine.new_category(&args.name, args.kind).await?)?;
            }
            CategoryCommand::List(args) => {
                print_json(&engine.categories(args.all).await?)?;
            }
        },
        Command::Recalculate(args) => {
            match engine.recalculate_balance(args.family, args.account).await? {
                Some(balance) => println!("{}: {balance}", args.account),
                None => {
                    eprintln!("account not found: {}", args.account);
                    std::process::exit(1);
                }
            }
        }
        Command::Regenerate(args) => {
            let instances = engine.regenerate_template(args.family, args.template).await?;
            print_json(&instances)?;
        }
        Command::Summary(args) => {
            let month = args.month.unwrap_or_else(|| engine.today());
            print_json(&engine.monthly_summary(args.family, month).await?)?;
        }
    }

    Ok(())
}
