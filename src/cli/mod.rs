use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use crate::application::{BankService, DEFAULT_PAGE_SIZE};
use crate::config::StoreConfig;
use crate::domain::{Account, Currency, Transfer, TransferOutcome, TransferRequest};
use crate::logging::init_logging;
use crate::storage::TransferFilter;

/// Strongroom - Banking Ledger
#[derive(Parser)]
#[command(name = "strongroom")]
#[command(about = "A banking ledger with atomic, deadlock-free transfers")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub store: StoreConfig,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Transfer money between two accounts
    Transfer {
        /// Amount to transfer (e.g., "50.00" or "50")
        amount: String,

        /// Source account ID
        #[arg(long)]
        from: i64,

        /// Destination account ID
        #[arg(long)]
        to: i64,

        /// Currency both accounts must hold (EUR, USD, INR)
        #[arg(short, long)]
        currency: String,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List ledger entries of an account
    Entries {
        /// Account ID
        account: i64,

        /// Maximum number of entries to show
        #[arg(short, long, default_value_t = DEFAULT_PAGE_SIZE)]
        limit: i64,

        /// Number of entries to skip
        #[arg(long, default_value_t = 0)]
        offset: i64,
    },

    /// List transfers
    Transfers {
        /// Filter by source account ID
        #[arg(long)]
        from: Option<i64>,

        /// Filter by destination account ID
        #[arg(long)]
        to: Option<i64>,

        /// Maximum number of transfers to show
        #[arg(short, long)]
        limit: Option<i64>,
    },

    /// Show a transfer
    #[command(name = "show")]
    ShowTransfer {
        /// Transfer ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Open a new account
    Create {
        /// Account owner
        owner: String,

        /// Currency code (EUR, USD, INR)
        #[arg(short, long, default_value = "EUR")]
        currency: String,

        /// Opening balance
        #[arg(short, long, default_value = "0")]
        balance: String,
    },

    /// List accounts
    List {
        /// Maximum number of accounts to show
        #[arg(short, long, default_value_t = DEFAULT_PAGE_SIZE)]
        limit: i64,

        /// Number of accounts to skip
        #[arg(long, default_value_t = 0)]
        offset: i64,
    },

    /// Show an account
    Show {
        /// Account ID
        id: i64,
    },

    /// Delete an account without ledger history
    Delete {
        /// Account ID
        id: i64,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        init_logging(self.verbose);

        match self.command {
            Commands::Init => {
                BankService::init(&self.store).await?;
                println!("Database initialized: {}", self.store.database);
            }

            Commands::Account(account_cmd) => {
                let service = BankService::connect(&self.store).await?;
                run_account_command(&service, account_cmd).await?;
            }

            Commands::Transfer {
                amount,
                from,
                to,
                currency,
                json,
            } => {
                let service = BankService::connect(&self.store).await?;
                let request = TransferRequest {
                    from_account_id: from,
                    to_account_id: to,
                    amount: parse_amount(&amount)?,
                    currency: parse_currency(&currency)?,
                };

                let outcome = service.create_transfer(&request).await?;
                print_transfer_outcome(&outcome, json)?;
            }

            Commands::Entries {
                account,
                limit,
                offset,
            } => {
                let service = BankService::connect(&self.store).await?;
                let entries = service.list_entries(account, limit, offset).await?;
                if entries.is_empty() {
                    println!("No entries found.");
                } else {
                    println!("{:<8} {:>14} {:<20}", "ID", "AMOUNT", "CREATED");
                    println!("{}", "-".repeat(44));
                    for entry in entries {
                        println!(
                            "{:<8} {:>14} {:<20}",
                            entry.id,
                            entry.amount,
                            entry.created_at.format("%Y-%m-%d %H:%M:%S")
                        );
                    }
                }
            }

            Commands::Transfers { from, to, limit } => {
                let service = BankService::connect(&self.store).await?;
                let filter = TransferFilter {
                    from_account_id: from,
                    to_account_id: to,
                    limit,
                    offset: None,
                };
                let transfers = service.list_transfers(&filter).await?;
                if transfers.is_empty() {
                    println!("No transfers found.");
                } else {
                    println!(
                        "{:<8} {:>8} {:>8} {:>14} {:<20}",
                        "ID", "FROM", "TO", "AMOUNT", "CREATED"
                    );
                    println!("{}", "-".repeat(62));
                    for transfer in transfers {
                        print_transfer_row(&transfer);
                    }
                }
            }

            Commands::ShowTransfer { id } => {
                let service = BankService::connect(&self.store).await?;
                let transfer = service.get_transfer(id).await?;
                println!("Transfer: {}", transfer.id);
                println!("  From account: {}", transfer.from_account_id);
                println!("  To account:   {}", transfer.to_account_id);
                println!("  Amount:       {}", transfer.amount);
                println!(
                    "  Created:      {}",
                    transfer.created_at.format("%Y-%m-%d %H:%M:%S")
                );
            }
        }

        Ok(())
    }
}

async fn run_account_command(service: &BankService, cmd: AccountCommands) -> Result<()> {
    match cmd {
        AccountCommands::Create {
            owner,
            currency,
            balance,
        } => {
            let account = service
                .create_account(&owner, parse_currency(&currency)?, parse_amount(&balance)?)
                .await?;
            println!(
                "Created account {} for {} ({} {})",
                account.id, account.owner, account.balance, account.currency
            );
        }

        AccountCommands::List { limit, offset } => {
            let accounts = service.list_accounts(limit, offset).await?;
            if accounts.is_empty() {
                println!("No accounts found.");
            } else {
                println!("{:<8} {:<20} {:<8} {:>14}", "ID", "OWNER", "CURRENCY", "BALANCE");
                println!("{}", "-".repeat(53));
                for account in accounts {
                    println!(
                        "{:<8} {:<20} {:<8} {:>14}",
                        account.id, account.owner, account.currency, account.balance
                    );
                }
            }
        }

        AccountCommands::Show { id } => {
            let account = service.get_account(id).await?;
            print_account(&account);
        }

        AccountCommands::Delete { id } => {
            service.delete_account(id).await?;
            println!("Deleted account: {}", id);
        }
    }

    Ok(())
}

fn print_transfer_outcome(outcome: &TransferOutcome, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    println!(
        "Transferred {} from account {} to account {} (transfer {})",
        outcome.transfer.amount,
        outcome.transfer.from_account_id,
        outcome.transfer.to_account_id,
        outcome.transfer.id
    );
    println!(
        "  Account {} balance: {} {}",
        outcome.from_account.id, outcome.from_account.balance, outcome.from_account.currency
    );
    println!(
        "  Account {} balance: {} {}",
        outcome.to_account.id, outcome.to_account.balance, outcome.to_account.currency
    );
    Ok(())
}

fn print_transfer_row(transfer: &Transfer) {
    println!(
        "{:<8} {:>8} {:>8} {:>14} {:<20}",
        transfer.id,
        transfer.from_account_id,
        transfer.to_account_id,
        transfer.amount,
        transfer.created_at.format("%Y-%m-%d %H:%M:%S")
    );
}

fn print_account(account: &Account) {
    println!("Account: {}", account.id);
    println!("  Owner:    {}", account.owner);
    println!("  Currency: {}", account.currency);
    println!("  Balance:  {}", account.balance);
    println!(
        "  Created:  {}",
        account.created_at.format("%Y-%m-%d %H:%M:%S")
    );
}

fn parse_amount(input: &str) -> Result<Decimal> {
    Decimal::from_str(input.trim())
        .with_context(|| format!("Invalid amount '{}'. Use '50.00' or '50'", input))
}

fn parse_currency(input: &str) -> Result<Currency> {
    Currency::from_str(input)
        .ok_or_else(|| anyhow::anyhow!("Invalid currency '{}'. Valid: EUR, USD, INR", input))
}
