//! CLI command definitions for the `paydown` binary.
//!
//! Uses clap derive macros for argument parsing. Every command reads "today"
//! in the configured time zone unless `--date` pins it.

pub mod day;
pub mod loan;
pub mod run;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use paydown_types::loan::{LoanId, LoanKind};

/// Plan and track monthly debt repayments from daily savings.
#[derive(Parser)]
#[command(name = "paydown", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Only log errors; command output is still printed.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Act as if today were this date (YYYY-MM-DD).
    #[arg(long, global = true, env = "PAYDOWN_DATE")]
    pub date: Option<NaiveDate>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default config and seed the starter plan into an empty ledger.
    Init,

    /// Today's savings target (rolls the previous month on the 1st).
    Today,

    /// Record a deposit and allocate it to this month's obligations.
    Save {
        /// Amount saved, e.g. 450000 or 450,000.
        amount: String,
    },

    /// This month's obligations and progress.
    Status,

    /// List every loan, open and closed.
    #[command(alias = "ls")]
    Plan,

    /// Add a loan to the ledger.
    AddLoan {
        /// Display name.
        #[arg(long)]
        name: String,

        /// Required amount per month.
        #[arg(long)]
        amount: i64,

        /// Day of month the payment is due (1-31).
        #[arg(long)]
        due_day: u8,

        /// Number of months left to pay.
        #[arg(long, default_value_t = 1)]
        months: i32,

        /// First month the loan counts in (defaults to the current month).
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Repayment category.
        #[arg(long, value_enum, default_value_t = KindArg::Installment)]
        kind: KindArg,

        /// Produce no obligation before this month.
        #[arg(long)]
        must_start: Option<NaiveDate>,
    },

    /// Close a loan by hand.
    CloseLoan {
        /// Loan id as shown by `paydown plan`.
        id: LoanId,
    },

    /// Apply the month roll for last month now.
    ///
    /// `today` already does this on the 1st; use this only to repair a missed
    /// roll.
    Roll,

    /// Run the daily reminder until interrupted.
    Run {
        /// Send today's reminder once and exit.
        #[arg(long)]
        once: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum KindArg {
    Installment,
    InterestOnly,
    Borrow,
}

impl From<KindArg> for LoanKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Installment => LoanKind::Installment,
            KindArg::InterestOnly => LoanKind::InterestOnly,
            KindArg::Borrow => LoanKind::SingleMonthBorrow,
        }
    }
}

/// Format whole currency units with thousands separators.
pub fn format_money(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(0), "0");
        assert_eq!(format_money(999), "999");
        assert_eq!(format_money(1_000), "1,000");
        assert_eq!(format_money(369_355), "369,355");
        assert_eq!(format_money(11_450_000), "11,450,000");
        assert_eq!(format_money(-2_500), "-2,500");
    }

    #[test]
    fn test_quiet_only_lowers_log_level() {
        let cli = Cli::try_parse_from(["paydown", "--quiet", "status"]).unwrap();
        assert!(cli.quiet);
        assert!(!cli.json);
        assert_eq!(paydown_observe::verbosity_filter(cli.verbose, cli.quiet), "error");

        let help = Cli::command().render_long_help().to_string();
        assert!(help.contains("Only log errors"));
    }

    #[test]
    fn test_parse_save_with_date() {
        let cli = Cli::try_parse_from(["paydown", "--date", "2025-08-01", "save", "450,000"]).unwrap();
        assert_eq!(cli.date, NaiveDate::from_ymd_opt(2025, 8, 1));
        match cli.command {
            Commands::Save { amount } => assert_eq!(amount, "450,000"),
            _ => panic!("expected save"),
        }
    }

    #[test]
    fn test_parse_add_loan_kind() {
        let cli = Cli::try_parse_from([
            "paydown", "add-loan", "--name", "Borrow", "--amount", "5000000", "--due-day", "31",
            "--kind", "borrow",
        ])
        .unwrap();
        match cli.command {
            Commands::AddLoan { kind, months, .. } => {
                assert_eq!(LoanKind::from(kind), LoanKind::SingleMonthBorrow);
                assert_eq!(months, 1);
            }
            _ => panic!("expected add-loan"),
        }
    }

    #[test]
    fn test_close_loan_rejects_bad_id() {
        assert!(Cli::try_parse_from(["paydown", "close-loan", "not-a-uuid"]).is_err());
    }
}
