//! Loan commands: init, plan, add-loan, close-loan.

use anyhow::Result;
use chrono::NaiveDate;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use paydown_core::calendar::first_of_month;
use paydown_types::loan::{LoanId, LoanKind, NewLoan};

use super::format_money;
use crate::state::AppState;

/// Seed the starter plan into an empty ledger.
pub async fn init(state: &AppState, wrote_config: bool, json: bool) -> Result<()> {
    let inserted = state.ledger.bootstrap().await?;

    if json {
        let out = serde_json::json!({
            "data_dir": state.data_dir.display().to_string(),
            "config_written": wrote_config,
            "loans_seeded": inserted,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    if wrote_config {
        println!(
            "  {} Wrote {}",
            style("✓").green().bold(),
            style(state.data_dir.join("config.toml").display()).dim()
        );
    }
    if inserted > 0 {
        println!(
            "  {} Seeded {} loan{}",
            style("✓").green().bold(),
            style(inserted).bold(),
            if inserted == 1 { "" } else { "s" }
        );
    } else {
        println!(
            "  {} Ledger already has loans, nothing seeded.",
            style("i").blue().bold()
        );
    }
    println!();

    Ok(())
}

/// List every loan.
pub async fn plan(state: &AppState, json: bool) -> Result<()> {
    let loans = state.ledger.list_loans().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&loans)?);
        return Ok(());
    }

    if loans.is_empty() {
        println!();
        println!(
            "  {} No loans yet. Seed the starter plan with: {}",
            style("i").blue().bold(),
            style("paydown init").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Name").fg(Color::White),
        Cell::new("Per month").fg(Color::White),
        Cell::new("Due").fg(Color::White),
        Cell::new("Months left").fg(Color::White),
        Cell::new("Starts").fg(Color::White),
        Cell::new("Kind").fg(Color::White),
        Cell::new("Status").fg(Color::White),
        Cell::new("Id").fg(Color::White),
    ]);

    for loan in &loans {
        let status_cell = if loan.closed {
            Cell::new("◌ closed").fg(Color::DarkGrey)
        } else {
            Cell::new("● open").fg(Color::Green)
        };
        table.add_row(vec![
            Cell::new(&loan.name).fg(Color::Cyan),
            Cell::new(format_money(loan.monthly_amount)),
            Cell::new(loan.due_day),
            Cell::new(loan.months_left),
            Cell::new(loan.start_month.format("%Y-%m")),
            Cell::new(kind_label(loan.kind)),
            status_cell,
            Cell::new(loan.id).fg(Color::DarkGrey),
        ]);
    }

    let open = loans.iter().filter(|l| !l.closed).count();
    println!();
    println!("{table}");
    println!();
    println!(
        "  {} open, {} closed",
        style(open).bold(),
        loans.len() - open
    );
    println!();

    Ok(())
}

/// Add a loan. The start month defaults to the current month.
#[allow(clippy::too_many_arguments)]
pub async fn add_loan(
    state: &AppState,
    name: String,
    amount: i64,
    due_day: u8,
    months: i32,
    start: Option<NaiveDate>,
    kind: LoanKind,
    must_start: Option<NaiveDate>,
    json: bool,
) -> Result<()> {
    let start_month = start.unwrap_or_else(|| first_of_month(state.today()));
    let loan = state
        .ledger
        .add_loan(NewLoan {
            name,
            monthly_amount: amount,
            due_day,
            months_left: months,
            start_month,
            kind,
            must_start_month: must_start,
        })
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&loan)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Added {} ({} per month, due day {}, {} month{})",
        style("✓").green().bold(),
        style(&loan.name).cyan(),
        format_money(loan.monthly_amount),
        loan.due_day,
        loan.months_left,
        if loan.months_left == 1 { "" } else { "s" }
    );
    println!("  {}", style(loan.id).dim());
    println!();

    Ok(())
}

pub async fn close_loan(state: &AppState, id: &LoanId, json: bool) -> Result<()> {
    let loan = state.ledger.close_loan(id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&loan)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Closed {}",
        style("✓").green().bold(),
        style(&loan.name).cyan()
    );
    println!();
    Ok(())
}

fn kind_label(kind: LoanKind) -> &'static str {
    match kind {
        LoanKind::Installment => "installment",
        LoanKind::InterestOnly => "interest only",
        LoanKind::SingleMonthBorrow => "borrow",
    }
}
