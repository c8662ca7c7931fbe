//! Day-to-day commands: today, save, status, roll.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use paydown_core::service::parse_amount;
use paydown_types::report::{MonthPool, RollSummary};

use super::format_money;
use crate::state::AppState;

/// Show today's savings target, rolling last month first on the 1st.
pub async fn today(state: &AppState, json: bool) -> Result<()> {
    let today = state.today();
    let start = state.ledger.begin_day(today).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&start)?);
        return Ok(());
    }

    if let Some(summary) = &start.rolled {
        print_roll(summary);
    }

    println!();
    println!(
        "  {} Save today ({}): {}",
        style("◆").cyan().bold(),
        today.format("%d/%m/%Y"),
        style(format_money(start.pool.daily_target)).green().bold()
    );
    println!();
    print_pool(&start.pool);
    println!();

    Ok(())
}

/// Record a deposit and show how it was allocated.
pub async fn save(state: &AppState, amount: &str, json: bool) -> Result<()> {
    let amount = parse_amount(amount)?;
    let today = state.today();
    let report = state.ledger.save(today, amount).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if let Some(summary) = &report.rolled {
        print_roll(summary);
    }

    println!();
    if report.achieved {
        println!(
            "  {} Target reached for today",
            style("✓").green().bold()
        );
    } else {
        println!(
            "  {} Below today's target of {}",
            style("!").yellow().bold(),
            format_money(report.target_before)
        );
    }
    println!(
        "  Saved {} ({} unallocated)",
        style(format_money(report.amount)).bold(),
        format_money(report.allocation.unallocated)
    );
    println!();
    println!("  Target before saving: {}", format_money(report.target_before));
    println!(
        "  Left this month:      {}",
        format_money(report.pool_after.remaining)
    );
    println!(
        "  New daily target:     {} ({} days left)",
        style(format_money(report.pool_after.daily_target)).cyan(),
        report.pool_after.days_left
    );

    if !report.closed_loans.is_empty() {
        println!();
        println!("  {}", style("── Closed loans ──").dim());
        for loan in &report.closed_loans {
            println!("  • {}", loan.name);
        }
    }
    println!();

    Ok(())
}

/// Show every obligation of the current month.
pub async fn status(state: &AppState, json: bool) -> Result<()> {
    let status = state.ledger.month_status(state.today()).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} {}",
        style("◆").cyan().bold(),
        style(status.month.format("%B %Y")).bold()
    );
    println!();
    print_pool(&status.pool);
    println!();

    if status.lines.is_empty() {
        println!(
            "  {} Nothing due this month.",
            style("i").blue().bold()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("").fg(Color::White),
        Cell::new("Loan").fg(Color::White),
        Cell::new("Due").fg(Color::White),
        Cell::new("Required").fg(Color::White),
        Cell::new("Paid").fg(Color::White),
    ]);

    for line in &status.lines {
        let ob = &line.obligation;
        let flag = if ob.is_paid {
            Cell::new("✓").fg(Color::Green)
        } else if ob.amount_paid > 0 {
            Cell::new("◐").fg(Color::Yellow)
        } else {
            Cell::new("○").fg(Color::DarkGrey)
        };
        table.add_row(vec![
            flag,
            Cell::new(&line.loan_name).fg(Color::Cyan),
            Cell::new(line.due_day),
            Cell::new(format_money(ob.amount_required)),
            Cell::new(format_money(ob.amount_paid)),
        ]);
    }

    println!("{table}");
    println!();

    Ok(())
}

/// Roll last month unconditionally.
pub async fn roll(state: &AppState, json: bool) -> Result<()> {
    let summary = state.ledger.roll_previous_month(state.today()).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    print_roll(&summary);
    println!();
    Ok(())
}

fn print_pool(pool: &MonthPool) {
    println!("  Required this month: {}", format_money(pool.total_required));
    println!("  Saved so far:        {}", format_money(pool.total_paid));
    println!(
        "  Remaining:           {}",
        style(format_money(pool.remaining)).bold()
    );
    println!("  Days left:           {}", pool.days_left);
    println!(
        "  Daily target:        {}",
        style(format_money(pool.daily_target)).cyan()
    );
}

fn print_roll(summary: &RollSummary) {
    println!();
    println!("  {} {}", style("↻").cyan().bold(), roll_headline(summary));
}

fn roll_headline(summary: &RollSummary) -> String {
    format!(
        "Rolled {}: {} loan{} advanced, {} closed",
        summary.month.format("%B %Y"),
        summary.decremented.len(),
        if summary.decremented.len() == 1 { "" } else { "s" },
        summary.closed.len()
    )
}
