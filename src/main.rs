use std::{env, process::ExitCode};

use log::{LevelFilter, Log, Metadata, Record};
use time::OffsetDateTime;

use cleanuva_sales_hub::{
    domain::{FinancialProjection, FleetPlan, PriceQuote, Session},
    infra::{default_source, load_snapshot},
    util::{
        config,
        version::{banner, APP_NAME},
    },
};

const LOG_ENV: &str = "CLEANUVA_LOG";

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("{:<5} {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging() {
    let level = env::var(LOG_ENV)
        .ok()
        .and_then(|value| value.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Warn);
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

fn main() -> ExitCode {
    init_logging();

    let source = default_source();
    let catalog = match load_snapshot(source.as_ref()) {
        Ok(catalog) => catalog,
        Err(err) => {
            eprintln!("{APP_NAME}: cannot load catalog from {}: {err}", source.describe());
            return ExitCode::FAILURE;
        }
    };

    let mut session = match Session::new(catalog, config::load_engine_defaults()) {
        Ok(session) => session,
        Err(err) => {
            eprintln!("{APP_NAME}: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(client) = env::args().nth(1) {
        if let Err(err) = session.select_scenario(&client) {
            eprintln!("{APP_NAME}: {err}");
            return ExitCode::FAILURE;
        }
    }

    match report(&session) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{APP_NAME}: {err}");
            ExitCode::FAILURE
        }
    }
}

fn report(session: &Session) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = session.scenario()?;
    println!("{}", banner());
    println!(
        "Project: {} ({} MW, {})",
        scenario.client, scenario.plant_mw, scenario.region
    );
    println!();

    let plan = session.fleet_plan()?;
    print_fleet(&plan);

    let projection = session.projection()?;
    if projection.has_investment() {
        print_projection(&projection);
    } else {
        println!("Select a device to see the financial projection.");
    }
    println!();

    let quote = session.price_quote()?;
    print_quote(&quote);
    if let Some(document) = session.quote_document(OffsetDateTime::now_utc())? {
        println!("{} -> {}", document.reference, document.file_name);
    }
    Ok(())
}

fn print_fleet(plan: &FleetPlan) {
    let site = plan.site();
    println!("Fleet sizing");
    for line in plan.lines() {
        let marker = if line.is_below_suggestion() { " (below suggestion)" } else { "" };
        println!(
            "  {:<16} {:>3} x {:>10.0} = {:>12.0}  suggested {}{}",
            line.device.name,
            line.quantity,
            line.unit_price,
            line.capex(),
            line.suggested_quantity,
            marker
        );
    }
    let status = plan.status();
    println!(
        "  Capacity {:.2} / {:.2} MW per cycle, adequate: {}",
        plan.total_cycle_capacity(),
        site.plant_mw,
        status.label()
    );
    println!(
        "  Total CAPEX {:.0} for {} units",
        plan.total_capex(),
        plan.total_units()
    );
    println!();
}

fn print_projection(projection: &FinancialProjection) {
    println!("Financial projection");
    println!("  Net annual benefit {:.0}", projection.net_annual_benefit);
    println!("  Payback {}", projection.payback_label());
    println!(
        "  {}-year ROI {:.1}%",
        projection.horizon_years(),
        projection.roi_pct
    );
    for point in &projection.cash_flow {
        println!("  {:<14} {:>14.0}", point.label, point.cumulative);
    }
    println!("  Year  Lost revenue w/o cleaning  Robot upkeep");
    for row in projection.recovery_table() {
        println!(
            "  {:>4}  {:>25.0}  {:>12.0}",
            row.year, row.potential_revenue_loss, row.robot_operation_cost
        );
    }
}

fn print_quote(quote: &PriceQuote) {
    let symbol = quote.symbol();
    println!("Quotation: {} ({})", quote.model_name, quote.currency.code());
    println!("  Base platform {symbol}{:.2}", quote.base_price);
    for line in &quote.lines {
        println!(
            "  {:<24} {:>3} x {symbol}{:.2} = {symbol}{:.2}",
            line.name,
            line.quantity,
            line.unit_price,
            line.subtotal()
        );
    }
    if quote.has_free_shipping() {
        println!("  Logistics ({}, {}) included", quote.region, quote.delivery_method);
    } else {
        println!(
            "  Logistics ({}, {}) {symbol}{:.2}",
            quote.region, quote.delivery_method, quote.shipping_cost
        );
    }
    println!("  Grand total {symbol}{:.2}", quote.grand_total);
}
