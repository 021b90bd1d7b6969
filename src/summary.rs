use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use engine::RunPlan;
use events::RunSummary;

fn table(rows: Vec<(&str, usize)>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Metric", "Count"]);
    for (metric, count) in rows {
        table.add_row(vec![Cell::new(metric), Cell::new(count)]);
    }
    table
}

pub fn summary_table(summary: &RunSummary) -> Table {
    table(vec![
        ("Reports discovered", summary.discovered),
        ("Reports processed", summary.processed),
        ("Reports skipped (parse failure)", summary.parse_failures),
        ("Historical rows loaded", summary.historical_loaded),
        ("Historical rows purged", summary.historical_purged),
        ("Historical rows malformed", summary.malformed_rows),
        ("Duplicate entries replaced", summary.duplicates_replaced),
        ("Real entries", summary.real_entries),
        ("Forward-filled entries", summary.synthesized_entries),
        ("Dates", summary.dates),
        ("Symbols", summary.symbols),
        ("Daily files written", summary.daily_files),
        ("Ticker files written", summary.ticker_files),
        ("Files not written", summary.write_failures),
    ])
}

pub fn plan_table(plan: &RunPlan) -> Table {
    table(vec![
        ("Reports discovered", plan.manifest.len()),
        ("Dates already covered", plan.covered.len()),
        ("Reports pending", plan.diff.pending.len()),
        ("Historical rows loaded", plan.historical_loaded),
        ("Historical rows malformed", plan.malformed_rows),
        ("Historical rows to purge", plan.diff.purged),
    ])
}
