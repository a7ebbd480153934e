//! Plain-text rendering of assessments, records and the tables in effect.

use std::fmt::Write;

use rust_decimal::Decimal;

use tax_core::calculations::common::round_half_up;
use tax_core::calculations::{Assessment, ReliefBreakdown};
use tax_core::{BracketSchedule, ReliefCategory, ReliefKind, ReliefLimits, TaxRecord};

const WIDTH: usize = 60;

fn rule(ch: char) -> String {
    ch.to_string().repeat(WIDTH)
}

fn heading(
    out: &mut String,
    title: &str,
) {
    let _ = writeln!(out, "{}", rule('='));
    let _ = writeln!(out, "{title:^width$}", width = WIDTH);
    let _ = writeln!(out, "{}", rule('='));
}

/// Two decimal places with comma thousands separators: `1,234.56`.
pub fn format_amount(value: Decimal) -> String {
    let rounded = round_half_up(value);
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{fraction}")
}

/// `RM 1,234.56`
pub fn format_rm(value: Decimal) -> String {
    format!("RM {}", format_amount(value))
}

/// Percentage with trailing zeros dropped: `0.24` renders as `24%`.
fn format_rate(rate: Decimal) -> String {
    format!("{}%", (rate * Decimal::ONE_HUNDRED).normalize())
}

pub fn relief_summary(breakdown: &ReliefBreakdown) -> String {
    let mut out = String::new();
    heading(&mut out, "TAX RELIEF SUMMARY");

    for line in &breakdown.lines {
        let label = if line.capped {
            format!("{}*", line.label)
        } else {
            line.label.clone()
        };
        let _ = writeln!(out, "{label:<35} RM {:>12}", format_amount(line.amount));
    }

    let _ = writeln!(out, "{}", rule('-'));
    let _ = writeln!(
        out,
        "{:<35} RM {:>12}",
        "TOTAL TAX RELIEF",
        format_amount(breakdown.total)
    );
    let _ = writeln!(out, "{}", rule('='));
    if breakdown.any_capped() {
        let _ = writeln!(out, "* reduced to the category limit");
    }
    out
}

pub fn tax_summary(assessment: &Assessment) -> String {
    let mut out = String::new();
    heading(
        &mut out,
        &format!("TAX SUMMARY (YA {})", assessment.year_of_assessment),
    );

    let rows = [
        ("Annual Income:", assessment.gross_income),
        ("Total Tax Relief:", assessment.total_relief),
        ("Chargeable Income:", assessment.chargeable_income),
        ("Tax Payable:", assessment.tax_payable),
    ];
    for (label, amount) in rows {
        let _ = writeln!(out, "{label:<22}{}", format_rm(amount));
    }
    let _ = writeln!(out, "{}", rule('='));
    out
}

pub fn record_details(record: &TaxRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  User ID:          {}", record.user_id);
    let _ = writeln!(out, "  IC Number:        {}", record.ic_number);
    let _ = writeln!(out, "  Annual Income:    {}", format_rm(record.annual_income));
    let _ = writeln!(out, "  Tax Relief:       {}", format_rm(record.tax_relief));
    let _ = writeln!(out, "  Tax Payable:      {}", format_rm(record.tax_payable));
    out
}

pub fn records_listing(records: &[TaxRecord]) -> String {
    let mut out = String::new();
    heading(&mut out, "TAX RECORDS");

    if records.is_empty() {
        let _ = writeln!(out, "No tax records available.");
        return out;
    }

    let _ = writeln!(out, "Total Records: {}", records.len());
    let _ = writeln!(out, "{}", rule('-'));
    for (i, record) in records.iter().enumerate() {
        let _ = writeln!(out, "Record #{}", i + 1);
        out.push_str(&record_details(record));
        let _ = writeln!(out, "{}", rule('-'));
    }
    out
}

pub fn relief_table(limits: &ReliefLimits) -> String {
    let mut out = String::new();
    heading(
        &mut out,
        &format!("RELIEF LIMITS (YA {})", limits.year_of_assessment),
    );

    for category in ReliefCategory::ALL {
        let Some(amount) = limits.amount(category) else {
            continue;
        };
        let basis = match category.kind() {
            ReliefKind::Flat => "max",
            ReliefKind::PerUnit { .. } => "per child",
        };
        let _ = writeln!(
            out,
            "{:<24}{:<31} RM {:>12} {basis}",
            category.as_str(),
            category.label(),
            format_amount(amount)
        );
    }
    let _ = writeln!(out, "{}", rule('-'));
    let _ = writeln!(
        out,
        "Child slots shared by child_under_18 and child_over_18_diploma: {}",
        limits.child_slot_limit
    );
    out
}

pub fn bracket_table(schedule: &BracketSchedule) -> String {
    let mut out = String::new();
    heading(
        &mut out,
        &format!("TAX BRACKETS (YA {})", schedule.year_of_assessment()),
    );

    let _ = writeln!(
        out,
        "{:>14} {:>14} {:>6} {:>14}",
        "From (RM)", "To (RM)", "Rate", "Base Tax (RM)"
    );
    let _ = writeln!(out, "{}", rule('-'));
    for bracket in schedule.brackets() {
        let upper = bracket
            .max_income
            .map(format_amount)
            .unwrap_or_else(|| "and above".to_string());
        let _ = writeln!(
            out,
            "{:>14} {:>14} {:>6} {:>14}",
            format_amount(bracket.min_income),
            upper,
            format_rate(bracket.tax_rate),
            format_amount(bracket.base_tax)
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use tax_core::calculations::{ReliefClaim, TaxAssessor};
    use tax_core::{IcNumber, TaxYearConfig};

    // =========================================================================
    // amount formatting
    // =========================================================================

    #[test]
    fn format_amount_groups_thousands() {
        assert_eq!(format_amount(dec!(0)), "0.00");
        assert_eq!(format_amount(dec!(999.5)), "999.50");
        assert_eq!(format_amount(dec!(1000)), "1,000.00");
        assert_eq!(format_amount(dec!(1234567.891)), "1,234,567.89");
        assert_eq!(format_amount(dec!(100000)), "100,000.00");
    }

    #[test]
    fn format_amount_rounds_half_up() {
        assert_eq!(format_amount(dec!(0.005)), "0.01");
        assert_eq!(format_amount(dec!(2.345)), "2.35");
    }

    #[test]
    fn format_amount_keeps_sign() {
        assert_eq!(format_amount(dec!(-1500)), "-1,500.00");
        assert_eq!(format_amount(dec!(-0.001)), "0.00");
    }

    #[test]
    fn format_rm_prefixes_currency() {
        assert_eq!(format_rm(dec!(3700)), "RM 3,700.00");
    }

    #[test]
    fn format_rate_drops_trailing_zeros() {
        assert_eq!(format_rate(dec!(0.24)), "24%");
        assert_eq!(format_rate(dec!(0.245)), "24.5%");
        assert_eq!(format_rate(dec!(0)), "0%");
    }

    // =========================================================================
    // reports
    // =========================================================================

    fn assessment(claims: &[ReliefClaim]) -> Assessment {
        let config = TaxYearConfig::ya2024();
        TaxAssessor::new(&config)
            .assess(dec!(55000), claims)
            .unwrap()
    }

    #[test]
    fn relief_summary_aligns_amounts() {
        let assessment = assessment(&[
            ReliefClaim::new(ReliefCategory::Individual, "9000"),
            ReliefClaim::new(ReliefCategory::Lifestyle, "500"),
        ]);

        let summary = relief_summary(&assessment.breakdown);

        assert!(summary.contains(&format!("{:<35} RM {:>12}\n", "Individual", "9,000.00")));
        assert!(summary.contains(&format!("{:<35} RM {:>12}\n", "Lifestyle", "500.00")));
        assert!(summary.contains(&format!("{:<35} RM {:>12}\n", "TOTAL TAX RELIEF", "9,500.00")));
        assert!(!summary.contains("reduced to the category limit"));
    }

    #[test]
    fn relief_summary_marks_capped_lines() {
        let assessment = assessment(&[ReliefClaim::new(ReliefCategory::Medical, "25000")]);

        let summary = relief_summary(&assessment.breakdown);

        assert!(summary.contains("Medical Expenses*"));
        assert!(summary.contains("10,000.00"));
        assert!(summary.ends_with("* reduced to the category limit\n"));
    }

    #[test]
    fn tax_summary_lists_four_figures() {
        let summary = tax_summary(&assessment(&[ReliefClaim::new(
            ReliefCategory::Individual,
            "9000",
        )]));

        assert!(summary.contains("TAX SUMMARY (YA 2024)"));
        assert!(summary.contains("Annual Income:        RM 55,000.00\n"));
        assert!(summary.contains("Total Tax Relief:     RM 9,000.00\n"));
        assert!(summary.contains("Chargeable Income:    RM 46,000.00\n"));
        assert!(summary.contains("Tax Payable:          RM 1,260.00\n"));
    }

    #[test]
    fn records_listing_numbers_each_record() {
        let mut bob = TaxRecord::register("bob", IcNumber::parse("010203040506").unwrap());
        bob.set_figures(dec!(70000), dec!(0), dec!(3700));
        let records = vec![
            TaxRecord::register("alice", IcNumber::parse("900101145678").unwrap()),
            bob,
        ];

        let listing = records_listing(&records);

        assert!(listing.contains("Total Records: 2\n"));
        assert!(listing.contains("Record #2\n"));
        assert!(listing.contains("  IC Number:        010203040506\n"));
        assert!(listing.contains("  Tax Payable:      RM 3,700.00\n"));
    }

    #[test]
    fn records_listing_handles_empty_store() {
        assert!(records_listing(&[]).contains("No tax records available."));
    }

    #[test]
    fn relief_table_shows_every_configured_category() {
        let table = relief_table(&ReliefLimits::ya2024());

        for category in ReliefCategory::ALL {
            assert!(table.contains(category.as_str()), "missing {category}");
        }
        assert!(table.contains("per child"));
        assert!(table.ends_with(": 12\n"));
    }

    #[test]
    fn bracket_table_shows_open_top_bracket() {
        let table = bracket_table(&BracketSchedule::ya2024());

        assert!(table.contains("TAX BRACKETS (YA 2024)"));
        assert!(table.contains("and above"));
        assert!(table.contains("30%"));
    }
}
