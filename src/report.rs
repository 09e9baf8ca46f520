//! Allocation Report

use std::io;

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, prelude::FromPrimitive};
use rusty_money::{Money, iso::Currency};
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    allocation::{AllocationResult, UsageShare},
    profiles::registry::ProfileRegistry,
};

/// Errors that can occur when writing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// A monetary amount could not be represented as a decimal.
    #[error("amount {0} cannot be shown as money")]
    NonFiniteAmount(f64),

    /// IO error
    #[error("IO error")]
    IO,
}

/// Printable summary of an allocation.
#[derive(Debug)]
pub struct AllocationReport<'a> {
    material: &'a str,
    result: &'a AllocationResult,
    currency: &'static Currency,
}

impl<'a> AllocationReport<'a> {
    /// Create a report for `result`, showing profit in `currency`.
    pub fn new(
        material: &'a str,
        result: &'a AllocationResult,
        currency: &'static Currency,
    ) -> Self {
        Self {
            material,
            result,
            currency,
        }
    }

    /// Write the size table followed by the totals.
    ///
    /// # Errors
    ///
    /// Returns a [`ReportError`] if a profit cannot be shown as money or writing fails.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReportError> {
        let mut builder = Builder::default();

        builder.push_record([
            "Size",
            "Units",
            "Metres/Unit",
            "Metres",
            "Share",
            "Profit/Unit",
            "Profit",
        ]);

        for (allocation, usage) in self.result.allocations().iter().zip(self.result.usage()) {
            builder.push_record([
                allocation.size.clone(),
                allocation.units.to_string(),
                format!("{:.2}", allocation.consumption),
                format!("{:.2}", allocation.length()),
                share_display(&usage),
                self.money(allocation.unit_profit)?,
                self.money(allocation.profit())?,
            ]);
        }

        // header is row 0
        let leftover_row = self.result.allocations().len() + 1;

        if let Some(leftover) = self.result.usage().last() {
            builder.push_record([
                "Leftover".to_string(),
                String::new(),
                String::new(),
                format!("{:.2}", leftover.length),
                share_display(leftover),
                String::new(),
                String::new(),
            ]);
        }

        let mut table = builder.build();
        let mut theme = Theme::from(Style::modern_rounded());
        let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

        theme.remove_horizontal_lines();
        theme.insert_horizontal_line(1, separator);

        if leftover_row > 1 {
            theme.insert_horizontal_line(leftover_row, separator);
        }

        table.with(theme);
        table.modify(Rows::first(), Color::BOLD);
        table.modify(Columns::new(1..7), Alignment::right());

        writeln!(out, "\n{} ({})\n{table}", self.material, self.result.strategy())
            .map_err(|_err| ReportError::IO)?;

        self.write_summary(&mut out)
    }

    fn write_summary(&self, out: &mut impl io::Write) -> Result<(), ReportError> {
        let lines = [
            ("Strategy", self.result.strategy().to_string()),
            ("Units", self.result.total_units().to_string()),
            ("Total Profit", self.money(self.result.profit())?),
            ("Leftover", format!("{:.2} m", self.result.leftover())),
            (
                "Efficiency",
                format!("{:.2}%", percent_points(self.result.efficiency())),
            ),
        ];

        let width = lines.iter().map(|(label, _)| label.len()).max().unwrap_or(0);

        for (label, value) in lines {
            writeln!(out, " {label:>width$}:  {value}").map_err(|_err| ReportError::IO)?;
        }

        writeln!(out).map_err(|_err| ReportError::IO)
    }

    fn money(&self, amount: f64) -> Result<String, ReportError> {
        money(amount, self.currency)
    }
}

/// Write every registered material with its sizes in declaration order.
///
/// # Errors
///
/// Returns a [`ReportError`] if a profit cannot be shown as money or writing fails.
pub fn write_materials(
    registry: &ProfileRegistry,
    mut out: impl io::Write,
) -> Result<(), ReportError> {
    let currency = registry.currency();
    let mut builder = Builder::default();
    let mut boundaries = Vec::with_capacity(registry.len());

    builder.push_record([
        "Material",
        "Cost/Metre",
        "Size",
        "Metres/Unit",
        "Profit/Unit",
        "Margin/Metre",
        "Recommended For",
    ]);

    // header is row 0
    let mut row = 1;

    for profile in registry.iter() {
        boundaries.push(row);

        for (idx, size) in profile.sizes().iter().enumerate() {
            let first = idx == 0;
            let parameters = size.parameters();

            builder.push_record([
                if first { profile.name().to_string() } else { String::new() },
                if first {
                    money(profile.cost_per_metre(), currency)?
                } else {
                    String::new()
                },
                size.id().to_string(),
                format!("{:.2}", parameters.consumption()),
                money(parameters.profit(), currency)?,
                money(parameters.ratio(profile.cost_per_metre()), currency)?,
                if first {
                    profile.recommended_for().join(", ")
                } else {
                    String::new()
                },
            ]);

            row += 1;
        }
    }

    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());
    let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

    theme.remove_horizontal_lines();

    for row in boundaries {
        theme.insert_horizontal_line(row, separator);
    }

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(1..2), Alignment::right());
    table.modify(Columns::new(3..6), Alignment::right());

    writeln!(out, "\n{table}\n").map_err(|_err| ReportError::IO)
}

fn money(amount: f64, currency: &'static Currency) -> Result<String, ReportError> {
    let decimal = Decimal::from_f64(amount)
        .ok_or(ReportError::NonFiniteAmount(amount))?
        .round_dp(currency.exponent);

    Ok(Money::from_decimal(decimal, currency).to_string())
}

fn share_display(usage: &UsageShare) -> String {
    format!("{:.2}%", percent_points(usage.share))
}

/// Converts a fractional percentage to percent points for display.
fn percent_points(percentage: Percentage) -> Decimal {
    // `Percentage` is a fraction (e.g. 0.25), so multiply by 100 to print percent points.
    (percentage * Decimal::ONE * Decimal::ONE_HUNDRED).round_dp(2)
}

#[cfg(test)]
mod tests {
    use rusty_money::iso;
    use testresult::TestResult;

    use crate::{
        allocation::{AllocationRequest, allocate},
        profiles::MaterialProfile,
    };

    use super::*;

    fn render(result: &AllocationResult) -> Result<String, Box<dyn std::error::Error>> {
        let mut out = Vec::new();

        AllocationReport::new("Cotton", result, iso::USD).write_to(&mut out)?;

        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn lists_sizes_and_leftover() -> TestResult {
        let mut profile = MaterialProfile::new("Cotton", 5.0)?;
        profile.add_size("A", 1.5, 20.0)?;

        let result = allocate(&AllocationRequest::new(100.0, &profile))?;
        let report = render(&result)?;

        assert!(report.contains("Cotton (greedy)"));
        assert!(report.contains("66"));
        assert!(report.contains("99.00"));
        assert!(report.contains("Leftover"));
        assert!(report.contains("1.00 m"));
        assert!(report.contains("99.00%"));
        assert!(report.contains("$1,320.00"));

        Ok(())
    }

    #[test]
    fn empty_allocation_reports_whole_budget_as_leftover() -> TestResult {
        let mut profile = MaterialProfile::new("Cotton", 5.0)?;
        profile.add_size("Gown", 4.0, 100.0)?;

        let result = allocate(&AllocationRequest::new(3.5, &profile).minimize_leftover(true))?;
        let report = render(&result)?;

        assert!(report.contains("exhaustive search"));
        assert!(report.contains("3.50 m"));
        assert!(report.contains("100.00%"));
        assert!(report.contains("0.00%"));

        Ok(())
    }

    #[test]
    fn materials_table_lists_every_size() -> TestResult {
        let mut registry = ProfileRegistry::new(iso::USD);

        let mut cotton = MaterialProfile::new("Cotton", 5.0)?;
        cotton
            .add_size("XL", 2.0, 30.0)?
            .add_size("S", 1.2, 20.0)?
            .recommend_for(["Shirt", "Dress"]);

        registry.insert(cotton)?;

        let mut out = Vec::new();
        write_materials(&registry, &mut out)?;
        let table = String::from_utf8(out)?;

        assert!(table.contains("Cotton"));
        assert!(table.contains("XL"));
        assert!(table.contains("Shirt, Dress"));
        assert!(table.contains("$10.00"));

        // XL has the lower margin per metre but is declared first.
        let xl = table.find(" XL ").ok_or("XL row missing")?;
        let small = table.find(" S ").ok_or("S row missing")?;

        assert!(xl < small);

        Ok(())
    }

    #[test]
    fn percent_points_scale_fractions() {
        assert_eq!(percent_points(Percentage::from(0.25)), Decimal::from(25));
    }
}
