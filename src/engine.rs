use crate::config::ModelConstants;
use crate::schema::{Account, WeeklyRecord};
use crate::seasonality::{month_of_week, seasonal_factor};
use log::{debug, info};

/// Expands committed monthly figures into a seasonal weekly series for one year.
///
/// An account contributes from its start month of its start year through the
/// end of its end year. Outside that window its weeks are present but zero.
pub struct WeeklyExpander {
    model: ModelConstants,
    year: i32,
}

impl WeeklyExpander {
    pub fn new(model: ModelConstants, year: i32) -> Self {
        Self { model, year }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn contributes(&self, account: &Account, week: u32) -> bool {
        let month = month_of_week(week, &self.model);
        let started = self.year > account.start_year
            || (self.year == account.start_year && month >= account.start_month);
        started && self.year <= account.end_year
    }

    pub fn expand_account(&self, account: &Account) -> Vec<WeeklyRecord> {
        let weekly_revenue = account.monthly_revenue / self.model.weeks_per_month;
        let weekly_volume = account.monthly_volume / self.model.weeks_per_month;

        (1..=self.model.weeks_per_year)
            .map(|week| {
                let (revenue, volume) = if self.contributes(account, week) {
                    let seasonal = seasonal_factor(week, &self.model);
                    (weekly_revenue * seasonal, weekly_volume * seasonal)
                } else {
                    (0.0, 0.0)
                };

                WeeklyRecord {
                    week,
                    year: self.year,
                    account: account.name.clone(),
                    industry: account.industry.clone(),
                    sales_category: account.sales_category.clone(),
                    city: account.city.clone(),
                    area: account.area.clone(),
                    territory_code: account.territory_code.clone(),
                    agent: account.agent.clone(),
                    status: account.status.clone(),
                    revenue,
                    volume,
                    start_month: account.start_month,
                    start_year: account.start_year,
                    years_of_engagement: account.years_of_engagement,
                    end_year: account.end_year,
                }
            })
            .collect()
    }

    /// Expands every account without touching its derived totals.
    pub fn expand_all(&self, accounts: &[Account]) -> Vec<WeeklyRecord> {
        let weekly: Vec<WeeklyRecord> = accounts
            .iter()
            .flat_map(|account| self.expand_account(account))
            .collect();
        debug!(
            "Expanded {} accounts into {} weekly records for {}",
            accounts.len(),
            weekly.len(),
            self.year
        );
        weekly
    }

    /// Expands every account and sets `base_revenue`/`base_volume` from its own weeks.
    pub fn expand_and_total(&self, mut accounts: Vec<Account>) -> (Vec<Account>, Vec<WeeklyRecord>) {
        let mut weekly = Vec::with_capacity(accounts.len() * self.model.weeks_per_year as usize);

        for account in accounts.iter_mut() {
            let records = self.expand_account(account);
            account.base_revenue = records.iter().map(|r| r.revenue).sum();
            account.base_volume = records.iter().map(|r| r.volume).sum();
            weekly.extend(records);
        }

        let active = accounts.iter().filter(|a| a.base_revenue > 0.0).count();
        info!(
            "Produced {} weekly records for {} ({} of {} accounts active)",
            weekly.len(),
            self.year,
            active,
            accounts.len()
        );

        (accounts, weekly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(start_month: u32, start_year: i32, years: u32) -> Account {
        Account {
            name: "Acme".to_string(),
            industry: "Retail".to_string(),
            sales_category: "New".to_string(),
            city: "Austin".to_string(),
            territory_code: "TX-1".to_string(),
            area: "South".to_string(),
            agent: "Dana".to_string(),
            status: "Won".to_string(),
            start_month,
            start_year,
            years_of_engagement: years,
            end_year: start_year + years as i32 - 1,
            monthly_revenue: 43_450.0,
            monthly_volume: 434.5,
            base_revenue: 0.0,
            base_volume: 0.0,
        }
    }

    #[test]
    fn test_full_year_contribution() {
        let expander = WeeklyExpander::new(ModelConstants::default(), 2024);
        let records = expander.expand_account(&account(1, 2024, 1));

        assert_eq!(records.len(), 52);
        assert!(records.iter().all(|r| r.revenue > 0.0));
        assert_eq!(records.first().unwrap().week, 1);
        assert_eq!(records.last().unwrap().week, 52);

        let week_13 = &records[12];
        assert!((week_13.revenue - 10_000.0 * 1.12).abs() < 1e-6);
        assert!((week_13.volume - 100.0 * 1.12).abs() < 1e-9);
    }

    #[test]
    fn test_mid_year_start_zeroes_earlier_weeks() {
        let model = ModelConstants::default();
        let expander = WeeklyExpander::new(model, 2024);
        let records = expander.expand_account(&account(8, 2024, 2));

        for record in &records {
            let month = month_of_week(record.week, &model);
            if month >= 8 {
                assert!(record.revenue > 0.0, "week {} should contribute", record.week);
            } else {
                assert_eq!(record.revenue, 0.0);
                assert_eq!(record.volume, 0.0);
            }
        }
    }

    #[test]
    fn test_future_start_and_past_end_produce_zero() {
        let expander = WeeklyExpander::new(ModelConstants::default(), 2024);
        let future = expander.expand_account(&account(1, 2025, 3));
        assert!(future.iter().all(|r| r.revenue == 0.0));

        let ended = expander.expand_account(&account(1, 2020, 2));
        assert!(ended.iter().all(|r| r.revenue == 0.0));
    }

    #[test]
    fn test_earlier_start_year_contributes_all_weeks() {
        let expander = WeeklyExpander::new(ModelConstants::default(), 2024);
        let records = expander.expand_account(&account(11, 2023, 2));
        assert!(records.iter().all(|r| r.revenue > 0.0));
    }

    #[test]
    fn test_totals_reconcile_with_weekly_sum() {
        let expander = WeeklyExpander::new(ModelConstants::default(), 2024);
        let mut second = account(6, 2024, 1);
        second.name = "Beta".to_string();
        let (accounts, weekly) = expander.expand_and_total(vec![account(1, 2024, 1), second]);

        let weekly_sum: f64 = weekly.iter().map(|r| r.revenue).sum();
        let base_sum: f64 = accounts.iter().map(|a| a.base_revenue).sum();
        assert!((weekly_sum - base_sum).abs() <= 1e-6 * weekly_sum.abs());

        let beta: f64 = weekly
            .iter()
            .filter(|r| r.account == "Beta")
            .map(|r| r.volume)
            .sum();
        assert!((beta - accounts[1].base_volume).abs() < 1e-9);
    }

    #[test]
    fn test_expand_all_leaves_totals_untouched() {
        let expander = WeeklyExpander::new(ModelConstants::default(), 2023);
        let accounts = vec![account(1, 2023, 1)];
        let weekly = expander.expand_all(&accounts);
        assert_eq!(weekly.len(), 52);
        assert!(weekly.iter().all(|r| r.year == 2023));
        assert_eq!(accounts[0].base_revenue, 0.0);
    }
}
